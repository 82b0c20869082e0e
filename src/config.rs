use crate::error::ConfigError;
use crate::grid::Grid;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Largest accepted field side in pixels.
pub const MAX_FIELD_SIDE: u32 = 8192;

/// A frame rate that applies once the snake is at least `min_length` long.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CadenceTier {
    pub min_length: usize,
    pub fps: f32,
}

/// `count` obstacles appear the first time the snake reaches `length`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObstacleWave {
    pub length: usize,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetPaths {
    pub background: PathBuf,
    pub fruit: PathBuf,
    pub obstacle: PathBuf,
    pub capture_sound: PathBuf,
    pub music: PathBuf,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            background: PathBuf::from("Assets/gfx/background.bmp"),
            fruit: PathBuf::from("Assets/gfx/treasure.bmp"),
            obstacle: PathBuf::from("Assets/gfx/bomb.bmp"),
            capture_sound: PathBuf::from("Assets/gfx/eatSoundfx.wav"),
            music: PathBuf::from("Assets/gfx/bgm.wav"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub title: String,
    /// Play-field size in pixels; the window has the same size.
    pub field_width: u32,
    pub field_height: u32,
    pub cell_size: u32,
    /// Gap left around each snake segment.
    pub segment_padding: u32,
    /// Random samples tried before placement scans the whole board.
    pub placement_attempts: u32,
    /// Pause between logic ticks.
    pub tick_yield_ms: u64,
    pub cadence: Vec<CadenceTier>,
    pub obstacle_waves: Vec<ObstacleWave>,
    pub show_score: bool,
    pub assets: AssetPaths,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            title: "Snake Game".to_string(),
            field_width: 600,
            field_height: 600,
            cell_size: 20,
            segment_padding: 2,
            placement_attempts: 256,
            tick_yield_ms: 1,
            cadence: vec![
                CadenceTier { min_length: 0, fps: 10.0 },
                CadenceTier { min_length: 4, fps: 15.0 },
                CadenceTier { min_length: 9, fps: 20.0 },
            ],
            obstacle_waves: vec![
                ObstacleWave { length: 5, count: 1 },
                ObstacleWave { length: 10, count: 3 },
                ObstacleWave { length: 15, count: 5 },
            ],
            show_score: true,
            assets: AssetPaths::default(),
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

impl GameConfig {
    /// Reads a JSON config. A missing file yields the defaults; fields left
    /// out of the file keep their default values.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io { path: path.to_path_buf(), source });
            }
        };
        Self::from_json(&text).map_err(|e| match e {
            ConfigError::Parse { source, .. } => {
                ConfigError::Parse { path: path.to_path_buf(), source }
            }
            other => other,
        })
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(text)
            .map_err(|source| ConfigError::Parse { path: PathBuf::new(), source })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cell_size == 0 {
            return Err(ConfigError::Invalid("cell_size must be positive".into()));
        }
        if self.field_width < self.cell_size || self.field_height < self.cell_size {
            return Err(ConfigError::Invalid("field must hold at least one cell".into()));
        }
        if self.field_width > MAX_FIELD_SIDE || self.field_height > MAX_FIELD_SIDE {
            return Err(ConfigError::Invalid(format!(
                "field {}x{} exceeds {MAX_FIELD_SIDE} px per side",
                self.field_width, self.field_height
            )));
        }
        if self.field_width % self.cell_size != 0 || self.field_height % self.cell_size != 0 {
            return Err(ConfigError::Invalid(format!(
                "field {}x{} is not a multiple of cell_size {}",
                self.field_width, self.field_height, self.cell_size
            )));
        }
        if self.segment_padding >= self.cell_size {
            return Err(ConfigError::Invalid(
                "segment_padding must be smaller than cell_size".into(),
            ));
        }
        if self.cadence.is_empty() {
            return Err(ConfigError::Invalid("cadence needs at least one tier".into()));
        }
        if let Some(tier) = self.cadence.iter().find(|t| t.fps <= 0.0 || !t.fps.is_finite()) {
            return Err(ConfigError::Invalid(format!("cadence fps {} must be positive", tier.fps)));
        }
        Ok(())
    }

    pub fn grid(&self) -> Grid {
        Grid::new(self.field_width, self.field_height, self.cell_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_classic_layout() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());
        let grid = config.grid();
        assert_eq!((grid.columns(), grid.rows()), (30, 30));
        assert_eq!(config.cadence[0].fps, 10.0);
        assert_eq!(config.obstacle_waves.iter().map(|w| w.count).sum::<usize>(), 9);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = GameConfig::from_json(r#"{ "cell_size": 10, "show_score": false }"#).unwrap();
        assert_eq!(config.cell_size, 10);
        assert!(!config.show_score);
        assert_eq!(config.field_width, 600);
        assert_eq!(config.assets, AssetPaths::default());
    }

    #[test]
    fn nested_asset_paths_merge_with_defaults() {
        let config = GameConfig::from_json(r#"{ "assets": { "music": "loop.wav" } }"#).unwrap();
        assert_eq!(config.assets.music, PathBuf::from("loop.wav"));
        assert_eq!(config.assets.fruit, PathBuf::from("Assets/gfx/treasure.bmp"));
    }

    #[test]
    fn rejects_misaligned_field() {
        let err = GameConfig::from_json(r#"{ "field_width": 610 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_oversized_field() {
        let err = GameConfig::from_json(r#"{ "field_width": 80000, "field_height": 80000 }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        let edge = format!(
            r#"{{ "field_width": {MAX_FIELD_SIDE}, "field_height": 16, "cell_size": 16 }}"#
        );
        assert!(GameConfig::from_json(&edge).is_ok());
    }

    #[test]
    fn rejects_bad_cadence() {
        assert!(GameConfig::from_json(r#"{ "cadence": [] }"#).is_err());
        let stalled = r#"{ "cadence": [{ "min_length": 0, "fps": 0.0 }] }"#;
        assert!(GameConfig::from_json(stalled).is_err());
    }

    #[test]
    fn rejects_malformed_json() {
        let err = GameConfig::from_json("{ cell_size: }").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_file_means_defaults() {
        let path = Path::new("definitely/not/here/snake.json");
        assert_eq!(GameConfig::load(path).unwrap(), GameConfig::default());
    }
}
