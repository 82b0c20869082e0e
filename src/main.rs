mod app;
mod assets;
mod config;
mod draw;
mod error;
mod game;
mod grid;
mod placement;
mod platform;
mod scheduler;

use config::GameConfig;
use log::{info, warn};
use simplelog::{
    ColorChoice, CombinedLogger, Config, LevelFilter, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};
use std::env;
use std::fs::File;
use std::path::PathBuf;

const CONFIG_ENV: &str = "SNAKE_CONFIG";
const DEFAULT_CONFIG: &str = "snake.json";

fn init_logging(config: &GameConfig) {
    let level = config.log_level.parse().unwrap_or(LevelFilter::Info);
    let mut loggers: Vec<Box<dyn SharedLogger>> =
        vec![TermLogger::new(level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto)];
    if let Some(path) = &config.log_file {
        match File::create(path) {
            Ok(file) => loggers.push(WriteLogger::new(level, Config::default(), file)),
            Err(e) => eprintln!("cannot open log file {}: {e}", path.display()),
        }
    }
    if let Err(e) = CombinedLogger::init(loggers) {
        eprintln!("logger init failed: {e}");
    }
}

fn main() -> anyhow::Result<()> {
    let path = env::var_os(CONFIG_ENV).map_or_else(|| PathBuf::from(DEFAULT_CONFIG), PathBuf::from);
    let loaded = GameConfig::load(&path);
    let config = loaded.as_ref().cloned().unwrap_or_default();
    init_logging(&config);
    if let Err(e) = &loaded {
        warn!("{e}; using default settings");
    }

    info!(
        "starting {} ({}x{} px, {} px cells)",
        config.title, config.field_width, config.field_height, config.cell_size
    );
    match app::run(&config)? {
        Some(end) => info!("game over: {end}"),
        None => info!("event loop stopped"),
    }
    Ok(())
}
