use crate::config::AssetPaths;
use crate::draw::Bitmap;
use crate::error::AssetError;
use crate::platform::{Audio, Clip};
use ahash::AHashMap;
use log::{debug, info, warn};
use rodio::decoder::DecoderError;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub fn load_bitmap(path: &Path) -> Result<Bitmap, AssetError> {
    let image = image::open(path)
        .map_err(|source| AssetError::Image { path: path.to_path_buf(), source })?;
    Ok(Bitmap::from(image.to_rgba8()))
}

/// The three sprites of the playfield. A missing sprite is drawn as a plain
/// coloured cell instead.
#[derive(Default)]
pub struct Sprites {
    pub background: Option<Bitmap>,
    pub fruit: Option<Bitmap>,
    pub obstacle: Option<Bitmap>,
}

impl Sprites {
    pub fn load(paths: &AssetPaths) -> Self {
        Self {
            background: load_or_warn(&paths.background),
            fruit: load_or_warn(&paths.fruit),
            obstacle: load_or_warn(&paths.obstacle),
        }
    }
}

fn load_or_warn(path: &Path) -> Option<Bitmap> {
    match load_bitmap(path) {
        Ok(bitmap) => {
            debug!("loaded {} ({}x{})", path.display(), bitmap.width(), bitmap.height());
            Some(bitmap)
        }
        Err(e) => {
            warn!("{e}");
            None
        }
    }
}

struct Sound {
    path: PathBuf,
    data: Arc<[u8]>,
}

impl Sound {
    fn decoder(&self) -> Result<Decoder<Cursor<Arc<[u8]>>>, DecoderError> {
        Decoder::new(Cursor::new(Arc::clone(&self.data)))
    }
}

struct Output {
    // dropping the stream closes the device
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

fn open_output() -> Option<Output> {
    match OutputStream::try_default() {
        Ok((stream, handle)) => Some(Output { _stream: stream, handle }),
        Err(e) => {
            warn!("no audio output, continuing without sound: {e}");
            None
        }
    }
}

/// Sound clips decoded with rodio and played on the default output device.
/// Without a device every request is accepted and nothing is heard.
#[derive(Default)]
pub struct SoundBank {
    output: Option<Output>,
    clips: AHashMap<Clip, Sound>,
    looping: Option<Clip>,
    music: Option<Sink>,
}

impl SoundBank {
    pub fn new() -> Self {
        Self { output: open_output(), ..Self::default() }
    }

    pub fn is_loaded(&self, clip: Clip) -> bool {
        self.clips.contains_key(&clip)
    }

    #[cfg(test)]
    pub fn looping(&self) -> Option<Clip> {
        self.looping
    }
}

impl Audio for SoundBank {
    fn load(&mut self, clip: Clip, path: &Path) -> Result<(), AssetError> {
        let data: Arc<[u8]> = fs::read(path)
            .map_err(|source| AssetError::Io { path: path.to_path_buf(), source })?
            .into();
        let sound = Sound { path: path.to_path_buf(), data };
        let source = sound
            .decoder()
            .map_err(|source| AssetError::Sound { path: path.to_path_buf(), source })?;
        debug!(
            "loaded {:?} from {} ({} Hz, {} channel(s))",
            clip,
            path.display(),
            source.sample_rate(),
            source.channels()
        );
        self.clips.insert(clip, sound);
        Ok(())
    }

    fn play_once(&mut self, clip: Clip) {
        let (Some(sound), Some(output)) = (self.clips.get(&clip), &self.output) else {
            return;
        };
        let source = match sound.decoder() {
            Ok(source) => source,
            Err(e) => {
                warn!("cannot decode {}: {e}", sound.path.display());
                return;
            }
        };
        if let Err(e) = output.handle.play_raw(source.convert_samples()) {
            warn!("cannot play {}: {e}", sound.path.display());
        }
    }

    fn play_looping(&mut self, clip: Clip) {
        let Some(sound) = self.clips.get(&clip) else {
            return;
        };
        info!("looping {:?} ({})", clip, sound.path.display());
        self.looping = Some(clip);
        let Some(output) = &self.output else {
            return;
        };
        let sink = match Sink::try_new(&output.handle) {
            Ok(sink) => sink,
            Err(e) => {
                warn!("cannot open a channel for {}: {e}", sound.path.display());
                return;
            }
        };
        match sound.decoder() {
            Ok(source) => {
                sink.append(source.repeat_infinite());
                self.music = Some(sink);
            }
            Err(e) => warn!("cannot decode {}: {e}", sound.path.display()),
        }
    }

    fn release(&mut self) {
        if let Some(sink) = self.music.take() {
            sink.stop();
        }
        if !self.clips.is_empty() {
            debug!("releasing {} sound clip(s)", self.clips.len());
        }
        self.looping = None;
        self.clips.clear();
        self.output = None;
    }
}
