use crate::assets::{SoundBank, Sprites};
use crate::config::GameConfig;
use crate::draw::{Bitmap, Frame, Rgba};
use crate::game::GameEnd;
use crate::platform::{Audio, Canvas, Clip, Clock, SystemClock};
use crate::scheduler::{GameLoop, TickStatus};
use anyhow::anyhow;
use log::{info, warn};
use pixels::{Pixels, SurfaceTexture};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::time::{Duration, Instant};
use winit::dpi::LogicalSize;
use winit::event_loop::{ControlFlow, EventLoop};
use winit::platform::run_return::EventLoopExtRunReturn;
use winit::window::{Window, WindowBuilder};
use winit_input_helper::WinitInputHelper;

/// Window surface backed by a software frame that is copied over on present.
pub struct PixelsCanvas {
    pixels: Pixels,
    back: Frame,
}

impl PixelsCanvas {
    pub fn new(window: &Window, width: u32, height: u32) -> anyhow::Result<Self> {
        let size = window.inner_size();
        let surface = SurfaceTexture::new(size.width, size.height, window);
        let pixels =
            Pixels::new(width, height, surface).map_err(|e| anyhow!("pixels init failed: {e}"))?;
        let mut back = Frame::new(width, height);
        back.clear((0, 0, 0, 255));
        Ok(Self { pixels, back })
    }
}

impl Canvas for PixelsCanvas {
    fn size(&self) -> (u32, u32) {
        self.back.size()
    }

    fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: Rgba) {
        self.back.fill_rect(x, y, w, h, color);
    }

    fn blit(&mut self, bitmap: &Bitmap, x: i32, y: i32) {
        self.back.blit(bitmap, x, y);
    }

    fn present(&mut self) -> anyhow::Result<()> {
        self.pixels.frame_mut().copy_from_slice(self.back.bytes());
        self.pixels.render().map_err(|e| anyhow!("render failed: {e}"))
    }
}

fn load_sounds(audio: &mut SoundBank, config: &GameConfig) {
    let clips = [
        (Clip::Capture, &config.assets.capture_sound),
        (Clip::Music, &config.assets.music),
    ];
    for (clip, path) in clips {
        if let Err(e) = audio.load(clip, path) {
            warn!("{e}");
        }
    }
    if audio.is_loaded(Clip::Music) {
        audio.play_looping(Clip::Music);
    }
}

/// Opens the window and plays one game. Returns how the game ended, or
/// `None` if the event loop stopped before the game did.
pub fn run(config: &GameConfig) -> anyhow::Result<Option<GameEnd>> {
    let mut event_loop = EventLoop::new();
    let mut input = WinitInputHelper::new();

    let window = WindowBuilder::new()
        .with_title(&config.title)
        .with_inner_size(LogicalSize::new(config.field_width, config.field_height))
        .with_resizable(false)
        .build(&event_loop)
        .map_err(|e| anyhow!("window creation failed: {e}"))?;

    let mut canvas = PixelsCanvas::new(&window, config.field_width, config.field_height)?;
    let mut audio = SoundBank::new();
    load_sounds(&mut audio, config);

    let sprites = Sprites::load(&config.assets);
    let mut game = GameLoop::new(config, sprites, SmallRng::from_entropy());
    let mut clock = SystemClock::new();
    let tick_yield = Duration::from_millis(config.tick_yield_ms);
    let mut outcome: anyhow::Result<Option<GameEnd>> = Ok(None);

    event_loop.run_return(|event, _, control_flow| {
        if !input.update(&event) {
            return;
        }
        let dt = clock.delta_seconds();
        match game.tick(&input, dt, &mut canvas, &mut audio) {
            Ok(TickStatus::Running) => {
                *control_flow = ControlFlow::WaitUntil(Instant::now() + tick_yield);
            }
            Ok(TickStatus::Finished(end)) => {
                outcome = Ok(Some(end));
                *control_flow = ControlFlow::Exit;
            }
            Err(e) => {
                outcome = Err(e);
                *control_flow = ControlFlow::Exit;
            }
        }
    });

    audio.release();
    let state = game.state();
    let verdict = match state.end() {
        Some(GameEnd::Quit) => "quit",
        Some(end) if end.is_win() => "won",
        Some(_) => "lost",
        None => "stopped",
    };
    info!(
        "game {verdict}: score {}, length {}, {} frame(s)",
        state.score(),
        state.snake().len(),
        game.frames()
    );
    outcome
}
