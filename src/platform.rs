//! Interfaces to the window, keyboard, clock and sound device. The game loop
//! only talks to these traits; `app` wires them to winit and pixels.

use crate::draw::{Bitmap, Rgba};
use crate::error::AssetError;
use std::path::Path;
use std::time::Instant;
use winit::event::VirtualKeyCode;
use winit_input_helper::WinitInputHelper;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Escape,
}

pub trait Controls {
    /// Went down since the previous sample.
    fn pressed(&self, key: Key) -> bool;
    /// Currently down.
    fn held(&self, key: Key) -> bool;
    /// The window was closed.
    fn quit_requested(&self) -> bool;
}

pub trait Clock {
    /// Seconds elapsed since the previous call.
    fn delta_seconds(&mut self) -> f32;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Clip {
    Capture,
    Music,
}

pub trait Audio {
    fn load(&mut self, clip: Clip, path: &Path) -> Result<(), AssetError>;
    fn play_once(&mut self, clip: Clip);
    fn play_looping(&mut self, clip: Clip);
    /// Stops playback and frees every loaded clip.
    fn release(&mut self);
}

/// A drawing surface of `size()` pixels.
pub trait Canvas {
    fn size(&self) -> (u32, u32);
    fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: Rgba);
    fn blit(&mut self, bitmap: &Bitmap, x: i32, y: i32);
    fn present(&mut self) -> anyhow::Result<()>;
}

impl Key {
    fn code(self) -> VirtualKeyCode {
        match self {
            Key::Left => VirtualKeyCode::Left,
            Key::Right => VirtualKeyCode::Right,
            Key::Up => VirtualKeyCode::Up,
            Key::Down => VirtualKeyCode::Down,
            Key::Escape => VirtualKeyCode::Escape,
        }
    }
}

impl Controls for WinitInputHelper {
    fn pressed(&self, key: Key) -> bool {
        self.key_pressed(key.code())
    }

    fn held(&self, key: Key) -> bool {
        self.key_held(key.code())
    }

    fn quit_requested(&self) -> bool {
        self.close_requested() || self.destroyed()
    }
}

pub struct SystemClock {
    last: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { last: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn delta_seconds(&mut self) -> f32 {
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f32();
        self.last = now;
        dt
    }
}
