use anyhow::{anyhow, Result};
use minifb::{Key, KeyRepeat, Window, WindowOptions};
use std::collections::VecDeque;
use std::time::Duration;

use super::{draw_detection, Console, QUIT_KEY};
use crate::detect::Detection;
use crate::frame::Frame;

const WINDOW_TITLE: &str = "Camera";

/// On-screen preview with keyboard input.
///
/// The window is created on the first frame so it matches the camera size.
/// Key presses are collected while the frame is pushed to the window and
/// handed out one per `poll_key`.
#[derive(Default)]
pub struct PreviewWindow {
    window: Option<Window>,
    buffer: Vec<u32>,
    pending: VecDeque<char>,
}

impl PreviewWindow {
    pub fn new() -> Self {
        Self::default()
    }

    fn window_for(&mut self, width: usize, height: usize) -> Result<&mut Window> {
        let stale = self
            .window
            .as_ref()
            .map(|w| w.get_size() != (width, height))
            .unwrap_or(true);
        if stale {
            let window = Window::new(WINDOW_TITLE, width, height, WindowOptions::default())
                .map_err(|e| anyhow!("failed to open preview window: {}", e))?;
            self.window = Some(window);
        }
        self.window
            .as_mut()
            .ok_or_else(|| anyhow!("preview window unavailable"))
    }
}

impl Console for PreviewWindow {
    fn show(&mut self, frame: &Frame, detection: Option<&Detection>) -> Result<()> {
        let mut canvas = frame.clone();
        if let Some(found) = detection {
            draw_detection(&mut canvas, found);
        }

        let mut buffer = std::mem::take(&mut self.buffer);
        buffer.clear();
        buffer.extend(
            canvas
                .rgb_pixels()
                .map(|[r, g, b]| (r as u32) << 16 | (g as u32) << 8 | b as u32),
        );

        let (width, height) = (frame.width as usize, frame.height as usize);
        let window = self.window_for(width, height)?;
        let shown = window
            .update_with_buffer(&buffer, width, height)
            .map_err(|e| anyhow!("preview update failed: {}", e));
        let closed = !window.is_open();
        let pressed = window.get_keys_pressed(KeyRepeat::No);
        self.buffer = buffer;

        if closed {
            self.pending.push_back(QUIT_KEY);
        }
        self.pending.extend(pressed.into_iter().filter_map(key_char));
        shown
    }

    fn poll_key(&mut self, timeout: Duration) -> Result<Option<char>> {
        if let Some(key) = self.pending.pop_front() {
            return Ok(Some(key));
        }
        std::thread::sleep(timeout);
        Ok(None)
    }
}

fn key_char(key: Key) -> Option<char> {
    match key {
        Key::W => Some('w'),
        Key::A => Some('a'),
        Key::S => Some('s'),
        Key::D => Some('d'),
        Key::Space => Some(' '),
        Key::Q | Key::Escape => Some(QUIT_KEY),
        _ => None,
    }
}
