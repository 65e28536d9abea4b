//! Operator console: frame display and key polling.
//!
//! - `TerminalConsole`: headless, keys read from stdin
//! - `PreviewWindow`: on-screen preview (feature: preview-window)
//! - `draw_detection`: box outline and label text drawn onto a frame copy
//!
//! Consoles never publish anything; they only report raw key presses back
//! to the control loop, which maps them through the command table.

use anyhow::Result;
use std::time::Duration;

use crate::detect::Detection;
use crate::frame::Frame;

mod font;
mod overlay;
mod terminal;
#[cfg(feature = "preview-window")]
mod window;

pub use overlay::draw_detection;
pub use terminal::TerminalConsole;
#[cfg(feature = "preview-window")]
pub use window::PreviewWindow;

/// Key reported when the operator closes the console (window close, Escape).
pub const QUIT_KEY: char = 'q';

pub trait Console {
    /// Present the frame with the detection (if any) highlighted.
    fn show(&mut self, frame: &Frame, detection: Option<&Detection>) -> Result<()>;

    /// Wait up to `timeout` for a key press.
    fn poll_key(&mut self, timeout: Duration) -> Result<Option<char>>;
}
