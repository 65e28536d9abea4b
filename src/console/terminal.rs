use anyhow::Result;
use std::io::Read;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use super::Console;
use crate::detect::Detection;
use crate::frame::Frame;

/// Headless console.
///
/// A reader thread forwards stdin bytes as keys; frames are not displayed,
/// only summarized at debug level. Closing stdin does not end the loop.
pub struct TerminalConsole {
    keys: Receiver<char>,
}

impl TerminalConsole {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            for byte in stdin.lock().bytes() {
                let Ok(byte) = byte else {
                    break;
                };
                if tx.send(byte as char).is_err() {
                    break;
                }
            }
            log::debug!("stdin closed; manual keys disabled");
        });
        Self { keys: rx }
    }

    /// Console fed from an existing key channel.
    pub fn from_channel(keys: Receiver<char>) -> Self {
        Self { keys }
    }
}

impl Default for TerminalConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl Console for TerminalConsole {
    fn show(&mut self, frame: &Frame, detection: Option<&Detection>) -> Result<()> {
        match detection {
            Some(found) => log::debug!(
                "frame {}x{}: {} at {:?}",
                frame.width,
                frame.height,
                found.label,
                found.bounding_box()
            ),
            None => log::debug!("frame {}x{}: nothing detected", frame.width, frame.height),
        }
        Ok(())
    }

    fn poll_key(&mut self, timeout: Duration) -> Result<Option<char>> {
        match self.keys.recv_timeout(timeout) {
            Ok(key) => Ok(Some(key)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                // Keep the loop cadence once the reader has gone away.
                std::thread::sleep(timeout);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_keys_are_delivered_in_order() -> Result<()> {
        let (tx, rx) = mpsc::channel();
        let mut console = TerminalConsole::from_channel(rx);
        tx.send('w').unwrap();
        tx.send('q').unwrap();

        let timeout = Duration::from_millis(10);
        assert_eq!(console.poll_key(timeout)?, Some('w'));
        assert_eq!(console.poll_key(timeout)?, Some('q'));
        assert_eq!(console.poll_key(timeout)?, None);

        drop(tx);
        assert_eq!(console.poll_key(timeout)?, None);
        Ok(())
    }
}
