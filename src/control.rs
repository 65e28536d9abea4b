//! The teleoperation loop.
//!
//! Each iteration runs strictly in sequence:
//! 1. Check the interrupt flag
//! 2. Acquire one frame (an error ends the loop)
//! 3. Detect the dominant colored object
//! 4. Publish the automatic command for this frame
//! 5. Show the frame
//! 6. Poll one key; `q` ends the loop, mapped keys publish a manual command
//!
//! Nothing is carried from one iteration to the next except counters.

use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::command::{key_action, AutoCommand, KeyAction, AUTOMATIC_TOPIC, MANUAL_TOPIC};
use crate::console::Console;
use crate::detect::Detector;
use crate::ingest::{CameraConfig, CameraSource, FrameSource};
use crate::transport::CommandSink;

/// Key polling budget per iteration.
pub const KEY_POLL_TIMEOUT: Duration = Duration::from_millis(10);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitReason {
    /// Operator pressed the quit key.
    Quit,
    /// The interrupt flag was raised.
    Interrupted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoopSummary {
    pub exit: ExitReason,
    pub frames: u64,
    pub detections: u64,
    pub manual_commands: u64,
}

/// Open the configured camera.
///
/// A camera that cannot be created or opened is fatal: the broker session is
/// closed before the error is returned, so nothing is ever published.
pub fn open_camera<P>(config: CameraConfig, sink: &mut P) -> Result<CameraSource>
where
    P: CommandSink + ?Sized,
{
    let opened = CameraSource::new(config).and_then(|mut camera| {
        camera.open()?;
        Ok(camera)
    });
    opened.or_else(|e| {
        if let Err(err) = sink.close() {
            log::warn!("MQTT disconnect after camera failure: {}", err);
        }
        Err(e.context("Could not open camera"))
    })
}

/// Run until quit, interrupt, or the first failure.
pub fn run<S, D, C, P>(
    source: &mut S,
    detector: &D,
    console: &mut C,
    sink: &mut P,
    stop: &AtomicBool,
) -> Result<LoopSummary>
where
    S: FrameSource + ?Sized,
    D: Detector + ?Sized,
    C: Console + ?Sized,
    P: CommandSink + ?Sized,
{
    let mut frames = 0u64;
    let mut detections = 0u64;
    let mut manual_commands = 0u64;

    let summary = |exit, frames, detections, manual_commands| LoopSummary {
        exit,
        frames,
        detections,
        manual_commands,
    };

    loop {
        if stop.load(Ordering::SeqCst) {
            return Ok(summary(
                ExitReason::Interrupted,
                frames,
                detections,
                manual_commands,
            ));
        }

        let frame = source.next_frame().context("could not read frame")?;
        frames += 1;

        let detection = detector
            .detect(&frame)
            .with_context(|| format!("{} detector failed", detector.name()))?;
        let command = AutoCommand::from_detection(&detection);
        sink.publish(AUTOMATIC_TOPIC, command.as_str())?;
        match &detection {
            Some(found) => {
                detections += 1;
                log::info!(
                    "Sent automatic command: {} (detected {} object)",
                    command,
                    found.label
                );
            }
            None => log::info!("Sent automatic command: {} (no object detected)", command),
        }

        console.show(&frame, detection.as_ref())?;

        let Some(key) = console.poll_key(KEY_POLL_TIMEOUT)? else {
            continue;
        };
        match key_action(key) {
            Some(KeyAction::Quit) => {
                return Ok(summary(
                    ExitReason::Quit,
                    frames,
                    detections,
                    manual_commands,
                ));
            }
            Some(KeyAction::Manual(manual)) => {
                sink.publish(MANUAL_TOPIC, manual.as_str())?;
                manual_commands += 1;
                log::info!("Sent manual command: {}", manual);
            }
            None => {}
        }
    }
}
