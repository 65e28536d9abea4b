//! Color-object teleoperation bridge.
//!
//! A camera loop looks for the largest green, red or blue object in each
//! frame and publishes `move_forward` / `stop` on `robot/automatic_command`.
//! Operator key presses are forwarded on `robot/manual_command`.
//!
//! # Module Structure
//!
//! - `frame`: owned per-iteration image (`Frame`)
//! - `detect`: HSV thresholding, external contours, `ColorObjectDetector`
//! - `ingest`: camera sources (V4L2 device, synthetic `stub://` scene)
//! - `command`: topics, command words, key table, robot-side arbitration
//! - `transport`: MQTT session and the `CommandSink` seam
//! - `console`: display and key polling
//! - `control`: the teleoperation loop
//! - `config`: layered file/env configuration

pub mod command;
pub mod config;
pub mod console;
pub mod control;
pub mod detect;
pub mod frame;
pub mod ingest;
pub mod transport;

pub use command::{
    key_action, AutoCommand, CommandArbiter, KeyAction, ManualCommand, MotorOutputs,
    AUTOMATIC_TOPIC, MANUAL_TOPIC,
};
pub use config::TeleopConfig;
pub use console::{Console, TerminalConsole};
pub use control::{ExitReason, LoopSummary};
pub use detect::{
    BoundingBox, ColorLabel, ColorObjectDetector, ColorRange, Contour, Detection,
    DetectionResult, Detector, Palette, MIN_AREA,
};
pub use frame::{Frame, PixelFormat};
pub use ingest::{CameraConfig, CameraSource, FrameSource};
pub use transport::{CommandSink, MqttSession, SessionOptions};
