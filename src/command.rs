//! Robot command vocabulary.
//!
//! Two topics carry plain UTF-8 command words:
//! - `robot/automatic_command`: one word per processed frame, from detection.
//! - `robot/manual_command`: one word per mapped key press.
//!
//! The robot side keeps the latest word from each topic and lets a fresh
//! manual command override the automatic one for a short hold window.

use std::fmt;
use std::time::{Duration, Instant};

use crate::detect::DetectionResult;

pub const AUTOMATIC_TOPIC: &str = "robot/automatic_command";
pub const MANUAL_TOPIC: &str = "robot/manual_command";

/// How long a manual command outranks the automatic stream.
pub const DEFAULT_MANUAL_HOLD: Duration = Duration::from_secs(1);

/// Command derived from a frame's detection outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AutoCommand {
    MoveForward,
    Stop,
}

impl AutoCommand {
    pub fn from_detection(result: &DetectionResult) -> Self {
        match result {
            Some(_) => AutoCommand::MoveForward,
            None => AutoCommand::Stop,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AutoCommand::MoveForward => "move_forward",
            AutoCommand::Stop => "stop",
        }
    }
}

impl fmt::Display for AutoCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator-issued command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ManualCommand {
    Forward,
    Left,
    Right,
    Backward,
    Stop,
}

impl ManualCommand {
    pub fn as_str(self) -> &'static str {
        match self {
            ManualCommand::Forward => "forward",
            ManualCommand::Left => "left",
            ManualCommand::Right => "right",
            ManualCommand::Backward => "backward",
            ManualCommand::Stop => "stop",
        }
    }
}

impl fmt::Display for ManualCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a key press asks the loop to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    Manual(ManualCommand),
    Quit,
}

/// Fixed keyboard table: w/a/d/s/space drive, q quits. Anything else is ignored.
pub fn key_action(key: char) -> Option<KeyAction> {
    match key {
        'w' => Some(KeyAction::Manual(ManualCommand::Forward)),
        'a' => Some(KeyAction::Manual(ManualCommand::Left)),
        'd' => Some(KeyAction::Manual(ManualCommand::Right)),
        's' => Some(KeyAction::Manual(ManualCommand::Backward)),
        ' ' => Some(KeyAction::Manual(ManualCommand::Stop)),
        'q' => Some(KeyAction::Quit),
        _ => None,
    }
}

pub const KEY_HELP: &str =
    "Press 'w' (forward), 'a' (left), 'd' (right), 's' (backward), 'space' (stop), 'q' (quit)";

// ----------------------------------------------------------------------------
// Robot side
// ----------------------------------------------------------------------------

/// Latest-command arbitration for the robot consumer.
#[derive(Clone, Debug)]
pub struct CommandArbiter {
    manual_hold: Duration,
    last_automatic: Option<String>,
    last_manual: Option<(String, Instant)>,
}

impl CommandArbiter {
    pub fn new(manual_hold: Duration) -> Self {
        Self {
            manual_hold,
            last_automatic: None,
            last_manual: None,
        }
    }

    /// Record a payload received on `topic`. Unknown topics are ignored and
    /// reported as `false`.
    pub fn record(&mut self, topic: &str, payload: &str, now: Instant) -> bool {
        match topic {
            AUTOMATIC_TOPIC => {
                self.last_automatic = Some(payload.to_string());
                true
            }
            MANUAL_TOPIC => {
                self.last_manual = Some((payload.to_string(), now));
                true
            }
            _ => false,
        }
    }

    /// Command in effect at `now`.
    pub fn current(&self, now: Instant) -> Option<&str> {
        if let Some((command, at)) = &self.last_manual {
            if !command.is_empty() && now.saturating_duration_since(*at) < self.manual_hold {
                return Some(command.as_str());
            }
        }
        self.last_automatic
            .as_deref()
            .filter(|command| !command.is_empty())
    }
}

impl Default for CommandArbiter {
    fn default() -> Self {
        Self::new(DEFAULT_MANUAL_HOLD)
    }
}

/// Logic levels for a dual H-bridge driving two wheels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MotorOutputs {
    pub left_forward: bool,
    pub left_backward: bool,
    pub right_forward: bool,
    pub right_backward: bool,
}

impl MotorOutputs {
    /// Output levels for a command word; `None` for words the robot does not know.
    pub fn for_command(command: &str) -> Option<Self> {
        let (lf, lb, rf, rb) = match command {
            "move_forward" | "forward" => (true, false, true, false),
            "stop" => (false, false, false, false),
            "left" => (false, true, true, false),
            "right" => (true, false, false, true),
            "backward" => (false, true, false, true),
            _ => return None,
        };
        Some(Self {
            left_forward: lf,
            left_backward: lb,
            right_forward: rf,
            right_backward: rb,
        })
    }
}
