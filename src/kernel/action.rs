use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of physical actions the grill can perform.
/// Carries no payload: effects are derived from kind + current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ActionKind {
    Load,
    Flip,
    Season,
    Unload,
    EmergencyStop,
}

impl ActionKind {
    pub const ALL: [ActionKind; 5] = [
        ActionKind::Load,
        ActionKind::Flip,
        ActionKind::Season,
        ActionKind::Unload,
        ActionKind::EmergencyStop,
    ];

    /// Oracle vocabulary (the phrasing the decision prompt asks for).
    pub fn oracle_phrase(&self) -> &'static str {
        match self {
            ActionKind::Load => "Put on the grill",
            ActionKind::Flip => "Turn over",
            ActionKind::Season => "Season",
            ActionKind::Unload => "Take off the grill",
            ActionKind::EmergencyStop => "Emergency stop",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionKind::Load => "load",
            ActionKind::Flip => "flip",
            ActionKind::Season => "season",
            ActionKind::Unload => "unload",
            ActionKind::EmergencyStop => "emergency_stop",
        };
        f.write_str(name)
    }
}

/// Which face of the food is on the grate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn flipped(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

/// Where a decision came from. Used for logs and the journal only,
/// never for gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Origin {
    Voice,
    Oracle,
    Rules,
    Watchdog,
}

/// Pre-classified voice intent. Single-use: the controller clears it
/// once its effect is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoiceCommand {
    /// Wake word. Acknowledged and dropped.
    Wake,
    Load,
    Flip,
    Season,
    Unload,
    Stop,
}

impl VoiceCommand {
    pub fn action(&self) -> Option<ActionKind> {
        match self {
            VoiceCommand::Wake => None,
            VoiceCommand::Load => Some(ActionKind::Load),
            VoiceCommand::Flip => Some(ActionKind::Flip),
            VoiceCommand::Season => Some(ActionKind::Season),
            VoiceCommand::Unload => Some(ActionKind::Unload),
            VoiceCommand::Stop => Some(ActionKind::EmergencyStop),
        }
    }

    /// Numeric codes emitted by the voice module.
    /// `0` is the wake word; `1`, `2` (one / two racks) and `3` (one skewer)
    /// all ask for food to be put on the grill.
    pub fn from_code(code: &str) -> Option<VoiceCommand> {
        match code.trim() {
            "0" | "00" => Some(VoiceCommand::Wake),
            "1" | "01" | "2" | "02" | "3" | "03" => Some(VoiceCommand::Load),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised voice command: {0:?}")]
pub struct UnknownVoiceCommand(pub String);

impl FromStr for VoiceCommand {
    type Err = UnknownVoiceCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let word = s.trim().to_lowercase();
        if let Some(cmd) = VoiceCommand::from_code(&word) {
            return Ok(cmd);
        }
        match word.as_str() {
            "wake" | "hey grill" => Ok(VoiceCommand::Wake),
            "load" | "start" | "put on" => Ok(VoiceCommand::Load),
            "flip" | "turn over" => Ok(VoiceCommand::Flip),
            "season" => Ok(VoiceCommand::Season),
            "unload" | "take off" => Ok(VoiceCommand::Unload),
            "stop" | "emergency stop" | "halt" => Ok(VoiceCommand::Stop),
            _ => Err(UnknownVoiceCommand(s.to_string())),
        }
    }
}
