use uuid::Uuid;

use super::action::VoiceCommand;
use crate::error::{ActuatorError, OracleError};
use crate::planner::types::{PlanningEpoch, Recommendation};

pub type DispatchId = Uuid;

#[derive(Debug, Clone)]
pub enum Event {
    /// External signals (telemetry, voice, operator)
    Input(InputEvent),
    /// Oracle answer for the state version it was asked about.
    OracleProposed(PlanningEpoch, Result<Recommendation, OracleError>),
    /// Outcome of an actuator dispatch, posted by the driver.
    ActuatorReport {
        dispatch_id: DispatchId,
        outcome: Result<(), ActuatorError>,
    },
    WatchdogWake,
}

#[derive(Debug, Clone)]
pub struct InputEvent {
    pub source: String,
    pub content: InputContent,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputContent {
    /// Doneness of the side on the grate, on the configured scale.
    Doneness(f32),
    Voice(VoiceCommand),
    /// Operator re-initialisation. Leaves any phase, terminal ones included.
    Reinitialize,
}

impl InputEvent {
    pub fn doneness(source: &str, value: f32) -> Self {
        Self {
            source: source.to_string(),
            content: InputContent::Doneness(value),
        }
    }

    pub fn voice(source: &str, command: VoiceCommand) -> Self {
        Self {
            source: source.to_string(),
            content: InputContent::Voice(command),
        }
    }

    pub fn reinitialize(source: &str) -> Self {
        Self {
            source: source.to_string(),
            content: InputContent::Reinitialize,
        }
    }
}

impl From<InputEvent> for Event {
    fn from(input: InputEvent) -> Self {
        Event::Input(input)
    }
}
