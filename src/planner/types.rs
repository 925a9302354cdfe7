use serde::{Deserialize, Serialize};

use crate::kernel::action::{ActionKind, Side, VoiceCommand};
use crate::kernel::state::CookPhase;

/// The state version an oracle request was computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlanningEpoch {
    pub state_version: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OracleAction {
    Act(ActionKind),
    /// Explicit "do nothing". Not an error; falls through to the rule engine.
    Hold,
}

/// Optional state-field patch carried by a recommendation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPatch {
    pub expected_seasoning: Option<u32>,
}

impl StatusPatch {
    pub fn is_empty(&self) -> bool {
        self.expected_seasoning.is_none()
    }
}

/// A well-formed oracle answer. Malformed answers never become one of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub action: OracleAction,
    pub patch: StatusPatch,
}

impl Recommendation {
    pub fn action_kind(&self) -> Option<ActionKind> {
        match self.action {
            OracleAction::Act(kind) => Some(kind),
            OracleAction::Hold => None,
        }
    }
}

/// What the oracle gets to see. Textual firewall: no history, no keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookSnapshot {
    pub epoch: PlanningEpoch,
    pub phase: CookPhase,
    pub current_side: Option<Side>,
    pub doneness: Option<f32>,
    pub max_doneness: f32,
    pub executed_seasoning: u32,
    pub expected_seasoning: u32,
    pub max_seasoning: u32,
    pub voice_command: Option<VoiceCommand>,
    pub allowed_actions: Vec<String>,
}
