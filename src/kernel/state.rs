use serde::{Deserialize, Serialize};
use tracing::warn;

use super::action::{ActionKind, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CookPhase {
    Idle,
    LoadedSideA,
    LoadedSideB,
    Complete,
    EmergencyStopped,
}

impl Default for CookPhase {
    fn default() -> Self {
        Self::Idle
    }
}

impl CookPhase {
    /// The structural edge table. Thresholds are not checked here: they
    /// belong to the rule engine, and overrides may bypass them.
    /// Returns None if the edge does not exist.
    pub fn transition(self, kind: ActionKind) -> Option<CookPhase> {
        use ActionKind::*;
        use CookPhase::*;

        match (self, kind) {
            (Complete | EmergencyStopped, _) => None,
            (_, EmergencyStop) => Some(EmergencyStopped),

            (Idle, Load) => Some(LoadedSideA),
            (LoadedSideA, Flip) => Some(LoadedSideB),
            (LoadedSideB, Season) => Some(LoadedSideB),
            (LoadedSideB, Unload) => Some(Complete),

            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, CookPhase::Complete | CookPhase::EmergencyStopped)
    }

    /// Food is on the grate.
    pub fn is_cooking(self) -> bool {
        matches!(self, CookPhase::LoadedSideA | CookPhase::LoadedSideB)
    }
}

/// Strict state delta. This is the ONLY way cook state mutates.
#[derive(Debug, Clone, PartialEq)]
pub enum StateDelta {
    ActionCommitted(ActionKind),
    /// Watchdog staleness reset: back to IDLE, side cleared.
    ForcedReset,
    /// External re-initialisation, the only way out of a terminal phase.
    Reinitialized,
    SeasoningTarget(u32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CookState {
    pub phase: CookPhase,
    pub side: Option<Side>,
    /// How many seasonings the rule engine aims for. Never above the guard's limit.
    pub seasoning_target: u32,
    /// Monotonic version for oracle epoch validation.
    pub version: u64,
}

impl CookState {
    pub fn new(seasoning_target: u32) -> Self {
        Self {
            phase: CookPhase::Idle,
            side: None,
            seasoning_target,
            version: 0,
        }
    }

    /// Pure reduction: State + Delta -> Mutated State
    pub fn reduce(&mut self, delta: StateDelta) {
        self.version += 1;

        match delta {
            StateDelta::ActionCommitted(kind) => {
                let Some(next) = self.phase.transition(kind) else {
                    warn!("Ignored {} in {:?}: no such edge", kind, self.phase);
                    return;
                };
                match kind {
                    ActionKind::Load => self.side = Some(Side::A),
                    ActionKind::Flip => {
                        self.side = Some(self.side.map(Side::flipped).unwrap_or(Side::B));
                    }
                    _ => {}
                }
                self.phase = next;
            }
            StateDelta::ForcedReset | StateDelta::Reinitialized => {
                self.phase = CookPhase::Idle;
                self.side = None;
            }
            StateDelta::SeasoningTarget(target) => {
                self.seasoning_target = target;
            }
        }
    }
}
