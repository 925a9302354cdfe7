use super::action::ActionKind;
use super::state::CookPhase;
use crate::config::Thresholds;

/// Inputs the rule engine looks at. Everything is by value: the engine
/// holds no state and performs no I/O.
#[derive(Debug, Clone, Copy)]
pub struct RuleInput {
    pub phase: CookPhase,
    /// Latest doneness of the side on the grate. None before the first reading.
    pub doneness: Option<f32>,
    pub seasoning_count: u32,
    pub seasoning_target: u32,
}

pub struct RuleEngine {
    thresholds: Thresholds,
}

impl RuleEngine {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    /// Pure function: (phase, doneness, counters) -> recommended action.
    /// LOAD and EMERGENCY_STOP are never recommended; they need an external trigger.
    pub fn recommend(&self, input: &RuleInput) -> Option<ActionKind> {
        let doneness = input.doneness?;
        let t = &self.thresholds;

        match input.phase {
            CookPhase::LoadedSideA => (doneness >= t.flip).then_some(ActionKind::Flip),
            CookPhase::LoadedSideB => {
                // Season first; unload once the target is met.
                if doneness >= t.season && input.seasoning_count < input.seasoning_target {
                    Some(ActionKind::Season)
                } else if doneness >= t.unload {
                    Some(ActionKind::Unload)
                } else {
                    None
                }
            }
            CookPhase::Idle | CookPhase::Complete | CookPhase::EmergencyStopped => None,
        }
    }
}
