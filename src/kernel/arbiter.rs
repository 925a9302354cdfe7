use tokio::time::Instant;
use tracing::debug;

use super::action::{ActionKind, Origin, VoiceCommand};
use super::guard::CooldownGuard;
use super::rules::{RuleEngine, RuleInput};
use super::state::CookState;
use super::telemetry::event::BlockKind;
use crate::planner::types::Recommendation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub kind: ActionKind,
    pub origin: Origin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rejection {
    pub kind: ActionKind,
    pub origin: Origin,
    pub reason: BlockKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Arbitration {
    pub chosen: Option<Decision>,
    /// Candidates that lost because they were not admissible, in priority order.
    pub rejected: Vec<Rejection>,
}

pub struct ArbiterInput<'a> {
    pub state: &'a CookState,
    pub doneness: Option<f32>,
    pub voice: Option<VoiceCommand>,
    pub recommendation: Option<&'a Recommendation>,
    pub guard: &'a CooldownGuard,
    pub now: Instant,
}

pub struct DecisionArbiter {
    rules: RuleEngine,
}

impl DecisionArbiter {
    pub fn new(rules: RuleEngine) -> Self {
        Self { rules }
    }

    /// An action is admissible if the edge exists from the current phase
    /// and the guard lets it run now.
    pub fn admit(
        kind: ActionKind,
        state: &CookState,
        guard: &CooldownGuard,
        now: Instant,
    ) -> Result<(), BlockKind> {
        if state.phase.transition(kind).is_none() {
            return Err(BlockKind::NoTransition);
        }
        match guard.blocked_reason(kind, now) {
            Some(blocked) => Err(blocked.into()),
            None => Ok(()),
        }
    }

    /// Priority: voice override > oracle > rule engine > no-op.
    /// First admissible candidate wins.
    pub fn decide(&self, input: &ArbiterInput<'_>) -> Arbitration {
        let mut arbitration = Arbitration::default();

        // 1. Voice override
        let voice = input.voice.and_then(|cmd| cmd.action());
        // 2. Oracle (already parsed; malformed replies never get here)
        let oracle = input.recommendation.and_then(Recommendation::action_kind);
        // 3. Rule engine
        let rules = self.rules.recommend(&RuleInput {
            phase: input.state.phase,
            doneness: input.doneness,
            seasoning_count: input.guard.seasoning_count(),
            seasoning_target: input.state.seasoning_target,
        });

        let candidates = [
            (voice, Origin::Voice),
            (oracle, Origin::Oracle),
            (rules, Origin::Rules),
        ];

        for (kind, origin) in candidates {
            let Some(kind) = kind else { continue };
            match Self::admit(kind, input.state, input.guard, input.now) {
                Ok(()) => {
                    arbitration.chosen = Some(Decision { kind, origin });
                    return arbitration;
                }
                Err(reason) => {
                    debug!("{:?} candidate {} not admissible: {:?}", origin, kind, reason);
                    arbitration.rejected.push(Rejection { kind, origin, reason });
                }
            }
        }

        // 4. No-op
        arbitration
    }
}
