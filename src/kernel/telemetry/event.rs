use serde::{Deserialize, Serialize};

use crate::kernel::action::{ActionKind, Origin};

// Allowed: kinds, origins, counts, durations.
// Forbidden: oracle text, API keys, raw payloads.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TelemetryEvent {
    Dispatched {
        kind: ActionKind,
        origin: Origin,
    },

    Committed {
        kind: ActionKind,
        origin: Origin,
        /// Actuator failed but the permissive policy committed anyway.
        tolerated_failure: bool,
    },

    Blocked {
        kind: ActionKind,
        origin: Origin,
        reason: BlockKind,
    },

    ActuatorFailed {
        kind: ActionKind,
        origin: Origin,
    },

    Preempted {
        kind: ActionKind,
    },

    ForcedReset {
        staleness_secs: u64,
    },

    OracleDiscarded {
        reason: DiscardKind,
    },

    /// Actuator report for a dispatch that is no longer in flight.
    LateReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    CoolingDown,
    SeasoningLimit,
    NoTransition,
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscardKind {
    /// Computed for an older state version.
    Stale,
    /// Unparseable or unknown action.
    Invalid,
    /// Transport error or timeout.
    Unavailable,
}
