use tokio::time::Instant;
use uuid::Uuid;

use super::action::{ActionKind, Origin};
use super::arbiter::Decision;
use super::event::DispatchId;
use crate::planner::types::CookSnapshot;

/// Work the driver must perform outside the kernel. The kernel never awaits.
#[derive(Debug, Clone)]
pub enum SideEffect {
    Dispatch {
        dispatch_id: DispatchId,
        kind: ActionKind,
        origin: Origin,
    },
    ConsultOracle(CookSnapshot),
}

/// The one actuator call currently in flight.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingDispatch {
    pub id: DispatchId,
    pub kind: ActionKind,
    pub origin: Origin,
    pub issued_at: Instant,
}

pub struct Scheduler;

impl Scheduler {
    /// Pure Projection: Decision + Context -> (PendingDispatch, SideEffect)
    pub fn schedule(&self, decision: Decision, now: Instant) -> (PendingDispatch, SideEffect) {
        let id = Uuid::new_v4();
        let pending = PendingDispatch {
            id,
            kind: decision.kind,
            origin: decision.origin,
            issued_at: now,
        };
        let effect = SideEffect::Dispatch {
            dispatch_id: id,
            kind: decision.kind,
            origin: decision.origin,
        };
        (pending, effect)
    }
}
