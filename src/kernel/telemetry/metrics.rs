use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::event::{DiscardKind, TelemetryEvent};
use crate::kernel::action::Origin;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub dispatched: u64,
    pub committed: u64,
    pub tolerated_failures: u64,
    pub blocked: u64,
    pub actuator_failures: u64,
    pub preempted: u64,
    pub forced_actions: u64,
    pub resets: u64,
    pub oracle_stale: u64,
    pub oracle_invalid: u64,
    pub oracle_unavailable: u64,
    pub late_reports: u64,
}

pub fn compute_snapshot(events: &VecDeque<TelemetryEvent>) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();

    for event in events {
        match event {
            TelemetryEvent::Dispatched { origin, .. } => {
                snap.dispatched += 1;
                if *origin == Origin::Watchdog {
                    snap.forced_actions += 1;
                }
            }
            TelemetryEvent::Committed { tolerated_failure, .. } => {
                snap.committed += 1;
                if *tolerated_failure {
                    snap.tolerated_failures += 1;
                }
            }
            TelemetryEvent::Blocked { .. } => snap.blocked += 1,
            TelemetryEvent::ActuatorFailed { .. } => snap.actuator_failures += 1,
            TelemetryEvent::Preempted { .. } => snap.preempted += 1,
            TelemetryEvent::ForcedReset { .. } => snap.resets += 1,
            TelemetryEvent::OracleDiscarded { reason } => match reason {
                DiscardKind::Stale => snap.oracle_stale += 1,
                DiscardKind::Invalid => snap.oracle_invalid += 1,
                DiscardKind::Unavailable => snap.oracle_unavailable += 1,
            },
            TelemetryEvent::LateReport => snap.late_reports += 1,
        }
    }

    snap
}
