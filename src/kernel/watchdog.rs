use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::action::ActionKind;
use super::event::Event;
use super::state::CookPhase;
use super::telemetry::window::TelemetryWindow;
use crate::config::Thresholds;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogVerdict {
    Healthy,
    /// Telemetry went silent mid-cook. Discard the cook, back to IDLE.
    Reset { staleness: Duration },
    /// Telemetry is stuck below the next threshold. Push the cook forward.
    Force(ActionKind),
}

/// Safety monitor. The verdict is pure; the controller applies it through
/// the same commit path as any other decision.
#[derive(Debug, Clone)]
pub struct Watchdog {
    timeout: Duration,
    thresholds: Thresholds,
}

impl Watchdog {
    pub fn new(timeout: Duration, thresholds: Thresholds) -> Self {
        Self { timeout, thresholds }
    }

    pub fn inspect(&self, phase: CookPhase, window: &TelemetryWindow, now: Instant) -> WatchdogVerdict {
        let staleness = window.staleness(now);
        if staleness > self.timeout && phase.is_cooking() {
            return WatchdogVerdict::Reset { staleness };
        }

        if !window.is_stuck() {
            return WatchdogVerdict::Healthy;
        }

        let Some(doneness) = window.latest() else {
            return WatchdogVerdict::Healthy;
        };
        match phase {
            CookPhase::LoadedSideA if doneness < self.thresholds.flip => {
                WatchdogVerdict::Force(ActionKind::Flip)
            }
            CookPhase::LoadedSideB if doneness < self.thresholds.season => {
                WatchdogVerdict::Force(ActionKind::Season)
            }
            _ => WatchdogVerdict::Healthy,
        }
    }
}

/// Independent timer posting `WatchdogWake` onto the controller channel.
/// Never touches state itself, so a stalled actuator call cannot hold it up.
pub fn spawn_timer(
    period: Duration,
    tx: mpsc::Sender<Event>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut cadence = interval(period);
        cadence.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // First tick completes immediately; the first real wake is one period out.
        cadence.tick().await;

        info!("Watchdog armed. Period: {:?}", period);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = cadence.tick() => {
                    if tx.send(Event::WatchdogWake).await.is_err() {
                        debug!("Controller gone, watchdog exiting");
                        break;
                    }
                }
            }
        }
    })
}
