use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::action::{ActionKind, Origin, Side, VoiceCommand};
use super::arbiter::{ArbiterInput, Decision, DecisionArbiter};
use super::driver::Driver;
use super::event::{DispatchId, Event, InputContent, InputEvent};
use super::guard::CooldownGuard;
use super::rules::RuleEngine;
use super::scheduler::{PendingDispatch, Scheduler, SideEffect};
use super::state::{CookPhase, CookState, StateDelta};
use super::telemetry::event::{DiscardKind, TelemetryEvent};
use super::telemetry::metrics::TelemetrySnapshot;
use super::telemetry::recorder::TelemetryRecorder;
use super::telemetry::window::TelemetryWindow;
use super::watchdog::{Watchdog, WatchdogVerdict};
use crate::config::{ControllerConfig, FailurePolicy};
use crate::error::{ActuatorError, OracleError};
use crate::planner::types::{CookSnapshot, PlanningEpoch, Recommendation};

/// Slack on top of the oracle timeout before a tick stops waiting for a
/// reply the planner should already have posted.
const ORACLE_GRACE: Duration = Duration::from_secs(1);

/// Why a decision pass runs. Only ticks ask the oracle, so an oracle
/// answer can never trigger another oracle request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecisionCause {
    Tick,
    Voice,
    Oracle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CooldownStatus {
    pub action: ActionKind,
    pub remaining_secs: f64,
}

/// Read-only view for observers (GUI, monitoring, console).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub phase: CookPhase,
    pub current_side: Option<Side>,
    pub seasoning_count: u32,
    pub seasoning_target: u32,
    pub max_seasoning: u32,
    pub cooldowns: Vec<CooldownStatus>,
    pub doneness: Option<f32>,
    pub staleness_secs: f64,
    pub stuck: bool,
    pub in_flight: Option<ActionKind>,
    pub pending_voice: Option<VoiceCommand>,
    pub version: u64,
    pub metrics: TelemetrySnapshot,
}

/// The grill process controller. Single writer of all cook state:
/// every mutation happens inside `handle` / `tick_step`, which never await.
pub struct Reactor {
    pub state: CookState,
    pub window: TelemetryWindow,
    pub guard: CooldownGuard,
    pub telemetry: TelemetryRecorder,
    arbiter: DecisionArbiter,
    watchdog: Watchdog,
    scheduler: Scheduler,
    config: ControllerConfig,

    pending_voice: Option<VoiceCommand>,
    /// Accepted oracle answer and the state version it is valid for.
    pending_recommendation: Option<(PlanningEpoch, Recommendation)>,
    in_flight: Option<PendingDispatch>,
    /// Outstanding oracle request and when it was issued.
    oracle_in_flight: Option<(PlanningEpoch, Instant)>,
    last_decision: Option<Instant>,
}

impl Reactor {
    pub fn new(config: ControllerConfig, now: Instant) -> Self {
        Self {
            state: CookState::new(config.max_seasoning),
            window: TelemetryWindow::new(config.stuck_window, now),
            guard: CooldownGuard::new(&config),
            telemetry: TelemetryRecorder::new(),
            arbiter: DecisionArbiter::new(RuleEngine::new(config.thresholds)),
            watchdog: Watchdog::new(config.stale_timeout(), config.thresholds),
            scheduler: Scheduler,
            config,
            pending_voice: None,
            pending_recommendation: None,
            in_flight: None,
            oracle_in_flight: None,
            last_decision: None,
        }
    }

    /// Event Step: reduce one event. Returns SideEffects for the driver.
    /// MUST NOT await I/O or timers.
    pub fn handle(&mut self, event: Event, now: Instant) -> Vec<SideEffect> {
        match event {
            Event::Input(input) => self.handle_input(input, now),
            Event::OracleProposed(epoch, result) => self.handle_oracle(epoch, result, now),
            Event::ActuatorReport { dispatch_id, outcome } => {
                self.handle_report(dispatch_id, outcome, now);
                Vec::new()
            }
            Event::WatchdogWake => self.watchdog_step(now),
        }
    }

    /// Control-loop tick. Decides immediately when a voice command is
    /// pending, otherwise once per decision interval.
    pub fn tick_step(&mut self, now: Instant) -> Vec<SideEffect> {
        let due = match self.last_decision {
            Some(at) => now.saturating_duration_since(at) >= self.config.decision_interval(),
            None => true,
        };
        if self.pending_voice.is_some() || due {
            self.decide(now, DecisionCause::Tick)
        } else {
            Vec::new()
        }
    }

    fn handle_input(&mut self, input: InputEvent, now: Instant) -> Vec<SideEffect> {
        match input.content {
            InputContent::Doneness(value) => {
                if !value.is_finite() {
                    warn!("Dropped non-finite doneness {} from {}", value, input.source);
                    return Vec::new();
                }
                let clamped = value.clamp(0.0, self.config.thresholds.max_doneness);
                if clamped != value {
                    debug!("Doneness {} from {} clamped to {}", value, input.source, clamped);
                }
                self.window.record(clamped, now);
                Vec::new()
            }
            InputContent::Voice(VoiceCommand::Wake) => {
                info!("Wake word from {}", input.source);
                Vec::new()
            }
            InputContent::Voice(command) => {
                if let Some(previous) = self.pending_voice.replace(command) {
                    info!("Voice {:?} replaces pending {:?}", command, previous);
                } else {
                    info!("Voice {:?} from {}", command, input.source);
                }
                self.decide(now, DecisionCause::Voice)
            }
            InputContent::Reinitialize => {
                info!("Re-initialised by {} from {:?}", input.source, self.state.phase);
                self.clear_cook(StateDelta::Reinitialized, now);
                Vec::new()
            }
        }
    }

    fn handle_oracle(
        &mut self,
        epoch: PlanningEpoch,
        result: Result<Recommendation, OracleError>,
        now: Instant,
    ) -> Vec<SideEffect> {
        // One request at a time, so any answer closes it.
        self.oracle_in_flight = None;

        let recommendation = match result {
            Ok(rec) => rec,
            Err(e) => {
                let reason = match e {
                    OracleError::Transport(_) | OracleError::Status(_) | OracleError::Timeout(_) => {
                        DiscardKind::Unavailable
                    }
                    _ => DiscardKind::Invalid,
                };
                warn!("Discarded oracle reply: {}", e);
                self.telemetry.record(TelemetryEvent::OracleDiscarded { reason });
                // The tick was holding for this answer; let the rules decide.
                return self.decide(now, DecisionCause::Oracle);
            }
        };

        // STALE REJECTION: the state moved on since the oracle was asked.
        if epoch.state_version != self.state.version {
            info!(
                "Discarded stale oracle reply: epoch {} vs state {}",
                epoch.state_version, self.state.version
            );
            self.telemetry.record(TelemetryEvent::OracleDiscarded { reason: DiscardKind::Stale });
            return self.decide(now, DecisionCause::Oracle);
        }

        if let Some(expected) = recommendation.patch.expected_seasoning {
            let target = expected.min(self.guard.max_seasoning());
            if target != self.state.seasoning_target {
                info!("Oracle set seasoning target {} (asked {})", target, expected);
                self.state.reduce(StateDelta::SeasoningTarget(target));
            }
        }

        // The patch is part of the answer; it stays valid for the patched state.
        let epoch = PlanningEpoch {
            state_version: self.state.version,
        };
        self.pending_recommendation = Some((epoch, recommendation));
        self.decide(now, DecisionCause::Oracle)
    }

    fn decide(&mut self, now: Instant, cause: DecisionCause) -> Vec<SideEffect> {
        let mut effects = Vec::new();

        if let Some(pending) = &self.in_flight {
            let stop_requested = self.pending_voice == Some(VoiceCommand::Stop);
            if !(stop_requested && pending.kind != ActionKind::EmergencyStop) {
                debug!("Dispatch {} ({}) in flight, decision deferred", pending.id, pending.kind);
                return effects;
            }
            warn!("Emergency stop preempts in-flight {}", pending.kind);
            self.telemetry.record(TelemetryEvent::Preempted { kind: pending.kind });
            self.in_flight = None;
        }

        self.last_decision = Some(now);
        self.drop_stale_recommendation();

        // A tick asks the oracle first and holds the rules until it answers
        // (or its deadline passes). Voice never waits.
        if cause == DecisionCause::Tick
            && self.pending_voice.is_none()
            && self.pending_recommendation.is_none()
            && self.awaiting_oracle(now)
        {
            if self.oracle_in_flight.is_none() {
                let snapshot = self.snapshot();
                self.oracle_in_flight = Some((snapshot.epoch, now));
                effects.push(SideEffect::ConsultOracle(snapshot));
            }
            return effects;
        }

        let recommendation = self.pending_recommendation.take().map(|(_, rec)| rec);

        let arbitration = self.arbiter.decide(&ArbiterInput {
            state: &self.state,
            doneness: self.window.latest(),
            voice: self.pending_voice,
            recommendation: recommendation.as_ref(),
            guard: &self.guard,
            now,
        });

        for rejection in &arbitration.rejected {
            match rejection.origin {
                Origin::Voice => {
                    // A voice command the guard refuses is dropped, not queued.
                    info!("Voice {} blocked: {:?}", rejection.kind, rejection.reason);
                    self.pending_voice = None;
                }
                Origin::Oracle => info!("Oracle {} blocked: {:?}", rejection.kind, rejection.reason),
                _ => debug!("{:?} {} blocked: {:?}", rejection.origin, rejection.kind, rejection.reason),
            }
            self.telemetry.record(TelemetryEvent::Blocked {
                kind: rejection.kind,
                origin: rejection.origin,
                reason: rejection.reason,
            });
        }

        if let Some(decision) = arbitration.chosen {
            effects.push(self.dispatch(decision, now));
        }
        effects
    }

    /// An answer held across a deferred decision is only usable while the
    /// state it was computed for is still current.
    fn drop_stale_recommendation(&mut self) {
        let stale = matches!(
            &self.pending_recommendation,
            Some((epoch, _)) if epoch.state_version != self.state.version
        );
        if stale {
            info!("Dropped held oracle reply: state moved to version {}", self.state.version);
            self.pending_recommendation = None;
            self.telemetry.record(TelemetryEvent::OracleDiscarded { reason: DiscardKind::Stale });
        }
    }

    /// Whether a tick should wait on the oracle. A request past its deadline
    /// is written off so a silent oracle cannot stall the rule engine.
    fn awaiting_oracle(&mut self, now: Instant) -> bool {
        if !self.config.oracle.enabled || self.state.phase.is_terminal() {
            return false;
        }
        if let Some((epoch, asked_at)) = self.oracle_in_flight {
            let waited = now.saturating_duration_since(asked_at);
            if waited >= self.config.oracle_timeout() + ORACLE_GRACE {
                warn!(
                    "Oracle request for epoch {} unanswered after {:?}, deciding without it",
                    epoch.state_version, waited
                );
                self.oracle_in_flight = None;
                self.telemetry.record(TelemetryEvent::OracleDiscarded {
                    reason: DiscardKind::Unavailable,
                });
                return false;
            }
        }
        true
    }

    fn dispatch(&mut self, decision: Decision, now: Instant) -> SideEffect {
        let (pending, effect) = self.scheduler.schedule(decision, now);
        info!(
            "Dispatching {} ({:?}) in {:?}, doneness {:?}",
            decision.kind,
            decision.origin,
            self.state.phase,
            self.window.latest()
        );
        self.telemetry.record(TelemetryEvent::Dispatched {
            kind: decision.kind,
            origin: decision.origin,
        });
        self.in_flight = Some(pending);
        effect
    }

    fn handle_report(&mut self, id: DispatchId, outcome: Result<(), ActuatorError>, now: Instant) {
        let pending = match self.in_flight.take() {
            Some(p) if p.id == id => p,
            other => {
                self.in_flight = other;
                debug!("Ignored late actuator report for {}", id);
                self.telemetry.record(TelemetryEvent::LateReport);
                return;
            }
        };

        debug!(
            "Actuator answered {} after {:?}",
            pending.kind,
            now.saturating_duration_since(pending.issued_at)
        );
        match outcome {
            Ok(()) => self.commit(&pending, now, false),
            Err(e) => match self.config.failure_policy {
                FailurePolicy::Permissive => {
                    warn!("Actuator failed on {}: {}. Permissive policy, committing anyway", pending.kind, e);
                    self.commit(&pending, now, true);
                }
                FailurePolicy::Strict => {
                    warn!("Actuator failed on {}: {}. State unchanged, will retry", pending.kind, e);
                    self.telemetry.record(TelemetryEvent::ActuatorFailed {
                        kind: pending.kind,
                        origin: pending.origin,
                    });
                }
            },
        }
    }

    fn commit(&mut self, pending: &PendingDispatch, now: Instant, tolerated_failure: bool) {
        if self.state.phase.transition(pending.kind).is_none() {
            warn!("Dropped {}: no edge from {:?}", pending.kind, self.state.phase);
            return;
        }

        self.state.reduce(StateDelta::ActionCommitted(pending.kind));
        self.guard.commit(pending.kind, now);
        self.window.rebase(now);

        let voice_done = self.pending_voice.and_then(|cmd| cmd.action()) == Some(pending.kind);
        if voice_done || pending.kind == ActionKind::EmergencyStop {
            self.pending_voice = None;
        }
        if self.state.phase.is_terminal() {
            self.pending_recommendation = None;
        }

        info!(
            "Committed {} ({:?}): {:?}, side {:?}, seasoning {}/{}",
            pending.kind,
            pending.origin,
            self.state.phase,
            self.state.side,
            self.guard.seasoning_count(),
            self.state.seasoning_target
        );
        self.telemetry.record(TelemetryEvent::Committed {
            kind: pending.kind,
            origin: pending.origin,
            tolerated_failure,
        });
    }

    /// Watchdog wake: staleness reset first, then stuck-telemetry forcing.
    pub fn watchdog_step(&mut self, now: Instant) -> Vec<SideEffect> {
        match self.watchdog.inspect(self.state.phase, &self.window, now) {
            WatchdogVerdict::Healthy => Vec::new(),
            WatchdogVerdict::Reset { staleness } => {
                if self.in_flight.as_ref().is_some_and(|p| p.kind == ActionKind::EmergencyStop) {
                    warn!(
                        "No doneness progress for {:?}, reset deferred: emergency stop in flight",
                        staleness
                    );
                    return Vec::new();
                }
                warn!(
                    "No doneness progress for {:?} in {:?}, forcing reset to IDLE",
                    staleness, self.state.phase
                );
                self.clear_cook(StateDelta::ForcedReset, now);
                self.telemetry.record(TelemetryEvent::ForcedReset {
                    staleness_secs: staleness.as_secs(),
                });
                Vec::new()
            }
            WatchdogVerdict::Force(kind) => {
                if self.in_flight.is_some() {
                    debug!("Watchdog wants {} but a dispatch is in flight", kind);
                    return Vec::new();
                }
                if let Err(reason) = DecisionArbiter::admit(kind, &self.state, &self.guard, now) {
                    info!("Watchdog {} blocked: {:?}", kind, reason);
                    self.telemetry.record(TelemetryEvent::Blocked {
                        kind,
                        origin: Origin::Watchdog,
                        reason,
                    });
                    return Vec::new();
                }
                warn!("Doneness stuck at {:?}, watchdog forcing {}", self.window.latest(), kind);
                vec![self.dispatch(Decision { kind, origin: Origin::Watchdog }, now)]
            }
        }
    }

    /// Drops the cook in progress. Any in-flight dispatch is abandoned and
    /// its report will be ignored. Cooldowns survive.
    fn clear_cook(&mut self, delta: StateDelta, now: Instant) {
        if let Some(abandoned) = self.in_flight.take() {
            info!("Abandoned in-flight {}", abandoned.kind);
        }
        self.state.reduce(delta);
        if self.state.seasoning_target != self.config.max_seasoning {
            self.state.reduce(StateDelta::SeasoningTarget(self.config.max_seasoning));
        }
        self.guard.reset_counters();
        self.pending_voice = None;
        self.pending_recommendation = None;
        self.window.rebase(now);
    }

    pub fn snapshot(&self) -> CookSnapshot {
        let allowed_actions = ActionKind::ALL
            .iter()
            .filter(|kind| self.state.phase.transition(**kind).is_some())
            .map(|kind| kind.oracle_phrase().to_string())
            .collect();

        CookSnapshot {
            epoch: PlanningEpoch {
                state_version: self.state.version,
            },
            phase: self.state.phase,
            current_side: self.state.side,
            doneness: self.window.latest(),
            max_doneness: self.config.thresholds.max_doneness,
            executed_seasoning: self.guard.seasoning_count(),
            expected_seasoning: self.state.seasoning_target,
            max_seasoning: self.guard.max_seasoning(),
            voice_command: self.pending_voice,
            allowed_actions,
        }
    }

    pub fn status(&self, now: Instant) -> StatusReport {
        StatusReport {
            phase: self.state.phase,
            current_side: self.state.side,
            seasoning_count: self.guard.seasoning_count(),
            seasoning_target: self.state.seasoning_target,
            max_seasoning: self.guard.max_seasoning(),
            cooldowns: self
                .guard
                .remaining(now)
                .into_iter()
                .map(|(action, remaining)| CooldownStatus {
                    action,
                    remaining_secs: remaining.as_secs_f64(),
                })
                .collect(),
            doneness: self.window.latest(),
            staleness_secs: self.window.staleness(now).as_secs_f64(),
            stuck: self.window.is_stuck(),
            in_flight: self.in_flight.as_ref().map(|p| p.kind),
            pending_voice: self.pending_voice,
            version: self.state.version,
            metrics: self.telemetry.snapshot(),
        }
    }

    pub fn in_flight(&self) -> Option<&PendingDispatch> {
        self.in_flight.as_ref()
    }

    pub fn pending_voice(&self) -> Option<VoiceCommand> {
        self.pending_voice
    }

    /// Async Driver Loop. Owns the reactor until the token is cancelled
    /// or every sender is dropped.
    pub async fn run(
        mut self,
        mut receiver: mpsc::Receiver<Event>,
        driver: Driver,
        status: watch::Sender<StatusReport>,
        cancel: CancellationToken,
    ) {
        info!("Controller started. Poll: {:?}", self.config.poll_interval());

        let mut cadence = interval(self.config.poll_interval());
        cadence.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let effects = tokio::select! {
                _ = cancel.cancelled() => break,
                _ = cadence.tick() => self.tick_step(Instant::now()),
                event = receiver.recv() => match event {
                    Some(event) => self.handle(event, Instant::now()),
                    None => break,
                },
            };

            for effect in effects {
                driver.execute(effect);
            }
            status.send_replace(self.status(Instant::now()));
        }

        info!("Controller stopped in {:?}", self.state.phase);
    }
}
