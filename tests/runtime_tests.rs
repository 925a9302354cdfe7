use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::BufReader;
use tokio::sync::watch;

use grillctl::config::ControllerConfig;
use grillctl::console;
use grillctl::error::OracleError;
use grillctl::kernel::action::{ActionKind, VoiceCommand};
use grillctl::kernel::reactor::StatusReport;
use grillctl::kernel::state::CookPhase;
use grillctl::planner::types::{CookSnapshot, OracleAction, Recommendation, StatusPatch};
use grillctl::services::actuator::SimulatedActuator;
use grillctl::services::oracle::Oracle;
use grillctl::Controller;

/// Oracle that always gives the same answer and counts how often it was asked.
struct FixedOracle {
    answer: ActionKind,
    asked: AtomicUsize,
}

#[async_trait]
impl Oracle for FixedOracle {
    async fn consult(&self, _snapshot: &CookSnapshot) -> Result<Recommendation, OracleError> {
        self.asked.fetch_add(1, Ordering::SeqCst);
        Ok(Recommendation {
            action: OracleAction::Act(self.answer),
            patch: StatusPatch::default(),
        })
    }
}

fn fast_config() -> ControllerConfig {
    ControllerConfig {
        poll_interval_ms: 100,
        decision_interval_secs: 1,
        watchdog_period_secs: 1,
        stale_timeout_secs: 30,
        flip_cooldown_secs: 1,
        season_cooldown_secs: 1,
        ..ControllerConfig::default()
    }
}

async fn wait_until<F>(rx: &mut watch::Receiver<StatusReport>, what: &str, condition: F)
where
    F: FnMut(&StatusReport) -> bool,
{
    let reached = matches!(
        tokio::time::timeout(Duration::from_secs(120), rx.wait_for(condition)).await,
        Ok(Ok(_))
    );
    if !reached {
        panic!("Timed out waiting for {}; last status {:?}", what, *rx.borrow());
    }
}

#[tokio::test(start_paused = true)]
async fn test_controller_full_cook() {
    let actuator = Arc::new(SimulatedActuator::with_latency(Duration::from_millis(50)));
    let controller = Controller::spawn(fast_config(), actuator.clone(), None);
    let handle = controller.handle.clone();
    let mut status = handle.subscribe();

    handle.send_voice("test", VoiceCommand::Wake).await.unwrap();
    handle.send_voice("test", VoiceCommand::Load).await.unwrap();
    wait_until(&mut status, "LOADED_SIDE_A", |s| s.phase == CookPhase::LoadedSideA).await;

    handle.send_doneness("sensor", 2.0).await.unwrap();
    wait_until(&mut status, "LOADED_SIDE_B", |s| s.phase == CookPhase::LoadedSideB).await;

    handle.send_doneness("sensor", 3.0).await.unwrap();
    wait_until(&mut status, "two seasonings", |s| s.seasoning_count == 2).await;

    handle.send_doneness("sensor", 4.0).await.unwrap();
    wait_until(&mut status, "COMPLETE", |s| s.phase == CookPhase::Complete).await;

    assert_eq!(
        actuator.performed(),
        vec![
            ActionKind::Load,
            ActionKind::Flip,
            ActionKind::Season,
            ActionKind::Season,
            ActionKind::Unload
        ]
    );

    handle.shutdown();
    controller.join().await;
}

#[tokio::test(start_paused = true)]
async fn test_controller_retries_after_strict_failure() {
    let actuator = Arc::new(SimulatedActuator::default());
    actuator.fail_next(1);
    let controller = Controller::spawn(fast_config(), actuator.clone(), None);
    let handle = controller.handle.clone();
    let mut status = handle.subscribe();

    handle.send_voice("test", VoiceCommand::Load).await.unwrap();
    wait_until(&mut status, "LOADED_SIDE_A", |s| s.phase == CookPhase::LoadedSideA).await;

    let last = handle.status();
    assert_eq!(last.metrics.actuator_failures, 1);
    assert_eq!(last.metrics.committed, 1);
    assert_eq!(actuator.performed(), vec![ActionKind::Load]);

    handle.shutdown();
    controller.join().await;
}

#[tokio::test(start_paused = true)]
async fn test_controller_resets_silent_cook() {
    let actuator = Arc::new(SimulatedActuator::default());
    let controller = Controller::spawn(fast_config(), actuator.clone(), None);
    let handle = controller.handle.clone();
    let mut status = handle.subscribe();

    handle.send_voice("test", VoiceCommand::Load).await.unwrap();
    wait_until(&mut status, "LOADED_SIDE_A", |s| s.phase == CookPhase::LoadedSideA).await;

    // No doneness ever arrives.
    wait_until(&mut status, "forced reset", |s| s.metrics.resets == 1).await;
    assert_eq!(handle.status().phase, CookPhase::Idle);

    handle.shutdown();
    controller.join().await;
}

#[tokio::test(start_paused = true)]
async fn test_operator_reinitialize() {
    let actuator = Arc::new(SimulatedActuator::default());
    let controller = Controller::spawn(fast_config(), actuator.clone(), None);
    let handle = controller.handle.clone();
    let mut status = handle.subscribe();

    handle.send_voice("test", VoiceCommand::Stop).await.unwrap();
    wait_until(&mut status, "EMERGENCY_STOPPED", |s| s.phase == CookPhase::EmergencyStopped).await;

    handle.reinitialize("operator").await.unwrap();
    wait_until(&mut status, "IDLE", |s| s.phase == CookPhase::Idle).await;

    handle.shutdown();
    controller.join().await;
}

#[tokio::test(start_paused = true)]
async fn test_oracle_outranks_rules_in_live_loop() {
    let mut config = fast_config();
    config.oracle.enabled = true;
    let actuator = Arc::new(SimulatedActuator::default());
    let oracle = Arc::new(FixedOracle {
        answer: ActionKind::Unload,
        asked: AtomicUsize::new(0),
    });
    let controller = Controller::spawn(config, actuator.clone(), Some(oracle.clone() as Arc<dyn Oracle>));
    let handle = controller.handle.clone();
    let mut status = handle.subscribe();

    handle.send_voice("test", VoiceCommand::Load).await.unwrap();
    wait_until(&mut status, "LOADED_SIDE_A", |s| s.phase == CookPhase::LoadedSideA).await;

    // UNLOAD has no edge from side A, so the rules flip. On side B at 3.0
    // the rules want SEASON but the oracle's UNLOAD must win.
    handle.send_doneness("sensor", 3.0).await.unwrap();
    wait_until(&mut status, "COMPLETE", |s| s.phase == CookPhase::Complete).await;

    assert_eq!(
        actuator.performed(),
        vec![ActionKind::Load, ActionKind::Flip, ActionKind::Unload]
    );
    let last = handle.status();
    assert_eq!(last.seasoning_count, 0, "Oracle answer pre-empted the rule engine's SEASON");
    assert!(oracle.asked.load(Ordering::SeqCst) >= 2);
    assert!(last.metrics.blocked >= 1, "UNLOAD on side A is journaled as blocked");

    handle.shutdown();
    controller.join().await;
}

#[tokio::test(start_paused = true)]
async fn test_console_eof_keeps_controller_running() {
    let actuator = Arc::new(SimulatedActuator::default());
    let controller = Controller::spawn(fast_config(), actuator.clone(), None);
    let handle = controller.handle.clone();
    let mut status = handle.subscribe();

    console::run(&handle, BufReader::new(&b"v load\nbogus\n"[..])).await;
    assert!(!handle.cancellation().is_cancelled(), "Closed input is not a quit");
    wait_until(&mut status, "LOADED_SIDE_A", |s| s.phase == CookPhase::LoadedSideA).await;

    console::run(&handle, BufReader::new(&b"quit\n"[..])).await;
    assert!(handle.cancellation().is_cancelled(), "Explicit quit stops the controller");
    controller.join().await;
}
