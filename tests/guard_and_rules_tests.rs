use std::time::Duration;
use tokio::time::Instant;

use grillctl::config::{ControllerConfig, Thresholds};
use grillctl::kernel::action::{ActionKind, Side};
use grillctl::kernel::guard::{Blocked, CooldownGuard};
use grillctl::kernel::rules::{RuleEngine, RuleInput};
use grillctl::kernel::state::{CookPhase, CookState, StateDelta};

fn input(phase: CookPhase, doneness: Option<f32>, count: u32) -> RuleInput {
    RuleInput {
        phase,
        doneness,
        seasoning_count: count,
        seasoning_target: 2,
    }
}

#[test]
fn test_cooldown_windows() {
    let config = ControllerConfig::default();
    let mut guard = CooldownGuard::new(&config);
    let t0 = Instant::now();

    assert!(guard.may_run(ActionKind::Flip, t0), "Absent cooldown means immediately allowed");

    guard.commit(ActionKind::Flip, t0);
    assert!(!guard.may_run(ActionKind::Flip, t0 + Duration::from_secs(29)));
    assert!(guard.may_run(ActionKind::Flip, t0 + Duration::from_secs(30)));
    assert!(guard.may_run(ActionKind::Season, t0), "Cooldowns are per kind");

    guard.commit(ActionKind::Unload, t0);
    assert!(guard.may_run(ActionKind::Unload, t0), "Zero cooldown kinds never block");

    match guard.blocked_reason(ActionKind::Flip, t0 + Duration::from_secs(10)) {
        Some(Blocked::CoolingDown { remaining }) => assert_eq!(remaining, Duration::from_secs(20)),
        other => panic!("Expected cooldown, got {:?}", other),
    }
}

#[test]
fn test_seasoning_limit() {
    let config = ControllerConfig::default();
    let mut guard = CooldownGuard::new(&config);
    let mut now = Instant::now();

    for _ in 0..2 {
        assert!(guard.may_run(ActionKind::Season, now));
        guard.commit(ActionKind::Season, now);
        now += Duration::from_secs(15);
    }

    assert_eq!(guard.seasoning_count(), 2);
    assert_eq!(
        guard.blocked_reason(ActionKind::Season, now),
        Some(Blocked::SeasoningLimit { count: 2, max: 2 })
    );

    guard.reset_counters();
    assert!(guard.may_run(ActionKind::Season, now), "Reset clears the counter");
}

#[test]
fn test_rule_engine_thresholds() {
    let rules = RuleEngine::new(Thresholds::default());

    assert_eq!(rules.recommend(&input(CookPhase::Idle, Some(4.0), 0)), None, "LOAD needs an external trigger");
    assert_eq!(rules.recommend(&input(CookPhase::LoadedSideA, None, 0)), None, "No reading, no recommendation");
    assert_eq!(rules.recommend(&input(CookPhase::LoadedSideA, Some(1.0), 0)), None);
    assert_eq!(rules.recommend(&input(CookPhase::LoadedSideA, Some(2.0), 0)), Some(ActionKind::Flip));

    assert_eq!(rules.recommend(&input(CookPhase::LoadedSideB, Some(2.5), 0)), None);
    assert_eq!(rules.recommend(&input(CookPhase::LoadedSideB, Some(3.0), 0)), Some(ActionKind::Season));
    assert_eq!(rules.recommend(&input(CookPhase::LoadedSideB, Some(3.0), 2)), None);
    assert_eq!(rules.recommend(&input(CookPhase::LoadedSideB, Some(4.0), 1)), Some(ActionKind::Season),
        "Season before unload while below target");
    assert_eq!(rules.recommend(&input(CookPhase::LoadedSideB, Some(4.0), 2)), Some(ActionKind::Unload));

    assert_eq!(rules.recommend(&input(CookPhase::Complete, Some(4.0), 2)), None);
    assert_eq!(rules.recommend(&input(CookPhase::EmergencyStopped, Some(4.0), 0)), None);
}

#[test]
fn test_edge_table() {
    use ActionKind::*;
    use CookPhase::*;

    assert_eq!(Idle.transition(Load), Some(LoadedSideA));
    assert_eq!(Idle.transition(Flip), None);
    assert_eq!(LoadedSideA.transition(Flip), Some(LoadedSideB));
    assert_eq!(LoadedSideA.transition(Season), None);
    assert_eq!(LoadedSideB.transition(Flip), None, "No flip back to side A");
    assert_eq!(LoadedSideB.transition(Season), Some(LoadedSideB));
    assert_eq!(LoadedSideB.transition(Unload), Some(Complete));

    for phase in [Idle, LoadedSideA, LoadedSideB] {
        assert_eq!(phase.transition(EmergencyStop), Some(EmergencyStopped));
    }
    for kind in ActionKind::ALL {
        assert_eq!(Complete.transition(kind), None, "COMPLETE is terminal");
        assert_eq!(EmergencyStopped.transition(kind), None, "EMERGENCY_STOPPED is terminal");
    }
}

#[test]
fn test_reducer_tracks_side_and_version() {
    let mut state = CookState::new(2);

    state.reduce(StateDelta::ActionCommitted(ActionKind::Load));
    assert_eq!(state.phase, CookPhase::LoadedSideA);
    assert_eq!(state.side, Some(Side::A));

    state.reduce(StateDelta::ActionCommitted(ActionKind::Flip));
    assert_eq!(state.side, Some(Side::B), "FLIP moves A to B");

    // Second flip has no edge: side must not move back.
    state.reduce(StateDelta::ActionCommitted(ActionKind::Flip));
    assert_eq!(state.side, Some(Side::B));
    assert_eq!(state.phase, CookPhase::LoadedSideB);

    state.reduce(StateDelta::ForcedReset);
    assert_eq!(state.phase, CookPhase::Idle);
    assert_eq!(state.side, None);
    assert_eq!(state.version, 4, "Every delta bumps the version");
}
