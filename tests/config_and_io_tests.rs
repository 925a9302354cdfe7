use std::collections::HashMap;

use grillctl::config::{ActuatorFlavour, ControllerConfig, FailurePolicy, Thresholds};
use grillctl::error::ConfigError;
use grillctl::kernel::action::{ActionKind, VoiceCommand};
use grillctl::services::actuator::{HttpActuator, InferenceActuator};
use grillctl::services::oracle::ChatOracle;
use grillctl::Reactor;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_defaults_are_valid() {
    let config = ControllerConfig::default();
    config.validate().expect("Default configuration must validate");
    assert_eq!(config.failure_policy, FailurePolicy::Strict);
    assert!(!config.oracle.enabled);
}

#[test]
fn test_env_overrides() {
    let mut config = ControllerConfig::default();
    config
        .apply_overrides(lookup(&[
            ("GRILL_ACTUATOR_URL", "http://grill.local:9000"),
            ("GRILL_ACTUATOR", "sim"),
            ("GRILL_FAILURE_POLICY", "Permissive"),
            ("GRILL_ORACLE_URL", "http://oracle.local/v1/chat/completions"),
            ("ARK_API_KEY", "secret"),
        ]))
        .unwrap();

    assert_eq!(config.actuator.base_url, "http://grill.local:9000");
    assert_eq!(config.actuator.flavour, ActuatorFlavour::Simulated);
    assert_eq!(config.failure_policy, FailurePolicy::Permissive);
    assert!(config.oracle.enabled, "Setting an oracle URL enables the oracle");
    assert_eq!(config.oracle.api_key.as_deref(), Some("secret"));

    let json = serde_json::to_string(&config).unwrap();
    assert!(!json.contains("secret"), "API key must never be serialised");
}

#[test]
fn test_bad_override_rejected() {
    let mut config = ControllerConfig::default();
    let err = config
        .apply_overrides(lookup(&[("GRILL_FAILURE_POLICY", "yolo")]))
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidOverride { key: "GRILL_FAILURE_POLICY", .. }));
}

#[test]
fn test_validation() {
    let bad_thresholds = ControllerConfig {
        thresholds: Thresholds {
            flip: 3.0,
            season: 2.0,
            ..Thresholds::default()
        },
        ..ControllerConfig::default()
    };
    assert!(bad_thresholds.validate().is_err(), "flip must not exceed season");

    let tiny_window = ControllerConfig {
        stuck_window: 1,
        ..ControllerConfig::default()
    };
    assert!(tiny_window.validate().is_err());

    let blind_watchdog = ControllerConfig {
        stale_timeout_secs: 5,
        watchdog_period_secs: 5,
        ..ControllerConfig::default()
    };
    assert!(blind_watchdog.validate().is_err(), "Watchdog must wake before the timeout");
}

#[test]
fn test_zero_io_timeouts_rejected() {
    let mut instant_actuator = ControllerConfig::default();
    instant_actuator.actuator.timeout_secs = 0;
    assert!(instant_actuator.validate().is_err(), "Every dispatch would time out at once");

    let mut instant_oracle = ControllerConfig::default();
    instant_oracle.oracle.timeout_secs = 0;
    assert!(instant_oracle.validate().is_err());
}

#[test]
fn test_partial_file_keeps_defaults() {
    let path = std::env::temp_dir().join(format!("grillctl-config-{}.json", std::process::id()));
    std::fs::write(
        &path,
        r#"{"stuck_window": 4, "thresholds": {"unload": 3.5}, "actuator": {"flavour": "inference"}}"#,
    )
    .unwrap();

    let config = ControllerConfig::from_file(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(config.stuck_window, 4);
    assert_eq!(config.thresholds.unload, 3.5);
    assert_eq!(config.thresholds.flip, 2.0);
    assert_eq!(config.actuator.flavour, ActuatorFlavour::Inference);
    assert_eq!(config.actuator.base_url, "http://localhost:8000");
    assert_eq!(config.max_seasoning, 2);
}

#[test]
fn test_missing_file_reports_path() {
    let err = ControllerConfig::from_file(std::path::Path::new("/nonexistent/grill.json")).unwrap_err();
    assert!(err.to_string().contains("/nonexistent/grill.json"));
}

#[test]
fn test_voice_vocabulary() {
    assert_eq!(VoiceCommand::from_code("0"), Some(VoiceCommand::Wake));
    assert_eq!(VoiceCommand::from_code("02"), Some(VoiceCommand::Load));
    assert_eq!(VoiceCommand::from_code("3"), Some(VoiceCommand::Load));
    assert_eq!(VoiceCommand::from_code("7"), None);

    assert_eq!("Turn over".parse::<VoiceCommand>().unwrap(), VoiceCommand::Flip);
    assert_eq!(" STOP ".parse::<VoiceCommand>().unwrap(), VoiceCommand::Stop);
    assert!("make me a sandwich".parse::<VoiceCommand>().is_err());

    assert_eq!(VoiceCommand::Wake.action(), None);
    assert_eq!(VoiceCommand::Stop.action(), Some(ActionKind::EmergencyStop));
}

#[test]
fn test_actuator_routes() {
    let http = HttpActuator::new("http://grill.local:8000/", 5);
    assert_eq!(http.endpoint(ActionKind::Load), "http://grill.local:8000/actions/put_on_grill");
    assert_eq!(http.endpoint(ActionKind::Flip), "http://grill.local:8000/actions/turn_over");
    assert_eq!(http.endpoint(ActionKind::Unload), "http://grill.local:8000/actions/take_off_grill");

    assert_eq!(InferenceActuator::policy(ActionKind::Flip), Some(("transfer", 20.0)));
    assert_eq!(InferenceActuator::policy(ActionKind::EmergencyStop), None);
}

#[test]
fn test_oracle_prompt_carries_snapshot() {
    let reactor = Reactor::new(ControllerConfig::default(), tokio::time::Instant::now());
    let message = ChatOracle::user_message(&reactor.snapshot());

    assert!(message.contains("\"allowed_actions\""));
    assert!(message.contains("Put on the grill"));
    assert!(!message.contains("api_key"), "Snapshot never carries credentials");
}
