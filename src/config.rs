use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::kernel::action::ActionKind;

pub const CONFIG_ENV: &str = "GRILL_CONFIG";

/// What to do with the automaton when the actuator call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// State unchanged, cooldown not consumed, retried on the next tick.
    #[default]
    Strict,
    /// Degraded operation: commit as if the actuator succeeded.
    /// Accepts the risk of state/actuator divergence.
    Permissive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActuatorFlavour {
    /// One REST endpoint per action (`/actions/turn_over`, ...).
    #[default]
    Actions,
    /// Policy-inference service (`/inference` with pick/transfer/place).
    Inference,
    /// No hardware. Every dispatch succeeds after a short delay.
    Simulated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActuatorConfig {
    pub flavour: ActuatorFlavour,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            flavour: ActuatorFlavour::Actions,
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub enabled: bool,
    /// OpenAI-compatible chat completions endpoint.
    pub url: String,
    pub model: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// System prompt file. A built-in prompt is used when absent or unreadable.
    pub prompt_file: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: "https://ark.cn-beijing.volces.com/api/v3/chat/completions".to_string(),
            model: "deepseek-v3-241226".to_string(),
            api_key: None,
            prompt_file: None,
            timeout_secs: 10,
        }
    }
}

/// Doneness thresholds on the configured scale `[0, max_doneness]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub flip: f32,
    pub season: f32,
    pub unload: f32,
    pub max_doneness: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            flip: 2.0,
            season: 3.0,
            unload: 4.0,
            max_doneness: 4.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub thresholds: Thresholds,
    pub max_seasoning: u32,
    /// Size W of the telemetry window; W equal readings mean "stuck".
    pub stuck_window: usize,
    pub stale_timeout_secs: u64,
    pub watchdog_period_secs: u64,
    pub poll_interval_ms: u64,
    pub decision_interval_secs: u64,
    pub flip_cooldown_secs: u64,
    pub season_cooldown_secs: u64,
    pub failure_policy: FailurePolicy,
    pub actuator: ActuatorConfig,
    pub oracle: OracleConfig,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            max_seasoning: 2,
            stuck_window: 10,
            stale_timeout_secs: 120,
            watchdog_period_secs: 5,
            poll_interval_ms: 1000,
            decision_interval_secs: 10,
            flip_cooldown_secs: 30,
            season_cooldown_secs: 15,
            failure_policy: FailurePolicy::Strict,
            actuator: ActuatorConfig::default(),
            oracle: OracleConfig::default(),
        }
    }
}

impl ControllerConfig {
    /// File named by `GRILL_CONFIG` (if any), then `GRILL_*` environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies overrides from a key lookup (the process environment in production).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("GRILL_ACTUATOR_URL") {
            self.actuator.base_url = url;
        }
        if let Some(value) = lookup("GRILL_ACTUATOR") {
            self.actuator.flavour = match value.to_lowercase().as_str() {
                "actions" => ActuatorFlavour::Actions,
                "inference" => ActuatorFlavour::Inference,
                "simulated" | "sim" => ActuatorFlavour::Simulated,
                _ => return Err(ConfigError::InvalidOverride { key: "GRILL_ACTUATOR", value }),
            };
        }
        if let Some(value) = lookup("GRILL_FAILURE_POLICY") {
            self.failure_policy = match value.to_lowercase().as_str() {
                "strict" => FailurePolicy::Strict,
                "permissive" => FailurePolicy::Permissive,
                _ => return Err(ConfigError::InvalidOverride { key: "GRILL_FAILURE_POLICY", value }),
            };
        }
        if let Some(url) = lookup("GRILL_ORACLE_URL") {
            self.oracle.url = url;
            self.oracle.enabled = true;
        }
        if let Some(model) = lookup("GRILL_ORACLE_MODEL") {
            self.oracle.model = model;
        }
        if let Some(key) = lookup("GRILL_ORACLE_KEY").or_else(|| lookup("ARK_API_KEY")) {
            self.oracle.api_key = Some(key);
        }
        if let Some(path) = lookup("GRILL_ORACLE_PROMPT") {
            self.oracle.prompt_file = Some(PathBuf::from(path));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.thresholds;
        if !(0.0 < t.flip && t.flip <= t.season && t.season <= t.unload && t.unload <= t.max_doneness) {
            return Err(ConfigError::Invalid(format!(
                "thresholds must satisfy 0 < flip <= season <= unload <= max_doneness, got {:?}",
                t
            )));
        }
        if self.stuck_window < 2 {
            return Err(ConfigError::Invalid("stuck_window must be at least 2".into()));
        }
        if self.watchdog_period_secs == 0
            || self.poll_interval_ms == 0
            || self.actuator.timeout_secs == 0
            || self.oracle.timeout_secs == 0
        {
            return Err(ConfigError::Invalid("timer periods and timeouts must be non-zero".into()));
        }
        if self.stale_timeout_secs <= self.watchdog_period_secs {
            return Err(ConfigError::Invalid(
                "stale_timeout_secs must exceed watchdog_period_secs".into(),
            ));
        }
        Ok(())
    }

    pub fn cooldown(&self, kind: ActionKind) -> Duration {
        match kind {
            ActionKind::Flip => Duration::from_secs(self.flip_cooldown_secs),
            ActionKind::Season => Duration::from_secs(self.season_cooldown_secs),
            _ => Duration::ZERO,
        }
    }

    pub fn stale_timeout(&self) -> Duration {
        Duration::from_secs(self.stale_timeout_secs)
    }

    pub fn watchdog_period(&self) -> Duration {
        Duration::from_secs(self.watchdog_period_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn decision_interval(&self) -> Duration {
        Duration::from_secs(self.decision_interval_secs)
    }

    pub fn actuator_timeout(&self) -> Duration {
        Duration::from_secs(self.actuator.timeout_secs)
    }

    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_secs(self.oracle.timeout_secs)
    }
}
