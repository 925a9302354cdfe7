use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid value for {key}: {value:?}")]
    InvalidOverride { key: &'static str, value: String },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Outcome of a failed actuator dispatch. Never fatal: the controller
/// applies its failure policy and carries on.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ActuatorError {
    #[error("actuator unreachable: {0}")]
    Transport(String),
    #[error("actuator rejected command with status {0}")]
    Rejected(u16),
    #[error("actuator did not answer within {0:?}")]
    Timeout(Duration),
}

/// Everything that can go wrong between asking the oracle and holding
/// a usable recommendation. All variants fall back to the rule engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OracleError {
    #[error("oracle request failed: {0}")]
    Transport(String),
    #[error("oracle answered with status {0}")]
    Status(u16),
    #[error("oracle did not answer within {0:?}")]
    Timeout(Duration),
    #[error("oracle reply is not valid JSON: {0}")]
    Malformed(String),
    #[error("oracle reply carries no action field")]
    MissingAction,
    #[error("oracle proposed an unknown action: {0:?}")]
    UnknownAction(String),
}
