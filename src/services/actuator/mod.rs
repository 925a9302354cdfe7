pub mod client;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{ActuatorConfig, ActuatorFlavour};
use crate::error::ActuatorError;
use crate::kernel::action::ActionKind;

pub use client::{HttpActuator, InferenceActuator, SimulatedActuator};

/// The execution endpoint. Calls must be idempotent from the caller's
/// view: repeating a LOAD is safe.
#[async_trait]
pub trait Actuator: Send + Sync {
    async fn perform(&self, kind: ActionKind) -> Result<(), ActuatorError>;
}

pub fn from_config(config: &ActuatorConfig) -> Arc<dyn Actuator> {
    match config.flavour {
        ActuatorFlavour::Actions => Arc::new(HttpActuator::new(&config.base_url, config.timeout_secs)),
        ActuatorFlavour::Inference => {
            Arc::new(InferenceActuator::new(&config.base_url, config.timeout_secs))
        }
        ActuatorFlavour::Simulated => Arc::new(SimulatedActuator::default()),
    }
}
