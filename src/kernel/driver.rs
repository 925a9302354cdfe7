use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::event::Event;
use super::scheduler::SideEffect;
use crate::error::ActuatorError;
use crate::planner::async_planner::AsyncPlanner;
use crate::services::actuator::Actuator;

/// Executes side effects off the controller task. Every call is bounded by
/// a hard timeout and reports back as an event; nothing here touches state.
pub struct Driver {
    actuator: Arc<dyn Actuator>,
    planner: Option<AsyncPlanner>,
    tx: mpsc::Sender<Event>,
    actuator_timeout: Duration,
}

impl Driver {
    pub fn new(
        actuator: Arc<dyn Actuator>,
        planner: Option<AsyncPlanner>,
        tx: mpsc::Sender<Event>,
        actuator_timeout: Duration,
    ) -> Self {
        Self {
            actuator,
            planner,
            tx,
            actuator_timeout,
        }
    }

    pub fn execute(&self, effect: SideEffect) {
        match effect {
            SideEffect::Dispatch { dispatch_id, kind, origin } => {
                let actuator = self.actuator.clone();
                let tx = self.tx.clone();
                let limit = self.actuator_timeout;

                tokio::spawn(async move {
                    debug!("Actuator <- {} ({:?}) [{}]", kind, origin, dispatch_id);
                    let outcome = match tokio::time::timeout(limit, actuator.perform(kind)).await {
                        Ok(result) => result,
                        Err(_) => Err(ActuatorError::Timeout(limit)),
                    };
                    let _ = tx.send(Event::ActuatorReport { dispatch_id, outcome }).await;
                });
            }
            SideEffect::ConsultOracle(snapshot) => match &self.planner {
                Some(planner) => planner.dispatch(snapshot),
                None => warn!("Oracle consult requested but no oracle is configured"),
            },
        }
    }
}
