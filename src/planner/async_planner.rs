use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::OracleError;
use crate::kernel::event::Event;
use crate::planner::types::CookSnapshot;
use crate::services::oracle::Oracle;

/// Asks the oracle off the controller task and posts the answer back,
/// tagged with the epoch it was computed for.
pub struct AsyncPlanner {
    oracle: Arc<dyn Oracle>,
    tx: mpsc::Sender<Event>,
    timeout: Duration,
}

impl AsyncPlanner {
    pub fn new(oracle: Arc<dyn Oracle>, tx: mpsc::Sender<Event>, timeout: Duration) -> Self {
        Self { oracle, tx, timeout }
    }

    pub fn dispatch(&self, snapshot: CookSnapshot) {
        let oracle = self.oracle.clone();
        let tx = self.tx.clone();
        let limit = self.timeout;
        let epoch = snapshot.epoch;

        tokio::spawn(async move {
            let result = match tokio::time::timeout(limit, oracle.consult(&snapshot)).await {
                Ok(result) => result,
                Err(_) => {
                    warn!("Oracle timed out after {:?}", limit);
                    Err(OracleError::Timeout(limit))
                }
            };
            debug!("Oracle answered for epoch {}: {:?}", epoch.state_version, result);
            // Controller gone means shutdown; nothing to report to.
            let _ = tx.send(Event::OracleProposed(epoch, result)).await;
        });
    }
}
