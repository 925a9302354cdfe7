use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

use super::Actuator;
use crate::error::ActuatorError;
use crate::kernel::action::ActionKind;

fn build_client(timeout_secs: u64) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs)) // Network-level timeout
        .build()
        .unwrap_or_default()
}

fn transport(e: reqwest::Error) -> ActuatorError {
    ActuatorError::Transport(e.to_string())
}

/// One REST endpoint per action: `POST {base}/actions/<name>`.
#[derive(Clone)]
pub struct HttpActuator {
    client: Client,
    base_url: String,
}

impl HttpActuator {
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        Self {
            client: build_client(timeout_secs),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self, kind: ActionKind) -> String {
        let name = match kind {
            ActionKind::Load => "put_on_grill",
            ActionKind::Flip => "turn_over",
            ActionKind::Season => "season",
            ActionKind::Unload => "take_off_grill",
            ActionKind::EmergencyStop => "emergency_stop",
        };
        format!("{}/actions/{}", self.base_url, name)
    }
}

#[async_trait]
impl Actuator for HttpActuator {
    async fn perform(&self, kind: ActionKind) -> Result<(), ActuatorError> {
        let response = self
            .client
            .post(self.endpoint(kind))
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(ActuatorError::Rejected(response.status().as_u16()));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct InferenceTask<'a> {
    task_name: &'a str,
    single_task: Option<&'a str>,
    control_time_s: f32,
}

/// Policy-inference execution service. Each action is a learned policy
/// run for a bounded control time.
#[derive(Clone)]
pub struct InferenceActuator {
    client: Client,
    base_url: String,
}

impl InferenceActuator {
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        Self {
            client: build_client(timeout_secs),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// (policy, control seconds). Seasoning reuses `pick` with a short run.
    pub fn policy(kind: ActionKind) -> Option<(&'static str, f32)> {
        match kind {
            ActionKind::Load => Some(("pick", 15.0)),
            ActionKind::Flip => Some(("transfer", 20.0)),
            ActionKind::Unload => Some(("place", 10.0)),
            ActionKind::Season => Some(("pick", 8.0)),
            ActionKind::EmergencyStop => None,
        }
    }
}

#[async_trait]
impl Actuator for InferenceActuator {
    async fn perform(&self, kind: ActionKind) -> Result<(), ActuatorError> {
        let request = match Self::policy(kind) {
            Some((task_name, control_time_s)) => {
                debug!("Inference task {} for {}s", task_name, control_time_s);
                self.client
                    .post(format!("{}/inference", self.base_url))
                    .json(&InferenceTask {
                        task_name,
                        single_task: None,
                        control_time_s,
                    })
            }
            None => self.client.post(format!("{}/stop", self.base_url)),
        };

        let response = request.send().await.map_err(transport)?;
        if !response.status().is_success() {
            return Err(ActuatorError::Rejected(response.status().as_u16()));
        }
        Ok(())
    }
}

/// No hardware. Logs, optionally waits, and records what it was asked to do.
/// Can be told to fail the next N calls.
#[derive(Debug, Default)]
pub struct SimulatedActuator {
    latency: Duration,
    performed: Mutex<Vec<ActionKind>>,
    fail_next: AtomicUsize,
}

impl SimulatedActuator {
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    pub fn fail_next(&self, calls: usize) {
        self.fail_next.store(calls, Ordering::SeqCst);
    }

    pub fn performed(&self) -> Vec<ActionKind> {
        self.performed.lock().map(|log| log.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Actuator for SimulatedActuator {
    async fn perform(&self, kind: ActionKind) -> Result<(), ActuatorError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let failing = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            info!("[SIM] {} failed", kind);
            return Err(ActuatorError::Transport("simulated failure".to_string()));
        }

        info!("[SIM] {}", kind);
        if let Ok(mut log) = self.performed.lock() {
            log.push(kind);
        }
        Ok(())
    }
}
