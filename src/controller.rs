//! Process-level wiring. Built once at startup and passed explicitly to
//! everything that needs to talk to the controller.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::ControllerConfig;
use crate::kernel::action::VoiceCommand;
use crate::kernel::driver::Driver;
use crate::kernel::event::{Event, InputEvent};
use crate::kernel::reactor::{Reactor, StatusReport};
use crate::kernel::watchdog;
use crate::planner::async_planner::AsyncPlanner;
use crate::services::actuator::Actuator;
use crate::services::oracle::Oracle;

const CHANNEL_CAPACITY: usize = 100;

/// Cloneable context for ingress, the status surface and shutdown.
#[derive(Clone)]
pub struct ControllerHandle {
    tx: mpsc::Sender<Event>,
    status: watch::Receiver<StatusReport>,
    cancel: CancellationToken,
}

impl ControllerHandle {
    pub async fn send_doneness(&self, source: &str, value: f32) -> Result<()> {
        self.tx.send(InputEvent::doneness(source, value).into()).await?;
        Ok(())
    }

    pub async fn send_voice(&self, source: &str, command: VoiceCommand) -> Result<()> {
        self.tx.send(InputEvent::voice(source, command).into()).await?;
        Ok(())
    }

    pub async fn reinitialize(&self, source: &str) -> Result<()> {
        self.tx.send(InputEvent::reinitialize(source).into()).await?;
        Ok(())
    }

    /// Latest published status. Never blocks on the controller.
    pub fn status(&self) -> StatusReport {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<StatusReport> {
        self.status.clone()
    }

    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

pub struct Controller {
    pub handle: ControllerHandle,
    pub task: JoinHandle<()>,
    pub watchdog: JoinHandle<()>,
}

impl Controller {
    /// Spawns the controller task and the watchdog timer.
    pub fn spawn(
        config: ControllerConfig,
        actuator: Arc<dyn Actuator>,
        oracle: Option<Arc<dyn Oracle>>,
    ) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();

        let reactor = Reactor::new(config.clone(), Instant::now());
        let (status_tx, status_rx) = watch::channel(reactor.status(Instant::now()));

        let planner = oracle.map(|oracle| AsyncPlanner::new(oracle, tx.clone(), config.oracle_timeout()));
        let driver = Driver::new(actuator, planner, tx.clone(), config.actuator_timeout());

        let watchdog = watchdog::spawn_timer(config.watchdog_period(), tx.clone(), cancel.clone());
        let task = tokio::spawn(reactor.run(rx, driver, status_tx, cancel.clone()));

        Self {
            handle: ControllerHandle {
                tx,
                status: status_rx,
                cancel,
            },
            task,
            watchdog,
        }
    }

    pub async fn join(self) {
        let _ = self.task.await;
        let _ = self.watchdog.await;
    }
}
