//! Scripted sensor simulator. Drives a full cook against a simulated
//! actuator: load by voice, doneness rising on whichever side is on the
//! grate, rules flip / season / unload. `GRILL_SIM_SCENARIO=stall` freezes
//! side A below the flip threshold so the watchdog has to step in.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use grillctl::config::{ActuatorFlavour, ControllerConfig};
use grillctl::kernel::action::{Side, VoiceCommand};
use grillctl::services::actuator::SimulatedActuator;
use grillctl::Controller;

const STEP: Duration = Duration::from_millis(500);
const MAX_STEPS: usize = 400;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let stall = std::env::var("GRILL_SIM_SCENARIO").map(|s| s == "stall").unwrap_or(false);

    // Real thresholds, compressed timers.
    let mut config = ControllerConfig::load()?;
    config.actuator.flavour = ActuatorFlavour::Simulated;
    config.poll_interval_ms = 250;
    config.decision_interval_secs = 1;
    config.watchdog_period_secs = 1;
    config.stuck_window = 5;
    config.stale_timeout_secs = 30;
    config.flip_cooldown_secs = 3;
    config.season_cooldown_secs = 2;
    config.oracle.enabled = false;
    config.validate()?;

    let rate = config.thresholds.max_doneness / 16.0;
    let stall_at = config.thresholds.flip / 2.0;

    let actuator = Arc::new(SimulatedActuator::with_latency(Duration::from_millis(200)));
    let controller = Controller::spawn(config, actuator.clone(), None);
    let handle = controller.handle.clone();

    tracing::info!("Simulation start (stall: {})", stall);
    handle.send_voice("sim", VoiceCommand::Wake).await?;
    handle.send_voice("sim", VoiceCommand::Load).await?;

    let mut doneness: HashMap<Side, f32> = HashMap::new();
    for _ in 0..MAX_STEPS {
        tokio::time::sleep(STEP).await;

        let status = handle.status();
        if status.phase.is_terminal() {
            break;
        }
        let Some(side) = status.current_side else { continue };

        let value = doneness.entry(side).or_insert(0.0);
        let frozen = stall && side == Side::A && *value >= stall_at;
        if !frozen {
            *value += rate;
        }
        handle.send_doneness("sim", *value).await?;
    }

    let last = handle.status();
    println!("{}", serde_json::to_string_pretty(&last)?);
    println!("Actuator log: {:?}", actuator.performed());

    handle.shutdown();
    controller.join().await;
    Ok(())
}
