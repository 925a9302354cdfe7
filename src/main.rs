use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

use grillctl::config::ControllerConfig;
use grillctl::services::actuator;
use grillctl::services::oracle::{ChatOracle, Oracle};
use grillctl::{console, Controller};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Setup Logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("Grill controller booting...");

    // 2. Configuration
    let config = ControllerConfig::load().context("loading controller configuration")?;
    tracing::info!(
        "Thresholds {:?}, W={}, timeout {}s, policy {:?}, actuator {:?} at {}",
        config.thresholds,
        config.stuck_window,
        config.stale_timeout_secs,
        config.failure_policy,
        config.actuator.flavour,
        config.actuator.base_url
    );

    // 3. Collaborators
    let actuator = actuator::from_config(&config.actuator);
    let oracle: Option<Arc<dyn Oracle>> = if config.oracle.enabled {
        tracing::info!("Oracle enabled: {} ({})", config.oracle.url, config.oracle.model);
        Some(Arc::new(ChatOracle::new(&config.oracle)))
    } else {
        None
    };

    // 4. Controller + Watchdog
    let controller = Controller::spawn(config, actuator, oracle);
    let handle = controller.handle.clone();

    // 5. Console Ingress (Stdin)
    let operator = handle.clone();
    tokio::spawn(async move {
        println!("{}", console::HELP);
        console::run(&operator, BufReader::new(tokio::io::stdin())).await;
    });

    // 6. Shutdown on Ctrl+C
    let signal = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, shutting down");
        }
        signal.shutdown();
    });

    tracing::info!("Grill controller active. Press Ctrl+C to stop.");
    controller.join().await;

    let last = handle.status();
    tracing::info!("Final state {:?}, metrics {:?}", last.phase, last.metrics);
    Ok(())
}
