//! Hostwatch daemon entry point: wires the monitor with live providers and
//! runs the sampling loop until interrupted.

use std::sync::Arc;
use std::time::Duration;

use log::info;

use hostwatch::constants;
use hostwatch::logic::anomaly::{AnomalyDetectionConfig, DetectionEngine};
use hostwatch::logic::orchestrator::Monitor;
use hostwatch::logic::providers::{LsofNetworkProvider, LsofPortProvider, SystemProcessProvider};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("{} v{} starting", constants::APP_NAME, constants::APP_VERSION);

    let config = AnomalyDetectionConfig {
        history_limit: constants::get_history_limit(),
        ..Default::default()
    };
    let monitor = Arc::new(Monitor::new(
        Arc::new(SystemProcessProvider::new()),
        Arc::new(LsofNetworkProvider::new()),
        Arc::new(LsofPortProvider::new()),
        Arc::new(DetectionEngine::new(config)),
    ));

    let interval = Duration::from_secs(constants::get_poll_interval());
    let loop_handle = monitor.start(interval);
    info!("sampling every {:?}; ctrl-c to stop", interval);

    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("failed to listen for shutdown signal: {e}");
    }
    info!("shutting down");
    monitor.stop();
    loop_handle.abort();
}
