//! Logic Module - Monitoring Engines
//!
//! Contains the engines that make up the monitoring core:
//! - `providers/` - Snapshot acquisition (processes, sockets, ports, stats)
//! - `safety/` - Safety classification and kill/close validation
//! - `anomaly/` - Baseline store and anomaly detection engine
//! - `orchestrator` - Composition root and the periodic refresh loop

pub mod types;
pub mod providers;
pub mod safety;
pub mod anomaly;
pub mod orchestrator;
