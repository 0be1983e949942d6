//! Hostwatch - single-host process/network/port monitor.
//!
//! The library exposes the monitoring core: snapshot providers, the safety
//! classifier, the anomaly detection engine, and the orchestrator that ties
//! them together. Presentation layers (CLI, menu bar, web) call into
//! [`logic::orchestrator::Monitor`] and render whatever it returns.

pub mod constants;
pub mod logic;
