//! Anomaly Detection
//!
//! Statistical baseline learning plus rule evaluation over system
//! snapshots. Split into the record model ([`types`]), tunable thresholds
//! ([`config`]), rolling baselines ([`baseline`]) and the cycle engine
//! ([`engine`]).

pub mod baseline;
pub mod config;
pub mod engine;
pub mod types;


pub use baseline::{BaselineStore, NetworkBaseline, PortBaseline, ProcessBaseline, SampleWindow};
pub use config::AnomalyDetectionConfig;
pub use engine::{DetectionEngine, EngineStats};
pub use types::{
    Anomaly, AnomalyCategory, AnomalyDetails, AnomalySummary, AnomalyType, Severity,
};
