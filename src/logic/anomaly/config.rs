//! Detection Thresholds & Config
//!
//! Every threshold and multiplier the rules consume. The whole struct is
//! replaceable at runtime; swapping it never resets accumulated baselines.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_HISTORY_LIMIT;

// ============================================================================
// DEFAULTS
// ============================================================================

/// Rolling window capacity per baseline
pub const DEFAULT_BASELINE_WINDOW: usize = 30;

/// Cycles of history required before any rule may fire
pub const DEFAULT_MIN_SAMPLES: u32 = 5;

/// Absolute CPU floor (%) below which a spike is never flagged
pub const DEFAULT_CPU_SPIKE_THRESHOLD: f64 = 80.0;

/// Stddev multiplier over the CPU baseline mean
pub const DEFAULT_CPU_SPIKE_MULTIPLIER: f64 = 3.0;

/// Absolute memory floor (% of physical RAM)
pub const DEFAULT_MEMORY_SPIKE_THRESHOLD: f64 = 20.0;

/// Stddev multiplier over the memory baseline mean
pub const DEFAULT_MEMORY_SPIKE_MULTIPLIER: f64 = 3.0;

/// New pids per cycle above which spawn is considered rapid
pub const DEFAULT_PROCESS_SPAWN_RATE: usize = 10;

/// Multiplier over mean total throughput for a traffic spike
pub const DEFAULT_TRAFFIC_SPIKE_MULTIPLIER: f64 = 5.0;

/// Absolute throughput floor (bytes/sec) for a traffic spike
pub const DEFAULT_MIN_BYTES_FOR_SPIKE: f64 = 1024.0 * 1024.0;

/// Per-process connection count above which a flood is possible
pub const DEFAULT_CONNECTION_FLOOD_THRESHOLD: usize = 100;

/// Flood only fires when the count also grew by more than this since the
/// previous cycle (debounces persistently busy processes)
pub const CONNECTION_FLOOD_DELTA: usize = 20;

/// Remote or listening ports associated with common backdoors/C2 tools
pub const DEFAULT_SUSPICIOUS_PORTS: &[u16] =
    &[1337, 4444, 5555, 6666, 6667, 9999, 12345, 27374, 31337];

/// Ports below this are privileged
pub const DEFAULT_PRIVILEGED_PORT_THRESHOLD: u16 = 1024;

/// A port stays "new" this long after first sighting (seconds)
pub const DEFAULT_NEW_PORT_WINDOW_SECS: i64 = 300;

/// An unusual process is only reported this long after first sighting
pub const DEFAULT_UNUSUAL_PROCESS_WINDOW_SECS: i64 = 60;

// ============================================================================
// CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyDetectionConfig {
    pub baseline_window_size: usize,
    pub min_samples_for_baseline: u32,
    pub cpu_spike_threshold: f64,
    pub cpu_spike_multiplier: f64,
    pub memory_spike_threshold: f64,
    pub memory_spike_multiplier: f64,
    pub process_spawn_rate: usize,
    pub traffic_spike_multiplier: f64,
    pub min_bytes_for_spike: f64,
    pub connection_flood_threshold: usize,
    pub suspicious_ports: HashSet<u16>,
    pub alert_on_new_listening_ports: bool,
    pub privileged_port_threshold: u16,
    pub new_port_window_secs: i64,
    pub unusual_process_window_secs: i64,
    pub history_limit: usize,
}

impl Default for AnomalyDetectionConfig {
    fn default() -> Self {
        Self {
            baseline_window_size: DEFAULT_BASELINE_WINDOW,
            min_samples_for_baseline: DEFAULT_MIN_SAMPLES,
            cpu_spike_threshold: DEFAULT_CPU_SPIKE_THRESHOLD,
            cpu_spike_multiplier: DEFAULT_CPU_SPIKE_MULTIPLIER,
            memory_spike_threshold: DEFAULT_MEMORY_SPIKE_THRESHOLD,
            memory_spike_multiplier: DEFAULT_MEMORY_SPIKE_MULTIPLIER,
            process_spawn_rate: DEFAULT_PROCESS_SPAWN_RATE,
            traffic_spike_multiplier: DEFAULT_TRAFFIC_SPIKE_MULTIPLIER,
            min_bytes_for_spike: DEFAULT_MIN_BYTES_FOR_SPIKE,
            connection_flood_threshold: DEFAULT_CONNECTION_FLOOD_THRESHOLD,
            suspicious_ports: DEFAULT_SUSPICIOUS_PORTS.iter().copied().collect(),
            alert_on_new_listening_ports: true,
            privileged_port_threshold: DEFAULT_PRIVILEGED_PORT_THRESHOLD,
            new_port_window_secs: DEFAULT_NEW_PORT_WINDOW_SECS,
            unusual_process_window_secs: DEFAULT_UNUSUAL_PROCESS_WINDOW_SECS,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl AnomalyDetectionConfig {
    /// High sensitivity - lower thresholds, more alerts
    pub fn high_sensitivity() -> Self {
        Self {
            cpu_spike_threshold: 60.0,
            cpu_spike_multiplier: 2.0,
            memory_spike_threshold: 10.0,
            traffic_spike_multiplier: 3.0,
            connection_flood_threshold: 50,
            ..Default::default()
        }
    }

    /// Low sensitivity - higher thresholds, fewer alerts
    pub fn low_sensitivity() -> Self {
        Self {
            cpu_spike_threshold: 90.0,
            cpu_spike_multiplier: 4.0,
            memory_spike_threshold: 40.0,
            traffic_spike_multiplier: 8.0,
            connection_flood_threshold: 200,
            ..Default::default()
        }
    }
}
