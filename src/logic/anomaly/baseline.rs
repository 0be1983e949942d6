//! Baseline Store
//!
//! Rolling per-entity sample windows that define "normal" for the detection
//! rules: per-process CPU/memory windows, one host-wide throughput window,
//! and a port first-seen registry. Pure state, mutated once per sampling
//! cycle by the engine.

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::{DateTime, Duration, Utc};

use crate::logic::types::Protocol;

// ============================================================================
// SAMPLE WINDOW
// ============================================================================

/// Bounded ordered sample sequence; oldest evicted first.
#[derive(Debug, Clone)]
pub struct SampleWindow {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl SampleWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity.min(256)),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, value: f64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn mean(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    /// Sample standard deviation (Bessel-corrected, n-1 denominator).
    /// Zero with fewer than two samples.
    pub fn stddev(&self) -> f64 {
        let n = self.samples.len();
        if n < 2 {
            return 0.0;
        }
        let mean = self.mean();
        let sum_sq: f64 = self.samples.iter().map(|s| (s - mean).powi(2)).sum();
        (sum_sq / (n - 1) as f64).sqrt()
    }
}

// ============================================================================
// BASELINES
// ============================================================================

#[derive(Debug, Clone)]
pub struct ProcessBaseline {
    pub pid: u32,
    pub name: String,
    pub cpu: SampleWindow,
    pub memory: SampleWindow,
    pub last_seen: DateTime<Utc>,
}

impl ProcessBaseline {
    pub fn new(pid: u32, name: &str, window: usize, now: DateTime<Utc>) -> Self {
        Self {
            pid,
            name: name.to_string(),
            cpu: SampleWindow::new(window),
            memory: SampleWindow::new(window),
            last_seen: now,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NetworkBaseline {
    pub bytes_in: SampleWindow,
    pub bytes_out: SampleWindow,
    pub connections: SampleWindow,
}

impl NetworkBaseline {
    pub fn new(window: usize) -> Self {
        Self {
            bytes_in: SampleWindow::new(window),
            bytes_out: SampleWindow::new(window),
            connections: SampleWindow::new(window),
        }
    }

    /// Mean of total (in + out) throughput over the window.
    pub fn mean_total_throughput(&self) -> f64 {
        self.bytes_in.mean() + self.bytes_out.mean()
    }
}

/// First-seen registry for (port, protocol) keys.
#[derive(Debug, Clone, Default)]
pub struct PortBaseline {
    first_seen: HashMap<(u16, Protocol), DateTime<Utc>>,
}

impl PortBaseline {
    /// Record a sighting; the first-seen timestamp is never moved forward.
    pub fn observe(&mut self, port: u16, protocol: Protocol, now: DateTime<Utc>) {
        self.first_seen.entry((port, protocol)).or_insert(now);
    }

    pub fn first_seen(&self, port: u16, protocol: Protocol) -> Option<DateTime<Utc>> {
        self.first_seen.get(&(port, protocol)).copied()
    }

    /// A port is new if it was never seen or first seen inside the window.
    pub fn is_new(
        &self,
        port: u16,
        protocol: Protocol,
        now: DateTime<Utc>,
        window_secs: i64,
    ) -> bool {
        match self.first_seen.get(&(port, protocol)) {
            Some(first) => (now - *first) < Duration::seconds(window_secs),
            None => true,
        }
    }

    /// Drop registrations for ports absent from the current cycle.
    pub fn retain_keys(&mut self, present: &HashSet<(u16, Protocol)>) {
        self.first_seen.retain(|key, _| present.contains(key));
    }

    pub fn len(&self) -> usize {
        self.first_seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.first_seen.is_empty()
    }

    pub fn clear(&mut self) {
        self.first_seen.clear();
    }
}

// ============================================================================
// STORE
// ============================================================================

#[derive(Debug, Clone)]
pub struct BaselineStore {
    pub processes: HashMap<u32, ProcessBaseline>,
    pub network: NetworkBaseline,
    pub ports: PortBaseline,
}

impl BaselineStore {
    pub fn new(window: usize) -> Self {
        Self {
            processes: HashMap::new(),
            network: NetworkBaseline::new(window),
            ports: PortBaseline::default(),
        }
    }

    /// Drop process baselines whose pid disappeared from the snapshot.
    pub fn retain_pids(&mut self, present: &HashSet<u32>) {
        self.processes.retain(|pid, _| present.contains(pid));
    }

    pub fn clear(&mut self, window: usize) {
        self.processes.clear();
        self.network = NetworkBaseline::new(window);
        self.ports.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_evicts_oldest_at_capacity() {
        let mut w = SampleWindow::new(3);
        for v in [1.0, 2.0, 3.0, 4.0] {
            w.push(v);
        }
        assert_eq!(w.len(), 3);
        assert!((w.mean() - 3.0).abs() < 1e-9); // 2, 3, 4
    }

    #[test]
    fn test_sample_stddev_exact() {
        let mut w = SampleWindow::new(16);
        for v in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            w.push(v);
        }
        // Sample stddev with the n-1 denominator is exactly 2.0 here.
        assert!((w.stddev() - 2.0).abs() < 1e-9);
        assert!((w.mean() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_stddev_is_zero_below_two_samples() {
        let mut w = SampleWindow::new(4);
        assert_eq!(w.stddev(), 0.0);
        w.push(42.0);
        assert_eq!(w.stddev(), 0.0);
    }

    #[test]
    fn test_port_new_window() {
        let mut ports = PortBaseline::default();
        let t0 = Utc::now();
        ports.observe(8080, Protocol::Tcp, t0);

        assert!(ports.is_new(8080, Protocol::Tcp, t0 + Duration::seconds(200), 300));
        assert!(!ports.is_new(8080, Protocol::Tcp, t0 + Duration::seconds(400), 300));
        // Never-seen ports are new by definition.
        assert!(ports.is_new(9090, Protocol::Tcp, t0, 300));
    }

    #[test]
    fn test_observe_keeps_original_first_seen() {
        let mut ports = PortBaseline::default();
        let t0 = Utc::now();
        ports.observe(443, Protocol::Tcp, t0);
        ports.observe(443, Protocol::Tcp, t0 + Duration::seconds(100));
        assert_eq!(ports.first_seen(443, Protocol::Tcp), Some(t0));
    }

    #[test]
    fn test_retain_drops_absent_entities() {
        let mut store = BaselineStore::new(8);
        let now = Utc::now();
        store
            .processes
            .insert(10, ProcessBaseline::new(10, "a", 8, now));
        store
            .processes
            .insert(20, ProcessBaseline::new(20, "b", 8, now));

        let present: HashSet<u32> = [20].into_iter().collect();
        store.retain_pids(&present);
        assert_eq!(store.processes.len(), 1);
        assert!(store.processes.contains_key(&20));

        store.ports.observe(80, Protocol::Tcp, now);
        store.ports.observe(81, Protocol::Tcp, now);
        let keep: HashSet<(u16, Protocol)> = [(81, Protocol::Tcp)].into_iter().collect();
        store.ports.retain_keys(&keep);
        assert_eq!(store.ports.len(), 1);
    }
}
