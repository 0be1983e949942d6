//! Detection Engine
//!
//! Consumes one `SystemSnapshot` per sampling cycle, folds it into the
//! baseline store, and evaluates the detection rules against statistics
//! taken BEFORE the current sample was appended. New samples therefore
//! never dilute the baseline they are judged against.
//!
//! The engine is single-writer per cycle: all mutable state lives behind
//! one mutex and `analyze` holds it for the whole cycle. Cycles are cheap
//! (pure arithmetic over in-memory windows) so contention is not a concern
//! at sampling rates measured in seconds.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::logic::safety::rules;
use crate::logic::types::{PortState, ProcessInfo, ProcessState, SystemSnapshot};

use super::baseline::BaselineStore;
use super::config::{AnomalyDetectionConfig, CONNECTION_FLOOD_DELTA};
use super::types::{
    Anomaly, AnomalyCategory, AnomalyDetails, AnomalySummary, AnomalyType, Severity,
};

// ============================================================================
// NAME HEURISTICS
// ============================================================================

/// Lowercase substrings flagging a process name as worth an alert.
const SUSPICIOUS_NAME_PATTERNS: &[&str] = &[
    "nc", "ncat", "netcat", "socat", "reverse", "shell", "backdoor", "exploit", "payload",
];

/// Benign names that would otherwise trip the substring patterns.
const BENIGN_NAME_PATTERNS: &[&str] = &[
    "sync",
    "truncate",
    "vnc",
    "gnome-shell",
    "powershell",
    "shellcheck",
    "launchservices",
];

fn name_is_suspicious(name: &str) -> bool {
    let lower = name.to_lowercase();
    if BENIGN_NAME_PATTERNS.iter().any(|p| lower.contains(p)) {
        return false;
    }
    SUSPICIOUS_NAME_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Directories a root-owned binary has no business executing from.
const SCRATCH_DIR_PREFIXES: &[&str] = &[
    "/tmp/",
    "/var/tmp/",
    "/dev/shm/",
    "/private/tmp/",
    "/Users/",
    "/home/",
];

/// Lowercase substrings of daemon names expected to bind privileged ports.
const PRIVILEGED_OWNER_PATTERNS: &[&str] = &[
    "launchd",
    "systemd",
    "httpd",
    "nginx",
    "apache",
    "caddy",
    "sshd",
    "cupsd",
    "smbd",
    "nmbd",
    "dnsmasq",
    "named",
    "unbound",
    "postfix",
    "master",
    "exim",
    "dovecot",
    "ntpd",
    "chronyd",
    "rpcbind",
    "kdc",
    "mdnsresponder",
    "vsftpd",
    "xinetd",
    "inetd",
];

fn is_expected_privileged_owner(name: &str) -> bool {
    let lower = name.to_lowercase();
    PRIVILEGED_OWNER_PATTERNS.iter().any(|p| lower.contains(p))
}

fn is_known_system_process(name: &str) -> bool {
    rules::CRITICAL_PROCESSES
        .iter()
        .chain(rules::SYSTEM_PROCESSES)
        .any(|p| name.eq_ignore_ascii_case(p))
}

/// Why a process is unusual, or `None` when it is not. Known system
/// daemons are exempt from all three triggers.
fn unusual_reason(proc: &ProcessInfo) -> Option<String> {
    if is_known_system_process(&proc.name) {
        return None;
    }
    if name_is_suspicious(&proc.name) {
        return Some("matches a suspicious name pattern".to_string());
    }
    match &proc.executable_path {
        None => Some("has no resolvable executable path".to_string()),
        Some(path) if proc.uid == Some(0) => {
            let p = path.to_string_lossy();
            SCRATCH_DIR_PREFIXES
                .iter()
                .find(|d| p.starts_with(*d))
                .map(|_| format!("runs as root from {}", p))
        }
        Some(_) => None,
    }
}

// ============================================================================
// ENGINE STATE
// ============================================================================

/// Baseline stats captured before the current sample is appended.
#[derive(Debug, Clone, Copy)]
struct PreStats {
    mean: f64,
    stddev: f64,
    samples: usize,
}

#[derive(Debug)]
struct EngineState {
    config: AnomalyDetectionConfig,
    store: BaselineStore,
    /// Completed sampling cycles since start or last reset.
    sample_count: u32,
    /// Findings from the most recent cycle; fully replaced each cycle.
    active: Vec<Anomaly>,
    /// Newest-first record of findings, deduplicated against the prior
    /// cycle so a condition that persists is recorded once.
    history: VecDeque<Anomaly>,
    prev_pids: HashSet<u32>,
    prev_conn_counts: HashMap<String, usize>,
    /// First time a process name was ever observed, keyed by name so a
    /// respawned copy of a known tool does not re-alert.
    first_seen_names: HashMap<String, DateTime<Utc>>,
}

impl EngineState {
    fn new(config: AnomalyDetectionConfig) -> Self {
        let window = config.baseline_window_size;
        Self {
            config,
            store: BaselineStore::new(window),
            sample_count: 0,
            active: Vec::new(),
            history: VecDeque::new(),
            prev_pids: HashSet::new(),
            prev_conn_counts: HashMap::new(),
            first_seen_names: HashMap::new(),
        }
    }
}

/// Point-in-time counters for diagnostics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EngineStats {
    pub sample_count: u32,
    pub tracked_processes: usize,
    pub tracked_ports: usize,
    pub active_anomalies: usize,
    pub history_len: usize,
    pub enabled: bool,
}

// ============================================================================
// ENGINE
// ============================================================================

pub struct DetectionEngine {
    state: Mutex<EngineState>,
    enabled: AtomicBool,
}

impl Default for DetectionEngine {
    fn default() -> Self {
        Self::new(AnomalyDetectionConfig::default())
    }
}

impl DetectionEngine {
    pub fn new(config: AnomalyDetectionConfig) -> Self {
        Self {
            state: Mutex::new(EngineState::new(config)),
            enabled: AtomicBool::new(true),
        }
    }

    // ------------------------------------------------------------------
    // Cycle
    // ------------------------------------------------------------------

    /// Run one detection cycle against a snapshot. Returns the new active
    /// set (empty while the baseline is still warming up).
    pub fn analyze(&self, snapshot: &SystemSnapshot) -> Vec<Anomaly> {
        self.analyze_at(Utc::now(), snapshot)
    }

    /// Same as [`analyze`](Self::analyze) with an explicit clock, so time-
    /// windowed rules can be exercised deterministically.
    pub fn analyze_at(&self, now: DateTime<Utc>, snapshot: &SystemSnapshot) -> Vec<Anomaly> {
        if !self.enabled.load(Ordering::Relaxed) {
            return Vec::new();
        }

        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.sample_count += 1;

        // Stats snapshot before this cycle's samples are folded in.
        let mut cpu_pre: HashMap<u32, PreStats> = HashMap::new();
        let mut mem_pre: HashMap<u32, PreStats> = HashMap::new();
        for proc in &snapshot.processes {
            if let Some(base) = state.store.processes.get(&proc.pid) {
                cpu_pre.insert(
                    proc.pid,
                    PreStats {
                        mean: base.cpu.mean(),
                        stddev: base.cpu.stddev(),
                        samples: base.cpu.len(),
                    },
                );
                mem_pre.insert(
                    proc.pid,
                    PreStats {
                        mean: base.memory.mean(),
                        stddev: base.memory.stddev(),
                        samples: base.memory.len(),
                    },
                );
            }
        }
        let net_pre = PreStats {
            mean: state.store.network.mean_total_throughput(),
            stddev: 0.0,
            samples: state.store.network.bytes_in.len(),
        };

        let current_pids: HashSet<u32> = snapshot.processes.iter().map(|p| p.pid).collect();
        // Connections grouped by owning process NAME, so a multi-process
        // server floods as one entity. Unowned sockets key on the pid.
        let mut conn_counts: HashMap<String, usize> = HashMap::new();
        let mut conn_owner_pids: HashMap<String, u32> = HashMap::new();
        for conn in &snapshot.connections {
            let key = match (&conn.process_name, conn.pid) {
                (Some(name), _) => name.clone(),
                (None, Some(pid)) => format!("pid {pid}"),
                (None, None) => continue,
            };
            if let Some(pid) = conn.pid {
                conn_owner_pids.entry(key.clone()).or_insert(pid);
            }
            *conn_counts.entry(key).or_insert(0) += 1;
        }
        let port_keys: HashSet<_> = snapshot
            .listening_ports
            .iter()
            .map(|p| (p.number, p.protocol))
            .collect();
        let newly_registered: HashSet<_> = port_keys
            .iter()
            .filter(|(port, proto)| state.store.ports.first_seen(*port, *proto).is_none())
            .copied()
            .collect();

        // Fold the cycle into the baselines.
        let window = state.config.baseline_window_size;
        for proc in &snapshot.processes {
            let base = state
                .store
                .processes
                .entry(proc.pid)
                .or_insert_with(|| super::baseline::ProcessBaseline::new(proc.pid, &proc.name, window, now));
            base.cpu.push(proc.cpu_percent as f64);
            base.memory.push(proc.memory_percent as f64);
            base.last_seen = now;
            if base.name != proc.name {
                // Pid reuse; start attributing to the new image name.
                base.name = proc.name.clone();
            }
            state
                .first_seen_names
                .entry(proc.name.clone())
                .or_insert(now);
        }
        state.store.retain_pids(&current_pids);
        state
            .store
            .network
            .bytes_in
            .push(snapshot.stats.bytes_in_per_sec);
        state
            .store
            .network
            .bytes_out
            .push(snapshot.stats.bytes_out_per_sec);
        state
            .store
            .network
            .connections
            .push(snapshot.stats.active_connections as f64);
        for (port, proto) in &port_keys {
            state.store.ports.observe(*port, *proto, now);
        }
        // A port that closes and later reopens counts as new again.
        state.store.ports.retain_keys(&port_keys);

        let prev_pids = std::mem::replace(&mut state.prev_pids, current_pids);
        let prev_conn_counts = std::mem::replace(&mut state.prev_conn_counts, conn_counts.clone());

        // Cold start: record everything, flag nothing.
        if state.sample_count < state.config.min_samples_for_baseline {
            debug!(
                "baseline warm-up cycle {}/{}",
                state.sample_count, state.config.min_samples_for_baseline
            );
            state.active.clear();
            return Vec::new();
        }

        let mut anomalies = Vec::new();

        self.detect_process_anomalies(
            state, now, snapshot, &cpu_pre, &mem_pre, &prev_pids, &mut anomalies,
        );
        self.detect_network_anomalies(
            state,
            now,
            snapshot,
            &net_pre,
            &conn_counts,
            &prev_conn_counts,
            &conn_owner_pids,
            &mut anomalies,
        );
        self.detect_port_anomalies(state, now, snapshot, &newly_registered, &mut anomalies);

        // Persisting conditions re-enter the active set every cycle but are
        // written to history only when they first appear.
        let prev_fingerprints: HashSet<_> =
            state.active.iter().map(fingerprint).collect();
        for anomaly in &anomalies {
            if !prev_fingerprints.contains(&fingerprint(anomaly)) {
                warn!(
                    "anomaly [{}] {}: {}",
                    anomaly.severity, anomaly.title, anomaly.description
                );
                state.history.push_front(anomaly.clone());
            }
        }
        state.history.truncate(state.config.history_limit);
        state.active = anomalies.clone();

        anomalies
    }

    // ------------------------------------------------------------------
    // Process rules
    // ------------------------------------------------------------------

    #[allow(clippy::too_many_arguments)]
    fn detect_process_anomalies(
        &self,
        state: &EngineState,
        now: DateTime<Utc>,
        snapshot: &SystemSnapshot,
        cpu_pre: &HashMap<u32, PreStats>,
        mem_pre: &HashMap<u32, PreStats>,
        prev_pids: &HashSet<u32>,
        out: &mut Vec<Anomaly>,
    ) {
        let cfg = &state.config;

        for proc in &snapshot.processes {
            // CPU spike: above both the statistical band and the absolute
            // floor, against pre-cycle stats.
            if let Some(pre) = cpu_pre.get(&proc.pid) {
                if pre.samples >= cfg.min_samples_for_baseline as usize {
                    let band = pre.mean + cfg.cpu_spike_multiplier * pre.stddev;
                    let cutoff = band.max(cfg.cpu_spike_threshold);
                    let cpu = proc.cpu_percent as f64;
                    if cpu > cutoff {
                        let severity = if cpu > 95.0 {
                            Severity::Critical
                        } else if cpu > 90.0 {
                            Severity::High
                        } else {
                            Severity::Medium
                        };
                        out.push(
                            Anomaly::new(
                                AnomalyType::CpuSpike,
                                severity,
                                now,
                                format!("CPU spike: {}", proc.name),
                                format!(
                                    "{} (pid {}) at {:.1}% CPU, baseline {:.1}% ± {:.1}",
                                    proc.name, proc.pid, cpu, pre.mean, pre.stddev
                                ),
                                AnomalyDetails::Process {
                                    pid: proc.pid,
                                    name: proc.name.clone(),
                                    current_value: cpu,
                                    baseline_mean: pre.mean,
                                    baseline_stddev: pre.stddev,
                                },
                            )
                            .with_pid(proc.pid),
                        );
                    }
                }
            }

            // Memory spike, same shape as the CPU rule.
            if let Some(pre) = mem_pre.get(&proc.pid) {
                if pre.samples >= cfg.min_samples_for_baseline as usize {
                    let band = pre.mean + cfg.memory_spike_multiplier * pre.stddev;
                    let cutoff = band.max(cfg.memory_spike_threshold);
                    let mem = proc.memory_percent as f64;
                    if mem > cutoff {
                        let severity = if mem > 90.0 {
                            Severity::Critical
                        } else if mem > 75.0 {
                            Severity::High
                        } else {
                            Severity::Medium
                        };
                        out.push(
                            Anomaly::new(
                                AnomalyType::MemorySpike,
                                severity,
                                now,
                                format!("Memory spike: {}", proc.name),
                                format!(
                                    "{} (pid {}) at {:.1}% of RAM, baseline {:.1}% ± {:.1}",
                                    proc.name, proc.pid, mem, pre.mean, pre.stddev
                                ),
                                AnomalyDetails::Process {
                                    pid: proc.pid,
                                    name: proc.name.clone(),
                                    current_value: mem,
                                    baseline_mean: pre.mean,
                                    baseline_stddev: pre.stddev,
                                },
                            )
                            .with_pid(proc.pid),
                        );
                    }
                }
            }

            // Unusual process: pathless, root running out of a scratch or
            // user directory, or a suspicious name. Flagged only within a
            // short window of first sighting so a long-lived tool is
            // reported once, not forever.
            if let Some(reason) = unusual_reason(proc) {
                let recent = state
                    .first_seen_names
                    .get(&proc.name)
                    .map(|first| (now - *first) < Duration::seconds(cfg.unusual_process_window_secs))
                    .unwrap_or(true);
                if recent {
                    let root = proc.uid == Some(0);
                    let severity = if root { Severity::Critical } else { Severity::High };
                    out.push(
                        Anomaly::new(
                            AnomalyType::UnusualProcess,
                            severity,
                            now,
                            format!("Unusual process: {}", proc.name),
                            format!(
                                "{} (pid {}, uid {}) {}",
                                proc.name,
                                proc.pid,
                                proc.uid.map_or_else(|| "?".into(), |u| u.to_string()),
                                reason,
                            ),
                            AnomalyDetails::Process {
                                pid: proc.pid,
                                name: proc.name.clone(),
                                current_value: 0.0,
                                baseline_mean: 0.0,
                                baseline_stddev: 0.0,
                            },
                        )
                        .with_pid(proc.pid),
                    );
                }
            }

            if proc.state == ProcessState::Zombie {
                out.push(
                    Anomaly::new(
                        AnomalyType::ZombieProcess,
                        Severity::Low,
                        now,
                        format!("Zombie process: {}", proc.name),
                        format!(
                            "{} (pid {}) is defunct and awaiting reaping by parent {}",
                            proc.name,
                            proc.pid,
                            proc.parent_pid
                                .map_or_else(|| "?".into(), |p| p.to_string()),
                        ),
                        AnomalyDetails::Process {
                            pid: proc.pid,
                            name: proc.name.clone(),
                            current_value: 0.0,
                            baseline_mean: 0.0,
                            baseline_stddev: 0.0,
                        },
                    )
                    .with_pid(proc.pid),
                );
            }
        }

        // Spawn burst across the whole table, one finding per cycle.
        if !prev_pids.is_empty() {
            let spawned = snapshot
                .processes
                .iter()
                .filter(|p| !prev_pids.contains(&p.pid))
                .count();
            if spawned > cfg.process_spawn_rate {
                out.push(Anomaly::new(
                    AnomalyType::RapidProcessSpawn,
                    Severity::Medium,
                    now,
                    "Rapid process spawning".to_string(),
                    format!(
                        "{} new processes in one cycle (threshold {})",
                        spawned, cfg.process_spawn_rate
                    ),
                    AnomalyDetails::None,
                ));
            }
        }
    }

    // ------------------------------------------------------------------
    // Network rules
    // ------------------------------------------------------------------

    #[allow(clippy::too_many_arguments)]
    fn detect_network_anomalies(
        &self,
        state: &EngineState,
        now: DateTime<Utc>,
        snapshot: &SystemSnapshot,
        net_pre: &PreStats,
        conn_counts: &HashMap<String, usize>,
        prev_conn_counts: &HashMap<String, usize>,
        conn_owner_pids: &HashMap<String, u32>,
        out: &mut Vec<Anomaly>,
    ) {
        let cfg = &state.config;

        // Host-wide throughput spike against the pre-cycle mean. An idle
        // (all-zero) baseline makes any qualifying burst infinitely above
        // it rather than unmeasurable.
        let total = snapshot.stats.bytes_in_per_sec + snapshot.stats.bytes_out_per_sec;
        if net_pre.samples >= cfg.min_samples_for_baseline as usize
            && total > cfg.min_bytes_for_spike
        {
            let ratio = if net_pre.mean > 0.0 {
                total / net_pre.mean
            } else {
                f64::INFINITY
            };
            if ratio > cfg.traffic_spike_multiplier {
                let severity = if ratio > 10.0 {
                    Severity::Critical
                } else if ratio > 7.0 {
                    Severity::High
                } else {
                    Severity::Medium
                };
                let description = if net_pre.mean > 0.0 {
                    format!(
                        "throughput {:.0} B/s is {:.1}x the baseline mean of {:.0} B/s",
                        total, ratio, net_pre.mean
                    )
                } else {
                    format!("throughput {:.0} B/s against an idle baseline", total)
                };
                out.push(Anomaly::new(
                    AnomalyType::TrafficSpike,
                    severity,
                    now,
                    "Network traffic spike".to_string(),
                    description,
                    AnomalyDetails::Network {
                        bytes_in_per_sec: snapshot.stats.bytes_in_per_sec,
                        bytes_out_per_sec: snapshot.stats.bytes_out_per_sec,
                        baseline_mean: net_pre.mean,
                        connection_count: snapshot.stats.active_connections,
                    },
                ));
            }
        }

        // Connection flood per owning process name; the growth gate
        // debounces processes that are legitimately connection-heavy at
        // steady state.
        for (name, &count) in conn_counts {
            let prev = prev_conn_counts.get(name).copied().unwrap_or(0);
            if count > cfg.connection_flood_threshold
                && count.saturating_sub(prev) > CONNECTION_FLOOD_DELTA
            {
                let pid = conn_owner_pids.get(name).copied();
                let mut anomaly = Anomaly::new(
                    AnomalyType::ConnectionFlood,
                    Severity::High,
                    now,
                    format!("Connection flood: {name}"),
                    format!("{name} holds {count} connections, up from {prev} last cycle"),
                    AnomalyDetails::Process {
                        pid: pid.unwrap_or(0),
                        name: name.clone(),
                        current_value: count as f64,
                        baseline_mean: prev as f64,
                        baseline_stddev: 0.0,
                    },
                );
                if let Some(pid) = pid {
                    anomaly = anomaly.with_pid(pid);
                }
                out.push(anomaly);
            }
        }

        // Any connection touching a well-known backdoor/C2 port, whatever
        // its state: a reverse shell mid-handshake still counts.
        let mut reported: HashSet<(u16, Option<u32>)> = HashSet::new();
        for conn in &snapshot.connections {
            if conn.remote_port == 0 {
                continue;
            }
            if !cfg.suspicious_ports.contains(&conn.remote_port) {
                continue;
            }
            if !reported.insert((conn.remote_port, conn.pid)) {
                continue;
            }
            let who = conn
                .process_name
                .clone()
                .or_else(|| conn.pid.map(|p| format!("pid {p}")))
                .unwrap_or_else(|| "unknown process".to_string());
            let mut anomaly = Anomaly::new(
                AnomalyType::SuspiciousRemotePort,
                Severity::High,
                now,
                format!("Connection to suspicious port {}", conn.remote_port),
                format!(
                    "{} connected to {}:{}",
                    who, conn.remote_address, conn.remote_port
                ),
                AnomalyDetails::Network {
                    bytes_in_per_sec: 0.0,
                    bytes_out_per_sec: 0.0,
                    baseline_mean: 0.0,
                    connection_count: 1,
                },
            )
            .with_port(conn.remote_port)
            .with_address(conn.remote_address.clone());
            if let Some(pid) = conn.pid {
                anomaly = anomaly.with_pid(pid);
            }
            out.push(anomaly);
        }
    }

    // ------------------------------------------------------------------
    // Port rules
    // ------------------------------------------------------------------

    fn detect_port_anomalies(
        &self,
        state: &EngineState,
        now: DateTime<Utc>,
        snapshot: &SystemSnapshot,
        newly_registered: &HashSet<(u16, crate::logic::types::Protocol)>,
        out: &mut Vec<Anomaly>,
    ) {
        let cfg = &state.config;

        for port in &snapshot.listening_ports {
            if port.state != PortState::Listening {
                continue;
            }

            if cfg.suspicious_ports.contains(&port.number) {
                let mut anomaly = Anomaly::new(
                    AnomalyType::SuspiciousPortListening,
                    Severity::High,
                    now,
                    format!("Listener on suspicious port {}", port.number),
                    format!(
                        "{} is listening on {}/{}, a port associated with backdoor tooling",
                        port.process_name.as_deref().unwrap_or("unknown process"),
                        port.number,
                        port.protocol.as_str(),
                    ),
                    AnomalyDetails::Port {
                        port: port.number,
                        protocol: port.protocol,
                        process_name: port.process_name.clone(),
                        first_seen: state.store.ports.first_seen(port.number, port.protocol),
                    },
                )
                .with_port(port.number);
                if let Some(pid) = port.pid {
                    anomaly = anomaly.with_pid(pid);
                }
                out.push(anomaly);
            }

            // Privileged listener outside the known-service ports, owned by
            // something that is not a recognized privileged daemon.
            if port.number < cfg.privileged_port_threshold
                && !rules::CRITICAL_PORTS.contains(&port.number)
                && !rules::SYSTEM_PORTS.contains(&port.number)
            {
                let expected_owner = port
                    .process_name
                    .as_deref()
                    .map(is_expected_privileged_owner)
                    .unwrap_or(false);
                if !expected_owner {
                    let mut anomaly = Anomaly::new(
                        AnomalyType::UnauthorizedPrivilegedPort,
                        Severity::Critical,
                        now,
                        format!("Unexpected listener on privileged port {}", port.number),
                        format!(
                            "{} is listening on privileged port {}/{}, which no known service uses",
                            port.process_name.as_deref().unwrap_or("unknown process"),
                            port.number,
                            port.protocol.as_str(),
                        ),
                        AnomalyDetails::Port {
                            port: port.number,
                            protocol: port.protocol,
                            process_name: port.process_name.clone(),
                            first_seen: state.store.ports.first_seen(port.number, port.protocol),
                        },
                    )
                    .with_port(port.number);
                    if let Some(pid) = port.pid {
                        anomaly = anomaly.with_pid(pid);
                    }
                    out.push(anomaly);
                }
            }

            // Freshly registered listener; ports present since warm-up never
            // reach here because they were registered during cold start.
            if cfg.alert_on_new_listening_ports
                && newly_registered.contains(&(port.number, port.protocol))
            {
                let severity = if port.number < cfg.privileged_port_threshold {
                    Severity::High
                } else {
                    Severity::Medium
                };
                let mut anomaly = Anomaly::new(
                    AnomalyType::NewListeningPort,
                    severity,
                    now,
                    format!("New listening port {}", port.number),
                    format!(
                        "{} opened a new listener on {}/{}",
                        port.process_name.as_deref().unwrap_or("unknown process"),
                        port.number,
                        port.protocol.as_str(),
                    ),
                    AnomalyDetails::Port {
                        port: port.number,
                        protocol: port.protocol,
                        process_name: port.process_name.clone(),
                        first_seen: Some(now),
                    },
                )
                .with_port(port.number);
                if let Some(pid) = port.pid {
                    anomaly = anomaly.with_pid(pid);
                }
                out.push(anomaly);
            }
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn active_anomalies(&self) -> Vec<Anomaly> {
        self.state.lock().active.clone()
    }

    pub fn history(&self) -> Vec<Anomaly> {
        self.state.lock().history.iter().cloned().collect()
    }

    pub fn clear_history(&self) {
        self.state.lock().history.clear();
    }

    /// Summary over the current active set.
    pub fn summary(&self) -> AnomalySummary {
        AnomalySummary::from_anomalies(&self.state.lock().active)
    }

    pub fn is_process_anomalous(&self, pid: u32) -> bool {
        self.state
            .lock()
            .active
            .iter()
            .any(|a| a.related_pid == Some(pid))
    }

    pub fn anomalies_for_process(&self, pid: u32) -> Vec<Anomaly> {
        self.state
            .lock()
            .active
            .iter()
            .filter(|a| a.related_pid == Some(pid))
            .cloned()
            .collect()
    }

    pub fn anomalies_for_port(&self, port: u16) -> Vec<Anomaly> {
        self.state
            .lock()
            .active
            .iter()
            .filter(|a| a.related_port == Some(port))
            .cloned()
            .collect()
    }

    pub fn anomalies_by_category(&self, category: AnomalyCategory) -> Vec<Anomaly> {
        self.state
            .lock()
            .active
            .iter()
            .filter(|a| a.category == category)
            .cloned()
            .collect()
    }

    pub fn anomalies_with_min_severity(&self, min: Severity) -> Vec<Anomaly> {
        self.state
            .lock()
            .active
            .iter()
            .filter(|a| a.severity >= min)
            .cloned()
            .collect()
    }

    // ------------------------------------------------------------------
    // Control
    // ------------------------------------------------------------------

    pub fn config(&self) -> AnomalyDetectionConfig {
        self.state.lock().config.clone()
    }

    /// Swap thresholds in place. Accumulated baselines survive the swap.
    pub fn update_config(&self, config: AnomalyDetectionConfig) {
        let mut state = self.state.lock();
        state.history.truncate(config.history_limit);
        state.config = config;
    }

    /// Forget all learned baselines and restart the warm-up period.
    /// History is retained.
    pub fn reset_baselines(&self) {
        let mut state = self.state.lock();
        let window = state.config.baseline_window_size;
        state.store.clear(window);
        state.sample_count = 0;
        state.active.clear();
        state.prev_pids.clear();
        state.prev_conn_counts.clear();
        state.first_seen_names.clear();
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> EngineStats {
        let state = self.state.lock();
        EngineStats {
            sample_count: state.sample_count,
            tracked_processes: state.store.processes.len(),
            tracked_ports: state.store.ports.len(),
            active_anomalies: state.active.len(),
            history_len: state.history.len(),
            enabled: self.is_enabled(),
        }
    }
}

/// Identity used to decide whether a finding already existed last cycle.
fn fingerprint(anomaly: &Anomaly) -> (AnomalyType, Option<u32>, Option<u16>) {
    (anomaly.kind, anomaly.related_pid, anomaly.related_port)
}
