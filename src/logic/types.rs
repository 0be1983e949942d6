//! Core Data Model
//!
//! Normalized records produced by the snapshot providers. All of these are
//! plain values: a pid is only meaningful within the snapshot it came from,
//! since the OS recycles pids after process exit.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// PROCESSES
// ============================================================================

/// Coarse process state as reported by the OS scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessState {
    Running,
    Sleeping,
    Idle,
    Stopped,
    Zombie,
    Unknown,
}

impl ProcessState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessState::Running => "running",
            ProcessState::Sleeping => "sleeping",
            ProcessState::Idle => "idle",
            ProcessState::Stopped => "stopped",
            ProcessState::Zombie => "zombie",
            ProcessState::Unknown => "unknown",
        }
    }
}

/// One process as observed at snapshot time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub pid: u32,
    pub parent_pid: Option<u32>,
    pub name: String,
    pub executable_path: Option<PathBuf>,
    pub user: Option<String>,
    pub uid: Option<u32>,
    pub gid: Option<u32>,
    pub state: ProcessState,
    /// 0..(100 x cores); sysinfo reports per-core percentages
    pub cpu_percent: f32,
    pub memory_bytes: u64,
    pub memory_percent: f32,
    pub thread_count: u32,
    pub start_time: Option<DateTime<Utc>>,
    pub command_line: Option<String>,
}

impl ProcessInfo {
    /// Uid to feed the safety classifier; unknown owners must not be
    /// mistaken for root, so the fallback is a non-zero sentinel.
    pub fn uid_or_unknown(&self) -> u32 {
        self.uid.unwrap_or(u32::MAX)
    }
}

/// Node of the parent/child process tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessTreeNode {
    pub process: ProcessInfo,
    pub children: Vec<ProcessTreeNode>,
}

// ============================================================================
// CONNECTIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    Tcp,
    Tcp6,
    Udp,
    Udp6,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Tcp6 => "tcp6",
            Protocol::Udp => "udp",
            Protocol::Udp6 => "udp6",
        }
    }

    /// Transport family regardless of IP version.
    pub fn base(&self) -> &'static str {
        match self {
            Protocol::Tcp | Protocol::Tcp6 => "tcp",
            Protocol::Udp | Protocol::Udp6 => "udp",
        }
    }

    pub fn is_udp(&self) -> bool {
        matches!(self, Protocol::Udp | Protocol::Udp6)
    }
}

/// TCP state machine states, plus `None` for UDP sockets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Established,
    Listen,
    TimeWait,
    CloseWait,
    FinWait1,
    FinWait2,
    SynSent,
    SynReceived,
    LastAck,
    Closing,
    Closed,
    None,
    Unknown,
}

/// One socket as observed at snapshot time. Ownership resolution is
/// best-effort; not every socket maps back to a visible process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConnection {
    pub protocol: Protocol,
    pub local_address: String,
    pub local_port: u16,
    pub remote_address: String,
    pub remote_port: u16,
    pub state: ConnectionState,
    pub pid: Option<u32>,
    pub process_name: Option<String>,
    /// Reserved: the socket-table source exposes no per-connection byte
    /// accounting today, so these stay zero.
    pub bytes_in: u64,
    pub bytes_out: u64,
}

// ============================================================================
// PORTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortState {
    Listening,
    Established,
    Bound,
    Closed,
}

/// One local port aggregated over every socket sharing (port, protocol).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortInfo {
    pub number: u16,
    pub protocol: Protocol,
    pub state: PortState,
    pub bind_address: String,
    pub pid: Option<u32>,
    pub process_name: Option<String>,
    pub service_name: Option<String>,
    /// Fan-in: sockets sharing this local port+protocol
    pub connection_count: usize,
}

// ============================================================================
// INTERFACES & STATS
// ============================================================================

/// One network interface with cumulative counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkInterface {
    pub name: String,
    pub addresses: Vec<String>,
    pub mac_address: Option<String>,
    pub is_up: bool,
    pub is_loopback: bool,
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub packets_in: u64,
    pub packets_out: u64,
}

/// Host-wide traffic totals plus the instantaneous throughput derived from
/// the delta against the previous sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkStats {
    pub timestamp: DateTime<Utc>,
    pub total_bytes_in: u64,
    pub total_bytes_out: u64,
    pub total_packets_in: u64,
    pub total_packets_out: u64,
    pub active_connections: usize,
    pub bytes_in_per_sec: f64,
    pub bytes_out_per_sec: f64,
}

impl NetworkStats {
    pub fn total_throughput(&self) -> f64 {
        self.bytes_in_per_sec + self.bytes_out_per_sec
    }
}

/// One mutually consistent acquisition of all four sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemSnapshot {
    pub timestamp: DateTime<Utc>,
    pub processes: Vec<ProcessInfo>,
    pub connections: Vec<NetworkConnection>,
    pub listening_ports: Vec<PortInfo>,
    pub stats: NetworkStats,
}

// ============================================================================
// SIGNALS
// ============================================================================

/// The two termination signals the orchestrator is allowed to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KillSignal {
    /// SIGTERM-equivalent: ask the process to exit
    Terminate,
    /// SIGKILL-equivalent: force termination
    Kill,
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

/// Acquisition and execution failures surfaced by the providers.
///
/// A single malformed line of external-tool output is never an error; the
/// parsers skip it and keep going.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Insufficient privilege to read the source or send a signal
    AccessDenied,
    /// The pid/port no longer exists
    NotFound,
    /// Underlying OS call or external command failed
    System(String),
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderError::AccessDenied => write!(f, "access denied"),
            ProviderError::NotFound => write!(f, "not found"),
            ProviderError::System(msg) => write!(f, "system error: {}", msg),
        }
    }
}

impl std::error::Error for ProviderError {}

impl From<std::io::Error> for ProviderError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::PermissionDenied => ProviderError::AccessDenied,
            std::io::ErrorKind::NotFound => ProviderError::NotFound,
            _ => ProviderError::System(e.to_string()),
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;
