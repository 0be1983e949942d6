//! Anomaly Types
//!
//! The anomaly record model: kinds, severities, categories, and the tagged
//! details payload. No detection logic here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::logic::types::Protocol;

// ============================================================================
// SEVERITY
// ============================================================================

/// Totally ordered: Low < Medium < High < Critical.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// KINDS & CATEGORIES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyCategory {
    Process,
    Network,
    Port,
}

/// Every anomaly kind the system can record. The detection rules fire most
/// of these; the few remaining kinds exist so callers recording externally
/// sourced findings share the same model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyType {
    // Process
    CpuSpike,
    MemorySpike,
    UnusualProcess,
    ZombieProcess,
    RapidProcessSpawn,
    PrivilegeEscalation,
    // Network
    TrafficSpike,
    ConnectionFlood,
    SuspiciousRemotePort,
    HalfOpenSurge,
    ProtocolAnomaly,
    // Port
    NewListeningPort,
    UnauthorizedPrivilegedPort,
    SuspiciousPortListening,
    PortExhaustion,
    ListenerChurn,
}

impl AnomalyType {
    /// Category is a pure function of the kind.
    pub fn category(&self) -> AnomalyCategory {
        match self {
            AnomalyType::CpuSpike
            | AnomalyType::MemorySpike
            | AnomalyType::UnusualProcess
            | AnomalyType::ZombieProcess
            | AnomalyType::RapidProcessSpawn
            | AnomalyType::PrivilegeEscalation => AnomalyCategory::Process,
            AnomalyType::TrafficSpike
            | AnomalyType::ConnectionFlood
            | AnomalyType::SuspiciousRemotePort
            | AnomalyType::HalfOpenSurge
            | AnomalyType::ProtocolAnomaly => AnomalyCategory::Network,
            AnomalyType::NewListeningPort
            | AnomalyType::UnauthorizedPrivilegedPort
            | AnomalyType::SuspiciousPortListening
            | AnomalyType::PortExhaustion
            | AnomalyType::ListenerChurn => AnomalyCategory::Port,
        }
    }

    /// Severity to use when a rule does not assign one explicitly.
    pub fn default_severity(&self) -> Severity {
        match self {
            AnomalyType::CpuSpike => Severity::Medium,
            AnomalyType::MemorySpike => Severity::Medium,
            AnomalyType::UnusualProcess => Severity::High,
            AnomalyType::ZombieProcess => Severity::Low,
            AnomalyType::RapidProcessSpawn => Severity::Medium,
            AnomalyType::PrivilegeEscalation => Severity::Critical,
            AnomalyType::TrafficSpike => Severity::Medium,
            AnomalyType::ConnectionFlood => Severity::High,
            AnomalyType::SuspiciousRemotePort => Severity::High,
            AnomalyType::HalfOpenSurge => Severity::Medium,
            AnomalyType::ProtocolAnomaly => Severity::Low,
            AnomalyType::NewListeningPort => Severity::Medium,
            AnomalyType::UnauthorizedPrivilegedPort => Severity::Critical,
            AnomalyType::SuspiciousPortListening => Severity::High,
            AnomalyType::PortExhaustion => Severity::Medium,
            AnomalyType::ListenerChurn => Severity::Low,
        }
    }
}

// ============================================================================
// DETAILS PAYLOAD
// ============================================================================

/// Type-tagged payload carrying the numbers behind the finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnomalyDetails {
    Process {
        pid: u32,
        name: String,
        current_value: f64,
        baseline_mean: f64,
        baseline_stddev: f64,
    },
    Network {
        bytes_in_per_sec: f64,
        bytes_out_per_sec: f64,
        baseline_mean: f64,
        connection_count: usize,
    },
    Port {
        port: u16,
        protocol: Protocol,
        process_name: Option<String>,
        first_seen: Option<DateTime<Utc>>,
    },
    None,
}

// ============================================================================
// ANOMALY RECORD
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anomaly {
    pub id: String,
    pub kind: AnomalyType,
    pub severity: Severity,
    pub category: AnomalyCategory,
    pub timestamp: DateTime<Utc>,
    pub title: String,
    pub description: String,
    pub details: AnomalyDetails,
    pub related_pid: Option<u32>,
    pub related_port: Option<u16>,
    pub related_address: Option<String>,
}

impl Anomaly {
    pub fn new(
        kind: AnomalyType,
        severity: Severity,
        timestamp: DateTime<Utc>,
        title: impl Into<String>,
        description: impl Into<String>,
        details: AnomalyDetails,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            severity,
            category: kind.category(),
            timestamp,
            title: title.into(),
            description: description.into(),
            details,
            related_pid: None,
            related_port: None,
            related_address: None,
        }
    }

    pub fn with_pid(mut self, pid: u32) -> Self {
        self.related_pid = Some(pid);
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.related_port = Some(port);
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.related_address = Some(address.into());
        self
    }
}

// ============================================================================
// SUMMARY
// ============================================================================

/// Counts over one anomaly list snapshot. Always recomputed, never
/// incrementally maintained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalySummary {
    pub total: usize,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub process: usize,
    pub network: usize,
    pub port: usize,
}

impl AnomalySummary {
    pub fn from_anomalies(anomalies: &[Anomaly]) -> Self {
        let mut summary = Self {
            total: anomalies.len(),
            ..Default::default()
        };
        for a in anomalies {
            match a.severity {
                Severity::Critical => summary.critical += 1,
                Severity::High => summary.high += 1,
                Severity::Medium => summary.medium += 1,
                Severity::Low => summary.low += 1,
            }
            match a.category {
                AnomalyCategory::Process => summary.process += 1,
                AnomalyCategory::Network => summary.network += 1,
                AnomalyCategory::Port => summary.port += 1,
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn test_every_kind_has_category_and_default_severity() {
        let kinds = [
            AnomalyType::CpuSpike,
            AnomalyType::MemorySpike,
            AnomalyType::UnusualProcess,
            AnomalyType::ZombieProcess,
            AnomalyType::RapidProcessSpawn,
            AnomalyType::PrivilegeEscalation,
            AnomalyType::TrafficSpike,
            AnomalyType::ConnectionFlood,
            AnomalyType::SuspiciousRemotePort,
            AnomalyType::HalfOpenSurge,
            AnomalyType::ProtocolAnomaly,
            AnomalyType::NewListeningPort,
            AnomalyType::UnauthorizedPrivilegedPort,
            AnomalyType::SuspiciousPortListening,
            AnomalyType::PortExhaustion,
            AnomalyType::ListenerChurn,
        ];
        assert_eq!(kinds.len(), 16);
        for kind in kinds {
            // Must not panic, and category must be stable.
            assert_eq!(kind.category(), kind.category());
            let _ = kind.default_severity();
        }
    }

    #[test]
    fn test_summary_counts() {
        let now = Utc::now();
        let mk = |kind: AnomalyType, sev: Severity| {
            Anomaly::new(kind, sev, now, "t", "d", AnomalyDetails::None)
        };
        let list = vec![
            mk(AnomalyType::UnusualProcess, Severity::Critical),
            mk(AnomalyType::ConnectionFlood, Severity::High),
            mk(AnomalyType::SuspiciousPortListening, Severity::High),
            mk(AnomalyType::ZombieProcess, Severity::Low),
            mk(AnomalyType::ZombieProcess, Severity::Low),
            mk(AnomalyType::ZombieProcess, Severity::Low),
        ];

        let summary = AnomalySummary::from_anomalies(&list);
        assert_eq!(summary.total, 6);
        assert_eq!(summary.critical, 1);
        assert_eq!(summary.high, 2);
        assert_eq!(summary.medium, 0);
        assert_eq!(summary.low, 3);
        assert_eq!(summary.process + summary.network + summary.port, 6);
    }
}
