//! Safety Types
//!
//! Tiers and validation outcomes for the kill/close protocol. No logic here,
//! only data structures.

use serde::{Deserialize, Serialize};

// ============================================================================
// SAFETY TIERS
// ============================================================================

/// How dangerous it is to terminate a process. `Critical` is the most
/// protected tier; only `Background` validates as immediately killable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessSafetyLevel {
    Critical,
    System,
    Important,
    Normal,
    Background,
}

impl ProcessSafetyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessSafetyLevel::Critical => "critical",
            ProcessSafetyLevel::System => "system",
            ProcessSafetyLevel::Important => "important",
            ProcessSafetyLevel::Normal => "normal",
            ProcessSafetyLevel::Background => "background",
        }
    }
}

impl std::fmt::Display for ProcessSafetyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How dangerous it is to close a port (by terminating its owner).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortSafetyLevel {
    Critical,
    System,
    Important,
    Normal,
    Ephemeral,
}

impl PortSafetyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PortSafetyLevel::Critical => "critical",
            PortSafetyLevel::System => "system",
            PortSafetyLevel::Important => "important",
            PortSafetyLevel::Normal => "normal",
            PortSafetyLevel::Ephemeral => "ephemeral",
        }
    }
}

impl std::fmt::Display for PortSafetyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// VALIDATION OUTCOMES
// ============================================================================

/// Outcome of a kill request. A closed enum so UI-facing code can handle
/// every case exhaustively; kill paths never return `Err`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum KillResult {
    Success,
    /// Final. Callers must not offer a bypass.
    Blocked { reason: String },
    /// The caller must re-invoke with an explicit confirmed call.
    RequiresConfirmation {
        level: ProcessSafetyLevel,
        message: String,
    },
    Failed { error: String },
    AccessDenied,
    NotFound,
}

/// Outcome of a close-port request; mirrors [`KillResult`] and additionally
/// names the owning process in the confirmation prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PortCloseResult {
    Success,
    Blocked { reason: String },
    RequiresConfirmation {
        level: PortSafetyLevel,
        message: String,
        process_name: Option<String>,
    },
    Failed { error: String },
    AccessDenied,
    NotFound,
}

/// Result of a bulk close over every non-critical port.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkCloseResult {
    pub results: Vec<(u16, PortCloseResult)>,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped_critical: usize,
    pub skipped_system: usize,
}
