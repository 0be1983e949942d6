//! Safety Module
//!
//! Rates how dangerous it is to terminate a process or close a port, and
//! drives the validate/confirm/execute protocol.
//!
//! ## Structure
//! - `types`: tiers and validation outcomes
//! - `rules`: fixed allowlists and port sets
//! - `classifier`: pure classification and validation logic
//!
//! Only `Background`-tier processes ever validate as immediately killable;
//! everything else needs the caller to confirm and call the explicit
//! confirmed-execute operation, which re-classifies before signalling.

pub mod classifier;
pub mod rules;
pub mod types;

pub use classifier::{classify_port, classify_process, validate_close, validate_kill};
pub use types::{
    BulkCloseResult, KillResult, PortCloseResult, PortSafetyLevel, ProcessSafetyLevel,
};
