//! Central Configuration Constants
//!
//! Single source of truth for runtime defaults. Everything here can be
//! overridden through environment variables without rebuilding.

/// Default polling interval between refresh cycles (seconds)
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;

/// Default anomaly history cap (newest first, oldest dropped)
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "hostwatch";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Get polling interval from environment or use default
pub fn get_poll_interval() -> u64 {
    std::env::var("HOSTWATCH_POLL_INTERVAL")
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|&v| v > 0)
        .unwrap_or(DEFAULT_POLL_INTERVAL_SECS)
}

/// Get anomaly history cap from environment or use default
pub fn get_history_limit() -> usize {
    std::env::var("HOSTWATCH_HISTORY_LIMIT")
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|&v| v > 0)
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
}
