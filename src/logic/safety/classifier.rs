//! Safety Classifier
//!
//! Pure, stateless tier classification plus the validation half of the
//! two-phase kill/close protocol. Classification of a given (name, pid, uid)
//! tuple is deterministic: identical input always yields the same tier.

use super::rules::{
    BACKGROUND_SUBSTRING, BACKGROUND_SUFFIXES, CRITICAL_PORTS, CRITICAL_PROCESSES,
    EPHEMERAL_PORT_START, IMPORTANT_APP_PATTERNS, IMPORTANT_SERVICE_PORTS, KNOWN_USER_PROCESSES,
    PORT_SYSTEM_OWNERS, PRIVILEGED_PORT_MAX, SYSTEM_PORTS, SYSTEM_PROCESSES,
};
use super::types::{KillResult, PortCloseResult, PortSafetyLevel, ProcessSafetyLevel};

// ============================================================================
// CLASSIFICATION
// ============================================================================

/// Classify a process into a safety tier.
pub fn classify_process(name: &str, pid: u32, uid: u32) -> ProcessSafetyLevel {
    if pid == 0 || pid == 1 {
        return ProcessSafetyLevel::Critical;
    }
    if CRITICAL_PROCESSES.iter().any(|p| name.eq_ignore_ascii_case(p)) {
        return ProcessSafetyLevel::Critical;
    }

    let on_system_list = SYSTEM_PROCESSES.iter().any(|p| name.eq_ignore_ascii_case(p));
    let known_user_tool = KNOWN_USER_PROCESSES
        .iter()
        .any(|p| name.eq_ignore_ascii_case(p));
    if on_system_list || (uid == 0 && !known_user_tool) {
        return ProcessSafetyLevel::System;
    }

    let lower = name.to_lowercase();
    if IMPORTANT_APP_PATTERNS.iter().any(|p| lower.contains(p)) {
        return ProcessSafetyLevel::Important;
    }

    if BACKGROUND_SUFFIXES.iter().any(|s| name.ends_with(s)) || name.contains(BACKGROUND_SUBSTRING)
    {
        return ProcessSafetyLevel::Background;
    }

    ProcessSafetyLevel::Normal
}

/// Classify a local port into a safety tier, given its owning process.
pub fn classify_port(port: u16, process_name: &str, pid: u32, uid: u32) -> PortSafetyLevel {
    let owner = classify_process(process_name, pid, uid);

    if owner == ProcessSafetyLevel::Critical || CRITICAL_PORTS.contains(&port) {
        return PortSafetyLevel::Critical;
    }

    let system_owner = PORT_SYSTEM_OWNERS
        .iter()
        .any(|p| process_name.eq_ignore_ascii_case(p));
    if system_owner
        || owner == ProcessSafetyLevel::System
        || SYSTEM_PORTS.contains(&port)
        || (uid == 0 && port < PRIVILEGED_PORT_MAX)
    {
        return PortSafetyLevel::System;
    }

    if port < PRIVILEGED_PORT_MAX
        || (port < EPHEMERAL_PORT_START && IMPORTANT_SERVICE_PORTS.contains(&port))
    {
        return PortSafetyLevel::Important;
    }

    if port >= EPHEMERAL_PORT_START {
        return PortSafetyLevel::Ephemeral;
    }

    PortSafetyLevel::Normal
}

// ============================================================================
// KILL/CLOSE VALIDATION (phase one of the two-phase protocol)
// ============================================================================

/// Validate a kill request. Never returns `Success` above `Background`: the
/// caller must confirm and then invoke the explicit confirmed-kill call.
pub fn validate_kill(name: &str, level: ProcessSafetyLevel, force: bool) -> KillResult {
    match level {
        ProcessSafetyLevel::Critical => KillResult::Blocked {
            reason: format!("{} is a critical system process and cannot be terminated", name),
        },
        ProcessSafetyLevel::System => {
            let message = if force {
                format!(
                    "{} is a system process. Force-killing it can destabilize the \
                     system or log you out. Confirm to proceed anyway.",
                    name
                )
            } else {
                format!(
                    "{} is a system process. Terminating it may affect system \
                     stability. Confirm to proceed.",
                    name
                )
            };
            KillResult::RequiresConfirmation {
                level,
                message,
            }
        }
        ProcessSafetyLevel::Important => KillResult::RequiresConfirmation {
            level,
            message: format!(
                "{} looks like an application you may be working in. Unsaved \
                 changes will be lost. Confirm to proceed.",
                name
            ),
        },
        ProcessSafetyLevel::Normal => KillResult::RequiresConfirmation {
            level,
            message: format!("Terminate {}?", name),
        },
        ProcessSafetyLevel::Background => KillResult::Success,
    }
}

/// Validate a close-port request. Closing a port terminates its owning
/// process, so every tier above `Critical` still asks for confirmation.
pub fn validate_close(
    port: u16,
    level: PortSafetyLevel,
    process_name: Option<&str>,
    force: bool,
) -> PortCloseResult {
    let owner = process_name.unwrap_or("unknown process");
    match level {
        PortSafetyLevel::Critical => PortCloseResult::Blocked {
            reason: format!(
                "port {} belongs to critical system service {} and cannot be closed",
                port, owner
            ),
        },
        PortSafetyLevel::System => {
            let message = if force {
                format!(
                    "Port {} is a system service port owned by {}. Force-closing \
                     it can break system services. Confirm to proceed anyway.",
                    port, owner
                )
            } else {
                format!(
                    "Port {} is a system service port owned by {}. Closing it \
                     terminates that process. Confirm to proceed.",
                    port, owner
                )
            };
            PortCloseResult::RequiresConfirmation {
                level,
                message,
                process_name: process_name.map(str::to_string),
            }
        }
        PortSafetyLevel::Important => PortCloseResult::RequiresConfirmation {
            level,
            message: format!(
                "Port {} serves {} and closing it terminates that process. \
                 Confirm to proceed.",
                port, owner
            ),
            process_name: process_name.map(str::to_string),
        },
        PortSafetyLevel::Normal | PortSafetyLevel::Ephemeral => {
            PortCloseResult::RequiresConfirmation {
                level,
                message: format!("Close port {} (owned by {})?", port, owner),
                process_name: process_name.map(str::to_string),
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pid_zero_and_one_are_critical() {
        assert_eq!(classify_process("anything", 0, 501), ProcessSafetyLevel::Critical);
        assert_eq!(classify_process("anything", 1, 501), ProcessSafetyLevel::Critical);
    }

    #[test]
    fn test_every_critical_allowlist_entry_is_critical_and_blocked() {
        for name in CRITICAL_PROCESSES {
            let level = classify_process(name, 4242, 501);
            assert_eq!(level, ProcessSafetyLevel::Critical, "{}", name);
            // Blocked regardless of force.
            assert!(matches!(
                validate_kill(name, level, false),
                KillResult::Blocked { .. }
            ));
            assert!(matches!(
                validate_kill(name, level, true),
                KillResult::Blocked { .. }
            ));
        }
    }

    #[test]
    fn test_root_owned_unknown_process_is_system() {
        assert_eq!(classify_process("mystery_daemon", 500, 0), ProcessSafetyLevel::System);
        // Root-run user tools stay exempt.
        assert_eq!(classify_process("sudo", 500, 0), ProcessSafetyLevel::Normal);
    }

    #[test]
    fn test_important_app_pattern_is_case_insensitive_substring() {
        assert_eq!(
            classify_process("Google Chrome", 300, 501),
            ProcessSafetyLevel::Important
        );
        assert_eq!(classify_process("XCODE", 300, 501), ProcessSafetyLevel::Important);
    }

    #[test]
    fn test_background_helpers() {
        assert_eq!(
            classify_process("Spotify Helper", 300, 501),
            ProcessSafetyLevel::Background
        );
        assert_eq!(
            classify_process("backupd_service", 300, 501),
            ProcessSafetyLevel::Background
        );
        assert_eq!(
            classify_process("com.widget.XPCBridge", 300, 501),
            ProcessSafetyLevel::Background
        );
    }

    #[test]
    fn test_plain_process_is_normal() {
        assert_eq!(classify_process("my_tool", 300, 501), ProcessSafetyLevel::Normal);
    }

    #[test]
    fn test_classification_is_pure() {
        let a = classify_process("nginx", 1234, 33);
        let b = classify_process("nginx", 1234, 33);
        assert_eq!(a, b);
    }

    #[test]
    fn test_ssh_port_is_critical() {
        assert_eq!(classify_port(22, "sshd", 88, 0), PortSafetyLevel::Critical);
    }

    #[test]
    fn test_ephemeral_port_for_user_app() {
        assert_eq!(classify_port(50000, "MyApp", 88, 501), PortSafetyLevel::Ephemeral);
    }

    #[test]
    fn test_privileged_port_tiers() {
        // Root-owned privileged port that is not on the critical set.
        assert_eq!(classify_port(81, "weird_httpd", 88, 0), PortSafetyLevel::System);
        // Unprivileged owner on a privileged port.
        assert_eq!(classify_port(999, "mytool", 88, 501), PortSafetyLevel::Important);
        // Registered-range database port.
        assert_eq!(classify_port(5432, "postgres", 88, 501), PortSafetyLevel::Important);
        // Plain registered-range port.
        assert_eq!(classify_port(20000, "mytool", 88, 501), PortSafetyLevel::Normal);
    }

    #[test]
    fn test_only_background_kills_without_confirmation() {
        assert_eq!(
            validate_kill("Spotify Helper", ProcessSafetyLevel::Background, false),
            KillResult::Success
        );
        for level in [
            ProcessSafetyLevel::System,
            ProcessSafetyLevel::Important,
            ProcessSafetyLevel::Normal,
        ] {
            assert!(matches!(
                validate_kill("p", level, false),
                KillResult::RequiresConfirmation { .. }
            ));
        }
    }

    #[test]
    fn test_system_kill_message_escalates_under_force() {
        let gentle = validate_kill("sshd", ProcessSafetyLevel::System, false);
        let forced = validate_kill("sshd", ProcessSafetyLevel::System, true);
        match (gentle, forced) {
            (
                KillResult::RequiresConfirmation { message: m1, .. },
                KillResult::RequiresConfirmation { message: m2, .. },
            ) => {
                assert_ne!(m1, m2);
                assert!(m2.contains("Force"));
            }
            other => panic!("unexpected outcomes: {:?}", other),
        }
    }

    #[test]
    fn test_close_validation_never_succeeds_without_confirmation() {
        let result = validate_close(50000, PortSafetyLevel::Ephemeral, Some("MyApp"), false);
        assert!(matches!(
            result,
            PortCloseResult::RequiresConfirmation { .. }
        ));
        let blocked = validate_close(22, PortSafetyLevel::Critical, Some("sshd"), true);
        assert!(matches!(blocked, PortCloseResult::Blocked { .. }));
    }
}
