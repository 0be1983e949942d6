//! Safety Classification Tables
//!
//! Fixed allowlists and port sets behind the tier rules. No classification
//! logic here, only constants.

/// Processes that keep the machine alive. Never killable, regardless of
/// `force`.
pub const CRITICAL_PROCESSES: &[&str] = &[
    "kernel_task",
    "launchd",
    "init",
    "systemd",
    "WindowServer",
    "loginwindow",
    "logd",
    "notifyd",
    "configd",
    "powerd",
    "kextd",
    "securityd",
    "opendirectoryd",
    "mds",
    "mds_stores",
];

/// Daemons the system expects to stay up; killable only with confirmation.
pub const SYSTEM_PROCESSES: &[&str] = &[
    "sshd",
    "syslogd",
    "cron",
    "ntpd",
    "mDNSResponder",
    "coreaudiod",
    "bluetoothd",
    "locationd",
    "airportd",
    "timed",
    "cfprefsd",
    "distnoted",
    "trustd",
    "apsd",
    "sharingd",
    "usbmuxd",
    "diskarbitrationd",
    "fseventsd",
    "UserEventAgent",
];

/// Ordinary tools that frequently run as root but are plainly user-driven.
/// Exempt from the uid==0 system promotion.
pub const KNOWN_USER_PROCESSES: &[&str] = &[
    "sudo", "su", "top", "htop", "ps", "lsof", "netstat", "tcpdump", "vim", "nano", "less",
    "man", "brew", "docker", "kubectl",
];

/// Case-insensitive substring patterns for applications where unsaved work
/// may be lost: documents, editors, IDEs, creative tools, communication,
/// browsers.
pub const IMPORTANT_APP_PATTERNS: &[&str] = &[
    "word",
    "excel",
    "powerpoint",
    "pages",
    "numbers",
    "keynote",
    "photoshop",
    "illustrator",
    "premiere",
    "final cut",
    "logic pro",
    "xcode",
    "visual studio",
    "intellij",
    "pycharm",
    "webstorm",
    "goland",
    "android studio",
    "sublime",
    "vscode",
    "chrome",
    "safari",
    "firefox",
    "edge",
    "brave",
    "opera",
    "slack",
    "teams",
    "zoom",
    "discord",
    "telegram",
    "signal",
    "mail",
    "outlook",
    "notion",
    "obsidian",
    "figma",
    "sketch",
];

/// Name suffixes marking disposable helper processes.
pub const BACKGROUND_SUFFIXES: &[&str] = &["Helper", "Agent", "_service"];

/// Name substring marking XPC service helpers.
pub const BACKGROUND_SUBSTRING: &str = "XPC";

// ============================================================================
// PORT SETS
// ============================================================================

/// Ports whose closure can lock the operator out or break name resolution.
pub const CRITICAL_PORTS: &[u16] = &[22, 53, 67, 68, 88, 123, 514];

/// Well-known system service ports below the registered range.
pub const SYSTEM_PORTS: &[u16] = &[25, 80, 110, 143, 443, 445, 548, 631, 993, 995, 5353];

/// Daemons whose listening ports classify as system-owned even off the
/// well-known lists.
pub const PORT_SYSTEM_OWNERS: &[&str] = &[
    "mDNSResponder",
    "rapportd",
    "sharingd",
    "remoted",
    "bluetoothd",
    "cupsd",
];

/// Registered-range ports worth a stronger warning: databases, caches,
/// brokers, and the usual dev servers.
pub const IMPORTANT_SERVICE_PORTS: &[u16] = &[
    1433, 1521, 3000, 3306, 3389, 4200, 5000, 5173, 5432, 5672, 5900, 6379, 8000, 8080, 8443,
    9000, 9092, 9200, 11211, 27017,
];

/// Start of the ephemeral port range.
pub const EPHEMERAL_PORT_START: u16 = 49152;

/// Start of the privileged range boundary.
pub const PRIVILEGED_PORT_MAX: u16 = 1024;
