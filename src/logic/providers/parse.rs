//! External Tool Output Parsers
//!
//! Line-oriented, best-effort parsers for the two introspection utilities:
//! the socket lister (`lsof -i -n -P` style columns
//! `COMMAND PID ... TYPE ... NODE NAME`) and the interface counter table
//! (`netstat -ib` style columns
//! `Name Mtu Network Address Ipkts Ierrs Ibytes Opkts Oerrs Obytes Coll`).
//!
//! A line that does not match is skipped, never an error; acquisition keeps
//! whatever did parse.

use crate::logic::types::{ConnectionState, Protocol};

/// One socket row from the socket-listing utility.
#[derive(Debug, Clone, PartialEq)]
pub struct SocketRecord {
    pub command: String,
    pub pid: u32,
    pub protocol: Protocol,
    pub local_address: String,
    pub local_port: u16,
    pub remote_address: Option<String>,
    pub remote_port: Option<u16>,
    pub state: ConnectionState,
}

/// One raw interface counter row.
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceRecord {
    pub name: String,
    pub mtu: u32,
    pub network: String,
    pub address: String,
    pub packets_in: u64,
    pub bytes_in: u64,
    pub packets_out: u64,
    pub bytes_out: u64,
}

/// Parse one socket-table line.
///
/// NAME is `local[->remote]` optionally followed by `(STATE)`; IPv6
/// endpoints are bracketed `[addr]:port`; the NODE column contains "TCP" or
/// "UDP" while the TYPE column flags IPv6.
pub fn parse_socket_line(line: &str) -> Option<SocketRecord> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 5 {
        return None;
    }

    // Locate the protocol column instead of trusting a fixed index: command
    // names with spaces shift everything after them.
    let node_idx = parts
        .iter()
        .position(|p| p.contains("TCP") || p.contains("UDP"))?;
    let name_field = parts.get(node_idx + 1)?;

    let command = parts.first()?.to_string();
    let pid: u32 = parts.get(1)?.parse().ok()?;

    let is_tcp = parts[node_idx].contains("TCP");
    let is_v6 = parts[node_idx].contains('6')
        || parts.iter().take(node_idx).any(|p| *p == "IPv6")
        || name_field.starts_with('[');
    let protocol = match (is_tcp, is_v6) {
        (true, false) => Protocol::Tcp,
        (true, true) => Protocol::Tcp6,
        (false, false) => Protocol::Udp,
        (false, true) => Protocol::Udp6,
    };

    let state = parts
        .get(node_idx + 2)
        .map(|s| parse_state(s.trim_matches(['(', ')'])))
        .unwrap_or(if is_tcp {
            ConnectionState::Unknown
        } else {
            ConnectionState::None
        });

    if let Some((local, remote)) = name_field.split_once("->") {
        let (local_address, local_port) = split_endpoint(local)?;
        let (remote_address, remote_port) = split_endpoint(remote)?;
        Some(SocketRecord {
            command,
            pid,
            protocol,
            local_address,
            local_port,
            remote_address: Some(remote_address),
            remote_port: Some(remote_port),
            state,
        })
    } else {
        let (local_address, local_port) = split_endpoint(name_field)?;
        Some(SocketRecord {
            command,
            pid,
            protocol,
            local_address,
            local_port,
            remote_address: None,
            remote_port: None,
            state,
        })
    }
}

/// Split `addr:port` into (addr, port), handling `[v6]:port` brackets and
/// `*` wildcards for both halves.
pub fn split_endpoint(s: &str) -> Option<(String, u16)> {
    let pos = s.rfind(':')?;
    let addr = s[..pos].trim_matches(['[', ']']).to_string();
    let port_str = &s[pos + 1..];
    let port: u16 = if port_str == "*" {
        0
    } else {
        port_str.parse().ok()?
    };
    if addr.is_empty() {
        return None;
    }
    Some((addr, port))
}

/// Map a socket-state token to the normalized enum.
pub fn parse_state(s: &str) -> ConnectionState {
    match s {
        "ESTABLISHED" => ConnectionState::Established,
        "LISTEN" => ConnectionState::Listen,
        "TIME_WAIT" => ConnectionState::TimeWait,
        "CLOSE_WAIT" => ConnectionState::CloseWait,
        "FIN_WAIT_1" | "FIN_WAIT1" => ConnectionState::FinWait1,
        "FIN_WAIT_2" | "FIN_WAIT2" => ConnectionState::FinWait2,
        "SYN_SENT" => ConnectionState::SynSent,
        "SYN_RCVD" | "SYN_RECEIVED" => ConnectionState::SynReceived,
        "LAST_ACK" => ConnectionState::LastAck,
        "CLOSING" => ConnectionState::Closing,
        "CLOSED" => ConnectionState::Closed,
        _ => ConnectionState::Unknown,
    }
}

/// Parse one interface counter row. Index-positional: rows with fewer than
/// the full 11 columns (address-less pseudo interfaces) are skipped.
pub fn parse_interface_line(line: &str) -> Option<InterfaceRecord> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 11 || parts[0] == "Name" {
        return None;
    }

    Some(InterfaceRecord {
        name: parts[0].to_string(),
        mtu: parts[1].parse().ok()?,
        network: parts[2].to_string(),
        address: parts[3].to_string(),
        packets_in: parts[4].parse().ok()?,
        bytes_in: parts[6].parse().ok()?,
        packets_out: parts[7].parse().ok()?,
        bytes_out: parts[9].parse().ok()?,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_listening_tcp_socket() {
        let line = "nginx     1234 root    6u  IPv4 0x1a2b3c      0t0  TCP 127.0.0.1:8080 (LISTEN)";
        let rec = parse_socket_line(line).unwrap();
        assert_eq!(rec.command, "nginx");
        assert_eq!(rec.pid, 1234);
        assert_eq!(rec.protocol, Protocol::Tcp);
        assert_eq!(rec.local_address, "127.0.0.1");
        assert_eq!(rec.local_port, 8080);
        assert_eq!(rec.remote_address, None);
        assert_eq!(rec.state, ConnectionState::Listen);
    }

    #[test]
    fn test_parse_established_connection() {
        let line =
            "curl      999  alice  5u  IPv4 0xdead  0t0  TCP 192.168.1.5:54321->93.184.216.34:443 (ESTABLISHED)";
        let rec = parse_socket_line(line).unwrap();
        assert_eq!(rec.local_port, 54321);
        assert_eq!(rec.remote_address.as_deref(), Some("93.184.216.34"));
        assert_eq!(rec.remote_port, Some(443));
        assert_eq!(rec.state, ConnectionState::Established);
    }

    #[test]
    fn test_parse_ipv6_bracketed_endpoint() {
        let line = "node      4321 bob   20u  IPv6 0xbeef  0t0  TCP [::1]:3000 (LISTEN)";
        let rec = parse_socket_line(line).unwrap();
        assert_eq!(rec.protocol, Protocol::Tcp6);
        assert_eq!(rec.local_address, "::1");
        assert_eq!(rec.local_port, 3000);
    }

    #[test]
    fn test_parse_udp_without_state() {
        let line = "mDNSRespo 321  _mdnsresponder 10u  IPv4 0xaa  0t0  UDP *:5353";
        let rec = parse_socket_line(line).unwrap();
        assert_eq!(rec.protocol, Protocol::Udp);
        assert_eq!(rec.local_address, "*");
        assert_eq!(rec.local_port, 5353);
        assert_eq!(rec.state, ConnectionState::None);
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        assert_eq!(parse_socket_line(""), None);
        assert_eq!(parse_socket_line("COMMAND PID USER FD TYPE DEVICE SIZE NODE NAME"), None);
        assert_eq!(parse_socket_line("garbage with no protocol column at all"), None);
        // pid column not numeric (command with a space shifted everything)
        assert_eq!(
            parse_socket_line("My App 12x4 u 5u IPv4 0x0 0t0 TCP 1.2.3.4:80 (LISTEN)"),
            None
        );
    }

    #[test]
    fn test_split_endpoint_wildcard_port() {
        assert_eq!(split_endpoint("*:*"), Some(("*".into(), 0)));
        assert_eq!(split_endpoint("10.0.0.1:22"), Some(("10.0.0.1".into(), 22)));
        assert_eq!(split_endpoint("[fe80::1]:443"), Some(("fe80::1".into(), 443)));
        assert_eq!(split_endpoint("no-port"), None);
    }

    #[test]
    fn test_parse_interface_link_row() {
        let line = "en0   1500  <Link#4>    aa:bb:cc:dd:ee:ff  123456  0  78901234  23456  0  8901234  0";
        let rec = parse_interface_line(line).unwrap();
        assert_eq!(rec.name, "en0");
        assert_eq!(rec.mtu, 1500);
        assert_eq!(rec.address, "aa:bb:cc:dd:ee:ff");
        assert_eq!(rec.packets_in, 123456);
        assert_eq!(rec.bytes_in, 78901234);
        assert_eq!(rec.packets_out, 23456);
        assert_eq!(rec.bytes_out, 8901234);
    }

    #[test]
    fn test_parse_interface_skips_header_and_short_rows() {
        assert_eq!(
            parse_interface_line("Name  Mtu   Network       Address            Ipkts Ierrs     Ibytes    Opkts Oerrs     Obytes  Coll"),
            None
        );
        assert_eq!(parse_interface_line("gif0* 1280 <Link#2>"), None);
    }
}
