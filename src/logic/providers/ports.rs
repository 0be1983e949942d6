//! Port Snapshot Provider
//!
//! Aggregates the same socket table the network provider reads into one row
//! per (port, protocol), counting fan-in and resolving ownership. UDP has no
//! handshake, so UDP entries normalize to `Listening`.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::logic::providers::network::collect_sockets;
use crate::logic::providers::parse::SocketRecord;
use crate::logic::providers::PortProvider;
use crate::logic::types::{ConnectionState, PortInfo, PortState, Protocol, ProviderResult};

/// Well-known service names keyed by port number.
static SERVICE_NAMES: Lazy<HashMap<u16, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (20, "ftp-data"),
        (21, "ftp"),
        (22, "ssh"),
        (23, "telnet"),
        (25, "smtp"),
        (53, "dns"),
        (67, "dhcp"),
        (80, "http"),
        (110, "pop3"),
        (123, "ntp"),
        (143, "imap"),
        (443, "https"),
        (445, "smb"),
        (514, "syslog"),
        (631, "ipp"),
        (993, "imaps"),
        (995, "pop3s"),
        (1433, "mssql"),
        (3306, "mysql"),
        (3389, "rdp"),
        (5353, "mdns"),
        (5432, "postgresql"),
        (5672, "amqp"),
        (5900, "vnc"),
        (6379, "redis"),
        (8080, "http-alt"),
        (8443, "https-alt"),
        (9092, "kafka"),
        (9200, "elasticsearch"),
        (11211, "memcached"),
        (27017, "mongodb"),
    ])
});

pub fn service_name(port: u16) -> Option<&'static str> {
    SERVICE_NAMES.get(&port).copied()
}

pub struct LsofPortProvider;

impl LsofPortProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LsofPortProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl PortProvider for LsofPortProvider {
    fn list_ports(&self) -> ProviderResult<Vec<PortInfo>> {
        Ok(aggregate_ports(collect_sockets()?))
    }
}

fn port_state(rec: &SocketRecord) -> PortState {
    if rec.protocol.is_udp() {
        return PortState::Listening;
    }
    match rec.state {
        ConnectionState::Listen => PortState::Listening,
        ConnectionState::Established => PortState::Established,
        ConnectionState::Closed => PortState::Closed,
        _ => PortState::Bound,
    }
}

/// Collapse socket rows into one entry per (port, protocol) while counting
/// how many sockets share that local port.
pub(crate) fn aggregate_ports(records: Vec<SocketRecord>) -> Vec<PortInfo> {
    let mut table: HashMap<(u16, Protocol), PortInfo> = HashMap::new();
    let mut order: Vec<(u16, Protocol)> = Vec::new();

    for rec in records {
        let key = (rec.local_port, rec.protocol);
        let state = port_state(&rec);

        match table.get_mut(&key) {
            Some(entry) => {
                entry.connection_count += 1;
                // A listening socket defines the port's identity; prefer its
                // state and bind address over established peers.
                if state == PortState::Listening && entry.state != PortState::Listening {
                    entry.state = PortState::Listening;
                    entry.bind_address = rec.local_address.clone();
                    entry.pid = Some(rec.pid);
                    entry.process_name = Some(rec.command.clone());
                }
            }
            None => {
                order.push(key);
                table.insert(
                    key,
                    PortInfo {
                        number: rec.local_port,
                        protocol: rec.protocol,
                        state,
                        bind_address: rec.local_address.clone(),
                        pid: Some(rec.pid),
                        process_name: Some(rec.command.clone()),
                        service_name: service_name(rec.local_port).map(str::to_string),
                        connection_count: 1,
                    },
                );
            }
        }
    }

    order
        .into_iter()
        .filter_map(|key| table.remove(&key))
        .collect()
}
