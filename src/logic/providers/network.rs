//! Network Snapshot Provider
//!
//! Shells out to the socket-listing utility for connections and to the
//! interface-counter utility for byte totals, then normalizes their tabular
//! output through `parse`. The only mutable state is the throughput delta
//! cache and the hostname cache, each behind its own lock.

use std::collections::HashMap;
use std::net::IpAddr;
use std::process::Command;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::logic::providers::parse::{self, SocketRecord};
use crate::logic::providers::NetworkProvider;
use crate::logic::types::{
    ConnectionState, NetworkConnection, NetworkInterface, NetworkStats, ProviderError,
    ProviderResult,
};

/// Previous cumulative totals, kept across `get_stats` calls.
#[derive(Debug, Clone, Copy)]
struct StatsCache {
    bytes_in: u64,
    bytes_out: u64,
    taken_at: DateTime<Utc>,
}

pub struct LsofNetworkProvider {
    stats_cache: Mutex<Option<StatsCache>>,
    hostname_cache: Mutex<HashMap<IpAddr, Option<String>>>,
}

impl LsofNetworkProvider {
    pub fn new() -> Self {
        Self {
            stats_cache: Mutex::new(None),
            hostname_cache: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for LsofNetworkProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the socket lister and parse every line that looks like a socket row.
/// Shared with the port provider, which aggregates the same table.
pub(crate) fn collect_sockets() -> ProviderResult<Vec<SocketRecord>> {
    let output = Command::new("lsof")
        .args(["-i", "-n", "-P", "+c", "0"])
        .output()
        .map_err(|e| ProviderError::System(format!("lsof: {}", e)))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    // lsof exits non-zero when some sockets are unreadable; only treat it as
    // fatal when nothing came back at all.
    if !output.status.success() && stdout.trim().is_empty() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.to_lowercase().contains("permission") {
            return Err(ProviderError::AccessDenied);
        }
        return Err(ProviderError::System(format!(
            "lsof exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    Ok(stdout
        .lines()
        .skip(1)
        .filter_map(parse::parse_socket_line)
        .collect())
}

fn connection_from_record(rec: SocketRecord) -> NetworkConnection {
    NetworkConnection {
        protocol: rec.protocol,
        local_address: rec.local_address,
        local_port: rec.local_port,
        remote_address: rec.remote_address.unwrap_or_else(|| "*".to_string()),
        remote_port: rec.remote_port.unwrap_or(0),
        state: rec.state,
        pid: Some(rec.pid),
        process_name: Some(rec.command),
        bytes_in: 0,
        bytes_out: 0,
    }
}

impl NetworkProvider for LsofNetworkProvider {
    fn list_connections(&self) -> ProviderResult<Vec<NetworkConnection>> {
        Ok(collect_sockets()?
            .into_iter()
            .map(connection_from_record)
            .collect())
    }

    fn list_interfaces(&self) -> ProviderResult<Vec<NetworkInterface>> {
        let output = Command::new("netstat")
            .args(["-ib"])
            .output()
            .map_err(|e| ProviderError::System(format!("netstat: {}", e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() && stdout.trim().is_empty() {
            return Err(ProviderError::System(format!(
                "netstat exited with {}",
                output.status
            )));
        }

        // The utility prints one row per bound address; the first row per
        // interface is the link row carrying MAC and counters.
        let mut order: Vec<String> = Vec::new();
        let mut interfaces: HashMap<String, NetworkInterface> = HashMap::new();

        for rec in stdout.lines().filter_map(parse::parse_interface_line) {
            let entry = interfaces.entry(rec.name.clone()).or_insert_with(|| {
                order.push(rec.name.clone());
                NetworkInterface {
                    name: rec.name.clone(),
                    addresses: Vec::new(),
                    mac_address: None,
                    is_up: true,
                    is_loopback: rec.name.starts_with("lo"),
                    bytes_in: rec.bytes_in,
                    bytes_out: rec.bytes_out,
                    packets_in: rec.packets_in,
                    packets_out: rec.packets_out,
                }
            });

            if rec.network.starts_with("<Link") {
                if rec.address.contains(':') {
                    entry.mac_address = Some(rec.address.clone());
                }
            } else if rec.address.parse::<IpAddr>().is_ok() {
                entry.addresses.push(rec.address.clone());
            }
        }

        Ok(order
            .into_iter()
            .filter_map(|name| interfaces.remove(&name))
            .collect())
    }

    fn get_stats(&self) -> ProviderResult<NetworkStats> {
        let interfaces = self.list_interfaces()?;
        let now = Utc::now();

        let mut bytes_in = 0u64;
        let mut bytes_out = 0u64;
        let mut packets_in = 0u64;
        let mut packets_out = 0u64;
        for iface in &interfaces {
            bytes_in += iface.bytes_in;
            bytes_out += iface.bytes_out;
            packets_in += iface.packets_in;
            packets_out += iface.packets_out;
        }

        let active_connections = self.list_connections().map(|c| c.len()).unwrap_or(0);

        let mut cache = self.stats_cache.lock();
        let (in_per_sec, out_per_sec) = match *cache {
            Some(prev) => {
                let elapsed = (now - prev.taken_at).num_milliseconds() as f64 / 1000.0;
                if elapsed > 0.0 {
                    (
                        bytes_in.saturating_sub(prev.bytes_in) as f64 / elapsed,
                        bytes_out.saturating_sub(prev.bytes_out) as f64 / elapsed,
                    )
                } else {
                    (0.0, 0.0)
                }
            }
            None => (0.0, 0.0),
        };
        *cache = Some(StatsCache {
            bytes_in,
            bytes_out,
            taken_at: now,
        });

        Ok(NetworkStats {
            timestamp: now,
            total_bytes_in: bytes_in,
            total_bytes_out: bytes_out,
            total_packets_in: packets_in,
            total_packets_out: packets_out,
            active_connections,
            bytes_in_per_sec: in_per_sec.max(0.0),
            bytes_out_per_sec: out_per_sec.max(0.0),
        })
    }

    fn resolve_hostname(&self, address: IpAddr) -> Option<String> {
        if let Some(cached) = self.hostname_cache.lock().get(&address) {
            return cached.clone();
        }

        let resolved = dns_lookup::lookup_addr(&address).ok();
        self.hostname_cache
            .lock()
            .insert(address, resolved.clone());
        resolved
    }
}
