//! Snapshot Providers
//!
//! Pull current OS state and normalize it into the typed records in
//! `logic::types`. Pure acquisition: no detection logic lives here, and the
//! detection/safety code never sees which external tool produced the data.
//!
//! Each provider is a trait with one OS-backed implementation; tests swap in
//! fixture-backed fakes.

pub mod parse;
pub mod process;
pub mod network;
pub mod ports;

use std::collections::HashMap;
use std::net::IpAddr;

use crate::logic::types::{
    ConnectionState, KillSignal, NetworkConnection, NetworkInterface, NetworkStats, PortInfo,
    PortState, ProcessInfo, ProcessTreeNode, Protocol, ProviderResult,
};

pub use network::LsofNetworkProvider;
pub use ports::LsofPortProvider;
pub use process::SystemProcessProvider;

/// Process snapshot acquisition plus signal delivery.
///
/// `list_processes` is the primitive; everything else is derived from it by
/// filtering and indexing, so fakes only need to supply the list.
pub trait ProcessProvider: Send + Sync {
    /// Every visible process, sorted by cpu% descending. Pids that vanish
    /// mid-enumeration are omitted, not an error.
    fn list_processes(&self) -> ProviderResult<Vec<ProcessInfo>>;

    /// Send a termination signal. `NotFound` if the pid is already gone.
    fn send_signal(&self, pid: u32, signal: KillSignal) -> ProviderResult<()>;

    fn get_process(&self, pid: u32) -> ProviderResult<Option<ProcessInfo>> {
        Ok(self.list_processes()?.into_iter().find(|p| p.pid == pid))
    }

    fn children_of(&self, pid: u32) -> ProviderResult<Vec<ProcessInfo>> {
        Ok(self
            .list_processes()?
            .into_iter()
            .filter(|p| p.parent_pid == Some(pid))
            .collect())
    }

    /// Case-insensitive substring match on name and command line.
    fn search(&self, pattern: &str) -> ProviderResult<Vec<ProcessInfo>> {
        let needle = pattern.to_lowercase();
        Ok(self
            .list_processes()?
            .into_iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&needle)
                    || p.command_line
                        .as_deref()
                        .map(|c| c.to_lowercase().contains(&needle))
                        .unwrap_or(false)
            })
            .collect())
    }

    /// Parent/child tree. A process whose parent is 0, 1, or absent from the
    /// snapshot is a root.
    fn process_tree(&self) -> ProviderResult<Vec<ProcessTreeNode>> {
        let processes = self.list_processes()?;
        Ok(build_process_tree(processes))
    }
}

/// Socket, interface, and throughput acquisition.
pub trait NetworkProvider: Send + Sync {
    fn list_connections(&self) -> ProviderResult<Vec<NetworkConnection>>;

    fn list_interfaces(&self) -> ProviderResult<Vec<NetworkInterface>>;

    /// Interface counters aggregated host-wide, with instantaneous
    /// throughput derived from the delta against the previous call.
    fn get_stats(&self) -> ProviderResult<NetworkStats>;

    /// Best-effort reverse DNS; failures return `None`, never an error.
    fn resolve_hostname(&self, address: IpAddr) -> Option<String>;

    fn connections_with_state(
        &self,
        state: ConnectionState,
    ) -> ProviderResult<Vec<NetworkConnection>> {
        Ok(self
            .list_connections()?
            .into_iter()
            .filter(|c| c.state == state)
            .collect())
    }

    fn connections_for_pid(&self, pid: u32) -> ProviderResult<Vec<NetworkConnection>> {
        Ok(self
            .list_connections()?
            .into_iter()
            .filter(|c| c.pid == Some(pid))
            .collect())
    }
}

/// Local port table acquisition.
pub trait PortProvider: Send + Sync {
    /// All local ports, deduplicated by (port, protocol) with fan-in counts.
    fn list_ports(&self) -> ProviderResult<Vec<PortInfo>>;

    fn list_listening_ports(&self) -> ProviderResult<Vec<PortInfo>> {
        Ok(self
            .list_ports()?
            .into_iter()
            .filter(|p| p.state == PortState::Listening)
            .collect())
    }

    /// Resolve ownership by joining the port table. Protocol matching is
    /// family-wide (tcp matches tcp6).
    fn find_process_using_port(
        &self,
        port: u16,
        protocol: Protocol,
    ) -> ProviderResult<Option<(u32, String)>> {
        Ok(self.list_ports()?.into_iter().find_map(|p| {
            if p.number == port && p.protocol.base() == protocol.base() {
                match (p.pid, p.process_name) {
                    (Some(pid), Some(name)) => Some((pid, name)),
                    _ => None,
                }
            } else {
                None
            }
        }))
    }
}

/// Group by parent pid and recursively attach children.
fn build_process_tree(processes: Vec<ProcessInfo>) -> Vec<ProcessTreeNode> {
    let known: std::collections::HashSet<u32> = processes.iter().map(|p| p.pid).collect();
    let mut by_parent: HashMap<u32, Vec<ProcessInfo>> = HashMap::new();
    let mut roots: Vec<ProcessInfo> = Vec::new();

    for p in processes {
        match p.parent_pid {
            Some(pp) if pp != 0 && pp != 1 && known.contains(&pp) && pp != p.pid => {
                by_parent.entry(pp).or_default().push(p);
            }
            _ => roots.push(p),
        }
    }

    fn attach(p: ProcessInfo, by_parent: &mut HashMap<u32, Vec<ProcessInfo>>) -> ProcessTreeNode {
        let children = by_parent
            .remove(&p.pid)
            .unwrap_or_default()
            .into_iter()
            .map(|c| attach(c, by_parent))
            .collect();
        ProcessTreeNode {
            process: p,
            children,
        }
    }

    roots
        .into_iter()
        .map(|r| attach(r, &mut by_parent))
        .collect()
}
