//! Monitor Orchestrator
//!
//! Ties the providers, the safety classifier and the detection engine
//! together behind one injectable struct. Owns the sampling loop and the
//! two-phase kill/close protocol; holds no ambient global state, so tests
//! drive it with fake providers and multiple instances coexist.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::{debug, info, warn};

use crate::logic::anomaly::{Anomaly, DetectionEngine, Severity};
use crate::logic::providers::{
    LsofNetworkProvider, LsofPortProvider, NetworkProvider, PortProvider, ProcessProvider,
    SystemProcessProvider,
};
use crate::logic::safety::{
    self, BulkCloseResult, KillResult, PortCloseResult, PortSafetyLevel, ProcessSafetyLevel,
};
use crate::logic::types::{
    ConnectionState, KillSignal, NetworkConnection, PortInfo, ProcessInfo, ProviderError,
    ProviderResult, Protocol, SystemSnapshot,
};

// ============================================================================
// MONITOR
// ============================================================================

pub struct Monitor {
    processes: Arc<dyn ProcessProvider>,
    network: Arc<dyn NetworkProvider>,
    ports: Arc<dyn PortProvider>,
    engine: Arc<DetectionEngine>,
    running: AtomicBool,
}

impl Monitor {
    pub fn new(
        processes: Arc<dyn ProcessProvider>,
        network: Arc<dyn NetworkProvider>,
        ports: Arc<dyn PortProvider>,
        engine: Arc<DetectionEngine>,
    ) -> Self {
        Self {
            processes,
            network,
            ports,
            engine,
            running: AtomicBool::new(false),
        }
    }

    /// Production wiring: live providers and a default-config engine.
    pub fn with_defaults() -> Self {
        Self::new(
            Arc::new(SystemProcessProvider::new()),
            Arc::new(LsofNetworkProvider::new()),
            Arc::new(LsofPortProvider::new()),
            Arc::new(DetectionEngine::default()),
        )
    }

    pub fn engine(&self) -> &DetectionEngine {
        &self.engine
    }

    // ------------------------------------------------------------------
    // Acquisition
    // ------------------------------------------------------------------

    /// Acquire all four domains concurrently. The providers block on
    /// external tools, so each runs on the blocking pool.
    pub async fn get_system_snapshot(&self) -> ProviderResult<SystemSnapshot> {
        let p = Arc::clone(&self.processes);
        let procs = tokio::task::spawn_blocking(move || p.list_processes());
        let n = Arc::clone(&self.network);
        let conns = tokio::task::spawn_blocking(move || n.list_connections());
        let pt = Arc::clone(&self.ports);
        let ports = tokio::task::spawn_blocking(move || pt.list_listening_ports());
        let n2 = Arc::clone(&self.network);
        let stats = tokio::task::spawn_blocking(move || n2.get_stats());

        let (procs, conns, ports, stats) = tokio::try_join!(procs, conns, ports, stats)
            .map_err(|e| ProviderError::System(format!("acquisition task failed: {e}")))?;

        Ok(SystemSnapshot {
            timestamp: Utc::now(),
            processes: procs?,
            connections: conns?,
            listening_ports: ports?,
            stats: stats?,
        })
    }

    /// One full sampling cycle: acquire, then run detection.
    pub async fn run_cycle(&self) -> ProviderResult<Vec<Anomaly>> {
        let snapshot = self.get_system_snapshot().await?;
        debug!(
            "cycle: {} processes, {} connections, {} listeners",
            snapshot.processes.len(),
            snapshot.connections.len(),
            snapshot.listening_ports.len(),
        );
        Ok(self.engine.analyze(&snapshot))
    }

    // ------------------------------------------------------------------
    // Sampling loop
    // ------------------------------------------------------------------

    /// Spawn the periodic sampling loop. Idempotent while already running.
    pub fn start(self: &Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        self.running.store(true, Ordering::SeqCst);
        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            info!("monitor loop started (interval {:?})", interval);
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            while monitor.running.load(Ordering::SeqCst) {
                ticker.tick().await;
                if !monitor.running.load(Ordering::SeqCst) {
                    break;
                }
                match monitor.run_cycle().await {
                    Ok(anomalies) => {
                        let urgent = anomalies
                            .iter()
                            .filter(|a| a.severity >= Severity::High)
                            .count();
                        if urgent > 0 {
                            warn!(
                                "{} active anomalies ({} high or critical)",
                                anomalies.len(),
                                urgent
                            );
                        }
                    }
                    Err(e) => warn!("sampling cycle failed: {e}"),
                }
            }
            info!("monitor loop stopped");
        })
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn get_top_processes_by_cpu(&self, limit: usize) -> ProviderResult<Vec<ProcessInfo>> {
        let mut procs = self.processes.list_processes()?;
        procs.sort_by(|a, b| {
            b.cpu_percent
                .partial_cmp(&a.cpu_percent)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        procs.truncate(limit);
        Ok(procs)
    }

    pub fn get_top_processes_by_memory(&self, limit: usize) -> ProviderResult<Vec<ProcessInfo>> {
        let mut procs = self.processes.list_processes()?;
        procs.sort_by(|a, b| b.memory_bytes.cmp(&a.memory_bytes));
        procs.truncate(limit);
        Ok(procs)
    }

    pub fn get_connections_for_process(
        &self,
        pid: u32,
    ) -> ProviderResult<Vec<NetworkConnection>> {
        self.network.connections_for_pid(pid)
    }

    /// All connections whose owning process matches `name`, case-insensitively.
    /// Covers every pid of a multi-process server in one call.
    pub fn get_connections_for_process_named(
        &self,
        name: &str,
    ) -> ProviderResult<Vec<NetworkConnection>> {
        let mut conns = self.network.list_connections()?;
        conns.retain(|c| {
            c.process_name
                .as_deref()
                .map(|n| n.eq_ignore_ascii_case(name))
                .unwrap_or(false)
        });
        Ok(conns)
    }

    pub fn get_active_connections(&self) -> ProviderResult<Vec<NetworkConnection>> {
        self.network
            .connections_with_state(ConnectionState::Established)
    }

    pub fn which_process_uses_port(
        &self,
        port: u16,
        protocol: Protocol,
    ) -> ProviderResult<Option<(u32, String)>> {
        self.ports.find_process_using_port(port, protocol)
    }

    // ------------------------------------------------------------------
    // Process safety operations
    // ------------------------------------------------------------------

    pub fn get_process_safety_level(
        &self,
        pid: u32,
    ) -> ProviderResult<Option<ProcessSafetyLevel>> {
        Ok(self
            .processes
            .get_process(pid)?
            .map(|p| safety::classify_process(&p.name, p.pid, p.uid_or_unknown())))
    }

    /// Phase one of the kill protocol: classify and validate, touch nothing.
    pub fn validate_kill_process(&self, pid: u32, force: bool) -> KillResult {
        match self.processes.get_process(pid) {
            Ok(Some(p)) => {
                let level = safety::classify_process(&p.name, p.pid, p.uid_or_unknown());
                safety::validate_kill(&p.name, level, force)
            }
            Ok(None) => KillResult::NotFound,
            Err(e) => kill_result_from(e),
        }
    }

    /// Polite termination. Only `Background`-tier processes are signalled
    /// without confirmation; everything else is returned to the caller.
    pub fn terminate_process(&self, pid: u32) -> KillResult {
        match self.validate_kill_process(pid, false) {
            KillResult::Success => self.deliver_signal(pid, KillSignal::Terminate),
            other => other,
        }
    }

    /// Forced termination; escalates the confirmation wording but is still
    /// gated by the same tiers.
    pub fn force_quit_process(&self, pid: u32) -> KillResult {
        match self.validate_kill_process(pid, true) {
            KillResult::Success => self.deliver_signal(pid, KillSignal::Kill),
            other => other,
        }
    }

    /// Phase two: the caller has confirmed. Re-classifies before acting in
    /// case the pid was reused since validation.
    pub fn execute_confirmed_kill(&self, pid: u32, signal: KillSignal) -> KillResult {
        let proc = match self.processes.get_process(pid) {
            Ok(Some(p)) => p,
            Ok(None) => return KillResult::NotFound,
            Err(e) => return kill_result_from(e),
        };
        let level = safety::classify_process(&proc.name, proc.pid, proc.uid_or_unknown());
        if level == ProcessSafetyLevel::Critical {
            return safety::validate_kill(&proc.name, level, false);
        }
        self.deliver_signal(pid, signal)
    }

    fn deliver_signal(&self, pid: u32, signal: KillSignal) -> KillResult {
        match self.processes.send_signal(pid, signal) {
            Ok(()) => {
                info!("signalled pid {} with {:?}", pid, signal);
                KillResult::Success
            }
            Err(e) => kill_result_from(e),
        }
    }

    // ------------------------------------------------------------------
    // Port safety operations
    // ------------------------------------------------------------------

    pub fn get_port_safety_level(
        &self,
        port: u16,
        protocol: Protocol,
    ) -> ProviderResult<Option<PortSafetyLevel>> {
        match self.ports.find_process_using_port(port, protocol)? {
            Some((pid, name)) => {
                let uid = self.owner_uid(pid);
                Ok(Some(safety::classify_port(port, &name, pid, uid)))
            }
            None => Ok(None),
        }
    }

    /// Phase one of the close protocol.
    pub fn validate_close_port(&self, port: u16, protocol: Protocol, force: bool) -> PortCloseResult {
        match self.ports.find_process_using_port(port, protocol) {
            Ok(Some((pid, name))) => {
                let uid = self.owner_uid(pid);
                let level = safety::classify_port(port, &name, pid, uid);
                safety::validate_close(port, level, Some(&name), force)
            }
            Ok(None) => PortCloseResult::NotFound,
            Err(e) => close_result_from(e),
        }
    }

    /// Validate and, where the tier permits, close in one call. Closing a
    /// port means terminating its owning process, so every tier currently
    /// comes back asking for confirmation.
    pub fn close_port(&self, port: u16, protocol: Protocol, force: bool) -> PortCloseResult {
        match self.validate_close_port(port, protocol, force) {
            PortCloseResult::Success => self.execute_confirmed_close_port(port, protocol),
            other => other,
        }
    }

    /// Phase two: confirmed close. Re-resolves ownership before signalling.
    pub fn execute_confirmed_close_port(&self, port: u16, protocol: Protocol) -> PortCloseResult {
        let (pid, name) = match self.ports.find_process_using_port(port, protocol) {
            Ok(Some(found)) => found,
            Ok(None) => return PortCloseResult::NotFound,
            Err(e) => return close_result_from(e),
        };
        let uid = self.owner_uid(pid);
        let level = safety::classify_port(port, &name, pid, uid);
        if level == PortSafetyLevel::Critical {
            return safety::validate_close(port, level, Some(&name), false);
        }
        match self.processes.send_signal(pid, KillSignal::Terminate) {
            Ok(()) => {
                info!("closed port {}/{} by terminating {} (pid {})", port, protocol.as_str(), name, pid);
                PortCloseResult::Success
            }
            Err(e) => close_result_from(e),
        }
    }

    /// Listening ports a user may close without touching system services.
    pub fn get_closable_ports(&self) -> ProviderResult<Vec<(PortInfo, PortSafetyLevel)>> {
        let mut out = Vec::new();
        for port in self.ports.list_listening_ports()? {
            let level = match (port.pid, port.process_name.as_deref()) {
                (Some(pid), Some(name)) => {
                    safety::classify_port(port.number, name, pid, self.owner_uid(pid))
                }
                _ => continue,
            };
            if level != PortSafetyLevel::Critical && level != PortSafetyLevel::System {
                out.push((port, level));
            }
        }
        Ok(out)
    }

    /// Confirmed bulk close. Critical ports are always skipped; system
    /// ports are skipped unless `force` is set.
    pub fn close_all_non_critical_ports(&self, force: bool) -> ProviderResult<BulkCloseResult> {
        let ports = self.ports.list_listening_ports()?;
        let mut result = BulkCloseResult::default();
        let mut signalled: Vec<u32> = Vec::new();

        for port in ports {
            let (pid, name) = match (port.pid, port.process_name.clone()) {
                (Some(pid), Some(name)) => (pid, name),
                _ => {
                    result.failed += 1;
                    result.results.push((
                        port.number,
                        PortCloseResult::Failed {
                            error: "owning process unknown".to_string(),
                        },
                    ));
                    continue;
                }
            };
            let level = safety::classify_port(port.number, &name, pid, self.owner_uid(pid));
            match level {
                PortSafetyLevel::Critical => {
                    result.skipped_critical += 1;
                    result.results.push((
                        port.number,
                        safety::validate_close(port.number, level, Some(&name), force),
                    ));
                    continue;
                }
                PortSafetyLevel::System if !force => {
                    result.skipped_system += 1;
                    result.results.push((
                        port.number,
                        safety::validate_close(port.number, level, Some(&name), force),
                    ));
                    continue;
                }
                _ => {}
            }

            // One signal per owning process even when it holds several ports.
            if signalled.contains(&pid) {
                result.succeeded += 1;
                result.results.push((port.number, PortCloseResult::Success));
                continue;
            }
            match self.processes.send_signal(pid, KillSignal::Terminate) {
                Ok(()) => {
                    signalled.push(pid);
                    result.succeeded += 1;
                    result.results.push((port.number, PortCloseResult::Success));
                }
                Err(e) => {
                    result.failed += 1;
                    result.results.push((port.number, close_result_from(e)));
                }
            }
        }
        Ok(result)
    }

    fn owner_uid(&self, pid: u32) -> u32 {
        self.processes
            .get_process(pid)
            .ok()
            .flatten()
            .map(|p| p.uid_or_unknown())
            .unwrap_or(u32::MAX)
    }
}

fn kill_result_from(e: ProviderError) -> KillResult {
    match e {
        ProviderError::AccessDenied => KillResult::AccessDenied,
        ProviderError::NotFound => KillResult::NotFound,
        ProviderError::System(msg) => KillResult::Failed { error: msg },
    }
}

fn close_result_from(e: ProviderError) -> PortCloseResult {
    match e {
        ProviderError::AccessDenied => PortCloseResult::AccessDenied,
        ProviderError::NotFound => PortCloseResult::NotFound,
        ProviderError::System(msg) => PortCloseResult::Failed { error: msg },
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::types::{NetworkInterface, NetworkStats, PortState, ProcessState};
    use parking_lot::Mutex;
    use std::net::IpAddr;

    struct FakeProcesses {
        procs: Vec<ProcessInfo>,
        killed: Mutex<Vec<(u32, KillSignal)>>,
    }

    impl FakeProcesses {
        fn new(procs: Vec<ProcessInfo>) -> Self {
            Self {
                procs,
                killed: Mutex::new(Vec::new()),
            }
        }
    }

    impl ProcessProvider for FakeProcesses {
        fn list_processes(&self) -> ProviderResult<Vec<ProcessInfo>> {
            Ok(self.procs.clone())
        }

        fn send_signal(&self, pid: u32, signal: KillSignal) -> ProviderResult<()> {
            if self.procs.iter().any(|p| p.pid == pid) {
                self.killed.lock().push((pid, signal));
                Ok(())
            } else {
                Err(ProviderError::NotFound)
            }
        }
    }

    struct FakeNetwork {
        conns: Vec<NetworkConnection>,
    }

    impl NetworkProvider for FakeNetwork {
        fn list_connections(&self) -> ProviderResult<Vec<NetworkConnection>> {
            Ok(self.conns.clone())
        }

        fn list_interfaces(&self) -> ProviderResult<Vec<NetworkInterface>> {
            Ok(vec![])
        }

        fn get_stats(&self) -> ProviderResult<NetworkStats> {
            Ok(NetworkStats {
                timestamp: Utc::now(),
                total_bytes_in: 0,
                total_bytes_out: 0,
                total_packets_in: 0,
                total_packets_out: 0,
                active_connections: self.conns.len(),
                bytes_in_per_sec: 0.0,
                bytes_out_per_sec: 0.0,
            })
        }

        fn resolve_hostname(&self, _address: IpAddr) -> Option<String> {
            None
        }
    }

    struct FakePorts {
        ports: Vec<PortInfo>,
    }

    impl PortProvider for FakePorts {
        fn list_ports(&self) -> ProviderResult<Vec<PortInfo>> {
            Ok(self.ports.clone())
        }
    }

    fn proc(pid: u32, name: &str, uid: u32) -> ProcessInfo {
        ProcessInfo {
            pid,
            parent_pid: Some(1),
            name: name.to_string(),
            executable_path: Some(format!("/usr/bin/{name}").into()),
            user: None,
            uid: Some(uid),
            gid: Some(20),
            state: ProcessState::Running,
            cpu_percent: 1.0,
            memory_bytes: 1024,
            memory_percent: 0.1,
            thread_count: 1,
            start_time: None,
            command_line: None,
        }
    }

    fn listener(port: u16, pid: u32, name: &str) -> PortInfo {
        PortInfo {
            number: port,
            protocol: Protocol::Tcp,
            state: PortState::Listening,
            bind_address: "127.0.0.1".to_string(),
            pid: Some(pid),
            process_name: Some(name.to_string()),
            service_name: None,
            connection_count: 0,
        }
    }

    fn monitor(
        procs: Vec<ProcessInfo>,
        ports: Vec<PortInfo>,
    ) -> (Arc<Monitor>, Arc<FakeProcesses>) {
        let fake_procs = Arc::new(FakeProcesses::new(procs));
        let m = Monitor::new(
            Arc::clone(&fake_procs) as Arc<dyn ProcessProvider>,
            Arc::new(FakeNetwork { conns: vec![] }),
            Arc::new(FakePorts { ports }),
            Arc::new(DetectionEngine::default()),
        );
        (Arc::new(m), fake_procs)
    }

    #[tokio::test]
    async fn test_snapshot_gathers_all_domains() {
        let (m, _) = monitor(
            vec![proc(100, "worker", 501)],
            vec![listener(8080, 100, "worker")],
        );
        let snap = m.get_system_snapshot().await.unwrap();
        assert_eq!(snap.processes.len(), 1);
        assert_eq!(snap.listening_ports.len(), 1);
        assert!(snap.connections.is_empty());
    }

    #[tokio::test]
    async fn test_cold_start_cycle_is_silent() {
        let (m, _) = monitor(vec![proc(100, "worker", 501)], vec![]);
        assert!(m.run_cycle().await.unwrap().is_empty());
    }

    #[test]
    fn test_terminate_background_process_succeeds_directly() {
        let (m, fakes) = monitor(vec![proc(300, "ReportCrash Helper", 501)], vec![]);
        assert_eq!(m.terminate_process(300), KillResult::Success);
        assert_eq!(*fakes.killed.lock(), vec![(300, KillSignal::Terminate)]);
    }

    #[test]
    fn test_terminate_normal_process_requires_confirmation() {
        let (m, fakes) = monitor(vec![proc(300, "myapp", 501)], vec![]);
        assert!(matches!(
            m.terminate_process(300),
            KillResult::RequiresConfirmation {
                level: ProcessSafetyLevel::Normal,
                ..
            }
        ));
        assert!(fakes.killed.lock().is_empty());

        // Confirmed follow-up delivers the signal.
        assert_eq!(
            m.execute_confirmed_kill(300, KillSignal::Terminate),
            KillResult::Success
        );
        assert_eq!(*fakes.killed.lock(), vec![(300, KillSignal::Terminate)]);
    }

    #[test]
    fn test_confirmed_kill_still_blocks_critical() {
        let (m, fakes) = monitor(vec![proc(300, "launchd", 501)], vec![]);
        assert!(matches!(
            m.execute_confirmed_kill(300, KillSignal::Kill),
            KillResult::Blocked { .. }
        ));
        assert!(fakes.killed.lock().is_empty());
    }

    #[test]
    fn test_kill_missing_process_is_not_found() {
        let (m, _) = monitor(vec![], vec![]);
        assert_eq!(m.terminate_process(9999), KillResult::NotFound);
        assert_eq!(
            m.execute_confirmed_kill(9999, KillSignal::Kill),
            KillResult::NotFound
        );
    }

    #[test]
    fn test_close_port_protocol() {
        let (m, fakes) = monitor(
            vec![proc(500, "node", 501)],
            vec![listener(3000, 500, "node")],
        );
        // Phase one asks for confirmation.
        assert!(matches!(
            m.validate_close_port(3000, Protocol::Tcp, false),
            PortCloseResult::RequiresConfirmation { .. }
        ));
        assert!(fakes.killed.lock().is_empty());

        // Phase two terminates the owner.
        assert_eq!(
            m.execute_confirmed_close_port(3000, Protocol::Tcp),
            PortCloseResult::Success
        );
        assert_eq!(*fakes.killed.lock(), vec![(500, KillSignal::Terminate)]);
    }

    #[test]
    fn test_confirmed_close_blocks_critical_port() {
        let (m, fakes) = monitor(
            vec![proc(88, "sshd", 0)],
            vec![listener(22, 88, "sshd")],
        );
        assert!(matches!(
            m.execute_confirmed_close_port(22, Protocol::Tcp),
            PortCloseResult::Blocked { .. }
        ));
        assert!(fakes.killed.lock().is_empty());
    }

    #[test]
    fn test_closable_ports_exclude_protected_tiers() {
        let (m, _) = monitor(
            vec![proc(88, "sshd", 0), proc(500, "node", 501)],
            vec![listener(22, 88, "sshd"), listener(3000, 500, "node")],
        );
        let closable = m.get_closable_ports().unwrap();
        assert_eq!(closable.len(), 1);
        assert_eq!(closable[0].0.number, 3000);
    }

    #[test]
    fn test_bulk_close_skips_protected_and_counts() {
        let (m, fakes) = monitor(
            vec![
                proc(88, "sshd", 0),
                proc(90, "cupsd", 0),
                proc(500, "node", 501),
                proc(600, "python3", 501),
            ],
            vec![
                listener(22, 88, "sshd"),
                listener(631, 90, "cupsd"),
                listener(3000, 500, "node"),
                listener(8000, 600, "python3"),
            ],
        );
        let result = m.close_all_non_critical_ports(false).unwrap();
        assert_eq!(result.skipped_critical, 1);
        assert_eq!(result.skipped_system, 1);
        assert_eq!(result.succeeded, 2);
        assert_eq!(result.failed, 0);
        let killed = fakes.killed.lock();
        assert!(killed.contains(&(500, KillSignal::Terminate)));
        assert!(killed.contains(&(600, KillSignal::Terminate)));
    }

    #[test]
    fn test_which_process_uses_port_matches_family() {
        let (m, _) = monitor(
            vec![proc(500, "node", 501)],
            vec![listener(3000, 500, "node")],
        );
        let found = m.which_process_uses_port(3000, Protocol::Tcp6).unwrap();
        assert_eq!(found, Some((500, "node".to_string())));
    }

    #[test]
    fn test_connections_for_process_named_spans_pids() {
        let conn = |pid: u32, name: Option<&str>, local_port: u16| NetworkConnection {
            protocol: Protocol::Tcp,
            local_address: "127.0.0.1".to_string(),
            local_port,
            remote_address: "10.0.0.9".to_string(),
            remote_port: 443,
            state: ConnectionState::Established,
            pid: Some(pid),
            process_name: name.map(str::to_string),
            bytes_in: 0,
            bytes_out: 0,
        };
        let m = Monitor::new(
            Arc::new(FakeProcesses::new(vec![
                proc(500, "node", 501),
                proc(501, "node", 501),
            ])) as Arc<dyn ProcessProvider>,
            Arc::new(FakeNetwork {
                conns: vec![
                    conn(500, Some("node"), 40001),
                    conn(501, Some("Node"), 40002),
                    conn(600, Some("python3"), 40003),
                    conn(700, None, 40004),
                ],
            }),
            Arc::new(FakePorts { ports: vec![] }),
            Arc::new(DetectionEngine::default()),
        );

        let found = m.get_connections_for_process_named("node").unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|c| c.pid == Some(500) || c.pid == Some(501)));

        // Pid-keyed lookup still sees only its own pid's share.
        assert_eq!(m.get_connections_for_process(500).unwrap().len(), 1);
    }

    #[test]
    fn test_top_processes_ordering() {
        let mut a = proc(1, "init", 0);
        a.cpu_percent = 1.0;
        a.memory_bytes = 10;
        let mut b = proc(2000, "hog", 501);
        b.cpu_percent = 50.0;
        b.memory_bytes = 1_000_000;
        let (m, _) = monitor(vec![a, b], vec![]);

        let top = m.get_top_processes_by_cpu(1).unwrap();
        assert_eq!(top[0].pid, 2000);
        let top = m.get_top_processes_by_memory(1).unwrap();
        assert_eq!(top[0].pid, 2000);
    }
}
