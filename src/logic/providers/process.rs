//! Process Snapshot Provider
//!
//! sysinfo-backed enumeration of every visible process, plus signal
//! delivery for the kill paths. All state (the sysinfo `System` handle) sits
//! behind one lock so calls are safe from any thread.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use sysinfo::{Pid, ProcessStatus, Signal, System, Users};

use crate::logic::providers::ProcessProvider;
use crate::logic::types::{KillSignal, ProcessInfo, ProcessState, ProviderError, ProviderResult};

pub struct SystemProcessProvider {
    system: Mutex<System>,
}

impl SystemProcessProvider {
    pub fn new() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();
        Self {
            system: Mutex::new(sys),
        }
    }
}

impl Default for SystemProcessProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessProvider for SystemProcessProvider {
    fn list_processes(&self) -> ProviderResult<Vec<ProcessInfo>> {
        let mut sys = self.system.lock();
        sys.refresh_processes();
        sys.refresh_memory();

        let users = Users::new_with_refreshed_list();
        let total_memory = sys.total_memory();

        let mut processes: Vec<ProcessInfo> = sys
            .processes()
            .iter()
            .map(|(pid, proc)| {
                let uid = proc.user_id().map(|u| **u);
                let user = proc
                    .user_id()
                    .and_then(|u| users.get_user_by_id(u))
                    .map(|u| u.name().to_string());

                let memory_bytes = proc.memory();
                let memory_percent = if total_memory > 0 {
                    (memory_bytes as f64 / total_memory as f64 * 100.0) as f32
                } else {
                    0.0
                };

                let start_time = match proc.start_time() {
                    0 => None,
                    secs => DateTime::<Utc>::from_timestamp(secs as i64, 0),
                };

                let cmdline = if proc.cmd().is_empty() {
                    None
                } else {
                    Some(proc.cmd().join(" "))
                };

                ProcessInfo {
                    pid: pid.as_u32(),
                    parent_pid: proc.parent().map(|p| p.as_u32()),
                    name: proc.name().to_string(),
                    executable_path: proc.exe().map(PathBuf::from),
                    user,
                    uid,
                    gid: proc.group_id().map(|g| *g),
                    state: map_status(proc.status()),
                    cpu_percent: proc.cpu_usage(),
                    memory_bytes,
                    memory_percent,
                    thread_count: thread_count(proc),
                    start_time,
                    command_line: cmdline,
                }
            })
            .collect();

        processes.sort_by(|a, b| {
            b.cpu_percent
                .partial_cmp(&a.cpu_percent)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(processes)
    }

    fn send_signal(&self, pid: u32, signal: KillSignal) -> ProviderResult<()> {
        let mut sys = self.system.lock();
        sys.refresh_processes();

        let proc = sys
            .process(Pid::from_u32(pid))
            .ok_or(ProviderError::NotFound)?;

        let sig = match signal {
            KillSignal::Terminate => Signal::Term,
            KillSignal::Kill => Signal::Kill,
        };

        // kill_with returns None when the platform has no such signal; fall
        // back to plain kill (SIGKILL) in that case.
        let delivered = proc.kill_with(sig).unwrap_or_else(|| proc.kill());
        if delivered {
            log::info!("sent {:?} to pid {} ({})", signal, pid, proc.name());
            Ok(())
        } else {
            // The usual cause for a refused signal is EPERM.
            Err(ProviderError::AccessDenied)
        }
    }
}

fn map_status(status: ProcessStatus) -> ProcessState {
    match status {
        ProcessStatus::Run => ProcessState::Running,
        ProcessStatus::Sleep => ProcessState::Sleeping,
        ProcessStatus::Idle => ProcessState::Idle,
        ProcessStatus::Stop => ProcessState::Stopped,
        ProcessStatus::Zombie => ProcessState::Zombie,
        _ => ProcessState::Unknown,
    }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn thread_count(proc: &sysinfo::Process) -> u32 {
    proc.tasks().map(|t| t.len() as u32).unwrap_or(1)
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn thread_count(_proc: &sysinfo::Process) -> u32 {
    1
}
