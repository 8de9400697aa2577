// src/process/tree.rs

//! Process-tree snapshots and forced termination.

use std::collections::HashMap;

use sysinfo::{Pid, ProcessRefreshKind, ProcessStatus, ProcessesToUpdate, Signal, System};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Member {
    pid: Pid,
    start_time: u64,
}

/// The processes rooted at one pid, captured at a point in time.
///
/// Members are ordered children before parents, root last, which is the
/// order they are destroyed in. Each member remembers its start time so a
/// recycled pid is never signalled.
#[derive(Debug, Clone)]
pub struct ProcessTree {
    members: Vec<Member>,
}

impl ProcessTree {
    pub fn snapshot(root: u32) -> Self {
        let system = refreshed_system();
        let root = Pid::from_u32(root);

        let mut children: HashMap<Pid, Vec<Member>> = HashMap::new();
        for (pid, process) in system.processes() {
            if process.thread_kind().is_some() {
                continue;
            }
            if let Some(parent) = process.parent() {
                children.entry(parent).or_default().push(Member {
                    pid: *pid,
                    start_time: process.start_time(),
                });
            }
        }

        let mut members = Vec::new();
        if let Some(process) = system.process(root) {
            let root = Member {
                pid: root,
                start_time: process.start_time(),
            };
            collect_post_order(root, &children, &mut members);
        }

        Self { members }
    }

    pub fn pids(&self) -> Vec<u32> {
        self.members.iter().map(|m| m.pid.as_u32()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Forcibly kill every member still alive. Returns how many were
    /// signalled.
    pub fn kill_all(&self) -> usize {
        let system = refreshed_system();
        let mut killed = 0;

        for member in &self.members {
            let Some(process) = system.process(member.pid) else {
                continue;
            };
            if process.start_time() != member.start_time
                || process.status() == ProcessStatus::Zombie
            {
                continue;
            }
            if process.kill_with(Signal::Kill).unwrap_or_else(|| process.kill()) {
                trace!(pid = member.pid.as_u32(), "killed");
                killed += 1;
            } else {
                debug!(pid = member.pid.as_u32(), "kill request was refused");
            }
        }

        killed
    }
}

fn collect_post_order(node: Member, children: &HashMap<Pid, Vec<Member>>, out: &mut Vec<Member>) {
    if out.iter().any(|m| m.pid == node.pid) {
        return;
    }
    if let Some(kids) = children.get(&node.pid) {
        for kid in kids {
            collect_post_order(*kid, children, out);
        }
    }
    out.push(node);
}

/// Ask a process to stop (SIGTERM where supported). Returns `false` when the
/// request could not be delivered.
pub fn interrupt(pid: u32) -> bool {
    let system = refreshed_system();
    match system.process(Pid::from_u32(pid)) {
        Some(process) => process.kill_with(Signal::Term).unwrap_or(false),
        None => false,
    }
}

/// True if `pid` names a live, non-zombie process.
pub fn is_alive(pid: u32) -> bool {
    let system = refreshed_system();
    system
        .process(Pid::from_u32(pid))
        .is_some_and(|p| p.status() != ProcessStatus::Zombie)
}

fn refreshed_system() -> System {
    let mut system = System::new();
    system.refresh_processes_specifics(
        ProcessesToUpdate::All,
        true,
        ProcessRefreshKind::nothing(),
    );
    system
}
