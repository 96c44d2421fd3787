use std::os::unix::process::ExitStatusExt;
use std::process::{Child, ExitStatus};

use log::{debug, warn};

/// A child whose exit status has been collected.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Reaped {
    pub pid: u32,
    pub name: String,
    pub status: i32,
}

/// Spawned stages that have not been waited for yet.
#[derive(Default)]
pub(crate) struct ChildTable {
    running: Vec<(Child, String)>,
}

impl ChildTable {
    pub(crate) fn track(&mut self, child: Child, name: &str) {
        self.running.push((child, name.to_string()));
    }

    pub(crate) fn len(&self) -> usize {
        self.running.len()
    }

    /// Collect every child that has already exited, without blocking.
    pub(crate) fn reap(&mut self) -> Vec<Reaped> {
        let mut reaped = Vec::new();
        let mut index = 0;
        while index < self.running.len() {
            let (child, name) = &mut self.running[index];
            match child.try_wait() {
                Ok(Some(status)) => {
                    let done = record(child.id(), name, status);
                    self.running.swap_remove(index);
                    reaped.push(done);
                }
                Ok(None) => index += 1,
                Err(err) => {
                    warn!("job event=reap pid={} error={}", child.id(), err);
                    self.running.swap_remove(index);
                }
            }
        }
        reaped
    }

    /// Block until every tracked child has exited.
    pub(crate) fn wait_all(&mut self) -> Vec<Reaped> {
        let mut reaped = Vec::with_capacity(self.running.len());
        for (mut child, name) in self.running.drain(..) {
            match child.wait() {
                Ok(status) => reaped.push(record(child.id(), &name, status)),
                Err(err) => warn!("job event=wait pid={} error={}", child.id(), err),
            }
        }
        reaped
    }
}

fn record(pid: u32, name: &str, status: ExitStatus) -> Reaped {
    let code = exit_status_code(status);
    debug!("job event=reap pid={} name={} status={}", pid, name, code);
    Reaped {
        pid,
        name: name.to_string(),
        status: code,
    }
}

pub fn exit_status_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        code
    } else if let Some(sig) = status.signal() {
        128 + sig
    } else {
        1
    }
}
