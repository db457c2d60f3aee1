use std::process::Stdio;

use libc::{killpg, setsid, SIGKILL, SIGTERM};
use tokio::process::Command;

use crate::{
    error::{Error, Result},
    process::{LaunchSpec, ProcessControl, SpawnedProcess},
};

/// Unix implementation of the process-control seam.
#[derive(Debug, Default)]
pub struct UnixProcessControl;

impl UnixProcessControl {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl ProcessControl for UnixProcessControl {
    async fn spawn(&self, spec: &LaunchSpec) -> Result<SpawnedProcess> {
        let spawn_err = |source: std::io::Error| Error::Spawn {
            name: spec.name.clone(),
            source,
        };

        let log = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&spec.log)
            .map_err(spawn_err)?;
        let log_err = log.try_clone().map_err(spawn_err)?;

        let mut cmd = Command::new(&spec.cmd[0]);
        if spec.cmd.len() > 1 {
            cmd.args(&spec.cmd[1..]);
        }
        if let Some(dir) = &spec.cwd {
            cmd.current_dir(dir);
        }
        for (k, v) in &spec.env {
            cmd.env(k, v);
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err));

        // New session: the child leads its own process group and keeps
        // running after the supervisor exits.
        #[allow(unsafe_code)]
        unsafe {
            cmd.pre_exec(|| {
                if setsid() == -1 {
                    return Err(std::io::Error::last_os_error());
                }
                Ok(())
            });
        }

        let mut child = cmd.spawn().map_err(spawn_err)?;
        let pid = child
            .id()
            .ok_or_else(|| spawn_err(std::io::Error::other("spawned process has no pid")))?;
        let start_ticks = proc_start_ticks(pid);

        // Reap the child if it exits while this invocation is still alive;
        // a zombie would otherwise answer `kill(pid, 0)` and look alive to
        // every liveness probe in this process.
        tokio::spawn(async move {
            let _ = child.wait().await;
        });

        tracing::debug!(service = %spec.name, pid, "spawned detached process");
        Ok(SpawnedProcess { pid, start_ticks })
    }

    fn alive(&self, pid: u32, start_ticks: Option<u64>) -> bool {
        #[allow(unsafe_code)]
        let exists = unsafe { libc::kill(pid as libc::pid_t, 0) == 0 };
        if !exists {
            return false;
        }
        match (start_ticks, proc_start_ticks(pid)) {
            // Different start time: the PID has been recycled.
            (Some(recorded), Some(current)) => recorded == current,
            _ => true,
        }
    }

    async fn terminate(&self, pid: u32) -> Result<()> {
        signal_group(pid, SIGTERM)
    }

    async fn kill(&self, pid: u32) -> Result<()> {
        signal_group(pid, SIGKILL)
    }
}

fn signal_group(pid: u32, signal: libc::c_int) -> Result<()> {
    #[allow(unsafe_code)]
    let rc = unsafe { killpg(pid as libc::pid_t, signal) };
    if rc == -1 {
        let err = std::io::Error::last_os_error();
        // ESRCH: the group is already gone, which is what we wanted.
        if err.raw_os_error() == Some(libc::ESRCH) {
            return Ok(());
        }
        return Err(Error::Signal { pid, source: err });
    }
    Ok(())
}

/// Start time of the process in clock ticks since boot, field 22 of
/// `/proc/<pid>/stat`. `None` where procfs is unavailable; liveness then
/// falls back to the bare existence check.
fn proc_start_ticks(pid: u32) -> Option<u64> {
    let stat = std::fs::read_to_string(format!("/proc/{pid}/stat")).ok()?;
    // The comm field may contain spaces and parentheses; fields resume
    // after the last ')', with starttime 19 fields further on.
    let (_, rest) = stat.rsplit_once(')')?;
    rest.split_whitespace().nth(19)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(target_os = "linux")]
    fn own_start_ticks_readable() {
        assert!(proc_start_ticks(std::process::id()).is_some());
    }

    #[test]
    fn dead_pid_not_alive() {
        let control = UnixProcessControl::new();
        // PIDs roll over well below this on default kernels.
        assert!(!control.alive(u32::MAX - 1, None));
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn recycled_pid_not_alive() {
        let control = UnixProcessControl::new();
        let own = std::process::id();
        let current = proc_start_ticks(own).unwrap();
        assert!(control.alive(own, Some(current)));
        assert!(!control.alive(own, Some(current + 1)));
    }
}
