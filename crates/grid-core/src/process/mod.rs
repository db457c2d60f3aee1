use std::path::PathBuf;

use crate::error::Result;

pub mod mock;
pub mod unix;

/// Everything needed to launch one service process.
#[derive(Clone, Debug, PartialEq)]
pub struct LaunchSpec {
    pub name: String,
    pub cmd: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
    /// stdout and stderr are appended here.
    pub log: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnedProcess {
    pub pid: u32,
    /// Kernel start time observed right after the spawn, for PID-reuse
    /// detection on later liveness probes.
    pub start_ticks: Option<u64>,
}

/// Seam between the supervisor and the operating system.
///
/// Unlike an in-memory child table, every operation is keyed by PID so a
/// later invocation of the tool can act on processes it did not spawn.
#[async_trait::async_trait]
pub trait ProcessControl: Send + Sync {
    /// Spawn the process detached (own session and process group), with
    /// stdout/stderr appended to the spec's log file.
    async fn spawn(&self, spec: &LaunchSpec) -> Result<SpawnedProcess>;

    /// Whether the process is alive, guarding against PID reuse when
    /// `start_ticks` is available.
    fn alive(&self, pid: u32, start_ticks: Option<u64>) -> bool;

    /// Graceful termination signal to the process group.
    async fn terminate(&self, pid: u32) -> Result<()>;

    /// Forceful kill of the process group.
    async fn kill(&self, pid: u32) -> Result<()>;
}
