use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    path::PathBuf,
    time::Duration,
};

use serde::{Deserialize, Serialize};

/// A set of named services managed together.
///
/// Services are kept in a `BTreeMap` so that "all"-style operations visit
/// them in a fixed, deterministic order.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub version: u32,
    pub deploy_dir: PathBuf,
    pub services: BTreeMap<String, Service>,
}

/// Static descriptor for one manageable service.
#[derive(Debug, Clone, PartialEq)]
pub struct Service {
    /// Executable and arguments; the first element is the program.
    pub cmd: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: Option<HashMap<String, String>>,
    /// Log destination; defaults to `<state dir>/log/<name>.log`.
    pub log: Option<PathBuf>,
    /// Delegated installer command, if the service has one.
    pub install: Option<Vec<String>>,
    /// Predicate deciding when a launched process has become usable.
    pub ready: Option<ReadyCheck>,
    /// Per-service graceful-stop budget.
    pub stop_timeout: Option<Duration>,
}

/// Readiness predicate for a launched process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReadyCheck {
    /// Passes once the file at `path` exists.
    Path { path: PathBuf },
    /// Passes once a TCP connection to `127.0.0.1:port` succeeds.
    Port { port: u16 },
}

/// Externally visible state of a service, as reported by `status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// The executable does not resolve.
    Uninstalled,
    /// Installed but no live process.
    Stopped,
    Starting,
    Running,
    Stopping,
}

impl ServiceState {
    pub fn is_running(self) -> bool {
        matches!(self, ServiceState::Running)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ServiceState::Uninstalled => "uninstalled",
            ServiceState::Stopped => "stopped",
            ServiceState::Starting => "starting",
            ServiceState::Running => "running",
            ServiceState::Stopping => "stopping",
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a stop request.
///
/// `NotRunning` is a normal idempotent result, not an error. `TimedOut`
/// means the process survived both signals; the registry entry is left in
/// place so the ambiguity stays visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    TimedOut,
    NotRunning,
}

impl fmt::Display for StopOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StopOutcome::Stopped => "stopped",
            StopOutcome::TimedOut => "timed out",
            StopOutcome::NotRunning => "not running",
        };
        f.write_str(s)
    }
}
