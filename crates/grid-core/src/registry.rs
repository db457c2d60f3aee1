//! Durable mapping from service name to running-process handle.
//!
//! One JSON record per service under `<state dir>/registry/`, so a later
//! invocation of the tool can find and stop processes started by an earlier
//! one. The registry stores what it is told; liveness is the process-control
//! seam's concern and is probed by the launcher, terminator and facade
//! before they act on a record.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Supervisor-side record of a live service process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Handle {
    pub pid: u32,
    pub started_at: DateTime<Utc>,
    /// Kernel start time of the process, read from `/proc/<pid>/stat` at
    /// launch. Compared on liveness probes to detect PID reuse.
    pub start_ticks: Option<u64>,
    pub state: HandleState,
    pub log: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleState {
    Starting,
    Running,
    Stopping,
}

#[derive(Debug)]
pub struct Registry {
    dir: PathBuf,
}

impl Registry {
    /// Open (creating if needed) the registry directory under `state_dir`.
    pub fn open(state_dir: &Path) -> Result<Self> {
        let dir = state_dir.join("registry");
        std::fs::create_dir_all(&dir).map_err(Error::Registry)?;
        Ok(Registry { dir })
    }

    fn record_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    /// Record a freshly created handle.
    ///
    /// # Errors
    /// Returns `Error::DuplicateService` if a record already exists for the
    /// name. Callers reconcile stale records (dead or recycled PIDs) before
    /// recording, so an existing record means a handle still being tracked.
    pub fn record(&self, name: &str, handle: &Handle) -> Result<()> {
        if self.record_path(name).exists() {
            return Err(Error::DuplicateService(name.to_owned()));
        }
        self.write(name, handle)
    }

    /// Rewrite an existing record (state transitions).
    pub fn update(&self, name: &str, handle: &Handle) -> Result<()> {
        self.write(name, handle)
    }

    fn write(&self, name: &str, handle: &Handle) -> Result<()> {
        let body = serde_json::to_vec_pretty(handle)?;
        // Temp-file-plus-rename keeps a record readable at every instant,
        // even with a concurrent invocation reading it.
        let tmp = self.dir.join(format!(".{name}.json.tmp"));
        std::fs::write(&tmp, body).map_err(Error::Registry)?;
        std::fs::rename(&tmp, self.record_path(name)).map_err(Error::Registry)?;
        tracing::debug!(service = name, pid = handle.pid, state = ?handle.state, "registry record written");
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<Option<Handle>> {
        let path = self.record_path(name);
        let body = match std::fs::read(&path) {
            Ok(body) => body,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(Error::Registry(err)),
        };
        Ok(Some(serde_json::from_slice(&body)?))
    }

    /// Remove a record. Idempotent.
    pub fn remove(&self, name: &str) -> Result<()> {
        match std::fs::remove_file(self.record_path(name)) {
            Ok(()) => {
                tracing::debug!(service = name, "registry record removed");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Error::Registry(err)),
        }
    }

    /// All records, name-sorted.
    pub fn list(&self) -> Result<Vec<(String, Handle)>> {
        let mut records = Vec::new();
        for entry in std::fs::read_dir(&self.dir).map_err(Error::Registry)? {
            let entry = entry.map_err(Error::Registry)?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Some(handle) = self.lookup(name)? {
                records.push((name.to_owned(), handle));
            }
        }
        records.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(records)
    }
}
