//! Starts a service detached from the supervisor's own lifetime and records
//! the resulting handle.

use std::path::PathBuf;

use chrono::Utc;
use grid_types::Service;
use tokio::time::{sleep, Instant};

use crate::{
    error::{Error, Result},
    installer::resolve_executable,
    process::{LaunchSpec, ProcessControl},
    ready,
    registry::{Handle, HandleState, Registry},
    supervisor::SupervisorOptions,
};

/// Launch `service` and poll its readiness check until it becomes usable.
///
/// A stale registry record (dead or recycled PID) is reconciled first; a
/// live one is `Error::DuplicateService`. On readiness timeout the process
/// is left running and the handle left `Starting` so the caller decides
/// what to do with it.
pub async fn start<P: ProcessControl>(
    control: &P,
    registry: &Registry,
    name: &str,
    service: &Service,
    log: PathBuf,
    options: &SupervisorOptions,
) -> Result<Handle> {
    if resolve_executable(service).is_none() {
        return Err(Error::NotInstalled(name.to_owned()));
    }

    if let Some(existing) = registry.lookup(name)? {
        if control.alive(existing.pid, existing.start_ticks) {
            return Err(Error::DuplicateService(name.to_owned()));
        }
        tracing::info!(service = name, pid = existing.pid, "reconciling stale registry record");
        registry.remove(name)?;
    }

    if let Some(parent) = log.parent() {
        std::fs::create_dir_all(parent).map_err(|source| Error::Spawn {
            name: name.to_owned(),
            source,
        })?;
    }

    let spec = LaunchSpec {
        name: name.to_owned(),
        cmd: service.cmd.clone(),
        cwd: service.cwd.clone(),
        env: service
            .env
            .clone()
            .map(|env| env.into_iter().collect())
            .unwrap_or_default(),
        log: log.clone(),
    };

    let spawned = control.spawn(&spec).await?;

    let mut handle = Handle {
        pid: spawned.pid,
        started_at: Utc::now(),
        start_ticks: spawned.start_ticks,
        state: HandleState::Starting,
        log,
    };
    registry.record(name, &handle)?;

    if let Some(check) = &service.ready {
        let deadline = Instant::now() + options.ready_timeout;
        loop {
            if ready::probe(check).await {
                break;
            }
            if !control.alive(handle.pid, handle.start_ticks) {
                registry.remove(name)?;
                return Err(Error::StartupFailed(name.to_owned()));
            }
            if Instant::now() >= deadline {
                return Err(Error::StartupTimeout {
                    name: name.to_owned(),
                    timeout_secs: options.ready_timeout.as_secs(),
                });
            }
            sleep(options.poll_interval).await;
        }
    }

    handle.state = HandleState::Running;
    registry.update(name, &handle)?;
    tracing::info!(service = name, pid = handle.pid, "service running");
    Ok(handle)
}
