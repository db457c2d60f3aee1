//! Stops a registered service: graceful signal, bounded wait, forceful
//! escalation, and registry reconciliation only once the process is
//! confirmed dead.

use std::time::Duration;

use grid_types::StopOutcome;
use tokio::time::{sleep, Instant};

use crate::{
    error::Result,
    process::ProcessControl,
    registry::{HandleState, Registry},
    supervisor::SupervisorOptions,
};

/// Grace period after SIGKILL before the outcome is declared ambiguous.
const KILL_CONFIRM: Duration = Duration::from_secs(2);

pub async fn stop<P: ProcessControl>(
    control: &P,
    registry: &Registry,
    name: &str,
    timeout: Duration,
    options: &SupervisorOptions,
) -> Result<StopOutcome> {
    let Some(mut handle) = registry.lookup(name)? else {
        return Ok(StopOutcome::NotRunning);
    };

    if !control.alive(handle.pid, handle.start_ticks) {
        // Died out of band (or the PID was recycled); the record is stale.
        registry.remove(name)?;
        return Ok(StopOutcome::NotRunning);
    }

    handle.state = HandleState::Stopping;
    registry.update(name, &handle)?;

    tracing::info!(service = name, pid = handle.pid, "sending termination signal");
    control.terminate(handle.pid).await?;

    if wait_dead(control, handle.pid, handle.start_ticks, timeout, options).await {
        registry.remove(name)?;
        return Ok(StopOutcome::Stopped);
    }

    tracing::warn!(service = name, pid = handle.pid, "escalating to forceful kill");
    control.kill(handle.pid).await?;

    if wait_dead(control, handle.pid, handle.start_ticks, KILL_CONFIRM, options).await {
        registry.remove(name)?;
        return Ok(StopOutcome::Stopped);
    }

    // Ambiguous: leave the record in `Stopping` rather than pretend.
    tracing::error!(service = name, pid = handle.pid, "process survived forceful kill");
    Ok(StopOutcome::TimedOut)
}

async fn wait_dead<P: ProcessControl>(
    control: &P,
    pid: u32,
    start_ticks: Option<u64>,
    timeout: Duration,
    options: &SupervisorOptions,
) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if !control.alive(pid, start_ticks) {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        sleep(options.poll_interval).await;
    }
}
