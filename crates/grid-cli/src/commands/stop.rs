use anyhow::Result;
use grid_core::{Selector, Supervisor, UnixProcessControl};
use grid_types::StopOutcome;

use crate::logger::Logger;

pub async fn stop(
    supervisor: &Supervisor<UnixProcessControl>,
    logger: &mut Logger,
    target: &str,
) -> Result<bool> {
    let batch = supervisor.stop(&Selector::parse(target)).await?;

    let mut ok = true;
    for outcome in &batch.outcomes {
        match &outcome.result {
            Ok(StopOutcome::Stopped) => logger.log(&outcome.service, "stopped"),
            Ok(StopOutcome::NotRunning) => logger.log(&outcome.service, "not running"),
            Ok(StopOutcome::TimedOut) => {
                ok = false;
                logger.error(&format!(
                    "{}: termination unconfirmed, process may still be running",
                    outcome.service
                ));
            }
            Err(err) => {
                ok = false;
                logger.error(&format!("{}: {err}", outcome.service));
            }
        }
    }

    Ok(ok)
}
