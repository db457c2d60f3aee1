use anyhow::Result;
use grid_core::{Selector, Supervisor, UnixProcessControl};

use crate::logger::Logger;

pub async fn install(
    supervisor: &Supervisor<UnixProcessControl>,
    logger: &mut Logger,
    target: &str,
) -> Result<bool> {
    let batch = supervisor.install(&Selector::parse(target)).await?;

    for outcome in &batch.outcomes {
        match &outcome.result {
            Ok(()) => logger.log(&outcome.service, "installed"),
            Err(err) => logger.error(&format!("{}: {err}", outcome.service)),
        }
    }

    Ok(batch.is_ok())
}
