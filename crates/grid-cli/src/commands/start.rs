use anyhow::Result;
use grid_core::{Selector, Supervisor, UnixProcessControl};

use crate::logger::Logger;

pub async fn start(
    supervisor: &Supervisor<UnixProcessControl>,
    logger: &mut Logger,
    target: &str,
) -> Result<bool> {
    let batch = supervisor.start(&Selector::parse(target)).await?;

    for outcome in &batch.outcomes {
        match &outcome.result {
            Ok(handle) => logger.log(
                &outcome.service,
                &format!("running (pid {})", handle.pid),
            ),
            Err(err) => logger.error(&format!("{}: {err}", outcome.service)),
        }
    }

    Ok(batch.is_ok())
}
