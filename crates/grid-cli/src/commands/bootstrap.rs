use anyhow::Result;
use grid_core::{Supervisor, UnixProcessControl};

use crate::logger::Logger;

pub async fn bootstrap(
    supervisor: &Supervisor<UnixProcessControl>,
    logger: &mut Logger,
) -> Result<bool> {
    match supervisor.bootstrap().await {
        Ok(()) => {
            logger.system("bootstrap complete");
            Ok(true)
        }
        Err(err) => {
            logger.error(&format!("bootstrap failed: {err}"));
            logger.system("warning: the grid may be in a partial state");
            Ok(false)
        }
    }
}
