use anyhow::Result;
use grid_core::{Selector, Supervisor, UnixProcessControl};

use crate::logger::Logger;

pub fn status(
    supervisor: &Supervisor<UnixProcessControl>,
    logger: &mut Logger,
    target: &str,
) -> Result<bool> {
    for (name, state) in supervisor.status(&Selector::parse(target))? {
        logger.log(&name, state.as_str());
    }

    // Reporting state is never a failure.
    Ok(true)
}
