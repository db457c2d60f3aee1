mod error;
mod installer;
mod launcher;
mod process;
mod ready;
mod registry;
mod supervisor;
mod terminator;

pub use error::{Error, Result};
pub use installer::{resolve_executable, CommandInstaller, Installer};
pub use process::{
    mock::MockProcessControl, unix::UnixProcessControl, LaunchSpec, ProcessControl,
    SpawnedProcess,
};
pub use registry::{Handle, HandleState, Registry};
pub use supervisor::{Batch, Outcome, Selector, Supervisor, SupervisorOptions};
