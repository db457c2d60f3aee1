pub type Result<R, E = Error> = std::result::Result<R, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("service `{0}` is already running")]
    DuplicateService(String),

    #[error("service `{0}` is not installed (executable not found)")]
    NotInstalled(String),

    #[error("unknown service `{0}`")]
    UnknownService(String),

    #[error("service `{name}` did not become ready within {timeout_secs}s (process left running)")]
    StartupTimeout { name: String, timeout_secs: u64 },

    #[error("service `{0}` exited during startup")]
    StartupFailed(String),

    #[error("service `{0}` survived SIGTERM and SIGKILL")]
    StopTimeout(String),

    #[error("install failed for service `{name}`: {message}")]
    Install { name: String, message: String },

    #[error("failed to spawn service `{name}`: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to signal process group {pid}: {source}")]
    Signal {
        pid: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("registry io error: {0}")]
    Registry(#[source] std::io::Error),

    #[error("registry record corrupt: {0}")]
    Record(#[from] serde_json::Error),

    #[error("{0}")]
    Internal(String),
}
