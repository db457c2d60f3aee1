use clap::{Parser, Subcommand};

/// CLI for grid
#[derive(Parser, Debug)]
#[command(name = "grid", version, about = "Local development grid supervisor")]
pub struct Cli {
    /// Path to the grid configuration file (TOML)
    #[arg(short, long, global = true)]
    pub file: Option<String>,

    /// Directory for registry records and service logs
    #[arg(long, global = true)]
    pub state_dir: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the delegated installer for a service, or "all"
    Install {
        /// Service name, or "all"
        service: String,
    },

    /// Start a service (or "all") as a detached background process
    Start {
        /// Service name, or "all"
        service: String,
    },

    /// Stop a running service (or "all"), escalating after the timeout
    Stop {
        /// Service name, or "all"
        service: String,

        /// Graceful-stop budget in seconds before the forceful kill
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Show each service's current state
    Status {
        /// Service name, or "all" (the default)
        service: Option<String>,
    },

    /// Stop everything, wipe the deploy area, reinstall and restart
    Bootstrap,
}
