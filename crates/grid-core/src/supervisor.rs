//! Public facade: install/start/stop/status/bootstrap for one service or
//! all of them, with per-service outcomes aggregated instead of aborting
//! the batch.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use grid_types::{Grid, Service, ServiceState, StopOutcome};

use crate::{
    error::{Error, Result},
    installer::{resolve_executable, Installer},
    launcher,
    process::ProcessControl,
    registry::{Handle, HandleState, Registry},
    terminator,
};

#[derive(Debug, Clone)]
pub struct SupervisorOptions {
    /// Budget for a service's readiness check.
    pub ready_timeout: Duration,
    /// Default graceful-stop budget; a descriptor's `stop_timeout` wins.
    pub stop_timeout: Duration,
    /// Interval between liveness/readiness polls.
    pub poll_interval: Duration,
}

impl Default for SupervisorOptions {
    fn default() -> Self {
        Self {
            ready_timeout: Duration::from_secs(30),
            stop_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// Which services an operation applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    All,
    One(String),
}

impl Selector {
    #[must_use]
    pub fn parse(target: &str) -> Self {
        if target == "all" {
            Selector::All
        } else {
            Selector::One(target.to_owned())
        }
    }
}

/// Per-service result of a batch operation.
#[derive(Debug)]
pub struct Outcome<T> {
    pub service: String,
    pub result: Result<T>,
}

/// Aggregate of a batch operation; a failed service never prevents its
/// siblings from being attempted.
#[derive(Debug)]
pub struct Batch<T> {
    pub outcomes: Vec<Outcome<T>>,
}

impl<T> Batch<T> {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &Error)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|err| (o.service.as_str(), err)))
    }
}

pub struct Supervisor<P: ProcessControl> {
    grid: Grid,
    registry: Registry,
    control: P,
    installer: Box<dyn Installer>,
    options: SupervisorOptions,
    log_dir: PathBuf,
}

impl<P: ProcessControl> Supervisor<P> {
    pub fn new(
        grid: Grid,
        state_dir: &Path,
        control: P,
        installer: Box<dyn Installer>,
        options: SupervisorOptions,
    ) -> Result<Self> {
        let registry = Registry::open(state_dir)?;
        let log_dir = state_dir.join("log");
        std::fs::create_dir_all(&log_dir).map_err(Error::Registry)?;
        Ok(Self {
            grid,
            registry,
            control,
            installer,
            options,
            log_dir,
        })
    }

    fn select(&self, selector: &Selector) -> Result<Vec<(&String, &Service)>> {
        match selector {
            Selector::All => Ok(self.grid.services.iter().collect()),
            Selector::One(name) => {
                let entry = self
                    .grid
                    .services
                    .get_key_value(name)
                    .ok_or_else(|| Error::UnknownService(name.clone()))?;
                Ok(vec![entry])
            }
        }
    }

    /// Run the delegated installer for each selected service.
    pub async fn install(&self, selector: &Selector) -> Result<Batch<()>> {
        let mut outcomes = Vec::new();
        for (name, service) in self.select(selector)? {
            let result = self.installer.install(name, service).await;
            if let Err(err) = &result {
                tracing::warn!(service = %name, error = %err, "install failed");
            }
            outcomes.push(Outcome {
                service: name.clone(),
                result,
            });
        }
        Ok(Batch { outcomes })
    }

    /// Launch each selected service and wait for it to become ready.
    pub async fn start(&self, selector: &Selector) -> Result<Batch<Handle>> {
        let mut outcomes = Vec::new();
        for (name, service) in self.select(selector)? {
            let log = service
                .log
                .clone()
                .unwrap_or_else(|| self.log_dir.join(format!("{name}.log")));
            let result = launcher::start(
                &self.control,
                &self.registry,
                name,
                service,
                log,
                &self.options,
            )
            .await;
            if let Err(err) = &result {
                tracing::warn!(service = %name, error = %err, "start failed");
            }
            outcomes.push(Outcome {
                service: name.clone(),
                result,
            });
        }
        Ok(Batch { outcomes })
    }

    /// Stop each selected service, escalating to a forceful kill after the
    /// graceful timeout.
    pub async fn stop(&self, selector: &Selector) -> Result<Batch<StopOutcome>> {
        let mut outcomes = Vec::new();
        for (name, service) in self.select(selector)? {
            let timeout = service.stop_timeout.unwrap_or(self.options.stop_timeout);
            let result =
                terminator::stop(&self.control, &self.registry, name, timeout, &self.options)
                    .await;
            outcomes.push(Outcome {
                service: name.clone(),
                result,
            });
        }
        Ok(Batch { outcomes })
    }

    /// Current state of each selected service. Liveness is re-probed on
    /// every call; nothing is mutated, not even stale records.
    pub fn status(&self, selector: &Selector) -> Result<Vec<(String, ServiceState)>> {
        let mut states = Vec::new();
        for (name, service) in self.select(selector)? {
            let state = match self.registry.lookup(name)? {
                Some(handle) if self.control.alive(handle.pid, handle.start_ticks) => {
                    match handle.state {
                        HandleState::Starting => ServiceState::Starting,
                        HandleState::Running => ServiceState::Running,
                        HandleState::Stopping => ServiceState::Stopping,
                    }
                }
                // Record exists but the process is gone: died out of band.
                Some(_) => ServiceState::Stopped,
                None if resolve_executable(service).is_some() => ServiceState::Stopped,
                None => ServiceState::Uninstalled,
            };
            states.push((name.clone(), state));
        }
        Ok(states)
    }

    /// Stop everything, wipe the deploy area, reinstall and restart.
    ///
    /// Aborts on the first failing phase; anything already done stays done,
    /// so the caller should warn about partial state on error.
    pub async fn bootstrap(&self) -> Result<()> {
        let stopped = self.stop(&Selector::All).await?;
        for outcome in stopped.outcomes {
            match outcome.result {
                Ok(StopOutcome::TimedOut) => return Err(Error::StopTimeout(outcome.service)),
                Ok(_) => {}
                Err(err) => return Err(err),
            }
        }

        let deploy = &self.grid.deploy_dir;
        if deploy.exists() {
            std::fs::remove_dir_all(deploy).map_err(|err| {
                Error::Internal(format!("failed to wipe deploy dir {}: {err}", deploy.display()))
            })?;
        }
        std::fs::create_dir_all(deploy).map_err(|err| {
            Error::Internal(format!(
                "failed to recreate deploy dir {}: {err}",
                deploy.display()
            ))
        })?;
        tracing::info!(deploy = %deploy.display(), "deploy area wiped");

        for outcome in self.install(&Selector::All).await?.outcomes {
            outcome.result?;
        }
        for outcome in self.start(&Selector::All).await?.outcomes {
            outcome.result?;
        }
        Ok(())
    }
}
