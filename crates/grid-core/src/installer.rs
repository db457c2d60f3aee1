//! Pluggable install capability. Fetch/verify/extract/configure logic lives
//! behind this seam; the supervisor only sequences it.

use std::path::{Path, PathBuf};

use grid_types::Service;

use crate::error::{Error, Result};

#[async_trait::async_trait]
pub trait Installer: Send + Sync {
    async fn install(&self, name: &str, service: &Service) -> Result<()>;
}

/// Runs the descriptor's `install` command to completion, appending its
/// output to the service log. Services without an install command install
/// as a no-op.
#[derive(Debug)]
pub struct CommandInstaller {
    log_dir: PathBuf,
}

impl CommandInstaller {
    #[must_use]
    pub fn new(log_dir: PathBuf) -> Self {
        Self { log_dir }
    }
}

#[async_trait::async_trait]
impl Installer for CommandInstaller {
    async fn install(&self, name: &str, service: &Service) -> Result<()> {
        let Some(install) = &service.install else {
            return Ok(());
        };

        let log_path = service
            .log
            .clone()
            .unwrap_or_else(|| self.log_dir.join(format!("{name}.log")));
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| Error::Install {
                name: name.to_owned(),
                message: err.to_string(),
            })?;
        }
        let log = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .map_err(|err| Error::Install {
                name: name.to_owned(),
                message: err.to_string(),
            })?;
        let log_err = log.try_clone().map_err(|err| Error::Install {
            name: name.to_owned(),
            message: err.to_string(),
        })?;

        let mut cmd = tokio::process::Command::new(&install[0]);
        if install.len() > 1 {
            cmd.args(&install[1..]);
        }
        if let Some(dir) = &service.cwd {
            cmd.current_dir(dir);
        }
        if let Some(env) = &service.env {
            for (k, v) in env {
                cmd.env(k, v);
            }
        }
        cmd.stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::from(log))
            .stderr(std::process::Stdio::from(log_err));

        tracing::info!(service = name, command = %install[0], "running installer");
        let status = cmd.status().await.map_err(|err| Error::Install {
            name: name.to_owned(),
            message: err.to_string(),
        })?;

        if !status.success() {
            return Err(Error::Install {
                name: name.to_owned(),
                message: format!("installer exited with {status}"),
            });
        }
        Ok(())
    }
}

/// Resolve the service's executable, which is what "installed" means here:
/// an absolute path that exists, a cwd-relative path that exists, or a bare
/// name found on `PATH`.
pub fn resolve_executable(service: &Service) -> Option<PathBuf> {
    let program = service.cmd.first()?;
    let candidate = Path::new(program);

    if candidate.is_absolute() {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }
    if candidate.components().count() > 1 {
        let base = service.cwd.clone().unwrap_or_else(|| PathBuf::from("."));
        let resolved = base.join(candidate);
        return resolved.is_file().then_some(resolved);
    }

    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(program))
        .find(|full| full.is_file())
}
