use std::{collections::BTreeMap, path::PathBuf, time::Duration};

use grid_types::{Grid, ReadyCheck, Service};

use crate::{
    raw::{RawGrid, RawService},
    ConfigError,
};

const DEFAULT_DEPLOY_DIR: &str = "deploy";

/// Service names become registry file names and log file names, so the
/// accepted charset is restricted accordingly.
fn valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl RawGrid {
    pub fn to_grid(&self) -> Result<Grid, ConfigError> {
        let services = self
            .services
            .iter()
            .map(|(name, raw_service)| {
                if !valid_name(name) {
                    return Err(ConfigError::Validation(format!(
                        "service `{name}`: names may only contain [A-Za-z0-9_-]"
                    )));
                }

                Ok((name.clone(), raw_service.to_service(name)?))
            })
            .collect::<Result<BTreeMap<String, Service>, ConfigError>>()?;

        Ok(Grid {
            version: self.version,
            deploy_dir: PathBuf::from(
                self.deploy_dir.as_deref().unwrap_or(DEFAULT_DEPLOY_DIR),
            ),
            services,
        })
    }
}

impl RawService {
    fn to_service(&self, name: &str) -> Result<Service, ConfigError> {
        if self.cmd.is_empty() {
            return Err(ConfigError::Validation(format!(
                "service `{name}`: cmd is empty"
            )));
        }
        if self.cmd.iter().any(|c| c.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "service `{name}`: cmd contains empty element"
            )));
        }
        if let Some(install) = &self.install {
            if install.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "service `{name}`: install is empty"
                )));
            }
        }
        if let Some(ReadyCheck::Port { port: 0 }) = self.ready {
            return Err(ConfigError::Validation(format!(
                "service `{name}`: ready port must be nonzero"
            )));
        }

        Ok(Service {
            cmd: self.cmd.clone(),
            cwd: self.cwd.clone().map(PathBuf::from),
            env: self.env.clone(),
            log: self.log.clone().map(PathBuf::from),
            install: self.install.clone(),
            ready: self.ready.clone(),
            stop_timeout: self.stop_timeout_secs.map(Duration::from_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn raw_service(cmd: Vec<&str>) -> RawService {
        RawService {
            cmd: cmd.into_iter().map(str::to_owned).collect(),
            cwd: None,
            env: None,
            log: None,
            install: None,
            ready: None,
            stop_timeout_secs: None,
        }
    }

    #[test]
    fn test_raw_to_grid_success() {
        let raw = RawGrid {
            version: 1,
            deploy_dir: Some("work/deploy".into()),
            services: {
                let mut services = BTreeMap::new();
                services.insert(
                    "broker".into(),
                    RawService {
                        cmd: vec!["bin/broker".into(), "--port".into(), "9092".into()],
                        cwd: Some("deploy/broker".into()),
                        env: Some(HashMap::from_iter(vec![(
                            "BROKER_HEAP".to_owned(),
                            "512m".to_owned(),
                        )])),
                        log: Some("logs/broker.log".into()),
                        install: Some(vec!["scripts/install-broker.sh".into()]),
                        ready: Some(ReadyCheck::Port { port: 9092 }),
                        stop_timeout_secs: Some(20),
                    },
                );
                services.insert("coord".into(), raw_service(vec!["bin/coord"]));
                services
            },
        };

        let grid = raw.to_grid().unwrap();
        assert_eq!(grid.version, 1);
        assert_eq!(grid.deploy_dir, PathBuf::from("work/deploy"));

        let broker = &grid.services["broker"];
        assert_eq!(broker.cmd[0], "bin/broker");
        assert_eq!(broker.cwd, Some(PathBuf::from("deploy/broker")));
        assert_eq!(broker.ready, Some(ReadyCheck::Port { port: 9092 }));
        assert_eq!(broker.stop_timeout, Some(Duration::from_secs(20)));

        let coord = &grid.services["coord"];
        assert_eq!(coord.cwd, None);
        assert_eq!(coord.stop_timeout, None);
    }

    #[test]
    fn test_default_deploy_dir() {
        let raw = RawGrid {
            version: 1,
            deploy_dir: None,
            services: BTreeMap::new(),
        };
        assert_eq!(raw.to_grid().unwrap().deploy_dir, PathBuf::from("deploy"));
    }

    #[test]
    fn test_empty_cmd_rejected() {
        let raw = RawGrid {
            version: 1,
            deploy_dir: None,
            services: BTreeMap::from([("a".to_owned(), raw_service(vec![]))]),
        };
        assert!(raw.to_grid().is_err());

        let raw = RawGrid {
            version: 1,
            deploy_dir: None,
            services: BTreeMap::from([("a".to_owned(), raw_service(vec!["echo", ""]))]),
        };
        assert!(raw.to_grid().is_err());
    }

    #[test]
    fn test_bad_name_rejected() {
        let raw = RawGrid {
            version: 1,
            deploy_dir: None,
            services: BTreeMap::from([("../escape".to_owned(), raw_service(vec!["echo"]))]),
        };
        assert!(raw.to_grid().is_err());
    }
}
