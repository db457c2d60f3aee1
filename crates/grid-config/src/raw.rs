use std::collections::{BTreeMap, HashMap};

use grid_types::ReadyCheck;
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawGrid {
    #[serde(default = "default_version")]
    pub version: u32,
    pub deploy_dir: Option<String>,
    pub services: BTreeMap<String, RawService>,
}

fn default_version() -> u32 {
    1
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawService {
    pub cmd: Vec<String>,
    pub cwd: Option<String>,
    pub env: Option<HashMap<String, String>>,
    pub log: Option<String>,
    pub install: Option<Vec<String>>,
    pub ready: Option<ReadyCheck>,
    pub stop_timeout_secs: Option<u64>,
}
