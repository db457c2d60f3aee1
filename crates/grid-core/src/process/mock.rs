use std::{collections::HashMap, sync::Mutex};

use crate::{
    error::Result,
    process::{LaunchSpec, ProcessControl, SpawnedProcess},
};

#[derive(Debug)]
struct MockProc {
    alive: bool,
    ignores_terminate: bool,
    immortal: bool,
    start_ticks: u64,
    spec: LaunchSpec,
}

/// In-memory process control for supervisor tests.
#[derive(Debug, Default)]
pub struct MockProcessControl {
    inner: Mutex<MockState>,
}

#[derive(Debug, Default)]
struct MockState {
    next_pid: u32,
    procs: HashMap<u32, MockProc>,
}

impl MockProcessControl {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a spawned process ignore the graceful signal, so only `kill`
    /// takes it down.
    pub fn ignore_terminate(&self, pid: u32) {
        let mut state = self.inner.lock().unwrap();
        if let Some(proc) = state.procs.get_mut(&pid) {
            proc.ignores_terminate = true;
        }
    }

    /// Make a spawned process survive even the forceful kill, for testing
    /// the ambiguous-stop path.
    pub fn make_immortal(&self, pid: u32) {
        let mut state = self.inner.lock().unwrap();
        if let Some(proc) = state.procs.get_mut(&pid) {
            proc.ignores_terminate = true;
            proc.immortal = true;
        }
    }

    /// Simulate the process dying outside the supervisor's control.
    pub fn kill_out_of_band(&self, pid: u32) {
        let mut state = self.inner.lock().unwrap();
        if let Some(proc) = state.procs.get_mut(&pid) {
            proc.alive = false;
        }
    }

    pub fn spawned(&self) -> Vec<LaunchSpec> {
        let state = self.inner.lock().unwrap();
        let mut specs: Vec<_> = state.procs.values().map(|p| p.spec.clone()).collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        specs
    }
}

#[async_trait::async_trait]
impl ProcessControl for MockProcessControl {
    async fn spawn(&self, spec: &LaunchSpec) -> Result<SpawnedProcess> {
        let mut state = self.inner.lock().unwrap();
        state.next_pid += 1;
        let pid = 10_000 + state.next_pid;
        let start_ticks = u64::from(pid) * 7;
        state.procs.insert(
            pid,
            MockProc {
                alive: true,
                ignores_terminate: false,
                immortal: false,
                start_ticks,
                spec: spec.clone(),
            },
        );
        Ok(SpawnedProcess {
            pid,
            start_ticks: Some(start_ticks),
        })
    }

    fn alive(&self, pid: u32, start_ticks: Option<u64>) -> bool {
        let state = self.inner.lock().unwrap();
        match state.procs.get(&pid) {
            Some(proc) => {
                proc.alive && start_ticks.map_or(true, |ticks| ticks == proc.start_ticks)
            }
            None => false,
        }
    }

    async fn terminate(&self, pid: u32) -> Result<()> {
        let mut state = self.inner.lock().unwrap();
        match state.procs.get_mut(&pid) {
            Some(proc) => {
                if !proc.ignores_terminate {
                    proc.alive = false;
                }
                Ok(())
            }
            None => Ok(()),
        }
    }

    async fn kill(&self, pid: u32) -> Result<()> {
        let mut state = self.inner.lock().unwrap();
        if let Some(proc) = state.procs.get_mut(&pid) {
            if !proc.immortal {
                proc.alive = false;
            }
        }
        Ok(())
    }
}
