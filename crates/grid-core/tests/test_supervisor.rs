#![cfg(unix)]

use std::{collections::BTreeMap, path::Path, time::Duration};

use grid_core::{
    CommandInstaller, Registry, Selector, Supervisor, SupervisorOptions, UnixProcessControl,
};
use grid_types::{Grid, ReadyCheck, Service, ServiceState, StopOutcome};

fn service(cmd: Vec<&str>) -> Service {
    Service {
        cmd: cmd.into_iter().map(str::to_owned).collect(),
        cwd: None,
        env: None,
        log: None,
        install: None,
        ready: None,
        stop_timeout: None,
    }
}

fn sleeper() -> Service {
    service(vec!["/bin/sh", "-c", "sleep 30"])
}

fn grid(services: Vec<(&str, Service)>, deploy_dir: &Path) -> Grid {
    Grid {
        version: 1,
        deploy_dir: deploy_dir.to_path_buf(),
        services: services
            .into_iter()
            .map(|(n, s)| (n.to_owned(), s))
            .collect::<BTreeMap<_, _>>(),
    }
}

fn supervisor(grid: Grid, state_dir: &Path) -> Supervisor<UnixProcessControl> {
    let options = SupervisorOptions {
        ready_timeout: Duration::from_secs(3),
        stop_timeout: Duration::from_secs(2),
        poll_interval: Duration::from_millis(50),
    };
    Supervisor::new(
        grid,
        state_dir,
        UnixProcessControl::new(),
        Box::new(CommandInstaller::new(state_dir.join("log"))),
        options,
    )
    .unwrap()
}

#[tokio::test]
async fn start_and_stop_real_process() {
    let dir = tempfile::tempdir().unwrap();
    let sup = supervisor(
        grid(vec![("sleeper", sleeper())], &dir.path().join("deploy")),
        dir.path(),
    );

    let started = sup.start(&Selector::One("sleeper".into())).await.unwrap();
    assert!(started.is_ok());

    // The record is durable: a separate registry instance sees it.
    let registry = Registry::open(dir.path()).unwrap();
    let handle = registry.lookup("sleeper").unwrap().unwrap();
    assert!(handle.pid > 0);

    let stopped = sup.stop(&Selector::One("sleeper".into())).await.unwrap();
    assert_eq!(
        stopped.outcomes[0].result.as_ref().unwrap(),
        &StopOutcome::Stopped
    );
    assert!(registry.lookup("sleeper").unwrap().is_none());
}

#[tokio::test]
async fn second_invocation_finds_and_stops_the_process() {
    let dir = tempfile::tempdir().unwrap();
    let deploy = dir.path().join("deploy");

    {
        let sup = supervisor(grid(vec![("svc", sleeper())], &deploy), dir.path());
        assert!(sup.start(&Selector::One("svc".into())).await.unwrap().is_ok());
    }

    // A fresh supervisor over the same state dir stands in for a second
    // invocation of the tool.
    let sup = supervisor(grid(vec![("svc", sleeper())], &deploy), dir.path());
    assert_eq!(
        sup.status(&Selector::One("svc".into())).unwrap()[0].1,
        ServiceState::Running
    );

    let stopped = sup.stop(&Selector::One("svc".into())).await.unwrap();
    assert_eq!(
        stopped.outcomes[0].result.as_ref().unwrap(),
        &StopOutcome::Stopped
    );
}

#[tokio::test]
async fn sigterm_ignorer_needs_escalation() {
    let dir = tempfile::tempdir().unwrap();
    let mut stubborn = service(vec![
        "/bin/sh",
        "-c",
        "trap '' TERM; while true; do sleep 1; done",
    ]);
    stubborn.stop_timeout = Some(Duration::from_millis(500));

    let sup = supervisor(
        grid(vec![("stubborn", stubborn)], &dir.path().join("deploy")),
        dir.path(),
    );

    assert!(sup
        .start(&Selector::One("stubborn".into()))
        .await
        .unwrap()
        .is_ok());

    let stopped = sup.stop(&Selector::One("stubborn".into())).await.unwrap();
    assert_eq!(
        stopped.outcomes[0].result.as_ref().unwrap(),
        &StopOutcome::Stopped
    );

    let registry = Registry::open(dir.path()).unwrap();
    assert!(registry.lookup("stubborn").unwrap().is_none());
}

#[tokio::test]
async fn ready_check_gates_running_state() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("svc.ready");

    let mut svc = service(vec![
        "/bin/sh",
        "-c",
        &format!("sleep 0.3 && touch {} && sleep 30", marker.display()),
    ]);
    svc.ready = Some(ReadyCheck::Path {
        path: marker.clone(),
    });

    let sup = supervisor(
        grid(vec![("svc", svc)], &dir.path().join("deploy")),
        dir.path(),
    );

    let started = sup.start(&Selector::One("svc".into())).await.unwrap();
    assert!(started.is_ok());
    assert!(marker.exists());
    assert_eq!(
        sup.status(&Selector::One("svc".into())).unwrap()[0].1,
        ServiceState::Running
    );

    sup.stop(&Selector::One("svc".into())).await.unwrap();
}

#[tokio::test]
async fn ready_timeout_reports_error_but_keeps_process() {
    let dir = tempfile::tempdir().unwrap();
    let mut svc = sleeper();
    svc.ready = Some(ReadyCheck::Path {
        path: dir.path().join("never"),
    });

    let sup = supervisor(
        grid(vec![("svc", svc)], &dir.path().join("deploy")),
        dir.path(),
    );

    let batch = sup.start(&Selector::One("svc".into())).await.unwrap();
    assert!(matches!(
        batch.outcomes[0].result,
        Err(grid_core::Error::StartupTimeout { .. })
    ));

    // The process was left running in `Starting`, and stop still works.
    assert_eq!(
        sup.status(&Selector::One("svc".into())).unwrap()[0].1,
        ServiceState::Starting
    );
    let stopped = sup.stop(&Selector::One("svc".into())).await.unwrap();
    assert_eq!(
        stopped.outcomes[0].result.as_ref().unwrap(),
        &StopOutcome::Stopped
    );
}

#[tokio::test]
async fn out_of_band_death_observed() {
    let dir = tempfile::tempdir().unwrap();
    let sup = supervisor(
        grid(vec![("svc", sleeper())], &dir.path().join("deploy")),
        dir.path(),
    );

    assert!(sup.start(&Selector::One("svc".into())).await.unwrap().is_ok());

    let registry = Registry::open(dir.path()).unwrap();
    let handle = registry.lookup("svc").unwrap().unwrap();
    #[allow(unsafe_code)]
    unsafe {
        libc::killpg(handle.pid as libc::pid_t, libc::SIGKILL);
    }
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(
        sup.status(&Selector::One("svc".into())).unwrap()[0].1,
        ServiceState::Stopped
    );

    // Stop reconciles the stale record as a normal idempotent outcome.
    let stopped = sup.stop(&Selector::One("svc".into())).await.unwrap();
    assert_eq!(
        stopped.outcomes[0].result.as_ref().unwrap(),
        &StopOutcome::NotRunning
    );
    assert!(registry.lookup("svc").unwrap().is_none());
}

#[tokio::test]
async fn start_all_with_one_missing_executable() {
    let dir = tempfile::tempdir().unwrap();
    let sup = supervisor(
        grid(
            vec![
                ("a", sleeper()),
                ("broken", service(vec!["/nonexistent/bin/x"])),
                ("c", sleeper()),
            ],
            &dir.path().join("deploy"),
        ),
        dir.path(),
    );

    let batch = sup.start(&Selector::All).await.unwrap();
    let failed: Vec<&str> = batch.failures().map(|(name, _)| name).collect();
    assert_eq!(failed, vec!["broken"]);

    let states: Vec<(String, ServiceState)> = sup.status(&Selector::All).unwrap();
    assert_eq!(states[0].1, ServiceState::Running);
    assert_eq!(states[1].1, ServiceState::Uninstalled);
    assert_eq!(states[2].1, ServiceState::Running);

    sup.stop(&Selector::All).await.unwrap();
}

#[tokio::test]
async fn service_log_captures_output() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("chatty.log");
    let mut chatty = service(vec!["/bin/sh", "-c", "echo hello from service; sleep 30"]);
    chatty.log = Some(log_path.clone());

    let sup = supervisor(
        grid(vec![("chatty", chatty)], &dir.path().join("deploy")),
        dir.path(),
    );

    assert!(sup
        .start(&Selector::One("chatty".into()))
        .await
        .unwrap()
        .is_ok());
    tokio::time::sleep(Duration::from_millis(300)).await;

    let log = std::fs::read_to_string(&log_path).unwrap();
    assert!(log.contains("hello from service"));

    sup.stop(&Selector::One("chatty".into())).await.unwrap();
}
