// tests/process_launcher.rs
//
// Exercises the real `tokio::process` launcher, so these tests need a POSIX
// shell.
#![cfg(unix)]

mod common;
use crate::common::{init_tracing, with_timeout, ConfigBuilder};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use xrun::errors::XrunError;
use xrun::exec::{
    BuildSettings, BuildSupervisor, CommandSpec, ProcessLauncher, SupervisorState, TokioLauncher,
};

fn sh(script: &str, cwd: &Path) -> CommandSpec {
    CommandSpec {
        program: PathBuf::from("sh"),
        args: vec!["-c".to_string(), script.to_string()],
        env: Vec::new(),
        cwd: cwd.to_path_buf(),
    }
}

#[tokio::test]
async fn exit_code_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let mut handle = TokioLauncher.start(&sh("exit 3", dir.path())).unwrap();

    let exit = with_timeout(handle.wait()).await.unwrap();
    assert_eq!(exit.code, Some(3));
    assert!(!exit.success);
}

#[tokio::test]
async fn env_and_cwd_are_applied() {
    let dir = tempfile::tempdir().unwrap();
    let mut spec = sh(
        r#"test "$XRUN_DEBUG" = 1 && test -f marker"#,
        dir.path(),
    );
    spec.env.push(("XRUN_DEBUG".to_string(), "1".to_string()));
    std::fs::write(dir.path().join("marker"), "").unwrap();

    let mut handle = TokioLauncher.start(&spec).unwrap();
    let exit = with_timeout(handle.wait()).await.unwrap();
    assert!(exit.success, "{exit:?}");
}

#[tokio::test]
async fn terminate_stops_a_long_running_process() {
    let dir = tempfile::tempdir().unwrap();
    let mut handle = TokioLauncher.start(&sh("sleep 30", dir.path())).unwrap();
    assert!(handle.id().is_some());

    handle.terminate().unwrap();
    let exit = with_timeout(handle.wait()).await.unwrap();
    assert!(!exit.success);
    assert_eq!(exit.code, None);
}

#[tokio::test]
async fn missing_program_is_a_launch_error() {
    let dir = tempfile::tempdir().unwrap();
    let spec = CommandSpec {
        program: PathBuf::from("xrun-definitely-not-a-real-program"),
        args: Vec::new(),
        env: Vec::new(),
        cwd: dir.path().to_path_buf(),
    };

    match TokioLauncher.start(&spec) {
        Err(XrunError::LaunchFailed(msg)) => {
            assert!(msg.contains("xrun-definitely-not-a-real-program"))
        }
        Err(other) => panic!("Expected LaunchFailed, got: {:?}", other),
        Ok(_) => panic!("Expected LaunchFailed, got a process"),
    }
}

#[tokio::test]
async fn supervisor_builds_runs_and_restarts_a_real_artifact() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();

    // `sh -c <script> sh -o <artifact>`: the script sees the artifact as $2.
    let config = ConfigBuilder::new()
        .build_command(&[
            "sh",
            "-c",
            "printf '#!/bin/sh\\nexec sleep 30\\n' > \"$2\" && chmod +x \"$2\"",
            "sh",
        ])
        .build(&root);
    let settings = BuildSettings::new(&root, &config, Vec::new());
    let artifact = settings.artifact_path.clone();
    let sup = BuildSupervisor::new(settings, Arc::new(TokioLauncher));

    with_timeout(sup.trigger()).await.unwrap();
    assert!(artifact.is_file());
    assert_eq!(sup.state(), SupervisorState::Running);

    with_timeout(sup.trigger()).await.unwrap();
    assert_eq!(sup.state(), SupervisorState::Running);
    assert_eq!(sup.cycles(), 2);

    with_timeout(sup.shutdown()).await;
    assert!(!sup.has_child().await);
}

#[tokio::test]
async fn supervisor_reports_real_build_failure() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    let config = ConfigBuilder::new()
        .build_command(&["sh", "-c", "echo 'broken build' >&2; exit 7"])
        .build(&root);
    let sup = BuildSupervisor::new(
        BuildSettings::new(&root, &config, Vec::new()),
        Arc::new(TokioLauncher),
    );

    match with_timeout(sup.trigger()).await {
        Err(XrunError::BuildFailed { code }) => assert_eq!(code, Some(7)),
        other => panic!("Expected BuildFailed, got: {:?}", other),
    }
    assert_eq!(sup.state(), SupervisorState::Failed);
}
