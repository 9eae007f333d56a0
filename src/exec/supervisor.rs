// src/exec/supervisor.rs

//! Build / restart state machine.
//!
//! ```text
//! Idle -> Building -> Running -> Building -> ...
//!                  \-> Failed  -> Building -> ...
//! ```
//!
//! [`BuildSupervisor::trigger`] holds the build lock for the whole cycle:
//! stop the previous child, run the build, start the new child. Two triggers
//! therefore never overlap and at most one supervised process is alive.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::errors::{Result, XrunError};
use crate::exec::process::{CommandSpec, ProcessHandle, ProcessLauncher};

pub const ENV_DEBUG: &str = "XRUN_DEBUG";
pub const ENV_WEB_PORT: &str = "XRUN_WEB_PORT";
pub const ENV_APP_PATH: &str = "XRUN_APP_PATH";
pub const ENV_SRC_PATH: &str = "XRUN_SRC_PATH";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Idle,
    Building,
    Running,
    Failed,
}

/// Name of the build output for a project rooted at `root`: the root's base
/// name, with `.exe` on Windows.
pub fn artifact_name(root: &Path) -> String {
    let base = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "app".to_string());
    if cfg!(windows) {
        format!("{base}.exe")
    } else {
        base
    }
}

/// Static inputs of every build/run cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSettings {
    pub root: PathBuf,
    pub output_name: String,
    pub artifact_path: PathBuf,
    pub build_command: Vec<String>,
    /// CLI arguments forwarded verbatim to the build command.
    pub forwarded_args: Vec<String>,
    pub web_port: u16,
}

impl BuildSettings {
    pub fn new(root: &Path, config: &Config, forwarded_args: Vec<String>) -> Self {
        let output_name = artifact_name(root);
        Self {
            root: root.to_path_buf(),
            artifact_path: root.join(&output_name),
            output_name,
            build_command: config.build_command.clone(),
            forwarded_args,
            web_port: config.web_port,
        }
    }

    /// `<build command> -o <output> <forwarded args...>`, run in the root.
    pub fn build_spec(&self) -> CommandSpec {
        let (program, leading) = match self.build_command.split_first() {
            Some((program, rest)) => (program.clone(), rest.to_vec()),
            None => (String::new(), Vec::new()),
        };

        let mut args = leading;
        args.push("-o".to_string());
        args.push(self.output_name.clone());
        args.extend(self.forwarded_args.iter().cloned());

        CommandSpec {
            program: PathBuf::from(program),
            args,
            env: Vec::new(),
            cwd: self.root.clone(),
        }
    }

    /// The freshly built artifact, with the `XRUN_*` variables exported.
    pub fn run_spec(&self) -> CommandSpec {
        CommandSpec {
            program: self.artifact_path.clone(),
            args: Vec::new(),
            env: vec![
                (ENV_DEBUG.to_string(), "1".to_string()),
                (ENV_WEB_PORT.to_string(), self.web_port.to_string()),
                (
                    ENV_APP_PATH.to_string(),
                    self.artifact_path.display().to_string(),
                ),
                (ENV_SRC_PATH.to_string(), self.root.display().to_string()),
            ],
            cwd: self.root.clone(),
        }
    }
}

/// Owns the build lock and the supervised child process.
///
/// Constructed once per process and shared via `Arc` between the event loop
/// and the quit path.
pub struct BuildSupervisor {
    settings: BuildSettings,
    launcher: Arc<dyn ProcessLauncher>,
    /// The build lock. The child handle is only touched while holding it.
    child: AsyncMutex<Option<Box<dyn ProcessHandle>>>,
    state: Mutex<SupervisorState>,
    cycles: AtomicU64,
    /// Set by `shutdown` under the build lock; no cycle starts afterwards.
    shutting_down: AtomicBool,
}

impl std::fmt::Debug for BuildSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildSupervisor")
            .field("settings", &self.settings)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl BuildSupervisor {
    pub fn new(settings: BuildSettings, launcher: Arc<dyn ProcessLauncher>) -> Self {
        Self {
            settings,
            launcher,
            child: AsyncMutex::new(None),
            state: Mutex::new(SupervisorState::Idle),
            cycles: AtomicU64::new(0),
            shutting_down: AtomicBool::new(false),
        }
    }

    pub fn settings(&self) -> &BuildSettings {
        &self.settings
    }

    pub fn state(&self) -> SupervisorState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: SupervisorState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Number of `trigger` calls that got past the build lock.
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    /// True once `shutdown` has run.
    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Acquire)
    }

    /// True if a supervised process handle is held. Waits for any in-flight
    /// cycle to finish.
    pub async fn has_child(&self) -> bool {
        self.child.lock().await.is_some()
    }

    /// Run one build/restart cycle.
    ///
    /// The previous child is stopped before the build starts, whatever the
    /// build's outcome. On failure the supervisor stays without a child until
    /// the next successful trigger.
    ///
    /// After [`shutdown`](Self::shutdown) this is a no-op, including for
    /// triggers that were already waiting on the build lock.
    pub async fn trigger(&self) -> Result<()> {
        let mut slot = self.child.lock().await;
        if self.is_shutting_down() {
            debug!("shutdown in progress; skipping build cycle");
            return Ok(());
        }
        let cycle = self.cycles.fetch_add(1, Ordering::Relaxed) + 1;

        stop_child(&mut slot).await;
        self.set_state(SupervisorState::Building);

        let build = self.settings.build_spec();
        info!(cycle, cmd = %build.display(), "building");

        let outcome = match self.launcher.start(&build) {
            Ok(mut handle) => handle.wait().await,
            Err(err) => Err(err),
        };

        match outcome {
            Ok(exit) if exit.success => {}
            Ok(exit) => {
                self.set_state(SupervisorState::Failed);
                error!(cycle, code = ?exit.code, "build failed");
                return Err(XrunError::BuildFailed { code: exit.code });
            }
            Err(err) => {
                self.set_state(SupervisorState::Failed);
                error!(cycle, error = %err, "could not run build command");
                return Err(err);
            }
        }

        let run = self.settings.run_spec();
        match self.launcher.start(&run) {
            Ok(handle) => {
                info!(cycle, pid = ?handle.id(), app = %run.program.display(), "application started");
                *slot = Some(handle);
                self.set_state(SupervisorState::Running);
                Ok(())
            }
            Err(err) => {
                self.set_state(SupervisorState::Failed);
                error!(cycle, error = %err, "could not start application");
                Err(err)
            }
        }
    }

    /// Quit path: take the build lock, stop and reap the child.
    ///
    /// An in-flight `trigger` completes first. Later triggers do nothing.
    pub async fn shutdown(&self) {
        let mut slot = self.child.lock().await;
        self.shutting_down.store(true, Ordering::Release);
        stop_child(&mut slot).await;
        self.set_state(SupervisorState::Idle);
    }
}

/// Terminate and reap the child in `slot`, if any. Best effort: failures are
/// logged and the slot is always left empty.
async fn stop_child(slot: &mut Option<Box<dyn ProcessHandle>>) {
    let Some(mut handle) = slot.take() else {
        return;
    };
    let pid = handle.id();

    // Fails harmlessly if the process already exited on its own.
    if let Err(err) = handle.terminate() {
        debug!(?pid, error = %err, "terminate failed");
    }

    match handle.wait().await {
        Ok(exit) => debug!(?pid, code = ?exit.code, "previous application stopped"),
        Err(err) => warn!(?pid, error = %err, "failed to reap previous application"),
    }
}
