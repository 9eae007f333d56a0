// src/exec/process.rs

//! Process spawn / terminate / wait capability.
//!
//! The supervisor talks to a [`ProcessLauncher`] instead of
//! `tokio::process::Command` directly, so its state machine can be tested
//! against a fake that never spawns real processes.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;

use anyhow::Context;
use tokio::process::{Child, Command};

use crate::errors::{Result, XrunError};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Everything needed to start one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Added on top of the inherited environment.
    pub env: Vec<(String, String)>,
    pub cwd: PathBuf,
}

impl CommandSpec {
    /// Program and arguments joined for log output.
    pub fn display(&self) -> String {
        let mut out = self.program.display().to_string();
        for arg in &self.args {
            out.push(' ');
            out.push_str(arg);
        }
        out
    }
}

/// How a process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessExit {
    /// `None` when the process was ended by a signal.
    pub code: Option<i32>,
    pub success: bool,
}

impl ProcessExit {
    pub fn from_code(code: i32) -> Self {
        Self {
            code: Some(code),
            success: code == 0,
        }
    }
}

/// Handle to one started process.
pub trait ProcessHandle: Send {
    fn id(&self) -> Option<u32>;

    /// Ask the process to stop. Does not wait for it.
    fn terminate(&mut self) -> Result<()>;

    /// Block until the process has exited and been reaped.
    fn wait(&mut self) -> BoxFuture<'_, Result<ProcessExit>>;
}

/// Starts processes.
pub trait ProcessLauncher: Send + Sync {
    /// Start `spec` with stdin/stdout/stderr inherited from xrun.
    fn start(&self, spec: &CommandSpec) -> Result<Box<dyn ProcessHandle>>;
}

/// Real launcher backed by `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioLauncher;

impl ProcessLauncher for TokioLauncher {
    fn start(&self, spec: &CommandSpec) -> Result<Box<dyn ProcessHandle>> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&spec.cwd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let child = cmd
            .spawn()
            .map_err(|e| XrunError::LaunchFailed(format!("{}: {e}", spec.display())))?;

        Ok(Box::new(TokioProcess { child }))
    }
}

struct TokioProcess {
    child: Child,
}

impl ProcessHandle for TokioProcess {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    fn terminate(&mut self) -> Result<()> {
        self.child
            .start_kill()
            .context("sending kill signal to child process")?;
        Ok(())
    }

    fn wait(&mut self) -> BoxFuture<'_, Result<ProcessExit>> {
        Box::pin(async move {
            let status = self
                .child
                .wait()
                .await
                .context("waiting for child process")?;
            Ok(ProcessExit {
                code: status.code(),
                success: status.success(),
            })
        })
    }
}
