// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`process`] provides the `ProcessLauncher` / `ProcessHandle` capability
//!   and the `tokio::process` implementation used in production.
//! - [`supervisor`] owns the build lock and the supervised child, and runs
//!   the build/restart cycle.

pub mod process;
pub mod supervisor;

pub use process::{CommandSpec, ProcessExit, ProcessHandle, ProcessLauncher, TokioLauncher};
pub use supervisor::{artifact_name, BuildSettings, BuildSupervisor, SupervisorState};
