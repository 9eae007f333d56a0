// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod types;
pub mod watch;

use std::io::{BufRead, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::Config;
use crate::engine::EventLoop;
use crate::errors::Result;
use crate::exec::{artifact_name, BuildSettings, BuildSupervisor, TokioLauncher};
use crate::fs::{FileSystem, RealFileSystem};
use crate::watch::{
    event_queue, ChangeFilter, FileStateCache, NotifyRegistry, WatchSet, DEFAULT_QUEUE_CAPACITY,
};

/// Why the supervisor is shutting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitReason {
    /// `q` typed on stdin.
    Command,
    /// Ctrl-C.
    Interrupt,
}

/// The project root: the current working directory, canonicalized.
pub fn project_root() -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    Ok(cwd.canonicalize().unwrap_or(cwd))
}

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - the file-state cache and the watch set (initial registration is fatal
///   on failure)
/// - the build supervisor and an initial build
/// - the event loop
/// - quit handling (`q` on stdin, Ctrl-C)
pub async fn run(args: CliArgs, root: PathBuf, config: Config) -> Result<()> {
    match &config.source {
        Some(path) => info!(config = %path.display(), "loaded config"),
        None => info!("no config file; using defaults"),
    }

    let config = Arc::new(config);
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    let (event_tx, event_rx) = event_queue(DEFAULT_QUEUE_CAPACITY);
    let registry = NotifyRegistry::new(event_tx)?;

    let cache = Arc::new(FileStateCache::new(root.clone(), Arc::clone(&fs)));
    let mut watches = WatchSet::new(registry, Arc::clone(&fs));
    watches.register_initial(&root, &config, &cache)?;

    let settings = BuildSettings::new(&root, &config, args.build_args);
    let supervisor = Arc::new(BuildSupervisor::new(settings, Arc::new(TokioLauncher)));

    // Get the application up before the first edit.
    if let Err(err) = supervisor.trigger().await {
        warn!(error = %err, "initial build failed; waiting for changes");
    }

    let filter = ChangeFilter::new(
        root.clone(),
        Arc::clone(&config),
        artifact_name(&root),
        Arc::clone(&fs),
    );
    let event_loop = EventLoop::new(event_rx, filter, cache, watches, Arc::clone(&supervisor));

    let mut quit_rx = spawn_quit_listeners();
    let mut loop_handle = tokio::spawn(event_loop.run());

    info!(root = %root.display(), "watching for changes (type `q` + Enter or Ctrl-C to quit)");

    tokio::select! {
        reason = quit_rx.recv() => {
            info!(?reason, "quit requested; stopping application");
            // Triggers still queued behind the build lock become no-ops.
            supervisor.shutdown().await;
            loop_handle.abort();
            Ok(())
        }
        joined = &mut loop_handle => {
            supervisor.shutdown().await;
            joined.context("event loop task failed")?;
            Ok(())
        }
    }
}

/// Listen for the quit command on stdin and for Ctrl-C.
///
/// The supervised application inherits the same stdin, so both sides compete
/// for typed lines: a line read here never reaches the application and vice
/// versa. Stdin is only read when it is a terminal; piped input is left to
/// the application untouched.
fn spawn_quit_listeners() -> mpsc::Receiver<QuitReason> {
    let (tx, rx) = mpsc::channel::<QuitReason>(2);

    {
        let tx = tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(QuitReason::Interrupt).await;
        });
    }

    if !std::io::stdin().is_terminal() {
        debug!("stdin is not a terminal; quit command disabled, use Ctrl-C");
        return rx;
    }

    // A plain thread: a blocking stdin read must not hold up runtime shutdown.
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) if is_quit_command(&line) => {
                    let _ = tx.blocking_send(QuitReason::Command);
                    return;
                }
                Ok(_) => {}
                Err(err) => {
                    debug!(error = %err, "stdin closed for quit commands");
                    return;
                }
            }
        }
    });

    rx
}

/// `q` (any case, surrounding whitespace ignored) quits.
pub fn is_quit_command(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case("q")
}

/// Load the config for `root`; see [`config::load_for_root`].
pub fn load_config(root: &Path) -> Result<Config> {
    config::load_for_root(root)
}
