use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use xrun::errors::{Result, XrunError};
use xrun::exec::process::BoxFuture;
use xrun::exec::{CommandSpec, ProcessExit, ProcessHandle, ProcessLauncher};

/// Something the fake launcher observed, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchEvent {
    BuildStarted { pid: u32 },
    BuildFinished { pid: u32, code: i32 },
    AppStarted { pid: u32 },
    AppTerminated { pid: u32 },
    AppReaped { pid: u32 },
}

#[derive(Debug, Default)]
struct Shared {
    log: Vec<LaunchEvent>,
    specs: Vec<CommandSpec>,
    build_codes: VecDeque<i32>,
    refuse_apps: bool,
    alive_apps: usize,
    max_alive_apps: usize,
    next_pid: u32,
}

/// A fake `ProcessLauncher` that:
/// - treats specs whose program is `build_program` as builds, which exit
///   after `build_delay` with the next queued code (default 0)
/// - treats everything else as the application, which runs until terminated
/// - records everything it sees
#[derive(Debug, Clone)]
pub struct FakeLauncher {
    build_program: PathBuf,
    build_delay: Duration,
    shared: Arc<Mutex<Shared>>,
}

impl FakeLauncher {
    pub fn new(build_program: impl Into<PathBuf>) -> Self {
        Self {
            build_program: build_program.into(),
            build_delay: Duration::ZERO,
            shared: Arc::new(Mutex::new(Shared {
                next_pid: 100,
                ..Shared::default()
            })),
        }
    }

    pub fn with_build_delay(mut self, delay: Duration) -> Self {
        self.build_delay = delay;
        self
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap()
    }

    /// The next `n` builds exit with `code`.
    pub fn fail_next_builds(&self, code: i32, n: usize) {
        let mut shared = self.lock();
        for _ in 0..n {
            shared.build_codes.push_back(code);
        }
    }

    /// Make application launches fail with `LaunchFailed`.
    pub fn refuse_apps(&self, refuse: bool) {
        self.lock().refuse_apps = refuse;
    }

    pub fn events(&self) -> Vec<LaunchEvent> {
        self.lock().log.clone()
    }

    pub fn specs(&self) -> Vec<CommandSpec> {
        self.lock().specs.clone()
    }

    pub fn builds(&self) -> usize {
        self.lock()
            .log
            .iter()
            .filter(|e| matches!(e, LaunchEvent::BuildStarted { .. }))
            .count()
    }

    pub fn apps_started(&self) -> usize {
        self.lock()
            .log
            .iter()
            .filter(|e| matches!(e, LaunchEvent::AppStarted { .. }))
            .count()
    }

    pub fn alive_apps(&self) -> usize {
        self.lock().alive_apps
    }

    pub fn max_alive_apps(&self) -> usize {
        self.lock().max_alive_apps
    }
}

impl ProcessLauncher for FakeLauncher {
    fn start(&self, spec: &CommandSpec) -> Result<Box<dyn ProcessHandle>> {
        let mut shared = self.lock();
        shared.specs.push(spec.clone());

        let pid = shared.next_pid;
        shared.next_pid += 1;

        let kind = if spec.program == self.build_program {
            let code = shared.build_codes.pop_front().unwrap_or(0);
            shared.log.push(LaunchEvent::BuildStarted { pid });
            Kind::Build {
                code,
                delay: self.build_delay,
            }
        } else {
            if shared.refuse_apps {
                return Err(XrunError::LaunchFailed(format!(
                    "{}: refused by fake launcher",
                    spec.display()
                )));
            }
            shared.alive_apps += 1;
            shared.max_alive_apps = shared.max_alive_apps.max(shared.alive_apps);
            shared.log.push(LaunchEvent::AppStarted { pid });
            Kind::App { terminated: false }
        };

        Ok(Box::new(FakeProcess {
            pid,
            kind,
            shared: Arc::clone(&self.shared),
        }))
    }
}

enum Kind {
    Build { code: i32, delay: Duration },
    App { terminated: bool },
}

struct FakeProcess {
    pid: u32,
    kind: Kind,
    shared: Arc<Mutex<Shared>>,
}

impl ProcessHandle for FakeProcess {
    fn id(&self) -> Option<u32> {
        Some(self.pid)
    }

    fn terminate(&mut self) -> Result<()> {
        if let Kind::App { terminated } = &mut self.kind {
            if !*terminated {
                *terminated = true;
                let mut shared = self.shared.lock().unwrap();
                shared.alive_apps -= 1;
                shared.log.push(LaunchEvent::AppTerminated { pid: self.pid });
            }
        }
        Ok(())
    }

    fn wait(&mut self) -> BoxFuture<'_, Result<ProcessExit>> {
        Box::pin(async move {
            match self.kind {
                Kind::Build { code, delay } => {
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    self.shared
                        .lock()
                        .unwrap()
                        .log
                        .push(LaunchEvent::BuildFinished { pid: self.pid, code });
                    Ok(ProcessExit::from_code(code))
                }
                Kind::App { terminated: true } => {
                    self.shared
                        .lock()
                        .unwrap()
                        .log
                        .push(LaunchEvent::AppReaped { pid: self.pid });
                    Ok(ProcessExit {
                        code: None,
                        success: false,
                    })
                }
                Kind::App { terminated: false } => std::future::pending().await,
            }
        })
    }
}
