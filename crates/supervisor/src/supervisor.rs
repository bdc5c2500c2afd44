//! Child lifecycle: spawn, relay signals, wait, map the exit status

use crate::{HandledSignal, SignalListener, SignalSource, force_kill, forward_signal};
use std::io;
use std::os::unix::process::ExitStatusExt;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::sync::{oneshot, watch};
use tracing::{debug, error, info, warn};

/// Time a child gets to exit after `SIGTERM` before it is killed.
pub const GRACEFUL_TIMEOUT: Duration = Duration::from_secs(10);

/// Lifecycle of the supervised child
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildState {
    /// Spawn not attempted yet
    Starting,
    /// Child is running and signals are being relayed
    Running {
        /// Child pid, also its process group id
        pid: u32,
    },
    /// `SIGTERM` was forwarded and the kill timer is armed
    ShuttingDown {
        /// Child pid, also its process group id
        pid: u32,
    },
    /// Child exited and was reaped
    Terminated {
        /// Exit code reported by the supervisor
        exit_code: i32,
    },
    /// The command could not be spawned
    FailedToStart,
}

/// Runs one command at a time as a supervised child.
#[derive(Debug)]
pub struct Supervisor {
    graceful_timeout: Duration,
    state: Arc<watch::Sender<ChildState>>,
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl Supervisor {
    /// Supervisor using the [`GRACEFUL_TIMEOUT`] window.
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(ChildState::Starting);
        Self {
            graceful_timeout: GRACEFUL_TIMEOUT,
            state: Arc::new(state),
        }
    }

    /// Override the graceful shutdown window.
    #[must_use]
    pub const fn with_graceful_timeout(mut self, timeout: Duration) -> Self {
        self.graceful_timeout = timeout;
        self
    }

    /// Observe lifecycle transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ChildState> {
        self.state.subscribe()
    }

    /// Run `command` with exactly `env` as its environment, relaying process
    /// signals until it exits, and return the exit code to propagate.
    ///
    /// Returns 1 when the command cannot be started, when it is killed by a
    /// signal, or when waiting on it fails.
    pub async fn run(&self, command: &str, args: &[String], env: &[String]) -> i32 {
        let Some((child, pid)) = self.start(command, args, env) else {
            return 1;
        };

        let signals = match SignalListener::install() {
            Ok(listener) => Some(listener),
            Err(e) => {
                warn!(error = %e, "Failed to install signal handlers, signals will not be relayed");
                None
            }
        };

        self.supervise(child, pid, signals).await
    }

    /// Like [`run`](Self::run), with signals taken from `signals` instead of
    /// the process.
    pub async fn run_with_signals<S: SignalSource>(
        &self,
        command: &str,
        args: &[String],
        env: &[String],
        signals: S,
    ) -> i32 {
        let Some((child, pid)) = self.start(command, args, env) else {
            return 1;
        };
        self.supervise(child, pid, Some(signals)).await
    }

    fn start(&self, command: &str, args: &[String], env: &[String]) -> Option<(Child, u32)> {
        self.state.send_replace(ChildState::Starting);

        let mut cmd = Command::new(command);
        cmd.args(args)
            .env_clear()
            .envs(env_pairs(env))
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .process_group(0);

        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                error!(command, error = %e, "Failed to start command");
                self.state.send_replace(ChildState::FailedToStart);
                return None;
            }
        };

        let Some(pid) = child.id() else {
            error!(command, "No process information available");
            self.state.send_replace(ChildState::FailedToStart);
            return None;
        };

        info!(command, pid, "Started command");
        self.state.send_replace(ChildState::Running { pid });
        Some((child, pid))
    }

    async fn supervise<S: SignalSource>(
        &self,
        mut child: Child,
        pid: u32,
        signals: Option<S>,
    ) -> i32 {
        let (stop_tx, stop_rx) = oneshot::channel();
        let relay = signals.map(|signals| {
            tokio::spawn(relay_signals(
                signals,
                pid,
                self.graceful_timeout,
                Arc::clone(&self.state),
                stop_rx,
            ))
        });

        let exit_code = exit_code(child.wait().await);
        self.state.send_replace(ChildState::Terminated { exit_code });

        // Shutdown timers already armed keep running; they see Terminated
        let _ = stop_tx.send(());
        if let Some(relay) = relay {
            if let Err(e) = relay.await {
                warn!(error = %e, "Signal relay task failed");
            }
        }

        debug!(pid, exit_code, "Command finished");
        exit_code
    }
}

/// Forward signals from `signals` to the child until `stop` fires.
async fn relay_signals<S: SignalSource>(
    mut signals: S,
    pid: u32,
    graceful_timeout: Duration,
    state: Arc<watch::Sender<ChildState>>,
    mut stop: oneshot::Receiver<()>,
) {
    loop {
        let raw = tokio::select! {
            biased;
            _ = &mut stop => break,
            raw = signals.recv() => match raw {
                Some(raw) => raw,
                None => break,
            },
        };

        let Some(signal) = HandledSignal::from_raw(raw) else {
            info!(signal = raw, "Ignoring signal");
            continue;
        };

        info!(
            %signal,
            pid,
            termination = signal.is_termination(),
            "Forwarding signal"
        );
        forward_signal(pid, signal);

        if signal.requests_shutdown() {
            state.send_if_modified(|current| {
                if matches!(current, ChildState::Running { .. }) {
                    *current = ChildState::ShuttingDown { pid };
                    true
                } else {
                    false
                }
            });
            // One timer per SIGTERM; SIGKILL is idempotent so they are not merged
            spawn_shutdown_timer(pid, graceful_timeout, state.subscribe());
        }
    }
    debug!(pid, "Signal relay stopped");
}

fn spawn_shutdown_timer(pid: u32, timeout: Duration, state: watch::Receiver<ChildState>) {
    tokio::spawn(async move {
        tokio::time::sleep(timeout).await;

        if matches!(*state.borrow(), ChildState::Terminated { .. }) {
            debug!(pid, "Child exited within the graceful window");
            return;
        }

        warn!(pid, timeout = ?timeout, "Graceful timeout expired, force killing");
        force_kill(pid);
    });
}

/// Split `KEY=VALUE` entries on the first `=`, skipping malformed ones.
fn env_pairs(env: &[String]) -> impl Iterator<Item = (&str, &str)> {
    env.iter().filter_map(|entry| {
        let pair = entry.split_once('=');
        if pair.is_none() {
            debug!("Skipping environment entry without '='");
        }
        pair
    })
}

fn exit_code(status: io::Result<ExitStatus>) -> i32 {
    match status {
        Ok(status) => match status.code() {
            Some(code) => code,
            None => {
                info!(signal = ?status.signal(), "Command terminated by signal");
                1
            }
        },
        Err(e) => {
            error!(error = %e, "Failed waiting for command");
            1
        }
    }
}
