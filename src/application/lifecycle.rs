//! Lifecycle coordination for the pipeline tasks.
//!
//! The coordinator owns the shutdown trigger. Tasks hold a [`ShutdownSignal`]
//! and stop cooperatively once it fires; the coordinator then waits for each
//! registered task up to a grace period.
//!
//! ```ignore
//! let mut lifecycle = LifecycleCoordinator::new(Duration::from_secs(10));
//! let handle = tokio::spawn(reader.run(tx, lifecycle.signal()));
//! lifecycle.register("stream_reader", handle);
//!
//! lifecycle.await_termination_signal().await?;
//! lifecycle.broadcast();
//! lifecycle.wait_for_all().await?;
//! ```

use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::domain::foundation::{StateMachine, TransitionError};
use crate::domain::lifecycle::LifecycleState;

/// Tasks that did not stop within the grace period.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} task(s) still running after {:?}: {}", .pending.len(), .grace, .pending.join(", "))]
pub struct ShutdownStallError {
    pub pending: Vec<String>,
    pub grace: Duration,
}

/// Errors raised while waiting for a termination signal.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Failed to listen for termination signals: {0}")]
    Signal(#[from] std::io::Error),

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// Receiving side of the one-shot shutdown broadcast.
///
/// Once fired it stays fired. A dropped coordinator counts as fired.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// True once shutdown has been broadcast.
    pub fn is_fired(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves when shutdown is broadcast (immediately if it already was).
    pub async fn fired(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Supervises the pipeline tasks from startup to termination.
pub struct LifecycleCoordinator {
    state: LifecycleState,
    trigger: watch::Sender<bool>,
    tasks: Vec<(String, JoinHandle<()>)>,
    grace: Duration,
}

impl LifecycleCoordinator {
    /// Creates a coordinator in `Running` with the given grace period.
    pub fn new(grace: Duration) -> Self {
        let (trigger, _) = watch::channel(false);
        Self {
            state: LifecycleState::Running,
            trigger,
            tasks: Vec::new(),
            grace,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Hands out a receiver of the shutdown broadcast.
    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.trigger.subscribe(),
        }
    }

    /// Registers a task to be awaited by [`wait_for_all`](Self::wait_for_all).
    pub fn register(&mut self, name: impl Into<String>, handle: JoinHandle<()>) {
        let name = name.into();
        info!(task = %name, "Registered pipeline task");
        self.tasks.push((name, handle));
    }

    /// Number of registered tasks not yet awaited.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    fn transition(&mut self, to: LifecycleState) -> Result<(), TransitionError> {
        self.state = self.state.transition_to(to)?;
        info!(state = %self.state, "Lifecycle transition");
        Ok(())
    }

    /// Records that shutdown was requested: `Running -> ShutdownRequested`.
    pub fn request_shutdown(&mut self) -> Result<(), TransitionError> {
        self.transition(LifecycleState::ShutdownRequested)
    }

    /// Blocks until SIGINT or SIGTERM (Ctrl+C elsewhere), then moves to
    /// `ShutdownRequested`.
    pub async fn await_termination_signal(&mut self) -> Result<(), LifecycleError> {
        wait_for_signal().await?;
        self.request_shutdown()?;
        Ok(())
    }

    /// Fires the shutdown signal and moves to `Draining`. Idempotent.
    pub fn broadcast(&mut self) {
        let already_fired = self.trigger.send_replace(true);
        if !already_fired {
            info!(receivers = self.trigger.receiver_count(), "Broadcasting shutdown");
        }
        if self.state.can_transition_to(&LifecycleState::Draining) {
            self.state = LifecycleState::Draining;
            info!(state = %self.state, "Lifecycle transition");
        }
    }

    /// Waits for every registered task, sharing one grace period.
    ///
    /// Broadcasts first if that has not happened yet. Tasks still running at
    /// the deadline are aborted and reported. A panicked task counts as
    /// finished.
    pub async fn wait_for_all(&mut self) -> Result<(), ShutdownStallError> {
        self.broadcast();

        let deadline = Instant::now() + self.grace;
        let mut pending = Vec::new();

        for (name, mut handle) in self.tasks.drain(..) {
            match tokio::time::timeout_at(deadline, &mut handle).await {
                Ok(Ok(())) => info!(task = %name, "Task stopped"),
                Ok(Err(e)) if e.is_panic() => error!(task = %name, error = %e, "Task panicked"),
                Ok(Err(e)) => warn!(task = %name, error = %e, "Task was cancelled"),
                Err(_) => {
                    error!(task = %name, grace = ?self.grace, "Task did not stop in time, aborting");
                    handle.abort();
                    pending.push(name);
                }
            }
        }

        if self.state.can_transition_to(&LifecycleState::Terminated) {
            self.state = LifecycleState::Terminated;
            info!(state = %self.state, "Lifecycle transition");
        }

        if pending.is_empty() {
            Ok(())
        } else {
            Err(ShutdownStallError {
                pending,
                grace: self.grace,
            })
        }
    }
}

/// Waits for SIGINT or SIGTERM (Ctrl+C on non-unix platforms).
pub async fn wait_for_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;

        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                info!("Received Ctrl+C");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C");
    }

    Ok(())
}
