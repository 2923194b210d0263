//! # Scan Tasks
//!
//! A `Runnable` has exactly two lifecycles: it is run once, or it is
//! cancelled once without ever running. Both methods consume the boxed task,
//! so a second call does not compile.
//!
//! `TaskRunner` schedules runnables on a tokio runtime's blocking pool,
//! bounded by a semaphore. Work the runner can no longer start is cancelled,
//! never silently dropped; work that has started always finishes through
//! its own success or failure path.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use super::config::RangefeedConfig;
use super::errors::{RangefeedError, RangefeedResult};
use crate::observability::{Event, Logger, LOG_TARGET};

/// A unit of work with one execution attempt
pub trait Runnable: Send {
    /// Executes the task to completion.
    ///
    /// May block on I/O and on subscriber backpressure, so it must be called
    /// from a thread that is allowed to block: a plain thread or tokio's
    /// blocking pool, never an async worker. `TaskRunner` always runs tasks
    /// on the blocking pool.
    fn run(self: Box<Self>, ctx: &TaskContext);

    /// Discards a task that will never run, releasing what it owns.
    fn cancel(self: Box<Self>);
}

/// Execution context handed to `Runnable::run`
#[derive(Debug, Clone)]
pub struct TaskContext {
    span: tracing::Span,
}

impl TaskContext {
    /// A context whose log output is grouped under `task`
    pub fn new(task: &'static str) -> Self {
        Self {
            span: tracing::info_span!(target: LOG_TARGET, "rangefeed_task", task),
        }
    }

    /// A context that records nothing
    pub fn none() -> Self {
        Self {
            span: tracing::Span::none(),
        }
    }

    /// The tracing span the task runs inside
    pub fn span(&self) -> &tracing::Span {
        &self.span
    }
}

/// Schedules scans on a tokio runtime
#[derive(Debug)]
pub struct TaskRunner {
    handle: Handle,
    limiter: Arc<Semaphore>,
    stopping: AtomicBool,
    in_flight: Mutex<Vec<JoinHandle<()>>>,
}

impl TaskRunner {
    /// Creates a runner on `handle`
    pub fn new(handle: Handle, config: &RangefeedConfig) -> RangefeedResult<Self> {
        config.validate()?;
        Ok(Self {
            handle,
            limiter: Arc::new(Semaphore::new(config.max_concurrent_scans)),
            stopping: AtomicBool::new(false),
            in_flight: Mutex::new(Vec::new()),
        })
    }

    /// Creates a runner on the runtime the caller is running in
    pub fn current(config: &RangefeedConfig) -> RangefeedResult<Self> {
        let handle = Handle::try_current()
            .map_err(|e| RangefeedError::ConfigError(format!("no tokio runtime: {}", e)))?;
        Self::new(handle, config)
    }

    /// Schedules `task`. If the runner is stopping, the task is cancelled
    /// and `RunnerStopped` is returned.
    pub fn run_async(&self, name: &'static str, task: Box<dyn Runnable>) -> RangefeedResult<()> {
        let mut in_flight = self.lock_in_flight();
        if self.stopping.load(Ordering::SeqCst) {
            drop(in_flight);
            Logger::warn(Event::RunnerStopped, &[("task", name)]);
            task.cancel();
            return Err(RangefeedError::RunnerStopped);
        }

        let limiter = Arc::clone(&self.limiter);
        let join = self.handle.spawn(async move {
            let permit = match limiter.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    Logger::warn(Event::RunnerStopped, &[("task", name)]);
                    task.cancel();
                    return;
                }
            };

            let result = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                let ctx = TaskContext::new(name);
                task.run(&ctx);
            })
            .await;

            if let Err(e) = result {
                tracing::error!(target: LOG_TARGET, task = name, "scan task aborted: {}", e);
            }
        });

        in_flight.retain(|h| !h.is_finished());
        in_flight.push(join);
        Ok(())
    }

    /// Number of tasks scheduled and not yet finished
    pub fn in_flight(&self) -> usize {
        self.lock_in_flight()
            .iter()
            .filter(|h| !h.is_finished())
            .count()
    }

    /// Returns true once `stop` has been called
    pub fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::SeqCst)
    }

    /// Refuses new work, cancels queued tasks and waits for running ones
    pub async fn stop(&self) {
        let handles = {
            let mut in_flight = self.lock_in_flight();
            self.stopping.store(true, Ordering::SeqCst);
            self.limiter.close();
            std::mem::take(&mut *in_flight)
        };

        let pending = handles.len().to_string();
        for handle in handles {
            let _ = handle.await;
        }
        Logger::info(Event::RunnerStopped, &[("awaited", pending.as_str())]);
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        match self.in_flight.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
