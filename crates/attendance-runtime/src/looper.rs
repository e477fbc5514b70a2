//! Shared plumbing for the timer-driven loops.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};

use crate::engine::EngineError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoopError {
    #[error("loop stopped before completion")]
    Cancelled,
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("loop task failed: {0}")]
    Task(String),
}

/// Signal the task side watches for cancellation. Resolves once the
/// owning [`LoopHandle`] stops or is dropped.
pub type CancelSignal = oneshot::Receiver<()>;

/// Owner of a running loop task.
///
/// Dropping the handle cancels the task, so a loop never outlives the
/// view that started it.
pub struct LoopHandle<T> {
    cancel: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<T, LoopError>>,
}

impl<T: Send + 'static> LoopHandle<T> {
    /// Spawn `body` with a fresh cancel signal.
    pub fn spawn<F, Fut>(body: F) -> Self
    where
        F: FnOnce(CancelSignal) -> Fut,
        Fut: std::future::Future<Output = Result<T, LoopError>> + Send + 'static,
    {
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let task = tokio::spawn(body(cancel_rx));
        Self {
            cancel: Some(cancel_tx),
            task,
        }
    }

    /// Ask the loop to stop at its next await point.
    pub fn stop(&mut self) {
        self.cancel.take();
    }

    /// Wait for the loop's terminal result.
    pub async fn join(mut self) -> Result<T, LoopError> {
        let result = (&mut self.task).await;
        self.cancel.take();
        result.map_err(|e| LoopError::Task(e.to_string()))?
    }
}

/// Fixed-cadence ticker whose first tick fires one period from now.
pub fn ticker(period: Duration) -> Interval {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}
