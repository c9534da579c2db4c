//! Cancellation and deadlines for resolution calls.

use std::future::{pending, Future};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::repository::resolver::ResolutionError;

/// Caller-owned switch that aborts every resolution call observing it.
#[derive(Debug)]
pub struct CancellationHandle {
    sender: watch::Sender<bool>,
}

impl CancellationHandle {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self { sender }
    }

    /// Signal cancellation. Idempotent.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }
}

impl Default for CancellationHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-call cancellation and deadline context.
///
/// Observed at every fetch; the default context never cancels.
#[derive(Debug, Clone, Default)]
pub struct ResolveContext {
    deadline: Option<Instant>,
    cancellation: Option<watch::Receiver<bool>>,
}

impl ResolveContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort the call once `timeout` has elapsed from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Abort the call when `handle` is cancelled.
    pub fn with_cancellation(mut self, handle: &CancellationHandle) -> Self {
        self.cancellation = Some(handle.sender.subscribe());
        self
    }

    /// Drive `operation` unless cancellation or the deadline fires first.
    pub(crate) async fn run<F: Future>(&self, operation: F) -> Result<F::Output, ResolutionError> {
        let cancelled = wait_cancelled(self.cancellation.clone());
        let expired = wait_deadline(self.deadline);

        tokio::select! {
            biased;
            _ = cancelled => {
                log::debug!("Resolution cancelled by caller");
                Err(ResolutionError::Cancelled)
            }
            _ = expired => {
                log::debug!("Resolution deadline exceeded");
                Err(ResolutionError::Cancelled)
            }
            output = operation => Ok(output),
        }
    }
}

async fn wait_cancelled(receiver: Option<watch::Receiver<bool>>) {
    if let Some(mut receiver) = receiver {
        let closed = receiver.wait_for(|cancelled| *cancelled).await.is_err();
        if !closed {
            return;
        }
    }
    // Dropping the handle without cancelling never cancels.
    pending::<()>().await
}

async fn wait_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => pending::<()>().await,
    }
}
