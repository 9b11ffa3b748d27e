//! Cancellation and deadline context for remote calls.
//!
//! Every operation in this crate takes a `&Context`. It combines a
//! `tokio_util` [`CancellationToken`] with an optional deadline. Each HTTP
//! round-trip and each poll delay is raced against both, so cancelling the
//! token (or letting the deadline pass) unwinds the in-flight call
//! immediately instead of waiting for the request timeout.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{CdoError, Result};

/// Caller-supplied cancellation token plus optional deadline.
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Context::default()
    }

    /// Wraps an existing cancellation token, e.g. one tied to Ctrl-C.
    pub fn with_token(token: CancellationToken) -> Self {
        Context {
            token,
            deadline: None,
        }
    }

    /// Derives a child context that also expires after `timeout`.
    ///
    /// The child is cancelled whenever the parent is. The child's deadline
    /// is never later than the parent's.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        Context {
            token: self.token.child_token(),
            deadline: Some(match self.deadline {
                Some(parent) => parent.min(deadline),
                None => deadline,
            }),
        }
    }

    /// Cancels this context and every context derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns `true` once the context is cancelled or past its deadline.
    pub fn is_done(&self) -> bool {
        self.token.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fails fast with the reason the context ended, if it has.
    pub fn check(&self) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(CdoError::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(CdoError::DeadlineExceeded);
        }
        Ok(())
    }

    /// Drives `fut` to completion unless the context ends first, in which
    /// case `fut` is dropped (aborting any in-flight request).
    pub async fn run<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check()?;
        let deadline = self.deadline;
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(CdoError::Cancelled),
            _ = sleep_until_deadline(deadline) => Err(CdoError::DeadlineExceeded),
            res = fut => res,
        }
    }

    /// Sleeps for `duration`, waking early if the context ends.
    pub async fn sleep(&self, duration: Duration) -> Result<()> {
        self.run(async {
            tokio::time::sleep(duration).await;
            Ok(())
        })
        .await
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
