//! Poll-until-ready loop shared by the onboarding workflows.
//!
//! Several CDO operations only start a server-side state machine; the
//! result shows up later. Workflows therefore:
//!
//! 1. issue the triggering call, then
//! 2. call [`run`] with a check closure that performs one read and decides
//!    whether the remote side is ready.
//!
//! A check returns `Ok(Some(value))` when ready, `Ok(None)` when not yet
//! ready, or `Err(e)`. Errors abort the loop when
//! [`RetryOptions::early_exit_on_error`] is set and are retried otherwise.
//! Running out of attempts yields [`CdoError::RetryExhausted`], running out
//! of time yields [`CdoError::Timeout`]. Both are distinct from any error a
//! check reports.

use std::future::Future;
use std::time::{Duration, Instant};

use tracing::{Span, debug, info, warn};

use crate::context::Context;
use crate::error::{CdoError, Result};

/// Default number of retries after the first attempt.
pub const DEFAULT_RETRIES: u32 = 50;

/// Default pause between attempts.
pub const DEFAULT_DELAY: Duration = Duration::from_secs(3);

/// Default total time budget for a poll loop.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Retry count, delay and timeout of a poll loop.
///
/// Workflows accept an `Option<&PollConfig>` so callers (and tests) can
/// shorten or lengthen the wait without touching anything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Retries after the first attempt; the loop makes `retries + 1` checks.
    pub retries: u32,
    /// Pause between consecutive checks.
    pub delay: Duration,
    /// Maximum total time, measured from the first check.
    pub timeout: Duration,
}

impl PollConfig {
    /// Builds a poll configuration from explicit values.
    ///
    /// `retries` counts re-checks after the first one, so a loop configured
    /// with `retries = 0` checks exactly once.
    pub fn new(retries: u32, delay: Duration, timeout: Duration) -> Self {
        PollConfig {
            retries,
            delay,
            timeout,
        }
    }

    /// Replaces the retry count, keeping delay and timeout.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        PollConfig {
            retries: DEFAULT_RETRIES,
            delay: DEFAULT_DELAY,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Everything [`run`] needs besides the check itself.
#[derive(Debug, Clone)]
pub struct RetryOptions {
    /// Progress message logged on each attempt and carried by errors.
    pub message: String,
    /// Retry count, delay and time budget.
    pub poll: PollConfig,
    /// Span progress is logged into.
    pub span: Span,
    /// Abort on the first check error instead of retrying it.
    pub early_exit_on_error: bool,
}

impl RetryOptions {
    /// Options with default polling, logging into the current span.
    pub fn new(message: impl Into<String>) -> Self {
        RetryOptions {
            message: message.into(),
            poll: PollConfig::default(),
            span: Span::current(),
            early_exit_on_error: false,
        }
    }

    /// Replaces the whole poll configuration.
    pub fn poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Sets the number of retries after the first check.
    pub fn retries(mut self, retries: u32) -> Self {
        self.poll.retries = retries;
        self
    }

    /// Sets the pause between checks.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.poll.delay = delay;
        self
    }

    /// Sets the total time budget.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.poll.timeout = timeout;
        self
    }

    /// Logs progress into `span` instead of the current span.
    pub fn span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Aborts on the first check error when `early_exit` is true.
    pub fn early_exit_on_error(mut self, early_exit: bool) -> Self {
        self.early_exit_on_error = early_exit;
        self
    }
}

/// Runs `check` until it reports ready, fails (with early exit), or the
/// retry/time budget runs out.
///
/// Each check is raced against `ctx`; cancellation or deadline expiry
/// returns immediately without further attempts, including mid-delay.
pub async fn run<T, F, Fut>(ctx: &Context, options: &RetryOptions, mut check: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let span = &options.span;
    let max_attempts = options.poll.retries.saturating_add(1);
    let started = Instant::now();
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        info!(parent: span, attempt = attempts, max_attempts, "{}", options.message);

        match ctx.run(check()).await {
            Ok(Some(value)) => {
                debug!(parent: span, attempts, "ready");
                return Ok(value);
            }
            Ok(None) => debug!(parent: span, attempt = attempts, "not ready yet"),
            Err(e @ (CdoError::Cancelled | CdoError::DeadlineExceeded)) => return Err(e),
            Err(e) if options.early_exit_on_error => {
                warn!(parent: span, attempt = attempts, error = %e, "check failed, giving up");
                return Err(e);
            }
            Err(e) => warn!(parent: span, attempt = attempts, error = %e, "check failed, retrying"),
        }

        if attempts >= max_attempts {
            return Err(CdoError::RetryExhausted {
                message: options.message.clone(),
                attempts,
            });
        }

        let elapsed = started.elapsed();
        if elapsed >= options.poll.timeout {
            return Err(CdoError::Timeout {
                message: options.message.clone(),
                elapsed,
            });
        }

        // Never sleep past the time budget.
        let remaining = options.poll.timeout - elapsed;
        ctx.sleep(options.poll.delay.min(remaining)).await?;

        let elapsed = started.elapsed();
        if elapsed >= options.poll.timeout {
            return Err(CdoError::Timeout {
                message: options.message.clone(),
                elapsed,
            });
        }
    }
}
