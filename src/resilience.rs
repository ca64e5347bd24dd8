//! Generic helpers for running fallible async operations
//!
//! None of these know anything about recipes. Operations are passed as
//! unpolled futures (or, for retries, as a closure producing a fresh future per
//! attempt), so nothing runs until the helper decides to run it.
//!
//! [`with_timeout`] and [`race`] spawn their operations onto the runtime. An
//! operation that loses is detached rather than cancelled: it keeps running to
//! completion and its result is dropped.

use futures::future;
use futures::stream::{FuturesOrdered, StreamExt};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Runs `operations` with at most `limit` in flight at once.
///
/// The output has one slot per input, in input order. A failed operation
/// leaves `None` in its slot without affecting the others. Returns only after
/// every operation has settled. A `limit` of 0 is treated as 1.
pub async fn run_bounded<T, E, I, Fut>(operations: I, limit: usize) -> Vec<Option<T>>
where
    I: IntoIterator<Item = Fut>,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    let limit = limit.max(1);
    let mut pending = operations.into_iter().enumerate();
    let mut in_flight = FuturesOrdered::new();
    let mut results = Vec::new();

    loop {
        while in_flight.len() < limit {
            match pending.next() {
                Some((index, operation)) => in_flight.push_back(settle(index, operation)),
                None => break,
            }
        }

        match in_flight.next().await {
            Some(slot) => results.push(slot),
            None => return results,
        }
    }
}

async fn settle<T, E, Fut>(index: usize, operation: Fut) -> Option<T>
where
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    match operation.await {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(index, error = %e, "bounded operation failed");
            None
        }
    }
}

/// Why a deadline-bound operation produced no output
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Interrupted {
    /// The deadline passed first; the operation keeps running detached
    #[error("timed out after {}ms", .0.as_millis())]
    TimedOut(Duration),

    /// The operation's task panicked or was aborted
    #[error("operation aborted: {0}")]
    Aborted(String),
}

/// Runs `operation` as its own task and waits at most `duration` for it.
///
/// The task is left running when the timer wins.
pub async fn with_deadline<T, Fut>(operation: Fut, duration: Duration) -> Result<T, Interrupted>
where
    Fut: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let handle = tokio::spawn(operation);

    match tokio::time::timeout(duration, handle).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            warn!(error = %e, "timed operation aborted");
            Err(Interrupted::Aborted(e.to_string()))
        }
        Err(_) => {
            debug!(
                timeout_ms = duration.as_millis() as u64,
                "operation timed out, leaving it to finish in the background"
            );
            Err(Interrupted::TimedOut(duration))
        }
    }
}

/// Returns the operation's output if it finishes within `duration`, otherwise `fallback`.
///
/// See [`with_deadline`] for how the operation is run.
pub async fn with_timeout<T, Fut>(operation: Fut, duration: Duration, fallback: T) -> T
where
    Fut: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    with_deadline(operation, duration).await.unwrap_or(fallback)
}

/// Every failure collected by [`first_success`], in the order the strategies ran
#[derive(Debug)]
pub struct AllFailed<E> {
    pub failures: Vec<E>,
}

impl<E: fmt::Display> fmt::Display for AllFailed<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failures.is_empty() {
            return write!(f, "no strategies were available");
        }

        write!(f, "all {} strategies failed: ", self.failures.len())?;
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", failure)?;
        }
        Ok(())
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for AllFailed<E> {}

/// Tries each strategy in turn and returns the first success.
///
/// Later strategies are never polled once one succeeds.
pub async fn first_success<T, E, I, Fut>(strategies: I) -> Result<T, AllFailed<E>>
where
    I: IntoIterator<Item = Fut>,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    let mut failures = Vec::new();

    for (index, strategy) in strategies.into_iter().enumerate() {
        match strategy.await {
            Ok(value) => return Ok(value),
            Err(e) => {
                debug!(index, error = %e, "strategy failed, trying next");
                failures.push(e);
            }
        }
    }

    Err(AllFailed { failures })
}

/// Returns the output of whichever operation settles first.
///
/// The remaining operations keep running detached. Tasks that panic are
/// skipped; `None` means no operation produced an output at all.
pub async fn race<T, I, Fut>(operations: I) -> Option<T>
where
    I: IntoIterator<Item = Fut>,
    Fut: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let mut handles: Vec<_> = operations.into_iter().map(tokio::spawn).collect();

    while !handles.is_empty() {
        let (settled, index, remaining) = future::select_all(handles).await;
        match settled {
            Ok(value) => {
                debug!(winner = index, abandoned = remaining.len(), "race settled");
                return Some(value);
            }
            Err(e) => {
                warn!(index, error = %e, "raced task aborted");
                handles = remaining;
            }
        }
    }

    None
}

/// Bounded retry with a fixed delay between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one
    pub max_attempts: u32,
    /// Pause between consecutive attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Calls `operation` until it succeeds or the attempts run out.
    ///
    /// Returns the last error once every attempt failed. At least one attempt
    /// is always made.
    pub async fn run<T, E, F, Fut>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < max_attempts => {
                    warn!(
                        error = %e,
                        attempt,
                        max_attempts,
                        delay_ms = self.delay.as_millis() as u64,
                        "retrying operation"
                    );
                    attempt += 1;
                    tokio::time::sleep(self.delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
