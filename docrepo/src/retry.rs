use crate::common::DEFAULT_MAX_RETRIES;
use crate::errors::{ErrorKind, RepoError, RepoResult};
use std::future::Future;
use std::time::Duration;

/// Delay between attempts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Backoff {
    /// Retry immediately.
    #[default]
    None,
    /// Wait the same duration before every retry.
    Fixed(Duration),
    /// Double the wait before every retry, starting at `initial` and capped at `max`.
    Exponential { initial: Duration, max: Duration },
}

impl Backoff {
    /// Delay before the given retry, counted from 1.
    pub fn delay(&self, retry: u32) -> Option<Duration> {
        match self {
            Backoff::None => None,
            Backoff::Fixed(delay) => Some(*delay),
            Backoff::Exponential { initial, max } => {
                let factor = 2u32.saturating_pow(retry.saturating_sub(1));
                Some(initial.saturating_mul(factor).min(*max))
            }
        }
    }
}

/// Retry settings.
///
/// Defaults: 3 retries after the first failure, no backoff, writes retried.
///
/// ```rust,ignore
/// let config = RetryConfig::new()
///     .max_retries(5)
///     .backoff(Backoff::Fixed(Duration::from_millis(50)))
///     .retry_writes(false);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryConfig {
    max_retries: u32,
    backoff: Backoff,
    retry_writes: bool,
}

impl RetryConfig {
    pub fn new() -> RetryConfig {
        RetryConfig::default()
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// When false, inserts and updates run once; only idempotent operations are retried.
    pub fn retry_writes(mut self, retry_writes: bool) -> Self {
        self.retry_writes = retry_writes;
        self
    }

    pub fn get_max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn get_backoff(&self) -> Backoff {
        self.backoff
    }

    pub fn get_retry_writes(&self) -> bool {
        self.retry_writes
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff: Backoff::None,
            retry_writes: true,
        }
    }
}

/// Whether an error is worth retrying.
///
/// Only a `ConnectionFailure` whose immediate cause is a `NetworkIo` or `SocketFailure`
/// error is transient.
pub fn is_transient(error: &RepoError) -> bool {
    error.kind() == &ErrorKind::ConnectionFailure
        && matches!(
            error.cause().map(|cause| cause.kind()),
            Some(ErrorKind::NetworkIo) | Some(ErrorKind::SocketFailure)
        )
}

/// Runs store calls, retrying transient failures.
///
/// # Behavior
/// - A transient failure is retried up to `max_retries` more times; the last error is
///   returned unchanged once the budget is spent
/// - Any other failure is returned on first occurrence
/// - Each retry is logged as a warning
#[derive(Clone, Debug, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> RetryPolicy {
        RetryPolicy { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Runs an idempotent operation with the full retry budget.
    pub fn execute<R, F>(&self, operation: &str, action: F) -> RepoResult<R>
    where
        F: FnMut() -> RepoResult<R>,
    {
        self.run(operation, self.config.max_retries, action)
    }

    /// Runs a write, retried only when the configuration allows retrying writes.
    pub fn execute_write<R, F>(&self, operation: &str, action: F) -> RepoResult<R>
    where
        F: FnMut() -> RepoResult<R>,
    {
        self.run(operation, self.write_budget(), action)
    }

    pub async fn execute_async<R, F, Fut>(&self, operation: &str, action: F) -> RepoResult<R>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = RepoResult<R>>,
    {
        self.run_async(operation, self.config.max_retries, action).await
    }

    pub async fn execute_write_async<R, F, Fut>(&self, operation: &str, action: F) -> RepoResult<R>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = RepoResult<R>>,
    {
        self.run_async(operation, self.write_budget(), action).await
    }

    fn write_budget(&self) -> u32 {
        if self.config.retry_writes {
            self.config.max_retries
        } else {
            0
        }
    }

    fn run<R, F>(&self, operation: &str, budget: u32, mut action: F) -> RepoResult<R>
    where
        F: FnMut() -> RepoResult<R>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match action() {
                Ok(result) => return Ok(result),
                Err(err) if attempt <= budget && is_transient(&err) => {
                    log::warn!(
                        "Transient failure in {} (attempt {} of {}): {}",
                        operation,
                        attempt,
                        budget + 1,
                        err
                    );
                    if let Some(delay) = self.config.backoff.delay(attempt) {
                        std::thread::sleep(delay);
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn run_async<R, F, Fut>(&self, operation: &str, budget: u32, mut action: F) -> RepoResult<R>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = RepoResult<R>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match action().await {
                Ok(result) => return Ok(result),
                Err(err) if attempt <= budget && is_transient(&err) => {
                    log::warn!(
                        "Transient failure in {} (attempt {} of {}): {}",
                        operation,
                        attempt,
                        budget + 1,
                        err
                    );
                    if let Some(delay) = self.config.backoff.delay(attempt) {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }
}
