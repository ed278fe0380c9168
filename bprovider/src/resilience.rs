//! Retry/backoff policy for provider dispatch and the operational hook contract.
//!
//! Retries only ever wrap opening a call. Once a stream has produced its first chunk the
//! round owns it and a failure is reported, never replayed.

use std::future::Future;
use std::time::Duration;

use crate::{ProviderError, ProviderId};

pub const OPERATION_STREAM: &str = "stream";
pub const OPERATION_COMPLETE: &str = "complete";

/// Backoff schedule for opening a provider call.
///
/// Delays grow geometrically from `initial_backoff` and are clamped to `max_backoff`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// A single attempt with no backoff.
    pub fn disabled() -> Self {
        Self::new(1)
    }

    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    pub fn with_max_backoff(mut self, backoff: Duration) -> Self {
        self.max_backoff = backoff;
        self
    }

    pub fn should_retry(&self, attempt: u32, error: &ProviderError) -> bool {
        error.retryable && attempt < self.max_attempts
    }

    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let steps = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let factor = self.backoff_multiplier.max(1.0).powi(steps);
        let scaled = self.initial_backoff.as_secs_f64() * factor;

        if scaled.is_finite() && scaled < self.max_backoff.as_secs_f64() {
            Duration::from_secs_f64(scaled)
        } else {
            self.max_backoff
        }
    }

    /// How long to wait before attempt `attempt + 1`, or `None` when `error` is final.
    pub fn delay_after(&self, attempt: u32, error: &ProviderError) -> Option<Duration> {
        self.should_retry(attempt, error)
            .then(|| self.backoff_for_attempt(attempt))
    }
}

pub trait ProviderOperationHooks: Send + Sync {
    fn on_attempt_start(&self, _provider: ProviderId, _operation: &str, _attempt: u32) {}

    fn on_retry_scheduled(
        &self,
        _provider: ProviderId,
        _operation: &str,
        _attempt: u32,
        _delay: Duration,
        _error: &ProviderError,
    ) {
    }

    fn on_success(&self, _provider: ProviderId, _operation: &str, _attempts: u32) {}

    fn on_failure(
        &self,
        _provider: ProviderId,
        _operation: &str,
        _attempts: u32,
        _error: &ProviderError,
    ) {
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopOperationHooks;

impl ProviderOperationHooks for NoopOperationHooks {}

/// Runs `open` until it succeeds, the error is not retryable, or attempts run out. `pause`
/// is awaited between attempts so callers pick the timer.
pub async fn execute_with_retry<T, Open, OpenFuture, Pause, PauseFuture>(
    provider: ProviderId,
    operation: &str,
    policy: &RetryPolicy,
    hooks: &dyn ProviderOperationHooks,
    mut open: Open,
    mut pause: Pause,
) -> Result<T, ProviderError>
where
    Open: FnMut(u32) -> OpenFuture,
    OpenFuture: Future<Output = Result<T, ProviderError>>,
    Pause: FnMut(Duration) -> PauseFuture,
    PauseFuture: Future<Output = ()>,
{
    for attempt in 1.. {
        hooks.on_attempt_start(provider, operation, attempt);

        let error = match open(attempt).await {
            Ok(value) => {
                hooks.on_success(provider, operation, attempt);
                return Ok(value);
            }
            Err(error) => error,
        };

        let Some(delay) = policy.delay_after(attempt, &error) else {
            hooks.on_failure(provider, operation, attempt, &error);
            return Err(error);
        };

        tracing::debug!(
            provider = %provider,
            operation,
            attempt,
            delay_ms = delay.as_millis() as u64,
            "provider call will be retried"
        );
        hooks.on_retry_scheduled(provider, operation, attempt, delay, &error);
        pause(delay).await;
    }

    Err(ProviderError::other(format!(
        "{operation} on {provider} exhausted its attempt counter"
    )))
}
