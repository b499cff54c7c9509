//! Bounded retry and polling primitives.
//!
//! This module provides two loops shared by every control-plane caller:
//!
//! - [`with_retry`] wraps a single request with automatic retry on transient errors (connection
//!   failures, throttling, timeouts). Non-transient errors are returned immediately.
//! - [`poll_until`] repeatedly evaluates a check until it reports [`PollOutcome::Done`], bounded
//!   by an overall deadline. It is the building block for waiting on asynchronous collection
//!   transitions (see [`waiter`](crate::waiter)).
//!
//! # Backoff Strategy
//!
//! Both loops use exponential backoff with jitter:
//! - Base delay doubles with each attempt: `initial_backoff * 2^attempt`
//! - Delay is capped at `max_backoff`
//! - Random jitter of 0–50% of the computed delay is added

use std::{future::Future, sync::Arc, time::Duration};

use fail::fail_point;
use parking_lot::Mutex;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, StorageError, StorageResult, TimeoutContext};

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default delay before the first retry.
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(100);

/// Default upper bound on a single retry delay.
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(5);

/// Default overall deadline for a readiness wait.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default delay between the first two readiness checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Default upper bound on the delay between readiness checks.
pub const DEFAULT_MAX_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Retry policy for individual requests.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use authkv_storage::RetryConfig;
///
/// let config = RetryConfig::builder()
///     .max_retries(5)
///     .initial_backoff(Duration::from_millis(20))
///     .build()?;
/// assert_eq!(config.max_retries, 5);
/// # Ok::<(), authkv_storage::ConfigError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Retries after the first attempt. Zero disables retrying.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry.
    #[serde(with = "humantime_serde", default = "default_initial_backoff")]
    pub initial_backoff: Duration,

    /// Upper bound on any single retry delay.
    #[serde(with = "humantime_serde", default = "default_max_backoff")]
    pub max_backoff: Duration,
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_initial_backoff() -> Duration {
    DEFAULT_INITIAL_BACKOFF
}

fn default_max_backoff() -> Duration {
    DEFAULT_MAX_BACKOFF
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
        }
    }
}

#[bon::bon]
impl RetryConfig {
    /// Creates a validated retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `initial_backoff` is zero or exceeds
    /// `max_backoff`.
    #[builder]
    pub fn new(
        #[builder(default = DEFAULT_MAX_RETRIES)] max_retries: u32,
        #[builder(default = DEFAULT_INITIAL_BACKOFF)] initial_backoff: Duration,
        #[builder(default = DEFAULT_MAX_BACKOFF)] max_backoff: Duration,
    ) -> Result<Self, ConfigError> {
        let config = Self { max_retries, initial_backoff, max_backoff };
        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants enforced by the builder.
    ///
    /// Useful after deserializing a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `initial_backoff` is zero or exceeds
    /// `max_backoff`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_backoff(self.initial_backoff, self.max_backoff)
    }
}

/// Deadline and pacing for readiness polling.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use authkv_storage::WaitConfig;
///
/// let config = WaitConfig::builder().timeout(Duration::from_secs(10)).build()?;
/// assert_eq!(config.timeout, Duration::from_secs(10));
/// # Ok::<(), authkv_storage::ConfigError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WaitConfig {
    /// Overall deadline for the wait, including all checks and sleeps.
    #[serde(with = "humantime_serde", default = "default_wait_timeout")]
    pub timeout: Duration,

    /// Delay between the first two checks.
    #[serde(with = "humantime_serde", default = "default_poll_interval")]
    pub initial_backoff: Duration,

    /// Upper bound on the delay between checks.
    #[serde(with = "humantime_serde", default = "default_max_poll_interval")]
    pub max_backoff: Duration,
}

fn default_wait_timeout() -> Duration {
    DEFAULT_WAIT_TIMEOUT
}

fn default_poll_interval() -> Duration {
    DEFAULT_POLL_INTERVAL
}

fn default_max_poll_interval() -> Duration {
    DEFAULT_MAX_POLL_INTERVAL
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_WAIT_TIMEOUT,
            initial_backoff: DEFAULT_POLL_INTERVAL,
            max_backoff: DEFAULT_MAX_POLL_INTERVAL,
        }
    }
}

#[bon::bon]
impl WaitConfig {
    /// Creates a validated wait policy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `timeout` or `initial_backoff` is zero, or
    /// if `initial_backoff` exceeds `max_backoff`.
    #[builder]
    pub fn new(
        #[builder(default = DEFAULT_WAIT_TIMEOUT)] timeout: Duration,
        #[builder(default = DEFAULT_POLL_INTERVAL)] initial_backoff: Duration,
        #[builder(default = DEFAULT_MAX_POLL_INTERVAL)] max_backoff: Duration,
    ) -> Result<Self, ConfigError> {
        let config = Self { timeout, initial_backoff, max_backoff };
        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants enforced by the builder.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `timeout` or `initial_backoff` is zero, or
    /// if `initial_backoff` exceeds `max_backoff`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout.is_zero() {
            return Err(ConfigError::MustBePositive {
                field: "timeout",
                value: format!("{:?}", self.timeout),
            });
        }
        validate_backoff(self.initial_backoff, self.max_backoff)
    }
}

fn validate_backoff(initial: Duration, max: Duration) -> Result<(), ConfigError> {
    if initial.is_zero() {
        return Err(ConfigError::MustBePositive {
            field: "initial_backoff",
            value: format!("{initial:?}"),
        });
    }
    if initial > max {
        return Err(ConfigError::InvalidRange {
            min_field: "initial_backoff",
            min: format!("{initial:?}"),
            max_field: "max_backoff",
            max: format!("{max:?}"),
        });
    }
    Ok(())
}

/// Result of a single readiness check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The awaited condition holds.
    Done,
    /// Not there yet; `observed` describes the current state for diagnostics.
    Pending {
        /// Human-readable description of what the check saw.
        observed: String,
    },
}

impl PollOutcome {
    /// Creates a `Pending` outcome.
    #[must_use]
    pub fn pending(observed: impl Into<String>) -> Self {
        Self::Pending { observed: observed.into() }
    }
}

/// Executes `operation` with automatic retry on transient errors.
///
/// Returns the result of the first successful call, or the last error
/// if all retry attempts are exhausted.
///
/// # Retry Eligibility
///
/// Only errors where [`StorageError::is_transient`] returns `true` are
/// retried. All other errors are propagated immediately.
///
/// The closure receives the zero-based attempt number, which lets callers
/// recognise a retry of a request whose first attempt may already have been
/// applied.
#[tracing::instrument(skip(config, operation), fields(max_retries = config.max_retries))]
pub async fn with_retry<F, Fut, T>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> StorageResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = StorageResult<T>>,
{
    let mut attempt = 0;
    loop {
        match operation(attempt).await {
            Ok(value) => {
                if attempt > 0 {
                    tracing::debug!(
                        operation = operation_name,
                        attempt = attempt + 1,
                        "operation succeeded after retry",
                    );
                }
                return Ok(value);
            },
            Err(err) if err.is_transient() && attempt < config.max_retries => {
                let delay = compute_backoff(config.initial_backoff, config.max_backoff, attempt);
                tracing::debug!(
                    operation = operation_name,
                    attempt = attempt + 1,
                    max_attempts = config.max_retries + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "transient error, retrying after backoff",
                );
                fail_point!("retry-before-sleep");
                tokio::time::sleep(delay).await;
                attempt += 1;
            },
            Err(err) => {
                if attempt > 0 && err.is_transient() {
                    tracing::warn!(
                        operation = operation_name,
                        attempts = attempt + 1,
                        error = %err,
                        "retries exhausted",
                    );
                }
                return Err(err);
            },
        }
    }
}

/// Tracks polling state for timeout context reporting.
#[derive(Debug, Default)]
struct PollState {
    attempts_completed: u32,
    during_backoff: bool,
    last_observation: Option<String>,
}

/// Polls `check` until it reports [`PollOutcome::Done`] or the deadline in
/// `config` passes.
///
/// Transient check errors are treated like a pending outcome. Any other
/// error aborts the wait and is returned unchanged.
///
/// # Errors
///
/// Returns [`StorageError::Timeout`] when `config.timeout` elapses. Its
/// [`TimeoutContext`] records how many checks completed, whether the
/// deadline hit during a backoff sleep, and the last observed state.
#[tracing::instrument(skip(config, check), fields(timeout_ms = config.timeout.as_millis() as u64))]
pub async fn poll_until<F, Fut>(
    config: &WaitConfig,
    operation_name: &str,
    mut check: F,
) -> StorageResult<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = StorageResult<PollOutcome>>,
{
    let state = Arc::new(Mutex::new(PollState::default()));
    let loop_state = Arc::clone(&state);

    let polling = async move {
        let mut attempt: u32 = 0;
        loop {
            loop_state.lock().during_backoff = false;

            let observation = match check().await {
                Ok(PollOutcome::Done) => return Ok(()),
                Ok(PollOutcome::Pending { observed }) => observed,
                Err(err) if err.is_transient() => err.to_string(),
                Err(err) => return Err(err),
            };

            let delay = compute_backoff(config.initial_backoff, config.max_backoff, attempt);
            tracing::debug!(
                operation = operation_name,
                attempt = attempt + 1,
                observed = %observation,
                delay_ms = delay.as_millis() as u64,
                "condition not met, polling again after backoff",
            );
            {
                let mut s = loop_state.lock();
                s.attempts_completed = attempt + 1;
                s.during_backoff = true;
                s.last_observation = Some(observation);
            }

            fail_point!("poll-before-sleep");
            tokio::time::sleep(delay).await;
            attempt = attempt.saturating_add(1);
        }
    };

    match tokio::time::timeout(config.timeout, polling).await {
        Ok(result) => result,
        Err(_elapsed) => {
            let s = state.lock();
            Err(StorageError::timeout(TimeoutContext {
                operation: operation_name.to_owned(),
                attempts_completed: s.attempts_completed,
                during_backoff: s.during_backoff,
                last_observation: s.last_observation.clone(),
            }))
        },
    }
}

/// Computes the backoff duration for the given attempt number.
///
/// Uses exponential backoff with jitter:
/// `min(initial * 2^attempt, max) + random(0..50% of delay)`
pub(crate) fn compute_backoff(initial: Duration, max: Duration, attempt: u32) -> Duration {
    let base = initial.saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX));
    let capped = base.min(max);

    let jitter_range = capped.as_millis() as u64 / 2;
    if jitter_range > 0 {
        let jitter = rand::rng().random_range(0..=jitter_range);
        capped + Duration::from_millis(jitter)
    } else {
        capped
    }
}
