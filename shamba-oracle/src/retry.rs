use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::OracleError;

const DEFAULT_MAX_ATTEMPTS: u32 = 5;
const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);
const DEFAULT_MAX_JITTER: Duration = Duration::from_millis(500);

/// Bounded exponential backoff with additive jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubled for every later one.
    pub base_delay: Duration,
    /// Upper bound of the uniform jitter added to every delay.
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_jitter: DEFAULT_MAX_JITTER,
        }
    }
}

impl RetryPolicy {
    /// `base_delay * 2^attempt`, saturating.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Delay to wait after the failed attempt with 0-based index `attempt`.
    ///
    /// Always within `[backoff(attempt), backoff(attempt) + max_jitter]`.
    pub fn delay_for<R: Rng>(&self, attempt: u32, rng: &mut R) -> Duration {
        let jitter_ms = self.max_jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rng.random_range(0..=jitter_ms))
        };
        self.backoff(attempt).saturating_add(jitter)
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Bookkeeping for one logical call.
struct RetryState {
    attempt: u32,
    last_error: Option<OracleError>,
}

impl RetryState {
    fn new() -> Self {
        Self {
            attempt: 0,
            last_error: None,
        }
    }

    fn into_error(self) -> OracleError {
        self.last_error.unwrap_or(OracleError::Cancelled)
    }
}

/// Run `op` until it succeeds, fails with a non-transient error, or the
/// policy runs out of attempts.
///
/// `op` receives the 0-based attempt index. Cancelling `cancel` aborts both
/// an in-flight attempt and a pending backoff wait with
/// [`OracleError::Cancelled`].
pub async fn retry<T, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut op: F,
) -> Result<T, OracleError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, OracleError>>,
{
    let mut state = RetryState::new();

    loop {
        if cancel.is_cancelled() {
            return Err(OracleError::Cancelled);
        }

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(OracleError::Cancelled),
            outcome = op(state.attempt) => outcome,
        };

        let err = match outcome {
            Ok(value) => {
                if state.attempt > 0 {
                    debug!(attempts = state.attempt + 1, "Remote call recovered");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        let attempts_made = state.attempt + 1;
        let exhausted = attempts_made >= policy.attempts();
        let transient = err.is_transient();
        state.last_error = Some(err);

        if !transient || exhausted {
            if transient {
                warn!(attempts = attempts_made, "Remote call gave up after retries");
            }
            return Err(state.into_error());
        }

        let delay = policy.delay_for(state.attempt, &mut rand::rng());
        warn!(
            attempt = attempts_made,
            max_attempts = policy.attempts(),
            delay_ms = delay.as_millis() as u64,
            error = ?state.last_error,
            "Remote call failed, retrying"
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(OracleError::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }

        state.attempt += 1;
    }
}
