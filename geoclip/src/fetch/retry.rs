//! Declarative retry policy and the helper that applies it.
//!
//! Each failure is classified into a [`FailureClass`]; the policy table maps
//! the class to a [`Backoff`]. Attempts are numbered from 1.
//!
//! | Failure              | Wait before next attempt   |
//! |----------------------|----------------------------|
//! | HTTP 429             | `2^attempt × 3000 ms`      |
//! | HTTP 502 / 504       | `2^attempt × 5000 ms`      |
//! | other 5xx            | `2000 ms`                  |
//! | other 4xx            | abort                      |
//! | transport            | `2^(attempt-1) × 2000 ms`  |
//! | undecodable body     | abort                      |

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::error::FetchError;

/// Default maximum attempts per job.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Category of a failed request, as far as retrying is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureClass {
    /// HTTP 429.
    RateLimited,
    /// HTTP 502 or 504.
    Gateway,
    /// Any other 5xx.
    Server,
    /// Any other non-success status.
    Client,
    Transport,
    Decode,
}

impl FailureClass {
    pub fn of(error: &FetchError) -> Self {
        match error {
            FetchError::Status(429) => FailureClass::RateLimited,
            FetchError::Status(502 | 504) => FailureClass::Gateway,
            FetchError::Status(500..=599) => FailureClass::Server,
            FetchError::Status(_) => FailureClass::Client,
            FetchError::Transport(_) => FailureClass::Transport,
            FetchError::Decode(_) => FailureClass::Decode,
        }
    }
}

/// What to do after a failure of some class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Wait `2^(attempt - offset) × base`.
    Exponential { base: Duration, offset: u32 },
    Fixed(Duration),
    /// Do not retry.
    Abort,
}

impl Backoff {
    /// Delay after the given (1-based) failed attempt, `None` to abort.
    pub fn delay(&self, attempt: u32) -> Option<Duration> {
        match *self {
            Backoff::Exponential { base, offset } => {
                let exponent = attempt.saturating_sub(offset).min(20);
                Some(base.saturating_mul(1u32 << exponent))
            }
            Backoff::Fixed(delay) => Some(delay),
            Backoff::Abort => None,
        }
    }
}

const DEFAULT_RULES: [(FailureClass, Backoff); 6] = [
    (
        FailureClass::RateLimited,
        Backoff::Exponential {
            base: Duration::from_millis(3000),
            offset: 0,
        },
    ),
    (
        FailureClass::Gateway,
        Backoff::Exponential {
            base: Duration::from_millis(5000),
            offset: 0,
        },
    ),
    (FailureClass::Server, Backoff::Fixed(Duration::from_millis(2000))),
    (FailureClass::Client, Backoff::Abort),
    (
        FailureClass::Transport,
        Backoff::Exponential {
            base: Duration::from_millis(2000),
            offset: 1,
        },
    ),
    (FailureClass::Decode, Backoff::Abort),
];

/// Retry table plus attempt limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    rules: [(FailureClass, Backoff); 6],
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            rules: DEFAULT_RULES,
        }
    }
}

impl RetryPolicy {
    /// Sets the attempt limit (at least 1).
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff_for(&self, class: FailureClass) -> Backoff {
        self.rules
            .iter()
            .find(|(c, _)| *c == class)
            .map(|(_, backoff)| *backoff)
            .unwrap_or(Backoff::Abort)
    }

    /// Delay after `attempt` failed with `class`, `None` when the failure is
    /// not retryable.
    pub fn delay_for(&self, class: FailureClass, attempt: u32) -> Option<Duration> {
        self.backoff_for(class).delay(attempt)
    }
}

/// How a retried operation ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryOutcome<T> {
    Success { value: T, attempts: u32 },
    /// Every attempt failed with a retryable error.
    Exhausted { attempts: u32, last_error: FetchError },
    /// A non-retryable error ended the operation early.
    Aborted { attempts: u32, error: FetchError },
    Cancelled,
}

/// Runs `operation` under `policy`, sleeping between attempts.
///
/// The closure receives the 1-based attempt number. Cancellation is observed
/// before every attempt and during every backoff sleep; an attempt already in
/// flight runs to completion.
pub async fn retry_with_policy<T, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut operation: F,
) -> RetryOutcome<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt = 1;
    loop {
        if cancel.is_cancelled() {
            return RetryOutcome::Cancelled;
        }

        let error = match operation(attempt).await {
            Ok(value) => {
                return RetryOutcome::Success {
                    value,
                    attempts: attempt,
                }
            }
            Err(e) => e,
        };

        let class = FailureClass::of(&error);
        let Some(delay) = policy.delay_for(class, attempt) else {
            warn!(error = %error, attempt, "Request failed, not retrying");
            return RetryOutcome::Aborted {
                attempts: attempt,
                error,
            };
        };

        if attempt >= policy.max_attempts() {
            warn!(error = %error, attempts = attempt, "Request failed, retries exhausted");
            return RetryOutcome::Exhausted {
                attempts: attempt,
                last_error: error,
            };
        }

        debug!(
            error = %error,
            attempt,
            backoff_ms = delay.as_millis() as u64,
            "Request failed, backing off"
        );
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return RetryOutcome::Cancelled,
            _ = tokio::time::sleep(delay) => {}
        }
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn test_classification() {
        assert_eq!(FailureClass::of(&FetchError::Status(429)), FailureClass::RateLimited);
        assert_eq!(FailureClass::of(&FetchError::Status(502)), FailureClass::Gateway);
        assert_eq!(FailureClass::of(&FetchError::Status(504)), FailureClass::Gateway);
        assert_eq!(FailureClass::of(&FetchError::Status(503)), FailureClass::Server);
        assert_eq!(FailureClass::of(&FetchError::Status(400)), FailureClass::Client);
        assert_eq!(
            FailureClass::of(&FetchError::Transport("reset".into())),
            FailureClass::Transport
        );
        assert_eq!(
            FailureClass::of(&FetchError::Decode("eof".into())),
            FailureClass::Decode
        );
    }

    #[test]
    fn test_policy_table_delays() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(FailureClass::RateLimited, 1), Some(ms(6000)));
        assert_eq!(policy.delay_for(FailureClass::RateLimited, 2), Some(ms(12000)));
        assert_eq!(policy.delay_for(FailureClass::Gateway, 1), Some(ms(10000)));
        assert_eq!(policy.delay_for(FailureClass::Server, 1), Some(ms(2000)));
        assert_eq!(policy.delay_for(FailureClass::Server, 3), Some(ms(2000)));
        assert_eq!(policy.delay_for(FailureClass::Client, 1), None);
        assert_eq!(policy.delay_for(FailureClass::Transport, 1), Some(ms(2000)));
        assert_eq!(policy.delay_for(FailureClass::Transport, 2), Some(ms(4000)));
        assert_eq!(policy.delay_for(FailureClass::Decode, 1), None);
    }

    #[test]
    fn test_rate_limit_backoff_is_monotonic() {
        let policy = RetryPolicy::default();
        let delays: Vec<Duration> = (1..=5)
            .filter_map(|a| policy.delay_for(FailureClass::RateLimited, a))
            .collect();
        assert_eq!(delays.len(), 5);
        assert!(delays.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_max_attempts_floor() {
        assert_eq!(RetryPolicy::default().with_max_attempts(0).max_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_retry() {
        let calls = AtomicU32::new(0);
        let outcome = retry_with_policy(&RetryPolicy::default(), &CancellationToken::new(), |a| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if a < 2 {
                    Err(FetchError::Status(503))
                } else {
                    Ok(a)
                }
            }
        })
        .await;

        assert_eq!(
            outcome,
            RetryOutcome::Success {
                value: 2,
                attempts: 2
            }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_exhausts_after_backoff() {
        let start = tokio::time::Instant::now();
        let outcome: RetryOutcome<()> =
            retry_with_policy(&RetryPolicy::default(), &CancellationToken::new(), |_| async {
                Err(FetchError::Status(429))
            })
            .await;

        assert_eq!(
            outcome,
            RetryOutcome::Exhausted {
                attempts: 3,
                last_error: FetchError::Status(429)
            }
        );
        // 6s after the first failure, 12s after the second, none after the last.
        assert_eq!(start.elapsed(), ms(18000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_error_aborts_immediately() {
        let start = tokio::time::Instant::now();
        let outcome: RetryOutcome<()> =
            retry_with_policy(&RetryPolicy::default(), &CancellationToken::new(), |_| async {
                Err(FetchError::Status(404))
            })
            .await;

        assert_eq!(
            outcome,
            RetryOutcome::Aborted {
                attempts: 1,
                error: FetchError::Status(404)
            }
        );
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_backoff() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(ms(1000)).await;
            trigger.cancel();
        });

        let outcome: RetryOutcome<()> =
            retry_with_policy(&RetryPolicy::default(), &cancel, |_| async {
                Err(FetchError::Status(429))
            })
            .await;
        assert_eq!(outcome, RetryOutcome::Cancelled);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_attempt() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome =
            retry_with_policy(&RetryPolicy::default(), &cancel, |_| async { Ok(1) }).await;
        assert_eq!(outcome, RetryOutcome::Cancelled);
    }
}
