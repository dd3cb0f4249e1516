use std::{future::Future, time::Duration};

use serde::Deserialize;
use serde_with::{DurationMilliSeconds, serde_as};
use tracing::{debug, warn};

use crate::{error::ClientError, state::CancelToken};

/// How often and how long a polling loop may run.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollPolicy {
    /// Delay before each attempt while the answer is still pending.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "intervalMs")]
    pub interval: Duration,
    /// Attempts after which the loop gives up.
    pub max_attempts: u32,
    /// Ceiling for the delay after consecutive transport failures.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "maxBackoffMs")]
    pub max_backoff: Duration,
}

impl PollPolicy {
    /// Opponent arrival polling: every 15 seconds for up to half an hour.
    pub const OPPONENT: PollPolicy = PollPolicy {
        interval: Duration::from_secs(15),
        max_attempts: 120,
        max_backoff: Duration::from_secs(120),
    };

    /// Winner polling after score submission: every 10 seconds for up to fifteen minutes.
    pub const RESULT: PollPolicy = PollPolicy {
        interval: Duration::from_secs(10),
        max_attempts: 90,
        max_backoff: Duration::from_secs(60),
    };

    /// Delay after `failures` consecutive transport errors: the interval doubled per
    /// failure, capped at `max_backoff`.
    pub fn backoff(&self, failures: u32) -> Duration {
        let factor = 2u32.saturating_pow(failures.min(16));
        self.interval
            .saturating_mul(factor)
            .min(self.max_backoff.max(self.interval))
    }
}

/// Result of a single polling attempt.
#[derive(Debug)]
pub enum PollStep<T> {
    /// The awaited condition holds; stop polling.
    Done(T),
    /// Not yet; wait and try again.
    Pending,
}

/// Repeatedly run `attempt` until it reports [`PollStep::Done`].
///
/// Every attempt is preceded by a wait: the policy interval after a pending
/// answer, an exponential backoff after transport failures. Non-transient errors
/// end the loop immediately. Cancellation is observed during every wait.
pub async fn poll_until<T, F, Fut>(
    action: &'static str,
    policy: PollPolicy,
    cancel: &CancelToken,
    mut attempt: F,
) -> Result<T, ClientError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<PollStep<T>, ClientError>>,
{
    let mut delay = policy.interval;
    let mut failures = 0u32;

    for number in 1..=policy.max_attempts {
        cancel.sleep(delay).await?;

        match attempt(number).await {
            Ok(PollStep::Done(value)) => {
                debug!(action, attempt = number, "polling condition satisfied");
                return Ok(value);
            }
            Ok(PollStep::Pending) => {
                failures = 0;
                delay = policy.interval;
                debug!(action, attempt = number, "still pending");
            }
            Err(err) if err.is_transient() => {
                failures += 1;
                delay = policy.backoff(failures);
                warn!(
                    action,
                    attempt = number,
                    error = %err,
                    retry_in_ms = delay.as_millis() as u64,
                    "polling attempt failed; backing off"
                );
            }
            Err(err) => return Err(err),
        }
    }

    warn!(action, attempts = policy.max_attempts, "polling attempts exhausted");
    Err(ClientError::PollExhausted {
        action,
        attempts: policy.max_attempts,
    })
}
