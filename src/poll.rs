//! The job poller.
//!
//! DESIGN
//! ======
//! One engine drives every polled feature. A [`JobProbe`] issues a
//! single status request and parses it into a [`Step`]; [`drive`] owns
//! the cadence: sleep one interval, poll, apply the step, repeat. The
//! next request is not scheduled until the previous one has resolved,
//! so status requests never overlap and a slow response cannot be
//! overtaken by a later one.
//!
//! ERROR HANDLING
//! ==============
//! Retryable failures (see [`ErrorCode::retryable`]) back off
//! exponentially and are bounded by [`PollPolicy::max_retries`];
//! anything else ends the job on the spot. A server-reported `failed`
//! status is a probe concern: probes map it to
//! [`ClientError::JobFailed`] so it lands here as a terminal error.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::config::DEFAULT_POLL_INTERVAL_MS;
use crate::error::{ClientError, ErrorCode};
use crate::job::{Job, JobStatus, Progress};

pub const DEFAULT_BACKOFF_CAP_SECS: u64 = 30;
pub const DEFAULT_MAX_RETRIES: u32 = 5;

// =============================================================================
// POLICY
// =============================================================================

/// Tuning for one driven job.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    /// Delay between a resolved status request and the next one.
    pub interval: Duration,
    /// First retry delay after a retryable failure; doubles per attempt.
    pub backoff_base: Duration,
    /// Upper bound on the retry delay.
    pub backoff_cap: Duration,
    /// Consecutive retryable failures tolerated before giving up.
    pub max_retries: u32,
    /// Optional cap on total status requests; `None` polls until terminal.
    pub max_polls: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        let interval = Duration::from_millis(DEFAULT_POLL_INTERVAL_MS);
        Self {
            interval,
            backoff_base: interval,
            backoff_cap: Duration::from_secs(DEFAULT_BACKOFF_CAP_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            max_polls: None,
        }
    }
}

impl PollPolicy {
    /// Policy with a custom cadence; the backoff base follows the interval.
    #[must_use]
    pub fn with_interval(interval: Duration) -> Self {
        Self { interval, backoff_base: interval, ..Self::default() }
    }
}

/// Retry delay after `consecutive_failures` back-to-back failures:
/// `base * 2^(n-1)`, capped.
#[must_use]
pub fn backoff_delay(policy: &PollPolicy, consecutive_failures: u32) -> Duration {
    let exponent = consecutive_failures.saturating_sub(1).min(16);
    let delay = policy.backoff_base.saturating_mul(1 << exponent);
    delay.min(policy.backoff_cap)
}

// =============================================================================
// PROBE
// =============================================================================

/// Outcome of one status request.
#[derive(Debug)]
pub enum Step<U, T> {
    /// Not terminal yet: optional counted progress plus a
    /// feature-specific update (a streamed chunk, a phase message).
    Running { progress: Option<Progress>, update: U },
    /// Terminal success.
    Done(T),
}

/// One pollable job: issues a single status request and parses it.
///
/// Probes never sleep and never retry; pacing belongs to [`drive`].
#[async_trait]
pub trait JobProbe: Send {
    /// Payload delivered alongside each non-terminal step.
    type Update: Send;
    /// Payload of the terminal success.
    type Output: Send;

    async fn poll(&mut self) -> Result<Step<Self::Update, Self::Output>, ClientError>;
}

// =============================================================================
// DRIVER
// =============================================================================

/// Drive `probe` until the job is terminal.
///
/// `job` is the live record: status and progress are written in place as
/// responses arrive, and `on_update` sees the record next to each
/// non-terminal update. The first status request fires one interval
/// after entry; each later one waits for the prior response plus the
/// interval. After this returns, no further request is issued.
pub async fn drive<P: JobProbe>(
    probe: &mut P,
    job: &mut Job,
    policy: &PollPolicy,
    mut on_update: impl FnMut(&Job, P::Update) + Send,
) -> Result<P::Output, ClientError> {
    let mut polls: u32 = 0;
    let mut consecutive_failures: u32 = 0;
    let mut next_delay = policy.interval;

    info!(kind = %job.kind, id = %job.id, "polling started");
    loop {
        if let Some(max_polls) = policy.max_polls {
            if polls >= max_polls {
                let err = ClientError::PollBudgetExhausted { polls };
                job.status = JobStatus::Failed;
                job.error = Some(err.to_string());
                warn!(kind = %job.kind, id = %job.id, polls, "poll budget exhausted");
                return Err(err);
            }
        }

        tokio::time::sleep(next_delay).await;
        polls += 1;

        match probe.poll().await {
            Ok(Step::Running { progress, update }) => {
                consecutive_failures = 0;
                next_delay = policy.interval;
                job.status = JobStatus::Processing;
                if let Some(progress) = progress {
                    job.progress = Some(progress);
                    debug!(
                        kind = %job.kind,
                        id = %job.id,
                        percent = progress.percent(),
                        "job progress"
                    );
                }
                on_update(job, update);
            }
            Ok(Step::Done(output)) => {
                job.status = JobStatus::Completed;
                info!(kind = %job.kind, id = %job.id, polls, "job completed");
                return Ok(output);
            }
            Err(e) if e.retryable() && consecutive_failures < policy.max_retries => {
                consecutive_failures += 1;
                next_delay = backoff_delay(policy, consecutive_failures);
                warn!(
                    kind = %job.kind,
                    id = %job.id,
                    error = %e,
                    attempt = consecutive_failures,
                    delay_ms = next_delay.as_millis() as u64,
                    "status request failed, backing off"
                );
            }
            Err(e) => {
                let err = if e.retryable() {
                    ClientError::RetriesExhausted {
                        attempts: consecutive_failures + 1,
                        source: Box::new(e),
                    }
                } else {
                    e
                };
                job.status = JobStatus::Failed;
                job.error = Some(err.to_string());
                warn!(
                    kind = %job.kind,
                    id = %job.id,
                    code = err.error_code(),
                    error = %err,
                    "job failed"
                );
                return Err(err);
            }
        }
    }
}

#[cfg(test)]
#[path = "poll_test.rs"]
mod tests;
