use std::{
    cell::Cell,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use backon::BlockingRetryable;

use crate::params::Options;
use crate::signature::SignatureParams;

use super::client::ApiClient;
use super::errors::ApiClientError;
use super::models::JobStatusResponse;
use super::transport::Transport;

pub const MAX_POLL_ATTEMPTS: u32 = 20;

/// How long and how often the job status is polled.
///
/// Waits two units before each of the first three queries and four units
/// before every later one, for at most `max_attempts` queries. With the
/// defaults the worst case is 74 seconds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollPolicy {
    pub unit: Duration,
    pub max_attempts: u32,
    /// Stop polling once the next wait would end past this much time.
    pub deadline: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            unit: Duration::from_secs(1),
            max_attempts: MAX_POLL_ATTEMPTS,
            deadline: None,
        }
    }
}

impl PollPolicy {
    /// Wait before the given query, counting from 1.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 3 {
            self.unit * 2
        } else {
            self.unit * 4
        }
    }

    pub fn schedule(&self) -> PollSchedule {
        PollSchedule {
            policy: self.clone(),
            attempt: 0,
            waited: Duration::ZERO,
            started: Instant::now(),
        }
    }
}

/// The waits of one poll sequence, one per query.
#[derive(Clone, Debug)]
pub struct PollSchedule {
    policy: PollPolicy,
    attempt: u32,
    waited: Duration,
    started: Instant,
}

impl Iterator for PollSchedule {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.attempt >= self.policy.max_attempts.max(1) {
            return None;
        }
        let delay = self.policy.delay_before(self.attempt + 1);
        if let Some(deadline) = self.policy.deadline {
            if self.started.elapsed().max(self.waited) + delay > deadline {
                log::debug!("Poll deadline of {deadline:?} reached");
                return None;
            }
        }
        self.attempt += 1;
        self.waited += delay;
        Some(delay)
    }
}

/// Stops a running poll before its next query.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// How a poll ended. Running out of attempts is not an error.
#[derive(Clone, Debug, PartialEq)]
pub enum PollOutcome {
    Complete(JobStatusResponse),
    /// The last status seen, still incomplete.
    GaveUp(JobStatusResponse),
}

impl PollOutcome {
    pub const fn response(&self) -> &JobStatusResponse {
        match self {
            Self::Complete(response) | Self::GaveUp(response) => response,
        }
    }

    pub fn into_response(self) -> JobStatusResponse {
        match self {
            Self::Complete(response) | Self::GaveUp(response) => response,
        }
    }

    pub const fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }
}

enum Status {
    InProgress(Box<JobStatusResponse>),
    Finished(ApiClientError),
}

const fn is_in_progress(status: &Status) -> bool {
    match status {
        Status::InProgress(_) => true,
        Status::Finished(_) => false,
    }
}

/// Queries the job status until the job completes, the attempts run out,
/// the deadline passes or `cancel` fires.
///
/// The same signature is used for every query.
///
/// # Errors
///
/// Will return `Err` on network error, on a non-2xx answer, on a response
/// whose signature does not verify, or when cancelled. None of these are
/// retried.
pub fn poll_job_status<T: Transport>(
    api: &ApiClient<T>,
    user_id: &str,
    job_id: &str,
    options: &Options,
    signature: &SignatureParams,
    cancel: &CancelToken,
) -> Result<PollOutcome, ApiClientError> {
    let attempts = Cell::new(0_u32);

    let fetch = || -> Result<PollOutcome, Status> {
        if cancel.is_cancelled() {
            log::info!("Polling of job {job_id} cancelled");
            return Err(Status::Finished(ApiClientError::Cancelled(
                job_id.to_owned(),
            )));
        }
        attempts.set(attempts.get() + 1);
        let response = api
            .query_job_status(user_id, job_id, options, signature)
            .map_err(Status::Finished)?;

        if response.job_complete {
            Ok(PollOutcome::Complete(response))
        } else {
            Err(Status::InProgress(Box::new(response)))
        }
    };

    let mut schedule = api.poll_policy().schedule();
    // The first query also waits
    thread::sleep(schedule.next().unwrap_or_default());

    let outcome = fetch
        .retry(schedule)
        .when(is_in_progress)
        .notify(|_, dur: Duration| {
            log::info!(
                "Job: {job_id} not complete after {} queries, retrying in {dur:?}",
                attempts.get()
            );
        })
        .call()
        .or_else(|status| match status {
            Status::InProgress(response) => {
                log::warn!(
                    "Job: {job_id} still not complete after {} queries, giving up",
                    attempts.get()
                );
                Ok(PollOutcome::GaveUp(*response))
            }
            Status::Finished(e) => Err(e),
        })?;

    log::info!("Job: {job_id} polled {} times", attempts.get());
    Ok(outcome)
}
