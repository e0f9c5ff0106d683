use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::core::error::{ConfigError, PollError, TransportError};
use crate::core::types::ProviderJob;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;
pub const DEFAULT_MAX_CONSECUTIVE_TRANSPORT_FAILURES: u32 = 3;

/// Fixed-interval polling schedule with bounded tolerance for transient
/// transport errors. The overall deadline stays with the caller; the policy
/// never extends it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval_ms: u64,
    pub max_consecutive_transport_failures: u32,
}

impl PollPolicy {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_ms == 0 {
            return Err(ConfigError::InvalidPollPolicy {
                reason: "interval_ms must be at least 1".to_string(),
            });
        }
        if self.max_consecutive_transport_failures < 3 {
            return Err(ConfigError::InvalidPollPolicy {
                reason: "max_consecutive_transport_failures must be at least 3".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_consecutive_transport_failures: DEFAULT_MAX_CONSECUTIVE_TRANSPORT_FAILURES,
        }
    }
}

/// Source of job status observations, one remote call per `fetch_status`.
#[async_trait]
pub trait JobStatusSource: Send + Sync {
    async fn fetch_status(&self, job_id: &str) -> Result<ProviderJob, TransportError>;
}

#[derive(Debug, Clone)]
pub struct JobPoller {
    policy: PollPolicy,
}

impl JobPoller {
    pub fn new(policy: PollPolicy) -> Result<Self, ConfigError> {
        policy.validate()?;
        Ok(Self { policy })
    }

    /// Drives `source` until the job reaches a terminal status or the
    /// deadline elapses. The initial status counts as the first observation;
    /// the source is queried once per observed non-terminal state and never
    /// after a terminal status or a detected deadline. A failing fetch keeps
    /// the loop alive until the consecutive-failure tolerance is spent; any
    /// successful fetch resets it.
    pub async fn wait_for_terminal(
        &self,
        initial: ProviderJob,
        source: &dyn JobStatusSource,
        deadline: Instant,
    ) -> Result<ProviderJob, PollError> {
        let interval = Duration::from_millis(self.policy.interval_ms);
        let mut job = initial;
        let mut polls: u32 = 0;
        let mut consecutive_failures: u32 = 0;

        while !job.status.is_terminal() {
            let wake = deadline.min(Instant::now() + interval);
            tokio::time::sleep_until(tokio::time::Instant::from_std(wake)).await;
            if Instant::now() >= deadline {
                return Err(PollError::DeadlineExceeded { polls });
            }

            polls += 1;
            match source.fetch_status(&job.id).await {
                Ok(next) => {
                    debug!(job_id = %next.id, status = ?next.status, "observed job status");
                    consecutive_failures = 0;
                    job = next;
                }
                Err(error) => {
                    consecutive_failures += 1;
                    warn!(
                        job_id = %job.id,
                        consecutive_failures,
                        error = %error,
                        "job status check failed"
                    );
                    if consecutive_failures >= self.policy.max_consecutive_transport_failures {
                        return Err(PollError::TransportExhausted {
                            consecutive_failures,
                            last_error: error.to_string(),
                        });
                    }
                }
            }
        }

        Ok(job)
    }
}
