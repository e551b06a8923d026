/// Confirmation polling for spawned processes
///
/// A spawned process is only usable once the query service indexes it.
/// Polling is an explicit state machine advanced once per attempt, with the
/// delay supplied by a `Sleeper` so tests run without wall-clock waits.
use crate::{
    error::{UploadError, UploadResult},
    gql::{AssetIdentifier, QueryService},
    metrics,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Waits between attempts
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Fixed-delay retry policy, no jitter or growth
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            delay: Duration::from_millis(2000),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    Pending { attempts: u32 },
    Found(AssetIdentifier),
    Exhausted { attempts: u32 },
}

impl PollState {
    pub fn start() -> Self {
        PollState::Pending { attempts: 0 }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollState::Pending { .. })
    }

    /// Advance after one attempt; `found` is the id returned by the query,
    /// if any. Terminal states do not change.
    pub fn advance(self, found: Option<AssetIdentifier>, policy: &PollPolicy) -> Self {
        match self {
            PollState::Pending { attempts } => match found {
                Some(id) => PollState::Found(id),
                None if attempts + 1 >= policy.attempts => PollState::Exhausted {
                    attempts: attempts + 1,
                },
                None => PollState::Pending {
                    attempts: attempts + 1,
                },
            },
            terminal => terminal,
        }
    }
}

/// Poll `gateway` until `process_id` is visible. Every attempt waits
/// `policy.delay` first. A failed query counts as a miss.
pub async fn await_process(
    query: &dyn QueryService,
    gateway: &str,
    process_id: &str,
    policy: &PollPolicy,
    sleeper: &dyn Sleeper,
) -> UploadResult<AssetIdentifier> {
    let ids = vec![process_id.to_string()];
    let mut state = PollState::start();

    loop {
        sleeper.sleep(policy.delay).await;

        let found = match query.fetch_by_ids(gateway, &ids).await {
            Ok(records) => {
                let found = records.into_iter().next().map(|record| record.id);
                metrics::record_poll_attempt(if found.is_some() { "found" } else { "missing" });
                found
            }
            Err(e) => {
                warn!("Query for process {} failed: {}", process_id, e);
                metrics::record_poll_attempt("error");
                None
            }
        };

        state = state.advance(found, policy);
        match &state {
            PollState::Found(id) => {
                info!("Fetched transaction {}", id);
                return Ok(id.clone());
            }
            PollState::Exhausted { attempts } => {
                warn!("Transaction {} not found after {} attempts", process_id, attempts);
                return Err(UploadError::PollExhausted {
                    process_id: process_id.to_string(),
                    attempts: *attempts,
                });
            }
            PollState::Pending { attempts } => {
                debug!("Transaction not found {} (attempt {})", process_id, attempts);
            }
        }
    }
}
