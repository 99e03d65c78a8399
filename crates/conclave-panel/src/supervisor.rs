//! The supervisor wrapper: retry, backoff, and call statistics.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::backend::{BackendError, ModelBackend};
use crate::error::EvalError;
use crate::proposal::Proposal;
use crate::verdict::Verdict;

/// Retry configuration for transient provider failures.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Multiplier applied to the delay after each retry.
    pub multiplier: f64,
    /// Total attempts, including the first.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(250),
            multiplier: 2.0,
            max_attempts: 3,
        }
    }
}

/// One independent judge: a named wrapper around a model backend.
///
/// Owns its retry/backoff behavior and per-call latency statistics. The
/// supervisor itself is immutable and shared via `Arc`; mutable state
/// (base weight, performance record) lives in the registry.
pub struct Supervisor {
    name: String,
    specialties: BTreeSet<String>,
    backend: Arc<dyn ModelBackend>,
    retry: RetryPolicy,
    calls: AtomicU64,
    total_latency_ms: AtomicU64,
}

impl Supervisor {
    /// Creates a supervisor over the given backend with default retry.
    pub fn new(name: impl Into<String>, backend: Arc<dyn ModelBackend>) -> Self {
        Self {
            name: name.into(),
            specialties: BTreeSet::new(),
            backend,
            retry: RetryPolicy::default(),
            calls: AtomicU64::new(0),
            total_latency_ms: AtomicU64::new(0),
        }
    }

    /// Adds a specialty tag, e.g. `"frontend"`.
    pub fn with_specialty(mut self, tag: impl Into<String>) -> Self {
        self.specialties.insert(tag.into());
        self
    }

    /// Replaces the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The supervisor's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Provider tag of the wrapped backend.
    pub fn provider(&self) -> &str {
        self.backend.provider()
    }

    /// Specialty tags this supervisor claims.
    pub fn specialties(&self) -> &BTreeSet<String> {
        &self.specialties
    }

    /// Number of backend attempts made across all debates.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    /// Mean end-to-end latency per successful evaluation, in milliseconds.
    pub fn mean_latency_ms(&self) -> f64 {
        let calls = self.calls.load(Ordering::Relaxed);
        if calls == 0 {
            return 0.0;
        }
        self.total_latency_ms.load(Ordering::Relaxed) as f64 / calls as f64
    }

    /// Asks the backend for a verdict, retrying transient failures.
    ///
    /// A decisive reply (even a rejection) is returned immediately and never
    /// retried. Transient errors back off exponentially per the retry
    /// policy. Exceeding `deadline` or the retry budget yields an
    /// [`EvalError`], which callers treat as an abstention. The deadline
    /// cancels only the wait: an in-flight provider call keeps running
    /// detached and its late reply is discarded.
    ///
    /// Must be called inside a tokio runtime; each attempt runs as a
    /// spawned task.
    pub async fn evaluate(
        &self,
        proposal: &Proposal,
        deadline: Duration,
    ) -> Result<Verdict, EvalError> {
        let started = Instant::now();
        let mut delay = self.retry.base_delay;
        let mut last_error = String::new();

        for attempt in 1..=self.retry.max_attempts {
            let Some(remaining) = deadline.checked_sub(started.elapsed()) else {
                return Err(EvalError::DeadlineExceeded {
                    supervisor: self.name.clone(),
                });
            };
            self.calls.fetch_add(1, Ordering::Relaxed);

            let backend = Arc::clone(&self.backend);
            let call = {
                let proposal = proposal.clone();
                tokio::spawn(async move { backend.ask(&proposal).await })
            };
            match tokio::time::timeout(remaining, call).await {
                Ok(Ok(Ok(reply))) => {
                    let elapsed = started.elapsed().as_millis() as u64;
                    self.total_latency_ms.fetch_add(elapsed, Ordering::Relaxed);
                    debug!(
                        supervisor = %self.name,
                        approved = reply.approved,
                        latency_ms = elapsed,
                        "verdict received"
                    );
                    return Ok(Verdict::new(
                        &self.name,
                        reply.approved,
                        reply.confidence,
                        reply.rationale,
                    ));
                }
                Ok(Ok(Err(err))) if err.is_transient() && attempt < self.retry.max_attempts => {
                    last_error = err.to_string();
                    warn!(
                        supervisor = %self.name,
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %last_error,
                        "transient provider error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay = delay.mul_f64(self.retry.multiplier);
                }
                Ok(Ok(Err(BackendError::Transient(message)))) => {
                    return Err(EvalError::RetriesExhausted {
                        attempts: attempt,
                        last_error: message,
                    });
                }
                Ok(Ok(Err(BackendError::Fatal(message)))) => {
                    return Err(EvalError::Provider {
                        provider: self.backend.provider().to_string(),
                        message,
                    });
                }
                Ok(Err(join_err)) => {
                    return Err(EvalError::Provider {
                        provider: self.backend.provider().to_string(),
                        message: join_err.to_string(),
                    });
                }
                // Timing out drops the join handle, not the call; the
                // backend finishes on its own and the reply is ignored.
                Err(_) => {
                    return Err(EvalError::DeadlineExceeded {
                        supervisor: self.name.clone(),
                    });
                }
            }
        }

        Err(EvalError::RetriesExhausted {
            attempts: self.retry.max_attempts,
            last_error,
        })
    }
}

impl fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supervisor")
            .field("name", &self.name)
            .field("provider", &self.backend.provider())
            .field("specialties", &self.specialties)
            .finish()
    }
}
