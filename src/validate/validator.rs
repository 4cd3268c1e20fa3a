//! Evidence polling loop.
//!
//! Drives `Polling -> {Success | Timeout}`: an immediate first tick, then
//! one tick per poll interval until every expected artifact is confirmed or
//! the overall deadline passes. Each tick recomputes the residual set from
//! scratch, so a flaky once-missing-then-present artifact never leaves a
//! stale entry.

use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::probe::evidence::EvidenceId;
use crate::validate::clock::Clock;
use crate::validate::fetch::{ArtifactFetcher, FetchError};

/// Why an artifact is still in the residual set after a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResidualCause {
    /// The fetch failed; the artifact is treated as not yet written.
    Missing(String),
    /// The per-call deadline elapsed while the overall timeout had not.
    /// A communication failure rather than a routine not-yet-written miss.
    DeadlineExceeded,
    /// The workload the artifact lives in is gone.
    WorkloadGone(String),
    /// The artifact exists but its trimmed content differs from the
    /// expected content.
    ContentMismatch { found: String },
}

/// One still-unconfirmed artifact with its cause tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResidualEntry {
    pub id: EvidenceId,
    pub cause: ResidualCause,
}

/// Terminal verdict of a validation run. There are no other terminal
/// states and no cooperative early-cancel path.
#[derive(Debug)]
pub enum ValidationResult {
    /// Every expected artifact was confirmed.
    Complete,
    /// The overall timeout elapsed; `residual` holds what was still
    /// missing or mismatched on the final tick.
    TimedOut { residual: Vec<ResidualEntry> },
}

impl ValidationResult {
    pub fn is_complete(&self) -> bool {
        matches!(self, ValidationResult::Complete)
    }
}

/// Poll-loop knobs. The per-call fetch deadline is a separate knob owned
/// by the [`ArtifactFetcher`] implementation.
#[derive(Debug, Clone)]
pub struct ValidatorOptions {
    pub poll_interval: Duration,
    pub timeout: Duration,
    /// When set, a fetched artifact must match this exact trimmed content.
    /// By default only presence is checked.
    pub expected_content: Option<String>,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            timeout: Duration::from_secs(600),
            expected_content: None,
        }
    }
}

/// Polls evidence artifacts through an injected fetch capability until all
/// are confirmed or the overall timeout elapses.
pub struct EvidenceValidator<F, C> {
    fetcher: F,
    clock: C,
    options: ValidatorOptions,
}

impl<F, C> EvidenceValidator<F, C>
where
    F: ArtifactFetcher,
    C: Clock,
{
    pub fn new(fetcher: F, clock: C, options: ValidatorOptions) -> Self {
        Self {
            fetcher,
            clock,
            options,
        }
    }

    /// Runs the poll loop over `ids` to a terminal verdict.
    pub async fn validate(&self, ids: &[EvidenceId]) -> ValidationResult {
        let deadline = self.clock.now() + self.options.timeout;
        let mut ticks = 0u32;

        loop {
            ticks += 1;
            let residual = self.tick(ids).await;
            if residual.is_empty() {
                info!(ticks, expected = ids.len(), "all evidence artifacts confirmed");
                return ValidationResult::Complete;
            }

            warn!(
                ticks,
                pending = residual.len(),
                ids = ?residual.iter().map(|entry| entry.id.to_string()).collect::<Vec<_>>(),
                "lookups still unconfirmed"
            );

            if self.clock.now() >= deadline {
                return ValidationResult::TimedOut { residual };
            }
            self.clock.sleep(self.options.poll_interval).await;
        }
    }

    /// One atomic tick: fetch every ID concurrently, join at the tick
    /// boundary, and rebuild the residual set from the outcomes.
    async fn tick(&self, ids: &[EvidenceId]) -> Vec<ResidualEntry> {
        let fetches = ids.iter().map(|id| async move {
            let outcome = self.fetcher.fetch(&id.to_string()).await;
            (id, outcome)
        });

        let mut residual = Vec::new();
        for (id, outcome) in join_all(fetches).await {
            match outcome {
                Ok(bytes) => {
                    if let Some(expected) = &self.options.expected_content {
                        let content = String::from_utf8_lossy(&bytes);
                        let found = content.trim();
                        if found != expected.as_str() {
                            debug!(id = %id, found, expected = %expected, "artifact present with unexpected content");
                            residual.push(ResidualEntry {
                                id: id.clone(),
                                cause: ResidualCause::ContentMismatch {
                                    found: found.to_string(),
                                },
                            });
                        }
                    }
                }
                Err(FetchError::DeadlineExceeded) => {
                    warn!(id = %id, "fetch deadline exceeded");
                    residual.push(ResidualEntry {
                        id: id.clone(),
                        cause: ResidualCause::DeadlineExceeded,
                    });
                }
                Err(FetchError::Gone(detail)) => {
                    warn!(id = %id, detail = %detail, "workload gone");
                    residual.push(ResidualEntry {
                        id: id.clone(),
                        cause: ResidualCause::WorkloadGone(detail),
                    });
                }
                Err(FetchError::Unavailable(detail)) => {
                    debug!(id = %id, detail = %detail, "artifact not yet readable");
                    residual.push(ResidualEntry {
                        id: id.clone(),
                        cause: ResidualCause::Missing(detail),
                    });
                }
            }
        }
        residual
    }
}
