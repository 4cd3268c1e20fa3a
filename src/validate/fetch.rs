//! Evidence fetch seam.

use async_trait::async_trait;
use thiserror::Error;

/// Failure modes of a single artifact read.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The artifact could not be read this tick; treated as not yet
    /// written and retried on the next tick.
    #[error("artifact not available: {0}")]
    Unavailable(String),
    /// The per-call deadline elapsed before the remote side answered.
    #[error("per-call fetch deadline exceeded")]
    DeadlineExceeded,
    /// The remote side reports the workload itself is gone.
    #[error("workload gone: {0}")]
    Gone(String),
}

/// Read capability for evidence artifacts, one file per call.
///
/// Implementations own their per-call deadline; it is independent of the
/// validator's overall timeout.
#[async_trait]
pub trait ArtifactFetcher: Send + Sync {
    async fn fetch(&self, file_name: &str) -> Result<Vec<u8>, FetchError>;
}
