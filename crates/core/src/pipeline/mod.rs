//! Pipeline controller: stage transitions, cascading invalidation, and
//! work-item scheduling.

mod controller;

pub use controller::{PipelineController, SubmitOutcome, SubmitRequest};

use crate::artifact::ArtifactError;
use crate::catalog::ArtifactKind;
use crate::queue::QueueError;

/// Error type for pipeline operations.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// No artifact with this id.
    #[error("Artifact not found: {0}")]
    ArtifactNotFound(String),

    /// The artifact exists but has no such sub-unit.
    #[error("Sub-unit not found: {0}")]
    SubUnitNotFound(String),

    /// Stage index outside the kind's catalog.
    #[error("Stage {index} out of range for {kind} (catalog has {len} stages)")]
    InvalidStage {
        kind: ArtifactKind,
        index: usize,
        len: usize,
    },

    /// The stage has no predecessor to take resources from.
    #[error("Stage '{0}' has no predecessor stage")]
    NoPredecessor(String),

    /// The kind's catalog does not end in a published stage.
    #[error("{0} artifacts cannot be unpublished")]
    NotPublishable(ArtifactKind),

    /// The stage is not a review stage.
    #[error("Stage '{0}' is not a review stage")]
    NotReviewStage(String),

    #[error(transparent)]
    Store(#[from] ArtifactError),

    #[error(transparent)]
    Queue(#[from] QueueError),
}
