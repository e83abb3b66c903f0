//! Artifact storage trait.

use super::Artifact;

/// Error type for artifact store operations.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// Artifact not found.
    #[error("Artifact not found: {0}")]
    NotFound(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Trait for artifact document storage backends.
///
/// The pipeline controller only needs get/update by id; the remaining
/// operations back the surrounding CRUD routes.
pub trait ArtifactStore: Send + Sync {
    /// Insert a new artifact document.
    fn insert(&self, artifact: &Artifact) -> Result<(), ArtifactError>;

    /// Get an artifact by id.
    fn get(&self, id: &str) -> Result<Option<Artifact>, ArtifactError>;

    /// Replace an existing artifact document.
    fn update(&self, artifact: &Artifact) -> Result<(), ArtifactError>;

    /// Delete an artifact. Returns the deleted artifact if found.
    fn delete(&self, id: &str) -> Result<Artifact, ArtifactError>;

    /// List all artifacts.
    fn list(&self) -> Result<Vec<Artifact>, ArtifactError>;
}
