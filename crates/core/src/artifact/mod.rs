//! Artifact data model and document storage.

mod sqlite;
mod store;
mod types;

pub use sqlite::SqliteArtifactStore;
pub use store::{ArtifactError, ArtifactStore};
pub use types::{Artifact, ContentVersion, Resource, ResourceType, StagedResources, SubUnit};
