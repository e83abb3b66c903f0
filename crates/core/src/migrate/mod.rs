//! Resource relocation between stage directories.
//!
//! Staged blobs live in an object store under keys shaped
//! `{prefix}/{artifact}/{sub_unit}/{stage}/{name}`. Advancing a submission
//! copies each resource's blob from the source stage directory into the
//! target one; invalidation deletes the directories past the target stage.
//! Copies are forward-only so a source stage stays intact and a failed
//! submission can simply be retried.

mod migrator;
mod object_store;

pub use migrator::{MigrationFailure, MigrationReport, ResourceMigrator};
pub use object_store::{FsObjectStore, ObjectStore, ObjectStoreError};
