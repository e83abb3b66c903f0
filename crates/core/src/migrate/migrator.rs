use std::sync::Arc;

use crate::artifact::Resource;

use super::{ObjectStore, ObjectStoreError};

/// One resource that could not be moved, with the storage error that stopped it.
#[derive(Debug)]
pub struct MigrationFailure {
    pub resource: Resource,
    pub error: ObjectStoreError,
}

/// Outcome of moving one staged resource list between stage directories.
///
/// Migration is best-effort per resource: a failed copy is recorded here and
/// does not abort the rest of the batch.
#[derive(Debug, Default)]
pub struct MigrationReport {
    /// Names of resources now present at the target stage.
    pub migrated: Vec<String>,
    pub failed: Vec<MigrationFailure>,
}

impl MigrationReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.migrated.is_empty() && self.failed.is_empty()
    }
}

/// Copies resource blobs between per-stage directories of the object store.
#[derive(Clone)]
pub struct ResourceMigrator {
    store: Arc<dyn ObjectStore>,
    prefix: String,
}

impl ResourceMigrator {
    pub fn new(store: Arc<dyn ObjectStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    /// Object key for one resource at one stage.
    pub fn location(
        &self,
        artifact_id: &str,
        sub_unit_id: Option<&str>,
        stage: &str,
        name: &str,
    ) -> String {
        match sub_unit_id {
            Some(sub_unit) => format!(
                "{}/{}/{}/{}/{}",
                self.prefix, artifact_id, sub_unit, stage, name
            ),
            None => format!("{}/{}/{}/{}", self.prefix, artifact_id, stage, name),
        }
    }

    /// Copy each resource's blob from `from_stage` to `to_stage`.
    ///
    /// Resources with no blob (links) are reported as migrated without
    /// touching storage. The source directory is left in place.
    pub async fn migrate(
        &self,
        artifact_id: &str,
        sub_unit_id: Option<&str>,
        resources: &[Resource],
        from_stage: &str,
        to_stage: &str,
    ) -> MigrationReport {
        let mut report = MigrationReport::default();
        for resource in resources {
            if !resource.resource_type.has_blob() {
                report.migrated.push(resource.name.clone());
                continue;
            }
            let from = self.location(artifact_id, sub_unit_id, from_stage, &resource.name);
            let to = self.location(artifact_id, sub_unit_id, to_stage, &resource.name);
            match self.store.copy(&from, &to).await {
                Ok(()) => report.migrated.push(resource.name.clone()),
                Err(error) => {
                    tracing::warn!(
                        artifact_id,
                        resource = %resource.name,
                        from_stage,
                        to_stage,
                        %error,
                        "resource migration failed"
                    );
                    report.failed.push(MigrationFailure {
                        resource: resource.clone(),
                        error,
                    });
                }
            }
        }
        report
    }

    /// Best-effort removal of each resource's blob at `stage`.
    ///
    /// Used when invalidating stages past a resubmission target. Delete
    /// failures are logged and swallowed; a stale blob is harmless because
    /// the staged lists are authoritative.
    pub async fn discard(
        &self,
        artifact_id: &str,
        sub_unit_id: Option<&str>,
        resources: &[Resource],
        stage: &str,
    ) {
        for resource in resources {
            if !resource.resource_type.has_blob() {
                continue;
            }
            let key = self.location(artifact_id, sub_unit_id, stage, &resource.name);
            if let Err(error) = self.store.delete(&key).await {
                tracing::warn!(
                    artifact_id,
                    resource = %resource.name,
                    stage,
                    %error,
                    "resource discard failed"
                );
            }
        }
    }
}
