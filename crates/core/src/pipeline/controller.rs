use std::sync::Arc;

use crate::artifact::{Artifact, ArtifactStore, Resource};
use crate::catalog::{Stage, StageCatalog};
use crate::events::{EventChannel, EventMessage};
use crate::metrics;
use crate::migrate::{MigrationReport, ResourceMigrator};
use crate::queue::{WorkItem, WorkQueue};

use super::PipelineError;

/// A request to move one artifact or sub-unit to a target stage.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub artifact_id: String,
    /// Scope of the submission: a sub-unit's pipeline or the artifact's own.
    pub sub_unit_id: Option<String>,
    /// Catalog index of the stage to move to.
    pub target_stage: usize,
    pub instructions: Option<String>,
    pub submitted_by: String,
}

/// Result of an accepted submission.
#[derive(Debug)]
pub struct SubmitOutcome {
    pub artifact: Artifact,
    pub migration: MigrationReport,
}

/// Orchestrates stage transitions.
///
/// A submission is accepted even when some resource copies fail; the target
/// stage then holds only the resources that made it, and resubmitting the
/// same stage retries the rest. Store and queue writes are not transactional
/// across each other, so the queue is written before the artifact document:
/// a crash in between leaves a stale work item, which the next submission's
/// invalidation sweep clears.
pub struct PipelineController {
    artifacts: Arc<dyn ArtifactStore>,
    queue: Arc<dyn WorkQueue>,
    migrator: ResourceMigrator,
    events: Option<EventChannel>,
}

impl PipelineController {
    pub fn new(
        artifacts: Arc<dyn ArtifactStore>,
        queue: Arc<dyn WorkQueue>,
        migrator: ResourceMigrator,
    ) -> Self {
        Self {
            artifacts,
            queue,
            migrator,
            events: None,
        }
    }

    /// Announce transitions on `channel`.
    pub fn with_events(mut self, channel: EventChannel) -> Self {
        self.events = Some(channel);
        self
    }

    fn load(&self, artifact_id: &str) -> Result<Artifact, PipelineError> {
        self.artifacts
            .get(artifact_id)?
            .ok_or_else(|| PipelineError::ArtifactNotFound(artifact_id.to_string()))
    }

    fn check_sub_unit(artifact: &Artifact, sub_unit_id: Option<&str>) -> Result<(), PipelineError> {
        if let Some(id) = sub_unit_id {
            if artifact.sub_unit(id).is_none() {
                return Err(PipelineError::SubUnitNotFound(id.to_string()));
            }
        }
        Ok(())
    }

    /// Move a submission target's scope to `target_stage`.
    ///
    /// Everything past the target is invalidated first: queued work items at
    /// downstream automatic stages are removed and downstream staged
    /// resources are dropped, blobs included. Then the predecessor stage's
    /// resources are copied into the target directory, and if the target is
    /// automatic a work item is enqueued for it.
    pub async fn submit_for_stage(
        &self,
        request: SubmitRequest,
    ) -> Result<SubmitOutcome, PipelineError> {
        let mut artifact = self.load(&request.artifact_id)?;
        let catalog = StageCatalog::for_kind(artifact.kind);
        let sub_unit = request.sub_unit_id.as_deref();
        Self::check_sub_unit(&artifact, sub_unit)?;

        let target = *catalog
            .stage(request.target_stage)
            .ok_or(PipelineError::InvalidStage {
                kind: artifact.kind,
                index: request.target_stage,
                len: catalog.len(),
            })?;
        if target.index == 0 {
            return Err(PipelineError::NoPredecessor(target.name.to_string()));
        }
        let source = *catalog
            .stage(target.index - 1)
            .ok_or_else(|| PipelineError::NoPredecessor(target.name.to_string()))?;

        tracing::info!(
            artifact_id = %artifact.id,
            sub_unit = ?sub_unit,
            kind = %artifact.kind,
            stage = target.name,
            "submitting for stage"
        );

        self.invalidate_downstream(&mut artifact, &catalog, target.index, sub_unit)
            .await?;

        artifact.set_status(sub_unit, target.label);
        match sub_unit {
            Some(id) => {
                if let Some(sub) = artifact.sub_unit_mut(id) {
                    sub.last_instructions = request.instructions.clone();
                }
            }
            None => artifact.last_instructions = request.instructions.clone(),
        }

        let migration = self
            .stage_resources(&mut artifact, sub_unit, &source, &target)
            .await;

        if target.is_automatic() {
            self.queue.upsert(
                target.name,
                WorkItem::new(
                    artifact.id.clone(),
                    request.sub_unit_id.clone(),
                    request.instructions.clone(),
                ),
            )?;
        }

        artifact.touch();
        self.artifacts.update(&artifact)?;
        metrics::PIPELINE_SUBMISSIONS
            .with_label_values(&[artifact.kind.as_str(), target.name])
            .inc();

        if let Some(events) = &self.events {
            events.publish(EventMessage::task_update(
                request.submitted_by,
                request.sub_unit_id.clone(),
                Some(artifact.id.clone()),
                target.label,
            ));
        }

        Ok(SubmitOutcome {
            artifact,
            migration,
        })
    }

    /// Pull a published artifact back to its pre-publishing stage.
    ///
    /// The published resources move back into the predecessor stage if it
    /// lost them, the published directory is discarded, and any stale
    /// publishing work item is removed.
    pub async fn submit_for_unpublish(
        &self,
        artifact_id: &str,
        sub_unit_id: Option<&str>,
        submitted_by: &str,
    ) -> Result<Artifact, PipelineError> {
        let mut artifact = self.load(artifact_id)?;
        let catalog = StageCatalog::for_kind(artifact.kind);
        Self::check_sub_unit(&artifact, sub_unit_id)?;

        let published = *catalog.last_stage();
        if published.name != "published" {
            return Err(PipelineError::NotPublishable(artifact.kind));
        }
        let target = *catalog
            .stage(published.index - 1)
            .ok_or_else(|| PipelineError::NoPredecessor(published.name.to_string()))?;

        tracing::info!(artifact_id, sub_unit = ?sub_unit_id, "unpublishing");

        let staged = artifact
            .staged_mut(sub_unit_id)
            .ok_or_else(|| PipelineError::SubUnitNotFound(sub_unit_id.unwrap_or("").to_string()))?;
        let published_resources = staged.remove(published.name).unwrap_or_default();
        let target_is_empty = staged
            .get(target.name)
            .map(Vec::is_empty)
            .unwrap_or(true);

        if target_is_empty && !published_resources.is_empty() {
            let report = self
                .migrator
                .migrate(
                    artifact_id,
                    sub_unit_id,
                    &published_resources,
                    published.name,
                    target.name,
                )
                .await;
            let restored = Self::relocated(
                &self.migrator,
                artifact_id,
                sub_unit_id,
                &published_resources,
                &report,
                &target,
            );
            if let Some(staged) = artifact.staged_mut(sub_unit_id) {
                staged.insert(target.name.to_string(), restored);
            }
        }

        self.migrator
            .discard(artifact_id, sub_unit_id, &published_resources, published.name)
            .await;
        self.queue.remove(target.name, artifact_id, sub_unit_id)?;

        artifact.set_status(sub_unit_id, target.label);
        artifact.touch();
        self.artifacts.update(&artifact)?;

        if let Some(events) = &self.events {
            events.publish(EventMessage::task_update(
                submitted_by,
                sub_unit_id.map(String::from),
                Some(artifact.id.clone()),
                target.label,
            ));
        }

        Ok(artifact)
    }

    /// Replace the staged resource list at a review stage with a reviewer's
    /// edits, recording the prior content as a new history version.
    pub fn save_review(
        &self,
        artifact_id: &str,
        sub_unit_id: Option<&str>,
        stage_index: usize,
        resources: Vec<Resource>,
        content: Option<String>,
    ) -> Result<Artifact, PipelineError> {
        let mut artifact = self.load(artifact_id)?;
        let catalog = StageCatalog::for_kind(artifact.kind);
        Self::check_sub_unit(&artifact, sub_unit_id)?;

        let stage = *catalog
            .stage(stage_index)
            .ok_or(PipelineError::InvalidStage {
                kind: artifact.kind,
                index: stage_index,
                len: catalog.len(),
            })?;
        if stage.is_automatic() {
            return Err(PipelineError::NotReviewStage(stage.name.to_string()));
        }

        if let Some(staged) = artifact.staged_mut(sub_unit_id) {
            staged.insert(stage.name.to_string(), resources);
        }
        if let Some(content) = content {
            let version = artifact.push_version(content);
            tracing::debug!(artifact_id, version, "recorded content version");
        }

        artifact.touch();
        self.artifacts.update(&artifact)?;
        Ok(artifact)
    }

    async fn invalidate_downstream(
        &self,
        artifact: &mut Artifact,
        catalog: &StageCatalog,
        target_index: usize,
        sub_unit: Option<&str>,
    ) -> Result<(), PipelineError> {
        for stage in catalog.automatic_stages_after(target_index) {
            if self.queue.remove(stage.name, &artifact.id, sub_unit)? {
                tracing::debug!(
                    artifact_id = %artifact.id,
                    stage = stage.name,
                    "removed stale work item"
                );
            }
        }

        let mut dropped: Vec<(&'static str, Vec<Resource>)> = Vec::new();
        if let Some(staged) = artifact.staged_mut(sub_unit) {
            for stage in catalog.stages_after(target_index) {
                if let Some(resources) = staged.remove(stage.name) {
                    dropped.push((stage.name, resources));
                }
            }
        }
        let artifact_id = artifact.id.clone();
        for (stage_name, resources) in &dropped {
            self.migrator
                .discard(&artifact_id, sub_unit, resources, stage_name)
                .await;
            metrics::PIPELINE_INVALIDATIONS.inc();
        }
        Ok(())
    }

    /// Copy the source stage's resources to the target directory and record
    /// the arrivals as the target's staged list.
    async fn stage_resources(
        &self,
        artifact: &mut Artifact,
        sub_unit: Option<&str>,
        source: &Stage,
        target: &Stage,
    ) -> MigrationReport {
        let artifact_id = artifact.id.clone();
        let source_resources = artifact
            .staged_for(sub_unit)
            .and_then(|s| s.get(source.name))
            .cloned()
            .unwrap_or_default();

        let report = self
            .migrator
            .migrate(
                &artifact_id,
                sub_unit,
                &source_resources,
                source.name,
                target.name,
            )
            .await;
        metrics::RESOURCES_MIGRATED.inc_by(report.migrated.len() as u64);
        metrics::MIGRATION_FAILURES.inc_by(report.failed.len() as u64);

        let arrived = Self::relocated(
            &self.migrator,
            &artifact_id,
            sub_unit,
            &source_resources,
            &report,
            target,
        );
        if let Some(staged) = artifact.staged_mut(sub_unit) {
            staged.insert(target.name.to_string(), arrived);
        }
        report
    }

    /// The subset of `resources` that reached `target`, with blob locations
    /// rewritten to the target directory.
    fn relocated(
        migrator: &ResourceMigrator,
        artifact_id: &str,
        sub_unit: Option<&str>,
        resources: &[Resource],
        report: &MigrationReport,
        target: &Stage,
    ) -> Vec<Resource> {
        resources
            .iter()
            .filter(|r| report.migrated.contains(&r.name))
            .cloned()
            .map(|mut r| {
                if r.resource_type.has_blob() {
                    r.location = migrator.location(artifact_id, sub_unit, target.name, &r.name);
                }
                r
            })
            .collect()
    }
}
