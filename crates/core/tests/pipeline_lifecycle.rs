use std::sync::Arc;
use std::time::Duration;

use atelier_core::artifact::{Artifact, ArtifactStore, Resource, ResourceType, SqliteArtifactStore, SubUnit};
use atelier_core::catalog::ArtifactKind;
use atelier_core::events::{EventChannel, EventMessage};
use atelier_core::migrate::ResourceMigrator;
use atelier_core::pipeline::{PipelineController, PipelineError, SubmitRequest};
use atelier_core::queue::{SqliteWorkQueue, WorkItem, WorkQueue};
use atelier_core::testing::MemoryObjectStore;

struct Harness {
    artifacts: Arc<SqliteArtifactStore>,
    queue: Arc<SqliteWorkQueue>,
    objects: Arc<MemoryObjectStore>,
    events: EventChannel,
    controller: PipelineController,
}

impl Harness {
    fn new() -> Self {
        let artifacts = Arc::new(SqliteArtifactStore::in_memory().unwrap());
        let queue = Arc::new(SqliteWorkQueue::in_memory().unwrap());
        let objects = Arc::new(MemoryObjectStore::new());
        let events = EventChannel::default();
        let migrator = ResourceMigrator::new(objects.clone(), "artifacts");
        let controller = PipelineController::new(artifacts.clone(), queue.clone(), migrator)
            .with_events(events.clone());
        Self {
            artifacts,
            queue,
            objects,
            events,
            controller,
        }
    }

    /// A course with one sub-unit holding two raw resources (one with a
    /// blob, one external link). Returns (artifact_id, sub_unit_id).
    fn seed_course(&self) -> (String, String) {
        let mut artifact = Artifact::new(ArtifactKind::Course, "Quant Finance 101", "");
        let sub = SubUnit::new("Module 1", "intro");
        let sub_id = sub.id.clone();
        artifact.sub_units.push(sub);

        let notes = Resource::new(ResourceType::Note, "notes.md", "", "");
        let link = Resource::new(ResourceType::Link, "syllabus", "", "https://example.com/syllabus");
        self.objects.put(
            &format!("artifacts/{}/{}/raw_resources/notes.md", artifact.id, sub_id),
            b"lecture notes",
        );
        artifact
            .sub_unit_mut(&sub_id)
            .unwrap()
            .staged
            .insert("raw_resources".into(), vec![notes, link]);

        self.artifacts.insert(&artifact).unwrap();
        (artifact.id, sub_id)
    }

    fn submit(
        &self,
        artifact_id: &str,
        sub_unit_id: &str,
        target_stage: usize,
        instructions: Option<&str>,
    ) -> SubmitRequest {
        SubmitRequest {
            artifact_id: artifact_id.to_string(),
            sub_unit_id: Some(sub_unit_id.to_string()),
            target_stage,
            instructions: instructions.map(String::from),
            submitted_by: "alice".to_string(),
        }
    }

    fn reload(&self, artifact_id: &str) -> Artifact {
        self.artifacts.get(artifact_id).unwrap().unwrap()
    }
}

#[tokio::test]
async fn test_submit_advances_status_and_migrates_resources() {
    let h = Harness::new();
    let (artifact_id, sub_id) = h.seed_course();

    let outcome = h
        .controller
        .submit_for_stage(h.submit(&artifact_id, &sub_id, 1, Some("use chapter 3")))
        .await
        .unwrap();
    assert!(outcome.migration.is_complete());

    let artifact = h.reload(&artifact_id);
    let sub = artifact.sub_unit(&sub_id).unwrap();
    assert_eq!(sub.status, "In Content Generation Queue");
    assert_eq!(sub.last_instructions.as_deref(), Some("use chapter 3"));

    // Both resources arrive at the target stage; the blob moved, the link
    // kept its external location.
    let staged = &sub.staged["in_content_generation_queue"];
    assert_eq!(staged.len(), 2);
    let notes = staged.iter().find(|r| r.name == "notes.md").unwrap();
    assert_eq!(
        notes.location,
        format!("artifacts/{artifact_id}/{sub_id}/in_content_generation_queue/notes.md")
    );
    let link = staged.iter().find(|r| r.name == "syllabus").unwrap();
    assert_eq!(link.location, "https://example.com/syllabus");

    // Source stage stays intact.
    assert_eq!(sub.staged["raw_resources"].len(), 2);
    assert!(h
        .objects
        .keys()
        .contains(&format!("artifacts/{artifact_id}/{sub_id}/raw_resources/notes.md")));

    // The automatic target got exactly one work item.
    let items = h.queue.list("in_content_generation_queue").unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].artifact_id, artifact_id);
    assert_eq!(items[0].sub_unit_id.as_deref(), Some(sub_id.as_str()));
    assert_eq!(items[0].instructions.as_deref(), Some("use chapter 3"));
}

#[tokio::test]
async fn test_resubmit_replaces_work_item_instead_of_duplicating() {
    let h = Harness::new();
    let (artifact_id, sub_id) = h.seed_course();

    h.controller
        .submit_for_stage(h.submit(&artifact_id, &sub_id, 1, Some("first pass")))
        .await
        .unwrap();
    h.controller
        .submit_for_stage(h.submit(&artifact_id, &sub_id, 1, Some("shorter this time")))
        .await
        .unwrap();

    let items = h.queue.list("in_content_generation_queue").unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].instructions.as_deref(), Some("shorter this time"));
}

#[tokio::test]
async fn test_resubmit_invalidates_downstream_stages() {
    let h = Harness::new();
    let (artifact_id, sub_id) = h.seed_course();

    // Pretend the pipeline already ran ahead: staged content at stages 2
    // and 3, plus a queued item at stage 4.
    let mut artifact = h.reload(&artifact_id);
    let stale = Resource::new(ResourceType::File, "draft.md", "", "");
    h.objects.put(
        &format!("artifacts/{artifact_id}/{sub_id}/pre_processed_content/draft.md"),
        b"stale draft",
    );
    let sub = artifact.sub_unit_mut(&sub_id).unwrap();
    sub.staged
        .insert("pre_processed_content".into(), vec![stale]);
    sub.staged.insert("post_processed_content".into(), vec![]);
    h.artifacts.update(&artifact).unwrap();
    h.queue
        .upsert(
            "in_structure_generation_queue",
            WorkItem::new(artifact_id.clone(), Some(sub_id.clone()), None),
        )
        .unwrap();

    h.controller
        .submit_for_stage(h.submit(&artifact_id, &sub_id, 1, None))
        .await
        .unwrap();

    let artifact = h.reload(&artifact_id);
    let sub = artifact.sub_unit(&sub_id).unwrap();
    assert!(!sub.staged.contains_key("pre_processed_content"));
    assert!(!sub.staged.contains_key("post_processed_content"));
    assert!(h
        .queue
        .get("in_structure_generation_queue", &artifact_id, Some(&sub_id))
        .unwrap()
        .is_none());
    // Stale downstream blob was discarded.
    assert!(!h.objects.keys().contains(&format!(
        "artifacts/{artifact_id}/{sub_id}/pre_processed_content/draft.md"
    )));
}

#[tokio::test]
async fn test_submit_to_raw_stage_is_rejected() {
    let h = Harness::new();
    let (artifact_id, sub_id) = h.seed_course();
    let result = h
        .controller
        .submit_for_stage(h.submit(&artifact_id, &sub_id, 0, None))
        .await;
    assert!(matches!(result, Err(PipelineError::NoPredecessor(_))));
}

#[tokio::test]
async fn test_submit_out_of_range_stage_is_rejected() {
    let h = Harness::new();
    let (artifact_id, sub_id) = h.seed_course();
    let result = h
        .controller
        .submit_for_stage(h.submit(&artifact_id, &sub_id, 12, None))
        .await;
    assert!(matches!(
        result,
        Err(PipelineError::InvalidStage { index: 12, len: 12, .. })
    ));
}

#[tokio::test]
async fn test_unknown_artifact_and_sub_unit_are_rejected() {
    let h = Harness::new();
    let (artifact_id, _) = h.seed_course();

    let result = h
        .controller
        .submit_for_stage(h.submit("missing", "m", 1, None))
        .await;
    assert!(matches!(result, Err(PipelineError::ArtifactNotFound(_))));

    let result = h
        .controller
        .submit_for_stage(h.submit(&artifact_id, "missing", 1, None))
        .await;
    assert!(matches!(result, Err(PipelineError::SubUnitNotFound(_))));
}

#[tokio::test]
async fn test_partial_migration_failure_is_reported_not_fatal() {
    let h = Harness::new();
    let (artifact_id, sub_id) = h.seed_course();
    h.objects.fail_key(&format!(
        "artifacts/{artifact_id}/{sub_id}/raw_resources/notes.md"
    ));

    let outcome = h
        .controller
        .submit_for_stage(h.submit(&artifact_id, &sub_id, 1, None))
        .await
        .unwrap();

    assert!(!outcome.migration.is_complete());
    assert_eq!(outcome.migration.failed.len(), 1);
    assert_eq!(outcome.migration.failed[0].resource.name, "notes.md");

    // Status still advanced; only the link made it into the target list.
    let artifact = h.reload(&artifact_id);
    let sub = artifact.sub_unit(&sub_id).unwrap();
    assert_eq!(sub.status, "In Content Generation Queue");
    let staged = &sub.staged["in_content_generation_queue"];
    assert_eq!(staged.len(), 1);
    assert_eq!(staged[0].name, "syllabus");
}

#[tokio::test]
async fn test_submit_publishes_task_update() {
    let h = Harness::new();
    let (artifact_id, sub_id) = h.seed_course();
    let mut rx = h.events.subscribe();

    h.controller
        .submit_for_stage(h.submit(&artifact_id, &sub_id, 1, None))
        .await
        .unwrap();

    let event = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .unwrap()
        .unwrap();
    match event {
        EventMessage::TaskUpdate {
            username,
            module_id,
            project_id,
            state,
        } => {
            assert_eq!(username, "alice");
            assert_eq!(module_id.as_deref(), Some(sub_id.as_str()));
            assert_eq!(project_id.as_deref(), Some(artifact_id.as_str()));
            assert_eq!(state, "In Content Generation Queue");
        }
        other => panic!("expected task update, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unpublish_restores_pre_publishing_stage() {
    let h = Harness::new();

    let mut artifact = Artifact::new(ArtifactKind::Document, "Whitepaper", "");
    artifact.status = "Published".to_string();
    let out = Resource::new(ResourceType::File, "paper.pdf", "", "");
    h.objects.put(
        &format!("artifacts/{}/published/paper.pdf", artifact.id),
        b"final",
    );
    artifact.staged.insert("published".into(), vec![out]);
    h.artifacts.insert(&artifact).unwrap();
    let artifact_id = artifact.id.clone();
    h.queue
        .upsert(
            "in_publishing_queue",
            WorkItem::new(artifact_id.clone(), None, None),
        )
        .unwrap();

    let updated = h
        .controller
        .submit_for_unpublish(&artifact_id, None, "alice")
        .await
        .unwrap();

    assert_eq!(updated.status, "In Publishing Queue");
    assert!(!updated.staged.contains_key("published"));
    let restored = &updated.staged["in_publishing_queue"];
    assert_eq!(restored.len(), 1);
    assert_eq!(
        restored[0].location,
        format!("artifacts/{artifact_id}/in_publishing_queue/paper.pdf")
    );

    let keys = h.objects.keys();
    assert!(keys.contains(&format!("artifacts/{artifact_id}/in_publishing_queue/paper.pdf")));
    assert!(!keys.contains(&format!("artifacts/{artifact_id}/published/paper.pdf")));
    assert!(h
        .queue
        .get("in_publishing_queue", &artifact_id, None)
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_unpublish_requires_a_published_stage() {
    let h = Harness::new();
    let artifact = Artifact::new(ArtifactKind::Lecture, "Standalone", "");
    h.artifacts.insert(&artifact).unwrap();

    let result = h.controller.submit_for_unpublish(&artifact.id, None, "alice").await;
    assert!(matches!(
        result,
        Err(PipelineError::NotPublishable(ArtifactKind::Lecture))
    ));
}

#[tokio::test]
async fn test_review_then_advance_then_roll_back() {
    let h = Harness::new();
    let (artifact_id, sub_id) = h.seed_course();

    // Walk to the content review stage.
    h.controller
        .submit_for_stage(h.submit(&artifact_id, &sub_id, 1, None))
        .await
        .unwrap();
    h.controller
        .submit_for_stage(h.submit(&artifact_id, &sub_id, 2, None))
        .await
        .unwrap();

    // Reviewer edits, then the submission advances past the review.
    let edited = vec![Resource::new(ResourceType::Note, "notes.md", "", "inline")];
    h.controller
        .save_review(&artifact_id, Some(&sub_id), 2, edited, None)
        .unwrap();
    h.controller
        .submit_for_stage(h.submit(&artifact_id, &sub_id, 3, None))
        .await
        .unwrap();
    h.controller
        .submit_for_stage(h.submit(&artifact_id, &sub_id, 4, None))
        .await
        .unwrap();

    let artifact = h.reload(&artifact_id);
    let sub = artifact.sub_unit(&sub_id).unwrap();
    assert_eq!(sub.status, "In Structure Generation Queue");
    assert!(sub.staged.contains_key("post_processed_content"));

    // Rolling back to the review stage clears everything past it.
    h.controller
        .submit_for_stage(h.submit(&artifact_id, &sub_id, 2, None))
        .await
        .unwrap();

    let artifact = h.reload(&artifact_id);
    let sub = artifact.sub_unit(&sub_id).unwrap();
    assert_eq!(sub.status, "Content Review");
    assert!(!sub.staged.contains_key("post_processed_content"));
    assert!(!sub.staged.contains_key("in_structure_generation_queue"));
    assert!(h
        .queue
        .get("in_structure_generation_queue", &artifact_id, Some(&sub_id))
        .unwrap()
        .is_none());
    // The review stage itself was rebuilt from stage 1's resources.
    assert!(sub.staged.contains_key("pre_processed_content"));
}

#[tokio::test]
async fn test_save_review_replaces_staged_list_and_versions_content() {
    let h = Harness::new();
    let (artifact_id, sub_id) = h.seed_course();

    let edited = vec![Resource::new(ResourceType::Note, "edited.md", "", "inline")];
    let updated = h
        .controller
        .save_review(
            &artifact_id,
            Some(&sub_id),
            2,
            edited,
            Some("revised outline".to_string()),
        )
        .unwrap();

    let sub = updated.sub_unit(&sub_id).unwrap();
    assert_eq!(sub.staged["pre_processed_content"].len(), 1);
    assert_eq!(updated.history.len(), 1);
    assert_eq!(updated.history[0].version, 1);
    assert_eq!(updated.history[0].content, "revised outline");

    let result = h
        .controller
        .save_review(&artifact_id, Some(&sub_id), 1, vec![], None);
    assert!(matches!(result, Err(PipelineError::NotReviewStage(_))));
}
