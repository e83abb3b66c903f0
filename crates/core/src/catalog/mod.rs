//! Static stage catalogs for each artifact kind.
//!
//! A catalog is the fixed, ordered list of production stages an artifact
//! moves through. Stages are either automatic (an out-of-process worker
//! picks them up from a work queue) or review (a human edits and resubmits).
//! Status labels are an explicit table rather than being derived from stage
//! names at runtime, so stored statuses can never drift from the catalog.

use serde::{Deserialize, Serialize};

/// Kind of artifact moving through a pipeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Course,
    Lecture,
    Lab,
    Podcast,
    Document,
}

impl ArtifactKind {
    /// Returns the kind as a string (for logging and storage).
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Course => "course",
            ArtifactKind::Lecture => "lecture",
            ArtifactKind::Lab => "lab",
            ArtifactKind::Podcast => "podcast",
            ArtifactKind::Document => "document",
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a stage is machine-processed or awaits human review.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StageMode {
    /// Processed by an external worker via the stage's work queue.
    Automatic,
    /// Waits for a human to review and explicitly resubmit.
    Review,
}

/// One named step in an artifact's production sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    /// Position in the catalog, contiguous from 0.
    pub index: usize,
    /// Stage name; doubles as the storage namespace and queue name.
    pub name: &'static str,
    pub mode: StageMode,
    /// Human-readable status label shown while the artifact sits here.
    pub label: &'static str,
}

impl Stage {
    pub fn is_automatic(&self) -> bool {
        self.mode == StageMode::Automatic
    }
}

/// Stage definition before index assignment.
type StageDef = (&'static str, StageMode, &'static str);

use StageMode::{Automatic, Review};

const COURSE_STAGES: &[StageDef] = &[
    ("raw_resources", Automatic, "Raw Resources"),
    ("in_content_generation_queue", Automatic, "In Content Generation Queue"),
    ("pre_processed_content", Review, "Content Review"),
    ("post_processed_content", Automatic, "Content Ready"),
    ("in_structure_generation_queue", Automatic, "In Structure Generation Queue"),
    ("pre_processed_structure", Review, "Structure Review"),
    ("post_processed_structure", Automatic, "Structure Ready"),
    ("in_deliverables_generation_queue", Automatic, "In Deliverables Generation Queue"),
    ("pre_processed_deliverables", Review, "Deliverables Review"),
    ("post_processed_deliverables", Automatic, "Deliverables Ready"),
    ("in_publishing_queue", Automatic, "In Publishing Queue"),
    ("published", Review, "Published"),
];

// Lectures stop after deliverables; publishing is handled at course level.
const LECTURE_STAGES: &[StageDef] = &[
    ("raw_resources", Automatic, "Raw Resources"),
    ("in_content_generation_queue", Automatic, "In Content Generation Queue"),
    ("pre_processed_content", Review, "Content Review"),
    ("post_processed_content", Automatic, "Content Ready"),
    ("in_structure_generation_queue", Automatic, "In Structure Generation Queue"),
    ("pre_processed_structure", Review, "Structure Review"),
    ("post_processed_structure", Automatic, "Structure Ready"),
    ("in_deliverables_generation_queue", Automatic, "In Deliverables Generation Queue"),
    ("pre_processed_deliverables", Review, "Deliverables Review"),
    ("post_processed_deliverables", Automatic, "Deliverables Ready"),
];

const LAB_STAGES: &[StageDef] = &[
    ("raw_resources", Automatic, "Raw Resources"),
    ("idea", Review, "Idea Review"),
    ("business_use_case", Automatic, "In Business Use Case Queue"),
    ("technical_specifications", Review, "Technical Specifications Review"),
    ("review_project", Automatic, "In Project Review Queue"),
    ("deliverables", Automatic, "Deliverables Ready"),
];

const DOCUMENT_STAGES: &[StageDef] = &[
    ("raw_resources", Automatic, "Raw Resources"),
    ("in_content_generation_queue", Automatic, "In Content Generation Queue"),
    ("pre_processed_content", Review, "Content Review"),
    ("post_processed_content", Automatic, "Content Ready"),
    ("in_publishing_queue", Automatic, "In Publishing Queue"),
    ("published", Review, "Published"),
];

/// Ordered, immutable stage list for one artifact kind.
#[derive(Debug, Clone)]
pub struct StageCatalog {
    kind: ArtifactKind,
    stages: Vec<Stage>,
}

impl StageCatalog {
    /// Returns the catalog for the given artifact kind.
    pub fn for_kind(kind: ArtifactKind) -> Self {
        let defs = match kind {
            ArtifactKind::Course | ArtifactKind::Podcast => COURSE_STAGES,
            ArtifactKind::Lecture => LECTURE_STAGES,
            ArtifactKind::Lab => LAB_STAGES,
            ArtifactKind::Document => DOCUMENT_STAGES,
        };
        let stages = defs
            .iter()
            .enumerate()
            .map(|(index, &(name, mode, label))| Stage {
                index,
                name,
                mode,
                label,
            })
            .collect();
        Self { kind, stages }
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Returns the stage at `index`, or None if out of catalog bounds.
    pub fn stage(&self, index: usize) -> Option<&Stage> {
        self.stages.get(index)
    }

    /// Returns the stage with the given name.
    pub fn stage_by_name(&self, name: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.name == name)
    }

    /// The raw-input stage artifacts are created into.
    pub fn raw_stage(&self) -> &Stage {
        &self.stages[0]
    }

    /// The terminal stage of this catalog.
    pub fn last_stage(&self) -> &Stage {
        &self.stages[self.stages.len() - 1]
    }

    pub fn stages(&self) -> impl Iterator<Item = &Stage> {
        self.stages.iter()
    }

    /// Automatic stages strictly after `index`, in order. These are the
    /// stages whose queued work becomes stale when `index` is resubmitted.
    pub fn automatic_stages_after(&self, index: usize) -> impl Iterator<Item = &Stage> {
        self.stages
            .iter()
            .skip(index + 1)
            .filter(|s| s.is_automatic())
    }

    /// All stages strictly after `index`, in order.
    pub fn stages_after(&self, index: usize) -> impl Iterator<Item = &Stage> {
        self.stages.iter().skip(index + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_catalog_shape() {
        let catalog = StageCatalog::for_kind(ArtifactKind::Course);
        assert_eq!(catalog.len(), 12);
        assert_eq!(catalog.raw_stage().name, "raw_resources");
        assert_eq!(catalog.last_stage().name, "published");
        assert_eq!(catalog.last_stage().mode, StageMode::Review);
    }

    #[test]
    fn test_indices_are_contiguous() {
        for kind in [
            ArtifactKind::Course,
            ArtifactKind::Lecture,
            ArtifactKind::Lab,
            ArtifactKind::Podcast,
            ArtifactKind::Document,
        ] {
            let catalog = StageCatalog::for_kind(kind);
            for (i, stage) in catalog.stages().enumerate() {
                assert_eq!(stage.index, i);
            }
            assert_eq!(catalog.raw_stage().index, 0);
        }
    }

    #[test]
    fn test_podcast_matches_course() {
        let course = StageCatalog::for_kind(ArtifactKind::Course);
        let podcast = StageCatalog::for_kind(ArtifactKind::Podcast);
        assert_eq!(course.len(), podcast.len());
        for (a, b) in course.stages().zip(podcast.stages()) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.mode, b.mode);
        }
    }

    #[test]
    fn test_lecture_has_no_publishing() {
        let catalog = StageCatalog::for_kind(ArtifactKind::Lecture);
        assert_eq!(catalog.len(), 10);
        assert!(catalog.stage_by_name("in_publishing_queue").is_none());
        assert!(catalog.stage_by_name("published").is_none());
    }

    #[test]
    fn test_stage_lookup() {
        let catalog = StageCatalog::for_kind(ArtifactKind::Course);
        let stage = catalog.stage(4).unwrap();
        assert_eq!(stage.name, "in_structure_generation_queue");
        assert!(stage.is_automatic());
        assert_eq!(stage.label, "In Structure Generation Queue");
        assert!(catalog.stage(12).is_none());
    }

    #[test]
    fn test_automatic_stages_after() {
        let catalog = StageCatalog::for_kind(ArtifactKind::Course);
        // After pre_processed_content (2): everything automatic downstream.
        let names: Vec<&str> = catalog.automatic_stages_after(2).map(|s| s.name).collect();
        assert_eq!(
            names,
            vec![
                "post_processed_content",
                "in_structure_generation_queue",
                "post_processed_structure",
                "in_deliverables_generation_queue",
                "post_processed_deliverables",
                "in_publishing_queue",
            ]
        );
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&ArtifactKind::Course).unwrap();
        assert_eq!(json, "\"course\"");
        let kind: ArtifactKind = serde_json::from_str("\"podcast\"").unwrap();
        assert_eq!(kind, ArtifactKind::Podcast);
    }

    #[test]
    fn test_labels_are_static() {
        let catalog = StageCatalog::for_kind(ArtifactKind::Lab);
        assert_eq!(catalog.stage(1).unwrap().label, "Idea Review");
        assert_eq!(catalog.stage(2).unwrap().label, "In Business Use Case Queue");
    }
}
