//! Core artifact data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::catalog::ArtifactKind;

/// Kind of content a resource holds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    File,
    Image,
    Note,
    /// External URL; has no blob in the object store.
    Link,
    Transcript,
}

impl ResourceType {
    /// Returns true if the resource's location points at a blob in the
    /// object store (as opposed to an external URL).
    pub fn has_blob(&self) -> bool {
        !matches!(self, ResourceType::Link)
    }
}

/// A piece of source or generated material staged at one pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Resource {
    /// Unique identifier (UUID).
    pub id: String,
    pub resource_type: ResourceType,
    /// Display name; also the final path segment of the storage key.
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Opaque handle into external storage (object-store key or URL).
    pub location: String,
}

impl Resource {
    pub fn new(
        resource_type: ResourceType,
        name: impl Into<String>,
        description: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            resource_type,
            name: name.into(),
            description: description.into(),
            location: location.into(),
        }
    }
}

/// One prior version of an artifact's content, kept append-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentVersion {
    /// Monotonically increasing, starting at 1.
    pub version: u32,
    pub timestamp: DateTime<Utc>,
    pub content: String,
}

/// Resources grouped by the stage name they are currently staged at.
pub type StagedResources = HashMap<String, Vec<Resource>>;

/// An independently-submittable part of an artifact (e.g. a course module).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubUnit {
    /// Unique identifier (UUID).
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Human-readable label of the stage this sub-unit sits at.
    pub status: String,
    /// Instructions given with the most recent submission.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_instructions: Option<String>,
    #[serde(default)]
    pub staged: StagedResources,
}

impl SubUnit {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: description.into(),
            status: "Not Submitted".to_string(),
            last_instructions: None,
            staged: StagedResources::new(),
        }
    }
}

/// The unit moving through the production pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Artifact {
    /// Unique identifier (UUID).
    pub id: String,
    pub kind: ArtifactKind,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Human-readable label of the stage the artifact sits at.
    pub status: String,
    /// Instructions given with the most recent artifact-level submission.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_instructions: Option<String>,
    /// Artifact-level staged resources (used when the kind has no sub-units
    /// or for artifact-wide stages).
    #[serde(default)]
    pub staged: StagedResources,
    #[serde(default)]
    pub sub_units: Vec<SubUnit>,
    /// Prior content versions, append-only.
    #[serde(default)]
    pub history: Vec<ContentVersion>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Artifact {
    pub fn new(kind: ArtifactKind, name: impl Into<String>, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            name: name.into(),
            description: description.into(),
            status: "In Design".to_string(),
            last_instructions: None,
            staged: StagedResources::new(),
            sub_units: Vec::new(),
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn sub_unit(&self, id: &str) -> Option<&SubUnit> {
        self.sub_units.iter().find(|s| s.id == id)
    }

    pub fn sub_unit_mut(&mut self, id: &str) -> Option<&mut SubUnit> {
        self.sub_units.iter_mut().find(|s| s.id == id)
    }

    /// Staged-resource map for the given scope: a sub-unit's when an id is
    /// given, the artifact's own otherwise. None if the sub-unit is unknown.
    pub fn staged_mut(&mut self, sub_unit_id: Option<&str>) -> Option<&mut StagedResources> {
        match sub_unit_id {
            Some(id) => self.sub_unit_mut(id).map(|s| &mut s.staged),
            None => Some(&mut self.staged),
        }
    }

    pub fn staged_for(&self, sub_unit_id: Option<&str>) -> Option<&StagedResources> {
        match sub_unit_id {
            Some(id) => self.sub_unit(id).map(|s| &s.staged),
            None => Some(&self.staged),
        }
    }

    /// Sets the status label on the given scope. Returns false if the
    /// sub-unit does not exist.
    pub fn set_status(&mut self, sub_unit_id: Option<&str>, status: &str) -> bool {
        match sub_unit_id {
            Some(id) => match self.sub_unit_mut(id) {
                Some(sub) => {
                    sub.status = status.to_string();
                    true
                }
                None => false,
            },
            None => {
                self.status = status.to_string();
                true
            }
        }
    }

    /// Appends a new content version with the next monotonic version number.
    pub fn push_version(&mut self, content: impl Into<String>) -> u32 {
        let version = self.history.last().map(|v| v.version + 1).unwrap_or(1);
        self.history.push(ContentVersion {
            version,
            timestamp: Utc::now(),
            content: content.into(),
        });
        version
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_version_is_monotonic() {
        let mut artifact = Artifact::new(ArtifactKind::Course, "Intro to Rust", "");
        assert_eq!(artifact.push_version("v1 outline"), 1);
        assert_eq!(artifact.push_version("v2 outline"), 2);
        assert_eq!(artifact.push_version("v3 outline"), 3);
        assert_eq!(artifact.history.len(), 3);
        assert!(artifact.history[0].timestamp <= artifact.history[2].timestamp);
    }

    #[test]
    fn test_set_status_scopes() {
        let mut artifact = Artifact::new(ArtifactKind::Course, "c", "");
        let sub = SubUnit::new("Module 1", "");
        let sub_id = sub.id.clone();
        artifact.sub_units.push(sub);

        assert!(artifact.set_status(None, "In Publishing Queue"));
        assert_eq!(artifact.status, "In Publishing Queue");

        assert!(artifact.set_status(Some(&sub_id), "Content Review"));
        assert_eq!(artifact.sub_unit(&sub_id).unwrap().status, "Content Review");

        assert!(!artifact.set_status(Some("missing"), "x"));
    }

    #[test]
    fn test_staged_scope_resolution() {
        let mut artifact = Artifact::new(ArtifactKind::Lecture, "l", "");
        let sub = SubUnit::new("part", "");
        let sub_id = sub.id.clone();
        artifact.sub_units.push(sub);

        artifact
            .staged_mut(None)
            .unwrap()
            .insert("raw_resources".into(), vec![]);
        assert!(artifact.staged.contains_key("raw_resources"));

        assert!(artifact.staged_mut(Some(&sub_id)).is_some());
        assert!(artifact.staged_mut(Some("missing")).is_none());
    }

    #[test]
    fn test_link_has_no_blob() {
        assert!(!ResourceType::Link.has_blob());
        assert!(ResourceType::File.has_blob());
        assert!(ResourceType::Transcript.has_blob());
    }

    #[test]
    fn test_artifact_serialization_roundtrip() {
        let mut artifact = Artifact::new(ArtifactKind::Podcast, "Episode 1", "pilot");
        artifact.staged.insert(
            "raw_resources".into(),
            vec![Resource::new(
                ResourceType::File,
                "script.md",
                "",
                "artifacts/x/raw_resources/script.md",
            )],
        );
        artifact.push_version("draft");

        let json = serde_json::to_string(&artifact).unwrap();
        let back: Artifact = serde_json::from_str(&json).unwrap();
        assert_eq!(back, artifact);
    }
}
