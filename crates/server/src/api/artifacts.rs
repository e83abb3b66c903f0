//! Artifact API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use atelier_core::artifact::{Artifact, ArtifactError, Resource, ResourceType, SubUnit};
use atelier_core::catalog::{ArtifactKind, StageCatalog};

use crate::state::AppState;

/// Error response body shared by the API modules.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl ToString) -> Self {
        Self {
            error: error.to_string(),
        }
    }
}

/// Request body for creating an artifact.
#[derive(Debug, Deserialize)]
pub struct CreateArtifactBody {
    pub kind: ArtifactKind,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sub_units: Vec<SubUnitBody>,
    /// Raw resources staged at the artifact level.
    #[serde(default)]
    pub resources: Vec<ResourceBody>,
}

#[derive(Debug, Deserialize)]
pub struct SubUnitBody {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Raw resources staged for this sub-unit.
    #[serde(default)]
    pub resources: Vec<ResourceBody>,
}

/// A resource in a request body. Location is the object-store key the
/// client uploaded the blob to, or the external URL for links.
#[derive(Debug, Deserialize)]
pub struct ResourceBody {
    pub resource_type: ResourceType,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
}

impl ResourceBody {
    pub fn into_resource(self) -> Resource {
        Resource::new(self.resource_type, self.name, self.description, self.location)
    }
}

fn into_resources(resources: Vec<ResourceBody>) -> Vec<Resource> {
    resources.into_iter().map(ResourceBody::into_resource).collect()
}

/// Create a new artifact with its raw resources.
pub async fn create_artifact(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateArtifactBody>,
) -> Result<(StatusCode, Json<Artifact>), (StatusCode, Json<ErrorResponse>)> {
    let catalog = StageCatalog::for_kind(body.kind);
    let raw_stage = catalog.raw_stage().name;

    let mut artifact = Artifact::new(body.kind, body.name, body.description);
    if !body.resources.is_empty() {
        artifact
            .staged
            .insert(raw_stage.to_string(), into_resources(body.resources));
    }
    for sub_body in body.sub_units {
        let mut sub = SubUnit::new(sub_body.name, sub_body.description);
        if !sub_body.resources.is_empty() {
            sub.staged
                .insert(raw_stage.to_string(), into_resources(sub_body.resources));
        }
        artifact.sub_units.push(sub);
    }

    match state.artifacts().insert(&artifact) {
        Ok(()) => Ok((StatusCode::CREATED, Json(artifact))),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(e)),
        )),
    }
}

/// Get an artifact by ID.
pub async fn get_artifact(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Artifact>, impl IntoResponse> {
    match state.artifacts().get(&id) {
        Ok(Some(artifact)) => Ok(Json(artifact)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!("Artifact not found: {}", id))),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(e)),
        )),
    }
}

/// List all artifacts.
pub async fn list_artifacts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Artifact>>, (StatusCode, Json<ErrorResponse>)> {
    match state.artifacts().list() {
        Ok(artifacts) => Ok(Json(artifacts)),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(e)),
        )),
    }
}

/// Delete an artifact, returning the deleted document.
pub async fn delete_artifact(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Artifact>, impl IntoResponse> {
    match state.artifacts().delete(&id) {
        Ok(artifact) => Ok(Json(artifact)),
        Err(ArtifactError::NotFound(_)) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!("Artifact not found: {}", id))),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(e)),
        )),
    }
}
