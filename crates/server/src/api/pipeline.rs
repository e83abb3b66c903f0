//! Pipeline API handlers: submit, unpublish, review.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use atelier_core::artifact::Artifact;
use atelier_core::catalog::StageCatalog;
use atelier_core::migrate::MigrationReport;
use atelier_core::pipeline::{PipelineError, SubmitRequest};

use super::artifacts::{ErrorResponse, ResourceBody};
use crate::state::AppState;

/// Request body for submitting to a stage.
#[derive(Debug, Deserialize)]
pub struct SubmitBody {
    pub sub_unit_id: Option<String>,
    pub target_stage: usize,
    pub instructions: Option<String>,
    pub username: String,
}

/// Request body for unpublishing.
#[derive(Debug, Deserialize)]
pub struct UnpublishBody {
    pub sub_unit_id: Option<String>,
    /// If given, must match the catalog's published stage index.
    pub published_stage: Option<usize>,
    pub username: String,
}

/// Request body for saving review edits.
#[derive(Debug, Deserialize)]
pub struct ReviewBody {
    pub sub_unit_id: Option<String>,
    pub stage: usize,
    pub resources: Vec<ResourceBody>,
    /// When given, appended to the artifact's version history.
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MigrationSummary {
    pub migrated: Vec<String>,
    pub failed: Vec<FailedResource>,
}

#[derive(Debug, Serialize)]
pub struct FailedResource {
    pub name: String,
    pub error: String,
}

impl From<&MigrationReport> for MigrationSummary {
    fn from(report: &MigrationReport) -> Self {
        Self {
            migrated: report.migrated.clone(),
            failed: report
                .failed
                .iter()
                .map(|f| FailedResource {
                    name: f.resource.name.clone(),
                    error: f.error.to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub artifact: Artifact,
    pub migration: MigrationSummary,
}

fn error_status(error: &PipelineError) -> StatusCode {
    match error {
        PipelineError::ArtifactNotFound(_) | PipelineError::SubUnitNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        PipelineError::InvalidStage { .. }
        | PipelineError::NoPredecessor(_)
        | PipelineError::NotPublishable(_)
        | PipelineError::NotReviewStage(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PipelineError::Store(_) | PipelineError::Queue(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn map_error(error: PipelineError) -> (StatusCode, Json<ErrorResponse>) {
    (error_status(&error), Json(ErrorResponse::new(error)))
}

/// Submit an artifact or sub-unit for a stage.
pub async fn submit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<SubmitBody>,
) -> Result<Json<SubmitResponse>, (StatusCode, Json<ErrorResponse>)> {
    let request = SubmitRequest {
        artifact_id: id,
        sub_unit_id: body.sub_unit_id,
        target_stage: body.target_stage,
        instructions: body.instructions,
        submitted_by: body.username,
    };

    let outcome = state
        .controller()
        .submit_for_stage(request)
        .await
        .map_err(map_error)?;

    Ok(Json(SubmitResponse {
        migration: MigrationSummary::from(&outcome.migration),
        artifact: outcome.artifact,
    }))
}

/// Pull a published artifact back to its pre-publishing stage.
pub async fn unpublish(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<UnpublishBody>,
) -> Result<Json<Artifact>, (StatusCode, Json<ErrorResponse>)> {
    // An explicit published_stage must agree with the kind's catalog.
    if let Some(index) = body.published_stage {
        let artifact = state
            .artifacts()
            .get(&id)
            .map_err(|e| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::new(e)),
                )
            })?
            .ok_or_else(|| {
                (
                    StatusCode::NOT_FOUND,
                    Json(ErrorResponse::new(format!("Artifact not found: {}", id))),
                )
            })?;
        let catalog = StageCatalog::for_kind(artifact.kind);
        if index != catalog.last_stage().index {
            return Err((
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ErrorResponse::new(format!(
                    "Stage {} is not the published stage for {}",
                    index, artifact.kind
                ))),
            ));
        }
    }

    let artifact = state
        .controller()
        .submit_for_unpublish(&id, body.sub_unit_id.as_deref(), &body.username)
        .await
        .map_err(map_error)?;

    Ok(Json(artifact))
}

/// Save a reviewer's edits at a review stage.
pub async fn save_review(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<ReviewBody>,
) -> Result<Json<Artifact>, (StatusCode, Json<ErrorResponse>)> {
    let resources = body
        .resources
        .into_iter()
        .map(ResourceBody::into_resource)
        .collect();

    let artifact = state
        .controller()
        .save_review(
            &id,
            body.sub_unit_id.as_deref(),
            body.stage,
            resources,
            body.content,
        )
        .map_err(map_error)?;

    Ok(Json(artifact))
}
