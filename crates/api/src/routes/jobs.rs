use axum::{
    extract::{Path, State},
    Json,
};
use jobs::JobStatus;
use serde::Serialize;
use types::GenerateResult;
use utoipa::ToSchema;

use crate::{error::ApiError, state::AppState};

fn not_found(id: &str) -> ApiError {
    ApiError::NotFound(format!("job {id} not found"))
}

#[utoipa::path(
    get,
    path = "/v1/jobs/{id}",
    params(("id" = String, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Job status", body = JobStatus),
        (status = 404, description = "Unknown job")
    )
)]
pub async fn status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobStatus>, ApiError> {
    state.jobs.get(&id).map(Json).ok_or_else(|| not_found(&id))
}

#[utoipa::path(
    get,
    path = "/v1/jobs/{id}/result",
    params(("id" = String, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Generated timetable", body = GenerateResult),
        (status = 404, description = "Unknown job"),
        (status = 409, description = "Job has no timetable yet, or never will")
    )
)]
pub async fn result(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GenerateResult>, ApiError> {
    match state.jobs.get(&id) {
        Some(JobStatus::Generated { result }) => Ok(Json(result)),
        Some(JobStatus::Failed { message }) => Err(ApiError::Conflict(message)),
        Some(JobStatus::Cancelled) => Err(ApiError::Conflict(format!("job {id} was cancelled"))),
        Some(_) => Err(ApiError::Conflict(format!("job {id} is not ready"))),
        None => Err(not_found(&id)),
    }
}

#[derive(Serialize, ToSchema)]
pub struct CancelOut {
    /// `false` when the job had already finished.
    pub cancelled: bool,
}

#[utoipa::path(
    post,
    path = "/v1/jobs/{id}/cancel",
    params(("id" = String, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Stop requested; a running search keeps its best timetable", body = CancelOut),
        (status = 404, description = "Unknown job")
    )
)]
pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CancelOut>, ApiError> {
    if state.jobs.get(&id).is_none() {
        return Err(not_found(&id));
    }
    Ok(Json(CancelOut {
        cancelled: state.jobs.cancel(&id),
    }))
}
