use axum::{extract::State, http::StatusCode, Json};
use sched_core::validate;
use serde::Serialize;
use tracing::info;
use types::GenerateRequest;
use utoipa::ToSchema;

use crate::{error::ApiError, state::AppState};

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobCreated {
    pub job_id: String,
    pub status: &'static str,
}

#[utoipa::path(
    post,
    path = "/v1/generate",
    request_body = GenerateRequest,
    responses(
        (status = 202, description = "Generation job enqueued", body = JobCreated),
        (status = 400, description = "Request failed validation")
    )
)]
pub async fn generate(
    State(state): State<AppState>,
    Json(mut req): Json<GenerateRequest>,
) -> Result<(StatusCode, Json<JobCreated>), ApiError> {
    validate(&req)?;
    state.config.clamp(&mut req.params);
    info!(
        sessions = req.sessions.len(),
        population = req.params.population_size,
        generations = req.params.generations,
        "enqueueing generation"
    );
    let id = state.jobs.enqueue(req);
    Ok((
        StatusCode::ACCEPTED,
        Json(JobCreated {
            job_id: id.0,
            status: "queued",
        }),
    ))
}
