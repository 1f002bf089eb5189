use std::collections::BTreeMap;

use axum::Json;
use sched_core::{EvalOptions, Evaluator};
use serde::Serialize;
use types::{EvaluateRequest, Violation, ViolationKind};
use utoipa::ToSchema;

use crate::error::ApiError;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateOut {
    /// `0` for a timetable that breaks nothing, negative otherwise.
    pub fitness_score: i64,
    pub hard_violations: usize,
    pub counts: BTreeMap<ViolationKind, usize>,
    pub violations: Vec<Violation>,
}

#[utoipa::path(
    post,
    path = "/v1/evaluate",
    request_body = EvaluateRequest,
    responses(
        (status = 200, description = "Fitness score and violation breakdown", body = EvaluateOut),
        (status = 400, description = "Malformed times or slots")
    )
)]
pub async fn evaluate(Json(req): Json<EvaluateRequest>) -> Result<Json<EvaluateOut>, ApiError> {
    let settings = req.settings.with_defaults();
    let evaluator = Evaluator::new(&req.rooms, EvalOptions::from(&settings))?;
    let evaluation = evaluator.evaluate(&req.schedule)?;
    Ok(Json(EvaluateOut {
        fitness_score: evaluation.score,
        hard_violations: evaluation.hard_count(),
        counts: evaluation.counts(),
        violations: evaluation.violations,
    }))
}
