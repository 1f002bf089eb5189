use axum::Json;
use sched_core::{validate, ValidationError};
use serde::Serialize;
use types::GenerateRequest;

#[derive(Serialize, utoipa::ToSchema)]
pub struct ValidationReport {
    pub ok: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_result(res: Result<(), ValidationError>) -> Self {
        match res {
            Ok(()) => Self {
                ok: true,
                errors: vec![],
            },
            Err(ValidationError::Msg(msg)) => Self {
                ok: false,
                errors: msg
                    .split(';')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
        }
    }
}

#[utoipa::path(
    post,
    path = "/v1/validate",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Every problem found in a generation request", body = ValidationReport)
    )
)]
pub async fn validate_handler(Json(req): Json<GenerateRequest>) -> Json<ValidationReport> {
    Json(ValidationReport::from_result(validate(&req)))
}
