mod config;
mod error;
mod state;
mod telemetry;
pub mod routes {
    pub mod evaluate;
    pub mod generate;
    pub mod health;
    pub mod jobs;
    pub mod validate;
}

use axum::{
    routing::{get, post},
    Router,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::ServerConfig, state::AppState};

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::health::health,
        routes::validate::validate_handler,
        routes::evaluate::evaluate,
        routes::generate::generate,
        routes::jobs::status,
        routes::jobs::result,
        routes::jobs::cancel,
    ),
    components(schemas(
        types::Day, types::SlotPreference, types::TimePreference, types::TeacherPreference,
        types::Subject, types::Room, types::TimeSlot, types::Session, types::ScheduledSession,
        types::BalanceEntity, types::ConstraintSettings, types::GenerateParams,
        types::GenerateRequest, types::EvaluateRequest, types::ViolationKind, types::Severity,
        types::Violation, types::GenerationStatus, types::GenerationConfig, types::GenerateResult,
        types::TeacherId, types::GroupId, types::RoomId, types::SubjectId,
        jobs::JobId, jobs::JobStatus,
        routes::health::Health,
        routes::validate::ValidationReport,
        routes::evaluate::EvaluateOut,
        routes::generate::JobCreated,
        routes::jobs::CancelOut,
    )),
    tags(
        (name = "timetable", description = "Timetable evaluation and generation API")
    )
)]
struct ApiDoc;

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/v1/health", get(routes::health::health))
        .route("/v1/validate", post(routes::validate::validate_handler))
        .route("/v1/evaluate", post(routes::evaluate::evaluate))
        .route("/v1/generate", post(routes::generate::generate))
        .route("/v1/jobs/:id", get(routes::jobs::status))
        .route("/v1/jobs/:id/result", get(routes::jobs::result))
        .route("/v1/jobs/:id/cancel", post(routes::jobs::cancel))
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(telemetry::stack())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(?e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = ServerConfig::from_env()?;
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(
        %addr,
        max_population = config.max_population,
        max_generations = config.max_generations,
        "listening"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(AppState::new(config)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
