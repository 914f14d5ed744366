mod error;
mod state;
mod telemetry;
pub mod routes {
    pub mod baseline;
    pub mod evaluate;
    pub mod export;
    pub mod health;
    pub mod jobs;
    pub mod solve;
    pub mod validate;
}

use axum::{
    routing::{get, post},
    Router,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
        paths(
            routes::health::health,
            routes::solve::solve,
            routes::jobs::status,
            routes::jobs::result,
            routes::jobs::history,
            routes::jobs::summary,
            routes::validate::validate_handler,
            routes::evaluate::evaluate_handler,
            routes::baseline::baseline,
            routes::export::export_csv,
        ),
        components(schemas(
            types::Instance, types::Room, types::Timeslot, types::Session, types::Preferences,
            types::GaConfig, types::SolveEnvelope, types::SolveResult, types::Penalty,
            types::HistoryRow, types::Gene, types::Placement, types::BaselineResult,
            types::TeacherId, types::GroupId, types::RoomId, types::CourseId, types::SessionId,
            types::TimeslotId,
            jobs::JobId, jobs::JobStatus,
            routes::solve::JobCreated,
            routes::validate::ValidationReport,
            routes::evaluate::EvaluateIn,
            routes::baseline::BaselineIn
        )),
        tags(
            (name = "timetable", description = "Course timetabling API")
        )
    )]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let app_state = state::AppState::new_default();

    let app = Router::new()
        .route("/v1/health", get(routes::health::health))
        .route("/v1/solve", post(routes::solve::solve))
        .route("/v1/validate", post(routes::validate::validate_handler))
        .route("/v1/evaluate", post(routes::evaluate::evaluate_handler))
        .route("/v1/baseline", post(routes::baseline::baseline))
        .route("/v1/jobs/:id", get(routes::jobs::status))
        .route("/v1/jobs/:id/result", get(routes::jobs::result))
        .route("/v1/jobs/:id/history", get(routes::jobs::history))
        .route("/v1/jobs/:id/summary", get(routes::jobs::summary))
        .route("/v1/jobs/:id/export.csv", get(routes::export::export_csv))
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(telemetry::stack())
        .with_state(app_state);

    let port = std::env::var("TIMETABLE__SERVER__PORT").unwrap_or_else(|_| "8080".into());
    let addr: std::net::SocketAddr = format!("0.0.0.0:{port}").parse()?;
    tracing::info!(%addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
