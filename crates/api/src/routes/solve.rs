use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::state::AppState;
use types::SolveEnvelope;

#[derive(Serialize, ToSchema)]
pub struct JobCreated {
    pub job_id: String,
    pub status: &'static str,
}

#[utoipa::path(
    post,
    path = "/v1/solve",
    request_body = SolveEnvelope,
    responses(
        (status = 200, description = "Job enqueued", body = JobCreated),
        (status = 400, description = "Invalid instance or GA config")
    )
)]
pub async fn solve(
    State(state): State<AppState>,
    Json(env): Json<SolveEnvelope>,
) -> Result<Json<JobCreated>, ApiError> {
    // config and structural problems surface here, before a job exists
    timetable_core::validate(&env.instance).map_err(|e| ApiError(e.to_string()))?;
    solver_ga::validate_config(&env.params)?;

    let id = state.jobs.enqueue(env);
    Ok(Json(JobCreated {
        job_id: id.0,
        status: "queued",
    }))
}
