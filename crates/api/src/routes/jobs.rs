use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use types::SolveResult;

#[utoipa::path(
    get,
    path = "/v1/jobs/{id}",
    params(("id" = String, Path, description = "Job ID")),
    responses((status = 200, description = "Job status", body = jobs::JobStatus))
)]
pub async fn status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<serde_json::Value> {
    let st = state.jobs.get(&id);
    Json(match st {
        None => serde_json::json!({"status": "not_found"}),
        Some(s) => serde_json::to_value(s).unwrap(),
    })
}

#[utoipa::path(
    get,
    path = "/v1/jobs/{id}/result",
    params(("id" = String, Path, description = "Job ID")),
    responses((status = 200, description = "Solve result (if ready)", body = SolveResult))
)]
pub async fn result(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<serde_json::Value> {
    let st = state.jobs.get(&id);
    Json(match st {
        Some(jobs::JobStatus::Solved { result }) => serde_json::to_value(result).unwrap(),
        Some(_) => serde_json::json!({"status": "not_ready"}),
        None => serde_json::json!({"status": "not_found"}),
    })
}

#[utoipa::path(
    get,
    path = "/v1/jobs/{id}/history",
    params(("id" = String, Path, description = "Job ID")),
    responses((status = 200, description = "Progress rows reported so far", body = [types::HistoryRow]))
)]
pub async fn history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<serde_json::Value> {
    Json(match state.jobs.history(&id) {
        None => serde_json::json!({"status": "not_found"}),
        Some(rows) => serde_json::to_value(rows).unwrap(),
    })
}

#[utoipa::path(
    get,
    path = "/v1/jobs/{id}/summary",
    params(("id" = String, Path, description = "Job ID")),
    responses((status = 200, description = "Start/end/best digest of the job's history"))
)]
pub async fn summary(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<serde_json::Value> {
    Json(match state.jobs.history(&id) {
        None => serde_json::json!({"status": "not_found"}),
        Some(rows) => solver_ga::summarize_history(&rows),
    })
}
