use axum::Json;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::ApiError;
use timetable_core::fitness::evaluate;
use types::{Gene, Instance, Penalty};

#[derive(Deserialize, ToSchema)]
pub struct EvaluateIn {
    pub instance: Instance,
    pub candidate: Vec<Gene>,
}

#[utoipa::path(
    post,
    path = "/v1/evaluate",
    request_body = EvaluateIn,
    responses(
        (status = 200, description = "Penalty breakdown for the provided schedule", body = Penalty),
        (status = 400, description = "Candidate shape does not match the instance")
    )
)]
pub async fn evaluate_handler(Json(input): Json<EvaluateIn>) -> Result<Json<Penalty>, ApiError> {
    let pen = evaluate(&input.candidate, &input.instance)?;
    Ok(Json(pen))
}
