use axum::Json;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::ApiError;
use types::{BaselineResult, Instance};

fn default_seed() -> u64 {
    123
}

#[derive(Deserialize, ToSchema)]
pub struct BaselineIn {
    pub instance: Instance,
    pub tries: u32,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

#[utoipa::path(
    post,
    path = "/v1/baseline",
    request_body = BaselineIn,
    responses(
        (status = 200, description = "Best of N uniform random candidates", body = BaselineResult),
        (status = 400, description = "Invalid instance or tries = 0")
    )
)]
pub async fn baseline(Json(input): Json<BaselineIn>) -> Result<Json<BaselineResult>, ApiError> {
    let BaselineIn {
        instance,
        tries,
        seed,
    } = input;
    let res =
        tokio::task::spawn_blocking(move || solver_ga::random_baseline(&instance, tries, seed))
            .await
            .map_err(|e| ApiError(e.to_string()))??;
    Ok(Json(res))
}
