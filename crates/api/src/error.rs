use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

#[derive(Debug)]
pub struct ApiError(pub String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, self.0).into_response()
    }
}

impl From<timetable_core::EvalError> for ApiError {
    fn from(e: timetable_core::EvalError) -> Self {
        Self(e.to_string())
    }
}

impl From<solver_ga::SolveError> for ApiError {
    fn from(e: solver_ga::SolveError) -> Self {
        Self(e.to_string())
    }
}
