use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use jobs::JobStatus;
use types::{Placement, SolveResult};

use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/v1/jobs/{id}/export.csv",
    params(("id" = String, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Finished timetable as CSV"),
        (status = 404, description = "Unknown job"),
        (status = 409, description = "Job not finished")
    )
)]
pub async fn export_csv(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.jobs.get(&id) {
        Some(JobStatus::Solved { result }) => (
            [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
            render_csv(&result),
        )
            .into_response(),
        Some(_) => (StatusCode::CONFLICT, "job not finished").into_response(),
        None => (StatusCode::NOT_FOUND, "job not found").into_response(),
    }
}

fn csv_field(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn render_csv(result: &SolveResult) -> String {
    let mut rows: Vec<&Placement> = result.placements.iter().collect();
    rows.sort_by(|a, b| {
        (&a.timeslot.0, &a.room.0, &a.course.0).cmp(&(&b.timeslot.0, &b.room.0, &b.course.0))
    });

    let mut out = String::from(
        "timeslot_id,timeslot_label,room,session_id,course,teacher,groups,size,room_type\n",
    );
    for p in rows {
        let groups = p
            .groups
            .iter()
            .map(|g| g.0.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let fields = [
            csv_field(&p.timeslot.0),
            csv_field(&p.timeslot_label),
            csv_field(&p.room.0),
            csv_field(&p.session.0),
            csv_field(&p.course.0),
            csv_field(&p.teacher.0),
            csv_field(&groups),
            p.size.to_string(),
            csv_field(&p.room_type),
        ];
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}
