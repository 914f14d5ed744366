use jobs::InMemJobs;
use solver_ga::GaSolver;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub jobs: Arc<InMemJobs<GaSolver>>,
}

impl AppState {
    pub fn new_default() -> Self {
        Self {
            jobs: Arc::new(InMemJobs::new(GaSolver::new())),
        }
    }
}
