//! In-memory job queue over a [`Solver`]. Jobs run on spawned tasks; the
//! engine's progress rows are appended to the job record while it runs, so
//! pollers can watch convergence live.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use timetable_core::{ProgressSink, Solver};
use tracing::error;
use types::{HistoryRow, SolveEnvelope, SolveResult};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, ToSchema)]
pub struct JobId(pub String);

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, ToSchema)]
#[serde(tag = "status")]
pub enum JobStatus {
    Queued,
    Running,
    Solved { result: SolveResult },
    Failed { message: String },
}

struct JobRecord {
    status: JobStatus,
    history: Arc<RwLock<Vec<HistoryRow>>>,
}

#[derive(Clone)]
pub struct InMemJobs<S: Solver> {
    inner: Arc<RwLock<HashMap<String, JobRecord>>>,
    solver: Arc<S>,
}

impl<S: Solver> InMemJobs<S> {
    pub fn new(solver: S) -> Self {
        Self {
            inner: Default::default(),
            solver: Arc::new(solver),
        }
    }

    pub fn enqueue(&self, env: SolveEnvelope) -> JobId {
        let id = Uuid::new_v4().to_string();
        let history: Arc<RwLock<Vec<HistoryRow>>> = Default::default();
        self.inner.write().insert(
            id.clone(),
            JobRecord {
                status: JobStatus::Queued,
                history: history.clone(),
            },
        );

        let map = self.inner.clone();
        let solver = self.solver.clone();
        let id_for_task = id.clone();

        tokio::spawn(async move {
            if let Some(rec) = map.write().get_mut(&id_for_task) {
                rec.status = JobStatus::Running;
            }

            let sink: ProgressSink = {
                let history = history.clone();
                Arc::new(move |r: &HistoryRow| history.write().push(*r))
            };

            match solver.solve(env, Some(sink)).await {
                Ok(result) => {
                    if let Some(rec) = map.write().get_mut(&id_for_task) {
                        rec.status = JobStatus::Solved { result };
                    }
                }
                Err(e) => {
                    error!(?e, "job failed");
                    if let Some(rec) = map.write().get_mut(&id_for_task) {
                        rec.status = JobStatus::Failed {
                            message: e.to_string(),
                        };
                    }
                }
            }
        });

        JobId(id)
    }

    pub fn get(&self, id: &str) -> Option<JobStatus> {
        self.inner.read().get(id).map(|rec| rec.status.clone())
    }

    /// Progress rows reported so far, available from the moment the job is
    /// queued and growing while it runs.
    pub fn history(&self, id: &str) -> Option<Vec<HistoryRow>> {
        self.inner.read().get(id).map(|rec| rec.history.read().clone())
    }
}
