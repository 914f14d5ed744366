pub mod baseline;
pub mod engine;
pub mod repair;
pub mod tracker;

pub use baseline::random_baseline;
pub use engine::{solve, summarize_history, validate_config, GaOutcome, ProgressFn, SolveError};
pub use repair::{repair, RepairParams};
pub use tracker::{HardTracker, MoveToken};

use async_trait::async_trait;
use timetable_core::{placement_view, ProgressSink, Solver};
use types::{HistoryRow, SolveEnvelope, SolveResult};

/// The GA behind the job layer's `Solver` seam. The run itself is CPU-bound
/// and executes on a blocking task; a panic in the engine (an internal
/// invariant breach) surfaces as a join error and fails the job.
pub struct GaSolver;

impl GaSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GaSolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Solver for GaSolver {
    async fn solve(
        &self,
        env: SolveEnvelope,
        progress: Option<ProgressSink>,
    ) -> anyhow::Result<SolveResult> {
        let result = tokio::task::spawn_blocking(move || run_solve(env, progress)).await??;
        Ok(result)
    }
}

fn run_solve(
    env: SolveEnvelope,
    progress: Option<ProgressSink>,
) -> Result<SolveResult, SolveError> {
    let SolveEnvelope { instance, params } = env;

    let outcome = match progress {
        Some(sink) => {
            let mut forward = move |r: &HistoryRow| sink(r);
            engine::solve(&instance, &params, Some(&mut forward))
        }
        None => engine::solve(&instance, &params, None),
    }?;

    let placements = placement_view(&instance, &outcome.best);
    let status = if outcome.penalty.hard == 0 {
        "solved"
    } else {
        "best_effort"
    };
    let stats = serde_json::json!({
        "method": "ga",
        "pop": params.pop_size,
        "workers": params.workers,
        "seed": params.seed,
        "summary": engine::summarize_history(&outcome.history),
    });

    Ok(SolveResult {
        status: status.into(),
        penalty: outcome.penalty,
        candidate: outcome.best,
        placements,
        history: outcome.history,
        stats,
    })
}
