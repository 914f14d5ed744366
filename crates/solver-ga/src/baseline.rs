//! Uniform random-sampling baseline, the yardstick the GA is compared
//! against in result summaries.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use timetable_core::fitness::evaluate;
use types::{BaselineResult, Instance};

use crate::engine::{check_instance, Domain, SolveError};

/// Draws `tries` uniform candidates and keeps the best by (hard, soft) rank.
pub fn random_baseline(
    inst: &Instance,
    tries: u32,
    seed: u64,
) -> Result<BaselineResult, SolveError> {
    if tries == 0 {
        return Err(SolveError::Config("tries must be > 0".into()));
    }
    check_instance(inst)?;

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let domain = Domain::new(inst);
    let n = inst.sessions.len();

    let mut best = domain.random_candidate(n, &mut rng);
    let mut best_pen = evaluate(&best, inst)?;
    for _ in 1..tries {
        let cand = domain.random_candidate(n, &mut rng);
        let pen = evaluate(&cand, inst)?;
        if pen.rank() < best_pen.rank() {
            best = cand;
            best_pen = pen;
        }
    }

    Ok(BaselineResult {
        best,
        penalty: best_pen,
        tries,
        seed,
    })
}
