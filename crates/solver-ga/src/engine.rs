//! Genetic-algorithm driver: tournament selection, single-interval
//! crossover, per-gene mutation, elitism, repair+score of every offspring,
//! convergence tracking and progress reporting.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use thiserror::Error;
use tracing::info;

use timetable_core::fitness::evaluate;
use timetable_core::EvalError;
use types::{Candidate, GaConfig, Gene, HistoryRow, Instance, Penalty, RoomId, TimeslotId};

use crate::repair::{repair, RepairParams};

#[derive(Debug, Error)]
pub enum SolveError {
    #[error("invalid config: {0}")]
    Config(String),
    #[error("invalid instance: {0}")]
    Instance(String),
    #[error(transparent)]
    Eval(#[from] EvalError),
    #[error("worker pool: {0}")]
    Pool(String),
}

#[derive(Clone, Debug)]
pub struct GaOutcome {
    pub best: Candidate,
    pub penalty: Penalty,
    pub history: Vec<HistoryRow>,
}

pub type ProgressFn<'a> = &'a mut dyn FnMut(&HistoryRow);

/// Fails fast on parameters that would make the run meaningless.
pub fn validate_config(cfg: &GaConfig) -> Result<(), SolveError> {
    if cfg.pop_size == 0 {
        return Err(SolveError::Config("pop_size must be > 0".into()));
    }
    if cfg.generations == 0 {
        return Err(SolveError::Config("generations must be > 0".into()));
    }
    if cfg.elite >= cfg.pop_size {
        return Err(SolveError::Config(format!(
            "elite must be in [0, pop_size-1], got {}",
            cfg.elite
        )));
    }
    if cfg.tournament_k == 0 {
        return Err(SolveError::Config("tournament_k must be > 0".into()));
    }
    if cfg.workers == 0 {
        return Err(SolveError::Config("workers must be >= 1".into()));
    }
    if !(0.0..=1.0).contains(&cfg.cx_rate) {
        return Err(SolveError::Config("cx_rate must be in [0, 1]".into()));
    }
    if !(0.0..=1.0).contains(&cfg.mut_rate) {
        return Err(SolveError::Config("mut_rate must be in [0, 1]".into()));
    }
    Ok(())
}

pub(crate) fn check_instance(inst: &Instance) -> Result<(), SolveError> {
    if inst.timeslots.is_empty() {
        return Err(SolveError::Instance("no timeslots".into()));
    }
    if inst.rooms.is_empty() {
        return Err(SolveError::Instance("no rooms".into()));
    }
    if inst.sessions.is_empty() {
        return Err(SolveError::Instance("no sessions".into()));
    }
    Ok(())
}

/// Assignment domains of the instance in a fixed order, so seeded draws are
/// reproducible (room iteration follows the map's sorted keys).
pub(crate) struct Domain {
    timeslots: Vec<TimeslotId>,
    rooms: Vec<RoomId>,
}

impl Domain {
    pub(crate) fn new(inst: &Instance) -> Self {
        Self {
            timeslots: inst.timeslots.iter().map(|t| t.id.clone()).collect(),
            rooms: inst.rooms.keys().cloned().collect(),
        }
    }

    fn random_gene(&self, rng: &mut ChaCha8Rng) -> Gene {
        Gene {
            timeslot: self.timeslots[rng.gen_range(0..self.timeslots.len())].clone(),
            room: self.rooms[rng.gen_range(0..self.rooms.len())].clone(),
        }
    }

    pub(crate) fn random_candidate(&self, len: usize, rng: &mut ChaCha8Rng) -> Candidate {
        (0..len).map(|_| self.random_gene(rng)).collect()
    }
}

fn repair_and_score(
    cand: Candidate,
    inst: &Instance,
    use_repair: bool,
    params: &RepairParams,
    rng: &mut ChaCha8Rng,
) -> Result<(Candidate, Penalty), EvalError> {
    let out = if use_repair {
        repair(cand, inst, params, rng)?
    } else {
        cand
    };
    let pen = evaluate(&out, inst)?;
    Ok((out, pen))
}

/// One generation's worth of repair+score. With a pool, candidates are
/// dispatched over the fixed worker set and recombined positionally; each
/// task draws its repair randomness from an entropy-seeded RNG of its own,
/// which is why multi-worker runs are not reproducible. Without a pool every
/// draw comes from the engine RNG, in candidate order.
fn score_population(
    pop: Vec<Candidate>,
    inst: &Instance,
    use_repair: bool,
    params: &RepairParams,
    pool: Option<&rayon::ThreadPool>,
    rng: &mut ChaCha8Rng,
) -> Result<(Vec<Candidate>, Vec<Penalty>), SolveError> {
    let scored: Result<Vec<(Candidate, Penalty)>, EvalError> = match pool {
        None => pop
            .into_iter()
            .map(|cand| repair_and_score(cand, inst, use_repair, params, rng))
            .collect(),
        Some(pool) => pool.install(|| {
            pop.into_par_iter()
                .map(|cand| {
                    let mut rng = ChaCha8Rng::from_entropy();
                    repair_and_score(cand, inst, use_repair, params, &mut rng)
                })
                .collect()
        }),
    };
    Ok(scored?.into_iter().unzip())
}

fn tournament(penalties: &[Penalty], k: usize, rng: &mut ChaCha8Rng) -> usize {
    let mut best = rng.gen_range(0..penalties.len());
    for _ in 1..k {
        let i = rng.gen_range(0..penalties.len());
        if penalties[i].rank() < penalties[best].rank() {
            best = i;
        }
    }
    best
}

/// Single-interval crossover: swap the `[i, j)` slice between the parents.
/// Below the crossover rate the children are plain copies.
fn crossover(
    a: &Candidate,
    b: &Candidate,
    rate: f64,
    rng: &mut ChaCha8Rng,
) -> (Candidate, Candidate) {
    let mut c1 = a.clone();
    let mut c2 = b.clone();
    if !rng.gen_bool(rate) {
        return (c1, c2);
    }
    let n = a.len();
    let mut i = rng.gen_range(0..n);
    let mut j = rng.gen_range(0..n);
    if i > j {
        std::mem::swap(&mut i, &mut j);
    }
    c1[i..j].clone_from_slice(&b[i..j]);
    c2[i..j].clone_from_slice(&a[i..j]);
    (c1, c2)
}

/// Per-gene mutation: with probability `rate`, replace either the timeslot
/// or the room (even odds) with a uniform draw from the full domain.
fn mutate(cand: &mut Candidate, domain: &Domain, rate: f64, rng: &mut ChaCha8Rng) {
    for gene in cand.iter_mut() {
        if rng.gen_bool(rate) {
            if rng.gen_bool(0.5) {
                gene.timeslot =
                    domain.timeslots[rng.gen_range(0..domain.timeslots.len())].clone();
            } else {
                gene.room = domain.rooms[rng.gen_range(0..domain.rooms.len())].clone();
            }
        }
    }
}

fn best_index(penalties: &[Penalty]) -> usize {
    let mut best = 0;
    for i in 1..penalties.len() {
        if penalties[i].rank() < penalties[best].rank() {
            best = i;
        }
    }
    best
}

fn row(generation: u32, pen: &Penalty) -> HistoryRow {
    HistoryRow {
        generation,
        best_total: pen.total,
        best_hard: pen.hard,
        best_soft: pen.soft,
    }
}

fn emit(progress: &mut Option<ProgressFn<'_>>, r: &HistoryRow) {
    info!(
        generation = r.generation,
        best_total = r.best_total,
        best_hard = r.best_hard,
        best_soft = r.best_soft,
        "ga progress"
    );
    if let Some(cb) = progress.as_mut() {
        cb(r);
    }
}

/// Runs the GA against an instance. Returns the best candidate found, its
/// penalty and the per-generation history of the running best. Sequential
/// runs (workers = 1) are deterministic for a fixed seed.
pub fn solve(
    inst: &Instance,
    cfg: &GaConfig,
    mut progress: Option<ProgressFn<'_>>,
) -> Result<GaOutcome, SolveError> {
    validate_config(cfg)?;
    check_instance(inst)?;

    let mut rng = ChaCha8Rng::seed_from_u64(cfg.seed);
    let domain = Domain::new(inst);
    let params = RepairParams {
        attempts_per_gene: cfg.repair_attempts_per_gene,
        max_rounds: cfg.repair_max_rounds,
    };
    let n_sessions = inst.sessions.len();

    // built once per solve; every generation's batch runs on the same
    // threads, and RAII releases them on every exit path
    let pool = if cfg.workers > 1 {
        Some(
            rayon::ThreadPoolBuilder::new()
                .num_threads(cfg.workers)
                .build()
                .map_err(|e| SolveError::Pool(e.to_string()))?,
        )
    } else {
        None
    };

    let seeded: Vec<Candidate> = (0..cfg.pop_size)
        .map(|_| domain.random_candidate(n_sessions, &mut rng))
        .collect();
    let (mut pop, mut penalties) = score_population(
        seeded,
        inst,
        cfg.use_repair,
        &params,
        pool.as_ref(),
        &mut rng,
    )?;

    let idx = best_index(&penalties);
    let mut best = pop[idx].clone();
    let mut best_pen = penalties[idx].clone();

    let mut history = vec![row(0, &best_pen)];
    emit(&mut progress, &history[0]);
    if best_pen.is_perfect() {
        return Ok(GaOutcome {
            best,
            penalty: best_pen,
            history,
        });
    }

    for gen in 1..=cfg.generations {
        let mut order: Vec<usize> = (0..pop.len()).collect();
        order.sort_by_key(|&i| penalties[i].rank());

        let mut offspring: Vec<Candidate> =
            order.iter().take(cfg.elite).map(|&i| pop[i].clone()).collect();
        while offspring.len() < cfg.pop_size {
            let p1 = tournament(&penalties, cfg.tournament_k, &mut rng);
            let p2 = tournament(&penalties, cfg.tournament_k, &mut rng);
            let (mut c1, mut c2) = crossover(&pop[p1], &pop[p2], cfg.cx_rate, &mut rng);
            mutate(&mut c1, &domain, cfg.mut_rate, &mut rng);
            mutate(&mut c2, &domain, cfg.mut_rate, &mut rng);
            offspring.push(c1);
            if offspring.len() < cfg.pop_size {
                offspring.push(c2);
            }
        }

        let scored = score_population(
            offspring,
            inst,
            cfg.use_repair,
            &params,
            pool.as_ref(),
            &mut rng,
        )?;
        pop = scored.0;
        penalties = scored.1;

        let cur = best_index(&penalties);
        if penalties[cur].rank() < best_pen.rank() {
            best = pop[cur].clone();
            best_pen = penalties[cur].clone();
        }

        let r = row(gen, &best_pen);
        history.push(r);

        let done = best_pen.is_perfect();
        if done
            || gen == cfg.generations
            || (cfg.log_every > 0 && gen % cfg.log_every == 0)
        {
            emit(&mut progress, &r);
        }
        if done {
            break;
        }
    }

    Ok(GaOutcome {
        best,
        penalty: best_pen,
        history,
    })
}

/// Start/end/best digest of a generation history, for convergence summaries.
pub fn summarize_history(history: &[HistoryRow]) -> serde_json::Value {
    if history.is_empty() {
        return serde_json::json!({});
    }
    let start = history[0];
    let end = history[history.len() - 1];
    let mut best = start;
    for r in history {
        if r.best_total < best.best_total {
            best = *r;
        }
    }
    let view = |r: HistoryRow| {
        serde_json::json!({
            "gen": r.generation,
            "total": r.best_total,
            "hard": r.best_hard,
            "soft": r.best_soft,
        })
    };
    serde_json::json!({
        "start": view(start),
        "end": view(end),
        "best": view(best),
        "generations": history.len(),
    })
}
