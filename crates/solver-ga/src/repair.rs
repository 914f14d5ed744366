//! Constraint repair: randomized local search that drives the hard penalty
//! toward zero, leaving soft quality to the GA.

use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use timetable_core::EvalError;
use types::{Candidate, Instance, RoomId, TimeslotId};

use crate::tracker::HardTracker;

#[derive(Clone, Copy, Debug)]
pub struct RepairParams {
    pub attempts_per_gene: u32,
    pub max_rounds: u32,
}

impl Default for RepairParams {
    fn default() -> Self {
        Self {
            attempts_per_gene: 20,
            max_rounds: 3,
        }
    }
}

/// Per-session candidate domains, precomputed so trial draws are never
/// wasted on rooms that cannot fit or slots the teacher cannot attend.
/// Falls back to the full domain when the strict set is empty, so no
/// position ever has zero candidates.
struct FeasibleSets {
    rooms: Vec<Vec<RoomId>>,
    timeslots: Vec<Vec<TimeslotId>>,
}

impl FeasibleSets {
    fn build(inst: &Instance) -> Self {
        let all_rooms: Vec<RoomId> = inst.rooms.keys().cloned().collect();
        let all_slots: Vec<TimeslotId> = inst.timeslots.iter().map(|t| t.id.clone()).collect();

        let mut rooms = Vec::with_capacity(inst.sessions.len());
        let mut timeslots = Vec::with_capacity(inst.sessions.len());
        for s in &inst.sessions {
            let fitting: Vec<RoomId> = inst
                .rooms
                .values()
                .filter(|r| r.capacity >= s.size && r.rtype == s.rtype)
                .map(|r| r.id.clone())
                .collect();
            rooms.push(if fitting.is_empty() {
                all_rooms.clone()
            } else {
                fitting
            });

            let permitted = match inst.availability(&s.teacher) {
                Some(av) => {
                    let open: Vec<TimeslotId> = all_slots
                        .iter()
                        .filter(|t| av.contains(*t))
                        .cloned()
                        .collect();
                    if open.is_empty() {
                        all_slots.clone()
                    } else {
                        open
                    }
                }
                None => all_slots.clone(),
            };
            timeslots.push(permitted);
        }
        Self { rooms, timeslots }
    }
}

/// Best-effort reduction of the hard penalty. Each round revisits the
/// currently violating positions in random order; for each, a bounded number
/// of random draws from its feasible sets is probed through move+undo and the
/// best found is committed at the end of the scan. Never increases the hard
/// penalty of the input and does not look at soft penalties at all.
pub fn repair(
    cand: Candidate,
    inst: &Instance,
    params: &RepairParams,
    rng: &mut ChaCha8Rng,
) -> Result<Candidate, EvalError> {
    let feasible = FeasibleSets::build(inst);
    let mut tracker = HardTracker::new(cand, inst)?;

    for _ in 0..params.max_rounds {
        let mut bad = tracker.violating_positions();
        if bad.is_empty() {
            break;
        }
        bad.shuffle(rng);

        for idx in bad {
            let current = tracker.assignment(idx).clone();
            let mut best = (current.timeslot.clone(), current.room.clone());
            let mut best_hard = tracker.hard();

            let slots = &feasible.timeslots[idx];
            let rooms = &feasible.rooms[idx];

            for _ in 0..params.attempts_per_gene {
                let ts = slots[rng.gen_range(0..slots.len())].clone();
                let room = rooms[rng.gen_range(0..rooms.len())].clone();
                if ts == current.timeslot && room == current.room {
                    continue;
                }

                let token = tracker.move_to(idx, ts.clone(), room.clone());
                let h = tracker.hard();
                tracker.undo(token);

                if h < best_hard {
                    best_hard = h;
                    best = (ts, room);
                    if best_hard == 0 {
                        break;
                    }
                }
            }

            tracker.move_to(idx, best.0, best.1);
            if tracker.hard() == 0 {
                return Ok(tracker.into_candidate());
            }
        }
    }

    Ok(tracker.into_candidate())
}
