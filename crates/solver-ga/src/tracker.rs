//! Incremental hard-constraint bookkeeping for single-position moves.
//!
//! The tracker owns a working copy of a candidate and keeps the hard penalty
//! live under `move_to`/`undo`, so the repair loop can probe large move
//! neighbourhoods without rescanning the whole candidate. Invariant: after
//! any sequence of moves and undos, `hard()` equals the hard component that
//! `fitness::evaluate` reports for the tracker's current candidate.

use std::collections::HashMap;
use std::hash::Hash;

use timetable_core::EvalError;
use types::{Candidate, Gene, GroupId, Instance, RoomId, TeacherId, TimeslotId};

/// Records the prior assignment of a moved position, for exact reversal.
#[derive(Clone, Debug)]
pub struct MoveToken {
    idx: usize,
    old: Gene,
}

pub struct HardTracker<'a> {
    inst: &'a Instance,
    cand: Candidate,

    room_count: HashMap<(TimeslotId, RoomId), u32>,
    teacher_count: HashMap<(TimeslotId, TeacherId), u32>,
    group_count: HashMap<(TimeslotId, GroupId), u32>,

    room_coll: i64,
    teacher_coll: i64,
    group_coll: i64,

    // capacity + room type + availability per position, 0..=3
    unary: Vec<u8>,
    unary_total: i64,
}

fn collision_units(count: u32) -> i64 {
    count.saturating_sub(1) as i64
}

impl<'a> HardTracker<'a> {
    pub fn new(cand: Candidate, inst: &'a Instance) -> Result<Self, EvalError> {
        if cand.len() != inst.sessions.len() {
            return Err(EvalError::ShapeMismatch {
                expected: inst.sessions.len(),
                got: cand.len(),
            });
        }
        for gene in &cand {
            if !inst.rooms.contains_key(&gene.room) {
                return Err(EvalError::UnknownRoom(gene.room.0.clone()));
            }
        }

        let mut tracker = Self {
            inst,
            cand,
            room_count: HashMap::new(),
            teacher_count: HashMap::new(),
            group_count: HashMap::new(),
            room_coll: 0,
            teacher_coll: 0,
            group_coll: 0,
            unary: vec![0; inst.sessions.len()],
            unary_total: 0,
        };
        for idx in 0..tracker.cand.len() {
            let gene = tracker.cand[idx].clone();
            tracker.add_occupancy(idx, &gene);
            let u = tracker.unary_for(idx, &gene);
            tracker.unary[idx] = u;
            tracker.unary_total += u as i64;
        }
        Ok(tracker)
    }

    /// Live hard penalty of the working candidate, O(1).
    pub fn hard(&self) -> i64 {
        self.unary_total + self.room_coll + self.teacher_coll + self.group_coll
    }

    pub fn candidate(&self) -> &Candidate {
        &self.cand
    }

    pub fn into_candidate(self) -> Candidate {
        self.cand
    }

    pub fn assignment(&self, idx: usize) -> &Gene {
        &self.cand[idx]
    }

    /// Reassigns one position and updates all totals. Cost is proportional to
    /// the session's group-set size. Moving to the current assignment is a
    /// no-op that still yields a valid token.
    pub fn move_to(&mut self, idx: usize, timeslot: TimeslotId, room: RoomId) -> MoveToken {
        let old = self.cand[idx].clone();
        if old.timeslot == timeslot && old.room == room {
            return MoveToken { idx, old };
        }
        let new = Gene { timeslot, room };

        self.remove_occupancy(idx, &old);
        self.add_occupancy(idx, &new);

        let new_u = self.unary_for(idx, &new);
        self.unary_total += new_u as i64 - self.unary[idx] as i64;
        self.unary[idx] = new_u;
        self.cand[idx] = new;

        MoveToken { idx, old }
    }

    /// Reverts the move the token came from. A no-op when the position
    /// already holds the recorded assignment.
    pub fn undo(&mut self, token: MoveToken) {
        let MoveToken { idx, old } = token;
        if self.cand[idx] == old {
            return;
        }
        self.move_to(idx, old.timeslot, old.room);
    }

    /// Positions currently taking part in any hard violation: non-zero unary
    /// cost, or membership in an occupancy bucket of size > 1. Returned in
    /// position order.
    pub fn violating_positions(&self) -> Vec<usize> {
        let mut out = Vec::new();
        for (idx, gene) in self.cand.iter().enumerate() {
            if self.unary[idx] > 0 {
                out.push(idx);
                continue;
            }
            let s = &self.inst.sessions[idx];
            let room_hit = self
                .room_count
                .get(&(gene.timeslot.clone(), gene.room.clone()))
                .is_some_and(|&c| c > 1);
            let teacher_hit = self
                .teacher_count
                .get(&(gene.timeslot.clone(), s.teacher.clone()))
                .is_some_and(|&c| c > 1);
            let group_hit = s.groups.iter().any(|g| {
                self.group_count
                    .get(&(gene.timeslot.clone(), g.clone()))
                    .is_some_and(|&c| c > 1)
            });
            if room_hit || teacher_hit || group_hit {
                out.push(idx);
            }
        }
        out
    }

    fn unary_for(&self, idx: usize, gene: &Gene) -> u8 {
        let s = &self.inst.sessions[idx];
        let room = match self.inst.rooms.get(&gene.room) {
            Some(r) => r,
            // rooms are checked in new(); moves draw from the instance
            None => panic!("tracker move references unknown room {}", gene.room),
        };
        let mut u = 0u8;
        if room.capacity < s.size {
            u += 1;
        }
        if room.rtype != s.rtype {
            u += 1;
        }
        if let Some(av) = self.inst.availability(&s.teacher) {
            if !av.contains(&gene.timeslot) {
                u += 1;
            }
        }
        u
    }

    fn add_occupancy(&mut self, idx: usize, gene: &Gene) {
        let s = &self.inst.sessions[idx];
        Self::bump(
            &mut self.room_count,
            (gene.timeslot.clone(), gene.room.clone()),
            1,
            &mut self.room_coll,
        );
        Self::bump(
            &mut self.teacher_count,
            (gene.timeslot.clone(), s.teacher.clone()),
            1,
            &mut self.teacher_coll,
        );
        for g in &s.groups {
            Self::bump(
                &mut self.group_count,
                (gene.timeslot.clone(), g.clone()),
                1,
                &mut self.group_coll,
            );
        }
    }

    fn remove_occupancy(&mut self, idx: usize, gene: &Gene) {
        let s = &self.inst.sessions[idx];
        Self::bump(
            &mut self.room_count,
            (gene.timeslot.clone(), gene.room.clone()),
            -1,
            &mut self.room_coll,
        );
        Self::bump(
            &mut self.teacher_count,
            (gene.timeslot.clone(), s.teacher.clone()),
            -1,
            &mut self.teacher_coll,
        );
        for g in &s.groups {
            Self::bump(
                &mut self.group_count,
                (gene.timeslot.clone(), g.clone()),
                -1,
                &mut self.group_coll,
            );
        }
    }

    fn bump<K: Eq + Hash>(map: &mut HashMap<K, u32>, key: K, delta: i32, coll: &mut i64) {
        let before = map.get(&key).copied().unwrap_or(0);
        let after = before as i64 + delta as i64;
        if after < 0 {
            // an underflow means add/remove got out of step; the solve must
            // not continue on corrupted totals
            panic!("occupancy count underflow");
        }
        let after = after as u32;
        *coll += collision_units(after) - collision_units(before);
        if after == 0 {
            map.remove(&key);
        } else {
            map.insert(key, after);
        }
    }
}
