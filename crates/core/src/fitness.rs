//! Pure fitness evaluation: candidate -> penalty breakdown.
//!
//! Hard units make a schedule operationally invalid (double-bookings,
//! capacity, room type, availability); soft units degrade quality (late
//! slots, avoided days, gaps in a group's day). Collisions cost `count - 1`
//! per occupancy bucket: the first occupant is free, each extra one is one
//! unit of conflict.

use std::collections::{BTreeMap, HashMap};

use types::{Candidate, GroupId, Instance, Penalty, RoomId, TeacherId, TimeslotId};

use crate::EvalError;

pub const HARD_CAPACITY: &str = "hard_capacity";
pub const HARD_ROOM_TYPE: &str = "hard_room_type";
pub const HARD_TEACHER_AVAILABILITY: &str = "hard_teacher_availability";
pub const HARD_ROOM_COLLISION: &str = "hard_room_collision";
pub const HARD_TEACHER_COLLISION: &str = "hard_teacher_collision";
pub const HARD_GROUP_COLLISION: &str = "hard_group_collision";
pub const SOFT_LATE_SLOT: &str = "soft_late_slot";
pub const SOFT_AVOID_DAY: &str = "soft_avoid_day";
pub const SOFT_GAPS: &str = "soft_gaps";

fn bump(details: &mut BTreeMap<String, i64>, key: &str, v: i64) {
    *details.entry(key.to_string()).or_insert(0) += v;
}

/// Scores a candidate against its instance. Pure; the only failure modes are
/// shape errors (length mismatch, unknown room id).
pub fn evaluate(cand: &Candidate, inst: &Instance) -> Result<Penalty, EvalError> {
    if cand.len() != inst.sessions.len() {
        return Err(EvalError::ShapeMismatch {
            expected: inst.sessions.len(),
            got: cand.len(),
        });
    }

    let mut hard = 0i64;
    let mut soft = 0i64;
    let mut details: BTreeMap<String, i64> = BTreeMap::new();

    let mut occ_room: HashMap<(&TimeslotId, &RoomId), i64> = HashMap::new();
    let mut occ_teacher: HashMap<(&TimeslotId, &TeacherId), i64> = HashMap::new();
    let mut occ_group: HashMap<(&TimeslotId, &GroupId), i64> = HashMap::new();

    let prefs = &inst.preferences;

    for (gene, s) in cand.iter().zip(&inst.sessions) {
        let room = inst
            .rooms
            .get(&gene.room)
            .ok_or_else(|| EvalError::UnknownRoom(gene.room.0.clone()))?;

        *occ_room.entry((&gene.timeslot, &gene.room)).or_insert(0) += 1;
        *occ_teacher.entry((&gene.timeslot, &s.teacher)).or_insert(0) += 1;
        for g in &s.groups {
            *occ_group.entry((&gene.timeslot, g)).or_insert(0) += 1;
        }

        if room.capacity < s.size {
            hard += 1;
            bump(&mut details, HARD_CAPACITY, 1);
        }
        if room.rtype != s.rtype {
            hard += 1;
            bump(&mut details, HARD_ROOM_TYPE, 1);
        }
        if let Some(av) = inst.availability(&s.teacher) {
            if !av.contains(&gene.timeslot) {
                hard += 1;
                bump(&mut details, HARD_TEACHER_AVAILABILITY, 1);
            }
        }

        if prefs.late_slots.contains(&gene.timeslot) {
            soft += 1;
            bump(&mut details, SOFT_LATE_SLOT, 1);
        }
        if let Some(days) = prefs.avoid_days_for_course.get(&s.course) {
            if days.contains(gene.timeslot.day_token()) {
                soft += 2;
                bump(&mut details, SOFT_AVOID_DAY, 2);
            }
        }
    }

    for &c in occ_room.values() {
        if c > 1 {
            hard += c - 1;
            bump(&mut details, HARD_ROOM_COLLISION, c - 1);
        }
    }
    for &c in occ_teacher.values() {
        if c > 1 {
            hard += c - 1;
            bump(&mut details, HARD_TEACHER_COLLISION, c - 1);
        }
    }
    for &c in occ_group.values() {
        if c > 1 {
            hard += c - 1;
            bump(&mut details, HARD_GROUP_COLLISION, c - 1);
        }
    }

    // Gaps: per group, per day, each idle slot between two occupied slot
    // numbers counts once.
    let mut group_slots: HashMap<&GroupId, Vec<&TimeslotId>> = HashMap::new();
    for (gene, s) in cand.iter().zip(&inst.sessions) {
        for g in &s.groups {
            group_slots.entry(g).or_default().push(&gene.timeslot);
        }
    }
    for slots in group_slots.values() {
        let mut per_day: HashMap<&str, Vec<i64>> = HashMap::new();
        for ts in slots {
            per_day.entry(ts.day_token()).or_default().push(ts.slot_number());
        }
        for nums in per_day.values_mut() {
            nums.sort_unstable();
            for w in nums.windows(2) {
                let gap = w[1] - w[0] - 1;
                if gap > 0 {
                    soft += gap;
                    bump(&mut details, SOFT_GAPS, gap);
                }
            }
        }
    }

    Ok(Penalty::from_counts(hard, soft, details))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use types::{CourseId, Gene, Room, Session, SessionId, Timeslot, HARD_WEIGHT};

    fn room(id: &str, capacity: u32, rtype: &str) -> Room {
        Room {
            id: RoomId(id.into()),
            capacity,
            rtype: rtype.into(),
        }
    }

    fn session(id: &str, teacher: &str, groups: &[&str], size: u32, rtype: &str) -> Session {
        Session {
            id: SessionId(id.into()),
            course: CourseId(format!("course_{id}")),
            teacher: TeacherId(teacher.into()),
            groups: groups.iter().map(|g| GroupId((*g).into())).collect(),
            size,
            rtype: rtype.into(),
        }
    }

    fn slot(id: &str) -> Timeslot {
        Timeslot {
            id: TimeslotId(id.into()),
            label: None,
        }
    }

    fn gene(ts: &str, r: &str) -> Gene {
        Gene {
            timeslot: TimeslotId(ts.into()),
            room: RoomId(r.into()),
        }
    }

    fn instance(timeslots: &[&str], rooms: Vec<Room>, sessions: Vec<Session>) -> Instance {
        Instance {
            timeslots: timeslots.iter().map(|t| slot(t)).collect(),
            rooms: rooms.into_iter().map(|r| (r.id.clone(), r)).collect(),
            sessions,
            teacher_availability: HashMap::new(),
            preferences: Default::default(),
        }
    }

    #[test]
    fn trivially_feasible_single_session() {
        let inst = instance(
            &["mon_1"],
            vec![room("r1", 10, "normal")],
            vec![session("s1", "t1", &["g1"], 5, "normal")],
        );
        let pen = evaluate(&vec![gene("mon_1", "r1")], &inst).unwrap();
        assert_eq!(pen.hard, 0);
        assert_eq!(pen.soft, 0);
        assert_eq!(pen.total, 0);
        assert!(pen.details.is_empty());
    }

    #[test]
    fn total_is_weighted_sum() {
        let inst = instance(
            &["mon_1"],
            vec![room("r1", 3, "lab")],
            vec![session("s1", "t1", &[], 5, "normal")],
        );
        // capacity + room type
        let pen = evaluate(&vec![gene("mon_1", "r1")], &inst).unwrap();
        assert_eq!(pen.hard, 2);
        assert_eq!(pen.total, 2 * HARD_WEIGHT);
        assert_eq!(pen.details[HARD_CAPACITY], 1);
        assert_eq!(pen.details[HARD_ROOM_TYPE], 1);
    }

    #[test]
    fn restricted_teacher_outside_availability() {
        let mut inst = instance(
            &["mon_1", "mon_2"],
            vec![room("r1", 10, "normal")],
            vec![session("s1", "t1", &[], 5, "normal")],
        );
        inst.teacher_availability.insert(
            TeacherId("t1".into()),
            [TimeslotId("mon_2".into())].into_iter().collect(),
        );
        let pen = evaluate(&vec![gene("mon_1", "r1")], &inst).unwrap();
        assert_eq!(pen.details[HARD_TEACHER_AVAILABILITY], 1);

        let pen = evaluate(&vec![gene("mon_2", "r1")], &inst).unwrap();
        assert_eq!(pen.hard, 0);
    }

    #[test]
    fn collisions_cost_count_minus_one() {
        let inst = instance(
            &["mon_1", "mon_2"],
            vec![room("r1", 30, "normal"), room("r2", 30, "normal")],
            vec![
                session("s1", "t1", &["g1"], 5, "normal"),
                session("s2", "t2", &["g2"], 5, "normal"),
                session("s3", "t3", &["g3"], 5, "normal"),
            ],
        );
        // three sessions in the same room and slot: 2 units, not 3
        let cand = vec![gene("mon_1", "r1"), gene("mon_1", "r1"), gene("mon_1", "r1")];
        let pen = evaluate(&cand, &inst).unwrap();
        assert_eq!(pen.details[HARD_ROOM_COLLISION], 2);
        assert_eq!(pen.hard, 2);
    }

    #[test]
    fn teacher_collision_across_rooms() {
        let inst = instance(
            &["mon_1"],
            vec![room("r1", 30, "normal"), room("r2", 30, "normal")],
            vec![
                session("s1", "t1", &[], 5, "normal"),
                session("s2", "t1", &[], 5, "normal"),
            ],
        );
        let pen = evaluate(&vec![gene("mon_1", "r1"), gene("mon_1", "r2")], &inst).unwrap();
        assert_eq!(pen.details[HARD_TEACHER_COLLISION], 1);
        assert_eq!(pen.hard, 1);
    }

    #[test]
    fn group_collision_counts_every_shared_group() {
        let inst = instance(
            &["mon_1"],
            vec![room("r1", 30, "normal"), room("r2", 30, "normal")],
            vec![
                session("s1", "t1", &["g1", "g2"], 5, "normal"),
                session("s2", "t2", &["g1", "g2"], 5, "normal"),
            ],
        );
        let pen = evaluate(&vec![gene("mon_1", "r1"), gene("mon_1", "r2")], &inst).unwrap();
        assert_eq!(pen.details[HARD_GROUP_COLLISION], 2);
    }

    #[test]
    fn late_slot_and_avoided_day_preferences() {
        let mut inst = instance(
            &["mon_1", "fri_5"],
            vec![room("r1", 30, "normal")],
            vec![session("s1", "t1", &[], 5, "normal")],
        );
        inst.preferences
            .late_slots
            .insert(TimeslotId("fri_5".into()));
        inst.preferences.avoid_days_for_course.insert(
            CourseId("course_s1".into()),
            ["fri".to_string()].into_iter().collect(),
        );
        let pen = evaluate(&vec![gene("fri_5", "r1")], &inst).unwrap();
        assert_eq!(pen.details[SOFT_LATE_SLOT], 1);
        assert_eq!(pen.details[SOFT_AVOID_DAY], 2);
        assert_eq!(pen.soft, 3);
        assert_eq!(pen.total, 3);
    }

    #[test]
    fn gap_between_group_slots_on_one_day() {
        // occupied slots {1, 2, 4}: one idle slot between 2 and 4
        let inst = instance(
            &["d1_1", "d1_2", "d1_3", "d1_4"],
            vec![
                room("r1", 30, "normal"),
                room("r2", 30, "normal"),
                room("r3", 30, "normal"),
            ],
            vec![
                session("s1", "t1", &["g1"], 5, "normal"),
                session("s2", "t2", &["g1"], 5, "normal"),
                session("s3", "t3", &["g1"], 5, "normal"),
            ],
        );
        let cand = vec![gene("d1_1", "r1"), gene("d1_2", "r2"), gene("d1_4", "r3")];
        let pen = evaluate(&cand, &inst).unwrap();
        assert_eq!(pen.details[SOFT_GAPS], 1);
        assert_eq!(pen.soft, 1);
    }

    #[test]
    fn gaps_do_not_cross_days() {
        let inst = instance(
            &["d1_1", "d2_4"],
            vec![room("r1", 30, "normal"), room("r2", 30, "normal")],
            vec![
                session("s1", "t1", &["g1"], 5, "normal"),
                session("s2", "t2", &["g1"], 5, "normal"),
            ],
        );
        let pen = evaluate(&vec![gene("d1_1", "r1"), gene("d2_4", "r2")], &inst).unwrap();
        assert_eq!(pen.details.get(SOFT_GAPS), None);
    }

    #[test]
    fn shape_mismatch_is_an_error() {
        let inst = instance(
            &["mon_1"],
            vec![room("r1", 10, "normal")],
            vec![session("s1", "t1", &[], 5, "normal")],
        );
        let err = evaluate(&vec![], &inst).unwrap_err();
        assert_eq!(err, EvalError::ShapeMismatch { expected: 1, got: 0 });
    }

    #[test]
    fn unknown_room_is_an_error() {
        let inst = instance(
            &["mon_1"],
            vec![room("r1", 10, "normal")],
            vec![session("s1", "t1", &[], 5, "normal")],
        );
        let err = evaluate(&vec![gene("mon_1", "nope")], &inst).unwrap_err();
        assert_eq!(err, EvalError::UnknownRoom("nope".into()));
    }
}
