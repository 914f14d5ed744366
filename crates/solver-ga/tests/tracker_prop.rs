//! Property checks for the tracker/evaluator equivalence contract.

use std::collections::BTreeMap;

use proptest::prelude::*;

use solver_ga::tracker::HardTracker;
use timetable_core::fitness::evaluate;
use types::{
    Candidate, CourseId, Gene, GroupId, Instance, Room, RoomId, Session, SessionId, TeacherId,
    Timeslot, TimeslotId,
};

const TIMESLOTS: [&str; 6] = ["mon_1", "mon_2", "mon_3", "tue_1", "tue_2", "tue_3"];
const ROOMS: [(&str, u32, &str); 4] = [
    ("small", 8, "normal"),
    ("mid", 20, "normal"),
    ("big", 60, "normal"),
    ("lab", 25, "lab"),
];

fn instance() -> Instance {
    let rooms: BTreeMap<RoomId, Room> = ROOMS
        .iter()
        .map(|(id, cap, ty)| {
            (
                RoomId((*id).into()),
                Room {
                    id: RoomId((*id).into()),
                    capacity: *cap,
                    rtype: (*ty).into(),
                },
            )
        })
        .collect();

    let defs: [(&str, &str, &[&str], u32, &str); 5] = [
        ("s1", "t1", &["g1"], 15, "normal"),
        ("s2", "t1", &["g1", "g2"], 25, "lab"),
        ("s3", "t2", &["g2"], 6, "normal"),
        ("s4", "t2", &["g3"], 30, "normal"),
        ("s5", "t3", &["g1", "g3"], 10, "normal"),
    ];
    let sessions = defs
        .iter()
        .map(|(id, teacher, groups, size, ty)| Session {
            id: SessionId((*id).into()),
            course: CourseId(format!("c_{id}")),
            teacher: TeacherId((*teacher).into()),
            groups: groups.iter().map(|g| GroupId((*g).into())).collect(),
            size: *size,
            rtype: (*ty).into(),
        })
        .collect();

    let mut inst = Instance {
        timeslots: TIMESLOTS
            .iter()
            .map(|t| Timeslot {
                id: TimeslotId((*t).into()),
                label: None,
            })
            .collect(),
        rooms,
        sessions,
        teacher_availability: Default::default(),
        preferences: Default::default(),
    };
    inst.teacher_availability.insert(
        TeacherId("t3".into()),
        [TimeslotId("tue_1".into()), TimeslotId("tue_2".into())]
            .into_iter()
            .collect(),
    );
    inst
}

fn gene(ts: usize, room: usize) -> Gene {
    Gene {
        timeslot: TimeslotId(TIMESLOTS[ts % TIMESLOTS.len()].into()),
        room: RoomId(ROOMS[room % ROOMS.len()].0.into()),
    }
}

fn start_candidate(n: usize) -> Candidate {
    (0..n).map(|i| gene(i, i)).collect()
}

proptest! {
    /// After every move and every undo, the tracker's hard total equals what
    /// the full evaluator computes on its working candidate.
    #[test]
    fn hard_total_tracks_the_evaluator(
        ops in prop::collection::vec(
            (0usize..5, 0usize..6, 0usize..4, any::<bool>()),
            1..50,
        )
    ) {
        let inst = instance();
        let mut tracker = HardTracker::new(start_candidate(5), &inst).unwrap();

        for (pos, ts, room, undo) in ops {
            let token = tracker.move_to(
                pos,
                TimeslotId(TIMESLOTS[ts].into()),
                RoomId(ROOMS[room].0.into()),
            );
            let pen = evaluate(tracker.candidate(), &inst).unwrap();
            prop_assert_eq!(tracker.hard(), pen.hard);

            if undo {
                tracker.undo(token);
                let pen = evaluate(tracker.candidate(), &inst).unwrap();
                prop_assert_eq!(tracker.hard(), pen.hard);
            }
        }
    }

    /// undo(move(..)) restores an observably identical tracker for any move,
    /// including the no-op one.
    #[test]
    fn undo_restores_prior_state(
        pos in 0usize..5,
        ts in 0usize..6,
        room in 0usize..4,
    ) {
        let inst = instance();
        let mut tracker = HardTracker::new(start_candidate(5), &inst).unwrap();
        let hard_before = tracker.hard();
        let cand_before = tracker.candidate().clone();

        let token = tracker.move_to(
            pos,
            TimeslotId(TIMESLOTS[ts].into()),
            RoomId(ROOMS[room].0.into()),
        );
        tracker.undo(token);

        prop_assert_eq!(tracker.hard(), hard_before);
        prop_assert_eq!(tracker.candidate(), &cand_before);
    }
}
