pub mod fitness;

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

pub use types::{
    Candidate, Gene, HistoryRow, Instance, Penalty, Placement, Room, Session, SolveEnvelope,
    SolveResult, Timeslot, TimeslotId,
};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid instance: {0}")]
    Msg(String),
}

/// Structural validation of an instance: the checks that make a solve
/// meaningless when they fail. Preference entries are free-form and are not
/// cross-checked here.
pub fn validate(inst: &Instance) -> Result<(), ValidationError> {
    let mut errors: Vec<String> = Vec::new();

    if inst.timeslots.is_empty() {
        errors.push("timeslots is empty".into());
    }
    if inst.rooms.is_empty() {
        errors.push("rooms is empty".into());
    }
    if inst.sessions.is_empty() {
        errors.push("sessions is empty".into());
    }

    let mut seen_ts: HashSet<&str> = HashSet::new();
    for t in &inst.timeslots {
        if !seen_ts.insert(t.id.0.as_str()) {
            errors.push(format!("duplicate timeslot id: {}", t.id));
        }
    }
    let mut seen_sessions: HashSet<&str> = HashSet::new();
    for s in &inst.sessions {
        if !seen_sessions.insert(s.id.0.as_str()) {
            errors.push(format!("duplicate session id: {}", s.id));
        }
    }

    let times: HashSet<&TimeslotId> = inst.timeslots.iter().map(|t| &t.id).collect();
    for (teacher, slots) in &inst.teacher_availability {
        for slot in slots {
            if !times.contains(slot) {
                errors.push(format!(
                    "teacher {teacher} availability references unknown timeslot {slot}"
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::Msg(errors.join("; ")))
    }
}

/// Evaluation failures. Both variants indicate a malformed candidate, never a
/// bad schedule: degraded schedules evaluate fine and just score poorly.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum EvalError {
    #[error("candidate length {got} does not match session count {expected}")]
    ShapeMismatch { expected: usize, got: usize },
    #[error("candidate references unknown room id {0}")]
    UnknownRoom(String),
}

/// Joins a candidate with its instance into the per-session view consumed by
/// the timetable grid and the CSV export.
pub fn placement_view(inst: &Instance, cand: &Candidate) -> Vec<Placement> {
    let labels: HashMap<&TimeslotId, &Timeslot> =
        inst.timeslots.iter().map(|t| (&t.id, t)).collect();
    cand.iter()
        .zip(&inst.sessions)
        .map(|(gene, s)| Placement {
            session: s.id.clone(),
            course: s.course.clone(),
            teacher: s.teacher.clone(),
            groups: s.groups.clone(),
            size: s.size,
            room_type: s.rtype.clone(),
            timeslot: gene.timeslot.clone(),
            timeslot_label: labels
                .get(&gene.timeslot)
                .map(|t| t.label().to_string())
                .unwrap_or_else(|| gene.timeslot.0.clone()),
            room: gene.room.clone(),
        })
        .collect()
}

pub type ProgressSink = Arc<dyn Fn(&HistoryRow) + Send + Sync>;

/// Seam between the job layer and a solver implementation. The progress sink
/// is invoked synchronously from the solver's control thread at its reporting
/// cadence; implementations must keep it fast.
#[async_trait]
pub trait Solver: Send + Sync + 'static {
    async fn solve(
        &self,
        env: SolveEnvelope,
        progress: Option<ProgressSink>,
    ) -> anyhow::Result<SolveResult>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use types::{RoomId, SessionId, TeacherId};

    fn room(id: &str, capacity: u32) -> Room {
        Room {
            id: RoomId(id.into()),
            capacity,
            rtype: "normal".into(),
        }
    }

    fn session(id: &str) -> Session {
        Session {
            id: SessionId(id.into()),
            course: types::CourseId("c1".into()),
            teacher: TeacherId("t1".into()),
            groups: vec![],
            size: 10,
            rtype: "normal".into(),
        }
    }

    fn minimal_instance() -> Instance {
        let mut rooms = BTreeMap::new();
        rooms.insert(RoomId("r1".into()), room("r1", 30));
        Instance {
            timeslots: vec![Timeslot {
                id: TimeslotId("mon_1".into()),
                label: None,
            }],
            rooms,
            sessions: vec![session("s1")],
            teacher_availability: HashMap::new(),
            preferences: Default::default(),
        }
    }

    #[test]
    fn minimal_instance_is_valid() {
        assert!(validate(&minimal_instance()).is_ok());
    }

    #[test]
    fn empty_collections_are_rejected() {
        let mut inst = minimal_instance();
        inst.sessions.clear();
        let err = validate(&inst).unwrap_err();
        assert!(err.to_string().contains("sessions is empty"));

        let mut inst = minimal_instance();
        inst.timeslots.clear();
        assert!(validate(&inst).is_err());

        let mut inst = minimal_instance();
        inst.rooms.clear();
        assert!(validate(&inst).is_err());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut inst = minimal_instance();
        inst.sessions.push(session("s1"));
        let err = validate(&inst).unwrap_err();
        assert!(err.to_string().contains("duplicate session id"));
    }

    #[test]
    fn availability_must_reference_known_timeslots() {
        let mut inst = minimal_instance();
        inst.teacher_availability.insert(
            TeacherId("t1".into()),
            [TimeslotId("zzz_9".into())].into_iter().collect(),
        );
        assert!(validate(&inst).is_err());
    }

    #[test]
    fn placement_view_aligns_with_sessions() {
        let inst = minimal_instance();
        let cand = vec![Gene {
            timeslot: TimeslotId("mon_1".into()),
            room: RoomId("r1".into()),
        }];
        let view = placement_view(&inst, &cand);
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].session.0, "s1");
        assert_eq!(view[0].timeslot_label, "mon_1");
        assert_eq!(view[0].room.0, "r1");
    }
}
