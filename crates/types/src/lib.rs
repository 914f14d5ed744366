use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use utoipa::ToSchema;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Clone,
            Debug,
            Serialize,
            Deserialize,
            ToSchema,
            JsonSchema,
            Eq,
            PartialEq,
            Ord,
            PartialOrd,
            Hash,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}
id_newtype!(TeacherId);
id_newtype!(GroupId);
id_newtype!(RoomId);
id_newtype!(CourseId);
id_newtype!(SessionId);

/// Timeslot identifier following the `"<day>_<slotNumber>"` convention.
/// Day membership and intra-day ordering are derived from this id alone.
#[derive(
    Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Ord, PartialOrd, Hash,
)]
#[serde(transparent)]
pub struct TimeslotId(pub String);

impl TimeslotId {
    fn sep(&self) -> Option<usize> {
        self.0.find(|c| c == '_' || c == ',')
    }

    /// Day token: everything before the first `_` (or `,`, the legacy
    /// separator). Ids without a separator are their own day token.
    pub fn day_token(&self) -> &str {
        match self.sep() {
            Some(i) => &self.0[..i],
            None => &self.0,
        }
    }

    /// Intra-day slot number parsed from the suffix after the separator.
    /// 0 when the separator is absent or the suffix does not parse.
    pub fn slot_number(&self) -> i64 {
        match self.sep() {
            Some(i) => self.0[i + 1..].parse().unwrap_or(0),
            None => 0,
        }
    }
}

impl fmt::Display for TimeslotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

fn default_room_type() -> String {
    "normal".into()
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct Room {
    pub id: RoomId,
    pub capacity: u32,
    #[serde(default = "default_room_type")]
    pub rtype: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct Timeslot {
    pub id: TimeslotId,
    #[serde(default)]
    pub label: Option<String>,
}

impl Timeslot {
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id.0)
    }
}

/// One weekly meeting of a course. A course taught N times a week expands to
/// N sessions sharing course, teacher and groups; the loader does that
/// expansion before the instance reaches the solver.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct Session {
    pub id: SessionId,
    pub course: CourseId,
    pub teacher: TeacherId,
    #[serde(default)]
    pub groups: Vec<GroupId>,
    pub size: u32,
    #[serde(default = "default_room_type")]
    pub rtype: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct Preferences {
    #[serde(default)]
    pub late_slots: HashSet<TimeslotId>,
    #[serde(default)]
    pub avoid_days_for_course: HashMap<CourseId, HashSet<String>>,
}

/// Immutable problem instance. Loaded once per job and treated as read-only
/// for the whole solve. Session order fixes the candidate encoding: gene i of
/// every candidate belongs to `sessions[i]`.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct Instance {
    pub timeslots: Vec<Timeslot>,
    pub rooms: BTreeMap<RoomId, Room>,
    pub sessions: Vec<Session>,
    /// Teachers absent from this map are available in every timeslot.
    #[serde(default)]
    pub teacher_availability: HashMap<TeacherId, HashSet<TimeslotId>>,
    #[serde(default)]
    pub preferences: Preferences,
}

impl Instance {
    pub fn availability(&self, teacher: &TeacherId) -> Option<&HashSet<TimeslotId>> {
        self.teacher_availability.get(teacher)
    }
}

/// One gene of a candidate: the (timeslot, room) pair assigned to the session
/// at the same position.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Hash)]
pub struct Gene {
    pub timeslot: TimeslotId,
    pub room: RoomId,
}

/// Full assignment, positionally aligned with `Instance::sessions`.
pub type Candidate = Vec<Gene>;

/// Weight that gives hard violations strict priority over soft ones in the
/// reporting scalar. Ranking inside the solver uses `Penalty::rank` instead,
/// which stays correct even when soft counts exceed this weight.
pub const HARD_WEIGHT: i64 = 1000;

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq)]
pub struct Penalty {
    pub total: i64,
    pub hard: i64,
    pub soft: i64,
    #[serde(default)]
    pub details: BTreeMap<String, i64>,
}

impl Penalty {
    pub fn from_counts(hard: i64, soft: i64, details: BTreeMap<String, i64>) -> Self {
        Self {
            total: hard * HARD_WEIGHT + soft,
            hard,
            soft,
            details,
        }
    }

    /// Two-key comparison key: hard first, soft second.
    pub fn rank(&self) -> (i64, i64) {
        (self.hard, self.soft)
    }

    pub fn is_perfect(&self) -> bool {
        self.hard == 0 && self.soft == 0
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq)]
pub struct HistoryRow {
    pub generation: u32,
    pub best_total: i64,
    pub best_hard: i64,
    pub best_soft: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(default)]
pub struct GaConfig {
    pub pop_size: usize,
    pub generations: u32,
    pub elite: usize,
    pub tournament_k: usize,
    pub cx_rate: f64,
    pub mut_rate: f64,
    pub seed: u64,
    pub use_repair: bool,
    /// Progress-report interval in generations; 0 keeps only the
    /// unconditional reports (generation 0, final, early termination).
    pub log_every: u32,
    /// 1 = sequential and fully deterministic for a fixed seed. Above 1 the
    /// repair randomness is worker-local and results may vary run to run.
    pub workers: usize,
    pub repair_attempts_per_gene: u32,
    pub repair_max_rounds: u32,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            pop_size: 250,
            generations: 600,
            elite: 12,
            tournament_k: 3,
            cx_rate: 0.9,
            mut_rate: 0.12,
            seed: 42,
            use_repair: true,
            log_every: 25,
            workers: 1,
            repair_attempts_per_gene: 15,
            repair_max_rounds: 2,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct SolveEnvelope {
    pub instance: Instance,
    #[serde(default)]
    pub params: GaConfig,
}

/// Session placement joined with its assignment, the shape the presentation
/// layer (timetable grid, CSV export) consumes.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct Placement {
    pub session: SessionId,
    pub course: CourseId,
    pub teacher: TeacherId,
    pub groups: Vec<GroupId>,
    pub size: u32,
    pub room_type: String,
    pub timeslot: TimeslotId,
    pub timeslot_label: String,
    pub room: RoomId,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct SolveResult {
    pub status: String,
    pub penalty: Penalty,
    pub candidate: Vec<Gene>,
    pub placements: Vec<Placement>,
    pub history: Vec<HistoryRow>,
    pub stats: serde_json::Value,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct BaselineResult {
    pub best: Vec<Gene>,
    pub penalty: Penalty,
    pub tries: u32,
    pub seed: u64,
}
