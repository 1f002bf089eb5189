use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
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
            Hash,
            Ord,
            PartialOrd,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}
id_newtype!(TeacherId);
id_newtype!(GroupId);
id_newtype!(RoomId);
id_newtype!(SubjectId);

#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Hash, Ord,
    PartialOrd,
)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Day {
    /// Teaching week used when no day set is configured.
    pub const WEEK: [Day; 6] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
    ];
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Default, Eq, PartialEq,
)]
#[serde(rename_all = "lowercase")]
pub enum SlotPreference {
    Morning,
    Evening,
    #[default]
    Any,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq)]
pub struct TimePreference {
    pub day: Day,
    #[serde(default)]
    pub slot: SlotPreference,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeacherPreference {
    pub teacher: TeacherId,
    #[serde(default)]
    pub unavailable_days: Vec<Day>,
    #[serde(default)]
    pub time_preferences: Vec<TimePreference>,
    #[serde(default)]
    pub max_hours_per_week: Option<u32>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: SubjectId,
    #[serde(default)]
    pub hours_per_week: Option<f64>,
}

impl Subject {
    pub fn required_minutes(&self) -> Option<i64> {
        self.hours_per_week.map(|h| (h * 60.0).round() as i64)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct Room {
    pub id: RoomId,
    pub capacity: u32,
    #[serde(default)]
    pub equipment: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq)]
pub struct TimeSlot {
    pub start: String,
    pub end: String,
}

impl TimeSlot {
    pub fn new(start: &str, end: &str) -> Self {
        Self {
            start: start.to_string(),
            end: end.to_string(),
        }
    }

    /// Slots used when none are configured.
    pub fn defaults() -> Vec<TimeSlot> {
        vec![
            TimeSlot::new("08:15", "09:45"),
            TimeSlot::new("10:00", "11:30"),
            TimeSlot::new("11:45", "13:15"),
            TimeSlot::new("15:00", "16:30"),
            TimeSlot::new("16:45", "18:15"),
        ]
    }
}

/// A teaching session that still needs a day, a time and a room.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub subject: SubjectId,
    pub teacher: TeacherId,
    pub group: GroupId,
    #[serde(default)]
    pub group_size: Option<u32>,
    /// Pins the room; the search then only moves the session in time.
    #[serde(default)]
    pub room: Option<RoomId>,
}

impl Session {
    pub fn assign(&self, day: Day, slot: &TimeSlot, room: RoomId) -> ScheduledSession {
        ScheduledSession {
            subject: self.subject.clone(),
            teacher: self.teacher.clone(),
            group: self.group.clone(),
            group_size: self.group_size,
            day,
            start_time: slot.start.clone(),
            end_time: slot.end.clone(),
            room,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledSession {
    pub subject: SubjectId,
    pub teacher: TeacherId,
    pub group: GroupId,
    #[serde(default)]
    pub group_size: Option<u32>,
    pub day: Day,
    pub start_time: String,
    pub end_time: String,
    pub room: RoomId,
}

/// Entity whose sessions the weekly balance check spreads across days.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Default, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum BalanceEntity {
    #[default]
    Group,
    Teacher,
}

fn default_min_break() -> u32 {
    15
}

/// Reference data and switches shared by evaluation and generation.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ConstraintSettings {
    pub days: Vec<Day>,
    pub time_slots: Vec<TimeSlot>,
    pub allowed_session_durations_minutes: Vec<u32>,
    pub session_length_minutes: Option<u32>,
    #[serde(default = "default_min_break")]
    pub min_break_minutes: u32,
    pub preferences: Vec<TeacherPreference>,
    pub subjects: Vec<Subject>,
    pub balance_by: BalanceEntity,
    pub check_session_counts: bool,
    pub check_teacher_load: bool,
}

impl Default for ConstraintSettings {
    fn default() -> Self {
        Self {
            days: Vec::new(),
            time_slots: Vec::new(),
            allowed_session_durations_minutes: Vec::new(),
            session_length_minutes: None,
            min_break_minutes: default_min_break(),
            preferences: Vec::new(),
            subjects: Vec::new(),
            balance_by: BalanceEntity::default(),
            check_session_counts: false,
            check_teacher_load: false,
        }
    }
}

impl ConstraintSettings {
    /// Fills unset days and time slots with the standard week.
    pub fn with_defaults(mut self) -> Self {
        if self.days.is_empty() {
            self.days = Day::WEEK.to_vec();
        }
        if self.time_slots.is_empty() {
            self.time_slots = TimeSlot::defaults();
        }
        self
    }
}

fn default_population_size() -> usize {
    50
}
fn default_generations() -> usize {
    100
}
fn default_elite_count() -> usize {
    5
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateParams {
    #[serde(default = "default_population_size")]
    pub population_size: usize,
    #[serde(default = "default_generations")]
    pub generations: usize,
    #[serde(default = "default_elite_count")]
    pub elite_count: usize,
    /// Fixed seed for reproducible runs; a fresh one is drawn when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub time_limit_sec: Option<u64>,
    #[serde(default)]
    pub parallel_eval: bool,
}

impl Default for GenerateParams {
    fn default() -> Self {
        Self {
            population_size: default_population_size(),
            generations: default_generations(),
            elite_count: default_elite_count(),
            seed: None,
            time_limit_sec: None,
            parallel_eval: false,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub sessions: Vec<Session>,
    pub rooms: Vec<Room>,
    #[serde(flatten)]
    pub settings: ConstraintSettings,
    #[serde(default)]
    pub params: GenerateParams,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateRequest {
    pub schedule: Vec<ScheduledSession>,
    pub rooms: Vec<Room>,
    #[serde(flatten)]
    pub settings: ConstraintSettings,
}

#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Hash, Ord,
    PartialOrd,
)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    SlotAlignment,
    Duration,
    MinBreak,
    Capacity,
    TeacherOverlap,
    GroupOverlap,
    RoomOverlap,
    UnavailableDay,
    TimePreference,
    WeeklyHours,
    SessionCount,
    TeacherLoad,
    WeeklyBalance,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Hard,
    Soft,
}

impl ViolationKind {
    pub fn severity(self) -> Severity {
        match self {
            ViolationKind::UnavailableDay
            | ViolationKind::TimePreference
            | ViolationKind::WeeklyBalance => Severity::Soft,
            _ => Severity::Hard,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct Violation {
    pub kind: ViolationKind,
    pub severity: Severity,
    pub weight: i64,
    pub details: serde_json::Value,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    /// Every constraint is satisfied.
    Perfect,
    /// Budget ran out with violations left.
    BestEffort,
    Cancelled,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub days: Vec<Day>,
    pub time_slots: Vec<TimeSlot>,
    pub allowed_session_durations_minutes: Vec<u32>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResult {
    pub status: GenerationStatus,
    pub fitness_score: i64,
    pub entries: Vec<ScheduledSession>,
    pub violations: Vec<Violation>,
    pub generation_config: GenerationConfig,
    pub stats: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_fill_standard_week() {
        let s = ConstraintSettings::default().with_defaults();
        assert_eq!(s.days.len(), 6);
        assert_eq!(s.days[0], Day::Monday);
        assert_eq!(s.days[5], Day::Saturday);
        assert_eq!(s.time_slots.len(), 5);
        assert_eq!(s.time_slots[0], TimeSlot::new("08:15", "09:45"));
        assert_eq!(s.min_break_minutes, 15);
    }

    #[test]
    fn configured_days_are_kept() {
        let s = ConstraintSettings {
            days: vec![Day::Tuesday],
            ..Default::default()
        }
        .with_defaults();
        assert_eq!(s.days, vec![Day::Tuesday]);
    }

    #[test]
    fn generate_request_defaults_from_json() {
        let req: GenerateRequest = serde_json::from_value(serde_json::json!({
            "sessions": [{"subject": "math", "teacher": "t1", "group": "g1"}],
            "rooms": [{"id": "r1", "capacity": 30}],
            "days": ["Monday", "Friday"]
        }))
        .unwrap();
        assert_eq!(req.settings.days, vec![Day::Monday, Day::Friday]);
        assert_eq!(req.settings.min_break_minutes, 15);
        assert_eq!(req.params.population_size, 50);
        assert_eq!(req.params.generations, 100);
        assert_eq!(req.params.elite_count, 5);
        assert!(req.sessions[0].room.is_none());
    }

    #[test]
    fn required_minutes_round() {
        let s = Subject {
            id: "s".into(),
            hours_per_week: Some(1.5),
        };
        assert_eq!(s.required_minutes(), Some(90));
        let none = Subject {
            id: "s".into(),
            hours_per_week: None,
        };
        assert_eq!(none.required_minutes(), None);
    }

    #[test]
    fn preference_slot_defaults_to_any() {
        let p: TeacherPreference = serde_json::from_value(serde_json::json!({
            "teacher": "t1",
            "timePreferences": [{"day": "Monday"}]
        }))
        .unwrap();
        assert_eq!(p.time_preferences[0].slot, SlotPreference::Any);
        assert!(p.unavailable_days.is_empty());
    }

    #[test]
    fn soft_kinds() {
        assert_eq!(ViolationKind::TimePreference.severity(), Severity::Soft);
        assert_eq!(ViolationKind::UnavailableDay.severity(), Severity::Soft);
        assert_eq!(ViolationKind::RoomOverlap.severity(), Severity::Hard);
    }
}
