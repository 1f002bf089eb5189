//! Constraint evaluator: turns a fully assigned schedule into one fitness score.
//!
//! The score starts at zero and every violation subtracts its weight, so a
//! perfect schedule scores exactly `0` and anything else is negative.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use types::{
    BalanceEntity, ConstraintSettings, Day, GroupId, Room, RoomId, ScheduledSession, Severity,
    SlotPreference, Subject, SubjectId, TeacherId, TeacherPreference, TimeSlot, Violation,
    ViolationKind,
};

use crate::time::{Interval, TimeError};

pub const HARD_PENALTY: i64 = 1000;
/// Soft violations currently weigh as much as hard ones.
pub const SOFT_PENALTY: i64 = 1000;
pub const DEFAULT_MIN_BREAK: u32 = 15;

/// Start times before this are "morning", after it "evening".
const MIDDAY: u32 = 13 * 60 + 15;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("session {index}: {source}")]
    Session { index: usize, source: TimeError },
    #[error("time slot {index}: {source}")]
    Slot { index: usize, source: TimeError },
}

#[derive(Clone, Debug)]
pub struct EvalOptions {
    /// `None` disables the preference check.
    pub preferences: Option<HashMap<TeacherId, TeacherPreference>>,
    /// `None` disables the weekly-hour checks.
    pub subjects: Option<HashMap<SubjectId, Subject>>,
    pub days: Vec<Day>,
    /// Empty disables slot alignment.
    pub time_slots: Vec<TimeSlot>,
    pub session_length: Option<u32>,
    pub allowed_durations: Vec<u32>,
    pub min_break: u32,
    pub balance_by: BalanceEntity,
    pub check_session_counts: bool,
    pub check_teacher_load: bool,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            preferences: None,
            subjects: None,
            days: Vec::new(),
            time_slots: Vec::new(),
            session_length: None,
            allowed_durations: Vec::new(),
            min_break: DEFAULT_MIN_BREAK,
            balance_by: BalanceEntity::Group,
            check_session_counts: false,
            check_teacher_load: false,
        }
    }
}

impl From<&ConstraintSettings> for EvalOptions {
    fn from(s: &ConstraintSettings) -> Self {
        let preferences = (!s.preferences.is_empty()).then(|| {
            s.preferences
                .iter()
                .map(|p| (p.teacher.clone(), p.clone()))
                .collect()
        });
        let subjects = (!s.subjects.is_empty())
            .then(|| s.subjects.iter().map(|x| (x.id.clone(), x.clone())).collect());
        Self {
            preferences,
            subjects,
            days: s.days.clone(),
            time_slots: s.time_slots.clone(),
            session_length: s.session_length_minutes,
            allowed_durations: s.allowed_session_durations_minutes.clone(),
            min_break: s.min_break_minutes,
            balance_by: s.balance_by,
            check_session_counts: s.check_session_counts,
            check_teacher_load: s.check_teacher_load,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Evaluation {
    pub score: i64,
    pub violations: Vec<Violation>,
}

impl Evaluation {
    pub fn count(&self, kind: ViolationKind) -> usize {
        self.violations.iter().filter(|v| v.kind == kind).count()
    }

    pub fn hard_count(&self) -> usize {
        self.violations
            .iter()
            .filter(|v| v.severity == Severity::Hard)
            .count()
    }

    pub fn counts(&self) -> BTreeMap<ViolationKind, usize> {
        let mut out = BTreeMap::new();
        for v in &self.violations {
            *out.entry(v.kind).or_insert(0) += 1;
        }
        out
    }
}

/// Accumulates penalties; details are only materialised for reports.
struct Tally {
    penalty: i64,
    violations: Option<Vec<Violation>>,
}

impl Tally {
    fn record(&mut self, kind: ViolationKind, weight: i64, details: impl FnOnce() -> serde_json::Value) {
        self.penalty += weight;
        if let Some(out) = self.violations.as_mut() {
            out.push(Violation {
                kind,
                severity: kind.severity(),
                weight,
                details: details(),
            });
        }
    }

    fn violation(&mut self, kind: ViolationKind, details: impl FnOnce() -> serde_json::Value) {
        let weight = match kind.severity() {
            Severity::Hard => HARD_PENALTY,
            Severity::Soft => SOFT_PENALTY,
        };
        self.record(kind, weight, details);
    }
}

struct PairLoad {
    required: i64,
    durations: Vec<u32>,
}

fn teacher_key(s: &ScheduledSession) -> &str {
    s.teacher.0.as_str()
}

fn group_key(s: &ScheduledSession) -> &str {
    s.group.0.as_str()
}

/// Reference data indexed once and reused for every candidate of a search.
#[derive(Clone, Debug)]
pub struct Evaluator {
    capacity: HashMap<RoomId, u32>,
    slots: HashSet<(u32, u32)>,
    required: HashMap<SubjectId, i64>,
    options: EvalOptions,
}

impl Evaluator {
    pub fn new(rooms: &[Room], options: EvalOptions) -> Result<Self, EvalError> {
        let capacity: HashMap<RoomId, u32> = rooms.iter().map(|r| (r.id.clone(), r.capacity)).collect();
        let slots: HashSet<(u32, u32)> = options
            .time_slots
            .iter()
            .enumerate()
            .map(|(index, slot)| {
                Interval::parse(&slot.start, &slot.end)
                    .map(|i| (i.start, i.end))
                    .map_err(|source| EvalError::Slot { index, source })
            })
            .collect::<Result<_, _>>()?;
        let required = options
            .subjects
            .iter()
            .flat_map(|m| m.values())
            .filter_map(|s| s.required_minutes().map(|m| (s.id.clone(), m)))
            .collect();
        Ok(Self {
            capacity,
            slots,
            required,
            options,
        })
    }

    pub fn options(&self) -> &EvalOptions {
        &self.options
    }

    pub fn score(&self, schedule: &[ScheduledSession]) -> Result<i64, EvalError> {
        let mut tally = Tally {
            penalty: 0,
            violations: None,
        };
        self.run(schedule, &mut tally)?;
        Ok(-tally.penalty)
    }

    pub fn evaluate(&self, schedule: &[ScheduledSession]) -> Result<Evaluation, EvalError> {
        let mut tally = Tally {
            penalty: 0,
            violations: Some(Vec::new()),
        };
        self.run(schedule, &mut tally)?;
        Ok(Evaluation {
            score: -tally.penalty,
            violations: tally.violations.unwrap_or_default(),
        })
    }

    fn run(&self, schedule: &[ScheduledSession], tally: &mut Tally) -> Result<(), EvalError> {
        let spans = schedule
            .iter()
            .enumerate()
            .map(|(index, s)| Interval::of(s).map_err(|source| EvalError::Session { index, source }))
            .collect::<Result<Vec<_>, _>>()?;

        self.check_alignment(&spans, tally);
        self.check_durations(&spans, tally);
        self.check_breaks(schedule, &spans, "teacher", teacher_key, tally);
        self.check_breaks(schedule, &spans, "group", group_key, tally);
        self.check_capacity(schedule, tally);
        self.check_overlaps(schedule, &spans, tally);
        self.check_preferences(schedule, &spans, tally);
        self.check_weekly_hours(schedule, &spans, tally);
        if self.options.check_teacher_load {
            self.check_teacher_load(schedule, &spans, tally);
        }
        self.check_balance(schedule, tally);
        Ok(())
    }

    fn check_alignment(&self, spans: &[Interval], tally: &mut Tally) {
        if self.slots.is_empty() {
            return;
        }
        for (i, span) in spans.iter().enumerate() {
            if !self.slots.contains(&(span.start, span.end)) {
                tally.violation(ViolationKind::SlotAlignment, || {
                    json!({ "session": i, "start": span.start, "end": span.end })
                });
            }
        }
    }

    fn check_durations(&self, spans: &[Interval], tally: &mut Tally) {
        let allowed = &self.options.allowed_durations;
        for (i, span) in spans.iter().enumerate() {
            let d = span.duration();
            let ok = match self.options.session_length {
                Some(len) => d == len,
                None if !allowed.is_empty() => allowed.contains(&d),
                None => true,
            };
            if !ok {
                tally.violation(ViolationKind::Duration, || {
                    json!({ "session": i, "minutes": d })
                });
            }
        }
    }

    fn check_breaks<'a>(
        &self,
        schedule: &'a [ScheduledSession],
        spans: &[Interval],
        entity: &'static str,
        key: fn(&ScheduledSession) -> &str,
        tally: &mut Tally,
    ) {
        let mut lanes: BTreeMap<(Day, &'a str), Vec<usize>> = BTreeMap::new();
        for (i, s) in schedule.iter().enumerate() {
            lanes.entry((s.day, key(s))).or_default().push(i);
        }
        let min_break = i64::from(self.options.min_break);
        for ((day, id), mut lane) in lanes {
            lane.sort_by_key(|&i| (spans[i].start, spans[i].end));
            for pair in lane.windows(2) {
                let gap = i64::from(spans[pair[1]].start) - i64::from(spans[pair[0]].end);
                if gap < min_break {
                    tally.violation(ViolationKind::MinBreak, || {
                        json!({
                            "entity": entity,
                            "id": id,
                            "day": day,
                            "sessions": [pair[0], pair[1]],
                            "gap": gap,
                        })
                    });
                }
            }
        }
    }

    fn check_capacity(&self, schedule: &[ScheduledSession], tally: &mut Tally) {
        for (i, s) in schedule.iter().enumerate() {
            let (Some(size), Some(&cap)) = (s.group_size, self.capacity.get(&s.room)) else {
                continue;
            };
            if cap < size {
                tally.violation(ViolationKind::Capacity, || {
                    json!({ "session": i, "room": s.room, "capacity": cap, "groupSize": size })
                });
            }
        }
    }

    fn check_overlaps(&self, schedule: &[ScheduledSession], spans: &[Interval], tally: &mut Tally) {
        for i in 0..schedule.len() {
            for j in (i + 1)..schedule.len() {
                let (a, b) = (&schedule[i], &schedule[j]);
                if a.day != b.day || !spans[i].intersects(&spans[j]) {
                    continue;
                }
                if a.teacher == b.teacher {
                    tally.violation(ViolationKind::TeacherOverlap, || {
                        json!({ "id": a.teacher, "sessions": [i, j] })
                    });
                }
                if a.group == b.group {
                    tally.violation(ViolationKind::GroupOverlap, || {
                        json!({ "id": a.group, "sessions": [i, j] })
                    });
                }
                if a.room == b.room {
                    tally.violation(ViolationKind::RoomOverlap, || {
                        json!({ "id": a.room, "sessions": [i, j] })
                    });
                }
            }
        }
    }

    fn check_preferences(
        &self,
        schedule: &[ScheduledSession],
        spans: &[Interval],
        tally: &mut Tally,
    ) {
        let Some(prefs) = &self.options.preferences else {
            return;
        };
        for (i, s) in schedule.iter().enumerate() {
            let Some(pref) = prefs.get(&s.teacher) else {
                continue;
            };
            if pref.unavailable_days.contains(&s.day) {
                tally.violation(ViolationKind::UnavailableDay, || {
                    json!({ "session": i, "teacher": s.teacher, "day": s.day })
                });
                continue;
            }
            let start = spans[i].start;
            let mut declared = false;
            let mut satisfied = false;
            for tp in pref.time_preferences.iter().filter(|tp| tp.day == s.day) {
                declared = true;
                satisfied |= match tp.slot {
                    SlotPreference::Any => true,
                    SlotPreference::Morning => start < MIDDAY,
                    SlotPreference::Evening => start > MIDDAY,
                };
            }
            if declared && !satisfied {
                tally.violation(ViolationKind::TimePreference, || {
                    json!({ "session": i, "teacher": s.teacher, "day": s.day, "start": s.start_time })
                });
            }
        }
    }

    fn check_weekly_hours(
        &self,
        schedule: &[ScheduledSession],
        spans: &[Interval],
        tally: &mut Tally,
    ) {
        if self.required.is_empty() {
            return;
        }
        let mut loads: BTreeMap<(&GroupId, &SubjectId), PairLoad> = BTreeMap::new();
        for (i, s) in schedule.iter().enumerate() {
            let Some(&required) = self.required.get(&s.subject) else {
                continue;
            };
            loads
                .entry((&s.group, &s.subject))
                .or_insert_with(|| PairLoad {
                    required,
                    durations: Vec::new(),
                })
                .durations
                .push(spans[i].duration());
        }

        for ((group, subject), load) in &loads {
            let actual: i64 = load.durations.iter().map(|&d| i64::from(d)).sum();
            if actual != load.required {
                tally.violation(ViolationKind::WeeklyHours, || {
                    json!({
                        "group": group,
                        "subject": subject,
                        "requiredMinutes": load.required,
                        "actualMinutes": actual,
                    })
                });
            }
        }

        if self.options.check_session_counts && !self.options.allowed_durations.is_empty() {
            self.check_session_counts(&loads, tally);
        }
    }

    /// Each (group, subject) must split its weekly minutes into allowed
    /// session lengths: e.g. 180 min with {90} needs exactly two sessions.
    fn check_session_counts(&self, loads: &BTreeMap<(&GroupId, &SubjectId), PairLoad>, tally: &mut Tally) {
        let allowed = &self.options.allowed_durations;
        for ((group, subject), load) in loads {
            if load.durations.iter().any(|d| !allowed.contains(d)) {
                tally.violation(ViolationKind::SessionCount, || {
                    json!({ "group": group, "subject": subject, "durations": load.durations })
                });
                continue;
            }
            let valid_counts: Vec<i64> = allowed
                .iter()
                .map(|&d| i64::from(d))
                .filter(|&d| d > 0 && load.required % d == 0)
                .map(|d| load.required / d)
                .collect();
            let count = load.durations.len() as i64;
            if !valid_counts.is_empty() && !valid_counts.contains(&count) {
                tally.violation(ViolationKind::SessionCount, || {
                    json!({
                        "group": group,
                        "subject": subject,
                        "count": count,
                        "validCounts": valid_counts,
                    })
                });
            }
        }
    }

    fn check_teacher_load(
        &self,
        schedule: &[ScheduledSession],
        spans: &[Interval],
        tally: &mut Tally,
    ) {
        let Some(prefs) = &self.options.preferences else {
            return;
        };
        let mut minutes: BTreeMap<&TeacherId, u32> = BTreeMap::new();
        for (i, s) in schedule.iter().enumerate() {
            *minutes.entry(&s.teacher).or_insert(0) += spans[i].duration();
        }
        for (teacher, total) in minutes {
            let Some(max_hours) = prefs.get(teacher).and_then(|p| p.max_hours_per_week) else {
                continue;
            };
            if u64::from(total) > u64::from(max_hours) * 60 {
                tally.violation(ViolationKind::TeacherLoad, || {
                    json!({ "teacher": teacher, "minutes": total, "maxHours": max_hours })
                });
            }
        }
    }

    fn active_days(&self, schedule: &[ScheduledSession]) -> Vec<Day> {
        let mut seen = Vec::new();
        if !self.options.days.is_empty() {
            for &day in &self.options.days {
                if !seen.contains(&day) {
                    seen.push(day);
                }
            }
            return seen;
        }
        for s in schedule {
            if !seen.contains(&s.day) {
                seen.push(s.day);
            }
        }
        if seen.is_empty() {
            Day::WEEK.to_vec()
        } else {
            seen
        }
    }

    /// Penalises uneven spread: population variance of per-day session
    /// counts, summed over every group (or teacher).
    fn check_balance(&self, schedule: &[ScheduledSession], tally: &mut Tally) {
        let key: fn(&ScheduledSession) -> &str = match self.options.balance_by {
            BalanceEntity::Group => group_key,
            BalanceEntity::Teacher => teacher_key,
        };
        let mut buckets: BTreeMap<&str, HashMap<Day, u32>> = BTreeMap::new();
        for s in schedule {
            *buckets.entry(key(s)).or_default().entry(s.day).or_insert(0) += 1;
        }

        let days = self.active_days(schedule);
        let n = days.len() as f64;
        let mut total = 0.0;
        let mut per_entity: BTreeMap<&str, f64> = BTreeMap::new();
        for (id, per_day) in &buckets {
            let counts: Vec<f64> = days
                .iter()
                .map(|d| f64::from(per_day.get(d).copied().unwrap_or(0)))
                .collect();
            let sum: f64 = counts.iter().sum();
            if sum == 0.0 {
                continue;
            }
            let mean = sum / n;
            let variance = counts.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / n;
            if variance > 0.0 {
                total += variance;
                per_entity.insert(*id, variance);
            }
        }

        let weight = (total * SOFT_PENALTY as f64).round() as i64;
        if weight > 0 {
            tally.record(ViolationKind::WeeklyBalance, weight, || {
                json!({ "entity": self.options.balance_by, "variance": per_entity })
            });
        }
    }
}

/// Scores `schedule` against `rooms` and `options`.
pub fn evaluate(
    schedule: &[ScheduledSession],
    rooms: &[Room],
    options: EvalOptions,
) -> Result<i64, EvalError> {
    Evaluator::new(rooms, options)?.score(schedule)
}

pub fn evaluate_detailed(
    schedule: &[ScheduledSession],
    rooms: &[Room],
    options: EvalOptions,
) -> Result<Evaluation, EvalError> {
    Evaluator::new(rooms, options)?.evaluate(schedule)
}
