pub mod fitness;
pub mod time;

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

pub use fitness::{evaluate, evaluate_detailed, EvalError, EvalOptions, Evaluation, Evaluator};
pub use time::{is_overlapping, time_to_minutes, Interval, TimeError};
pub use types::{
    GenerateRequest, GenerateResult, Room, ScheduledSession, Session, TeacherPreference, TimeSlot,
};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid request: {0}")]
    Msg(String),
}

/// Checks the preconditions the search relies on. Every problem found is
/// reported, joined with `"; "`.
pub fn validate(req: &GenerateRequest) -> Result<(), ValidationError> {
    let mut errors: Vec<String> = Vec::new();

    if req.sessions.is_empty() {
        errors.push("sessions is empty".into());
    }
    if req.rooms.is_empty() {
        errors.push("rooms is empty".into());
    }

    let mut days = HashSet::new();
    for day in &req.settings.days {
        if !days.insert(day) {
            errors.push(format!("day {day} is listed more than once"));
        }
    }

    for (i, slot) in req.settings.time_slots.iter().enumerate() {
        if let Err(e) = Interval::parse(&slot.start, &slot.end) {
            errors.push(format!("time slot {i}: {e}"));
        }
    }
    if req.settings.session_length_minutes == Some(0) {
        errors.push("sessionLengthMinutes must be positive".into());
    }

    let mut seen = HashSet::new();
    for r in &req.rooms {
        if !seen.insert(&r.id) {
            errors.push(format!("duplicate room id: {}", r.id));
        }
        if r.capacity == 0 {
            errors.push(format!("room {} has capacity 0", r.id));
        }
    }

    for (i, s) in req.sessions.iter().enumerate() {
        if let Some(room) = &s.room {
            if !seen.contains(room) {
                errors.push(format!("session {i} is pinned to missing room {room}"));
            }
        }
        if s.group_size == Some(0) {
            errors.push(format!("session {i} has groupSize=0"));
        }
    }

    let mut teachers = HashSet::new();
    for p in &req.settings.preferences {
        if !teachers.insert(&p.teacher) {
            errors.push(format!("duplicate preference for teacher {}", p.teacher));
        }
        if let Some(h) = p.max_hours_per_week {
            if !(1..=40).contains(&h) {
                errors.push(format!(
                    "teacher {} has maxHoursPerWeek={h} outside 1..=40",
                    p.teacher
                ));
            }
        }
    }

    for s in &req.settings.subjects {
        if matches!(s.hours_per_week, Some(h) if !h.is_finite() || h < 0.0) {
            errors.push(format!("subject {} has invalid hoursPerWeek", s.id));
        }
    }

    let p = &req.params;
    if p.population_size == 0 {
        errors.push("populationSize must be positive".into());
    }
    if p.elite_count > p.population_size {
        errors.push(format!(
            "eliteCount {} exceeds populationSize {}",
            p.elite_count, p.population_size
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::Msg(errors.join("; ")))
    }
}

/// Cooperative stop signal shared between a running search and its owner.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[async_trait]
pub trait Solver: Send + Sync + 'static {
    async fn solve(&self, req: GenerateRequest, cancel: CancelToken)
        -> anyhow::Result<GenerateResult>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{ConstraintSettings, Day, GenerateParams};

    fn request() -> GenerateRequest {
        GenerateRequest {
            sessions: vec![Session {
                subject: "math".into(),
                teacher: "t1".into(),
                group: "g1".into(),
                group_size: Some(20),
                room: None,
            }],
            rooms: vec![Room {
                id: "r1".into(),
                capacity: 30,
                equipment: vec![],
            }],
            settings: ConstraintSettings::default(),
            params: GenerateParams::default(),
        }
    }

    #[test]
    fn accepts_minimal_request() {
        assert!(validate(&request()).is_ok());
    }

    #[test]
    fn rejects_empty_inputs() {
        let mut req = request();
        req.sessions.clear();
        req.rooms.clear();
        let ValidationError::Msg(msg) = validate(&req).unwrap_err();
        assert!(msg.contains("sessions is empty"));
        assert!(msg.contains("rooms is empty"));
    }

    #[test]
    fn reports_every_problem() {
        let mut req = request();
        req.settings.time_slots = vec![TimeSlot::new("10:00", "09:00"), TimeSlot::new("x", "09:00")];
        req.sessions[0].room = Some("nowhere".into());
        req.rooms.push(req.rooms[0].clone());
        req.params.elite_count = 60;
        let ValidationError::Msg(msg) = validate(&req).unwrap_err();
        let parts: Vec<&str> = msg.split("; ").collect();
        assert_eq!(parts.len(), 5, "{msg}");
        assert!(msg.contains("duplicate room id: r1"));
        assert!(msg.contains("missing room nowhere"));
    }

    #[test]
    fn rejects_repeated_day() {
        let mut req = request();
        req.settings.days = vec![Day::Monday, Day::Monday, Day::Tuesday];
        let ValidationError::Msg(msg) = validate(&req).unwrap_err();
        assert_eq!(msg, "day Monday is listed more than once");
    }

    #[test]
    fn cancel_token_is_shared() {
        let token = CancelToken::new();
        let other = token.clone();
        assert!(!other.is_cancelled());
        token.cancel();
        assert!(other.is_cancelled());
    }
}
