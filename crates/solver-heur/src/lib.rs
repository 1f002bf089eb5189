pub mod sampler;
pub mod search;

use async_trait::async_trait;
use sched_core::{validate, CancelToken, EvalOptions, Evaluator, Solver};
use tracing::warn;
use types::{GenerateRequest, GenerateResult, GenerationConfig, GenerationStatus};

pub use search::{PopulationSearch, SearchConfig, SearchError, SearchOutcome, Termination};

/// Genetic timetable generator: elitism plus mutation of the best candidate.
#[derive(Clone, Copy, Debug, Default)]
pub struct GaSolver;

impl GaSolver {
    pub fn new() -> Self {
        Self
    }

    /// Validates `req`, runs the search to completion and reports the winner
    /// with its violation breakdown.
    pub fn generate(
        &self,
        req: &GenerateRequest,
        cancel: &CancelToken,
    ) -> anyhow::Result<GenerateResult> {
        validate(req)?;
        let settings = req.settings.clone().with_defaults();
        let evaluator = Evaluator::new(&req.rooms, EvalOptions::from(&settings))?;
        let seed = req.params.seed.unwrap_or_else(rand::random);
        let config = SearchConfig::from_params(&req.params, seed);
        let population = config.population_size;

        let outcome = PopulationSearch::new(
            &req.sessions,
            &req.rooms,
            &settings.days,
            &settings.time_slots,
            &evaluator,
            config,
        )?
        .run(cancel)?;

        let evaluation = evaluator.evaluate(&outcome.best)?;
        let status = match outcome.termination {
            Termination::Cancelled => GenerationStatus::Cancelled,
            _ if outcome.score == 0 => GenerationStatus::Perfect,
            _ => GenerationStatus::BestEffort,
        };
        if status == GenerationStatus::BestEffort {
            warn!(
                score = outcome.score,
                hard = evaluation.hard_count(),
                "no perfect timetable within budget"
            );
        }

        Ok(GenerateResult {
            status,
            fitness_score: outcome.score,
            entries: outcome.best,
            stats: serde_json::json!({
                "method": "ga",
                "seed": seed,
                "population": population,
                "generations": outcome.generations,
                "evaluations": outcome.evaluations,
                "termination": outcome.termination,
                "counts": evaluation.counts(),
            }),
            violations: evaluation.violations,
            generation_config: GenerationConfig {
                days: settings.days,
                time_slots: settings.time_slots,
                allowed_session_durations_minutes: settings.allowed_session_durations_minutes,
            },
        })
    }
}

#[async_trait]
impl Solver for GaSolver {
    async fn solve(
        &self,
        req: GenerateRequest,
        cancel: CancelToken,
    ) -> anyhow::Result<GenerateResult> {
        let solver = *self;
        tokio::task::spawn_blocking(move || solver.generate(&req, &cancel)).await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{
        ConstraintSettings, Day, GenerateParams, Room, Session, Subject, TimeSlot, ViolationKind,
    };

    fn session(subject: &str, teacher: &str, group: &str) -> Session {
        Session {
            subject: subject.into(),
            teacher: teacher.into(),
            group: group.into(),
            group_size: Some(25),
            room: None,
        }
    }

    fn request(sessions: Vec<Session>, settings: ConstraintSettings) -> GenerateRequest {
        GenerateRequest {
            sessions,
            rooms: vec![Room {
                id: "r1".into(),
                capacity: 50,
                equipment: vec![],
            }],
            settings,
            params: GenerateParams {
                seed: Some(1),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn single_option_is_perfect() {
        let req = request(
            vec![session("math", "t1", "g1")],
            ConstraintSettings {
                days: vec![Day::Monday],
                time_slots: vec![TimeSlot::new("08:15", "09:45")],
                ..Default::default()
            },
        );
        let res = GaSolver::new().solve(req, CancelToken::new()).await.unwrap();
        assert_eq!(res.status, GenerationStatus::Perfect);
        assert_eq!(res.fitness_score, 0);
        assert_eq!(res.entries.len(), 1);
        assert!(res.violations.is_empty());
        assert_eq!(res.stats["generations"], 1);
    }

    #[tokio::test]
    async fn forced_clash_is_best_effort() {
        let req = request(
            vec![session("math", "t1", "g1"), session("physics", "t1", "g2")],
            ConstraintSettings {
                days: vec![Day::Monday],
                time_slots: vec![TimeSlot::new("08:15", "09:45")],
                ..Default::default()
            },
        );
        let res = GaSolver::new().solve(req, CancelToken::new()).await.unwrap();
        assert_eq!(res.status, GenerationStatus::BestEffort);
        assert!(res.fitness_score < 0);
        assert_eq!(res.entries.len(), 2);
        assert!(res
            .violations
            .iter()
            .any(|v| v.kind == ViolationKind::TeacherOverlap));
        assert_eq!(res.stats["generations"], 100);
    }

    #[test]
    fn defaults_fill_generation_config() {
        let req = request(vec![session("math", "t1", "g1")], ConstraintSettings::default());
        let res = GaSolver::new().generate(&req, &CancelToken::new()).unwrap();
        assert_eq!(res.generation_config.days, Day::WEEK.to_vec());
        assert_eq!(res.generation_config.time_slots, TimeSlot::defaults());
        // one session over six days can never be balanced: variance 5/36
        assert_eq!(res.status, GenerationStatus::BestEffort);
        assert_eq!(res.fitness_score, -139);
        assert_eq!(res.violations.len(), 1);
        assert_eq!(res.violations[0].kind, ViolationKind::WeeklyBalance);
    }

    #[test]
    fn reported_score_matches_evaluator() {
        let sessions = vec![
            session("math", "t1", "g1"),
            session("math", "t1", "g2"),
            session("physics", "t2", "g1"),
            session("physics", "t2", "g2"),
        ];
        let req = request(
            sessions,
            ConstraintSettings {
                days: vec![Day::Monday, Day::Tuesday],
                subjects: vec![
                    Subject {
                        id: "math".into(),
                        hours_per_week: Some(1.5),
                    },
                    Subject {
                        id: "physics".into(),
                        hours_per_week: Some(1.5),
                    },
                ],
                ..Default::default()
            },
        );
        let res = GaSolver::new().generate(&req, &CancelToken::new()).unwrap();
        let evaluator = Evaluator::new(
            &req.rooms,
            EvalOptions::from(&req.settings.clone().with_defaults()),
        )
        .unwrap();
        assert_eq!(evaluator.score(&res.entries).unwrap(), res.fitness_score);
    }

    #[test]
    fn invalid_request_is_rejected() {
        let mut req = request(vec![], ConstraintSettings::default());
        req.rooms.clear();
        let err = GaSolver::new()
            .generate(&req, &CancelToken::new())
            .unwrap_err();
        assert!(err.to_string().contains("sessions is empty"));
    }
}
