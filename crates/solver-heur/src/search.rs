//! Population search: random initial timetables, then generations of
//! ranking, elitism and single-parent mutation of the current best.

use std::time::{Duration, Instant};

use rayon::prelude::*;
use sched_core::{CancelToken, EvalError, Evaluator};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use types::{Day, GenerateParams, Room, ScheduledSession, Session, TimeSlot};

use crate::sampler::Sampler;

#[derive(Clone, Debug)]
pub struct SearchConfig {
    pub population_size: usize,
    pub generations: usize,
    pub elite_count: usize,
    pub seed: u64,
    pub time_limit: Option<Duration>,
    pub parallel_eval: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            generations: 100,
            elite_count: 5,
            seed: 0,
            time_limit: None,
            parallel_eval: false,
        }
    }
}

impl SearchConfig {
    pub fn from_params(params: &GenerateParams, seed: u64) -> Self {
        Self {
            population_size: params.population_size,
            generations: params.generations,
            elite_count: params.elite_count,
            seed,
            time_limit: params.time_limit_sec.map(Duration::from_secs),
            parallel_eval: params.parallel_eval,
        }
    }
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("cannot search without {0}")]
    EmptyInput(&'static str),
    #[error("population size must be positive")]
    EmptyPopulation,
    #[error(transparent)]
    Eval(#[from] EvalError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The best candidate scored 0.
    Perfect,
    /// Generation budget used up.
    Exhausted,
    Cancelled,
    Deadline,
}

#[derive(Clone, Debug)]
pub struct SearchOutcome {
    pub best: Vec<ScheduledSession>,
    pub score: i64,
    /// Generations ranked, the initial population included.
    pub generations: usize,
    pub evaluations: usize,
    pub termination: Termination,
}

#[derive(Clone, Debug)]
struct Candidate {
    sessions: Vec<ScheduledSession>,
    fitness: Option<i64>,
}

impl Candidate {
    fn score(&self) -> i64 {
        self.fitness.unwrap_or(i64::MIN)
    }
}

pub struct PopulationSearch<'a> {
    sessions: &'a [Session],
    rooms: &'a [Room],
    days: &'a [Day],
    time_slots: &'a [TimeSlot],
    evaluator: &'a Evaluator,
    config: SearchConfig,
}

impl<'a> PopulationSearch<'a> {
    pub fn new(
        sessions: &'a [Session],
        rooms: &'a [Room],
        days: &'a [Day],
        time_slots: &'a [TimeSlot],
        evaluator: &'a Evaluator,
        config: SearchConfig,
    ) -> Result<Self, SearchError> {
        if sessions.is_empty() {
            return Err(SearchError::EmptyInput("sessions"));
        }
        if rooms.is_empty() {
            return Err(SearchError::EmptyInput("rooms"));
        }
        if days.is_empty() {
            return Err(SearchError::EmptyInput("days"));
        }
        if time_slots.is_empty() {
            return Err(SearchError::EmptyInput("time slots"));
        }
        if config.population_size == 0 {
            return Err(SearchError::EmptyPopulation);
        }
        Ok(Self {
            sessions,
            rooms,
            days,
            time_slots,
            evaluator,
            config,
        })
    }

    pub fn run(&self, cancel: &CancelToken) -> Result<SearchOutcome, SearchError> {
        let started = Instant::now();
        let mut sampler = Sampler::seeded(self.config.seed);
        info!(
            sessions = self.sessions.len(),
            rooms = self.rooms.len(),
            population = self.config.population_size,
            generations = self.config.generations,
            seed = self.config.seed,
            "search started"
        );

        let mut population = self.initialize(&mut sampler);
        let mut evaluations = self.rank(&mut population)?;
        let mut generation = 1;

        let termination = loop {
            let best = population[0].score();
            debug!(generation, best, "generation ranked");
            if best == 0 {
                break Termination::Perfect;
            }
            if generation >= self.config.generations {
                break Termination::Exhausted;
            }
            if cancel.is_cancelled() {
                break Termination::Cancelled;
            }
            if self
                .config
                .time_limit
                .is_some_and(|limit| started.elapsed() >= limit)
            {
                break Termination::Deadline;
            }
            population = self.breed(population, &mut sampler);
            evaluations += self.rank(&mut population)?;
            generation += 1;
        };

        let best = population
            .into_iter()
            .next()
            .ok_or(SearchError::EmptyPopulation)?;
        let score = best.score();
        info!(
            ?termination,
            score,
            generations = generation,
            evaluations,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "search finished"
        );
        Ok(SearchOutcome {
            best: best.sessions,
            score,
            generations: generation,
            evaluations,
            termination,
        })
    }

    fn place(&self, session: &Session, sampler: &mut Sampler) -> ScheduledSession {
        let day = *sampler.pick(self.days);
        let slot = sampler.pick(self.time_slots);
        let room = match &session.room {
            Some(fixed) => fixed.clone(),
            None => sampler.pick(self.rooms).id.clone(),
        };
        session.assign(day, slot, room)
    }

    fn initialize(&self, sampler: &mut Sampler) -> Vec<Candidate> {
        let mut population = Vec::with_capacity(self.config.population_size);
        for _ in 0..self.config.population_size {
            let mut sessions = Vec::with_capacity(self.sessions.len());
            for s in self.sessions {
                sessions.push(self.place(s, sampler));
            }
            population.push(Candidate {
                sessions,
                fitness: None,
            });
        }
        population
    }

    /// Scores unscored candidates and sorts best-first. Returns how many
    /// evaluations ran.
    fn rank(&self, population: &mut [Candidate]) -> Result<usize, SearchError> {
        let pending: Vec<usize> = population
            .iter()
            .enumerate()
            .filter(|(_, c)| c.fitness.is_none())
            .map(|(i, _)| i)
            .collect();

        let snapshot: &[Candidate] = population;
        let scores: Vec<i64> = if self.config.parallel_eval {
            pending
                .par_iter()
                .map(|&i| self.evaluator.score(&snapshot[i].sessions))
                .collect::<Result<Vec<i64>, EvalError>>()?
        } else {
            pending
                .iter()
                .map(|&i| self.evaluator.score(&snapshot[i].sessions))
                .collect::<Result<Vec<i64>, EvalError>>()?
        };

        for (&i, score) in pending.iter().zip(scores) {
            population[i].fitness = Some(score);
        }
        population.sort_by(|a, b| b.score().cmp(&a.score()));
        Ok(pending.len())
    }

    /// Keeps the elites and refills with mutated copies of the best.
    fn breed(&self, mut population: Vec<Candidate>, sampler: &mut Sampler) -> Vec<Candidate> {
        let parent = population[0].sessions.clone();
        population.truncate(self.config.elite_count);
        while population.len() < self.config.population_size {
            let mut sessions = parent.clone();
            self.mutate(&mut sessions, sampler);
            population.push(Candidate {
                sessions,
                fitness: None,
            });
        }
        population
    }

    fn mutate(&self, sessions: &mut [ScheduledSession], sampler: &mut Sampler) {
        let i = sampler.index(sessions.len());
        sessions[i] = self.place(&self.sessions[i], sampler);
    }
}
