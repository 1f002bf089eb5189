use parking_lot::RwLock;
use sched_core::{CancelToken, GenerateRequest, GenerateResult, Solver};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, ToSchema)]
pub struct JobId(pub String);

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    /// The winning timetable and its fitness score.
    Generated { result: GenerateResult },
    Cancelled,
    Failed { message: String },
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            JobStatus::Generated { .. } | JobStatus::Cancelled | JobStatus::Failed { .. }
        )
    }
}

struct Job {
    status: JobStatus,
    cancel: CancelToken,
}

/// In-memory store of generation runs; each run executes on its own task.
#[derive(Clone)]
pub struct InMemJobs<S: Solver> {
    inner: Arc<RwLock<HashMap<String, Job>>>,
    solver: Arc<S>,
}

impl<S: Solver> InMemJobs<S> {
    pub fn new(solver: S) -> Self {
        Self {
            inner: Default::default(),
            solver: Arc::new(solver),
        }
    }

    pub fn enqueue(&self, req: GenerateRequest) -> JobId {
        let id = Uuid::new_v4().to_string();
        let cancel = CancelToken::new();
        self.inner.write().insert(
            id.clone(),
            Job {
                status: JobStatus::Queued,
                cancel: cancel.clone(),
            },
        );

        let map = self.inner.clone();
        let solver = self.solver.clone();
        let id_for_task = id.clone();

        tokio::spawn(async move {
            if !start(&map, &id_for_task) {
                return;
            }
            info!(job = %id_for_task, sessions = req.sessions.len(), "generation started");
            let status = match solver.solve(req, cancel).await {
                Ok(result) => {
                    info!(
                        job = %id_for_task,
                        score = result.fitness_score,
                        "generation finished"
                    );
                    JobStatus::Generated { result }
                }
                Err(e) => {
                    error!(?e, job = %id_for_task, "generation failed");
                    JobStatus::Failed {
                        message: e.to_string(),
                    }
                }
            };
            set_status(&map, &id_for_task, status);
        });

        JobId(id)
    }

    pub fn get(&self, id: &str) -> Option<JobStatus> {
        self.inner.read().get(id).map(|j| j.status.clone())
    }

    /// Signals a job to stop. A queued job is cancelled outright; a running
    /// one returns its best timetable so far. Returns `false` for unknown or
    /// finished jobs.
    pub fn cancel(&self, id: &str) -> bool {
        let mut w = self.inner.write();
        let Some(job) = w.get_mut(id) else {
            return false;
        };
        if job.status.is_finished() {
            return false;
        }
        job.cancel.cancel();
        if matches!(job.status, JobStatus::Queued) {
            job.status = JobStatus::Cancelled;
        }
        true
    }

    pub fn list(&self) -> Vec<(JobId, JobStatus)> {
        self.inner
            .read()
            .iter()
            .map(|(id, j)| (JobId(id.clone()), j.status.clone()))
            .collect()
    }
}

/// Moves a queued job to running; a job cancelled while queued stays put.
fn start(map: &RwLock<HashMap<String, Job>>, id: &str) -> bool {
    match map.write().get_mut(id) {
        Some(job) if matches!(job.status, JobStatus::Queued) => {
            job.status = JobStatus::Running;
            true
        }
        _ => false,
    }
}

fn set_status(map: &RwLock<HashMap<String, Job>>, id: &str, status: JobStatus) {
    if let Some(job) = map.write().get_mut(id) {
        job.status = status;
    }
}
