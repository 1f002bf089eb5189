use std::sync::Arc;

use jobs::InMemJobs;
use solver_heur::GaSolver;

use crate::config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    pub jobs: Arc<InMemJobs<GaSolver>>,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            jobs: Arc::new(InMemJobs::new(GaSolver::new())),
            config,
        }
    }
}
