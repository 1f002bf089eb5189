use anyhow::Context;
use types::GenerateParams;

const PORT: &str = "TIMETABLE__SERVER__PORT";
const MAX_POPULATION: &str = "TIMETABLE__SEARCH__MAX_POPULATION";
const MAX_GENERATIONS: &str = "TIMETABLE__SEARCH__MAX_GENERATIONS";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    /// Upper bound on `populationSize` accepted from clients.
    pub max_population: usize,
    pub max_generations: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            max_population: 1000,
            max_generations: 10_000,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut cfg = Self::default();
        if let Some(v) = get(PORT) {
            cfg.port = v.parse().with_context(|| format!("{PORT}={v}"))?;
        }
        if let Some(v) = get(MAX_POPULATION) {
            cfg.max_population = v.parse().with_context(|| format!("{MAX_POPULATION}={v}"))?;
        }
        if let Some(v) = get(MAX_GENERATIONS) {
            cfg.max_generations = v
                .parse()
                .with_context(|| format!("{MAX_GENERATIONS}={v}"))?;
        }
        Ok(cfg)
    }

    pub fn clamp(&self, params: &mut GenerateParams) {
        params.population_size = params.population_size.min(self.max_population);
        params.generations = params.generations.min(self.max_generations);
        params.elite_count = params.elite_count.min(params.population_size);
    }
}
