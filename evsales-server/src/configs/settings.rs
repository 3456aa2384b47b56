use std::env;
use std::num::NonZeroUsize;
use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use evsales_analyser::forecast::ForecastWindow;
use evsales_analyser::random_forest::RandomForestBuilder;
use evsales_analyser::trainer::serving_forest;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logger {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub path: String,
    #[serde(default)]
    pub fallback_paths: Vec<String>,
}

impl Dataset {
    /// Locations to try, in order.
    pub fn candidates(&self) -> Vec<PathBuf> {
        std::iter::once(&self.path)
            .chain(&self.fallback_paths)
            .map(PathBuf::from)
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    pub trees: NonZeroUsize,
    pub max_depth: NonZeroUsize,
    #[serde(default)]
    pub max_features: Option<NonZeroUsize>,
    pub seed: u64,
    #[serde(default)]
    pub parallel: bool,
    #[serde(default)]
    pub encoding_path: Option<String>,
}

impl Model {
    pub fn forest(&self) -> RandomForestBuilder {
        RandomForestBuilder {
            trees: self.trees,
            max_depth: Some(self.max_depth),
            max_features: self.max_features,
            seed: Some(self.seed),
            parallel: self.parallel,
            ..serving_forest()
        }
    }
}

impl Default for Model {
    fn default() -> Self {
        let forest = serving_forest();
        Self {
            trees: forest.trees,
            max_depth: forest.max_depth.unwrap_or(NonZeroUsize::MIN),
            max_features: forest.max_features,
            seed: forest.seed.unwrap_or_default(),
            parallel: forest.parallel,
            encoding_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub logger: Logger,
    pub dataset: Dataset,
    #[serde(default)]
    pub model: Model,
    #[serde(default)]
    pub forecast: ForecastWindow,
}

impl Settings {
    /// Layers `configs/default`, `configs/<RUN_MODE>` and `EVSALES__*`
    /// environment variables, e.g. `EVSALES__DATASET__PATH`.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or("development".into());

        let settings: Settings = Config::builder()
            .add_source(File::with_name("configs/default"))
            .add_source(File::with_name(&format!("configs/{run_mode}")).required(false))
            .add_source(Environment::with_prefix("EVSALES").separator("__"))
            .build()?
            .try_deserialize()?;

        if settings.forecast.history_start > settings.forecast.history_end {
            Err(ConfigError::Message(format!(
                "forecast.history_start ({}) is after forecast.history_end ({})",
                settings.forecast.history_start, settings.forecast.history_end
            )))?
        }

        Ok(settings)
    }
}
