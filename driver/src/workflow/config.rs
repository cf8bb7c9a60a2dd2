use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use stormcore::prediction::PredictorConfig;
use stormcore::scene::ROTATION_SPEED;
use stormcore::timeline::TICK_DELTA;

pub const OPEN_METEO_ENDPOINT: &str = "https://api.open-meteo.com/v1/forecast";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: OPEN_METEO_ENDPOINT.into(),
            timeout_secs: 10,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Scrub advance per autoplay tick.
    pub timeline_step: u8,
    pub timeline_interval_ms: u64,
    /// Idle globe rotation, radians per frame.
    pub rotation_speed: f64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            timeline_step: TICK_DELTA,
            timeline_interval_ms: 200,
            rotation_speed: ROTATION_SPEED,
        }
    }
}

impl AnimationConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.timeline_interval_ms.max(1))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub bind: SocketAddr,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 9000)),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Storm dataset; the embedded dataset is used when absent or unreadable.
    pub dataset: Option<PathBuf>,
    pub predictor: PredictorConfig,
    pub weather: WeatherConfig,
    pub animation: AnimationConfig,
    pub bridge: BridgeConfig,
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    /// Applies command-line overrides on top of the loaded file.
    pub fn with_overrides(
        mut self,
        dataset: Option<PathBuf>,
        seed: Option<u64>,
        epochs: Option<usize>,
        no_weather: bool,
    ) -> Self {
        if dataset.is_some() {
            self.dataset = dataset;
        }
        if seed.is_some() {
            self.predictor.seed = seed;
        }
        if let Some(epochs) = epochs {
            self.predictor.training.epochs = epochs;
        }
        if no_weather {
            self.weather.enabled = false;
        }
        self
    }
}
