use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of points the regressor consumes as context.
pub const CONTEXT_WINDOW: usize = 5;

/// One observed or forecast storm fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub lon: f64,
    pub lat: f64,
    pub wind: f64,
    pub pressure: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

impl TrackPoint {
    pub fn new(lon: f64, lat: f64, wind: f64, pressure: f64) -> Self {
        Self {
            lon,
            lat,
            wind,
            pressure,
            time: None,
        }
    }

    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }
}

/// Forecast sources that produce a prediction sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Ai,
    Ecmwf,
    Gfs,
}

impl ModelKind {
    pub const ALL: [ModelKind; 3] = [ModelKind::Ai, ModelKind::Ecmwf, ModelKind::Gfs];

    pub fn tag(self) -> &'static str {
        match self {
            ModelKind::Ai => "ai",
            ModelKind::Ecmwf => "ecmwf",
            ModelKind::Gfs => "gfs",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ModelKind::Ai => "AI Ensemble",
            ModelKind::Ecmwf => "ECMWF",
            ModelKind::Gfs => "GFS",
        }
    }
}

/// Model-selection mode chosen in the UI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelSelection {
    #[default]
    Ai,
    Ecmwf,
    Gfs,
    All,
}

impl ModelSelection {
    /// Models drawn for this selection, in draw order.
    pub fn models(self) -> Vec<ModelKind> {
        match self {
            ModelSelection::Ai => vec![ModelKind::Ai],
            ModelSelection::Ecmwf => vec![ModelKind::Ecmwf],
            ModelSelection::Gfs => vec![ModelKind::Gfs],
            ModelSelection::All => ModelKind::ALL.to_vec(),
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            ModelSelection::Ai => "ai",
            ModelSelection::Ecmwf => "ecmwf",
            ModelSelection::Gfs => "gfs",
            ModelSelection::All => "all",
        }
    }
}

impl FromStr for ModelSelection {
    type Err = TrackError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "ai" => Ok(ModelSelection::Ai),
            "ecmwf" => Ok(ModelSelection::Ecmwf),
            "gfs" => Ok(ModelSelection::Gfs),
            "all" => Ok(ModelSelection::All),
            other => Err(TrackError::UnknownModel(other.to_string())),
        }
    }
}

impl fmt::Display for ModelSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Anything that can be drawn on the globe: a model forecast or the observed track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackSource {
    Model(ModelKind),
    Actual,
}

impl TrackSource {
    pub fn tag(self) -> &'static str {
        match self {
            TrackSource::Model(kind) => kind.tag(),
            TrackSource::Actual => "actual",
        }
    }
}

/// Aligned forecast sequences for one storm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionSet {
    pub ai: Vec<TrackPoint>,
    pub ecmwf: Vec<TrackPoint>,
    pub gfs: Vec<TrackPoint>,
}

impl PredictionSet {
    pub fn get(&self, kind: ModelKind) -> &[TrackPoint] {
        match kind {
            ModelKind::Ai => &self.ai,
            ModelKind::Ecmwf => &self.ecmwf,
            ModelKind::Gfs => &self.gfs,
        }
    }

    /// True when every sequence lines up index-for-index with `track`.
    pub fn is_aligned_with(&self, track: &[TrackPoint]) -> bool {
        ModelKind::ALL
            .iter()
            .all(|&kind| self.get(kind).len() == track.len())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Storm {
    pub id: String,
    pub name: String,
    pub category: String,
    pub dates: String,
    pub basin: String,
    pub track: Vec<TrackPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predictions: Option<PredictionSet>,
}

impl Storm {
    /// Points for `source`, or `None` when predictions have not been attached.
    pub fn points_for(&self, source: TrackSource) -> Option<&[TrackPoint]> {
        match source {
            TrackSource::Actual => Some(&self.track),
            TrackSource::Model(kind) => self.predictions.as_ref().map(|set| set.get(kind)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
}

/// Dataset contract consumed at startup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub storms: Vec<Storm>,
    #[serde(default)]
    pub cities: Vec<City>,
}

/// Common error type for the prediction and scene core.
#[derive(thiserror::Error, Debug)]
pub enum TrackError {
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error("model has not been built")]
    ModelNotBuilt,
    #[error("model has not been trained")]
    NotTrained,
    #[error("training failed: {0}")]
    Training(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("unknown model tag: {0}")]
    UnknownModel(String),
    #[error("storm index {index} out of range ({count} storms)")]
    StormOutOfRange { index: usize, count: usize },
    #[error("session not interactive yet")]
    NotInteractive,
}

pub type TrackResult<T> = Result<T, TrackError>;
