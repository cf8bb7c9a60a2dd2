use crate::prediction::normalize::{normalize, Features, FEATURES};
use crate::prelude::{Storm, TrackPoint, CONTEXT_WINDOW};
use rand::Rng;

/// One context window of normalized points.
pub type Sequence = [Features; CONTEXT_WINDOW];

const SYNTHETIC_LAT_RANGE: std::ops::Range<f64> = 10.0..35.0;
const SYNTHETIC_LON_RANGE: std::ops::Range<f64> = -100.0..-30.0;
const SYNTHETIC_LAT_DRIFT: f64 = 0.8;
const SYNTHETIC_LON_DRIFT: f64 = -1.2;
const SYNTHETIC_WIND_START: f64 = 40.0;
const SYNTHETIC_WIND_DRIFT: f64 = 15.0;
const SYNTHETIC_PRESSURE_START: f64 = 1005.0;
const SYNTHETIC_PRESSURE_DRIFT: f64 = -10.0;

/// Sliding-window examples plus synthetic augmentation.
#[derive(Debug, Clone, Default)]
pub struct TrainingSet {
    pub sequences: Vec<Sequence>,
    pub targets: Vec<Features>,
    pub real_examples: usize,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Sequences flattened to `CONTEXT_WINDOW * FEATURES` columns.
    pub fn flattened_inputs(&self) -> Vec<Vec<f64>> {
        self.sequences
            .iter()
            .map(|sequence| sequence.iter().flatten().copied().collect())
            .collect()
    }

    pub fn target_rows(&self) -> Vec<Vec<f64>> {
        self.targets.iter().map(|target| target.to_vec()).collect()
    }
}

/// Builds the regressor's training set.
///
/// Every run of `CONTEXT_WINDOW + 1` consecutive fixes yields one example;
/// `synthetic` straight-line sequences are appended so the regressor leans
/// toward smooth motion when the real storms are few.
pub fn prepare_training_data<R: Rng + ?Sized>(
    storms: &[Storm],
    synthetic: usize,
    rng: &mut R,
) -> TrainingSet {
    let mut set = TrainingSet::default();

    for storm in storms {
        for window in storm.track.windows(CONTEXT_WINDOW + 1) {
            let mut sequence = [[0.0; FEATURES]; CONTEXT_WINDOW];
            for (slot, point) in sequence.iter_mut().zip(window) {
                *slot = normalize(point);
            }
            set.sequences.push(sequence);
            set.targets.push(normalize(&window[CONTEXT_WINDOW]));
        }
    }
    set.real_examples = set.sequences.len();

    for _ in 0..synthetic {
        let base_lat = rng.gen_range(SYNTHETIC_LAT_RANGE);
        let base_lon = rng.gen_range(SYNTHETIC_LON_RANGE);
        let mut sequence = [[0.0; FEATURES]; CONTEXT_WINDOW];
        for (step, slot) in sequence.iter_mut().enumerate() {
            *slot = synthetic_features(base_lat, base_lon, step);
        }
        set.sequences.push(sequence);
        set.targets
            .push(synthetic_features(base_lat, base_lon, CONTEXT_WINDOW));
    }

    set
}

fn synthetic_features(base_lat: f64, base_lon: f64, step: usize) -> Features {
    let step = step as f64;
    normalize(&TrackPoint::new(
        base_lon + step * SYNTHETIC_LON_DRIFT,
        base_lat + step * SYNTHETIC_LAT_DRIFT,
        SYNTHETIC_WIND_START + step * SYNTHETIC_WIND_DRIFT,
        SYNTHETIC_PRESSURE_START + step * SYNTHETIC_PRESSURE_DRIFT,
    ))
}
