use crate::prediction::backend::{BackendKind, EpochReport, RegressionBackend, TrainingConfig};
use crate::prediction::normalize::{denormalize, normalize, FEATURES};
use crate::prediction::training::{prepare_training_data, Sequence};
use crate::prelude::{PredictionSet, Storm, TrackError, TrackPoint, TrackResult, CONTEXT_WINDOW};
use crate::telemetry::LogManager;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Lead-time error growth for the autoregressive forecast.
const AI_ERROR_BASE: f64 = 0.15;
const AI_LAT_FACTOR: f64 = 0.5;

/// Comparison-track error growth: (base, latitude factor, longitude factor).
const ECMWF_ERROR: (f64, f64, f64) = (0.4, 0.6, 1.0);
const GFS_ERROR: (f64, f64, f64) = (0.7, 0.7, 0.7);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    #[serde(flatten)]
    pub training: TrainingConfig,
    pub synthetic_sequences: usize,
    /// Seed for training shuffles and forecast perturbation; entropy when absent.
    pub seed: Option<u64>,
    pub backend: BackendKind,
    pub fallback_backend: BackendKind,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            training: TrainingConfig::default(),
            synthetic_sequences: 200,
            seed: None,
            backend: BackendKind::Matrix,
            fallback_backend: BackendKind::Scalar,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingSummary {
    pub examples: usize,
    pub real_examples: usize,
    pub final_loss: Option<f64>,
}

/// Ground-truth-derived comparison tracks.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonTracks {
    pub ecmwf: Vec<TrackPoint>,
    pub gfs: Vec<TrackPoint>,
}

/// Trains the sequence regressor and produces aligned forecast sequences.
pub struct TrackPredictor {
    config: PredictorConfig,
    backend: Box<dyn RegressionBackend>,
    rng: StdRng,
    built: bool,
    trained: bool,
    logger: LogManager,
}

impl TrackPredictor {
    /// Wraps an already-initialized backend.
    pub fn new(config: PredictorConfig, backend: Box<dyn RegressionBackend>) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            backend,
            rng,
            built: false,
            trained: false,
            logger: LogManager::new("predictor"),
        }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn is_ready(&self) -> bool {
        self.trained
    }

    pub fn build<F>(&mut self, mut on_progress: F) -> TrackResult<()>
    where
        F: FnMut(String, u8),
    {
        on_progress("Building regression model...".into(), 20);
        self.backend.build()?;
        self.built = true;
        self.trained = false;
        on_progress("Model architecture ready".into(), 25);
        Ok(())
    }

    /// Fits the backend on real windows plus synthetic sequences.
    ///
    /// Progress runs from 30 to 65; each epoch reports
    /// `35 + floor(epoch / epochs * 30)`.
    pub fn train<F>(
        &mut self,
        storms: &[Storm],
        mut on_progress: F,
    ) -> TrackResult<TrainingSummary>
    where
        F: FnMut(String, u8),
    {
        if !self.built {
            return Err(TrackError::ModelNotBuilt);
        }

        on_progress("Preparing training data...".into(), 30);
        let set = prepare_training_data(storms, self.config.synthetic_sequences, &mut self.rng);
        self.logger.record(&format!(
            "training on {} examples ({} real, {} synthetic)",
            set.len(),
            set.real_examples,
            set.len() - set.real_examples
        ));

        on_progress("Training model...".into(), 35);
        let mut final_loss = None;
        let mut report_epoch = |report: &EpochReport| {
            final_loss = Some(report.loss);
            let percent = 35 + (report.epoch * 30 / report.epochs.max(1)) as u8;
            let message = match report.val_loss {
                Some(val) => format!(
                    "Training: epoch {}/{} (loss: {:.4}, val: {:.4})",
                    report.epoch, report.epochs, report.loss, val
                ),
                None => format!(
                    "Training: epoch {}/{} (loss: {:.4})",
                    report.epoch, report.epochs, report.loss
                ),
            };
            on_progress(message, percent);
        };
        self.backend
            .fit(&set, &self.config.training, &mut self.rng, &mut report_epoch)?;
        self.trained = true;

        on_progress("Training complete".into(), 65);
        Ok(TrainingSummary {
            examples: set.len(),
            real_examples: set.real_examples,
            final_loss,
        })
    }

    /// Autoregressive forecast aligned with `track`.
    ///
    /// Tracks shorter than the context window come back unchanged. Otherwise
    /// the first `CONTEXT_WINDOW` points are copied and every later index is
    /// predicted from the previously produced points, with a lat/lon
    /// perturbation that widens as `0.15 * sqrt(i - 4)`.
    pub fn predict(
        &mut self,
        track: &[TrackPoint],
        steps: usize,
    ) -> TrackResult<Vec<TrackPoint>> {
        if track.len() < CONTEXT_WINDOW {
            return Ok(track.to_vec());
        }
        if !self.trained {
            return Err(TrackError::NotTrained);
        }

        let len = track.len().min(steps.saturating_add(CONTEXT_WINDOW));
        let mut output: Vec<TrackPoint> = track[..CONTEXT_WINDOW].to_vec();

        for i in CONTEXT_WINDOW..len {
            let mut window: Sequence = [[0.0; FEATURES]; CONTEXT_WINDOW];
            for (slot, point) in window.iter_mut().zip(&output[i - CONTEXT_WINDOW..i]) {
                *slot = normalize(point);
            }
            let estimate = self.backend.predict(&window)?;
            let mut point = denormalize(&estimate);

            let error_scale = AI_ERROR_BASE * ((i - (CONTEXT_WINDOW - 1)) as f64).sqrt();
            point.lat += self.jitter() * error_scale * AI_LAT_FACTOR;
            point.lon += self.jitter() * error_scale;
            point.time = track[i].time.clone();
            output.push(point);
        }

        Ok(output)
    }

    /// ECMWF- and GFS-style tracks: ground truth with `base * sqrt(i)` noise.
    pub fn generate_comparison(&mut self, actual: &[TrackPoint]) -> ComparisonTracks {
        let ecmwf = self.perturb(actual, ECMWF_ERROR);
        let gfs = self.perturb(actual, GFS_ERROR);
        ComparisonTracks { ecmwf, gfs }
    }

    /// Forecasts every model for `storm`; each sequence matches the track length.
    pub fn predict_storm(&mut self, storm: &Storm) -> TrackResult<PredictionSet> {
        let ai = self.predict(&storm.track, storm.track.len())?;
        let ComparisonTracks { ecmwf, gfs } = self.generate_comparison(&storm.track);
        Ok(PredictionSet { ai, ecmwf, gfs })
    }

    pub fn dispose(&mut self) {
        self.backend.cleanup();
        self.built = false;
        self.trained = false;
    }

    fn perturb(
        &mut self,
        actual: &[TrackPoint],
        (base, lat_factor, lon_factor): (f64, f64, f64),
    ) -> Vec<TrackPoint> {
        actual
            .iter()
            .enumerate()
            .map(|(i, point)| {
                let error = base * (i as f64).sqrt();
                let mut shifted = point.clone();
                shifted.lat += self.jitter() * error * lat_factor;
                shifted.lon += self.jitter() * error * lon_factor;
                shifted
            })
            .collect()
    }

    /// Uniform draw in `[-0.5, 0.5)`.
    fn jitter(&mut self) -> f64 {
        self.rng.gen::<f64>() - 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::backend::{BackendKind, LinearBackend};
    use crate::prediction::normalize::Features;
    use crate::prediction::training::TrainingSet;

    /// Repeats the last context point, so any drift comes from perturbation.
    struct Persistence {
        built: bool,
    }

    impl RegressionBackend for Persistence {
        fn name(&self) -> &str {
            "persistence"
        }
        fn initialize(&mut self) -> TrackResult<()> {
            Ok(())
        }
        fn build(&mut self) -> TrackResult<()> {
            self.built = true;
            Ok(())
        }
        fn fit(
            &mut self,
            _set: &TrainingSet,
            config: &TrainingConfig,
            _rng: &mut StdRng,
            on_epoch: &mut dyn FnMut(&EpochReport),
        ) -> TrackResult<()> {
            for epoch in 1..=config.epochs {
                on_epoch(&EpochReport {
                    epoch,
                    epochs: config.epochs,
                    loss: 0.01,
                    val_loss: None,
                });
            }
            Ok(())
        }
        fn predict(&self, window: &Sequence) -> TrackResult<Features> {
            Ok(window[CONTEXT_WINDOW - 1])
        }
        fn cleanup(&mut self) {
            self.built = false;
        }
    }

    fn config() -> PredictorConfig {
        PredictorConfig {
            seed: Some(42),
            ..Default::default()
        }
    }

    fn track(len: usize) -> Vec<TrackPoint> {
        (0..len)
            .map(|i| {
                TrackPoint::new(-45.0 - 3.0 * i as f64, 9.0 + 0.6 * i as f64, 60.0, 990.0)
                    .with_time(format!("2024-06-{:02}T00:00Z", i + 1))
            })
            .collect()
    }

    fn trained_persistence() -> TrackPredictor {
        let mut predictor = TrackPredictor::new(config(), Box::new(Persistence { built: false }));
        predictor.build(|_, _| {}).unwrap();
        predictor.train(&[], |_, _| {}).unwrap();
        predictor
    }

    #[test]
    fn training_progress_is_monotonic_and_spans_30_to_65() {
        let mut predictor = TrackPredictor::new(config(), Box::new(Persistence { built: false }));
        let mut percents = Vec::new();
        predictor.build(|_, pct| percents.push(pct)).unwrap();
        predictor.train(&[], |_, pct| percents.push(pct)).unwrap();
        assert_eq!(percents.first(), Some(&20));
        assert_eq!(percents.last(), Some(&65));
        assert!(percents.windows(2).all(|pair| pair[0] <= pair[1]));
        assert!(percents.contains(&37));
    }

    #[test]
    fn train_before_build_is_rejected() {
        let mut predictor = TrackPredictor::new(config(), Box::new(Persistence { built: false }));
        assert!(matches!(
            predictor.train(&[], |_, _| {}),
            Err(TrackError::ModelNotBuilt)
        ));
    }

    #[test]
    fn predict_copies_seed_region_and_keeps_length() {
        let mut predictor = trained_persistence();
        let actual = track(12);
        let forecast = predictor.predict(&actual, actual.len()).unwrap();
        assert_eq!(forecast.len(), actual.len());
        assert_eq!(&forecast[..CONTEXT_WINDOW], &actual[..CONTEXT_WINDOW]);
        assert_eq!(forecast[7].time, actual[7].time);
    }

    #[test]
    fn predict_limits_output_to_steps_plus_context() {
        let mut predictor = trained_persistence();
        let forecast = predictor.predict(&track(12), 3).unwrap();
        assert_eq!(forecast.len(), 8);
    }

    #[test]
    fn unbounded_steps_cover_the_whole_track() {
        let mut predictor = trained_persistence();
        let forecast = predictor.predict(&track(8), usize::MAX).unwrap();
        assert_eq!(forecast.len(), 8);
    }

    #[test]
    fn short_tracks_are_returned_unchanged() {
        let mut predictor = TrackPredictor::new(config(), Box::new(Persistence { built: false }));
        let actual = track(4);
        assert_eq!(predictor.predict(&actual, 10).unwrap(), actual);
    }

    #[test]
    fn untrained_predictor_refuses_to_forecast() {
        let mut predictor = TrackPredictor::new(config(), Box::new(Persistence { built: false }));
        assert!(matches!(
            predictor.predict(&track(8), 8),
            Err(TrackError::NotTrained)
        ));
    }

    #[test]
    fn perturbation_stays_within_growing_envelope() {
        let mut predictor = trained_persistence();
        let actual = track(16);
        let forecast = predictor.predict(&actual, actual.len()).unwrap();
        for i in CONTEXT_WINDOW..forecast.len() {
            let scale = 0.15 * ((i - 4) as f64).sqrt();
            let lat_step = (forecast[i].lat - forecast[i - 1].lat).abs();
            let lon_step = (forecast[i].lon - forecast[i - 1].lon).abs();
            assert!(lat_step <= 0.5 * scale * 0.5 + 1e-9, "index {i}");
            assert!(lon_step <= 0.5 * scale + 1e-9, "index {i}");
            assert!((forecast[i].wind - 60.0).abs() < 1e-9);
        }
    }

    #[test]
    fn comparison_preserves_length_and_intensity() {
        let mut predictor = trained_persistence();
        let actual = track(10);
        let tracks = predictor.generate_comparison(&actual);
        assert_eq!(tracks.ecmwf.len(), actual.len());
        assert_eq!(tracks.gfs.len(), actual.len());
        assert_eq!(tracks.ecmwf[0], actual[0]);
        for ((ecmwf, gfs), truth) in tracks.ecmwf.iter().zip(&tracks.gfs).zip(&actual) {
            assert_eq!(ecmwf.wind, truth.wind);
            assert_eq!(gfs.pressure, truth.pressure);
            assert_eq!(gfs.time, truth.time);
        }
        for (i, point) in tracks.gfs.iter().enumerate() {
            let error = 0.7 * (i as f64).sqrt();
            assert!((point.lat - actual[i].lat).abs() <= 0.5 * error * 0.7 + 1e-9);
            assert!((point.lon - actual[i].lon).abs() <= 0.5 * error * 0.7 + 1e-9);
        }
    }

    #[test]
    fn ecmwf_latitude_error_is_narrower_than_longitude() {
        let mut predictor = trained_persistence();
        let actual = track(24);
        let ecmwf = predictor.generate_comparison(&actual).ecmwf;
        for (i, point) in ecmwf.iter().enumerate() {
            let error = 0.4 * (i as f64).sqrt();
            assert!((point.lat - actual[i].lat).abs() <= 0.5 * error * 0.6 + 1e-9);
            assert!((point.lon - actual[i].lon).abs() <= 0.5 * error * 1.0 + 1e-9);
        }
    }

    #[test]
    fn seeded_predictors_are_reproducible() {
        let actual = track(14);
        let mut first = trained_persistence();
        let mut second = trained_persistence();
        assert_eq!(
            first.predict(&actual, actual.len()).unwrap(),
            second.predict(&actual, actual.len()).unwrap()
        );
    }

    #[test]
    fn linear_backend_forecast_stays_aligned() {
        let mut backend = LinearBackend::new(BackendKind::Matrix);
        backend.initialize().unwrap();
        let mut predictor = TrackPredictor::new(config(), Box::new(backend));
        let storm = Storm {
            id: "beryl".into(),
            name: "Beryl".into(),
            category: "Category 5".into(),
            dates: "".into(),
            basin: "Atlantic".into(),
            track: track(19),
            predictions: None,
        };
        predictor.build(|_, _| {}).unwrap();
        let summary = predictor
            .train(std::slice::from_ref(&storm), |_, _| {})
            .unwrap();
        assert_eq!(summary.real_examples, 14);
        assert_eq!(summary.examples, 214);
        assert!(summary.final_loss.is_some());

        let set = predictor.predict_storm(&storm).unwrap();
        assert!(set.is_aligned_with(&storm.track));
        assert_eq!(&set.ai[..CONTEXT_WINDOW], &storm.track[..CONTEXT_WINDOW]);
        assert!(set.ai.iter().all(|p| (20.0..=180.0).contains(&p.wind)));
    }
}
