use crate::math::{MatrixHelper, StatsHelper};
use crate::prediction::normalize::{Features, FEATURES};
use crate::prediction::training::{Sequence, TrainingSet};
use crate::prelude::{TrackError, TrackResult, CONTEXT_WINDOW};
use crate::telemetry::LogManager;
use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::{rngs::StdRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

/// Numeric kernel a [`LinearBackend`] runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Batched `ndarray` matrix products.
    Matrix,
    /// Row-at-a-time scalar loops.
    Scalar,
}

impl BackendKind {
    pub fn name(self) -> &'static str {
        match self {
            BackendKind::Matrix => "matrix",
            BackendKind::Scalar => "scalar",
        }
    }
}

/// Optimisation settings for [`RegressionBackend::fit`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    /// Trailing fraction of examples held out for validation loss.
    pub validation_split: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 15,
            batch_size: 32,
            learning_rate: 0.01,
            validation_split: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochReport {
    pub epoch: usize,
    pub epochs: usize,
    pub loss: f64,
    pub val_loss: Option<f64>,
}

/// Sequence-to-point regressor used by the track predictor.
///
/// The predictor only relies on this contract: a window of
/// `CONTEXT_WINDOW` normalized points maps to one normalized next point.
pub trait RegressionBackend: Send {
    fn name(&self) -> &str;
    fn initialize(&mut self) -> TrackResult<()>;
    fn build(&mut self) -> TrackResult<()>;
    fn fit(
        &mut self,
        set: &TrainingSet,
        config: &TrainingConfig,
        rng: &mut StdRng,
        on_epoch: &mut dyn FnMut(&EpochReport),
    ) -> TrackResult<()>;
    fn predict(&self, window: &Sequence) -> TrackResult<Features>;
    fn cleanup(&mut self);
}

/// Builds a backend for a configured kind.
pub type BackendFactory = fn(BackendKind) -> Box<dyn RegressionBackend>;

/// Initializes `preferred`, substituting `fallback` when it fails.
///
/// Returns the ready backend and whether the fallback was used.
pub fn select_backend(
    factory: BackendFactory,
    preferred: BackendKind,
    fallback: BackendKind,
) -> TrackResult<(Box<dyn RegressionBackend>, bool)> {
    let logger = LogManager::new("backend");
    let mut backend = factory(preferred);
    match backend.initialize() {
        Ok(()) => Ok((backend, false)),
        Err(err) => {
            logger.warn(&format!(
                "{} backend failed ({}), falling back to {}",
                preferred.name(),
                err,
                fallback.name()
            ));
            let mut backend = factory(fallback);
            backend.initialize()?;
            Ok((backend, true))
        }
    }
}

const INPUT_WIDTH: usize = CONTEXT_WINDOW * FEATURES;

struct LinearParams {
    weights: Array2<f64>,
    bias: Array1<f64>,
}

impl LinearParams {
    /// Weights start as persistence: the next point equals the last context point.
    fn persistence() -> Self {
        let mut weights = Array2::zeros((INPUT_WIDTH, FEATURES));
        for feature in 0..FEATURES {
            weights[[INPUT_WIDTH - FEATURES + feature, feature]] = 1.0;
        }
        Self {
            weights,
            bias: Array1::zeros(FEATURES),
        }
    }
}

/// Affine regressor over the flattened context window, trained by mini-batch
/// gradient descent on mean squared error.
pub struct LinearBackend {
    kind: BackendKind,
    initialized: bool,
    params: Option<LinearParams>,
    trained: bool,
}

impl LinearBackend {
    pub fn new(kind: BackendKind) -> Self {
        Self {
            kind,
            initialized: false,
            params: None,
            trained: false,
        }
    }

    pub fn boxed(kind: BackendKind) -> Box<dyn RegressionBackend> {
        Box::new(Self::new(kind))
    }

    fn forward(&self, params: &LinearParams, inputs: ArrayView2<f64>) -> Array2<f64> {
        match self.kind {
            BackendKind::Matrix => {
                MatrixHelper::affine(inputs, params.weights.view(), &params.bias)
            }
            BackendKind::Scalar => {
                let mut out = Array2::zeros((inputs.nrows(), FEATURES));
                for row in 0..inputs.nrows() {
                    for col in 0..FEATURES {
                        let mut acc = params.bias[col];
                        for k in 0..INPUT_WIDTH {
                            acc += inputs[[row, k]] * params.weights[[k, col]];
                        }
                        out[[row, col]] = acc;
                    }
                }
                out
            }
        }
    }

    fn step(
        &self,
        params: &mut LinearParams,
        inputs: ArrayView2<f64>,
        targets: ArrayView2<f64>,
        learning_rate: f64,
    ) {
        let residual = self.forward(params, inputs) - &targets;
        let scale = 2.0 / (inputs.nrows() * FEATURES) as f64;
        match self.kind {
            BackendKind::Matrix => {
                let grad_w = inputs.t().dot(&residual) * scale;
                let grad_b = residual.sum_axis(Axis(0)) * scale;
                params.weights.scaled_add(-learning_rate, &grad_w);
                params.bias.scaled_add(-learning_rate, &grad_b);
            }
            BackendKind::Scalar => {
                for col in 0..FEATURES {
                    let mut grad_b = 0.0;
                    for row in 0..inputs.nrows() {
                        grad_b += residual[[row, col]];
                    }
                    for k in 0..INPUT_WIDTH {
                        let mut grad_w = 0.0;
                        for row in 0..inputs.nrows() {
                            grad_w += inputs[[row, k]] * residual[[row, col]];
                        }
                        params.weights[[k, col]] -= learning_rate * grad_w * scale;
                    }
                    params.bias[col] -= learning_rate * grad_b * scale;
                }
            }
        }
    }

    fn loss(&self, params: &LinearParams, inputs: ArrayView2<f64>, targets: ArrayView2<f64>) -> f64 {
        let residual = self.forward(params, inputs) - &targets;
        StatsHelper::mean_square(&residual.iter().copied().collect::<Vec<_>>())
    }
}

impl RegressionBackend for LinearBackend {
    fn name(&self) -> &str {
        self.kind.name()
    }

    fn initialize(&mut self) -> TrackResult<()> {
        self.initialized = true;
        Ok(())
    }

    fn build(&mut self) -> TrackResult<()> {
        if !self.initialized {
            return Err(TrackError::BackendUnavailable(format!(
                "{} backend not initialized",
                self.kind.name()
            )));
        }
        self.params = Some(LinearParams::persistence());
        self.trained = false;
        Ok(())
    }

    fn fit(
        &mut self,
        set: &TrainingSet,
        config: &TrainingConfig,
        rng: &mut StdRng,
        on_epoch: &mut dyn FnMut(&EpochReport),
    ) -> TrackResult<()> {
        if set.is_empty() {
            return Err(TrackError::Training("no training examples".into()));
        }
        if config.batch_size == 0 || config.epochs == 0 {
            return Err(TrackError::Training(
                "epochs and batch size must be positive".into(),
            ));
        }
        let mut params = self.params.take().ok_or(TrackError::ModelNotBuilt)?;

        // Training matrices live only for the duration of this call.
        let inputs = MatrixHelper::from_rows(&set.flattened_inputs(), INPUT_WIDTH);
        let targets = MatrixHelper::from_rows(&set.target_rows(), FEATURES);

        let total = set.len();
        let held_out = ((total as f64) * config.validation_split.clamp(0.0, 0.5)).floor() as usize;
        let train_len = total - held_out;
        let mut order: Vec<usize> = (0..train_len).collect();

        for epoch in 0..config.epochs {
            order.shuffle(rng);
            for batch in order.chunks(config.batch_size) {
                let batch_inputs = inputs.select(Axis(0), batch);
                let batch_targets = targets.select(Axis(0), batch);
                self.step(
                    &mut params,
                    batch_inputs.view(),
                    batch_targets.view(),
                    config.learning_rate,
                );
            }

            let loss = self.loss(
                &params,
                inputs.slice(ndarray::s![..train_len, ..]),
                targets.slice(ndarray::s![..train_len, ..]),
            );
            if !loss.is_finite() {
                return Err(TrackError::Training(format!(
                    "loss diverged at epoch {}",
                    epoch + 1
                )));
            }
            let val_loss = (held_out > 0).then(|| {
                self.loss(
                    &params,
                    inputs.slice(ndarray::s![train_len.., ..]),
                    targets.slice(ndarray::s![train_len.., ..]),
                )
            });

            on_epoch(&EpochReport {
                epoch: epoch + 1,
                epochs: config.epochs,
                loss,
                val_loss,
            });
        }

        self.params = Some(params);
        self.trained = true;
        Ok(())
    }

    fn predict(&self, window: &Sequence) -> TrackResult<Features> {
        let params = self.params.as_ref().ok_or(TrackError::ModelNotBuilt)?;
        if !self.trained {
            return Err(TrackError::NotTrained);
        }
        let row: Vec<f64> = window.iter().flatten().copied().collect();
        let inputs = MatrixHelper::from_rows(&[row], INPUT_WIDTH);
        let output = self.forward(params, inputs.view());
        let mut features = [0.0; FEATURES];
        for (slot, value) in features.iter_mut().zip(output.row(0).iter()) {
            *slot = *value;
        }
        Ok(features)
    }

    fn cleanup(&mut self) {
        self.params = None;
        self.trained = false;
    }
}
