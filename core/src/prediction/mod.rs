//! Track prediction: feature scaling, training data, the regression backend
//! seam, the autoregressive predictor and the accuracy chart.

pub mod accuracy;
pub mod backend;
pub mod normalize;
pub mod predictor;
pub mod training;

pub use accuracy::{ErrorChart, ErrorSeries};
pub use backend::{
    select_backend, BackendFactory, BackendKind, EpochReport, LinearBackend, RegressionBackend,
    TrainingConfig,
};
pub use normalize::{denormalize, normalize, Features, FEATURES};
pub use predictor::{ComparisonTracks, PredictorConfig, TrackPredictor, TrainingSummary};
pub use training::{prepare_training_data, Sequence, TrainingSet};
