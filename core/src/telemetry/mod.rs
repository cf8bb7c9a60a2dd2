pub mod log;
pub mod metrics;
pub mod progress;

pub use log::LogManager;
pub use metrics::{MetricsRecorder, ResourceCounts};
pub use progress::{progress_channel, PipelineStage, ProgressEvent, ProgressReporter};
