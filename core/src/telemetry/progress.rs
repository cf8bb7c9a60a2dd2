use crate::telemetry::LogManager;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Startup stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    LoadData,
    InitBackend,
    BuildModel,
    Train,
    PredictAll,
    InitScene,
    PopulateUi,
    FetchWeather,
    Ready,
}

impl PipelineStage {
    pub const ALL: [PipelineStage; 9] = [
        PipelineStage::LoadData,
        PipelineStage::InitBackend,
        PipelineStage::BuildModel,
        PipelineStage::Train,
        PipelineStage::PredictAll,
        PipelineStage::InitScene,
        PipelineStage::PopulateUi,
        PipelineStage::FetchWeather,
        PipelineStage::Ready,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PipelineStage::LoadData => "load data",
            PipelineStage::InitBackend => "init backend",
            PipelineStage::BuildModel => "build model",
            PipelineStage::Train => "train",
            PipelineStage::PredictAll => "predict all",
            PipelineStage::InitScene => "init scene",
            PipelineStage::PopulateUi => "populate ui",
            PipelineStage::FetchWeather => "fetch weather",
            PipelineStage::Ready => "ready",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One `(message, percent)` report. A failed event is terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub stage: PipelineStage,
    pub message: String,
    pub percent: u8,
    pub failed: bool,
}

impl ProgressEvent {
    pub fn is_ready(&self) -> bool {
        self.stage == PipelineStage::Ready && !self.failed
    }
}

impl Default for ProgressEvent {
    fn default() -> Self {
        Self {
            stage: PipelineStage::LoadData,
            message: "Starting...".into(),
            percent: 0,
            failed: false,
        }
    }
}

/// Sending half of the progress stream. The stream ends when every reporter is dropped.
#[derive(Clone)]
pub struct ProgressReporter {
    tx: UnboundedSender<ProgressEvent>,
}

pub fn progress_channel() -> (ProgressReporter, UnboundedReceiver<ProgressEvent>) {
    let (tx, rx) = unbounded_channel();
    (ProgressReporter { tx }, rx)
}

impl ProgressReporter {
    pub fn report(&self, stage: PipelineStage, message: impl Into<String>, percent: u8) {
        self.send(ProgressEvent {
            stage,
            message: message.into(),
            percent: percent.min(100),
            failed: false,
        });
    }

    /// Reports a fatal error; the bar drops back to zero.
    pub fn fail(&self, stage: PipelineStage, message: impl Into<String>) {
        self.send(ProgressEvent {
            stage,
            message: message.into(),
            percent: 0,
            failed: true,
        });
    }

    fn send(&self, event: ProgressEvent) {
        if self.tx.send(event).is_err() {
            LogManager::new("progress").detail("progress receiver closed");
        }
    }
}
