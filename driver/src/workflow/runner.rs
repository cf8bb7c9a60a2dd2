use crate::dataset::{load_dataset, DatasetSource};
use crate::weather::{fetch_all, WeatherSource};
use crate::workflow::config::WorkflowConfig;
use log::{error, info, warn};
use std::sync::Arc;
use stormcore::prediction::{select_backend, BackendFactory, TrackPredictor, TrainingSummary};
use stormcore::prelude::{City, Storm, TrackError};
use stormcore::session::Session;
use stormcore::telemetry::{PipelineStage, ProgressReporter};
use stormcore::timeline::TimelineController;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("loading data failed: {0}")]
    Data(String),
    #[error("{stage} failed: {source}")]
    Model {
        stage: PipelineStage,
        #[source]
        source: TrackError,
    },
    #[error("{stage} task aborted: {reason}")]
    Aborted { stage: PipelineStage, reason: String },
}

impl PipelineError {
    pub fn stage(&self) -> PipelineStage {
        match self {
            PipelineError::Data(_) => PipelineStage::LoadData,
            PipelineError::Model { stage, .. } | PipelineError::Aborted { stage, .. } => *stage,
        }
    }

    fn model(stage: PipelineStage) -> impl FnOnce(TrackError) -> Self {
        move |source| PipelineError::Model { stage, source }
    }
}

/// Whatever the stages produced so far. Survives a fatal failure.
#[derive(Default)]
pub struct PipelineState {
    pub dataset_source: Option<DatasetSource>,
    pub storms: Vec<Storm>,
    pub cities: Vec<City>,
    pub predictor: Option<TrackPredictor>,
    pub used_fallback_backend: bool,
    pub training: Option<TrainingSummary>,
    pub session: Option<Session>,
    pub completed: Vec<PipelineStage>,
}

impl PipelineState {
    pub fn is_ready(&self) -> bool {
        self.session.as_ref().is_some_and(Session::is_interactive)
    }

    /// Storms with predictions attached, wherever they currently live.
    pub fn storms(&self) -> &[Storm] {
        match &self.session {
            Some(session) => session.storms(),
            None => &self.storms,
        }
    }
}

/// Runs the startup stages strictly in order, reporting progress as it goes.
pub struct PipelineOrchestrator {
    config: WorkflowConfig,
    backend_factory: BackendFactory,
    weather: Option<Arc<dyn WeatherSource>>,
    progress: ProgressReporter,
}

impl PipelineOrchestrator {
    pub fn new(
        config: WorkflowConfig,
        backend_factory: BackendFactory,
        weather: Option<Arc<dyn WeatherSource>>,
        progress: ProgressReporter,
    ) -> Self {
        Self {
            config,
            backend_factory,
            weather,
            progress,
        }
    }

    /// On a fatal error the failing stage is reported, no later stage runs,
    /// and `state` keeps what the completed stages produced.
    pub async fn run(&self, state: &mut PipelineState) -> Result<(), PipelineError> {
        let result = self.run_stages(state).await;
        if let Err(err) = &result {
            error!("startup stopped at {}: {}", err.stage(), err);
            self.progress.fail(err.stage(), format!("Error: {err}"));
        }
        result
    }

    async fn run_stages(&self, state: &mut PipelineState) -> Result<(), PipelineError> {
        self.load_data(state).await?;
        self.init_backend(state)?;
        self.build_model(state)?;
        self.train(state).await?;
        self.predict_all(state).await?;
        self.init_scene(state);
        self.populate_ui(state);
        self.fetch_weather(state).await;
        self.ready(state);
        Ok(())
    }

    async fn load_data(&self, state: &mut PipelineState) -> Result<(), PipelineError> {
        self.progress
            .report(PipelineStage::LoadData, "Loading data...", 5);
        let loaded = load_dataset(self.config.dataset.as_deref())
            .await
            .map_err(|err| PipelineError::Data(format!("{err:#}")))?;
        info!(
            "{} storms, {} cities from {}",
            loaded.dataset.storms.len(),
            loaded.dataset.cities.len(),
            loaded.source
        );
        state.storms = loaded.dataset.storms;
        state.cities = loaded.dataset.cities;
        state.dataset_source = Some(loaded.source);
        state.completed.push(PipelineStage::LoadData);
        Ok(())
    }

    fn init_backend(&self, state: &mut PipelineState) -> Result<(), PipelineError> {
        let predictor_config = &self.config.predictor;
        let (backend, fell_back) = select_backend(
            self.backend_factory,
            predictor_config.backend,
            predictor_config.fallback_backend,
        )
        .map_err(PipelineError::model(PipelineStage::InitBackend))?;

        let message = if fell_back {
            warn!(
                "preferred {} backend unavailable, running on {}",
                predictor_config.backend.name(),
                backend.name()
            );
            format!("Regression backend ready ({} fallback)", backend.name())
        } else {
            format!("Regression backend ready ({})", backend.name())
        };
        state.used_fallback_backend = fell_back;
        state.predictor = Some(TrackPredictor::new(predictor_config.clone(), backend));
        self.progress
            .report(PipelineStage::InitBackend, message, 15);
        state.completed.push(PipelineStage::InitBackend);
        Ok(())
    }

    fn build_model(&self, state: &mut PipelineState) -> Result<(), PipelineError> {
        let predictor = predictor_mut(state, PipelineStage::BuildModel)?;
        predictor
            .build(|message, percent| {
                self.progress
                    .report(PipelineStage::BuildModel, message, percent)
            })
            .map_err(PipelineError::model(PipelineStage::BuildModel))?;
        state.completed.push(PipelineStage::BuildModel);
        Ok(())
    }

    async fn train(&self, state: &mut PipelineState) -> Result<(), PipelineError> {
        let mut predictor = state
            .predictor
            .take()
            .ok_or_else(|| missing_predictor(PipelineStage::Train))?;
        let storms = state.storms.clone();
        let progress = self.progress.clone();

        let (predictor, result) = tokio::task::spawn_blocking(move || {
            let result = predictor.train(&storms, |message, percent| {
                progress.report(PipelineStage::Train, message, percent)
            });
            (predictor, result)
        })
        .await
        .map_err(|err| PipelineError::Aborted {
            stage: PipelineStage::Train,
            reason: err.to_string(),
        })?;
        state.predictor = Some(predictor);

        let summary = result.map_err(PipelineError::model(PipelineStage::Train))?;
        info!(
            "trained on {} examples ({} real), final loss {:?}",
            summary.examples, summary.real_examples, summary.final_loss
        );
        state.training = Some(summary);
        state.completed.push(PipelineStage::Train);
        Ok(())
    }

    async fn predict_all(&self, state: &mut PipelineState) -> Result<(), PipelineError> {
        self.progress
            .report(PipelineStage::PredictAll, "Generating predictions...", 70);
        let mut predictor = state
            .predictor
            .take()
            .ok_or_else(|| missing_predictor(PipelineStage::PredictAll))?;
        let mut storms = std::mem::take(&mut state.storms);

        let (predictor, storms, result) = tokio::task::spawn_blocking(move || {
            let mut result = Ok(());
            for storm in storms.iter_mut() {
                match predictor.predict_storm(storm) {
                    Ok(set) => storm.predictions = Some(set),
                    Err(err) => {
                        result = Err(err);
                        break;
                    }
                }
            }
            (predictor, storms, result)
        })
        .await
        .map_err(|err| PipelineError::Aborted {
            stage: PipelineStage::PredictAll,
            reason: err.to_string(),
        })?;
        state.predictor = Some(predictor);
        state.storms = storms;

        result.map_err(PipelineError::model(PipelineStage::PredictAll))?;
        state.completed.push(PipelineStage::PredictAll);
        Ok(())
    }

    fn init_scene(&self, state: &mut PipelineState) {
        self.progress
            .report(PipelineStage::InitScene, "Creating 3D globe...", 80);
        let timeline = TimelineController::with_tick_delta(self.config.animation.timeline_step);
        state.session = Some(Session::new(
            std::mem::take(&mut state.storms),
            std::mem::take(&mut state.cities),
            timeline,
        ));
        state.completed.push(PipelineStage::InitScene);
    }

    fn populate_ui(&self, state: &mut PipelineState) {
        self.progress
            .report(PipelineStage::PopulateUi, "Setting up interface...", 90);
        if let Some(session) = state.session.as_mut() {
            session.populate_ui();
        }
        state.completed.push(PipelineStage::PopulateUi);
    }

    async fn fetch_weather(&self, state: &mut PipelineState) {
        self.progress
            .report(PipelineStage::FetchWeather, "Fetching weather...", 95);
        let Some(session) = state.session.as_mut() else {
            return;
        };
        match &self.weather {
            Some(source) => {
                let outcomes = fetch_all(source.as_ref(), session.cities()).await;
                session.set_weather(&outcomes);
                info!(
                    "weather cards: {} of {}",
                    session.weather().len(),
                    outcomes.len()
                );
            }
            None => info!("weather disabled, skipping"),
        }
        state.completed.push(PipelineStage::FetchWeather);
    }

    fn ready(&self, state: &mut PipelineState) {
        if let Some(session) = state.session.as_mut() {
            session.mark_ready();
        }
        state.completed.push(PipelineStage::Ready);
        self.progress.report(PipelineStage::Ready, "Ready!", 100);
    }
}

fn predictor_mut(
    state: &mut PipelineState,
    stage: PipelineStage,
) -> Result<&mut TrackPredictor, PipelineError> {
    state
        .predictor
        .as_mut()
        .ok_or_else(|| missing_predictor(stage))
}

fn missing_predictor(stage: PipelineStage) -> PipelineError {
    PipelineError::Model {
        stage,
        source: TrackError::ModelNotBuilt,
    }
}
