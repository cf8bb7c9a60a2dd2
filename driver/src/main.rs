use anyhow::Context;
use clap::Parser;
use gui_bridge::model::DisplaySettings;
use gui_bridge::GuiBridge;
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use stormcore::prediction::LinearBackend;
use stormcore::telemetry::progress_channel;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use weather::{OpenMeteoClient, WeatherSource};
use workflow::{PipelineOrchestrator, PipelineState, WorkflowConfig};

mod dataset;
mod gui_bridge;
mod report;
mod weather;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Storm track forecast workbench driver")]
struct Args {
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// Storm dataset JSON (overrides the workflow file)
    #[arg(long)]
    dataset: Option<PathBuf>,
    /// Seed for training and forecast perturbation
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    epochs: Option<usize>,
    /// Print a per-storm error summary after startup
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Write the prediction sets as JSON
    #[arg(long)]
    report: Option<PathBuf>,
    /// Keep the HTTP bridge alive for the visualizer
    #[arg(long, default_value_t = false)]
    serve: bool,
    /// Skip the live weather requests
    #[arg(long, default_value_t = false)]
    no_weather: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let workflow_config = match &args.workflow {
        Some(path) => WorkflowConfig::load(path)?,
        None => WorkflowConfig::default(),
    }
    .with_overrides(args.dataset.clone(), args.seed, args.epochs, args.no_weather);

    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating tokio runtime")?;
    runtime.block_on(run(args, workflow_config))
}

async fn run(args: Args, config: WorkflowConfig) -> anyhow::Result<()> {
    let weather: Option<Arc<dyn WeatherSource>> = if config.weather.enabled {
        let client: Arc<dyn WeatherSource> = Arc::new(OpenMeteoClient::new(
            config.weather.endpoint.clone(),
            Duration::from_secs(config.weather.timeout_secs),
        )?);
        Some(client)
    } else {
        None
    };

    let gui_bridge = GuiBridge::new(
        DisplaySettings {
            rotation_speed: config.animation.rotation_speed,
        },
        weather.clone(),
    );
    if args.serve {
        gui_bridge.serve(config.bridge.bind)?;
    }

    let (reporter, mut events) = progress_channel();
    let bridge_state = gui_bridge.state();
    let forwarder = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if event.failed {
                error!("[{:>3}%] {}", event.percent, event.message);
            } else {
                info!("[{:>3}%] {}", event.percent, event.message);
            }
            bridge_state.publish_progress(event);
        }
    });

    let orchestrator =
        PipelineOrchestrator::new(config.clone(), LinearBackend::boxed, weather, reporter);
    let mut state = PipelineState::default();
    let outcome = orchestrator.run(&mut state).await;
    drop(orchestrator);
    forwarder.await.context("progress forwarder stopped")?;

    if outcome.is_ok() && (args.offline || args.report.is_some()) {
        let reports = report::summarize(state.storms());
        if args.offline {
            print!("{}", report::render_summary(&reports));
            if let Some(summary) = &state.training {
                println!(
                    "Offline run -> examples {} (real {}), final loss {:.5}",
                    summary.examples,
                    summary.real_examples,
                    summary.final_loss.unwrap_or(f64::NAN)
                );
            }
        }
        if let Some(path) = &args.report {
            report::write_report(path, &reports)?;
            info!("wrote prediction report to {}", path.display());
        }
    }

    if let Some(session) = state.session.take() {
        gui_bridge.state().install(session);
    }

    if args.serve {
        if outcome.is_ok() {
            gui_bridge.spawn_autoplay(config.animation.tick_interval());
        } else {
            warn!("startup failed; serving progress only");
        }
        gui_bridge.publish_status("HTTP bridge running (Ctrl+C to stop)...");
        signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
    }

    if let Some(mut session) = gui_bridge.state().take_session() {
        session.teardown();
    }
    if let Some(predictor) = state.predictor.as_mut() {
        predictor.dispose();
    }

    outcome.context("startup pipeline failed")
}
