use crate::gui_bridge::model::{BridgeState, DisplaySettings};
use crate::weather::{fetch_all, WeatherSource};
use anyhow::Context;
use log::{debug, info, warn};
use serde_json::json;
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use stormcore::prelude::TrackError;
use stormcore::session::ControlCommand;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use warp::{
    http::StatusCode,
    reply::{Json, WithStatus},
    Filter, Rejection, Reply,
};

/// `GET /progress`, `GET /settings`, `GET /scene`, `POST /control` and
/// `POST /weather/refresh` over shared bridge state.
pub fn routes(
    state: Arc<BridgeState>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let state_filter = warp::any().map(move || state.clone());

    let progress_route = warp::path("progress")
        .and(warp::path::end())
        .and(warp::get())
        .and(state_filter.clone())
        .map(|state: Arc<BridgeState>| warp::reply::json(&state.progress()));

    let settings_route = warp::path("settings")
        .and(warp::path::end())
        .and(warp::get())
        .and(state_filter.clone())
        .map(|state: Arc<BridgeState>| warp::reply::json(&state.settings()));

    let scene_route = warp::path("scene")
        .and(warp::path::end())
        .and(warp::get())
        .and(state_filter.clone())
        .map(|state: Arc<BridgeState>| scene_reply(&state));

    let control_route = warp::path("control")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(state_filter.clone())
        .map(|command: ControlCommand, state: Arc<BridgeState>| control_reply(&state, command));

    let weather_route = warp::path!("weather" / "refresh")
        .and(warp::post())
        .and(state_filter)
        .and_then(refresh_weather);

    progress_route
        .or(settings_route)
        .or(scene_route)
        .or(control_route)
        .or(weather_route)
}

fn starting(state: &BridgeState) -> WithStatus<Json> {
    warp::reply::with_status(
        warp::reply::json(&json!({"status": "starting", "progress": state.progress()})),
        StatusCode::SERVICE_UNAVAILABLE,
    )
}

fn scene_reply(state: &BridgeState) -> WithStatus<Json> {
    state.with_session(|session| match session {
        Some(session) if session.is_interactive() => {
            warp::reply::with_status(warp::reply::json(&session.snapshot()), StatusCode::OK)
        }
        _ => starting(state),
    })
}

fn error_reply(message: &str, status: StatusCode) -> WithStatus<Json> {
    warp::reply::with_status(
        warp::reply::json(&json!({"status": "error", "message": message})),
        status,
    )
}

/// Re-requests every city's conditions and replaces the weather cards.
/// The session lock is not held while requests are in flight.
async fn refresh_weather(state: Arc<BridgeState>) -> Result<WithStatus<Json>, Infallible> {
    let Some(source) = state.weather() else {
        return Ok(error_reply("weather is disabled", StatusCode::NOT_FOUND));
    };
    let cities = state.with_session(|session| match session {
        Some(session) if session.is_interactive() => Ok(session.cities().to_vec()),
        Some(_) => Err(error_reply(
            &TrackError::NotInteractive.to_string(),
            StatusCode::CONFLICT,
        )),
        None => Err(starting(&state)),
    });
    let cities = match cities {
        Ok(cities) => cities,
        Err(reply) => return Ok(reply),
    };

    let outcomes = fetch_all(source.as_ref(), &cities).await;
    Ok(state.with_session(|session| match session {
        Some(session) => {
            session.set_weather(&outcomes);
            info!(
                "weather refreshed: {} of {} cities",
                session.weather().len(),
                cities.len()
            );
            warp::reply::with_status(warp::reply::json(&session.snapshot()), StatusCode::OK)
        }
        None => starting(&state),
    }))
}

fn control_reply(state: &BridgeState, command: ControlCommand) -> WithStatus<Json> {
    debug!("control command {:?}", command);
    state.with_session(|session| {
        let Some(session) = session else {
            return starting(state);
        };
        match session.apply(command) {
            Ok(()) => {
                warp::reply::with_status(warp::reply::json(&session.snapshot()), StatusCode::OK)
            }
            Err(err) => {
                warn!("control command rejected: {}", err);
                let status = match err {
                    TrackError::NotInteractive => StatusCode::CONFLICT,
                    TrackError::StormOutOfRange { .. }
                    | TrackError::UnknownModel(_)
                    | TrackError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                error_reply(&err.to_string(), status)
            }
        }
    })
}

/// Hosts the HTTP bridge the visualizer talks to and drives autoplay.
pub struct GuiBridge {
    state: Arc<BridgeState>,
}

impl GuiBridge {
    pub fn new(settings: DisplaySettings, weather: Option<Arc<dyn WeatherSource>>) -> Self {
        Self {
            state: Arc::new(BridgeState::new(settings).with_weather(weather)),
        }
    }

    pub fn state(&self) -> Arc<BridgeState> {
        self.state.clone()
    }

    /// Binds `addr` and serves the routes on the current runtime.
    pub fn serve(&self, addr: SocketAddr) -> anyhow::Result<JoinHandle<()>> {
        let (bound, server) = warp::serve(routes(self.state()))
            .try_bind_ephemeral(addr)
            .with_context(|| format!("binding HTTP bridge to {addr}"))?;
        self.publish_status(&format!("HTTP bridge listening on http://{bound}"));
        Ok(tokio::spawn(server))
    }

    /// Ticks the timeline every `interval`. Each tick re-renders under the
    /// session lock, so a toggle from `/control` lands before the next tick.
    pub fn spawn_autoplay(&self, interval: Duration) -> JoinHandle<()> {
        let state = self.state();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                state.with_session(|session| {
                    if let Some(session) = session {
                        session.autoplay_tick();
                    }
                });
            }
        })
    }

    pub fn publish_status(&self, message: &str) {
        info!("[bridge] {}", message);
    }
}

impl Default for GuiBridge {
    fn default() -> Self {
        Self::new(DisplaySettings::default(), None)
    }
}
