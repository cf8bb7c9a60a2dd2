use crate::weather::WeatherSource;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};
use stormcore::scene::ROTATION_SPEED;
use stormcore::session::Session;
use stormcore::telemetry::ProgressEvent;

/// Client-side animation settings served at `GET /settings`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplaySettings {
    pub rotation_speed: f64,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            rotation_speed: ROTATION_SPEED,
        }
    }
}

/// State shared between the HTTP routes, the autoplay loop and the progress forwarder.
///
/// `session` is `None` until startup finishes; every control command and every
/// autoplay tick goes through its write lock.
#[derive(Default)]
pub struct BridgeState {
    settings: DisplaySettings,
    progress: RwLock<ProgressEvent>,
    session: RwLock<Option<Session>>,
    weather: Option<Arc<dyn WeatherSource>>,
}

impl BridgeState {
    pub fn new(settings: DisplaySettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Source used by `POST /weather/refresh`; refresh is refused without one.
    pub fn with_weather(mut self, weather: Option<Arc<dyn WeatherSource>>) -> Self {
        self.weather = weather;
        self
    }

    pub fn weather(&self) -> Option<Arc<dyn WeatherSource>> {
        self.weather.clone()
    }

    pub fn settings(&self) -> DisplaySettings {
        self.settings
    }

    pub fn progress(&self) -> ProgressEvent {
        self.progress
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn publish_progress(&self, event: ProgressEvent) {
        *self
            .progress
            .write()
            .unwrap_or_else(PoisonError::into_inner) = event;
    }

    pub fn install(&self, session: Session) {
        *self.session_mut() = Some(session);
    }

    pub fn take_session(&self) -> Option<Session> {
        self.session_mut().take()
    }

    /// Runs `f` against the session under its write lock.
    pub fn with_session<R>(&self, f: impl FnOnce(Option<&mut Session>) -> R) -> R {
        let mut guard = self.session_mut();
        f(guard.as_mut())
    }

    fn session_mut(&self) -> RwLockWriteGuard<'_, Option<Session>> {
        self.session.write().unwrap_or_else(PoisonError::into_inner)
    }
}
