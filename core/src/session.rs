//! Explicit application state shared by the control surface and display clients.

use crate::prediction::ErrorChart;
use crate::prelude::{City, ModelSelection, Storm, TrackError, TrackResult, TrackSource};
use crate::scene::{Primitive, RetainedScene, SceneTrackManager, Theme, ThemePalette};
use crate::timeline::{TimelineController, TimelineState, SCRUB_MAX};
use crate::weather::{collect_cards, WeatherCard, WeatherOutcome};
use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Commands accepted from the UI layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ControlCommand {
    SelectStorm { index: usize },
    SetModel { model: ModelSelection },
    SetScrub { percent: u8 },
    StepBack,
    StepForward,
    TogglePlay,
    ToggleTheme,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StormListEntry {
    pub index: usize,
    pub id: String,
    pub name: String,
    pub subtitle: String,
}

/// Readout for the fix at the current timeline index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StormInfo {
    pub name: String,
    pub category: String,
    pub index: usize,
    pub forecast_hour: usize,
    pub wind: f64,
    pub pressure: f64,
    pub lat_label: String,
    pub lon_label: String,
    pub time_label: Option<String>,
}

impl StormInfo {
    pub fn at(storm: &Storm, index: usize) -> Option<Self> {
        let point = storm.track.get(index.min(storm.track.len().saturating_sub(1)))?;
        Some(Self {
            name: storm.name.clone(),
            category: storm.category.clone(),
            index,
            forecast_hour: index * crate::prediction::accuracy::HOURS_PER_INDEX,
            wind: point.wind,
            pressure: point.pressure,
            lat_label: format!(
                "{:.1}°{}",
                point.lat.abs(),
                if point.lat < 0.0 { 'S' } else { 'N' }
            ),
            lon_label: format!(
                "{:.1}°{}",
                point.lon.abs(),
                if point.lon > 0.0 { 'E' } else { 'W' }
            ),
            time_label: point
                .time
                .as_deref()
                .map(|raw| format_timestamp(raw).unwrap_or_else(|| raw.to_string())),
        })
    }
}

/// Formats dataset timestamps (`2024-06-28T12:00Z` or RFC 3339) as `Jun 28, 2024, 12:00`.
pub fn format_timestamp(raw: &str) -> Option<String> {
    const DISPLAY: &str = "%b %-d, %Y, %H:%M";
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.naive_utc().format(DISPLAY).to_string());
    }
    ["%Y-%m-%dT%H:%MZ", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|pattern| NaiveDateTime::parse_from_str(raw, pattern).ok())
        .map(|parsed| parsed.format(DISPLAY).to_string())
}

/// Everything a display client needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub storms: Vec<StormListEntry>,
    pub current_storm: usize,
    pub timeline: TimelineState,
    pub theme: Theme,
    pub palette: ThemePalette,
    pub info: Option<StormInfo>,
    pub sources: Vec<TrackSource>,
    pub primitives: Vec<Primitive>,
    pub chart: ErrorChart,
    pub weather: Vec<WeatherCard>,
}

/// Loaded storms plus the mutable timeline, theme and rendered scene.
pub struct Session {
    storms: Vec<Storm>,
    cities: Vec<City>,
    weather: Vec<WeatherCard>,
    current_storm: usize,
    timeline: TimelineController,
    theme: Theme,
    scene: SceneTrackManager<RetainedScene>,
    storm_list: Vec<StormListEntry>,
    chart: ErrorChart,
    info: Option<StormInfo>,
    interactive: bool,
}

impl Session {
    pub fn new(storms: Vec<Storm>, cities: Vec<City>, timeline: TimelineController) -> Self {
        Self {
            storms,
            cities,
            weather: Vec::new(),
            current_storm: 0,
            timeline,
            theme: Theme::default(),
            scene: SceneTrackManager::new(RetainedScene::new()),
            storm_list: Vec::new(),
            chart: ErrorChart::default(),
            info: None,
            interactive: false,
        }
    }

    pub fn storms(&self) -> &[Storm] {
        &self.storms
    }

    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    pub fn weather(&self) -> &[WeatherCard] {
        &self.weather
    }

    pub fn current_storm(&self) -> usize {
        self.current_storm
    }

    pub fn timeline(&self) -> TimelineState {
        self.timeline.state()
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn scene(&self) -> &SceneTrackManager<RetainedScene> {
        &self.scene
    }

    pub fn chart(&self) -> &ErrorChart {
        &self.chart
    }

    pub fn info(&self) -> Option<&StormInfo> {
        self.info.as_ref()
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// Builds the storm list and the accuracy chart for the first storm.
    pub fn populate_ui(&mut self) {
        self.storm_list = self
            .storms
            .iter()
            .enumerate()
            .map(|(index, storm)| StormListEntry {
                index,
                id: storm.id.clone(),
                name: storm.name.clone(),
                subtitle: format!("{} · {}", storm.dates, storm.basin),
            })
            .collect();
        self.refresh_chart();
    }

    pub fn set_weather(&mut self, outcomes: &[WeatherOutcome]) {
        self.weather = collect_cards(outcomes);
    }

    /// Draws the initial frame and accepts control commands from now on.
    pub fn mark_ready(&mut self) {
        self.render();
        self.interactive = true;
    }

    pub fn apply(&mut self, command: ControlCommand) -> TrackResult<()> {
        match command {
            ControlCommand::SelectStorm { index } => self.select_storm(index),
            ControlCommand::SetModel { model } => self.set_model(model),
            ControlCommand::SetScrub { percent } => self.set_scrub(percent),
            ControlCommand::StepBack => self.step_back(),
            ControlCommand::StepForward => self.step_forward(),
            ControlCommand::TogglePlay => self.toggle_play().map(|_| ()),
            ControlCommand::ToggleTheme => self.toggle_theme().map(|_| ()),
        }
    }

    /// Switches storm and rewinds the scrubber to the full track.
    pub fn select_storm(&mut self, index: usize) -> TrackResult<()> {
        self.ensure_interactive()?;
        if index >= self.storms.len() {
            return Err(TrackError::StormOutOfRange {
                index,
                count: self.storms.len(),
            });
        }
        self.current_storm = index;
        self.timeline.set_scrub(SCRUB_MAX);
        self.refresh_chart();
        self.render();
        Ok(())
    }

    pub fn set_model(&mut self, selection: ModelSelection) -> TrackResult<()> {
        self.ensure_interactive()?;
        self.timeline.set_model(selection);
        self.render();
        Ok(())
    }

    /// Parses a raw model tag, rejecting anything outside the closed set.
    pub fn set_model_tag(&mut self, tag: &str) -> TrackResult<()> {
        let selection = tag.parse::<ModelSelection>()?;
        self.set_model(selection)
    }

    pub fn set_scrub(&mut self, percent: u8) -> TrackResult<()> {
        self.ensure_interactive()?;
        self.timeline.set_scrub(percent);
        self.render();
        Ok(())
    }

    pub fn step_back(&mut self) -> TrackResult<()> {
        self.ensure_interactive()?;
        self.timeline.step_back();
        self.render();
        Ok(())
    }

    pub fn step_forward(&mut self) -> TrackResult<()> {
        self.ensure_interactive()?;
        self.timeline.step_forward();
        self.render();
        Ok(())
    }

    pub fn toggle_play(&mut self) -> TrackResult<bool> {
        self.ensure_interactive()?;
        Ok(self.timeline.toggle_play())
    }

    /// Swaps the palette; track colors are unaffected.
    pub fn toggle_theme(&mut self) -> TrackResult<Theme> {
        self.ensure_interactive()?;
        self.theme = self.theme.toggled();
        Ok(self.theme)
    }

    /// One autoplay step. The scene is re-rendered before this returns.
    pub fn autoplay_tick(&mut self) -> bool {
        if !self.interactive || !self.timeline.tick() {
            return false;
        }
        self.render();
        true
    }

    /// Releases every rendered resource.
    pub fn teardown(&mut self) {
        self.scene.clear();
        self.interactive = false;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            storms: self.storm_list.clone(),
            current_storm: self.current_storm,
            timeline: self.timeline.state(),
            theme: self.theme,
            palette: self.theme.palette(),
            info: self.info.clone(),
            sources: self.scene.rendered_sources(),
            primitives: self.scene.backend().snapshot(),
            chart: self.chart.clone(),
            weather: self.weather.clone(),
        }
    }

    fn ensure_interactive(&self) -> TrackResult<()> {
        if self.interactive {
            Ok(())
        } else {
            Err(TrackError::NotInteractive)
        }
    }

    fn refresh_chart(&mut self) {
        self.chart = self
            .storms
            .get(self.current_storm)
            .map(ErrorChart::for_storm)
            .unwrap_or_default();
    }

    fn render(&mut self) {
        match self.storms.get(self.current_storm) {
            Some(storm) => {
                let index = self.timeline.index_for(storm.track.len());
                self.scene
                    .update(storm, index, self.timeline.selected_model());
                self.info = StormInfo::at(storm, index);
            }
            None => {
                self.scene.clear();
                self.info = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::{ModelKind, PredictionSet, TrackPoint};
    use crate::scene::RenderBackend;
    use crate::weather::{CurrentWeather, WeatherCard};

    fn storm(id: &str, len: usize) -> Storm {
        let track: Vec<TrackPoint> = (0..len)
            .map(|i| {
                TrackPoint::new(-45.4 - 2.8 * i as f64, 9.4 + 0.5 * i as f64, 45.0, 1003.0)
                    .with_time(format!("2024-06-{:02}T12:00Z", 10 + i))
            })
            .collect();
        Storm {
            id: id.into(),
            name: format!("Hurricane {id}"),
            category: "Category 5".into(),
            dates: "Jun 28 - Jul 11, 2024".into(),
            basin: "Atlantic".into(),
            predictions: Some(PredictionSet {
                ai: track.clone(),
                ecmwf: track.clone(),
                gfs: track.clone(),
            }),
            track,
        }
    }

    fn ready_session() -> Session {
        let mut session = Session::new(
            vec![storm("beryl", 19), storm("otis", 7)],
            Vec::new(),
            TimelineController::new(),
        );
        session.populate_ui();
        session.mark_ready();
        session
    }

    #[test]
    fn commands_are_rejected_before_ready() {
        let mut session = Session::new(vec![storm("beryl", 8)], Vec::new(), TimelineController::new());
        assert!(matches!(session.set_scrub(10), Err(TrackError::NotInteractive)));
        assert!(!session.autoplay_tick());
    }

    #[test]
    fn scrub_to_half_shows_index_nine() {
        let mut session = ready_session();
        session.set_scrub(50).unwrap();
        let info = session.info().unwrap();
        assert_eq!(info.index, 9);
        assert_eq!(info.forecast_hour, 108);
        assert_eq!(
            session
                .scene()
                .rendered(TrackSource::Actual)
                .map(|track| track.points),
            Some(10)
        );
    }

    #[test]
    fn model_selection_controls_rendered_sources() {
        let mut session = ready_session();
        session.set_model(ModelSelection::All).unwrap();
        assert_eq!(session.snapshot().sources.len(), 4);
        session.set_model_tag("ai").unwrap();
        assert_eq!(
            session.snapshot().sources,
            vec![TrackSource::Model(ModelKind::Ai), TrackSource::Actual]
        );
        assert!(matches!(
            session.set_model_tag("icon"),
            Err(TrackError::UnknownModel(_))
        ));
    }

    #[test]
    fn select_storm_resets_scrub_and_chart() {
        let mut session = ready_session();
        session.set_scrub(20).unwrap();
        session.select_storm(1).unwrap();
        assert_eq!(session.timeline().scrub_percent, 100);
        assert_eq!(session.chart().labels.len(), 7);
        assert_eq!(session.info().unwrap().index, 6);
        assert!(matches!(
            session.select_storm(5),
            Err(TrackError::StormOutOfRange { index: 5, count: 2 })
        ));
    }

    #[test]
    fn autoplay_renders_each_tick() {
        let mut session = ready_session();
        session.set_scrub(0).unwrap();
        assert!(!session.autoplay_tick());
        session.toggle_play().unwrap();
        for _ in 0..50 {
            assert!(session.autoplay_tick());
        }
        assert_eq!(session.timeline().scrub_percent, 100);
        assert_eq!(session.info().unwrap().index, 18);
        assert!(session.autoplay_tick());
        assert_eq!(session.timeline().scrub_percent, 0);
    }

    #[test]
    fn repeated_renders_keep_resource_count_flat() {
        let mut session = ready_session();
        session.set_model(ModelSelection::All).unwrap();
        let live = session.scene().backend().live_resources();
        for _ in 0..5 {
            session.set_scrub(100).unwrap();
        }
        assert_eq!(session.scene().backend().live_resources(), live);
        assert_eq!(live, 12);
    }

    #[test]
    fn theme_toggle_keeps_track_colors() {
        let mut session = ready_session();
        let before: Vec<_> = session.snapshot().primitives.iter().map(|p| p.color).collect();
        assert_eq!(session.toggle_theme().unwrap(), Theme::Light);
        let snapshot = session.snapshot();
        let after: Vec<_> = snapshot.primitives.iter().map(|p| p.color).collect();
        assert_eq!(before, after);
        assert_eq!(snapshot.palette, Theme::Light.palette());
    }

    #[test]
    fn apply_dispatches_commands() {
        let mut session = ready_session();
        session.apply(ControlCommand::SetScrub { percent: 30 }).unwrap();
        session.apply(ControlCommand::StepForward).unwrap();
        session.apply(ControlCommand::StepBack).unwrap();
        session.apply(ControlCommand::StepBack).unwrap();
        assert_eq!(session.timeline().scrub_percent, 25);
        session.apply(ControlCommand::TogglePlay).unwrap();
        assert!(session.timeline().is_playing);
    }

    #[test]
    fn control_commands_use_tagged_json() {
        let command: ControlCommand =
            serde_json::from_str(r#"{"command": "set_model", "model": "gfs"}"#).unwrap();
        assert_eq!(
            command,
            ControlCommand::SetModel {
                model: ModelSelection::Gfs
            }
        );
        assert!(serde_json::from_str::<ControlCommand>(r#"{"command": "set_model", "model": "navgem"}"#).is_err());
    }

    #[test]
    fn info_formats_coordinates_and_time() {
        let info = StormInfo::at(&storm("beryl", 3), 0).unwrap();
        assert_eq!(info.lat_label, "9.4°N");
        assert_eq!(info.lon_label, "45.4°W");
        assert_eq!(info.time_label.as_deref(), Some("Jun 10, 2024, 12:00"));
    }

    #[test]
    fn timestamps_accept_rfc3339_and_reject_garbage() {
        assert_eq!(
            format_timestamp("2023-10-25T06:00:00Z").as_deref(),
            Some("Oct 25, 2023, 06:00")
        );
        assert_eq!(format_timestamp("yesterday"), None);
    }

    #[test]
    fn weather_cards_skip_failures() {
        let mut session = ready_session();
        let card = WeatherCard::new(
            &City {
                name: "Manila".into(),
                country: "Philippines".into(),
                lat: 14.6,
                lon: 120.98,
            },
            &CurrentWeather {
                temperature_2m: 31.2,
                relative_humidity_2m: 70.0,
                wind_speed_10m: 9.0,
                weather_code: 61,
            },
        );
        session.set_weather(&[
            WeatherOutcome::Ready(card),
            WeatherOutcome::Failed {
                city: "Seoul".into(),
                reason: "HTTP 500".into(),
            },
        ]);
        assert_eq!(session.snapshot().weather.len(), 1);
    }

    #[test]
    fn teardown_releases_scene() {
        let mut session = ready_session();
        session.teardown();
        assert_eq!(session.scene().backend().live_resources(), 0);
        assert!(!session.is_interactive());
    }
}
