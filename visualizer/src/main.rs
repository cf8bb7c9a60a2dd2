use iced::{
    mouse, time,
    widget::{
        button, column, container, mouse_area, progress_bar, row, scrollable, slider, text,
        Canvas, Column, Container,
    },
    Alignment, Background, Color, Element, Length, Point, Subscription, Task, Theme,
};
use scene_canvas::{to_color, ErrorChartCanvas, GlobeCanvas};
use serde::Deserialize;
use std::time::Duration;
use stormcore::prelude::ModelSelection;
use stormcore::scene::{GlobeView, Theme as SceneTheme, ThemePalette, ROTATION_SPEED};
use stormcore::session::{ControlCommand, SessionSnapshot};
use stormcore::telemetry::ProgressEvent;

mod scene_canvas;

const DEFAULT_BRIDGE: &str = "http://127.0.0.1:9000";

fn main() -> iced::Result {
    iced::application(Visualizer::boot, Visualizer::update, Visualizer::view)
        .title(application_title)
        .subscription(application_subscription)
        .theme(application_theme)
        .run()
}

fn application_title(_: &Visualizer) -> String {
    "Storm Track Workbench".into()
}

fn application_subscription(_: &Visualizer) -> Subscription<Message> {
    Subscription::batch([
        time::every(Duration::from_millis(200)).map(|_| Message::Poll),
        time::every(Duration::from_millis(16)).map(|_| Message::Frame),
    ])
}

fn application_theme(state: &Visualizer) -> Theme {
    match state.scene_theme() {
        SceneTheme::Dark => Theme::Dark,
        SceneTheme::Light => Theme::Light,
    }
}

#[derive(Debug)]
struct Visualizer {
    bridge: String,
    rotation_speed: f64,
    progress: ProgressEvent,
    scene: Option<SessionSnapshot>,
    globe: GlobeView,
    cursor: Option<Point>,
    status: String,
    history: Vec<String>,
}

#[derive(Debug, Clone)]
enum Message {
    Poll,
    Frame,
    SettingsFetched(Result<DisplaySettings, String>),
    ProgressFetched(Result<ProgressEvent, String>),
    SceneFetched(Result<Option<SessionSnapshot>, String>),
    Control(ControlCommand),
    ControlApplied(Result<SessionSnapshot, String>),
    Scrubbed(u8),
    RefreshWeather,
    PointerDown,
    PointerUp,
    PointerMoved(Point),
    Scrolled(mouse::ScrollDelta),
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct DisplaySettings {
    rotation_speed: f64,
}

impl Visualizer {
    fn boot() -> (Self, Task<Message>) {
        let bridge = std::env::var("STORM_BRIDGE_URL").unwrap_or_else(|_| DEFAULT_BRIDGE.into());
        (
            Visualizer {
                bridge: bridge.clone(),
                rotation_speed: ROTATION_SPEED,
                progress: ProgressEvent::default(),
                scene: None,
                globe: GlobeView::new(),
                cursor: None,
                status: "Waiting for the driver...".into(),
                history: Vec::new(),
            },
            Task::perform(fetch_settings(bridge), Message::SettingsFetched),
        )
    }

    fn update(state: &mut Self, message: Message) -> Task<Message> {
        match message {
            Message::Poll => {
                let bridge = state.bridge.clone();
                if state.progress.is_ready() {
                    Task::perform(fetch_scene(bridge), Message::SceneFetched)
                } else {
                    Task::batch([
                        Task::perform(fetch_progress(bridge.clone()), Message::ProgressFetched),
                        Task::perform(fetch_scene(bridge), Message::SceneFetched),
                    ])
                }
            }
            Message::Frame => {
                state.globe.frame_tick(state.rotation_speed);
                Task::none()
            }
            Message::SettingsFetched(Ok(settings)) => {
                state.rotation_speed = settings.rotation_speed;
                Task::none()
            }
            Message::SettingsFetched(Err(err)) => {
                state.status = format!("Settings unavailable: {err}");
                Task::none()
            }
            Message::ProgressFetched(Ok(progress)) => {
                if progress != state.progress {
                    state.push_history(format!("[{:>3}%] {}", progress.percent, progress.message));
                }
                state.status = progress.message.clone();
                state.progress = progress;
                Task::none()
            }
            Message::ProgressFetched(Err(err)) => {
                state.status = format!("Bridge error: {err}");
                Task::none()
            }
            Message::SceneFetched(Ok(scene)) => {
                if scene.is_some() {
                    state.scene = scene;
                }
                Task::none()
            }
            Message::SceneFetched(Err(err)) => {
                state.status = format!("Scene error: {err}");
                Task::none()
            }
            Message::Control(command) => {
                state.push_history(format!("{command:?}"));
                Task::perform(
                    post_control(state.bridge.clone(), command),
                    Message::ControlApplied,
                )
            }
            Message::ControlApplied(Ok(scene)) => {
                state.scene = Some(scene);
                Task::none()
            }
            Message::ControlApplied(Err(err)) => {
                state.status = format!("Control error: {err}");
                Task::none()
            }
            Message::Scrubbed(percent) => {
                if let Some(scene) = state.scene.as_mut() {
                    scene.timeline.scrub_percent = percent;
                }
                Task::perform(
                    post_control(state.bridge.clone(), ControlCommand::SetScrub { percent }),
                    Message::ControlApplied,
                )
            }
            Message::RefreshWeather => {
                state.push_history("weather refresh".into());
                Task::perform(refresh_weather(state.bridge.clone()), Message::ControlApplied)
            }
            Message::PointerDown => {
                if let Some(cursor) = state.cursor {
                    state
                        .globe
                        .pointer_down(f64::from(cursor.x), f64::from(cursor.y));
                }
                Task::none()
            }
            Message::PointerUp => {
                state.globe.pointer_up();
                Task::none()
            }
            Message::PointerMoved(point) => {
                state.cursor = Some(point);
                state
                    .globe
                    .pointer_moved(f64::from(point.x), f64::from(point.y));
                Task::none()
            }
            Message::Scrolled(delta) => {
                let lines = match delta {
                    mouse::ScrollDelta::Lines { y, .. } => y * 40.0,
                    mouse::ScrollDelta::Pixels { y, .. } => y,
                };
                state.globe.zoom(-f64::from(lines));
                Task::none()
            }
        }
    }

    fn view(state: &Self) -> Element<'_, Message> {
        let palette = state.scene_theme().palette();

        let Some(scene) = &state.scene else {
            return state.loading_view(palette);
        };

        let theme_label = match scene.theme {
            SceneTheme::Dark => "Light mode",
            SceneTheme::Light => "Dark mode",
        };
        let header = row![
            text("Storm Track Workbench").size(26).width(Length::Fill),
            text(&state.status).size(13),
            button(theme_label)
                .on_press(Message::Control(ControlCommand::ToggleTheme))
                .padding(8),
        ]
        .spacing(16)
        .align_y(Alignment::Center);

        let storm_list = scene.storms.iter().fold(
            Column::new().spacing(6),
            |col, entry| {
                let item = button(column![
                    text(&entry.name).size(15),
                    text(&entry.subtitle).size(11),
                ])
                .on_press(Message::Control(ControlCommand::SelectStorm {
                    index: entry.index,
                }))
                .width(Length::Fill)
                .padding(8);
                col.push(if entry.index == scene.current_storm {
                    item.style(button::primary)
                } else {
                    item.style(button::secondary)
                })
            },
        );

        let info_panel = match &scene.info {
            Some(info) => column![
                text(&info.name).size(20),
                text(&info.category).size(13),
                text(format!("Wind {:.0} kt", info.wind)).size(14),
                text(format!("Pressure {:.0} hPa", info.pressure)).size(14),
                text(format!("{}  {}", info.lat_label, info.lon_label)).size(14),
                text(format!("Forecast hour +{}h", info.forecast_hour)).size(12),
            ]
            .spacing(4),
            None => column![text("No storm selected").size(14)],
        };

        let left_column = column![
            text("Storms").size(18),
            scrollable(storm_list).height(Length::Fixed(300.0)),
            card(info_panel.into(), palette),
        ]
        .spacing(12)
        .width(Length::Fixed(260.0));

        let model_tabs = [
            (ModelSelection::Ai, "AI Ensemble"),
            (ModelSelection::Ecmwf, "ECMWF"),
            (ModelSelection::Gfs, "GFS"),
            (ModelSelection::All, "All Models"),
        ]
        .into_iter()
        .fold(row![].spacing(6), |tabs, (model, label)| {
            let tab = button(text(label).size(13))
                .on_press(Message::Control(ControlCommand::SetModel { model }))
                .padding(6);
            tabs.push(if scene.timeline.selected_model == model {
                tab.style(button::primary)
            } else {
                tab.style(button::secondary)
            })
        });

        let globe = mouse_area(
            Canvas::new(GlobeCanvas {
                primitives: scene.primitives.clone(),
                view: state.globe.clone(),
                palette,
            })
            .width(Length::Fill)
            .height(Length::Fixed(460.0)),
        )
        .on_press(Message::PointerDown)
        .on_release(Message::PointerUp)
        .on_move(Message::PointerMoved)
        .on_scroll(Message::Scrolled);

        let time_label = scene
            .info
            .as_ref()
            .and_then(|info| info.time_label.clone())
            .unwrap_or_default();
        let play_label = if scene.timeline.is_playing { "Pause" } else { "Play" };
        let timeline = row![
            button("<").on_press(Message::Control(ControlCommand::StepBack)),
            button(play_label).on_press(Message::Control(ControlCommand::TogglePlay)),
            button(">").on_press(Message::Control(ControlCommand::StepForward)),
            slider(0..=100, scene.timeline.scrub_percent, Message::Scrubbed).width(Length::Fill),
            text(time_label).size(13).width(Length::Fixed(150.0)),
        ]
        .spacing(8)
        .align_y(Alignment::Center);

        let center_column = column![model_tabs, globe, timeline]
            .spacing(10)
            .width(Length::Fill);

        let chart = Canvas::new(ErrorChartCanvas {
            chart: scene.chart.clone(),
            palette,
        })
        .width(Length::Fill)
        .height(Length::Fixed(220.0));

        let weather_cards = if scene.weather.is_empty() {
            Column::new().push(text("No weather data").size(12))
        } else {
            scene
                .weather
                .iter()
                .fold(Column::new().spacing(8), |col, weather| {
                    col.push(card(
                        column![
                            text(format!(
                                "{} {}, {}",
                                weather.icon.glyph(),
                                weather.city,
                                weather.country
                            ))
                            .size(14),
                            text(format!("{}°C", weather.temperature_c)).size(20),
                            text(format!(
                                "Wind {:.0} km/h  Humidity {:.0}%",
                                weather.wind_kmh, weather.humidity_pct
                            ))
                            .size(12),
                        ]
                        .spacing(2)
                        .into(),
                        palette,
                    ))
                })
        };

        let history_list = state
            .history
            .iter()
            .rev()
            .fold(Column::new().spacing(2), |col, entry| {
                col.push(text(entry.clone()).size(11))
            });

        let right_column = column![
            text("Track error (km)").size(18),
            chart,
            row![
                text("Live weather").size(18).width(Length::Fill),
                button(text("Refresh").size(12))
                    .on_press(Message::RefreshWeather)
                    .padding(4),
            ]
            .align_y(Alignment::Center),
            scrollable(weather_cards).height(Length::Fixed(220.0)),
            text("Activity").size(14),
            scrollable(history_list).height(Length::Fixed(80.0)),
        ]
        .spacing(10)
        .width(Length::Fixed(340.0));

        let layout = column![
            header,
            row![left_column, center_column, right_column]
                .spacing(20)
                .align_y(Alignment::Start),
        ]
        .spacing(16)
        .padding(20);

        themed(layout.into(), palette)
    }

    fn loading_view(&self, palette: ThemePalette) -> Element<'_, Message> {
        let message = if self.progress.failed {
            text(&self.progress.message)
                .size(16)
                .color(Color::from_rgb(0.92, 0.26, 0.21))
        } else {
            text(&self.progress.message).size(16)
        };
        let content = column![
            text("Storm Track Workbench").size(28),
            message,
            progress_bar(0.0..=100.0, f32::from(self.progress.percent)),
            text(&self.status).size(12),
        ]
        .spacing(12)
        .width(Length::Fixed(420.0))
        .align_x(Alignment::Center);

        themed(
            Container::new(content)
                .center_x(Length::Fill)
                .center_y(Length::Fill)
                .into(),
            palette,
        )
    }

    fn scene_theme(&self) -> SceneTheme {
        self.scene
            .as_ref()
            .map(|scene| scene.theme)
            .unwrap_or_default()
    }

    fn push_history(&mut self, entry: String) {
        self.history.push(entry);
        if self.history.len() > 20 {
            self.history.remove(0);
        }
    }
}

fn card<'a>(content: Element<'a, Message>, palette: ThemePalette) -> Element<'a, Message> {
    Container::new(content)
        .padding(10)
        .width(Length::Fill)
        .style(move |_| container::Style {
            background: Some(Background::Color(to_color(palette.bg_card))),
            border: iced::Border {
                color: to_color(palette.border),
                width: 1.0,
                radius: 8.0.into(),
            },
            ..container::Style::default()
        })
        .into()
}

fn themed<'a>(content: Element<'a, Message>, palette: ThemePalette) -> Element<'a, Message> {
    Container::new(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .style(move |_| container::Style {
            background: Some(Background::Color(to_color(palette.bg_primary))),
            text_color: Some(to_color(palette.text_primary)),
            ..container::Style::default()
        })
        .into()
}

async fn fetch_settings(bridge: String) -> Result<DisplaySettings, String> {
    reqwest::get(format!("{bridge}/settings"))
        .await
        .map_err(|e| e.to_string())?
        .json::<DisplaySettings>()
        .await
        .map_err(|e| e.to_string())
}

async fn fetch_progress(bridge: String) -> Result<ProgressEvent, String> {
    reqwest::get(format!("{bridge}/progress"))
        .await
        .map_err(|e| e.to_string())?
        .json::<ProgressEvent>()
        .await
        .map_err(|e| e.to_string())
}

/// `Ok(None)` while the driver is still starting up.
async fn fetch_scene(bridge: String) -> Result<Option<SessionSnapshot>, String> {
    let response = reqwest::get(format!("{bridge}/scene"))
        .await
        .map_err(|e| e.to_string())?;
    if response.status() == reqwest::StatusCode::SERVICE_UNAVAILABLE {
        return Ok(None);
    }
    response
        .json::<SessionSnapshot>()
        .await
        .map(Some)
        .map_err(|e| e.to_string())
}

async fn post_control(bridge: String, command: ControlCommand) -> Result<SessionSnapshot, String> {
    let response = reqwest::Client::new()
        .post(format!("{bridge}/control"))
        .json(&command)
        .send()
        .await
        .map_err(|e| e.to_string())?;
    snapshot_from(response).await
}

async fn refresh_weather(bridge: String) -> Result<SessionSnapshot, String> {
    let response = reqwest::Client::new()
        .post(format!("{bridge}/weather/refresh"))
        .send()
        .await
        .map_err(|e| e.to_string())?;
    snapshot_from(response).await
}

async fn snapshot_from(response: reqwest::Response) -> Result<SessionSnapshot, String> {
    if response.status().is_success() {
        response
            .json::<SessionSnapshot>()
            .await
            .map_err(|e| e.to_string())
    } else {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        Err(format!("{}: {}", status, text))
    }
}
