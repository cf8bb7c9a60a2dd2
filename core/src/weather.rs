use crate::prelude::City;
use serde::{Deserialize, Serialize};

/// The four current-conditions fields read from the weather service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub temperature_2m: f64,
    pub relative_humidity_2m: f64,
    pub wind_speed_10m: f64,
    pub weather_code: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherResponse {
    pub current: CurrentWeather,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherIcon {
    Clear,
    PartlyCloudy,
    Fog,
    Rain,
    Snow,
    Storm,
    Mixed,
}

impl WeatherIcon {
    /// WMO weather code to icon, by ordinal range.
    pub fn from_code(code: u32) -> Self {
        match code {
            0 => WeatherIcon::Clear,
            1..=3 => WeatherIcon::PartlyCloudy,
            4..=49 => WeatherIcon::Fog,
            50..=69 => WeatherIcon::Rain,
            70..=79 => WeatherIcon::Snow,
            95.. => WeatherIcon::Storm,
            _ => WeatherIcon::Mixed,
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            WeatherIcon::Clear => "☀️",
            WeatherIcon::PartlyCloudy => "⛅",
            WeatherIcon::Fog => "🌫️",
            WeatherIcon::Rain => "🌧️",
            WeatherIcon::Snow => "❄️",
            WeatherIcon::Storm => "⛈️",
            WeatherIcon::Mixed => "🌤️",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherCard {
    pub city: String,
    pub country: String,
    pub icon: WeatherIcon,
    pub temperature_c: i32,
    pub wind_kmh: f64,
    pub humidity_pct: f64,
}

impl WeatherCard {
    pub fn new(city: &City, current: &CurrentWeather) -> Self {
        Self {
            city: city.name.clone(),
            country: city.country.clone(),
            icon: WeatherIcon::from_code(current.weather_code),
            temperature_c: current.temperature_2m.round() as i32,
            wind_kmh: current.wind_speed_10m,
            humidity_pct: current.relative_humidity_2m,
        }
    }
}

/// Result of one city's weather request.
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherOutcome {
    Ready(WeatherCard),
    Failed { city: String, reason: String },
}

/// Keeps successful cards in request order; failed cities are omitted.
pub fn collect_cards(outcomes: &[WeatherOutcome]) -> Vec<WeatherCard> {
    outcomes
        .iter()
        .filter_map(|outcome| match outcome {
            WeatherOutcome::Ready(card) => Some(card.clone()),
            WeatherOutcome::Failed { .. } => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn miami() -> City {
        City {
            name: "Miami".into(),
            country: "USA".into(),
            lat: 25.76,
            lon: -80.19,
        }
    }

    #[test]
    fn icon_table_follows_code_ranges() {
        assert_eq!(WeatherIcon::from_code(0), WeatherIcon::Clear);
        assert_eq!(WeatherIcon::from_code(3), WeatherIcon::PartlyCloudy);
        assert_eq!(WeatherIcon::from_code(45), WeatherIcon::Fog);
        assert_eq!(WeatherIcon::from_code(61), WeatherIcon::Rain);
        assert_eq!(WeatherIcon::from_code(75), WeatherIcon::Snow);
        assert_eq!(WeatherIcon::from_code(81), WeatherIcon::Mixed);
        assert_eq!(WeatherIcon::from_code(95), WeatherIcon::Storm);
        assert_eq!(WeatherIcon::from_code(99), WeatherIcon::Storm);
    }

    #[test]
    fn response_parses_and_builds_card() {
        let body = r#"{"latitude": 25.76, "current": {"time": "2026-10-18T12:00",
            "temperature_2m": 28.6, "relative_humidity_2m": 74,
            "wind_speed_10m": 14.2, "weather_code": 2}}"#;
        let response: WeatherResponse = serde_json::from_str(body).unwrap();
        let card = WeatherCard::new(&miami(), &response.current);
        assert_eq!(card.temperature_c, 29);
        assert_eq!(card.icon, WeatherIcon::PartlyCloudy);
        assert_eq!(card.humidity_pct, 74.0);
    }

    #[test]
    fn failed_cities_are_omitted() {
        let current = CurrentWeather {
            temperature_2m: 20.0,
            relative_humidity_2m: 50.0,
            wind_speed_10m: 5.0,
            weather_code: 0,
        };
        let outcomes = vec![
            WeatherOutcome::Failed {
                city: "Tokyo".into(),
                reason: "timeout".into(),
            },
            WeatherOutcome::Ready(WeatherCard::new(&miami(), &current)),
        ];
        let cards = collect_cards(&outcomes);
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].city, "Miami");
    }
}
