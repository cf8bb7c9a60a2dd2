use anyhow::Context;
use async_trait::async_trait;
use log::{debug, warn};
use std::time::Duration;
use stormcore::prelude::City;
use stormcore::weather::{CurrentWeather, WeatherCard, WeatherOutcome, WeatherResponse};

const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,wind_speed_10m,weather_code";

/// Current conditions for one location.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn current(&self, city: &City) -> anyhow::Result<CurrentWeather>;
}

pub struct OpenMeteoClient {
    http: reqwest::Client,
    endpoint: String,
}

impl OpenMeteoClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building weather HTTP client")?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl WeatherSource for OpenMeteoClient {
    async fn current(&self, city: &City) -> anyhow::Result<CurrentWeather> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("latitude", city.lat.to_string()),
                ("longitude", city.lon.to_string()),
                ("current", CURRENT_FIELDS.to_string()),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await
            .with_context(|| format!("requesting weather for {}", city.name))?
            .error_for_status()
            .with_context(|| format!("weather service rejected {}", city.name))?;
        let body: WeatherResponse = response
            .json()
            .await
            .with_context(|| format!("decoding weather for {}", city.name))?;
        Ok(body.current)
    }
}

/// Queries each city in turn. A failed city is logged and reported as
/// [`WeatherOutcome::Failed`]; the remaining cities are still requested.
pub async fn fetch_all(source: &dyn WeatherSource, cities: &[City]) -> Vec<WeatherOutcome> {
    let mut outcomes = Vec::with_capacity(cities.len());
    for city in cities {
        match source.current(city).await {
            Ok(current) => {
                debug!("weather for {}: code {}", city.name, current.weather_code);
                outcomes.push(WeatherOutcome::Ready(WeatherCard::new(city, &current)));
            }
            Err(err) => {
                warn!("weather fetch failed for {}: {:#}", city.name, err);
                outcomes.push(WeatherOutcome::Failed {
                    city: city.name.clone(),
                    reason: format!("{:#}", err),
                });
            }
        }
    }
    outcomes
}
