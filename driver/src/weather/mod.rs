pub mod client;

pub use client::{fetch_all, OpenMeteoClient, WeatherSource};
