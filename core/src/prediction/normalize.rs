//! Fixed-bound feature scaling for track points.
//!
//! Bounds are constants rather than dataset statistics, so denormalized
//! forecasts stay bounded even for out-of-distribution inputs.

use crate::prelude::TrackPoint;

/// Features per point: latitude, longitude, wind, pressure.
pub const FEATURES: usize = 4;

pub type Features = [f64; FEATURES];

const LAT_SCALE: f64 = 90.0;
const LON_OFFSET: f64 = 180.0;
const LON_SCALE: f64 = 360.0;
const WIND_SCALE: f64 = 200.0;
const PRESSURE_OFFSET: f64 = 900.0;
const PRESSURE_SCALE: f64 = 120.0;

pub const WIND_MIN_KT: f64 = 20.0;
pub const WIND_MAX_KT: f64 = 180.0;
pub const PRESSURE_MIN_HPA: f64 = 880.0;
pub const PRESSURE_MAX_HPA: f64 = 1020.0;

pub fn normalize(point: &TrackPoint) -> Features {
    [
        point.lat / LAT_SCALE,
        (point.lon + LON_OFFSET) / LON_SCALE,
        point.wind / WIND_SCALE,
        (point.pressure - PRESSURE_OFFSET) / PRESSURE_SCALE,
    ]
}

/// Inverse of [`normalize`], clamping wind and pressure to physical bounds.
pub fn denormalize(features: &Features) -> TrackPoint {
    TrackPoint::new(
        features[1] * LON_SCALE - LON_OFFSET,
        features[0] * LAT_SCALE,
        (features[2] * WIND_SCALE).clamp(WIND_MIN_KT, WIND_MAX_KT),
        (features[3] * PRESSURE_SCALE + PRESSURE_OFFSET).clamp(PRESSURE_MIN_HPA, PRESSURE_MAX_HPA),
    )
}
