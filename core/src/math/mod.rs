pub mod geo;
pub mod matrix;
pub mod stats;

pub use geo::{catmull_rom, haversine_km, lat_lon_to_3d, Vec3, EARTH_RADIUS_KM, TRACK_RADIUS};
pub use matrix::MatrixHelper;
pub use stats::StatsHelper;
