use serde::{Deserialize, Serialize};

/// Mean Earth radius used for great-circle distances.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Radius tracks are lifted to so they sit just above the unit globe.
pub const TRACK_RADIUS: f64 = 1.01;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    fn add(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    fn scale(self, factor: f64) -> Vec3 {
        Vec3::new(self.x * factor, self.y * factor, self.z * factor)
    }
}

/// Great-circle (haversine) distance between two coordinates in kilometres.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    EARTH_RADIUS_KM * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Maps latitude/longitude onto a sphere of `radius` (y up, prime meridian facing -x).
pub fn lat_lon_to_3d(lat: f64, lon: f64, radius: f64) -> Vec3 {
    let phi = (90.0 - lat).to_radians();
    let theta = (lon + 180.0).to_radians();
    Vec3::new(
        -radius * phi.sin() * theta.cos(),
        radius * phi.cos(),
        radius * phi.sin() * theta.sin(),
    )
}

/// Uniform Catmull-Rom spline through `points`, `samples_per_span` samples per segment.
///
/// End points are duplicated as phantom controls, so the curve passes through
/// every input point including the first and last.
pub fn catmull_rom(points: &[Vec3], samples_per_span: usize) -> Vec<Vec3> {
    if points.len() < 2 || samples_per_span == 0 {
        return points.to_vec();
    }

    let last = points.len() - 1;
    let mut curve = Vec::with_capacity(last * samples_per_span + 1);
    for span in 0..last {
        let p0 = points[span.saturating_sub(1)];
        let p1 = points[span];
        let p2 = points[span + 1];
        let p3 = points[(span + 2).min(last)];
        for step in 0..samples_per_span {
            let t = step as f64 / samples_per_span as f64;
            curve.push(catmull_rom_point(p0, p1, p2, p3, t));
        }
    }
    curve.push(points[last]);
    curve
}

fn catmull_rom_point(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, t: f64) -> Vec3 {
    let t2 = t * t;
    let t3 = t2 * t;
    let c0 = -0.5 * t3 + t2 - 0.5 * t;
    let c1 = 1.5 * t3 - 2.5 * t2 + 1.0;
    let c2 = -1.5 * t3 + 2.0 * t2 + 0.5 * t;
    let c3 = 0.5 * t3 - 0.5 * t2;
    p0.scale(c0)
        .add(p1.scale(c1))
        .add(p2.scale(c2))
        .add(p3.scale(c3))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_degree_of_longitude_at_equator_is_about_111_km() {
        let distance = haversine_km(0.0, 0.0, 0.0, 1.0);
        assert!((distance - 111.0).abs() <= 1.0, "got {distance}");
    }

    #[test]
    fn haversine_of_identical_points_is_zero() {
        assert_eq!(haversine_km(25.76, -80.19, 25.76, -80.19), 0.0);
    }

    #[test]
    fn north_pole_maps_to_positive_y() {
        let pole = lat_lon_to_3d(90.0, 0.0, 1.0);
        assert!((pole.y - 1.0).abs() < 1e-12);
        assert!(pole.x.abs() < 1e-12 && pole.z.abs() < 1e-12);
    }

    #[test]
    fn projected_points_keep_radius() {
        let point = lat_lon_to_3d(16.5, -99.0, TRACK_RADIUS);
        assert!((point.length() - TRACK_RADIUS).abs() < 1e-12);
    }

    #[test]
    fn catmull_rom_passes_through_controls() {
        let controls = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
        ];
        let curve = catmull_rom(&controls, 8);
        assert_eq!(curve.len(), 2 * 8 + 1);
        assert_eq!(curve[0], controls[0]);
        assert_eq!(curve[8], controls[1]);
        assert_eq!(*curve.last().unwrap(), controls[2]);
    }
}
