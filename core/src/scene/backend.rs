use crate::math::Vec3;
use crate::scene::palette::Rgba;
use serde::{Deserialize, Serialize};

/// Handle to a drawing resource owned by a [`RenderBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkerStyle {
    pub radius: f64,
    pub opacity: f64,
}

/// Solid marker at the most recent point of a track.
pub const POSITION_MARKER: MarkerStyle = MarkerStyle {
    radius: 0.025,
    opacity: 1.0,
};

/// Translucent halo drawn around the position marker.
pub const GLOW_MARKER: MarkerStyle = MarkerStyle {
    radius: 0.035,
    opacity: 0.4,
};

/// Path tube radius and opacity.
pub const PATH_RADIUS: f64 = 0.008;
pub const PATH_OPACITY: f64 = 0.9;

/// Retained-mode drawing surface the scene manager allocates into.
///
/// Every created resource must eventually be handed back to `dispose`.
pub trait RenderBackend {
    fn create_path(&mut self, points: &[Vec3], color: Rgba) -> ResourceId;
    fn create_marker(&mut self, position: Vec3, style: MarkerStyle, color: Rgba) -> ResourceId;
    /// Releases a resource; returns false for unknown handles.
    fn dispose(&mut self, id: ResourceId) -> bool;
    fn live_resources(&self) -> usize;
}
