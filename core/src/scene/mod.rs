//! Scene lifecycle: the render-backend seam, the retained primitive arena,
//! the track manager, the globe camera and the color palettes.

pub mod backend;
pub mod globe;
pub mod manager;
pub mod palette;
pub mod retained;

pub use backend::{MarkerStyle, RenderBackend, ResourceId, GLOW_MARKER, POSITION_MARKER};
pub use globe::{GlobeView, ROTATION_SPEED};
pub use manager::{sources_for, RenderedTrack, SceneTrackManager};
pub use palette::{track_color, Rgba, Theme, ThemePalette};
pub use retained::{Primitive, PrimitiveShape, RetainedScene};
