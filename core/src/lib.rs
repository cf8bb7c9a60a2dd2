//! Core of the storm forecast workbench.
//!
//! Track prediction, the scrub/playback timeline, the retained 3D scene and
//! the session state that ties them together for display clients.

pub mod math;
pub mod prediction;
pub mod prelude;
pub mod scene;
pub mod session;
pub mod telemetry;
pub mod timeline;
pub mod weather;

pub use prelude::{ModelKind, ModelSelection, Storm, TrackError, TrackPoint, TrackResult, TrackSource};
pub use session::{ControlCommand, Session, SessionSnapshot};
