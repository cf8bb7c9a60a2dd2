pub mod controller;

pub use controller::{index_for, TimelineController, TimelineState, SCRUB_MAX, STEP_DELTA, TICK_DELTA};
