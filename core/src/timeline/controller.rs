use crate::prelude::ModelSelection;
use serde::{Deserialize, Serialize};

pub const SCRUB_MAX: u8 = 100;
/// Manual step applied by `step_back` / `step_forward`.
pub const STEP_DELTA: u8 = 5;
/// Default autoplay advance per tick.
pub const TICK_DELTA: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineState {
    pub scrub_percent: u8,
    pub is_playing: bool,
    pub selected_model: ModelSelection,
}

impl Default for TimelineState {
    fn default() -> Self {
        Self {
            scrub_percent: SCRUB_MAX,
            is_playing: false,
            selected_model: ModelSelection::default(),
        }
    }
}

/// Track index visible at `scrub_percent`: `floor(scrub / 100 * (len - 1))`.
pub fn index_for(scrub_percent: u8, track_len: usize) -> usize {
    if track_len == 0 {
        return 0;
    }
    let scrub = usize::from(scrub_percent.min(SCRUB_MAX));
    (scrub * (track_len - 1) / usize::from(SCRUB_MAX)).min(track_len - 1)
}

/// Owns the timeline state. Never renders; callers re-render after mutating.
#[derive(Debug, Clone)]
pub struct TimelineController {
    state: TimelineState,
    tick_delta: u8,
}

impl TimelineController {
    pub fn new() -> Self {
        Self::with_tick_delta(TICK_DELTA)
    }

    pub fn with_tick_delta(tick_delta: u8) -> Self {
        Self {
            state: TimelineState::default(),
            tick_delta: tick_delta.clamp(1, SCRUB_MAX),
        }
    }

    pub fn state(&self) -> TimelineState {
        self.state
    }

    pub fn scrub_percent(&self) -> u8 {
        self.state.scrub_percent
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing
    }

    pub fn selected_model(&self) -> ModelSelection {
        self.state.selected_model
    }

    pub fn index_for(&self, track_len: usize) -> usize {
        index_for(self.state.scrub_percent, track_len)
    }

    pub fn set_scrub(&mut self, percent: u8) {
        self.state.scrub_percent = percent.min(SCRUB_MAX);
    }

    pub fn set_model(&mut self, selection: ModelSelection) {
        self.state.selected_model = selection;
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.state.is_playing = playing;
    }

    pub fn toggle_play(&mut self) -> bool {
        self.state.is_playing = !self.state.is_playing;
        self.state.is_playing
    }

    pub fn step_back(&mut self) {
        self.state.scrub_percent = self.state.scrub_percent.saturating_sub(STEP_DELTA);
    }

    pub fn step_forward(&mut self) {
        self.state.scrub_percent = (self.state.scrub_percent + STEP_DELTA).min(SCRUB_MAX);
    }

    /// Autoplay advance. Does nothing while paused and returns whether the
    /// position moved. A position that has reached 100 wraps to 0 on the
    /// next tick; an advance past 100 stops at 100.
    pub fn tick(&mut self) -> bool {
        if !self.state.is_playing {
            return false;
        }
        self.state.scrub_percent = if self.state.scrub_percent >= SCRUB_MAX {
            0
        } else {
            (self.state.scrub_percent + self.tick_delta).min(SCRUB_MAX)
        };
        true
    }
}

impl Default for TimelineController {
    fn default() -> Self {
        Self::new()
    }
}
