//! Viewport Controller: pure `(ViewportState, limits) -> ViewportState` transitions.
//!
//! Moving past a boundary is never an error; the state comes back unchanged.

use super::value_objects::{DatasetBounds, GranularityBounds, NavDirection, ViewportState};

/// Everything a transition needs to keep the viewport valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportLimits {
    pub dataset: DatasetBounds,
    pub widths: GranularityBounds,
}

impl ViewportLimits {
    pub fn new(dataset: DatasetBounds, widths: GranularityBounds) -> Self {
        Self { dataset, widths }
    }

    /// Smallest width allowed, never above the history length.
    pub fn min_width(&self) -> usize {
        self.widths.min_width.min(self.dataset.total_buckets).max(1)
    }

    /// Largest width allowed, never above the history length.
    pub fn max_width(&self) -> usize {
        self.widths.max_width.min(self.dataset.total_buckets).max(1)
    }

    pub fn default_width(&self) -> usize {
        self.widths.default_width.clamp(self.min_width(), self.max_width())
    }

    /// Largest start index that keeps `width` buckets inside the history.
    pub fn max_start(&self, width: usize) -> usize {
        (self.dataset.latest_index + 1)
            .saturating_sub(width)
            .max(self.dataset.earliest_index)
    }

    pub fn clamp_width(&self, width: usize) -> usize {
        width.clamp(self.min_width(), self.max_width())
    }

    pub fn clamp_start(&self, start: i64, width: usize) -> usize {
        let earliest = self.dataset.earliest_index as i64;
        let latest = self.max_start(width) as i64;
        start.clamp(earliest, latest) as usize
    }

    /// Bring any candidate state back inside the invariants.
    pub fn clamp(&self, state: ViewportState) -> ViewportState {
        let width = self.clamp_width(state.width);
        let start = self.clamp_start(state.start_index as i64, width);
        ViewportState { granularity: self.dataset.granularity, start_index: start, width }
    }

    pub fn is_valid(&self, state: &ViewportState) -> bool {
        state.granularity == self.dataset.granularity
            && state.start_index >= self.dataset.earliest_index
            && state.end_index() <= self.dataset.latest_index
            && state.width >= self.min_width()
            && state.width <= self.max_width()
            && state.width <= self.dataset.total_buckets
    }
}

/// Initial/reset state: the default width ending at the latest bucket.
pub fn present(limits: &ViewportLimits) -> ViewportState {
    let width = limits.default_width();
    ViewportState {
        granularity: limits.dataset.granularity,
        start_index: limits.max_start(width),
        width,
    }
}

/// Shift by one step; a no-op at the boundary.
pub fn navigate(state: ViewportState, limits: &ViewportLimits, direction: NavDirection) -> ViewportState {
    shift(state, limits, direction.signum() * limits.widths.step as i64)
}

/// Shift by a whole viewport width (PageUp / PageDown).
pub fn page(state: ViewportState, limits: &ViewportLimits, direction: NavDirection) -> ViewportState {
    shift(state, limits, direction.signum() * state.width as i64)
}

fn shift(state: ViewportState, limits: &ViewportLimits, delta: i64) -> ViewportState {
    let state = limits.clamp(state);
    let start = limits.clamp_start(state.start_index as i64 + delta, state.width);
    ViewportState { start_index: start, ..state }
}

pub fn jump_to(state: ViewportState, limits: &ViewportLimits, target_index: i64) -> ViewportState {
    let state = limits.clamp(state);
    ViewportState { start_index: limits.clamp_start(target_index, state.width), ..state }
}

/// Home key.
pub fn jump_to_earliest(state: ViewportState, limits: &ViewportLimits) -> ViewportState {
    jump_to(state, limits, limits.dataset.earliest_index as i64)
}

/// End key.
pub fn jump_to_latest(state: ViewportState, limits: &ViewportLimits) -> ViewportState {
    jump_to(state, limits, limits.max_start(state.width) as i64)
}

/// Commit a continuous pan, rounded to the nearest whole bucket.
pub fn pan_by(state: ViewportState, limits: &ViewportLimits, delta_buckets: f64) -> ViewportState {
    if !delta_buckets.is_finite() {
        return limits.clamp(state);
    }
    let target = state.start_index as f64 + delta_buckets;
    jump_to(state, limits, target.round() as i64)
}

/// Fractional start shown while a drag is in progress.
pub fn pan_preview(state: ViewportState, limits: &ViewportLimits, delta_buckets: f64) -> f64 {
    let state = limits.clamp(state);
    let delta = if delta_buckets.is_finite() { delta_buckets } else { 0.0 };
    (state.start_index as f64 + delta).clamp(
        limits.dataset.earliest_index as f64,
        limits.max_start(state.width) as f64,
    )
}

/// Back to "present" at the current width. Idempotent.
pub fn reset(state: ViewportState, limits: &ViewportLimits) -> ViewportState {
    let width = limits.clamp_width(state.width);
    ViewportState {
        granularity: limits.dataset.granularity,
        start_index: limits.max_start(width),
        width,
    }
}

pub fn can_go_prev(state: &ViewportState, limits: &ViewportLimits) -> bool {
    state.start_index > limits.dataset.earliest_index
}

pub fn can_go_next(state: &ViewportState, limits: &ViewportLimits) -> bool {
    state.end_index() < limits.dataset.latest_index
}

pub fn is_at_present(state: &ViewportState, limits: &ViewportLimits) -> bool {
    !can_go_next(state, limits)
}

/// Re-fit a viewport after the dataset bounds changed.
///
/// A viewport showing the present keeps following it.
pub fn rebound(
    state: ViewportState,
    previous: &ViewportLimits,
    next: &ViewportLimits,
) -> ViewportState {
    if is_at_present(&state, previous) {
        reset(state, next)
    } else {
        next.clamp(state)
    }
}
