//! Granularity switches and wheel zoom.
//!
//! Both end in the same clamping rules as the Viewport Controller.

use super::value_objects::ViewportState;
use super::viewport::{self, ViewportLimits};

/// Discrete tier switch: always lands on "present" at the new tier's default width.
pub fn switch_granularity(next_limits: &ViewportLimits) -> ViewportState {
    viewport::present(next_limits)
}

/// Zoom direction derived from a wheel delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    /// Fewer buckets, more detail.
    In,
    /// More buckets, less detail.
    Out,
}

impl ZoomDirection {
    /// Scroll up (negative `deltaY`) zooms in.
    pub fn from_wheel(delta_y: f64) -> Option<Self> {
        if !delta_y.is_finite() || delta_y == 0.0 {
            None
        } else if delta_y < 0.0 {
            Some(ZoomDirection::In)
        } else {
            Some(ZoomDirection::Out)
        }
    }
}

/// Change the width by one zoom step, keeping the bucket under the pointer at the
/// same relative position as far as clamping allows.
///
/// `pointer_ratio` is the pointer position across the plot, 0.0 (left) to 1.0 (right).
pub fn wheel_zoom(
    state: ViewportState,
    limits: &ViewportLimits,
    direction: ZoomDirection,
    pointer_ratio: f64,
) -> ViewportState {
    let state = limits.clamp(state);
    let step = limits.widths.zoom_step;
    let requested = match direction {
        ZoomDirection::In => state.width.saturating_sub(step),
        ZoomDirection::Out => state.width.saturating_add(step),
    };
    let width = limits.clamp_width(requested);
    if width == state.width {
        return state;
    }

    let ratio = if pointer_ratio.is_finite() { pointer_ratio.clamp(0.0, 1.0) } else { 0.5 };
    let anchor = state.start_index as f64 + ratio * state.width as f64;
    let start = (anchor - ratio * width as f64).round() as i64;
    ViewportState { start_index: limits.clamp_start(start, width), width, ..state }
}
