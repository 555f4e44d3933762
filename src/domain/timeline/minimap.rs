//! Minimap Mapper: bucket-index space <-> track-pixel space.
//!
//! Stateless; every value is derived from the current `ViewportState`.

use serde::{Deserialize, Serialize};

use super::value_objects::ViewportState;
use super::viewport::ViewportLimits;

pub const MIN_THUMB_RATIO: f64 = 0.05;
pub const MAX_THUMB_RATIO: f64 = 0.8;

/// Thumb geometry in track pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThumbGeometry {
    pub ratio: f64,
    pub width_px: f64,
    pub x_px: f64,
    pub track_px: f64,
}

impl ThumbGeometry {
    pub fn contains(&self, x: f64) -> bool {
        x >= self.x_px && x <= self.x_px + self.width_px
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinimapMapper {
    pub min_thumb_ratio: f64,
    pub max_thumb_ratio: f64,
}

impl Default for MinimapMapper {
    fn default() -> Self {
        Self { min_thumb_ratio: MIN_THUMB_RATIO, max_thumb_ratio: MAX_THUMB_RATIO }
    }
}

impl MinimapMapper {
    pub fn new(min_thumb_ratio: f64, max_thumb_ratio: f64) -> Self {
        Self { min_thumb_ratio, max_thumb_ratio }
    }

    /// Fraction of the track covered by the thumb.
    pub fn thumb_ratio(&self, width: usize, total_buckets: usize) -> f64 {
        let raw = width as f64 / total_buckets.max(1) as f64;
        raw.clamp(self.min_thumb_ratio, self.max_thumb_ratio)
    }

    pub fn thumb(&self, state: &ViewportState, limits: &ViewportLimits, track_px: f64) -> ThumbGeometry {
        let track_px = track_px.max(0.0);
        let total = limits.dataset.total_buckets;
        let ratio = self.thumb_ratio(state.width, total);
        let width_px = ratio * track_px;
        let offset = state.start_index.saturating_sub(limits.dataset.earliest_index) as f64;
        let travel = total.saturating_sub(state.width).max(1) as f64;
        let x_px = (offset / travel).clamp(0.0, 1.0) * (track_px - width_px);
        ThumbGeometry { ratio, width_px, x_px, track_px }
    }

    /// Bucket delta for a thumb drag of `dx` pixels.
    pub fn drag_to_buckets(&self, dx: f64, limits: &ViewportLimits, track_px: f64) -> f64 {
        if track_px <= 0.0 || !dx.is_finite() {
            return 0.0;
        }
        dx * (limits.dataset.total_buckets as f64 / track_px)
    }

    /// Target start index for a click at `x` on the track, centring the thumb on it.
    pub fn click_to_index(
        &self,
        x: f64,
        state: &ViewportState,
        limits: &ViewportLimits,
        track_px: f64,
    ) -> i64 {
        let thumb = self.thumb(state, limits, track_px);
        let free = track_px - thumb.width_px;
        if free <= 0.0 || !x.is_finite() {
            return state.start_index as i64;
        }
        let position = ((x - thumb.width_px / 2.0) / free).clamp(0.0, 1.0);
        let travel = limits.dataset.total_buckets.saturating_sub(state.width).max(1) as f64;
        limits.dataset.earliest_index as i64 + (position * travel).round() as i64
    }
}

/// Bucket delta for dragging the main plot by `dx` pixels.
///
/// Dragging the content right reveals older buckets.
pub fn plot_drag_to_buckets(dx: f64, plot_px: f64, width: usize) -> f64 {
    if plot_px <= 0.0 || !dx.is_finite() {
        return 0.0;
    }
    -dx * width as f64 / plot_px
}
