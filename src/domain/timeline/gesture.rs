//! Drag/pan input as an explicit state machine.
//!
//! While dragging only the preview moves; the persisted `ViewportState` changes
//! once, on release, through `viewport::pan_by`. The drag offset is always
//! applied to the committed state, so keys or clicks during a drag are kept.

use serde::{Deserialize, Serialize};

use super::value_objects::ViewportState;
use super::viewport::{self, ViewportLimits};

/// Where the drag started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DragSource {
    Plot,
    Minimap,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "camelCase")]
pub enum GestureState {
    #[default]
    Idle,
    Dragging { source: DragSource, accumulated: f64 },
    /// Released; the preview eases from `from` to the committed start.
    Settling { from: f64, to: usize },
}

impl GestureState {
    pub fn is_dragging(&self) -> bool {
        matches!(self, GestureState::Dragging { .. })
    }

    /// A new drag replaces whatever was in progress.
    pub fn begin(source: DragSource) -> Self {
        GestureState::Dragging { source, accumulated: 0.0 }
    }

    /// Accumulate fractional bucket movement. Ignored unless dragging.
    pub fn moved(self, delta_buckets: f64) -> Self {
        match self {
            GestureState::Dragging { source, accumulated } if delta_buckets.is_finite() => {
                GestureState::Dragging { source, accumulated: accumulated + delta_buckets }
            }
            other => other,
        }
    }

    /// Release: returns the settling gesture and the committed, integer-aligned state.
    pub fn end(
        self,
        current: ViewportState,
        limits: &ViewportLimits,
    ) -> (Self, Option<ViewportState>) {
        match self {
            GestureState::Dragging { accumulated, .. } => {
                let from = viewport::pan_preview(current, limits, accumulated);
                let committed = viewport::pan_by(current, limits, accumulated);
                (GestureState::Settling { from, to: committed.start_index }, Some(committed))
            }
            other => (other, None),
        }
    }

    /// Abort a drag without committing.
    pub fn cancel(self) -> Self {
        match self {
            GestureState::Dragging { .. } => GestureState::Idle,
            other => other,
        }
    }

    /// One animation frame elapsed.
    pub fn tick(self) -> Self {
        match self {
            GestureState::Settling { .. } => GestureState::Idle,
            other => other,
        }
    }

    /// Start index to draw right now; fractional while a drag is in progress.
    pub fn preview_start(&self, committed: &ViewportState, limits: &ViewportLimits) -> f64 {
        match self {
            GestureState::Dragging { accumulated, .. } => {
                viewport::pan_preview(*committed, limits, *accumulated)
            }
            GestureState::Settling { from, to } => (from + *to as f64) / 2.0,
            GestureState::Idle => committed.start_index as f64,
        }
    }
}
