//! Drill-down modal lifecycle.
//!
//! `Closed -> Loading -> (Loaded | Empty | Failed) -> Closed`, with retry going
//! back to `Loading`. The trigger element travels with every open state so focus
//! can be returned on close.

use serde::{Deserialize, Serialize};

use super::entities::{DrillTarget, FocusTarget, PeriodSummary, SummaryRequest};
use crate::domain::errors::ErrorKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloseReason {
    Explicit,
    Escape,
    Backdrop,
}

/// What the modal was opened for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModalContext {
    pub target: DrillTarget,
    pub request: SummaryRequest,
    pub trigger: FocusTarget,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ModalState {
    #[default]
    Closed,
    Loading { context: ModalContext },
    Loaded { context: ModalContext, summary: PeriodSummary },
    /// The period has no transactions.
    Empty { context: ModalContext, summary: PeriodSummary },
    Failed { context: ModalContext, error: ErrorKind },
}

impl ModalState {
    pub fn is_open(&self) -> bool {
        !matches!(self, ModalState::Closed)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ModalState::Loading { .. })
    }

    pub fn context(&self) -> Option<&ModalContext> {
        match self {
            ModalState::Closed => None,
            ModalState::Loading { context }
            | ModalState::Loaded { context, .. }
            | ModalState::Empty { context, .. }
            | ModalState::Failed { context, .. } => Some(context),
        }
    }

    pub fn summary(&self) -> Option<&PeriodSummary> {
        match self {
            ModalState::Loaded { summary, .. } | ModalState::Empty { summary, .. } => Some(summary),
            _ => None,
        }
    }

    pub fn opened(context: ModalContext) -> Self {
        ModalState::Loading { context }
    }

    /// Resolve a loading modal with a summary.
    pub fn resolved(self, summary: PeriodSummary) -> Self {
        match self {
            ModalState::Loading { context } if summary.is_empty() => {
                ModalState::Empty { context, summary }
            }
            ModalState::Loading { context } => ModalState::Loaded { context, summary },
            other => other,
        }
    }

    pub fn failed(self, error: ErrorKind) -> Self {
        match self {
            ModalState::Loading { context } => ModalState::Failed { context, error },
            other => other,
        }
    }

    /// Close from any state; yields the element that should receive focus.
    pub fn close(self) -> (Self, Option<FocusTarget>) {
        let trigger = match self {
            ModalState::Closed => None,
            ModalState::Loading { context }
            | ModalState::Loaded { context, .. }
            | ModalState::Empty { context, .. }
            | ModalState::Failed { context, .. } => Some(context.trigger),
        };
        (ModalState::Closed, trigger)
    }
}

/// Next focus index inside the dialog; Tab past either end wraps around.
pub fn trap_focus(current: Option<usize>, focusable_count: usize, backwards: bool) -> Option<usize> {
    if focusable_count == 0 {
        return None;
    }
    let last = focusable_count - 1;
    Some(match (current, backwards) {
        (None, false) => 0,
        (None, true) => last,
        (Some(index), false) if index >= last => 0,
        (Some(index), false) => index + 1,
        (Some(0), true) => last,
        (Some(index), true) => index.min(focusable_count) - 1,
    })
}
