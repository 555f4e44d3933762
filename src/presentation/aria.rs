//! Accessible names and ARIA attribute values derived from engine state.

use serde::Serialize;

use crate::application::TimelineViewModel;
use crate::config::AriaLabels;
use crate::domain::drill_down::ModalState;

pub const REGION_DESCRIPTION_ID: &str = "timeline-description";
pub const STATUS_ID: &str = "timeline-status";
pub const DIALOG_TITLE_ID: &str = "timeline-dialog-title";

/// `aria-live` politeness for the status region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Politeness {
    Polite,
    Assertive,
}

impl Politeness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Politeness::Polite => "polite",
            Politeness::Assertive => "assertive",
        }
    }
}

/// Live region contents for the current state; errors interrupt.
pub fn status_message(model: &TimelineViewModel, labels: &AriaLabels) -> (String, Politeness) {
    if model.error.is_some() {
        (labels.error.clone(), Politeness::Assertive)
    } else if model.loading {
        (labels.loading.clone(), Politeness::Polite)
    } else {
        (format!("{} {}", labels.loaded, model.period_label), Politeness::Polite)
    }
}

/// `role="slider"` attributes of the minimap thumb.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SliderAria {
    pub label: String,
    pub value_min: usize,
    pub value_max: usize,
    pub value_now: usize,
    pub value_text: String,
}

impl SliderAria {
    pub fn from_view_model(model: &TimelineViewModel, labels: &AriaLabels) -> Self {
        Self {
            label: labels.minimap.clone(),
            value_min: 0,
            value_max: model.total_buckets.saturating_sub(model.viewport.width),
            value_now: model.viewport.start_index,
            value_text: model.period_label.clone(),
        }
    }
}

/// Prev/next/reset buttons: label plus `aria-disabled`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonAria {
    pub label: String,
    pub disabled: bool,
}

pub fn nav_buttons(model: &TimelineViewModel, labels: &AriaLabels) -> [ButtonAria; 3] {
    [
        ButtonAria { label: labels.prev.clone(), disabled: !model.can_go_prev },
        ButtonAria { label: labels.next.clone(), disabled: !model.can_go_next },
        ButtonAria { label: labels.reset.clone(), disabled: model.at_present },
    ]
}

/// Dialog title for the drill-down modal.
pub fn dialog_title(modal: &ModalState, labels: &AriaLabels) -> Option<String> {
    let context = modal.context()?;
    let request = &context.request;
    Some(if request.period_start == request.period_end {
        format!("{}: {}", labels.dialog, request.period_start)
    } else {
        format!("{}: {} – {}", labels.dialog, request.period_start, request.period_end)
    })
}

/// Text shown inside the dialog body for non-loaded states.
pub fn dialog_notice(modal: &ModalState, labels: &AriaLabels) -> Option<String> {
    match modal {
        ModalState::Loading { .. } => Some(labels.loading.clone()),
        ModalState::Empty { .. } => Some(labels.empty.clone()),
        ModalState::Failed { .. } => Some(labels.error.clone()),
        ModalState::Closed | ModalState::Loaded { .. } => None,
    }
}
