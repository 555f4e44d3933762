//! Keyboard map of the timeline region.

use std::str::FromStr;
use strum::{EnumIter, EnumString};

use crate::application::ViewportAction;
use crate::domain::drill_down::CloseReason;
use crate::domain::timeline::{NavDirection, ZoomDirection};

/// Commands reachable from the keyboard, keyed by `KeyboardEvent.key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, EnumString)]
pub enum KeyCommand {
    #[strum(serialize = "ArrowLeft", serialize = "Left")]
    Prev,
    #[strum(serialize = "ArrowRight", serialize = "Right")]
    Next,
    #[strum(serialize = "PageUp")]
    PagePrev,
    #[strum(serialize = "PageDown")]
    PageNext,
    #[strum(serialize = "Home")]
    Earliest,
    #[strum(serialize = "End")]
    Latest,
    #[strum(serialize = "+", serialize = "=")]
    ZoomIn,
    #[strum(serialize = "-", serialize = "_")]
    ZoomOut,
    #[strum(serialize = "Escape", serialize = "Esc")]
    Close,
    /// Opens the drill-down for the focused point.
    #[strum(serialize = "Enter", serialize = " ")]
    Activate,
}

impl KeyCommand {
    pub fn from_key(key: &str) -> Option<Self> {
        KeyCommand::from_str(key).ok()
    }

    /// Only `Close` stays live while the modal holds focus.
    pub fn allowed_with_modal(&self) -> bool {
        matches!(self, KeyCommand::Close)
    }

    /// Engine action for the command. `Activate` needs a focused point and is
    /// resolved by the caller.
    pub fn to_action(self) -> Option<ViewportAction> {
        Some(match self {
            KeyCommand::Prev => ViewportAction::Navigate(NavDirection::Prev),
            KeyCommand::Next => ViewportAction::Navigate(NavDirection::Next),
            KeyCommand::PagePrev => ViewportAction::Page(NavDirection::Prev),
            KeyCommand::PageNext => ViewportAction::Page(NavDirection::Next),
            KeyCommand::Earliest => ViewportAction::JumpToEarliest,
            KeyCommand::Latest => ViewportAction::JumpToLatest,
            KeyCommand::ZoomIn => ViewportAction::Zoom(ZoomDirection::In),
            KeyCommand::ZoomOut => ViewportAction::Zoom(ZoomDirection::Out),
            KeyCommand::Close => ViewportAction::CloseModal(CloseReason::Escape),
            KeyCommand::Activate => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn arrows_and_paging() {
        assert_eq!(KeyCommand::from_key("ArrowLeft"), Some(KeyCommand::Prev));
        assert_eq!(KeyCommand::from_key("ArrowRight"), Some(KeyCommand::Next));
        assert_eq!(KeyCommand::from_key("PageUp"), Some(KeyCommand::PagePrev));
        assert_eq!(KeyCommand::from_key("PageDown"), Some(KeyCommand::PageNext));
        assert_eq!(KeyCommand::from_key("Home"), Some(KeyCommand::Earliest));
        assert_eq!(KeyCommand::from_key("End"), Some(KeyCommand::Latest));
    }

    #[test]
    fn zoom_keys_accept_unshifted_variants() {
        assert_eq!(KeyCommand::from_key("+"), Some(KeyCommand::ZoomIn));
        assert_eq!(KeyCommand::from_key("="), Some(KeyCommand::ZoomIn));
        assert_eq!(KeyCommand::from_key("-"), Some(KeyCommand::ZoomOut));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        assert_eq!(KeyCommand::from_key("a"), None);
        assert_eq!(KeyCommand::from_key("Tab"), None);
        assert_eq!(KeyCommand::from_key(""), None);
    }

    #[test]
    fn escape_closes_the_modal() {
        assert_eq!(
            KeyCommand::from_key("Escape").and_then(KeyCommand::to_action),
            Some(ViewportAction::CloseModal(CloseReason::Escape))
        );
    }

    #[test]
    fn only_close_is_live_under_the_modal() {
        let live: Vec<_> = KeyCommand::iter().filter(KeyCommand::allowed_with_modal).collect();
        assert_eq!(live, vec![KeyCommand::Close]);
    }

    #[test]
    fn activate_has_no_direct_action() {
        assert_eq!(KeyCommand::Activate.to_action(), None);
    }
}
