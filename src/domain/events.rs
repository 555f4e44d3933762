use serde::Serialize;

use crate::domain::drill_down::{DrillTarget, FocusTarget, ModalState, NavigationIntent};
use crate::domain::errors::ErrorKind;
use crate::domain::timeline::ViewportState;

/// Everything the engine tells the renderer and the host
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TimelineEvent {
    /// Redraw signal.
    ViewportChanged { viewport: ViewportState, can_go_prev: bool, can_go_next: bool },
    LoadingChanged { loading: bool },
    /// A refresh failed; the host offers a retry.
    ErrorRaised { kind: ErrorKind },
    /// Text for the `aria-live` status region.
    Announcement { message: String },
    Activated { target: DrillTarget },
    ModalChanged { modal: ModalState },
    /// Focus goes back to the element that opened the modal.
    FocusReturned { target: FocusTarget },
    NavigateToTransactions { intent: NavigationIntent },
}

/// Event dispatcher for publishing events
pub trait EventDispatcher {
    fn publish(&self, event: TimelineEvent);
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Simple in-memory event dispatcher
///
/// Handlers run synchronously on the publishing thread and must not call back
/// into the engine that owns the bus.
#[derive(Default)]
pub struct EventBus {
    handlers: Vec<(SubscriptionId, Box<dyn Fn(&TimelineEvent)>)>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: Fn(&TimelineEvent) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, Box::new(handler)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(handler_id, _)| *handler_id != id);
        self.handlers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.len()
    }
}

impl EventDispatcher for EventBus {
    fn publish(&self, event: TimelineEvent) {
        for (_, handler) in &self.handlers {
            handler(&event);
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus").field("subscribers", &self.handlers.len()).finish()
    }
}
