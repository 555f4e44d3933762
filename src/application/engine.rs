//! Timeline engine: the single owner of viewport, gesture, fetch and modal state.
//!
//! Every input arrives as a `ViewportAction` through `dispatch`; the returned
//! `Effects` tell the driver what I/O to perform. State and events only change
//! inside `dispatch`, `on_animation_frame` and the two `complete_*` calls.

use serde::Serialize;
use std::collections::HashMap;

use super::drill_down_coordinator::DrillDownCoordinator;
use super::fetch_orchestrator::{FetchOrchestrator, FetchOutcome, FetchRequest, FetchStatus, RenderedWindow};
use crate::config::EngineConfig;
use crate::domain::drill_down::{CloseReason, DrillTarget, FocusTarget, ModalState, PeriodSummary, SummaryRequest};
use crate::domain::errors::{ErrorKind, FetchError, TimelineError, TimelineResult};
use crate::domain::events::{EventBus, EventDispatcher, SubscriptionId, TimelineEvent};
use crate::domain::logging::LogComponent;
use crate::domain::timeline::viewport;
use crate::domain::timeline::zoom::{self, ZoomDirection};
use crate::domain::timeline::{
    BucketPayload, DatasetBounds, DragSource, GestureState, Granularity, MinimapMapper,
    NavDirection, RequestVersion, ThumbGeometry, TimeBucket, ViewportLimits, ViewportState,
};
use crate::{log_debug, log_info, log_warn};

/// User and host inputs.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewportAction {
    Navigate(NavDirection),
    Page(NavDirection),
    JumpTo(i64),
    JumpToEarliest,
    JumpToLatest,
    Reset,
    SwitchGranularity(Granularity),
    /// Zoom around the pointer; `pointer_ratio` is 0.0 (left edge) to 1.0 (right edge).
    WheelZoom { delta_y: f64, pointer_ratio: f64 },
    /// Keyboard zoom, anchored at the centre.
    Zoom(ZoomDirection),
    DragStart(DragSource),
    DragMove { delta_buckets: f64 },
    /// Thumb drag in track pixels; converted with the minimap scale.
    MinimapDrag { dx: f64, track_px: f64 },
    DragEnd,
    DragCancel,
    MinimapClick { x: f64, track_px: f64 },
    Activate { target: DrillTarget, trigger: FocusTarget },
    CloseModal(CloseReason),
    ViewAll,
    Retry,
    RetrySummary,
    /// Transactions were created, edited or deleted.
    TransactionsChanged,
    /// Fresh bounds after `TransactionsChanged`.
    BoundsRefreshed(Vec<DatasetBounds>),
}

impl ViewportAction {
    /// Pointer-rate input. Its state changes are drawn on the next animation
    /// frame rather than per event.
    pub fn is_continuous(&self) -> bool {
        matches!(
            self,
            ViewportAction::DragMove { .. }
                | ViewportAction::MinimapDrag { .. }
                | ViewportAction::WheelZoom { .. }
        )
    }
}

/// I/O the driver must perform after a dispatch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Effects {
    pub fetch: Option<FetchRequest>,
    pub summary: Option<SummaryRequest>,
    /// Call `on_animation_frame` on the next frame.
    pub request_frame: bool,
    /// Reload `DatasetBounds` for every granularity.
    pub refresh_bounds: bool,
}

impl Effects {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    fn merge(mut self, other: Effects) -> Self {
        self.fetch = other.fetch.or(self.fetch);
        self.summary = other.summary.or(self.summary);
        self.request_frame |= other.request_frame;
        self.refresh_bounds |= other.refresh_bounds;
        self
    }
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineViewModel {
    pub viewport: ViewportState,
    /// Fractional while a drag is in progress.
    pub preview_start: f64,
    pub can_go_prev: bool,
    pub can_go_next: bool,
    pub at_present: bool,
    pub total_buckets: usize,
    pub period_label: String,
    pub thumb: ThumbGeometry,
    pub loading: bool,
    pub error: Option<ErrorKind>,
    /// Last good data; may trail `viewport` while a fetch is in flight.
    pub rendered: Option<RenderedWindow>,
    pub modal: ModalState,
    pub gesture: GestureState,
}

pub struct TimelineEngine {
    config: EngineConfig,
    bounds: HashMap<Granularity, DatasetBounds>,
    /// Bounds of the granularity currently shown.
    active: DatasetBounds,
    state: ViewportState,
    gesture: GestureState,
    fetcher: FetchOrchestrator,
    drill: DrillDownCoordinator,
    minimap: MinimapMapper,
    events: EventBus,
    frame_pending: bool,
    /// Set between `TransactionsChanged` and `BoundsRefreshed`; fetches wait
    /// for the new calendar.
    awaiting_bounds: bool,
}

impl TimelineEngine {
    /// Build an engine at "present" for the configured default granularity.
    ///
    /// Bounds for other granularities are optional; switching to one without
    /// bounds is ignored.
    pub fn new(
        config: EngineConfig,
        bounds: impl IntoIterator<Item = DatasetBounds>,
    ) -> TimelineResult<Self> {
        config.validate()?;
        let bounds: HashMap<_, _> = bounds.into_iter().map(|b| (b.granularity, b)).collect();
        let granularity = config.default_granularity;
        let dataset = bounds
            .get(&granularity)
            .copied()
            .ok_or(TimelineError::MissingBounds(granularity))?;
        let limits = ViewportLimits::new(dataset, config.bounds_for(granularity));
        let state = viewport::present(&limits);
        let minimap = config.minimap_mapper();

        log_info!(
            LogComponent::Application("TimelineEngine"),
            "Engine ready at {} {}+{} of {} buckets",
            granularity,
            state.start_index,
            state.width,
            dataset.total_buckets
        );

        Ok(Self {
            config,
            bounds,
            active: dataset,
            state,
            gesture: GestureState::Idle,
            fetcher: FetchOrchestrator::new(),
            drill: DrillDownCoordinator::new(),
            minimap,
            events: EventBus::new(),
            frame_pending: false,
            awaiting_bounds: false,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> ViewportState {
        self.state
    }

    pub fn gesture(&self) -> GestureState {
        self.gesture
    }

    pub fn modal(&self) -> &ModalState {
        self.drill.modal()
    }

    pub fn status(&self) -> FetchStatus {
        self.fetcher.status()
    }

    pub fn rendered(&self) -> Option<&RenderedWindow> {
        self.fetcher.rendered()
    }

    pub fn fetcher(&self) -> &FetchOrchestrator {
        &self.fetcher
    }

    pub fn is_awaiting_bounds(&self) -> bool {
        self.awaiting_bounds
    }

    pub fn bounds(&self, granularity: Granularity) -> Option<&DatasetBounds> {
        self.bounds.get(&granularity)
    }

    /// Limits for the active granularity.
    pub fn limits(&self) -> ViewportLimits {
        ViewportLimits::new(self.active, self.config.bounds_for(self.active.granularity))
    }

    pub fn limits_for(&self, granularity: Granularity) -> Option<ViewportLimits> {
        let dataset = *self.bounds.get(&granularity)?;
        Some(ViewportLimits::new(dataset, self.config.bounds_for(granularity)))
    }

    pub fn can_go_prev(&self) -> bool {
        viewport::can_go_prev(&self.state, &self.limits())
    }

    pub fn can_go_next(&self) -> bool {
        viewport::can_go_next(&self.state, &self.limits())
    }

    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: Fn(&TimelineEvent) + 'static,
    {
        self.events.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// First load after mounting: announce the viewport and queue its fetch.
    pub fn start(&mut self) -> Effects {
        self.publish_viewport();
        self.queue_fetch()
    }

    pub fn dispatch(&mut self, action: ViewportAction) -> Effects {
        log_debug!(LogComponent::Application("TimelineEngine"), "Dispatch {:?}", action);
        let limits = self.limits();
        let state = self.state;

        match action {
            ViewportAction::Navigate(direction) => {
                self.commit(viewport::navigate(state, &limits, direction))
            }
            ViewportAction::Page(direction) => self.commit(viewport::page(state, &limits, direction)),
            ViewportAction::JumpTo(index) => self.commit(viewport::jump_to(state, &limits, index)),
            ViewportAction::JumpToEarliest => self.commit(viewport::jump_to_earliest(state, &limits)),
            ViewportAction::JumpToLatest => self.commit(viewport::jump_to_latest(state, &limits)),
            ViewportAction::Reset => self.commit(viewport::reset(state, &limits)),
            ViewportAction::SwitchGranularity(granularity) => self.switch_granularity(granularity),
            ViewportAction::WheelZoom { delta_y, pointer_ratio } => match ZoomDirection::from_wheel(delta_y) {
                Some(direction) => self.commit(zoom::wheel_zoom(state, &limits, direction, pointer_ratio)),
                None => Effects::none(),
            },
            ViewportAction::Zoom(direction) => {
                self.commit(zoom::wheel_zoom(state, &limits, direction, 0.5))
            }
            ViewportAction::DragStart(source) => {
                self.gesture = GestureState::begin(source);
                self.frame()
            }
            ViewportAction::DragMove { delta_buckets } => self.drag_by(delta_buckets),
            ViewportAction::MinimapDrag { dx, track_px } => {
                let delta_buckets = self.minimap.drag_to_buckets(dx, &limits, track_px);
                self.drag_by(delta_buckets)
            }
            ViewportAction::DragEnd => {
                let (gesture, committed) = self.gesture.end(state, &limits);
                self.gesture = gesture;
                match committed {
                    Some(next) => {
                        let effects = self.commit(next);
                        effects.merge(self.frame())
                    }
                    None => Effects::none(),
                }
            }
            ViewportAction::DragCancel => {
                if !self.gesture.is_dragging() {
                    return Effects::none();
                }
                self.gesture = self.gesture.cancel();
                self.frame()
            }
            ViewportAction::MinimapClick { x, track_px } => {
                // The click that ends a thumb drag lands here too.
                if self.gesture != GestureState::Idle
                    || self.minimap.thumb(&state, &limits, track_px).contains(x)
                {
                    return Effects::none();
                }
                let target = self.minimap.click_to_index(x, &state, &limits, track_px);
                self.commit(viewport::jump_to(state, &limits, target))
            }
            ViewportAction::Activate { target, trigger } => self.activate(target, trigger),
            ViewportAction::CloseModal(reason) => {
                let was_open = self.drill.modal().is_open();
                let trigger = self.drill.close(reason);
                if was_open {
                    self.publish_modal();
                }
                if let Some(target) = trigger {
                    self.events.publish(TimelineEvent::FocusReturned { target });
                }
                Effects::none()
            }
            ViewportAction::ViewAll => {
                if let Some(intent) = self.drill.view_all() {
                    log_info!(
                        LogComponent::Application("TimelineEngine"),
                        "View all {} .. {}",
                        intent.start_date,
                        intent.end_date
                    );
                    self.publish_modal();
                    self.events.publish(TimelineEvent::NavigateToTransactions { intent });
                }
                Effects::none()
            }
            ViewportAction::Retry => {
                if self.awaiting_bounds {
                    return Effects::none();
                }
                let before = self.fetcher.status();
                let fetch = self.fetcher.retry();
                self.publish_status(before);
                Effects { fetch, ..Effects::none() }
            }
            ViewportAction::RetrySummary => {
                let summary = self.drill.retry();
                if summary.is_some() {
                    self.publish_modal();
                }
                Effects { summary, ..Effects::none() }
            }
            ViewportAction::TransactionsChanged => {
                log_info!(
                    LogComponent::Application("TimelineEngine"),
                    "Transactions changed, dropping cached buckets"
                );
                let before = self.fetcher.status();
                self.fetcher.invalidate_all();
                self.publish_status(before);
                self.awaiting_bounds = true;
                Effects { refresh_bounds: true, ..Effects::none() }
            }
            ViewportAction::BoundsRefreshed(fresh) => self.apply_bounds(fresh),
        }
    }

    /// Once per animation frame: settle gestures and issue the coalesced fetch.
    pub fn on_animation_frame(&mut self) -> Effects {
        self.frame_pending = false;
        self.gesture = self.gesture.tick();
        if self.awaiting_bounds {
            // Indices may map to other periods once the bounds land.
            return Effects::none();
        }

        let before = self.fetcher.status();
        let had_pending = self.fetcher.has_pending();
        let fetch = self.fetcher.flush();
        self.publish_status(before);
        if had_pending && fetch.is_none() && self.fetcher.rendered().is_some() {
            // Served from cache.
            self.announce_loaded();
        }

        Effects { fetch, ..Effects::none() }
    }

    pub fn complete_fetch(
        &mut self,
        version: RequestVersion,
        result: Result<Vec<BucketPayload>, FetchError>,
    ) -> FetchOutcome {
        let before = self.fetcher.status();
        let outcome = self.fetcher.complete(version, result);
        self.publish_status(before);
        if outcome == FetchOutcome::Applied {
            self.announce_loaded();
        }
        outcome
    }

    pub fn complete_summary(
        &mut self,
        version: RequestVersion,
        result: Result<PeriodSummary, FetchError>,
    ) -> FetchOutcome {
        let outcome = self.drill.complete(version, result);
        if outcome != FetchOutcome::Stale {
            self.publish_modal();
        }
        outcome
    }

    pub fn view_model(&self, track_px: f64) -> TimelineViewModel {
        let limits = self.limits();
        let status = self.fetcher.status();
        TimelineViewModel {
            viewport: self.state,
            preview_start: self.gesture.preview_start(&self.state, &limits),
            can_go_prev: viewport::can_go_prev(&self.state, &limits),
            can_go_next: viewport::can_go_next(&self.state, &limits),
            at_present: viewport::is_at_present(&self.state, &limits),
            total_buckets: limits.dataset.total_buckets,
            period_label: self.period_label(),
            thumb: self.minimap.thumb(&self.state, &limits, track_px),
            loading: status.loading,
            error: status.error,
            rendered: self.fetcher.rendered().cloned(),
            modal: self.drill.modal().clone(),
            gesture: self.gesture,
        }
    }

    /// Buckets of the rendered window, for hit-testing activations.
    pub fn visible_buckets(&self) -> &[TimeBucket] {
        self.fetcher.rendered().map(|window| window.buckets.as_slice()).unwrap_or(&[])
    }

    /// "Nov 2024 – Apr 2025" for the committed viewport.
    pub fn period_label(&self) -> String {
        let calendar = self.limits().dataset.calendar();
        let granularity = self.state.granularity;
        match (
            calendar.period_start(self.state.start_index),
            calendar.period_start(self.state.end_index()),
        ) {
            (Some(first), Some(last)) if first == last => granularity.label(first),
            (Some(first), Some(last)) => {
                format!("{} – {}", granularity.label(first), granularity.label(last))
            }
            _ => String::new(),
        }
    }

    fn switch_granularity(&mut self, granularity: Granularity) -> Effects {
        let Some(limits) = self.limits_for(granularity) else {
            log_warn!(
                LogComponent::Application("TimelineEngine"),
                "No bounds loaded for {}, ignoring switch",
                granularity
            );
            return Effects::none();
        };
        let before = self.fetcher.status();
        self.fetcher.cancel_in_flight();
        self.publish_status(before);
        self.gesture = GestureState::Idle;
        self.active = limits.dataset;
        let next = zoom::switch_granularity(&limits);
        if next == self.state {
            return self.queue_fetch();
        }
        self.commit(next)
    }

    fn drag_by(&mut self, delta_buckets: f64) -> Effects {
        if !self.gesture.is_dragging() {
            return Effects::none();
        }
        self.gesture = self.gesture.moved(delta_buckets);
        self.frame()
    }

    fn activate(&mut self, target: DrillTarget, trigger: FocusTarget) -> Effects {
        let dataset = self.active;
        let Some(summary) = self.drill.activate(target, trigger, &dataset) else {
            return Effects::none();
        };
        self.events.publish(TimelineEvent::Activated { target });
        self.publish_modal();
        Effects { summary: Some(summary), ..Effects::none() }
    }

    fn apply_bounds(&mut self, fresh: Vec<DatasetBounds>) -> Effects {
        self.awaiting_bounds = false;
        let previous = self.limits();
        for dataset in fresh {
            if dataset.granularity == self.active.granularity {
                self.active = dataset;
            }
            if self.bounds.insert(dataset.granularity, dataset) != Some(dataset) {
                self.fetcher.invalidate(dataset.granularity);
            }
        }
        if self.active != previous.dataset {
            let before = self.fetcher.status();
            self.fetcher.cancel_in_flight();
            self.publish_status(before);
        }
        let next_limits = self.limits();
        log_info!(
            LogComponent::Application("TimelineEngine"),
            "Bounds refreshed, {} now has {} buckets",
            self.state.granularity,
            next_limits.dataset.total_buckets
        );
        let next = viewport::rebound(self.state, &previous, &next_limits);
        if next == self.state {
            // Cache was dropped; reload the unchanged window.
            return self.queue_fetch();
        }
        self.commit(next)
    }

    /// Replace the state, notify, and queue a fetch. Unchanged states are no-ops.
    fn commit(&mut self, next: ViewportState) -> Effects {
        if next == self.state {
            return Effects::none();
        }
        self.state = next;
        self.publish_viewport();
        self.queue_fetch()
    }

    fn queue_fetch(&mut self) -> Effects {
        let calendar = self.limits().dataset.calendar();
        self.fetcher.request(self.state, calendar);
        self.frame()
    }

    fn frame(&mut self) -> Effects {
        let request_frame = !self.frame_pending;
        self.frame_pending = true;
        Effects { request_frame, ..Effects::none() }
    }

    fn publish_viewport(&self) {
        let limits = self.limits();
        self.events.publish(TimelineEvent::ViewportChanged {
            viewport: self.state,
            can_go_prev: viewport::can_go_prev(&self.state, &limits),
            can_go_next: viewport::can_go_next(&self.state, &limits),
        });
    }

    fn publish_modal(&self) {
        self.events.publish(TimelineEvent::ModalChanged { modal: self.drill.modal().clone() });
    }

    fn publish_status(&self, before: FetchStatus) {
        let after = self.fetcher.status();
        if after.loading != before.loading {
            self.events.publish(TimelineEvent::LoadingChanged { loading: after.loading });
            if after.loading {
                self.announce(self.config.labels.loading.clone());
            }
        }
        if let Some(kind) = after.error.filter(|_| after.error != before.error) {
            self.events.publish(TimelineEvent::ErrorRaised { kind });
            self.announce(self.config.labels.error.clone());
        }
    }

    fn announce_loaded(&self) {
        let message = format!("{} {}", self.config.labels.loaded, self.period_label());
        self.announce(message);
    }

    fn announce(&self, message: String) {
        self.events.publish(TimelineEvent::Announcement { message });
    }
}

impl std::fmt::Debug for TimelineEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimelineEngine")
            .field("state", &self.state)
            .field("gesture", &self.gesture)
            .field("status", &self.fetcher.status())
            .field("modal", self.drill.modal())
            .field("events", &self.events)
            .finish()
    }
}
