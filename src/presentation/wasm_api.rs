//! JavaScript handle for hosts that render the timeline themselves.

use gloo::utils::format::JsValueSerdeExt;
use gloo_timers::callback::Timeout;
use js_sys::{Function, Promise};
use leptos::*;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use super::component::TimelineViewport;
use super::keyboard::KeyCommand;
use super::runtime::TimelineRuntime;
use crate::application::{TimelineDriver, TimelineViewModel, ViewportAction};
use crate::config::EngineConfig;
use crate::domain::drill_down::{CloseReason, DrillTarget, FocusTarget, NavigationIntent};
use crate::domain::errors::TimelineError;
use crate::domain::events::{SubscriptionId, TimelineEvent};
use crate::domain::logging::{get_logger, LogComponent};
use crate::domain::timeline::{CategoryId, DragSource, Granularity, NavDirection};
use crate::infrastructure::RestTimelineSource;

fn to_js_error(error: TimelineError) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn direction(name: &str) -> Result<NavDirection, JsValue> {
    match name {
        "prev" => Ok(NavDirection::Prev),
        "next" => Ok(NavDirection::Next),
        other => Err(JsValue::from_str(&format!("Unknown direction: {}", other))),
    }
}

/// Load bounds, build the engine and start the first fetch.
///
/// `on_render` receives the serialized view model after every change;
/// `on_event` receives every `TimelineEvent` as `{ type, ... }`.
#[wasm_bindgen(js_name = mountTimeline)]
pub fn mount_timeline(config_json: String, on_render: Function, on_event: Function) -> Promise {
    future_to_promise(async move {
        let config = if config_json.trim().is_empty() {
            EngineConfig::default()
        } else {
            EngineConfig::from_json(&config_json).map_err(to_js_error)?
        };
        let source = RestTimelineSource::new(config.api.clone());
        let driver = TimelineDriver::mount(config, source).await.map_err(to_js_error)?;

        let subscription = driver.engine().borrow_mut().subscribe(move |event: &TimelineEvent| {
            // Delivered outside the engine borrow so the callback may call back in.
            let Ok(payload) = JsValue::from_serde(event) else {
                return;
            };
            let on_event = on_event.clone();
            Timeout::new(0, move || {
                let _ = on_event.call1(&JsValue::NULL, &payload);
            })
            .forget();
        });

        let sink = Rc::new(move |model: TimelineViewModel| match JsValue::from_serde(&model) {
            Ok(value) => {
                let _ = on_render.call1(&JsValue::NULL, &value);
            }
            Err(e) => get_logger().error(
                LogComponent::Presentation("TimelineHandle"),
                &format!("View model serialization failed: {}", e),
            ),
        });
        let runtime = TimelineRuntime::new(driver, sink, 0.0);
        runtime.start();

        Ok(TimelineHandle { runtime, subscription }.into())
    })
}

#[wasm_bindgen]
pub struct TimelineHandle {
    runtime: TimelineRuntime<RestTimelineSource>,
    subscription: SubscriptionId,
}

impl TimelineHandle {
    fn dispatch(&self, action: ViewportAction) {
        self.runtime.dispatch(action);
    }
}

#[wasm_bindgen]
impl TimelineHandle {
    /// `"prev"` or `"next"`.
    pub fn navigate(&self, direction_name: &str) -> Result<(), JsValue> {
        self.dispatch(ViewportAction::Navigate(direction(direction_name)?));
        Ok(())
    }

    pub fn page(&self, direction_name: &str) -> Result<(), JsValue> {
        self.dispatch(ViewportAction::Page(direction(direction_name)?));
        Ok(())
    }

    #[wasm_bindgen(js_name = jumpTo)]
    pub fn jump_to(&self, index: f64) {
        if index.is_finite() {
            self.dispatch(ViewportAction::JumpTo(index.round() as i64));
        }
    }

    #[wasm_bindgen(js_name = jumpToEarliest)]
    pub fn jump_to_earliest(&self) {
        self.dispatch(ViewportAction::JumpToEarliest);
    }

    #[wasm_bindgen(js_name = jumpToLatest)]
    pub fn jump_to_latest(&self) {
        self.dispatch(ViewportAction::JumpToLatest);
    }

    pub fn reset(&self) {
        self.dispatch(ViewportAction::Reset);
    }

    #[wasm_bindgen(js_name = switchGranularity)]
    pub fn switch_granularity(&self, name: &str) -> Result<(), JsValue> {
        let granularity = Granularity::parse(name).map_err(to_js_error)?;
        self.dispatch(ViewportAction::SwitchGranularity(granularity));
        Ok(())
    }

    pub fn wheel(&self, delta_y: f64, pointer_ratio: f64) {
        self.dispatch(ViewportAction::WheelZoom { delta_y, pointer_ratio });
    }

    /// `"plot"` or `"minimap"`.
    #[wasm_bindgen(js_name = dragStart)]
    pub fn drag_start(&self, source: &str) {
        let source = if source == "minimap" { DragSource::Minimap } else { DragSource::Plot };
        self.dispatch(ViewportAction::DragStart(source));
    }

    #[wasm_bindgen(js_name = dragMove)]
    pub fn drag_move(&self, delta_buckets: f64) {
        self.dispatch(ViewportAction::DragMove { delta_buckets });
    }

    #[wasm_bindgen(js_name = minimapDrag)]
    pub fn minimap_drag(&self, dx: f64, track_px: f64) {
        self.dispatch(ViewportAction::MinimapDrag { dx, track_px });
    }

    #[wasm_bindgen(js_name = dragEnd)]
    pub fn drag_end(&self) {
        self.dispatch(ViewportAction::DragEnd);
    }

    #[wasm_bindgen(js_name = dragCancel)]
    pub fn drag_cancel(&self) {
        self.dispatch(ViewportAction::DragCancel);
    }

    #[wasm_bindgen(js_name = minimapClick)]
    pub fn minimap_click(&self, x: f64, track_px: f64) {
        self.dispatch(ViewportAction::MinimapClick { x, track_px });
    }

    /// Open the drill-down; `trigger_id` gets focus back when it closes.
    pub fn activate(&self, bucket_index: usize, category_id: Option<u64>, trigger_id: String) {
        let target = DrillTarget { bucket_index, category_id: category_id.map(CategoryId::from) };
        self.dispatch(ViewportAction::Activate { target, trigger: FocusTarget(trigger_id) });
    }

    #[wasm_bindgen(js_name = closeModal)]
    pub fn close_modal(&self) {
        self.dispatch(ViewportAction::CloseModal(CloseReason::Explicit));
    }

    #[wasm_bindgen(js_name = viewAll)]
    pub fn view_all(&self) {
        self.dispatch(ViewportAction::ViewAll);
    }

    pub fn retry(&self) {
        self.dispatch(ViewportAction::Retry);
    }

    #[wasm_bindgen(js_name = retrySummary)]
    pub fn retry_summary(&self) {
        self.dispatch(ViewportAction::RetrySummary);
    }

    #[wasm_bindgen(js_name = transactionsChanged)]
    pub fn transactions_changed(&self) {
        self.dispatch(ViewportAction::TransactionsChanged);
    }

    /// Handle a `KeyboardEvent.key`; returns whether the key was consumed.
    pub fn keydown(&self, key: &str) -> bool {
        let Some(command) = KeyCommand::from_key(key) else {
            return false;
        };
        let modal_open = self.runtime.driver().engine().borrow().modal().is_open();
        if modal_open && !command.allowed_with_modal() {
            return false;
        }
        match command.to_action() {
            Some(action) => {
                self.dispatch(action);
                true
            }
            None => false,
        }
    }

    /// Minimap track width used for thumb geometry in rendered view models.
    #[wasm_bindgen(js_name = setTrackWidth)]
    pub fn set_track_width(&mut self, track_px: f64) {
        self.runtime.set_track_px(track_px);
        self.runtime.refresh();
    }

    #[wasm_bindgen(js_name = viewModel)]
    pub fn view_model(&self) -> Result<JsValue, JsValue> {
        JsValue::from_serde(&self.runtime.view_model()).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Stop delivering events. The handle stays usable.
    pub fn detach(&self) {
        self.runtime.driver().engine().borrow_mut().unsubscribe(self.subscription);
    }
}

/// Mount the Leptos `TimelineViewport` into `document.body`.
///
/// `on_navigate` receives the "View all" intent as `{ startDate, endDate, categoryId? }`.
#[wasm_bindgen(js_name = mountTimelineView)]
pub fn mount_timeline_view(config_json: String, on_navigate: Function) -> Promise {
    future_to_promise(async move {
        let config = if config_json.trim().is_empty() {
            EngineConfig::default()
        } else {
            EngineConfig::from_json(&config_json).map_err(to_js_error)?
        };
        let source = RestTimelineSource::new(config.api.clone());
        let driver = TimelineDriver::mount(config, source).await.map_err(to_js_error)?;

        let on_navigate = Callback::new(move |intent: NavigationIntent| {
            if let Ok(value) = JsValue::from_serde(&intent) {
                let _ = on_navigate.call1(&JsValue::NULL, &value);
            }
        });
        mount_to_body(move || {
            view! { <TimelineViewport driver=driver on_navigate=on_navigate/> }
        });
        Ok(JsValue::UNDEFINED)
    })
}
