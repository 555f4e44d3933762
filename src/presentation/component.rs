use gloo_timers::callback::Timeout;
use leptos::html::Div;
use leptos::*;
use std::rc::Rc;
use strum::IntoEnumIterator;
use wasm_bindgen::JsCast;

use super::aria::{self, DIALOG_TITLE_ID, REGION_DESCRIPTION_ID, STATUS_ID};
use super::keyboard::KeyCommand;
use super::runtime::TimelineRuntime;
use crate::application::{TimelineDriver, TimelineViewModel, ViewportAction};
use crate::domain::drill_down::{trap_focus, CloseReason, DrillTarget, FocusTarget, ModalState, NavigationIntent};
use crate::domain::events::TimelineEvent;
use crate::domain::logging::{get_logger, LogComponent};
use crate::domain::timeline::{
    plot_drag_to_buckets, DragSource, GestureState, Granularity, NavDirection, TimeBucket,
};
use crate::infrastructure::RestTimelineSource;

const CLOSE_BUTTON_ID: &str = "timeline-dialog-close";
/// Live-region text is cleared after this delay so a repeated message is read again.
const ANNOUNCEMENT_CLEAR_MS: u32 = 1_500;

/// Timeline viewport: navigation controls, minimap, focusable data points and
/// the drill-down dialog. Drawing the series is left to the host; points are
/// exposed as buttons so every bucket is reachable without a pointer.
#[component]
pub fn TimelineViewport(
    driver: TimelineDriver<RestTimelineSource>,
    /// Receives "View all" navigation requests.
    #[prop(optional)]
    on_navigate: Option<Callback<NavigationIntent>>,
    /// Bumped by the host after transactions are created, edited or deleted.
    #[prop(optional, into)]
    mutations: Option<Signal<u64>>,
    #[prop(default = 320.0)] track_px: f64,
    #[prop(default = 640.0)] plot_px: f64,
) -> impl IntoView {
    let engine = driver.engine();
    let labels = engine.borrow().config().labels.clone();
    let model = create_rw_signal(engine.borrow().view_model(track_px));
    let announcement = create_rw_signal(String::new());

    let subscription = engine.borrow_mut().subscribe(move |event| match event {
        TimelineEvent::Announcement { message } => announce(announcement, message.clone()),
        TimelineEvent::FocusReturned { target } => focus_later(target.0.clone()),
        TimelineEvent::NavigateToTransactions { intent } => {
            if let Some(callback) = on_navigate {
                let intent = *intent;
                Timeout::new(0, move || callback.call(intent)).forget();
            }
        }
        _ => {}
    });
    on_cleanup({
        let engine = Rc::clone(&engine);
        move || {
            engine.borrow_mut().unsubscribe(subscription);
        }
    });

    let runtime = TimelineRuntime::new(driver, Rc::new(move |next: TimelineViewModel| model.set(next)), track_px);
    runtime.start();

    if let Some(mutations) = mutations {
        let runtime = runtime.clone();
        create_effect(move |previous: Option<u64>| {
            let current = mutations.get();
            if previous.is_some_and(|previous| previous != current) {
                runtime.dispatch(ViewportAction::TransactionsChanged);
            }
            current
        });
    }

    let on_keydown = {
        let runtime = runtime.clone();
        move |ev: web_sys::KeyboardEvent| {
            let Some(command) = KeyCommand::from_key(&ev.key()) else {
                return;
            };
            let modal_open = model.with_untracked(|m| m.modal.is_open());
            if modal_open && !command.allowed_with_modal() {
                return;
            }
            if let Some(action) = command.to_action() {
                ev.prevent_default();
                runtime.dispatch(action);
            }
        }
    };

    let on_wheel = {
        let runtime = runtime.clone();
        move |ev: web_sys::WheelEvent| {
            ev.prevent_default();
            let pointer_ratio = if plot_px > 0.0 { ev.offset_x() as f64 / plot_px } else { 0.5 };
            runtime.dispatch(ViewportAction::WheelZoom { delta_y: ev.delta_y(), pointer_ratio });
        }
    };

    let last_x = store_value(0.0_f64);
    let drag_handlers = {
        let down = runtime.clone();
        let moved = runtime.clone();
        let up = runtime.clone();
        let cancel = runtime.clone();
        (
            move |ev: web_sys::PointerEvent| {
                capture_pointer(&ev);
                last_x.set_value(ev.client_x() as f64);
                down.dispatch(ViewportAction::DragStart(DragSource::Plot));
            },
            move |ev: web_sys::PointerEvent| {
                let Some(source) = dragging_source(model) else {
                    return;
                };
                if ev.buttons() == 0 {
                    // Released somewhere we never heard about.
                    moved.dispatch(ViewportAction::DragCancel);
                    return;
                }
                let x = ev.client_x() as f64;
                let dx = x - last_x.get_value();
                last_x.set_value(x);
                let action = match source {
                    DragSource::Plot => ViewportAction::DragMove {
                        delta_buckets: plot_drag_to_buckets(dx, plot_px, model.with_untracked(|m| m.viewport.width)),
                    },
                    DragSource::Minimap => ViewportAction::MinimapDrag { dx, track_px },
                };
                moved.dispatch(action);
            },
            move |_ev: web_sys::PointerEvent| {
                if dragging_source(model).is_some() {
                    up.dispatch(ViewportAction::DragEnd);
                }
            },
            move |_ev: web_sys::PointerEvent| {
                if dragging_source(model).is_some() {
                    cancel.dispatch(ViewportAction::DragCancel);
                }
            },
        )
    };
    let (on_plot_down, on_pointer_move, on_pointer_up, on_pointer_cancel) = drag_handlers;

    let on_thumb_down = {
        let runtime = runtime.clone();
        move |ev: web_sys::PointerEvent| {
            ev.stop_propagation();
            capture_pointer(&ev);
            last_x.set_value(ev.client_x() as f64);
            runtime.dispatch(ViewportAction::DragStart(DragSource::Minimap));
        }
    };

    let on_track_click = {
        let runtime = runtime.clone();
        move |ev: web_sys::MouseEvent| {
            let Some(track) = ev.current_target().and_then(|t| t.dyn_into::<web_sys::Element>().ok()) else {
                return;
            };
            let x = ev.client_x() as f64 - track.get_bounding_client_rect().left();
            runtime.dispatch(ViewportAction::MinimapClick { x, track_px });
        }
    };

    let button = {
        let runtime = runtime.clone();
        move |action: ViewportAction| {
            let runtime = runtime.clone();
            move |_ev: web_sys::MouseEvent| runtime.dispatch(action.clone())
        }
    };

    let (status_text, politeness) = {
        let labels = labels.clone();
        let memo = create_memo(move |_| model.with(|m| aria::status_message(m, &labels)));
        (
            move || {
                let text = announcement.get();
                if text.is_empty() { memo.with(|(text, _)| text.clone()) } else { text }
            },
            move || memo.with(|(_, politeness)| politeness.as_str()),
        )
    };

    let nav = {
        let labels = labels.clone();
        create_memo(move |_| model.with(|m| aria::nav_buttons(m, &labels)))
    };
    let slider = {
        let labels = labels.clone();
        create_memo(move |_| model.with(|m| aria::SliderAria::from_view_model(m, &labels)))
    };

    let granularity_buttons = Granularity::iter()
        .map(|granularity| {
            let on_click = button(ViewportAction::SwitchGranularity(granularity));
            view! {
                <button
                    type="button"
                    class="timeline-granularity"
                    aria-pressed=move || model.with(|m| m.viewport.granularity == granularity).to_string()
                    on:click=on_click
                >
                    {granularity.to_string()}
                </button>
            }
        })
        .collect_view();

    let buckets = create_memo(move |_| {
        model.with(|m| m.rendered.as_ref().map(|w| w.buckets.clone()).unwrap_or_default())
    });
    let points = {
        let runtime = runtime.clone();
        move || {
            buckets
                .get()
                .into_iter()
                .map(|bucket| point_view(bucket, runtime.clone()))
                .collect_view()
        }
    };

    let retry = button(ViewportAction::Retry);
    let retry_label = labels.retry.clone();
    let error_label = labels.error.clone();
    let has_error = move || model.with(|m| m.error.is_some());

    let modal_open = create_memo(move |_| model.with(|m| m.modal.is_open()));
    create_effect(move |_| {
        if modal_open.get() {
            focus_later(CLOSE_BUTTON_ID.to_string());
        }
    });

    view! {
        <div
            class="timeline-viewport"
            role="region"
            tabindex="0"
            aria-label=labels.region.clone()
            aria-describedby=REGION_DESCRIPTION_ID
            on:keydown=on_keydown
        >
            <p id=REGION_DESCRIPTION_ID class="visually-hidden">{labels.description.clone()}</p>
            <div id=STATUS_ID class="visually-hidden" role="status" aria-live=politeness>
                {status_text}
            </div>

            <div class="timeline-toolbar">
                <button
                    type="button"
                    aria-label=move || nav.with(|b| b[0].label.clone())
                    disabled=move || nav.with(|b| b[0].disabled)
                    on:click=button(ViewportAction::Navigate(NavDirection::Prev))
                >
                    "‹"
                </button>
                <span class="timeline-period">{move || model.with(|m| m.period_label.clone())}</span>
                <button
                    type="button"
                    aria-label=move || nav.with(|b| b[1].label.clone())
                    disabled=move || nav.with(|b| b[1].disabled)
                    on:click=button(ViewportAction::Navigate(NavDirection::Next))
                >
                    "›"
                </button>
                <button
                    type="button"
                    aria-label=move || nav.with(|b| b[2].label.clone())
                    disabled=move || nav.with(|b| b[2].disabled)
                    on:click=button(ViewportAction::Reset)
                >
                    {labels.reset.clone()}
                </button>
                <div class="timeline-granularities" role="group">{granularity_buttons}</div>
            </div>

            <Show when=has_error>
                <div class="timeline-error" role="alert">
                    <span>{error_label.clone()}</span>
                    <button type="button" on:click=retry.clone()>{retry_label.clone()}</button>
                </div>
            </Show>

            <div
                class="timeline-plot"
                class:loading=move || model.with(|m| m.loading)
                style:width=format!("{}px", plot_px)
                on:wheel=on_wheel
                on:pointerdown=on_plot_down
                on:pointermove=on_pointer_move.clone()
                on:pointerup=on_pointer_up.clone()
                on:pointercancel=on_pointer_cancel.clone()
                on:lostpointercapture=on_pointer_cancel.clone()
            >
                <ul class="timeline-points" role="list">{points}</ul>
            </div>

            <div
                class="timeline-minimap"
                style:width=format!("{}px", track_px)
                on:click=on_track_click
                on:pointermove=on_pointer_move
                on:pointerup=on_pointer_up
                on:pointercancel=on_pointer_cancel.clone()
                on:lostpointercapture=on_pointer_cancel
            >
                <div
                    class="timeline-minimap-thumb"
                    role="slider"
                    tabindex="0"
                    aria-label=move || slider.with(|s| s.label.clone())
                    aria-valuemin=move || slider.with(|s| s.value_min.to_string())
                    aria-valuemax=move || slider.with(|s| s.value_max.to_string())
                    aria-valuenow=move || slider.with(|s| s.value_now.to_string())
                    aria-valuetext=move || slider.with(|s| s.value_text.clone())
                    style:left=move || model.with(|m| format!("{}px", m.thumb.x_px))
                    style:width=move || model.with(|m| format!("{}px", m.thumb.width_px))
                    on:pointerdown=on_thumb_down
                ></div>
            </div>

            <Show when=move || modal_open.get()>
                <DrillDownDialog model=model runtime=runtime.clone() labels=labels.clone()/>
            </Show>
        </div>
    }
}

/// Keep receiving move/up events for this pointer even outside the element.
fn capture_pointer(ev: &web_sys::PointerEvent) {
    let target = ev.current_target().and_then(|t| t.dyn_into::<web_sys::Element>().ok());
    if let Some(element) = target {
        let _ = element.set_pointer_capture(ev.pointer_id());
    }
}

fn dragging_source(model: RwSignal<TimelineViewModel>) -> Option<DragSource> {
    model.with_untracked(|m| match m.gesture {
        GestureState::Dragging { source, .. } => Some(source),
        _ => None,
    })
}

fn point_id(bucket: &TimeBucket) -> String {
    format!("timeline-point-{}", bucket.index)
}

fn point_view(bucket: TimeBucket, runtime: TimelineRuntime<RestTimelineSource>) -> impl IntoView {
    let id = point_id(&bucket);
    let label = format!(
        "{}: income {:.2}, expenses {:.2}",
        bucket.period_label, bucket.income, bucket.expenses
    );
    let segments = bucket
        .categories
        .iter()
        .map(|segment| {
            let segment_id = format!("{}-{}", id, segment.category_id);
            let target = DrillTarget::segment(bucket.index, segment.category_id);
            let runtime = runtime.clone();
            let trigger = FocusTarget(segment_id.clone());
            view! {
                <button
                    type="button"
                    id=segment_id
                    class="timeline-segment"
                    aria-label=format!("{} {:.2}", segment.category_id, segment.amount)
                    on:click=move |_| runtime.dispatch(ViewportAction::Activate {
                        target,
                        trigger: trigger.clone(),
                    })
                ></button>
            }
        })
        .collect_view();

    let target = DrillTarget::point(bucket.index);
    let trigger = FocusTarget(id.clone());
    view! {
        <li class="timeline-point">
            <button
                type="button"
                id=id
                aria-label=label
                on:click=move |_| runtime.dispatch(ViewportAction::Activate {
                    target,
                    trigger: trigger.clone(),
                })
            >
                {bucket.period_label.clone()}
            </button>
            {segments}
        </li>
    }
}

#[component]
fn DrillDownDialog(
    model: RwSignal<TimelineViewModel>,
    runtime: TimelineRuntime<RestTimelineSource>,
    labels: crate::config::AriaLabels,
) -> impl IntoView {
    let dialog_ref = create_node_ref::<Div>();
    let modal = create_memo(move |_| model.with(|m| m.modal.clone()));

    let dispatch = move |action: ViewportAction| {
        let runtime = runtime.clone();
        move |_ev: web_sys::MouseEvent| runtime.dispatch(action.clone())
    };

    let on_keydown = move |ev: web_sys::KeyboardEvent| {
        if ev.key() != "Tab" {
            return;
        }
        if let Some(dialog) = dialog_ref.get_untracked() {
            ev.prevent_default();
            cycle_focus(&dialog, ev.shift_key());
        }
    };

    let title = {
        let labels = labels.clone();
        move || modal.with(|m| aria::dialog_title(m, &labels).unwrap_or_default())
    };
    let notice = {
        let labels = labels.clone();
        move || modal.with(|m| aria::dialog_notice(m, &labels).unwrap_or_default())
    };
    let summary = move || {
        modal.with(|m| {
            m.summary().map(|summary| {
                let rows = summary
                    .transactions
                    .iter()
                    .map(|tx| {
                        view! {
                            <li>{format!("{} {} {:.2}", tx.date, tx.description, tx.amount)}</li>
                        }
                    })
                    .collect_view();
                view! {
                    <dl class="timeline-summary">
                        <dt>"Income"</dt><dd>{format!("{:.2}", summary.income)}</dd>
                        <dt>"Expenses"</dt><dd>{format!("{:.2}", summary.expenses)}</dd>
                        <dt>"Balance"</dt><dd>{format!("{:.2}", summary.balance)}</dd>
                    </dl>
                    <ul class="timeline-transactions">{rows}</ul>
                }
            })
        })
    };
    let failed = move || modal.with(|m| matches!(m, ModalState::Failed { .. }));
    let retry_summary = dispatch(ViewportAction::RetrySummary);
    let retry_label = labels.retry.clone();

    view! {
        <div class="timeline-backdrop" on:click=dispatch(ViewportAction::CloseModal(CloseReason::Backdrop))></div>
        <div
            class="timeline-dialog"
            role="dialog"
            aria-modal="true"
            aria-labelledby=DIALOG_TITLE_ID
            node_ref=dialog_ref
            on:keydown=on_keydown
        >
            <h2 id=DIALOG_TITLE_ID>{title}</h2>
            <p class="timeline-dialog-notice" aria-live="polite">{notice}</p>
            {summary}
            <Show when=failed>
                <button type="button" on:click=retry_summary.clone()>
                    {retry_label.clone()}
                </button>
            </Show>
            <button type="button" on:click=dispatch(ViewportAction::ViewAll)>
                {labels.view_all.clone()}
            </button>
            <button
                type="button"
                id=CLOSE_BUTTON_ID
                on:click=dispatch(ViewportAction::CloseModal(CloseReason::Explicit))
            >
                {labels.close.clone()}
            </button>
        </div>
    }
}

/// Move focus to the next (or previous) button inside `container`, wrapping.
fn cycle_focus(container: &web_sys::Element, backwards: bool) {
    let Ok(nodes) = container.query_selector_all("button:not([disabled])") else {
        return;
    };
    let buttons: Vec<web_sys::HtmlElement> = (0..nodes.length())
        .filter_map(|i| nodes.get(i))
        .filter_map(|node| node.dyn_into::<web_sys::HtmlElement>().ok())
        .collect();
    let active = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.active_element());
    let current = active.and_then(|active| {
        buttons.iter().position(|b| {
            let element: &web_sys::Element = b.as_ref();
            element == &active
        })
    });
    if let Some(next) = trap_focus(current, buttons.len(), backwards) {
        let _ = buttons[next].focus();
    }
}

fn announce(announcement: RwSignal<String>, message: String) {
    announcement.set(message.clone());
    Timeout::new(ANNOUNCEMENT_CLEAR_MS, move || {
        announcement.update(|current| {
            if *current == message {
                current.clear();
            }
        });
    })
    .forget();
}

/// Focus an element by id on the next frame, after the DOM has settled.
fn focus_later(id: String) {
    request_animation_frame(move || {
        let element = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(&id))
            .and_then(|e| e.dyn_into::<web_sys::HtmlElement>().ok());
        match element {
            Some(element) => {
                let _ = element.focus();
            }
            None => get_logger().debug(
                LogComponent::Presentation("TimelineViewport"),
                &format!("Focus target #{} is gone", id),
            ),
        }
    });
}
