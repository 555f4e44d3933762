use chrono::NaiveDate;
use ledger_timeline_wasm::application::{FetchOutcome, FetchRequest, TimelineEngine, ViewportAction};
use ledger_timeline_wasm::config::EngineConfig;
use ledger_timeline_wasm::domain::drill_down::{CloseReason, DrillTarget, FocusTarget, PeriodSummary};
use ledger_timeline_wasm::domain::errors::{ErrorKind, FetchError, TimelineError};
use ledger_timeline_wasm::domain::events::TimelineEvent;
use ledger_timeline_wasm::domain::timeline::{
    BucketPayload, DatasetBounds, DragSource, GestureState, Granularity, NavDirection, ViewportState,
};
use std::cell::RefCell;
use std::rc::Rc;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn monthly(newest: NaiveDate) -> DatasetBounds {
    DatasetBounds::from_transaction_dates(Granularity::Monthly, date(2023, 6, 1), newest)
}

fn weekly() -> DatasetBounds {
    DatasetBounds {
        granularity: Granularity::Weekly,
        origin: date(2023, 6, 5),
        earliest_index: 0,
        latest_index: 77,
        total_buckets: 78,
    }
}

fn engine() -> TimelineEngine {
    TimelineEngine::new(EngineConfig::default(), [monthly(date(2024, 11, 15)), weekly()]).unwrap()
}

fn recorder(engine: &mut TimelineEngine) -> Rc<RefCell<Vec<TimelineEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    engine.subscribe(move |event: &TimelineEvent| sink.borrow_mut().push(event.clone()));
    events
}

fn payloads(request: &FetchRequest) -> Vec<BucketPayload> {
    let calendar = monthly(date(2024, 11, 15)).calendar();
    (request.start_index..request.start_index + request.width)
        .map(|index| BucketPayload {
            period_start: calendar.period_start(index),
            income: Some(10.0),
            expenses: Some(4.0),
            ..Default::default()
        })
        .collect()
}

/// Start the engine and apply its first fetch.
fn loaded() -> TimelineEngine {
    let mut engine = engine();
    engine.start();
    let request = engine.on_animation_frame().fetch.unwrap();
    assert_eq!(engine.complete_fetch(request.version, Ok(payloads(&request))), FetchOutcome::Applied);
    engine
}

#[test]
fn missing_default_bounds_is_an_error() {
    let result = TimelineEngine::new(EngineConfig::default(), [weekly()]);
    assert!(matches!(result, Err(TimelineError::MissingBounds(Granularity::Monthly))));
}

#[test]
fn start_announces_and_queues_one_fetch() {
    let mut engine = engine();
    let events = recorder(&mut engine);

    let effects = engine.start();
    assert!(effects.request_frame);
    assert!(effects.fetch.is_none());
    assert!(matches!(
        events.borrow()[0],
        TimelineEvent::ViewportChanged { can_go_prev: true, can_go_next: false, .. }
    ));

    let request = engine.on_animation_frame().fetch.unwrap();
    assert_eq!((request.start_index, request.width), (12, 6));
    assert!(engine.status().loading);
    assert!(events.borrow().contains(&TimelineEvent::LoadingChanged { loading: true }));
}

#[test]
fn rapid_navigation_issues_one_fetch_per_frame() {
    let mut engine = loaded();
    let first = engine.dispatch(ViewportAction::Navigate(NavDirection::Prev));
    let second = engine.dispatch(ViewportAction::Navigate(NavDirection::Prev));
    let third = engine.dispatch(ViewportAction::Navigate(NavDirection::Prev));
    assert!(first.request_frame);
    assert!(!second.request_frame && !third.request_frame);
    assert!(first.fetch.is_none() && third.fetch.is_none());

    let request = engine.on_animation_frame().fetch.unwrap();
    assert_eq!((request.start_index, request.width), (9, 3));
    assert!(engine.on_animation_frame().fetch.is_none());
}

#[test]
fn boundary_navigation_emits_nothing() {
    let mut engine = loaded();
    let events = recorder(&mut engine);
    let effects = engine.dispatch(ViewportAction::Navigate(NavDirection::Next));
    assert!(effects.is_empty());
    assert!(events.borrow().is_empty());
}

#[test]
fn loaded_window_is_announced() {
    let mut engine = engine();
    let events = recorder(&mut engine);
    engine.start();
    let request = engine.on_animation_frame().fetch.unwrap();
    engine.complete_fetch(request.version, Ok(payloads(&request)));

    assert!(events.borrow().contains(&TimelineEvent::Announcement {
        message: "Showing Jun 2024 – Nov 2024".to_string()
    }));
    let model = engine.view_model(300.0);
    assert!(!model.loading);
    assert_eq!(model.rendered.map(|w| w.buckets.len()), Some(6));
}

#[test]
fn fetch_failure_raises_error_and_retry_recovers() {
    let mut engine = loaded();
    engine.dispatch(ViewportAction::JumpToEarliest);
    let events = recorder(&mut engine);
    let request = engine.on_animation_frame().fetch.unwrap();

    let outcome = engine.complete_fetch(request.version, Err(FetchError::network("offline")));
    assert_eq!(outcome, FetchOutcome::Failed(ErrorKind::Network));
    assert!(events.borrow().contains(&TimelineEvent::ErrorRaised { kind: ErrorKind::Network }));

    // Last good data stays on screen.
    let model = engine.view_model(300.0);
    assert_eq!(model.error, Some(ErrorKind::Network));
    assert_eq!(model.rendered.map(|w| w.viewport.start_index), Some(12));

    let retry = engine.dispatch(ViewportAction::Retry).fetch.unwrap();
    assert_eq!(retry.start_index, 0);
    engine.complete_fetch(retry.version, Ok(payloads(&retry)));
    assert_eq!(engine.status().error, None);
}

#[test]
fn switching_granularity_cancels_the_in_flight_fetch() {
    let mut engine = loaded();
    engine.dispatch(ViewportAction::JumpTo(3));
    let monthly_request = engine.on_animation_frame().fetch.unwrap();

    let effects = engine.dispatch(ViewportAction::SwitchGranularity(Granularity::Weekly));
    assert!(effects.request_frame);
    let state = engine.state();
    assert_eq!(state, ViewportState::new(Granularity::Weekly, 66, 12));
    assert!(!engine.can_go_next());
    assert!(engine.can_go_prev());

    assert_eq!(
        engine.complete_fetch(monthly_request.version, Ok(payloads(&monthly_request))),
        FetchOutcome::Stale
    );
    let weekly_request = engine.on_animation_frame().fetch.unwrap();
    assert_eq!(weekly_request.granularity, Granularity::Weekly);
}

#[test]
fn switching_to_a_tier_without_bounds_is_ignored() {
    let mut engine = loaded();
    let effects = engine.dispatch(ViewportAction::SwitchGranularity(Granularity::Quarterly));
    assert!(effects.is_empty());
    assert_eq!(engine.state().granularity, Granularity::Monthly);
}

#[test]
fn wheel_zoom_changes_width_only() {
    let mut engine = loaded();
    engine.dispatch(ViewportAction::WheelZoom { delta_y: -100.0, pointer_ratio: 1.0 });
    assert_eq!(engine.state(), ViewportState::new(Granularity::Monthly, 13, 5));
    assert!(engine.dispatch(ViewportAction::WheelZoom { delta_y: 0.0, pointer_ratio: 0.5 }).is_empty());
}

#[test]
fn drag_previews_then_commits_once() {
    let mut engine = loaded();
    let events = recorder(&mut engine);

    engine.dispatch(ViewportAction::DragStart(DragSource::Plot));
    engine.dispatch(ViewportAction::DragMove { delta_buckets: -2.4 });
    engine.dispatch(ViewportAction::DragMove { delta_buckets: -0.4 });

    let model = engine.view_model(300.0);
    assert!((model.preview_start - 9.2).abs() < 1e-9);
    assert_eq!(model.viewport.start_index, 12);
    assert!(events.borrow().is_empty());

    engine.dispatch(ViewportAction::DragEnd);
    assert_eq!(engine.state().start_index, 9);
    assert!(matches!(engine.gesture(), GestureState::Settling { to: 9, .. }));
    let changes = events
        .borrow()
        .iter()
        .filter(|e| matches!(e, TimelineEvent::ViewportChanged { .. }))
        .count();
    assert_eq!(changes, 1);

    engine.on_animation_frame();
    assert_eq!(engine.gesture(), GestureState::Idle);
}

#[test]
fn cancelled_drag_commits_nothing() {
    let mut engine = loaded();
    engine.dispatch(ViewportAction::DragStart(DragSource::Minimap));
    engine.dispatch(ViewportAction::MinimapDrag { dx: -100.0, track_px: 300.0 });
    engine.dispatch(ViewportAction::DragCancel);
    assert_eq!(engine.state().start_index, 12);
    assert_eq!(engine.gesture(), GestureState::Idle);
    assert!(engine.dispatch(ViewportAction::DragEnd).is_empty());
}

#[test]
fn minimap_click_jumps_unless_on_the_thumb() {
    let mut engine = loaded();
    assert!(engine.dispatch(ViewportAction::MinimapClick { x: 250.0, track_px: 300.0 }).is_empty());

    engine.dispatch(ViewportAction::MinimapClick { x: 150.0, track_px: 300.0 });
    assert_eq!(engine.state().start_index, 6);
}

#[test]
fn activation_opens_the_modal_and_escape_returns_focus() {
    let mut engine = loaded();
    let events = recorder(&mut engine);

    let effects = engine.dispatch(ViewportAction::Activate {
        target: DrillTarget::point(15),
        trigger: FocusTarget::from("timeline-point-15"),
    });
    let request = effects.summary.unwrap();
    assert_eq!(request.period_start, date(2024, 9, 1));
    assert!(engine.modal().is_loading());

    engine.complete_summary(request.version, Ok(PeriodSummary::new(0.0, 0.0, Vec::new())));
    engine.dispatch(ViewportAction::CloseModal(CloseReason::Escape));

    let events = events.borrow();
    assert!(matches!(events[0], TimelineEvent::Activated { .. }));
    assert_eq!(
        events.last(),
        Some(&TimelineEvent::FocusReturned { target: FocusTarget::from("timeline-point-15") })
    );
    assert!(!engine.modal().is_open());
}

#[test]
fn view_all_emits_the_navigation_intent() {
    let mut engine = loaded();
    let events = recorder(&mut engine);
    let request = engine
        .dispatch(ViewportAction::Activate { target: DrillTarget::point(17), trigger: FocusTarget::from("p") })
        .summary
        .unwrap();
    engine.complete_summary(request.version, Ok(PeriodSummary::new(1.0, 0.0, Vec::new())));
    engine.dispatch(ViewportAction::ViewAll);

    let intents: Vec<_> = events
        .borrow()
        .iter()
        .filter_map(|e| match e {
            TimelineEvent::NavigateToTransactions { intent } => Some(*intent),
            _ => None,
        })
        .collect();
    assert_eq!(intents.len(), 1);
    assert_eq!((intents[0].start_date, intents[0].end_date), (date(2024, 11, 1), date(2024, 11, 30)));
    assert!(!events.borrow().iter().any(|e| matches!(e, TimelineEvent::FocusReturned { .. })));
}

#[test]
fn mutation_refreshes_bounds_and_follows_present() {
    let mut engine = loaded();
    let effects = engine.dispatch(ViewportAction::TransactionsChanged);
    assert!(effects.refresh_bounds);
    assert!(engine.fetcher().cache(Granularity::Monthly).is_none());

    engine.dispatch(ViewportAction::BoundsRefreshed(vec![monthly(date(2024, 12, 2))]));
    assert_eq!(engine.state().start_index, 13);
    let request = engine.on_animation_frame().fetch.unwrap();
    assert_eq!((request.start_index, request.width), (13, 6));
}

#[test]
fn mutation_keeps_a_scrolled_viewport_and_reloads_it() {
    let mut engine = loaded();
    engine.dispatch(ViewportAction::JumpTo(4));
    let request = engine.on_animation_frame().fetch.unwrap();
    engine.complete_fetch(request.version, Ok(payloads(&request)));

    engine.dispatch(ViewportAction::TransactionsChanged);
    engine.dispatch(ViewportAction::BoundsRefreshed(vec![monthly(date(2024, 12, 2))]));
    assert_eq!(engine.state().start_index, 4);
    let reload = engine.on_animation_frame().fetch.unwrap();
    assert_eq!((reload.start_index, reload.width), (4, 6));
}

#[test]
fn fetches_wait_for_bounds_after_a_mutation() {
    let mut engine = loaded();
    engine.dispatch(ViewportAction::TransactionsChanged);
    assert!(engine.is_awaiting_bounds());

    engine.dispatch(ViewportAction::Navigate(NavDirection::Prev));
    assert_eq!(engine.state().start_index, 11);
    assert_eq!(engine.on_animation_frame().fetch, None);
    assert!(engine.dispatch(ViewportAction::Retry).is_empty());

    // Oldest transaction deleted: index 0 is now July 2023.
    let shifted = DatasetBounds::from_transaction_dates(Granularity::Monthly, date(2023, 7, 1), date(2024, 11, 15));
    engine.dispatch(ViewportAction::BoundsRefreshed(vec![shifted]));
    assert!(!engine.is_awaiting_bounds());
    assert_eq!(engine.state().start_index, 11);

    let request = engine.on_animation_frame().fetch.unwrap();
    assert_eq!((request.start_index, request.width), (11, 6));
    assert_eq!(request.period.start, date(2024, 6, 1));

    let calendar = shifted.calendar();
    let fresh = (11..17)
        .map(|index| BucketPayload { period_start: calendar.period_start(index), ..Default::default() })
        .collect();
    engine.complete_fetch(request.version, Ok(fresh));
    let rendered = engine.rendered().unwrap();
    assert_eq!(rendered.buckets[0].index, 11);
    assert_eq!(rendered.buckets[0].period_start, date(2024, 6, 1));
}

#[test]
fn shifted_bounds_drop_the_cached_tier() {
    let mut engine = loaded();
    assert!(engine.fetcher().cache(Granularity::Monthly).is_some());

    let shifted = DatasetBounds::from_transaction_dates(Granularity::Monthly, date(2023, 7, 1), date(2024, 11, 15));
    engine.dispatch(ViewportAction::BoundsRefreshed(vec![shifted, weekly()]));
    assert!(engine.fetcher().cache(Granularity::Monthly).is_none());
    assert_eq!(engine.state().start_index, 11);

    let request = engine.on_animation_frame().fetch.unwrap();
    assert_eq!((request.start_index, request.width), (11, 6));
}

#[test]
fn navigation_during_a_drag_is_kept_on_release() {
    let mut engine = loaded();
    engine.dispatch(ViewportAction::DragStart(DragSource::Plot));
    engine.dispatch(ViewportAction::Navigate(NavDirection::Prev));
    engine.dispatch(ViewportAction::Navigate(NavDirection::Prev));
    assert_eq!(engine.state().start_index, 10);

    engine.dispatch(ViewportAction::DragEnd);
    assert_eq!(engine.state().start_index, 10);

    engine.on_animation_frame();
    engine.dispatch(ViewportAction::DragStart(DragSource::Plot));
    engine.dispatch(ViewportAction::DragMove { delta_buckets: -1.2 });
    engine.dispatch(ViewportAction::JumpTo(5));
    assert!((engine.view_model(300.0).preview_start - 3.8).abs() < 1e-9);
    engine.dispatch(ViewportAction::DragEnd);
    assert_eq!(engine.state().start_index, 4);
}

#[test]
fn abandoned_drag_cancels_and_frees_the_minimap() {
    let mut engine = loaded();
    engine.dispatch(ViewportAction::DragStart(DragSource::Plot));
    engine.dispatch(ViewportAction::DragMove { delta_buckets: -3.0 });
    assert!(engine.dispatch(ViewportAction::MinimapClick { x: 150.0, track_px: 300.0 }).is_empty());

    engine.dispatch(ViewportAction::DragCancel);
    assert_eq!(engine.state().start_index, 12);
    // Hover after the lost release moves nothing.
    assert!(engine.dispatch(ViewportAction::DragMove { delta_buckets: -2.0 }).is_empty());
    assert!(engine.dispatch(ViewportAction::DragEnd).is_empty());

    engine.dispatch(ViewportAction::MinimapClick { x: 150.0, track_px: 300.0 });
    assert_eq!(engine.state().start_index, 6);
}

#[test]
fn continuous_input_changes_schedule_a_frame() {
    let mut engine = loaded();
    engine.dispatch(ViewportAction::DragStart(DragSource::Plot));
    engine.on_animation_frame();

    for action in [
        ViewportAction::DragMove { delta_buckets: -1.0 },
        ViewportAction::MinimapDrag { dx: -20.0, track_px: 300.0 },
    ] {
        assert!(action.is_continuous());
        assert!(engine.dispatch(action).request_frame);
        engine.on_animation_frame();
    }
    engine.dispatch(ViewportAction::DragCancel);
    engine.on_animation_frame();

    let wheel = ViewportAction::WheelZoom { delta_y: -120.0, pointer_ratio: 0.5 };
    assert!(wheel.is_continuous());
    let effects = engine.dispatch(wheel);
    assert!(effects.request_frame);
    assert_eq!(engine.state().width, 5);

    assert!(!ViewportAction::Navigate(NavDirection::Prev).is_continuous());
    assert!(!ViewportAction::DragEnd.is_continuous());
}

#[test]
fn events_carry_their_kind_for_the_host() {
    let mut engine = loaded();
    let events = recorder(&mut engine);
    engine.dispatch(ViewportAction::Navigate(NavDirection::Prev));
    engine.on_animation_frame();

    let loading = events
        .borrow()
        .iter()
        .find(|e| matches!(e, TimelineEvent::LoadingChanged { .. }))
        .cloned()
        .unwrap();
    insta::assert_json_snapshot!(loading, @r###"
    {
      "type": "loadingChanged",
      "loading": true
    }
    "###);
}
