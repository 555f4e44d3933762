use chrono::NaiveDate;
use ledger_timeline_wasm::application::drill_down_coordinator::DrillDownCoordinator;
use ledger_timeline_wasm::application::FetchOutcome;
use ledger_timeline_wasm::domain::drill_down::{
    trap_focus, CloseReason, DrillTarget, FocusTarget, ModalState, PeriodSummary,
    TransactionKind, TransactionRecord,
};
use ledger_timeline_wasm::domain::errors::{ErrorKind, FetchError};
use ledger_timeline_wasm::domain::timeline::{CategoryId, DatasetBounds, Granularity};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn daily() -> DatasetBounds {
    DatasetBounds::from_transaction_dates(Granularity::Daily, date(2024, 11, 1), date(2024, 11, 30))
}

fn monthly() -> DatasetBounds {
    DatasetBounds::from_transaction_dates(Granularity::Monthly, date(2023, 6, 1), date(2024, 11, 30))
}

fn summary() -> PeriodSummary {
    PeriodSummary::new(
        1200.0,
        350.0,
        vec![TransactionRecord {
            id: 41,
            date: date(2024, 11, 15),
            description: "Groceries".to_string(),
            amount: 350.0,
            kind: TransactionKind::Expense,
            category_id: Some(CategoryId::from(7)),
        }],
    )
}

#[test]
fn daily_point_requests_a_single_day() {
    let mut drill = DrillDownCoordinator::new();
    let request = drill
        .activate(DrillTarget::point(14), FocusTarget::from("timeline-point-14"), &daily())
        .unwrap();

    assert_eq!(request.period_start, date(2024, 11, 15));
    assert_eq!(request.period_end, date(2024, 11, 15));
    assert!(drill.modal().is_loading());
    insta::assert_json_snapshot!(request, @r###"
    {
      "version": 1,
      "periodStart": "2024-11-15",
      "periodEnd": "2024-11-15"
    }
    "###);
}

#[test]
fn monthly_segment_carries_the_category() {
    let mut drill = DrillDownCoordinator::new();
    let request = drill
        .activate(
            DrillTarget::segment(17, CategoryId::from(7)),
            FocusTarget::from("timeline-point-17"),
            &monthly(),
        )
        .unwrap();
    assert_eq!(request.period_start, date(2024, 11, 1));
    assert_eq!(request.period_end, date(2024, 11, 30));
    assert_eq!(request.category_id, Some(CategoryId::from(7)));
}

#[test]
fn activation_outside_the_dataset_is_ignored() {
    let mut drill = DrillDownCoordinator::new();
    assert!(drill.activate(DrillTarget::point(99), FocusTarget::from("x"), &daily()).is_none());
    assert_eq!(drill.modal(), &ModalState::Closed);
}

#[test]
fn summary_loads_then_closing_returns_focus() {
    let mut drill = DrillDownCoordinator::new();
    let request = drill
        .activate(DrillTarget::point(14), FocusTarget::from("timeline-point-14"), &daily())
        .unwrap();

    assert_eq!(drill.complete(request.version, Ok(summary())), FetchOutcome::Applied);
    match drill.modal() {
        ModalState::Loaded { summary, .. } => assert_eq!(summary.balance, 850.0),
        other => panic!("expected loaded modal, got {:?}", other),
    }

    let focus = drill.close(CloseReason::Escape);
    assert_eq!(focus, Some(FocusTarget::from("timeline-point-14")));
    assert_eq!(drill.modal(), &ModalState::Closed);
    assert_eq!(drill.close(CloseReason::Explicit), None);
}

#[test]
fn period_without_transactions_is_empty() {
    let mut drill = DrillDownCoordinator::new();
    let request = drill.activate(DrillTarget::point(3), FocusTarget::from("p"), &daily()).unwrap();
    drill.complete(request.version, Ok(PeriodSummary::new(0.0, 0.0, Vec::new())));
    assert!(matches!(drill.modal(), ModalState::Empty { .. }));
}

#[test]
fn failed_summary_can_be_retried() {
    let mut drill = DrillDownCoordinator::new();
    let request = drill.activate(DrillTarget::point(3), FocusTarget::from("p"), &daily()).unwrap();
    assert!(drill.retry().is_none());

    let outcome = drill.complete(request.version, Err(FetchError::network("offline")));
    assert_eq!(outcome, FetchOutcome::Failed(ErrorKind::Network));
    assert!(matches!(drill.modal(), ModalState::Failed { error: ErrorKind::Network, .. }));

    let retried = drill.retry().unwrap();
    assert!(retried.version > request.version);
    assert_eq!(retried.period_start, request.period_start);
    assert!(drill.modal().is_loading());

    assert_eq!(drill.complete(request.version, Ok(summary())), FetchOutcome::Stale);
    assert_eq!(drill.complete(retried.version, Ok(summary())), FetchOutcome::Applied);
}

#[test]
fn second_activation_makes_the_first_summary_stale() {
    let mut drill = DrillDownCoordinator::new();
    let first = drill.activate(DrillTarget::point(3), FocusTarget::from("a"), &daily()).unwrap();
    let second = drill.activate(DrillTarget::point(4), FocusTarget::from("b"), &daily()).unwrap();

    assert_eq!(drill.complete(first.version, Ok(summary())), FetchOutcome::Stale);
    assert!(drill.modal().is_loading());
    assert_eq!(drill.complete(second.version, Ok(summary())), FetchOutcome::Applied);
    assert_eq!(drill.modal().context().map(|c| c.target.bucket_index), Some(4));
}

#[test]
fn late_summary_after_close_does_not_reopen() {
    let mut drill = DrillDownCoordinator::new();
    let request = drill.activate(DrillTarget::point(3), FocusTarget::from("p"), &daily()).unwrap();
    drill.close(CloseReason::Backdrop);
    assert_eq!(drill.complete(request.version, Ok(summary())), FetchOutcome::Stale);
    assert!(!drill.modal().is_open());
}

#[test]
fn view_all_hands_over_period_and_category() {
    let mut drill = DrillDownCoordinator::new();
    assert!(drill.view_all().is_none());

    let request = drill
        .activate(DrillTarget::segment(17, CategoryId::from(7)), FocusTarget::from("s"), &monthly())
        .unwrap();
    drill.complete(request.version, Ok(summary()));

    let intent = drill.view_all().unwrap();
    assert!(!drill.modal().is_open());
    insta::assert_json_snapshot!(intent, @r###"
    {
      "startDate": "2024-11-01",
      "endDate": "2024-11-30",
      "categoryId": 7
    }
    "###);
}

#[test]
fn view_all_without_category_omits_it() {
    let mut drill = DrillDownCoordinator::new();
    drill.activate(DrillTarget::point(14), FocusTarget::from("p"), &daily()).unwrap();
    let intent = drill.view_all().unwrap();
    assert_eq!(
        serde_json::to_string(&intent).unwrap(),
        r#"{"startDate":"2024-11-15","endDate":"2024-11-15"}"#
    );
}

#[test]
fn tab_wraps_inside_the_dialog() {
    assert_eq!(trap_focus(None, 3, false), Some(0));
    assert_eq!(trap_focus(None, 3, true), Some(2));
    assert_eq!(trap_focus(Some(1), 3, false), Some(2));
    assert_eq!(trap_focus(Some(2), 3, false), Some(0));
    assert_eq!(trap_focus(Some(0), 3, true), Some(2));
    assert_eq!(trap_focus(Some(2), 3, true), Some(1));
    assert_eq!(trap_focus(Some(0), 0, false), None);
}
