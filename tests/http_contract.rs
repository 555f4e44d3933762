use chrono::NaiveDate;
use ledger_timeline_wasm::application::FetchRequest;
use ledger_timeline_wasm::config::ApiConfig;
use ledger_timeline_wasm::domain::drill_down::{PeriodSummary, SummaryRequest};
use ledger_timeline_wasm::domain::timeline::{CategoryId, Granularity, PeriodRange, RequestVersion};
use ledger_timeline_wasm::infrastructure::http::{
    bounds_url, buckets_url, summary_url, BoundsResponse, BucketsResponse, SummaryResponse,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn api() -> ApiConfig {
    ApiConfig { base_url: "https://ledger.example/".to_string(), ..ApiConfig::default() }
}

#[test]
fn bucket_url_carries_dates_and_tier() {
    let request = FetchRequest {
        version: RequestVersion::from(3),
        granularity: Granularity::Monthly,
        start_index: 12,
        width: 6,
        period: PeriodRange::new(date(2024, 6, 1), date(2024, 11, 30)),
    };
    assert_eq!(
        buckets_url(&api(), &request),
        "https://ledger.example/api/analytics/buckets?start_date=2024-06-01&end_date=2024-11-30&granularity=monthly"
    );
}

#[test]
fn bounds_url_per_tier() {
    assert_eq!(
        bounds_url(&ApiConfig::default(), Granularity::Quarterly),
        "/api/analytics/bounds?granularity=quarterly"
    );
}

#[test]
fn summary_url_adds_category_when_present() {
    let mut request = SummaryRequest {
        version: RequestVersion::from(1),
        period_start: date(2024, 11, 15),
        period_end: date(2024, 11, 15),
        category_id: None,
    };
    assert_eq!(
        summary_url(&api(), &request),
        "https://ledger.example/api/transactions/summary?start_date=2024-11-15&end_date=2024-11-15"
    );

    request.category_id = Some(CategoryId::from(7));
    assert!(summary_url(&api(), &request).ends_with("&category_id=7"));
}

#[test]
fn buckets_may_be_wrapped_or_bare() {
    let wrapped: BucketsResponse =
        serde_json::from_str(r#"{"buckets": [{"period_start": "2024-06-01", "income": 1.0, "expenses": 2.0}]}"#)
            .unwrap();
    assert_eq!(wrapped.into_payloads().len(), 1);

    let bare: BucketsResponse = serde_json::from_str(r#"[{"period_start": "2024-06-01"}, {}]"#).unwrap();
    let payloads = bare.into_payloads();
    assert_eq!(payloads.len(), 2);
    assert_eq!(payloads[1].period_start, None);
}

#[test]
fn bounds_response_becomes_dataset_bounds() {
    let today = date(2024, 11, 20);
    let response: BoundsResponse =
        serde_json::from_str(r#"{"oldest_date": "2023-06-14", "newest_date": "2024-11-02"}"#).unwrap();
    let bounds = response.into_bounds(Granularity::Monthly, today);
    assert_eq!(bounds.total_buckets, 18);
    assert_eq!(bounds.origin, date(2023, 6, 1));
}

#[test]
fn empty_ledger_bounds_fall_back_to_today() {
    let today = date(2024, 11, 20);
    let response: BoundsResponse = serde_json::from_str("{}").unwrap();
    let bounds = response.into_bounds(Granularity::Weekly, today);
    assert_eq!(bounds.total_buckets, 1);
    assert_eq!(bounds.origin, date(2024, 11, 18));
}

#[test]
fn summary_response_computes_balance() {
    let response: SummaryResponse = serde_json::from_str(
        r#"{"income": 1200.0, "expenses": 350.5, "transactions": [
            {"id": 1, "date": "2024-11-15", "description": "Rent", "amount": 350.5, "kind": "expense", "categoryId": 4}
        ]}"#,
    )
    .unwrap();
    let summary = PeriodSummary::from(response);
    assert_eq!(summary.balance, 849.5);
    assert_eq!(summary.transactions[0].category_id, Some(CategoryId::from(4)));
}
