use ledger_timeline_wasm::config::EngineConfig;
use ledger_timeline_wasm::domain::errors::TimelineError;
use ledger_timeline_wasm::domain::timeline::Granularity;

#[test]
fn empty_document_uses_defaults() {
    let config = EngineConfig::from_json("{}").unwrap();
    assert_eq!(config, EngineConfig::default());
    assert_eq!(config.default_granularity, Granularity::Monthly);
    assert_eq!(config.api.buckets_path, "/api/analytics/buckets");
    assert_eq!(config.labels.loaded, "Showing");
}

#[test]
fn overrides_replace_the_width_table() {
    let raw = r#"{
        "defaultGranularity": "weekly",
        "granularityOverrides": {
            "weekly": { "minWidth": 2, "maxWidth": 30, "defaultWidth": 8, "step": 2, "zoomStep": 4 }
        },
        "api": { "baseUrl": "https://ledger.example" },
        "labels": { "prev": "Zurück" }
    }"#;
    let config = EngineConfig::from_json(raw).unwrap();
    assert_eq!(config.default_granularity, Granularity::Weekly);

    let weekly = config.bounds_for(Granularity::Weekly);
    assert_eq!((weekly.min_width, weekly.max_width, weekly.default_width), (2, 30, 8));
    assert_eq!((weekly.step, weekly.zoom_step), (2, 4));
    assert_eq!(config.bounds_for(Granularity::Daily), Granularity::Daily.bounds());

    assert_eq!(config.api.base_url, "https://ledger.example");
    assert_eq!(config.api.summary_path, "/api/transactions/summary");
    assert_eq!(config.labels.prev, "Zurück");
    assert_eq!(config.labels.next, "Next period");
}

#[test]
fn inconsistent_widths_are_rejected() {
    let raw = r#"{
        "granularityOverrides": {
            "monthly": { "minWidth": 8, "maxWidth": 24, "defaultWidth": 6, "step": 1, "zoomStep": 1 }
        }
    }"#;
    assert!(matches!(EngineConfig::from_json(raw), Err(TimelineError::InvalidConfig(_))));
}

#[test]
fn zero_steps_are_rejected() {
    let raw = r#"{
        "granularityOverrides": {
            "daily": { "minWidth": 3, "maxWidth": 120, "defaultWidth": 14, "step": 0, "zoomStep": 7 }
        }
    }"#;
    assert!(EngineConfig::from_json(raw).is_err());
}

#[test]
fn thumb_ratios_must_be_ordered() {
    let raw = r#"{ "minimap": { "minThumbRatio": 0.5, "maxThumbRatio": 0.2 } }"#;
    assert!(matches!(EngineConfig::from_json(raw), Err(TimelineError::InvalidConfig(_))));

    let config = EngineConfig::from_json(r#"{ "minimap": { "minThumbRatio": 0.1 } }"#).unwrap();
    let mapper = config.minimap_mapper();
    assert!((mapper.thumb_ratio(6, 900) - 0.1).abs() < f64::EPSILON);
}

#[test]
fn unknown_granularity_is_a_parse_error() {
    assert!(EngineConfig::from_json(r#"{ "defaultGranularity": "hourly" }"#).is_err());
    assert!(matches!(Granularity::parse("hourly"), Err(TimelineError::UnknownGranularity(_))));
    assert_eq!(Granularity::parse(" quarterly ").unwrap(), Granularity::Quarterly);
}

#[test]
fn malformed_json_is_reported() {
    let error = EngineConfig::from_json("{ not json").unwrap_err();
    assert!(error.to_string().starts_with("Invalid configuration"));
}
