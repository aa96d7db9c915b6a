#![cfg(feature = "serde")]

use ridgematch::{ExtractConfig, MatchConfig, Minutia, MinutiaKind, MinutiaSet};

#[test]
fn partial_configs_fill_defaults() {
    let extract: ExtractConfig =
        serde_json::from_str(r#"{ "block_size": 12, "min_separation": 6.5 }"#).unwrap();
    assert_eq!(extract.block_size, 12);
    assert_eq!(extract.min_separation, 6.5);
    assert_eq!(extract.reference_ppi, ExtractConfig::default().reference_ppi);

    let matching: MatchConfig = serde_json::from_str(r#"{ "angle_tolerance_deg": 8.0 }"#).unwrap();
    assert_eq!(matching.angle_tolerance_deg, 8.0);
    assert_eq!(matching.max_minutiae, MatchConfig::default().max_minutiae);
    assert!(matching.validate().is_ok());
}

#[test]
fn configs_round_trip_through_json() {
    let cfg = MatchConfig {
        distance_tolerance: 7.5,
        parallel: true,
        ..MatchConfig::default()
    };
    let text = serde_json::to_string(&cfg).unwrap();
    let back: MatchConfig = serde_json::from_str(&text).unwrap();
    assert_eq!(back, cfg);

    let cfg = ExtractConfig {
        trace_length: 14,
        ..ExtractConfig::default()
    };
    let back: ExtractConfig = serde_json::from_str(&serde_json::to_string(&cfg).unwrap()).unwrap();
    assert_eq!(back, cfg);
}

#[test]
fn minutia_sets_serialize_as_plain_lists() {
    let set = MinutiaSet::new(vec![Minutia::new(
        4.0,
        5.0,
        90.0,
        MinutiaKind::Bifurcation,
        0.5,
    )]);
    let value = serde_json::to_value(&set).unwrap();
    assert!(value.is_array());
    assert_eq!(value[0]["kind"], "bifurcation");
    let back: MinutiaSet = serde_json::from_value(value).unwrap();
    assert_eq!(back, set);
}
