// Unit tests for Hero Match

use hero_match::core::{aggregate, distance_km, haversine_distance, DistanceTiers, MatchResult, Tier, TierError};
use hero_match::models::{Coordinate, FacilityCategory};
use hero_match::reference::{CoordinateTable, RegionIndex, RegionLevel, RegionRollup};

fn coord(lat: f64, lon: f64) -> Coordinate {
    Coordinate::new(lat, lon).unwrap()
}

#[test]
fn test_haversine_distance_zero() {
    let leipzig = coord(51.3318815, 12.3953362);
    assert!(haversine_distance(leipzig, leipzig) < 1e-9);
    assert_eq!(distance_km(leipzig, leipzig), 0);
}

#[test]
fn test_haversine_distance_symmetric() {
    let leipzig = coord(51.3318815, 12.3953362);
    let berlin = coord(52.5323, 13.3846);

    assert_eq!(distance_km(leipzig, berlin), distance_km(berlin, leipzig));
    // Leipzig to Berlin is roughly 150 km
    let d = distance_km(leipzig, berlin);
    assert!(d > 140 && d < 160, "unexpected distance {}", d);
}

#[test]
fn test_coordinate_rejects_out_of_range() {
    assert!(Coordinate::new(91.0, 0.0).is_err());
    assert!(Coordinate::new(0.0, -180.5).is_err());
    assert!(Coordinate::new(-90.0, 180.0).is_ok());
}

#[test]
fn test_tier_classification() {
    let tiers = DistanceTiers::new(&[5, 15]).unwrap();

    assert_eq!(tiers.classify(0), Some(Tier::new(5)));
    assert_eq!(tiers.classify(4), Some(Tier::new(5)));
    assert_eq!(tiers.classify(5), Some(Tier::new(5)));
    assert_eq!(tiers.classify(10), Some(Tier::new(15)));
    assert_eq!(tiers.classify(15), Some(Tier::new(15)));
    assert_eq!(tiers.classify(20), None);
}

#[test]
fn test_tier_labels_and_parsing() {
    let tiers: DistanceTiers = "5, 15km".parse().unwrap();
    let labels: Vec<String> = tiers.iter().map(|t| t.label()).collect();
    assert_eq!(labels, vec!["5km", "15km"]);

    assert!(matches!(DistanceTiers::new(&[]), Err(TierError::Empty)));
    assert!(matches!(DistanceTiers::new(&[15, 5]), Err(TierError::NotAscending { .. })));
    assert!("five".parse::<DistanceTiers>().is_err());
}

#[test]
fn test_aggregate_falls_back_with_single_near_match() {
    let near = Tier::new(5);
    let far = Tier::new(15);
    let mut result = MatchResult::new();
    result.increment("a", FacilityCategory::Plasma, near);
    result.increment("b", FacilityCategory::Plasma, far);
    result.increment("c", FacilityCategory::Plasma, far);

    let selection = aggregate(&result, near, far).unwrap();
    assert_eq!(selection.selected_tier, far);
    assert_eq!(selection.facility_ids, vec!["a", "b", "c"]);
}

#[test]
fn test_aggregate_prefers_near_tier() {
    let near = Tier::new(5);
    let far = Tier::new(15);
    let mut result = MatchResult::new();
    result.increment("a", FacilityCategory::Plasma, near);
    result.increment("b", FacilityCategory::Plasma, near);
    result.increment("c", FacilityCategory::Plasma, far);

    let selection = aggregate(&result, near, far).unwrap();
    assert_eq!(selection.selected_tier, near);
    assert_eq!(selection.facility_ids, vec!["a", "b"]);
}

#[test]
fn test_aggregate_empty_result() {
    assert!(aggregate(&MatchResult::new(), Tier::new(5), Tier::new(15)).is_none());
}

#[test]
fn test_coordinate_table_from_json() {
    let table = CoordinateTable::from_json(r#"{"04103": [51.3318815, 12.3953362]}"#).unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table.lookup("04103"), Some(coord(51.3318815, 12.3953362)));
    assert_eq!(table.lookup("99999"), None);

    assert!(CoordinateTable::from_json(r#"{"x": [123.0, 0.0]}"#).is_err());
}

#[test]
fn test_region_rollup_strength() {
    let index = RegionIndex::from_json(
        r#"{"04103": {"ags": "14713000"}, "04109": "14713000", "01067": {"ags": "14612000"}}"#,
    )
    .unwrap();

    let mut rollup = RegionRollup::new(&index);
    assert!(rollup.register_ids("04103", ["h1", "h2"]));
    assert!(rollup.register_ids("04109", ["h3"]));
    assert!(rollup.register_ids("01067", ["h4"]));
    assert!(!rollup.register_ids("99999", ["h5"]));

    let states: Vec<_> = rollup.regions(RegionLevel::State).collect();
    assert_eq!(states.len(), 1);
    assert_eq!(states[0].1.ids.len(), 4);

    let leipzig = index.lookup("04103").unwrap().prefix(RegionLevel::District).unwrap();
    let dresden = index.lookup("01067").unwrap().prefix(RegionLevel::District).unwrap();
    assert_eq!(rollup.count(&leipzig), 3);
    assert_eq!(rollup.strength(&leipzig), 1.0);
    assert!((rollup.strength(&dresden) - 1.0 / 3.0).abs() < 1e-9);
}
