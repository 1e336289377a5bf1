//! Tests for the in-memory panel store.

use super::*;

fn small_panel() -> InMemoryPanel {
    PanelBuilder::new()
        .stand("s1", 10.0)
        .stand("s2", 20.0)
        .cell("s1", 2021, "A", &[("volume", 1.0), ("V", 100.0)])
        .cell("s1", 2016, "A", &[("volume", 1.0), ("V", 90.0)])
        .cell("s1", 2016, "B", &[("volume", 2.0), ("V", 80.0)])
        .cell("s2", 2016, "A", &[("volume", 3.0), ("V", 70.0)])
        .cell("s2", 2016, "initial_state", &[("volume", 5.0)])
        .cell("s1", 2016, "initial_state", &[("volume", 3.0)])
        .baseline_regime("initial_state")
        .build()
        .unwrap()
}

#[test]
fn test_periods_sorted_and_regimes_in_order() {
    let panel = small_panel();
    assert_eq!(panel.periods(), &[2016, 2021]);
    assert_eq!(
        panel.regimes(),
        &[RegimeId::from("A"), RegimeId::from("B")]
    );
    assert_eq!(panel.cell_count(), 4);
}

#[test]
fn test_missing_cell_is_not_zero() {
    let panel = small_panel();
    let s2 = StandId::from("s2");
    assert!(!panel.has_cell(&s2, 2016, &RegimeId::from("B")));
    assert_eq!(panel.value(&s2, 2016, &RegimeId::from("B"), "volume"), None);
    assert_eq!(panel.value(&s2, 2016, &RegimeId::from("A"), "volume"), Some(3.0));
}

#[test]
fn test_baseline_split() {
    let panel = small_panel();
    assert_eq!(panel.baseline_total("volume"), Some(8.0));
    assert_eq!(panel.baseline_year(), Some(2016));
    assert_eq!(panel.baseline_total("V"), None);
}

#[test]
fn test_total_area() {
    let panel = small_panel();
    assert_eq!(panel.total_area(), 30.0);
    assert_eq!(panel.sample_ratio(), 1.0);
}

#[test]
fn test_classify_regimes() {
    let mut panel = small_panel();
    let name = panel.classify_regimes("CCF", &[RegimeId::from("B")]);
    assert_eq!(name, "CCF_forests");
    let s1 = StandId::from("s1");
    assert_eq!(panel.value(&s1, 2016, &RegimeId::from("B"), &name), Some(1.0));
    assert_eq!(panel.value(&s1, 2016, &RegimeId::from("A"), &name), Some(0.0));
    assert!(panel.has_attribute(&name));
}

#[test]
fn test_derive_total_by_area() {
    let mut panel = small_panel();
    let name = panel.derive_total("volume", &TotalBasis::Area).unwrap();
    assert_eq!(name, "Total_volume");
    let s2 = StandId::from("s2");
    assert_eq!(panel.value(&s2, 2016, &RegimeId::from("A"), &name), Some(60.0));
    // baseline: 3 * 10 + 5 * 20
    assert_eq!(panel.baseline_total(&name), Some(130.0));
}

#[test]
fn test_derive_total_by_attribute() {
    let mut panel = small_panel();
    let name = panel
        .derive_total("volume", &TotalBasis::Attribute("V".into()))
        .unwrap();
    let s1 = StandId::from("s1");
    assert_eq!(panel.value(&s1, 2016, &RegimeId::from("B"), &name), Some(160.0));
}

#[test]
fn test_derive_total_unknown_column() {
    let mut panel = small_panel();
    let err = panel.derive_total("height", &TotalBasis::Area).unwrap_err();
    assert!(matches!(err, MultiforestError::MissingData(_)));
}

#[test]
fn test_derive_relative_to_baseline() {
    let mut panel = small_panel();
    let derived = panel.derive_relative_to_baseline();
    assert_eq!(derived, vec!["Relative_volume".to_string()]);
    assert!(panel.is_relative("Relative_volume"));
    let s2 = StandId::from("s2");
    assert_eq!(
        panel.value(&s2, 2016, &RegimeId::from("A"), "Relative_volume"),
        Some(3.0 / 8.0)
    );
}

#[test]
fn test_invalid_sample_ratio() {
    let err = PanelBuilder::new().sample_ratio(0.0).build().unwrap_err();
    assert!(matches!(err, MultiforestError::InvalidDefinition(_)));
}

#[test]
fn test_undeclared_stand() {
    let err = PanelBuilder::new()
        .cell("ghost", 2016, "A", &[("volume", 1.0)])
        .build()
        .unwrap_err();
    assert!(matches!(err, MultiforestError::MissingData(_)));
}

#[test]
fn test_duplicate_stand() {
    let err = PanelBuilder::new()
        .stand("s1", 1.0)
        .stand("s1", 2.0)
        .build()
        .unwrap_err();
    assert!(matches!(err, MultiforestError::InvalidDefinition(_)));
}
