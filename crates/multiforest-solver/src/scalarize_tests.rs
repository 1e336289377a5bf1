//! Tests for epsilon-constraint and reference-point scalarization.

use std::collections::BTreeMap;

use multiforest_core::{
    Direction, MultiforestError, ObjectiveDefinition, ObjectiveRange, RangeTable,
    StandAggregation, YearAggregation,
};

use super::scalarize::*;
use super::test_utils::*;
use crate::model::{MicroLpBackend, SolveStatus};

const AUGMENTATION: f64 = 1e-6;

fn targets(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
    entries
        .iter()
        .map(|(name, value)| (name.to_string(), *value))
        .collect()
}

fn epsilon(model: &mut TestModel, eps: &mut EpsilonConstraints, ranges: &RangeTable, entries: &[(&str, f64)]) -> SolveOutcome {
    eps.solve(
        &mut model.ctx,
        &MicroLpBackend,
        &model.registry,
        ranges,
        &targets(entries),
        AUGMENTATION,
    )
    .unwrap()
}

fn reference(model: &mut TestModel, rp: &mut ReferencePoint, ranges: &RangeTable, entries: &[(&str, f64)]) -> SolveOutcome {
    rp.solve(
        &mut model.ctx,
        &MicroLpBackend,
        &model.registry,
        ranges,
        &targets(entries),
        AUGMENTATION,
    )
    .unwrap()
}

fn assert_exclusive(model: &TestModel) {
    for row in model.decisions.exclusivity_rows() {
        let total: f64 = model
            .ctx
            .row(*row)
            .terms()
            .keys()
            .map(|var| model.ctx.value(*var).unwrap())
            .sum();
        assert_close(total, 1.0);
    }
}

// ============================================================================
// Epsilon constraint
// ============================================================================

#[test]
fn test_epsilon_on_only_objective() {
    let mut model = TestModel::new(&three_stand_panel(), &[sum_volume()]);
    let ranges = model.ranges();
    let mut eps = EpsilonConstraints::new();

    let outcome = epsilon(&mut model, &mut eps, &ranges, &[("Sum_volume", 150.0)]);
    assert_eq!(outcome.status, SolveStatus::Optimal);
    assert!(outcome.value("Sum_volume").unwrap() >= 150.0 - 1e-6);
    assert_close(outcome.value("Sum_volume").unwrap(), 240.0);
    assert_exclusive(&model);
}

#[test]
fn test_epsilon_trades_off_other_objective() {
    let mut model = volume_and_deadwood();
    let ranges = model.ranges();
    let mut eps = EpsilonConstraints::new();

    let outcome = epsilon(&mut model, &mut eps, &ranges, &[("Sum_volume", 150.0)]);
    assert!(outcome.is_optimal());
    assert_close(outcome.value("Sum_volume").unwrap(), 150.0);
    assert_close(outcome.value("Sum_deadwood").unwrap(), 300.0);
    assert!(outcome.value("Sum_deadwood").unwrap() <= ranges.get("Sum_deadwood").unwrap().upper + 1e-6);
    assert_exclusive(&model);

    let tighter = epsilon(&mut model, &mut eps, &ranges, &[("Sum_volume", 200.0)]);
    assert!(tighter.value("Sum_deadwood").unwrap() <= outcome.value("Sum_deadwood").unwrap() + 1e-6);
    assert_close(tighter.value("Sum_deadwood").unwrap(), 200.0);
}

#[test]
fn test_epsilon_bounds_minimized_objective_from_above() {
    let minimized = |name: &str, attribute: &str| {
        ObjectiveDefinition::new(
            name,
            attribute,
            Direction::Min,
            YearAggregation::Sum,
            StandAggregation::AreaWeightedSum,
        )
    };
    let mut model = TestModel::new(
        &three_stand_panel(),
        &[minimized("Min_volume", "volume"), minimized("Min_deadwood", "deadwood")],
    );
    let ranges = model.ranges();
    let mut eps = EpsilonConstraints::new();

    let outcome = epsilon(&mut model, &mut eps, &ranges, &[("Min_volume", 180.0)]);
    assert_close(outcome.value("Min_volume").unwrap(), 180.0);
    assert_close(outcome.value("Min_deadwood").unwrap(), 240.0);

    let row = eps.row("Min_volume").unwrap();
    assert_eq!(model.ctx.row(row).upper(), 180.0);
    assert_eq!(model.ctx.row(row).lower(), f64::NEG_INFINITY);
}

#[test]
fn test_reset_relaxes_rows() {
    let mut model = volume_and_deadwood();
    let ranges = model.ranges();
    let mut eps = EpsilonConstraints::new();

    epsilon(&mut model, &mut eps, &ranges, &[("Sum_deadwood", 300.0)]);
    eps.reset(&mut model.ctx);
    let row = eps.row("Sum_deadwood").unwrap();
    assert!(model.ctx.row(row).is_free());

    let outcome = epsilon(&mut model, &mut eps, &ranges, &[("Sum_volume", 120.0)]);
    assert_close(outcome.value("Sum_deadwood").unwrap(), 360.0);
}

#[test]
fn test_epsilon_errors() {
    let mut model = volume_and_deadwood();
    let mut eps = EpsilonConstraints::new();

    let err = eps
        .solve(
            &mut model.ctx,
            &MicroLpBackend,
            &model.registry,
            &RangeTable::new(),
            &targets(&[("Sum_volume", 150.0)]),
            AUGMENTATION,
        )
        .unwrap_err();
    assert!(matches!(err, MultiforestError::RangeNotComputed(_)));

    let ranges = model.ranges();
    let err = eps
        .solve(
            &mut model.ctx,
            &MicroLpBackend,
            &model.registry,
            &ranges,
            &targets(&[("Sum_carbon", 1.0)]),
            AUGMENTATION,
        )
        .unwrap_err();
    assert!(matches!(err, MultiforestError::MissingData(_)));
    assert!(eps.row("Sum_volume").is_none());
}

#[test]
fn test_epsilon_rejects_degenerate_range_before_bounding() {
    let mut model = volume_and_deadwood();
    let mut eps = EpsilonConstraints::new();
    let mut ranges = RangeTable::new();
    ranges.insert("Sum_volume", ObjectiveRange::new(240.0, 240.0));
    ranges.insert("Sum_deadwood", ObjectiveRange::new(120.0, 360.0));

    // Sum_volume is optimized while Sum_deadwood is bounded.
    let err = eps
        .solve(
            &mut model.ctx,
            &MicroLpBackend,
            &model.registry,
            &ranges,
            &targets(&[("Sum_deadwood", 200.0)]),
            AUGMENTATION,
        )
        .unwrap_err();
    assert!(matches!(
        err,
        MultiforestError::ZeroRangeWidth { ref objective, .. } if objective == "Sum_volume"
    ));
    assert!(eps.row("Sum_deadwood").is_none());

    // Bounding the degenerate objective keeps it out of the sum.
    let outcome = epsilon(&mut model, &mut eps, &ranges, &[("Sum_volume", 150.0)]);
    assert_close(outcome.value("Sum_deadwood").unwrap(), 300.0);

    // With every objective bounded, all of them are optimized again.
    let err = eps
        .solve(
            &mut model.ctx,
            &MicroLpBackend,
            &model.registry,
            &ranges,
            &targets(&[("Sum_volume", 150.0), ("Sum_deadwood", 200.0)]),
            AUGMENTATION,
        )
        .unwrap_err();
    assert!(matches!(err, MultiforestError::ZeroRangeWidth { .. }));
    assert!(eps.row("Sum_deadwood").is_none());
}

// ============================================================================
// Reference point
// ============================================================================

#[test]
fn test_reference_point_reaches_aspiration() {
    let mut model = volume_and_deadwood();
    let ranges = model.ranges();
    let mut rp = ReferencePoint::new();

    let aspiration = [("Sum_volume", 180.0), ("Sum_deadwood", 240.0)];
    let first = reference(&mut model, &mut rp, &ranges, &aspiration);
    assert!(first.is_optimal());
    assert_close(first.value("Sum_volume").unwrap(), 180.0);
    assert_close(first.value("Sum_deadwood").unwrap(), 240.0);
    assert_close(model.ctx.value(rp.achievement().unwrap()).unwrap(), 0.0);
    assert_exclusive(&model);

    let second = reference(&mut model, &mut rp, &ranges, &aspiration);
    assert_close(second.value("Sum_volume").unwrap(), first.value("Sum_volume").unwrap());
    assert_close(second.value("Sum_deadwood").unwrap(), first.value("Sum_deadwood").unwrap());
    assert_eq!(model.ctx.rows().iter().filter(|r| r.name().starts_with("achievement:")).count(), 2);
}

#[test]
fn test_reference_point_relaxes_absent_objectives() {
    let mut model = volume_and_deadwood();
    let ranges = model.ranges();
    let mut rp = ReferencePoint::new();

    reference(&mut model, &mut rp, &ranges, &[("Sum_volume", 180.0), ("Sum_deadwood", 240.0)]);
    let outcome = reference(&mut model, &mut rp, &ranges, &[("Sum_volume", 180.0)]);

    assert_close(outcome.value("Sum_volume").unwrap(), 240.0);
    assert_close(model.ctx.value(rp.achievement().unwrap()).unwrap(), 0.5);
    let row = model.ctx.find_row("achievement:Sum_deadwood").unwrap();
    assert!(model.ctx.row(row).is_free());
}

#[test]
fn test_reference_point_errors() {
    let mut model = volume_and_deadwood();
    let mut rp = ReferencePoint::new();
    let ranges = model.ranges();

    let err = rp
        .solve(&mut model.ctx, &MicroLpBackend, &model.registry, &ranges, &BTreeMap::new(), AUGMENTATION)
        .unwrap_err();
    assert!(matches!(err, MultiforestError::InvalidDefinition(_)));

    let mut degenerate = ranges.clone();
    degenerate.insert("Sum_volume", ObjectiveRange::point(240.0));
    let err = rp
        .solve(
            &mut model.ctx,
            &MicroLpBackend,
            &model.registry,
            &degenerate,
            &targets(&[("Sum_volume", 200.0)]),
            AUGMENTATION,
        )
        .unwrap_err();
    assert!(matches!(err, MultiforestError::ZeroRangeWidth { .. }));

    let err = rp
        .solve(
            &mut model.ctx,
            &MicroLpBackend,
            &model.registry,
            &ranges,
            &targets(&[("Sum_carbon", 1.0)]),
            AUGMENTATION,
        )
        .unwrap_err();
    assert!(matches!(err, MultiforestError::MissingData(_)));
}
