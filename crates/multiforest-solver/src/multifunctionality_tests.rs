//! Tests for the multifunctionality index.

use multiforest_core::{
    Direction, GroupAggregation, MultiforestError, ObjectiveDefinition, RangeTable,
    ServiceGroup, StandAggregation, YearAggregation,
};

use super::multifunctionality::*;
use super::test_utils::*;
use crate::model::MicroLpBackend;

const AUGMENTATION: f64 = 1e-6;

fn solve(
    model: &mut TestModel,
    mf: &mut Multifunctionality,
    ranges: &RangeTable,
    groups: &[ServiceGroup],
) -> MultifunctionalityOutcome {
    mf.solve(
        &mut model.ctx,
        &MicroLpBackend,
        &model.registry,
        ranges,
        groups,
        AUGMENTATION,
    )
    .unwrap()
}

fn singletons() -> Vec<ServiceGroup> {
    vec![
        ServiceGroup::new("volume", ["Sum_volume"]),
        ServiceGroup::new("deadwood", ["Sum_deadwood"]),
    ]
}

#[test]
fn test_singleton_group_is_normalized_objective() {
    let mut model = TestModel::new(&three_stand_panel(), &[sum_volume()]);
    let ranges = model.ranges();
    let mut mf = Multifunctionality::new();

    let result = solve(&mut model, &mut mf, &ranges, &[ServiceGroup::new("volume", ["Sum_volume"])]);
    assert!(result.outcome.is_optimal());
    let volume = result.outcome.value("Sum_volume").unwrap();
    let expected = ranges
        .get("Sum_volume")
        .unwrap()
        .normalize("Sum_volume", volume, Direction::Max)
        .unwrap();
    assert_close(result.groups["volume"], expected);
    assert_close(result.index.unwrap(), 1.0);
}

#[test]
fn test_index_balances_conflicting_groups() {
    let mut model = volume_and_deadwood();
    let ranges = model.ranges();
    let mut mf = Multifunctionality::new();

    let result = solve(&mut model, &mut mf, &ranges, &singletons());
    assert_close(result.index.unwrap(), 0.5);
    assert_close(result.groups["volume"], 0.5);
    assert_close(result.groups["deadwood"], 0.5);
    assert_close(result.outcome.value("Sum_volume").unwrap(), 180.0);
    assert_close(result.outcome.value("Sum_deadwood").unwrap(), 240.0);
}

#[test]
fn test_minimum_group_takes_worst_member() {
    let mut model = volume_and_deadwood();
    let ranges = model.ranges();
    let mut mf = Multifunctionality::new();

    let group = ServiceGroup::new("all", ["Sum_volume", "Sum_deadwood"])
        .with_aggregation(GroupAggregation::Minimum);
    let result = solve(&mut model, &mut mf, &ranges, &[group]);
    assert_close(result.index.unwrap(), 0.5);
    assert_close(result.outcome.value("Sum_volume").unwrap(), 180.0);
}

#[test]
fn test_average_group() {
    let mut model = volume_and_deadwood();
    let ranges = model.ranges();
    let mut mf = Multifunctionality::new();

    // Normalized volume and deadwood always sum to one on this panel.
    let group = ServiceGroup::new("all", ["Sum_volume", "Sum_deadwood"]);
    let result = solve(&mut model, &mut mf, &ranges, &[group]);
    assert_close(result.groups["all"], 0.5);
    assert_close(result.index.unwrap(), 0.5);
}

#[test]
fn test_minimized_objective_normalizes_from_upper_bound() {
    let definition = ObjectiveDefinition::new(
        "Min_deadwood",
        "deadwood",
        Direction::Min,
        YearAggregation::Sum,
        StandAggregation::AreaWeightedSum,
    );
    let mut model = TestModel::new(&three_stand_panel(), &[definition]);
    let ranges = model.ranges();
    let mut mf = Multifunctionality::new();

    let result = solve(&mut model, &mut mf, &ranges, &[ServiceGroup::new("dw", ["Min_deadwood"])]);
    assert_close(result.outcome.value("Min_deadwood").unwrap(), 120.0);
    assert_close(result.groups["dw"], 1.0);
}

#[test]
fn test_switching_layouts_relaxes_previous_index_rows() {
    let mut model = volume_and_deadwood();
    let ranges = model.ranges();
    let mut mf = Multifunctionality::new();

    solve(&mut model, &mut mf, &ranges, &singletons());
    let only_volume = [ServiceGroup::new("volume", ["Sum_volume"])];
    let result = solve(&mut model, &mut mf, &ranges, &only_volume);
    assert_eq!(mf.layout_count(), 2);
    assert_close(result.outcome.value("Sum_volume").unwrap(), 240.0);
    let old_row = model.ctx.find_row("mfi:0:deadwood").unwrap();
    assert!(model.ctx.row(old_row).is_free());

    let result = solve(&mut model, &mut mf, &ranges, &singletons());
    assert_eq!(mf.layout_count(), 2);
    assert_eq!(model.ctx.row(old_row).upper(), 0.0);
    assert_close(result.index.unwrap(), 0.5);
}

#[test]
fn test_invalid_layouts() {
    let mut model = volume_and_deadwood();
    let mut mf = Multifunctionality::new();

    let err = mf
        .solve(&mut model.ctx, &MicroLpBackend, &model.registry, &RangeTable::new(), &singletons(), AUGMENTATION)
        .unwrap_err();
    assert!(matches!(err, MultiforestError::RangeNotComputed(_)));

    let ranges = model.ranges();
    let err = mf
        .solve(&mut model.ctx, &MicroLpBackend, &model.registry, &ranges, &[], AUGMENTATION)
        .unwrap_err();
    assert!(matches!(err, MultiforestError::InvalidDefinition(_)));

    let unknown = [ServiceGroup::new("carbon", ["Sum_carbon"])];
    let err = mf
        .solve(&mut model.ctx, &MicroLpBackend, &model.registry, &ranges, &unknown, AUGMENTATION)
        .unwrap_err();
    assert!(matches!(err, MultiforestError::MissingData(_)));
    assert_eq!(mf.layout_count(), 0);
}
