//! Tests for decision allocation and stand-wise aggregation.

use multiforest_core::{
    MultiforestError, PanelBuilder, PanelStore, RegimeId, StandAggregation, StandId,
};
use multiforest_test::{assert_close, three_stand_panel};

use super::aggregation::stand_expression;
use super::allocator::*;
use crate::model::{LinearExpr, MicroLpBackend, ModelContext, SolveStatus};

#[test]
fn test_one_variable_per_feasible_pair() {
    let panel = three_stand_panel();
    let mut ctx = ModelContext::new();
    let decisions = DecisionVariables::allocate(&mut ctx, &panel).unwrap();

    assert_eq!(decisions.len(), 6);
    assert_eq!(decisions.exclusivity_rows().len(), 3);
    let s2 = StandId::from("s2");
    assert_eq!(decisions.for_stand(&s2).count(), 2);
    assert!(decisions.get(&s2, &RegimeId::from("B")).is_some());
    assert!(decisions.get(&s2, &RegimeId::from("C")).is_none());
}

#[test]
fn test_exclusivity_holds_after_solve() {
    let panel = three_stand_panel();
    let mut ctx = ModelContext::new();
    let decisions = DecisionVariables::allocate(&mut ctx, &panel).unwrap();
    for d in decisions.iter() {
        ctx.set_objective_coefficient(d.var, 1.0);
    }
    assert_eq!(ctx.solve(&MicroLpBackend), SolveStatus::Optimal);
    for stand in panel.stands() {
        let total: f64 = decisions
            .for_stand(stand)
            .map(|d| ctx.value(d.var).unwrap())
            .sum();
        assert_close(total, 1.0);
    }
}

#[test]
fn test_regime_missing_in_first_period_is_not_allocated() {
    let panel = PanelBuilder::new()
        .stand("s1", 1.0)
        .cell("s1", 2016, "A", &[("v", 1.0)])
        .cell("s1", 2021, "A", &[("v", 1.0)])
        .cell("s1", 2021, "B", &[("v", 5.0)])
        .build()
        .unwrap();
    let mut ctx = ModelContext::new();
    let decisions = DecisionVariables::allocate(&mut ctx, &panel).unwrap();
    assert_eq!(decisions.len(), 1);
}

#[test]
fn test_stand_without_regime_fails() {
    let panel = PanelBuilder::new()
        .stand("s1", 1.0)
        .stand("s2", 1.0)
        .cell("s1", 2016, "A", &[("v", 1.0)])
        .cell("s2", 2021, "A", &[("v", 1.0)])
        .build()
        .unwrap();
    let mut ctx = ModelContext::new();
    let err = DecisionVariables::allocate(&mut ctx, &panel).unwrap_err();
    assert!(matches!(err, MultiforestError::MissingData(_)));
}

#[test]
fn test_empty_panel_fails() {
    let panel = PanelBuilder::new().stand("s1", 1.0).build().unwrap();
    let mut ctx = ModelContext::new();
    assert!(matches!(
        DecisionVariables::allocate(&mut ctx, &panel),
        Err(MultiforestError::MissingData(_))
    ));
}

// ============================================================================
// Stand-wise aggregation
// ============================================================================

fn coefficient_of(decisions: &DecisionVariables, expr: &LinearExpr, stand: &str, regime: &str) -> f64 {
    let var = decisions
        .get(&StandId::from(stand), &RegimeId::from(regime))
        .unwrap();
    expr.merged_terms().get(&var).copied().unwrap_or(0.0)
}

#[test]
fn test_stand_policies() {
    let panel = three_stand_panel();
    let mut ctx = ModelContext::new();
    let mut decisions = DecisionVariables::allocate(&mut ctx, &panel).unwrap();

    let sum = stand_expression(&mut ctx, &panel, &mut decisions, 2016, "volume", &StandAggregation::Sum).unwrap();
    assert_close(coefficient_of(&decisions, &sum, "s3", "B"), 2.0);

    let weighted = stand_expression(
        &mut ctx,
        &panel,
        &mut decisions,
        2016,
        "volume",
        &StandAggregation::AreaWeightedSum,
    )
    .unwrap();
    assert_close(coefficient_of(&decisions, &weighted, "s3", "B"), 60.0);

    let average = stand_expression(
        &mut ctx,
        &panel,
        &mut decisions,
        2016,
        "volume",
        &StandAggregation::AreaWeightedAverage,
    )
    .unwrap();
    assert_close(coefficient_of(&decisions, &average, "s3", "B"), 1.0);

    let subset = stand_expression(
        &mut ctx,
        &panel,
        &mut decisions,
        2016,
        "volume",
        &StandAggregation::SubsetSum {
            secondary: "deadwood".into(),
        },
    )
    .unwrap();
    assert_close(coefficient_of(&decisions, &subset, "s1", "A"), 3.0);
}

#[test]
fn test_sample_ratio_rescales_absolute_attributes_only() {
    let panel = PanelBuilder::new()
        .stand("s1", 2.0)
        .cell("s1", 2016, "A", &[("v", 4.0), ("Relative_v", 0.5)])
        .relative_attribute("Relative_v")
        .sample_ratio(0.5)
        .build()
        .unwrap();
    let mut ctx = ModelContext::new();
    let mut decisions = DecisionVariables::allocate(&mut ctx, &panel).unwrap();

    let absolute =
        stand_expression(&mut ctx, &panel, &mut decisions, 2016, "v", &StandAggregation::Sum).unwrap();
    assert_close(coefficient_of(&decisions, &absolute, "s1", "A"), 8.0);

    let relative = stand_expression(
        &mut ctx,
        &panel,
        &mut decisions,
        2016,
        "Relative_v",
        &StandAggregation::AreaWeightedSum,
    )
    .unwrap();
    assert_close(coefficient_of(&decisions, &relative, "s1", "A"), 1.0);

    let average = stand_expression(
        &mut ctx,
        &panel,
        &mut decisions,
        2016,
        "v",
        &StandAggregation::AreaWeightedAverage,
    )
    .unwrap();
    assert_close(coefficient_of(&decisions, &average, "s1", "A"), 4.0);
}

#[test]
fn test_missing_later_cell_closes_decision() {
    let panel = PanelBuilder::new()
        .stand("s1", 1.0)
        .cell("s1", 2016, "A", &[("v", 1.0)])
        .cell("s1", 2016, "B", &[("v", 9.0)])
        .cell("s1", 2021, "A", &[("v", 1.0)])
        .build()
        .unwrap();
    let mut ctx = ModelContext::new();
    let mut decisions = DecisionVariables::allocate(&mut ctx, &panel).unwrap();
    let b = decisions
        .get(&StandId::from("s1"), &RegimeId::from("B"))
        .unwrap();

    let expr =
        stand_expression(&mut ctx, &panel, &mut decisions, 2021, "v", &StandAggregation::Sum).unwrap();
    assert!(decisions.is_closed(b));
    assert_eq!(ctx.variable(b).upper(), 0.0);
    assert!(!expr.merged_terms().contains_key(&b));

    ctx.set_objective_coefficient(b, 1.0);
    ctx.solve(&MicroLpBackend);
    assert_close(ctx.value(b).unwrap(), 0.0);
}

#[test]
fn test_cell_without_attribute_is_missing_data() {
    let panel = PanelBuilder::new()
        .stand("s1", 1.0)
        .cell("s1", 2016, "A", &[("v", 1.0)])
        .cell("s1", 2016, "B", &[("w", 1.0)])
        .build()
        .unwrap();
    let mut ctx = ModelContext::new();
    let mut decisions = DecisionVariables::allocate(&mut ctx, &panel).unwrap();
    let err =
        stand_expression(&mut ctx, &panel, &mut decisions, 2016, "v", &StandAggregation::Sum)
            .unwrap_err();
    assert!(matches!(err, MultiforestError::MissingData(_)));
}
