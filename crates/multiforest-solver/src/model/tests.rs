use super::*;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

#[test]
fn test_add_row_moves_constant_into_bounds() {
    let mut ctx = ModelContext::new();
    let x = ctx.add_variable("x", 0.0, 10.0);
    let mut expr = LinearExpr::term(x, 2.0);
    expr.add_constant(3.0);
    let row = ctx.add_less_equal("r", &expr, 7.0).unwrap();
    assert_eq!(ctx.row(row).upper(), 4.0);
    assert_eq!(ctx.row(row).lower(), f64::NEG_INFINITY);
    assert_eq!(ctx.row(row).coefficient(x), 2.0);
}

#[test]
fn test_duplicate_terms_are_merged() {
    let mut ctx = ModelContext::new();
    let x = ctx.add_variable("x", 0.0, 1.0);
    let y = ctx.add_variable("y", 0.0, 1.0);
    let expr = LinearExpr::new()
        .with_term(x, 1.0)
        .with_term(y, 2.0)
        .with_term(x, 0.5)
        .with_term(y, -2.0);
    let row = ctx.add_equality("r", &expr, 1.0).unwrap();
    assert_eq!(ctx.row(row).terms().len(), 1);
    assert_eq!(ctx.row(row).coefficient(x), 1.5);
}

#[test]
fn test_duplicate_row_name_rejected() {
    let mut ctx = ModelContext::new();
    let x = ctx.add_variable("x", 0.0, 1.0);
    ctx.add_equality("r", &LinearExpr::term(x, 1.0), 1.0).unwrap();
    let err = ctx
        .add_equality("r", &LinearExpr::term(x, 1.0), 1.0)
        .unwrap_err();
    assert!(matches!(err, MultiforestError::InvalidDefinition(_)));
    assert!(ctx.find_row("r").is_some());
}

#[test]
fn test_solve_small_lp() {
    // max x + 2y  s.t.  x + y <= 4, x <= 3, y <= 2
    let mut ctx = ModelContext::new();
    let x = ctx.add_variable("x", 0.0, 3.0);
    let y = ctx.add_variable("y", 0.0, 2.0);
    ctx.add_less_equal("cap", &LinearExpr::term(x, 1.0).with_term(y, 1.0), 4.0)
        .unwrap();
    ctx.set_objective_coefficient(x, 1.0);
    ctx.set_objective_coefficient(y, 2.0);

    assert_eq!(ctx.status(), SolveStatus::NotSolved);
    assert_eq!(ctx.solve(&MicroLpBackend), SolveStatus::Optimal);
    assert!(close(ctx.value(x).unwrap(), 2.0));
    assert!(close(ctx.value(y).unwrap(), 2.0));
    assert!(close(ctx.objective_value().unwrap(), 6.0));
    let sum = LinearExpr::term(x, 1.0).with_term(y, 1.0);
    assert!(close(ctx.evaluate(&sum).unwrap(), 4.0));
}

#[test]
fn test_rebounding_and_relaxing() {
    let mut ctx = ModelContext::new();
    let x = ctx.add_variable("x", 0.0, 10.0);
    let row = ctx.add_less_equal("cap", &LinearExpr::term(x, 1.0), 3.0).unwrap();
    ctx.set_objective_coefficient(x, 1.0);

    ctx.solve(&MicroLpBackend);
    assert!(close(ctx.value(x).unwrap(), 3.0));

    ctx.set_row_upper(row, 5.0);
    ctx.solve(&MicroLpBackend);
    assert!(close(ctx.value(x).unwrap(), 5.0));

    ctx.relax_row(row);
    assert!(ctx.row(row).is_free());
    ctx.solve(&MicroLpBackend);
    assert!(close(ctx.value(x).unwrap(), 10.0));
}

#[test]
fn test_infeasible_has_no_values() {
    let mut ctx = ModelContext::new();
    let x = ctx.add_variable("x", 0.0, 1.0);
    ctx.add_greater_equal("low", &LinearExpr::term(x, 1.0), 2.0).unwrap();
    assert_eq!(ctx.solve(&MicroLpBackend), SolveStatus::Infeasible);
    assert_eq!(ctx.value(x), None);
    assert_eq!(ctx.objective_value(), None);
}

#[test]
fn test_unbounded() {
    let mut ctx = ModelContext::new();
    let x = ctx.add_free_variable("x");
    ctx.set_objective_coefficient(x, 1.0);
    assert_eq!(ctx.solve(&MicroLpBackend), SolveStatus::Unbounded);
}

#[test]
fn test_empty_row_checked_without_backend() {
    let mut ctx = ModelContext::new();
    let x = ctx.add_variable("x", 0.0, 1.0);
    let row = ctx.add_greater_equal("r", &LinearExpr::term(x, 1.0), 1.0).unwrap();
    ctx.set_row_coefficient(row, x, 0.0);
    assert!(ctx.row(row).terms().is_empty());
    assert_eq!(ctx.solve(&MicroLpBackend), SolveStatus::Infeasible);
}

#[test]
fn test_objective_coefficients_accumulate() {
    let mut ctx = ModelContext::new();
    let x = ctx.add_variable("x", 0.0, 1.0);
    ctx.add_objective_coefficient(x, 1.0);
    ctx.add_objective_coefficient(x, 0.5);
    assert_eq!(ctx.objective_coefficient(x), 1.5);
    ctx.clear_objective();
    assert_eq!(ctx.objective_coefficient(x), 0.0);
}
