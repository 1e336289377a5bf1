//! Payoff table and objective ranges.
//!
//! Each objective is optimized on its own, with a small augmentation on the
//! others to break ties, and every objective's value is recorded after each
//! optimal solve. The smallest and largest values seen become the range
//! used for normalization.

use std::time::Instant;

use multiforest_config::RangeStrategy;
use multiforest_core::RangeTable;
use tracing::{debug, info, warn};

use crate::model::{LpBackend, ModelContext};
use crate::objectives::{ObjectiveRegistry, RegisteredObjective};

/// Computes the range table of every registered objective.
///
/// `previous` supplies the widths used to scale the augmentation terms; an
/// empty table disables augmentation for the first computation.
pub fn compute_ranges(
    ctx: &mut ModelContext,
    backend: &dyn LpBackend,
    registry: &ObjectiveRegistry,
    strategy: RangeStrategy,
    augmentation: f64,
    previous: &RangeTable,
) -> RangeTable {
    let start = Instant::now();
    let mut table = RangeTable::new();

    let sweeps: &[f64] = match strategy {
        RangeStrategy::PayoffTable => &[1.0],
        RangeStrategy::Extremes => &[1.0, -1.0],
    };
    for &sweep in sweeps {
        for objective in registry.iter() {
            set_payoff_objective(ctx, registry, objective, sweep, augmentation, previous);
            let status = ctx.solve(backend);
            let Some(values) = status
                .is_optimal()
                .then(|| registry.values(ctx))
                .flatten()
            else {
                warn!(
                    event = "payoff_objective",
                    objective = %objective.name,
                    ideal = sweep > 0.0,
                    status = %status,
                );
                continue;
            };
            debug!(
                event = "payoff_objective",
                objective = %objective.name,
                ideal = sweep > 0.0,
                value = values.get(&objective.name).copied(),
            );
            for (name, value) in values {
                table.observe(&name, value);
            }
        }
    }

    for (name, range) in table.iter() {
        debug!(event = "objective_range", objective = %name, lower = range.lower, upper = range.upper);
    }
    info!(
        event = "range_computed",
        objectives = registry.len(),
        observed = table.len(),
        strategy = ?strategy,
        duration_ms = start.elapsed().as_millis() as u64,
    );
    table
}

/// `sweep · sign·o` plus `sign_j · augmentation / width_j` on every other
/// objective with a known width.
fn set_payoff_objective(
    ctx: &mut ModelContext,
    registry: &ObjectiveRegistry,
    target: &RegisteredObjective,
    sweep: f64,
    augmentation: f64,
    previous: &RangeTable,
) {
    ctx.clear_objective();
    ctx.set_objective_coefficient(target.var, sweep * target.sign());
    if augmentation == 0.0 {
        return;
    }
    for other in registry.iter().filter(|o| o.name != target.name) {
        if let Some(width) = previous.width_if_known(&other.name) {
            ctx.add_objective_coefficient(other.var, other.sign() * augmentation / width);
        }
    }
}
