//! Test utilities for multiforest-solver
//!
//! Builds models from the `multiforest-test` fixtures and solves the
//! payoff sweep so scalarization tests can start from known ranges.

use multiforest_config::RangeStrategy;
use multiforest_core::{ObjectiveDefinition, PanelStore, RangeTable};

use crate::allocator::DecisionVariables;
use crate::model::{MicroLpBackend, ModelContext};
use crate::objectives::ObjectiveRegistry;
use crate::payoff::compute_ranges;

pub use multiforest_test::scenario::sum_deadwood;
pub use multiforest_test::{assert_close, sum_volume, three_stand_panel};

/// A model with decisions and the given objectives registered.
pub struct TestModel {
    pub ctx: ModelContext,
    pub decisions: DecisionVariables,
    pub registry: ObjectiveRegistry,
}

impl TestModel {
    pub fn new(panel: &dyn PanelStore, definitions: &[ObjectiveDefinition]) -> Self {
        let mut ctx = ModelContext::new();
        let mut decisions = DecisionVariables::allocate(&mut ctx, panel).unwrap();
        let mut registry = ObjectiveRegistry::new();
        for definition in definitions {
            registry
                .register(&mut ctx, panel, &mut decisions, definition)
                .unwrap();
        }
        Self {
            ctx,
            decisions,
            registry,
        }
    }

    /// Ranges from the default strategy without augmentation.
    pub fn ranges(&mut self) -> RangeTable {
        compute_ranges(
            &mut self.ctx,
            &MicroLpBackend,
            &self.registry,
            RangeStrategy::Extremes,
            0.0,
            &RangeTable::new(),
        )
    }
}

/// `Sum_volume` and `Sum_deadwood` on the three-stand panel.
pub fn volume_and_deadwood() -> TestModel {
    TestModel::new(&three_stand_panel(), &[sum_volume(), sum_deadwood()])
}
