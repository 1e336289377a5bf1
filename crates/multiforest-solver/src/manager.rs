//! The solver manager.
//!
//! [`SolverManager`] owns the model, the panel, the LP backend and every
//! builder, and walks through a fixed lifecycle:
//!
//! ```text
//! Unbuilt ──register_objectives──▶ RangesPending ──compute/load ranges──▶ RangesReady
//!                                        ▲                                   │  ▲
//!                         register more objectives               optimal solve │  │ non-optimal solve
//!                                        │                                   ▼  │
//!                                        └─────────────────────────────── Solved
//! ```
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//!
//! use multiforest_config::SolverSettings;
//! use multiforest_core::{Direction, ObjectiveDefinition, PanelBuilder, StandAggregation, YearAggregation};
//! use multiforest_solver::{ManagerState, SolverManager};
//!
//! let panel = PanelBuilder::new()
//!     .stand("s1", 10.0)
//!     .cell("s1", 2016, "A", &[("volume", 1.0)])
//!     .cell("s1", 2016, "B", &[("volume", 2.0)])
//!     .build()
//!     .unwrap();
//! let volume = ObjectiveDefinition::new(
//!     "Sum_volume",
//!     "volume",
//!     Direction::Max,
//!     YearAggregation::Sum,
//!     StandAggregation::AreaWeightedSum,
//! );
//!
//! let mut manager = SolverManager::new(panel, SolverSettings::default());
//! manager.register_objectives(&[volume]).unwrap();
//! let ranges = manager.compute_objective_ranges().unwrap();
//! assert_eq!(ranges.get("Sum_volume").unwrap().upper, 20.0);
//!
//! let targets = BTreeMap::from([("Sum_volume".to_string(), 15.0)]);
//! let outcome = manager.solve_epsilon_constraint(&targets).unwrap();
//! assert!(outcome.is_optimal());
//! assert_eq!(manager.state(), ManagerState::Solved);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use multiforest_config::{ProblemConfig, SolverSettings};
use multiforest_core::{
    ConstraintDefinition, DemandTargets, MultiforestError, ObjectiveDefinition, PanelStore,
    RangeTable, Result, ServiceGroup,
};
use tracing::info;

use crate::allocator::DecisionVariables;
use crate::demand::{register_demand, DemandFlows};
use crate::export::SolutionExport;
use crate::model::{LpBackend, MicroLpBackend, ModelContext};
use crate::multifunctionality::{Multifunctionality, MultifunctionalityOutcome};
use crate::objectives::ObjectiveRegistry;
use crate::payoff::compute_ranges;
use crate::policy::PolicyConstraints;
use crate::scalarize::{EpsilonConstraints, ReferencePoint, SolveOutcome};

/// Lifecycle state of a [`SolverManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ManagerState {
    /// No objective registered yet.
    Unbuilt,
    /// Objectives exist but ranges are missing or stale.
    RangesPending,
    /// Ranges are known; scalarized solves are allowed.
    RangesReady,
    /// The last scalarized solve was optimal; the plan can be exported.
    Solved,
}

impl fmt::Display for ManagerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManagerState::Unbuilt => write!(f, "Unbuilt"),
            ManagerState::RangesPending => write!(f, "RangesPending"),
            ManagerState::RangesReady => write!(f, "RangesReady"),
            ManagerState::Solved => write!(f, "Solved"),
        }
    }
}

/// Entry point for building and solving a forest-planning problem.
pub struct SolverManager<P, B = MicroLpBackend> {
    panel: P,
    backend: B,
    settings: SolverSettings,
    ctx: ModelContext,
    decisions: Option<DecisionVariables>,
    registry: ObjectiveRegistry,
    policies: PolicyConstraints,
    demand: Vec<DemandFlows>,
    epsilon: EpsilonConstraints,
    reference: ReferencePoint,
    multifunctionality: Multifunctionality,
    ranges: RangeTable,
    state: ManagerState,
}

impl<P: PanelStore> SolverManager<P> {
    /// Creates a manager solving with [`MicroLpBackend`].
    pub fn new(panel: P, settings: SolverSettings) -> Self {
        Self::with_backend(panel, MicroLpBackend, settings)
    }

    /// Creates a manager and registers everything `config` describes:
    /// objectives (with their initial values), demand targets, then policy
    /// constraints.
    pub fn from_config(panel: P, config: &ProblemConfig) -> Result<Self> {
        let mut manager = Self::new(panel, config.settings);
        manager.register_objectives(&config.resolved_objectives())?;
        if let Some(demand) = &config.demand {
            manager.register_demand_targets(demand)?;
        }
        if !config.constraints.is_empty() {
            manager.register_constraints(&config.constraints)?;
        }
        Ok(manager)
    }
}

impl<P: PanelStore, B: LpBackend> SolverManager<P, B> {
    pub fn with_backend(panel: P, backend: B, settings: SolverSettings) -> Self {
        Self {
            panel,
            backend,
            settings,
            ctx: ModelContext::new(),
            decisions: None,
            registry: ObjectiveRegistry::new(),
            policies: PolicyConstraints::new(settings.sentinel),
            demand: Vec::new(),
            epsilon: EpsilonConstraints::new(),
            reference: ReferencePoint::new(),
            multifunctionality: Multifunctionality::new(),
            ranges: RangeTable::new(),
            state: ManagerState::Unbuilt,
        }
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    /// Registers objectives, allocating the decision variables on the
    /// first call.
    ///
    /// Every definition is validated and checked against the panel before
    /// any row is built. If a later failure still stops the batch, the
    /// objectives built before it stay registered and the state moves on
    /// as if the batch had been shorter.
    pub fn register_objectives(&mut self, definitions: &[ObjectiveDefinition]) -> Result<()> {
        for (i, definition) in definitions.iter().enumerate() {
            self.registry.check(&self.panel, definition)?;
            if definitions[..i].iter().any(|d| d.name == definition.name) {
                return Err(MultiforestError::DuplicateObjective(definition.name.clone()));
            }
        }
        if self.decisions.is_none() {
            self.decisions = Some(DecisionVariables::allocate(&mut self.ctx, &self.panel)?);
        }
        let decisions = built(&mut self.decisions, "register objectives")?;
        let before = self.registry.len();
        let result = definitions.iter().try_for_each(|definition| {
            self.registry
                .register(&mut self.ctx, &self.panel, decisions, definition)
        });
        if self.registry.len() > before {
            self.transition(ManagerState::RangesPending);
        }
        result
    }

    /// Registers demand targets as objectives.
    pub fn register_demand_targets(&mut self, targets: &DemandTargets) -> Result<()> {
        let decisions = built(&mut self.decisions, "register demand targets")?;
        let flows = register_demand(
            &mut self.ctx,
            &self.panel,
            decisions,
            &mut self.registry,
            targets,
        )?;
        self.demand.push(flows);
        self.transition(ManagerState::RangesPending);
        Ok(())
    }

    /// Builds policy constraints in their initial enabled state.
    pub fn register_constraints(&mut self, definitions: &[ConstraintDefinition]) -> Result<()> {
        let decisions = built(&mut self.decisions, "register constraints")?;
        for definition in definitions {
            self.policies
                .register(&mut self.ctx, &self.panel, decisions, definition)?;
        }
        Ok(())
    }

    /// Switches a registered policy constraint on or off.
    pub fn set_constraint_enabled(&mut self, name: &str, enabled: bool) -> Result<()> {
        if self.policies.is_empty() {
            return Err(MultiforestError::InvalidState(format!(
                "cannot toggle '{name}': no constraints registered"
            )));
        }
        self.policies.set_enabled(&mut self.ctx, name, enabled)
    }

    // ------------------------------------------------------------------
    // Ranges
    // ------------------------------------------------------------------

    /// Runs the payoff sweep and stores the resulting range table.
    pub fn compute_objective_ranges(&mut self) -> Result<&RangeTable> {
        self.require_at_least(ManagerState::RangesPending, "compute objective ranges")?;
        self.ranges = compute_ranges(
            &mut self.ctx,
            &self.backend,
            &self.registry,
            self.settings.range_strategy,
            self.settings.augmentation,
            &self.ranges,
        );
        self.transition(ManagerState::RangesReady);
        Ok(&self.ranges)
    }

    /// Uses a range table computed earlier, e.g. read back from JSON.
    ///
    /// # Errors
    ///
    /// `RangeNotComputed` if the table lacks a registered objective.
    pub fn load_objective_ranges(&mut self, ranges: RangeTable) -> Result<()> {
        self.require_at_least(ManagerState::RangesPending, "load objective ranges")?;
        if let Some(missing) = self.registry.names().find(|name| !ranges.contains(name)) {
            return Err(MultiforestError::RangeNotComputed(missing.to_string()));
        }
        info!(event = "ranges_loaded", objectives = ranges.len());
        self.ranges = ranges;
        self.transition(ManagerState::RangesReady);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Scalarized solves
    // ------------------------------------------------------------------

    /// Bounds the targeted objectives and optimizes the others.
    pub fn solve_epsilon_constraint(&mut self, targets: &BTreeMap<String, f64>) -> Result<SolveOutcome> {
        self.require_ranges()?;
        let outcome = self.epsilon.solve(
            &mut self.ctx,
            &self.backend,
            &self.registry,
            &self.ranges,
            targets,
            self.settings.augmentation,
        )?;
        self.after_solve(outcome.is_optimal());
        Ok(outcome)
    }

    /// Relaxes every epsilon bound set so far.
    pub fn reset_epsilon_constraints(&mut self) {
        self.epsilon.reset(&mut self.ctx);
    }

    /// Achievement-scalarizing solve around the aspiration levels.
    pub fn solve_reference_point(&mut self, reference: &BTreeMap<String, f64>) -> Result<SolveOutcome> {
        self.require_ranges()?;
        let outcome = self.reference.solve(
            &mut self.ctx,
            &self.backend,
            &self.registry,
            &self.ranges,
            reference,
            self.settings.augmentation,
        )?;
        self.after_solve(outcome.is_optimal());
        Ok(outcome)
    }

    /// Maximizes the multifunctionality index of `groups`.
    pub fn solve_multifunctionality(&mut self, groups: &[ServiceGroup]) -> Result<MultifunctionalityOutcome> {
        self.require_ranges()?;
        let outcome = self.multifunctionality.solve(
            &mut self.ctx,
            &self.backend,
            &self.registry,
            &self.ranges,
            groups,
            self.settings.augmentation,
        )?;
        self.after_solve(outcome.outcome.is_optimal());
        Ok(outcome)
    }

    /// The allocation and objective values of the last optimal solve.
    pub fn export_solution(&self) -> Result<SolutionExport> {
        if self.state != ManagerState::Solved {
            return Err(MultiforestError::InvalidState(format!(
                "cannot export in state {}",
                self.state
            )));
        }
        let Some(decisions) = &self.decisions else {
            return Err(MultiforestError::InvalidState("decisions not allocated".to_string()));
        };
        SolutionExport::collect(
            &self.ctx,
            &self.panel,
            decisions,
            &self.registry,
            self.settings.zero_tolerance,
        )
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn state(&self) -> ManagerState {
        self.state
    }

    pub fn ranges(&self) -> &RangeTable {
        &self.ranges
    }

    pub fn objectives(&self) -> &ObjectiveRegistry {
        &self.registry
    }

    pub fn constraints(&self) -> &PolicyConstraints {
        &self.policies
    }

    pub fn demand_flows(&self) -> &[DemandFlows] {
        &self.demand
    }

    pub fn decisions(&self) -> Option<&DecisionVariables> {
        self.decisions.as_ref()
    }

    pub fn model(&self) -> &ModelContext {
        &self.ctx
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }

    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    // ------------------------------------------------------------------
    // State handling
    // ------------------------------------------------------------------

    fn transition(&mut self, next: ManagerState) {
        if self.state != next {
            info!(event = "state_changed", from = %self.state, to = %next);
            self.state = next;
        }
    }

    fn after_solve(&mut self, optimal: bool) {
        self.transition(if optimal {
            ManagerState::Solved
        } else {
            ManagerState::RangesReady
        });
    }

    fn require_at_least(&self, state: ManagerState, action: &str) -> Result<()> {
        if self.state < state {
            return Err(MultiforestError::InvalidState(format!(
                "cannot {action} in state {}",
                self.state
            )));
        }
        Ok(())
    }

    fn require_ranges(&self) -> Result<()> {
        match self.state {
            ManagerState::Unbuilt => Err(MultiforestError::InvalidState(
                "no objectives registered".to_string(),
            )),
            ManagerState::RangesPending => Err(MultiforestError::RangeNotComputed(
                "objective ranges are missing or stale".to_string(),
            )),
            ManagerState::RangesReady | ManagerState::Solved => Ok(()),
        }
    }
}

fn built<'a>(
    decisions: &'a mut Option<DecisionVariables>,
    action: &str,
) -> Result<&'a mut DecisionVariables> {
    decisions.as_mut().ok_or_else(|| {
        MultiforestError::InvalidState(format!("cannot {action} before objectives"))
    })
}
