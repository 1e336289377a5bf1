//! Decision variables: one fractional share per feasible (stand, regime).

use std::collections::{BTreeSet, HashMap};

use multiforest_core::{MultiforestError, PanelStore, RegimeId, Result, StandId, Year};
use tracing::{debug, info, warn};

use crate::model::{LinearExpr, ModelContext, RowId, VarId};

/// Share of a stand managed with a regime.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub stand: StandId,
    pub regime: RegimeId,
    pub var: VarId,
}

/// All decision variables of a model plus their exclusivity rows.
///
/// A regime is feasible for a stand when the panel has a cell for the
/// first period. Every stand gets the row `Σ x = 1` over its feasible
/// regimes.
#[derive(Debug, Default)]
pub struct DecisionVariables {
    decisions: Vec<Decision>,
    index: HashMap<(StandId, RegimeId), usize>,
    exclusivity: Vec<RowId>,
    closed: BTreeSet<VarId>,
}

impl DecisionVariables {
    /// Creates the decision variables and exclusivity rows.
    ///
    /// # Errors
    ///
    /// `MissingData` when the panel has no periods, a stand has no area, or
    /// a stand has no feasible regime.
    pub fn allocate(ctx: &mut ModelContext, panel: &dyn PanelStore) -> Result<Self> {
        let first = *panel.periods().first().ok_or_else(|| {
            MultiforestError::MissingData("panel has no planning periods".to_string())
        })?;

        let mut allocated = Self::default();
        for stand in panel.stands() {
            if panel.area(stand).is_none() {
                return Err(MultiforestError::MissingData(format!(
                    "stand '{stand}' has no area"
                )));
            }
            let mut exclusive = LinearExpr::new();
            for regime in panel.regimes() {
                if !panel.has_cell(stand, first, regime) {
                    continue;
                }
                let var = ctx.add_variable(format!("x:{stand}:{regime}"), 0.0, 1.0);
                exclusive.add_term(var, 1.0);
                allocated
                    .index
                    .insert((stand.clone(), regime.clone()), allocated.decisions.len());
                allocated.decisions.push(Decision {
                    stand: stand.clone(),
                    regime: regime.clone(),
                    var,
                });
            }
            if exclusive.is_empty() {
                return Err(MultiforestError::MissingData(format!(
                    "stand '{stand}' has no regime available in period {first}"
                )));
            }
            let row = ctx.add_equality(format!("exclusive:{stand}"), &exclusive, 1.0)?;
            allocated.exclusivity.push(row);
        }

        info!(
            event = "decisions_allocated",
            stands = panel.stands().len(),
            decisions = allocated.decisions.len(),
        );
        Ok(allocated)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Decision> {
        self.decisions.iter()
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    pub fn get(&self, stand: &StandId, regime: &RegimeId) -> Option<VarId> {
        self.index
            .get(&(stand.clone(), regime.clone()))
            .map(|i| self.decisions[*i].var)
    }

    /// Decisions of one stand.
    pub fn for_stand<'a>(&'a self, stand: &'a StandId) -> impl Iterator<Item = &'a Decision> {
        self.decisions.iter().filter(move |d| &d.stand == stand)
    }

    pub fn exclusivity_rows(&self) -> &[RowId] {
        &self.exclusivity
    }

    pub fn is_closed(&self, var: VarId) -> bool {
        self.closed.contains(&var)
    }

    /// Forces a decision to zero because its regime has no cell in `period`.
    ///
    /// Returns `false` if it was closed already.
    fn close(&mut self, ctx: &mut ModelContext, position: usize, period: Year) -> bool {
        let decision = &self.decisions[position];
        if !self.closed.insert(decision.var) {
            return false;
        }
        ctx.set_variable_upper(decision.var, 0.0);
        warn!(
            event = "decision_closed",
            stand = %decision.stand,
            regime = %decision.regime,
            period,
        );
        true
    }

    /// Closes every open decision whose regime lacks a cell in `period`.
    pub(crate) fn close_missing(
        &mut self,
        ctx: &mut ModelContext,
        panel: &dyn PanelStore,
        period: Year,
    ) {
        let missing: Vec<usize> = self
            .decisions
            .iter()
            .enumerate()
            .filter(|(_, d)| !self.closed.contains(&d.var))
            .filter(|(_, d)| !panel.has_cell(&d.stand, period, &d.regime))
            .map(|(i, _)| i)
            .collect();
        if !missing.is_empty() {
            debug!(event = "missing_cells", period, count = missing.len());
        }
        for position in missing {
            self.close(ctx, position, period);
        }
    }
}
