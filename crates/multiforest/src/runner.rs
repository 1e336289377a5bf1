//! Problem entry points that hide the manager wiring.

use std::path::Path;

use multiforest_config::{ConfigError, ProblemConfig};
use multiforest_core::{MultiforestError, PanelStore, Result};
use multiforest_solver::{MultifunctionalityOutcome, SolverManager};
use tracing::info;

/// Reads a TOML or YAML problem file and registers it on a new manager.
///
/// The returned manager is in `RangesPending`.
pub fn load_problem<P: PanelStore>(panel: P, path: impl AsRef<Path>) -> Result<SolverManager<P>> {
    let path = path.as_ref();
    let config = ProblemConfig::load(path).map_err(config_error)?;
    info!(
        event = "problem_loaded",
        path = %path.display(),
        objectives = config.objectives.len(),
        constraints = config.constraints.len(),
        groups = config.groups.len(),
    );
    SolverManager::from_config(panel, &config)
}

/// Registers `config`, computes the ranges and maximizes the
/// multifunctionality index of the configured groups.
///
/// # Errors
///
/// `InvalidDefinition` when `config` has no groups, plus anything the
/// registration or the solve reports.
pub fn run_multifunctionality<P: PanelStore>(
    panel: P,
    config: &ProblemConfig,
) -> Result<(SolverManager<P>, MultifunctionalityOutcome)> {
    config.validate().map_err(config_error)?;
    let mut manager = SolverManager::from_config(panel, config)?;
    manager.compute_objective_ranges()?;
    let outcome = manager.solve_multifunctionality(&config.groups)?;
    Ok((manager, outcome))
}

fn config_error(e: ConfigError) -> MultiforestError {
    match e {
        ConfigError::Io(e) => MultiforestError::Io(e),
        ConfigError::Policy(e) => e,
        other => MultiforestError::InvalidDefinition(other.to_string()),
    }
}
