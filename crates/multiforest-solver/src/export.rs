//! Solution and range-table persistence.
//!
//! Allocations and objective values are written as CSV, range tables as
//! JSON. Every writer has a matching reader.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use multiforest_core::{
    MultiforestError, PanelStore, RangeTable, RegimeId, Result, StandId, Year,
};
use serde::{Deserialize, Serialize};

use crate::allocator::DecisionVariables;
use crate::model::ModelContext;
use crate::objectives::ObjectiveRegistry;

/// Share of a stand managed with a regime, repeated for each period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRow {
    pub stand: StandId,
    pub period: Year,
    pub regime: RegimeId,
    pub fraction: f64,
}

/// A solved plan: the chosen regimes and the objective values they reach.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolutionExport {
    pub allocations: Vec<AllocationRow>,
    pub objective_values: BTreeMap<String, f64>,
}

impl SolutionExport {
    /// Reads the last optimal solution of `ctx`. Decisions with a share at
    /// or below `tolerance` are left out.
    pub(crate) fn collect(
        ctx: &ModelContext,
        panel: &dyn PanelStore,
        decisions: &DecisionVariables,
        registry: &ObjectiveRegistry,
        tolerance: f64,
    ) -> Result<Self> {
        let missing = || MultiforestError::InvalidState("no optimal solution to export".to_string());
        let mut allocations = Vec::new();
        for decision in decisions.iter() {
            let fraction = ctx.value(decision.var).ok_or_else(missing)?;
            if fraction <= tolerance {
                continue;
            }
            for period in panel.periods() {
                allocations.push(AllocationRow {
                    stand: decision.stand.clone(),
                    period: *period,
                    regime: decision.regime.clone(),
                    fraction,
                });
            }
        }
        let objective_values = registry.values(ctx).ok_or_else(missing)?;
        Ok(Self {
            allocations,
            objective_values,
        })
    }

    pub fn write_allocations_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        for row in &self.allocations {
            writer.serialize(row).map_err(csv_error)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn write_objective_values_csv<W: Write>(&self, writer: W) -> Result<()> {
        write_objective_values_csv(&self.objective_values, writer)
    }

    /// Writes `allocations.csv` and `objective_values.csv` into `dir`.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        self.write_allocations_csv(File::create(dir.join("allocations.csv"))?)?;
        self.write_objective_values_csv(File::create(dir.join("objective_values.csv"))?)
    }
}

pub fn read_allocations_csv<R: Read>(reader: R) -> Result<Vec<AllocationRow>> {
    csv::Reader::from_reader(reader)
        .deserialize()
        .map(|row| row.map_err(csv_error))
        .collect()
}

/// One header row of objective names, one row of values.
pub fn write_objective_values_csv<W: Write>(values: &BTreeMap<String, f64>, writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(values.keys()).map_err(csv_error)?;
    writer
        .write_record(values.values().map(|v| v.to_string()))
        .map_err(csv_error)?;
    writer.flush()?;
    Ok(())
}

pub fn read_objective_values_csv<R: Read>(reader: R) -> Result<BTreeMap<String, f64>> {
    let mut reader = csv::Reader::from_reader(reader);
    let names = reader.headers().map_err(csv_error)?.clone();
    let Some(record) = reader.records().next() else {
        return Err(MultiforestError::Serialization(
            "objective value table has no value row".to_string(),
        ));
    };
    let record = record.map_err(csv_error)?;
    names
        .iter()
        .zip(record.iter())
        .map(|(name, value)| {
            let value = value.trim().parse::<f64>().map_err(|e| {
                MultiforestError::Serialization(format!("objective '{name}': {e}"))
            })?;
            Ok((name.to_string(), value))
        })
        .collect()
}

pub fn write_ranges_json<W: Write>(ranges: &RangeTable, writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, ranges).map_err(json_error)
}

pub fn read_ranges_json<R: Read>(reader: R) -> Result<RangeTable> {
    serde_json::from_reader(reader).map_err(json_error)
}

pub fn save_ranges(ranges: &RangeTable, path: impl AsRef<Path>) -> Result<()> {
    write_ranges_json(ranges, File::create(path)?)
}

pub fn load_ranges(path: impl AsRef<Path>) -> Result<RangeTable> {
    read_ranges_json(File::open(path)?)
}

fn csv_error(e: csv::Error) -> MultiforestError {
    MultiforestError::Serialization(e.to_string())
}

fn json_error(e: serde_json::Error) -> MultiforestError {
    MultiforestError::Serialization(e.to_string())
}
