//! Linear expressions over model variables.

use std::collections::BTreeMap;

use super::VarId;

/// Σ coefficient · variable + constant.
///
/// Terms may repeat; they are merged when the expression is added to a
/// model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: Vec<(VarId, f64)>,
    constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    /// `coefficient · var`.
    pub fn term(var: VarId, coefficient: f64) -> Self {
        Self {
            terms: vec![(var, coefficient)],
            constant: 0.0,
        }
    }

    pub fn with_term(mut self, var: VarId, coefficient: f64) -> Self {
        self.add_term(var, coefficient);
        self
    }

    pub fn add_term(&mut self, var: VarId, coefficient: f64) {
        self.terms.push((var, coefficient));
    }

    pub fn add_constant(&mut self, value: f64) {
        self.constant += value;
    }

    /// Adds `scale · other` to this expression.
    pub fn add_scaled(&mut self, other: &LinearExpr, scale: f64) {
        self.terms
            .extend(other.terms.iter().map(|(var, c)| (*var, c * scale)));
        self.constant += other.constant * scale;
    }

    /// Multiplies every term and the constant by `factor`.
    pub fn scale(&mut self, factor: f64) {
        for (_, c) in &mut self.terms {
            *c *= factor;
        }
        self.constant *= factor;
    }

    pub fn constant(&self) -> f64 {
        self.constant
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Terms with duplicates summed and zero coefficients dropped.
    pub fn merged_terms(&self) -> BTreeMap<VarId, f64> {
        let mut merged = BTreeMap::new();
        for (var, c) in &self.terms {
            *merged.entry(*var).or_insert(0.0) += c;
        }
        merged.retain(|_, c| *c != 0.0);
        merged
    }

    /// Evaluates the expression against a value lookup.
    pub fn evaluate(&self, value_of: impl Fn(VarId) -> f64) -> f64 {
        self.terms
            .iter()
            .map(|(var, c)| c * value_of(*var))
            .sum::<f64>()
            + self.constant
    }
}
