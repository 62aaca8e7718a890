//! Hyperparameter grids

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Result, TabClassError};

/// A single hyperparameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Float(f64),
    Int(i64),
    Str(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Str(v) => write!(f, "{}", v),
        }
    }
}

/// One point of the grid: parameter name to value.
pub type ParamSet = BTreeMap<String, ParamValue>;

/// Typed accessors used when constructing estimators from a grid point.
pub trait ParamSetExt {
    fn get_f64(&self, name: &str) -> Result<f64>;
    fn get_usize(&self, name: &str) -> Result<usize>;
    fn get_str(&self, name: &str) -> Result<&str>;
}

impl ParamSetExt for ParamSet {
    fn get_f64(&self, name: &str) -> Result<f64> {
        match self.get(name) {
            Some(ParamValue::Float(v)) => Ok(*v),
            Some(ParamValue::Int(v)) => Ok(*v as f64),
            other => Err(param_error(name, other, "expected a float")),
        }
    }

    fn get_usize(&self, name: &str) -> Result<usize> {
        match self.get(name) {
            Some(ParamValue::Int(v)) if *v >= 0 => Ok(*v as usize),
            other => Err(param_error(name, other, "expected a non-negative integer")),
        }
    }

    fn get_str(&self, name: &str) -> Result<&str> {
        match self.get(name) {
            Some(ParamValue::Str(v)) => Ok(v.as_str()),
            other => Err(param_error(name, other, "expected a string")),
        }
    }
}

fn param_error(name: &str, value: Option<&ParamValue>, reason: &str) -> TabClassError {
    TabClassError::InvalidParameter {
        name: name.to_string(),
        value: value.map(|v| v.to_string()).unwrap_or_else(|| "<missing>".to_string()),
        reason: reason.to_string(),
    }
}

/// Fixed hyperparameter grid for one candidate model.
///
/// `expand` produces the full cartesian product in declaration order, so
/// combination order is stable across runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamGrid {
    entries: Vec<(String, Vec<ParamValue>)>,
}

impl ParamGrid {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn add(mut self, name: &str, values: Vec<ParamValue>) -> Self {
        self.entries.push((name.to_string(), values));
        self
    }

    pub fn floats(self, name: &str, values: &[f64]) -> Self {
        self.add(name, values.iter().map(|&v| ParamValue::Float(v)).collect())
    }

    pub fn ints(self, name: &str, values: &[i64]) -> Self {
        self.add(name, values.iter().map(|&v| ParamValue::Int(v)).collect())
    }

    pub fn strs(self, name: &str, values: &[&str]) -> Self {
        self.add(
            name,
            values.iter().map(|v| ParamValue::Str(v.to_string())).collect(),
        )
    }

    /// Number of combinations in the grid.
    pub fn len(&self) -> usize {
        self.entries.iter().map(|(_, v)| v.len()).product()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Expand into every parameter combination.
    pub fn expand(&self) -> Vec<ParamSet> {
        let mut combos: Vec<ParamSet> = vec![ParamSet::new()];

        for (name, values) in &self.entries {
            let mut next = Vec::with_capacity(combos.len() * values.len());
            for combo in &combos {
                for value in values {
                    let mut extended = combo.clone();
                    extended.insert(name.clone(), value.clone());
                    next.push(extended);
                }
            }
            combos = next;
        }

        combos
    }
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self::new()
    }
}

/// Render a parameter set for logs.
pub fn format_params(params: &ParamSet) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_cartesian_product() {
        let grid = ParamGrid::new()
            .floats("C", &[0.1, 1.0])
            .strs("kernel", &["linear", "rbf"]);

        let combos = grid.expand();
        assert_eq!(combos.len(), 4);
        assert_eq!(grid.len(), 4);

        assert_eq!(combos[0].get_f64("C").unwrap(), 0.1);
        assert_eq!(combos[0].get_str("kernel").unwrap(), "linear");
        assert_eq!(combos[3].get_f64("C").unwrap(), 1.0);
        assert_eq!(combos[3].get_str("kernel").unwrap(), "rbf");
    }

    #[test]
    fn test_single_entry_grid() {
        let grid = ParamGrid::new().ints("n_estimators", &[50, 100]);
        let combos = grid.expand();

        assert_eq!(combos.len(), 2);
        assert_eq!(combos[0].get_usize("n_estimators").unwrap(), 50);
    }

    #[test]
    fn test_missing_param_is_an_error() {
        let grid = ParamGrid::new().floats("C", &[1.0]);
        let combo = &grid.expand()[0];
        assert!(combo.get_str("kernel").is_err());
    }

    #[test]
    fn test_format_params() {
        let grid = ParamGrid::new().floats("C", &[0.1]);
        let combo = &grid.expand()[0];
        assert_eq!(format_params(combo), "C=0.1");
    }
}
