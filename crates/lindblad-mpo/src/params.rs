//! Solver parameter values and the ordered parameter map.
//!
//! A [`Parameters`] set is a flat mapping from parameter name to a loosely
//! typed [`ParamValue`]. The expected shape of each value depends on the key
//! and is enforced by [`crate::validate`], not by the type system, so that a
//! parameter file can be loaded first and then diagnosed as a whole.
//!
//! Insertion order is preserved: it is the order in which lines are written to
//! the solver input file.

use std::fmt;
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use ndarray::{Array1, Array2, ArrayD, Ix2};
use serde::Deserialize;

use crate::error::LindbladResult;

/// A single parameter value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawValue")]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// A (possibly nested) sequence, e.g. `[0, 2]`, `["x", "z"]` or `[[0, 1], [1, 2]]`.
    List(Vec<ParamValue>),
    /// A dense numeric array of any rank, stored row-major.
    Array(ArrayD<f64>),
}

/// Wire form accepted from YAML and JSON parameter files.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<RawValue>),
}

impl From<RawValue> for ParamValue {
    fn from(raw: RawValue) -> Self {
        match raw {
            RawValue::Bool(b) => ParamValue::Bool(b),
            RawValue::Int(i) => ParamValue::Int(i),
            RawValue::Float(f) => ParamValue::Float(f),
            RawValue::Str(s) => ParamValue::Str(s),
            RawValue::List(items) => ParamValue::List(items.into_iter().map(Into::into).collect()),
        }
    }
}

impl ParamValue {
    /// The value as an integer, if it is one. Floats are not coerced.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// The value as a real number. Integers are accepted wherever a float is.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ParamValue::Int(i) => Some(*i as f64),
            ParamValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ParamValue]> {
        match self {
            ParamValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// True for a scalar number (integer or float).
    pub fn is_number(&self) -> bool {
        self.as_number().is_some()
    }

    /// Empty strings act as placeholders and are ignored by validation.
    pub fn is_placeholder(&self) -> bool {
        matches!(self, ParamValue::Str(s) if s.is_empty())
    }

    /// Interpret the value as an index pair `(i, j)`.
    pub fn as_index_pair(&self) -> Option<(i64, i64)> {
        match self.as_list()? {
            [a, b] => Some((a.as_int()?, b.as_int()?)),
            _ => None,
        }
    }

    /// Interpret the value as a dense matrix: a rank-2 array, or a nested list
    /// of numeric rows of equal length.
    pub fn as_matrix(&self) -> Option<Array2<f64>> {
        match self {
            ParamValue::Array(a) => a
                .view()
                .into_dimensionality::<Ix2>()
                .ok()
                .map(|m| m.to_owned()),
            ParamValue::List(rows) => {
                let n_cols = rows.first()?.as_list()?.len();
                let mut flat = Vec::with_capacity(rows.len() * n_cols);
                for row in rows {
                    let row = row.as_list()?;
                    if row.len() != n_cols {
                        return None;
                    }
                    for v in row {
                        flat.push(v.as_number()?);
                    }
                }
                Array2::from_shape_vec((rows.len(), n_cols), flat).ok()
            }
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Int(i) => write!(f, "{i}"),
            ParamValue::Float(x) => write!(f, "{}", format_float(*x)),
            ParamValue::Str(s) => write!(f, "{s}"),
            ParamValue::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            ParamValue::Array(a) => {
                for (i, x) in a.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", format_float(*x))?;
                }
                Ok(())
            }
        }
    }
}

/// Format a float the way the solver's parser expects it: shortest
/// round-trip digits, always with a decimal point or exponent.
pub fn format_float(x: f64) -> String {
    format!("{x:?}")
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Bool(b)
    }
}

impl From<i32> for ParamValue {
    fn from(i: i32) -> Self {
        ParamValue::Int(i64::from(i))
    }
}

impl From<i64> for ParamValue {
    fn from(i: i64) -> Self {
        ParamValue::Int(i)
    }
}

impl From<u32> for ParamValue {
    fn from(i: u32) -> Self {
        ParamValue::Int(i64::from(i))
    }
}

impl From<usize> for ParamValue {
    fn from(i: usize) -> Self {
        ParamValue::Int(i as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(x: f64) -> Self {
        ParamValue::Float(x)
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Str(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Str(s)
    }
}

impl From<(usize, usize)> for ParamValue {
    fn from((i, j): (usize, usize)) -> Self {
        ParamValue::List(vec![i.into(), j.into()])
    }
}

impl From<(i32, i32)> for ParamValue {
    fn from((i, j): (i32, i32)) -> Self {
        ParamValue::List(vec![i.into(), j.into()])
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(items: Vec<T>) -> Self {
        ParamValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<Array1<f64>> for ParamValue {
    fn from(a: Array1<f64>) -> Self {
        ParamValue::Array(a.into_dyn())
    }
}

impl From<Array2<f64>> for ParamValue {
    fn from(a: Array2<f64>) -> Self {
        ParamValue::Array(a.into_dyn())
    }
}

impl From<ArrayD<f64>> for ParamValue {
    fn from(a: ArrayD<f64>) -> Self {
        ParamValue::Array(a)
    }
}

/// An ordered set of solver parameters.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Parameters(IndexMap<String, ParamValue>);

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a parameter. A replaced key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.0.shift_remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Numeric value of a key, accepting integers.
    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(ParamValue::as_number)
    }

    /// Number of sites, if `N` is present and an integer.
    pub fn num_sites(&self) -> Option<i64> {
        self.get("N").and_then(ParamValue::as_int)
    }

    /// Parse a YAML mapping of parameters.
    pub fn from_yaml_str(source: &str) -> LindbladResult<Self> {
        Ok(serde_yaml_ng::from_str(source)?)
    }

    /// Parse a JSON object of parameters.
    pub fn from_json_str(source: &str) -> LindbladResult<Self> {
        Ok(serde_json::from_str(source)?)
    }

    /// Load parameters from a `.json`, `.yaml` or `.yml` file. Unknown
    /// extensions are read as YAML.
    pub fn from_path(path: impl AsRef<Path>) -> LindbladResult<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext.to_lowercase().as_str() {
            "json" => Self::from_json_str(&source),
            _ => Self::from_yaml_str(&source),
        }
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
