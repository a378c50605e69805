//! Parameter validation against the solver's schema.
//!
//! Every recognized parameter key maps to a [`Rule`] in [`SCHEMA`]. Validation
//! walks the whole parameter set and collects one [`ParamIssue`] per problem,
//! so that a user sees every mistake in a file at once. The only early exit is
//! a missing required key (`N`, `t_final`, `tau`).
//!
//! Callers that accept extra keys of their own (for instance a wrapper that
//! derives solver parameters from a higher-level model) pass a [`RuleSet`]
//! that adds or overrides rules, or lists keys to be ignored.

use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

use crate::error::{LindbladError, LindbladResult};
use crate::params::{ParamValue, Parameters};

/// Keys without a default value in the solver.
pub const REQUIRED_KEYS: [&str; 3] = ["N", "t_final", "tau"];

/// Allowed initial single-site states.
pub const PAULI_STATES: &[&[&str]] = &[&["+x"], &["-x"], &["+y"], &["-y"], &["+z"], &["-z"]];

/// Allowed single-site observable components.
pub const ONE_QUBIT_COMPONENTS: &[&[&str]] = &[&["x"], &["y"], &["z"]];

/// Allowed two-site observable components. Tokens in one group are equivalent.
pub const TWO_QUBIT_COMPONENTS: &[&[&str]] = &[
    &["xx"],
    &["yy"],
    &["zz"],
    &["xy", "yx"],
    &["xz", "zx"],
    &["yz", "zy"],
];

/// Validation rule for one parameter key.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// An integer in `min..=max`.
    Integer { min: i64, max: i64 },
    /// A real number; integers are accepted.
    Float { strictly_positive: bool },
    /// A scalar, an `N`-element list, or a one-dimensional array of length `N`.
    PerSiteVector,
    /// A scalar, or an `N x N` nested list or array.
    CouplingMatrix,
    /// A list of tokens drawn from `vocabulary`, compared case-insensitively.
    EnumList {
        vocabulary: &'static [&'static [&'static str]],
        max_len: Option<usize>,
        /// Each vocabulary group may be selected at most once.
        unique: bool,
        /// A bare string is accepted as a one-element list.
        allow_scalar: bool,
    },
    /// Distinct site indices in `0..N`, at most `N` of them.
    IndexList,
    /// Distinct pairs of site indices in `0..N`, at most `N^2` of them.
    IndexPairList,
    /// A literal boolean.
    Bool,
    Str { forbid_newline: bool },
}

const NON_NEGATIVE: Rule = Rule::Integer {
    min: 0,
    max: i64::MAX,
};

const ANY_FLOAT: Rule = Rule::Float {
    strictly_positive: false,
};

const POSITIVE_FLOAT: Rule = Rule::Float {
    strictly_positive: true,
};

const PLAIN_STR: Rule = Rule::Str {
    forbid_newline: false,
};

/// The solver's recognized parameters.
pub static SCHEMA: &[(&str, Rule)] = &[
    (
        "N",
        Rule::Integer {
            min: 1,
            max: i64::MAX,
        },
    ),
    ("t_init", ANY_FLOAT),
    ("t_final", POSITIVE_FLOAT),
    ("tau", POSITIVE_FLOAT),
    ("l_x", NON_NEGATIVE),
    ("l_y", NON_NEGATIVE),
    ("output_step", NON_NEGATIVE),
    ("force_rho_hermitian_step", NON_NEGATIVE),
    ("h_x", Rule::PerSiteVector),
    ("h_y", Rule::PerSiteVector),
    ("h_z", Rule::PerSiteVector),
    ("g_0", Rule::PerSiteVector),
    ("g_1", Rule::PerSiteVector),
    ("g_2", Rule::PerSiteVector),
    ("J", Rule::CouplingMatrix),
    ("J_z", Rule::CouplingMatrix),
    (
        "init_pauli_state",
        Rule::EnumList {
            vocabulary: PAULI_STATES,
            max_len: None,
            unique: false,
            allow_scalar: true,
        },
    ),
    ("init_graph_state", Rule::IndexPairList),
    ("b_periodic_x", Rule::Bool),
    ("b_periodic_y", Rule::Bool),
    ("b_force_rho_trace", Rule::Bool),
    ("b_unique_id", Rule::Bool),
    ("b_save_final_state", Rule::Bool),
    ("b_initial_rho_compression", Rule::Bool),
    ("trotter_order", Rule::Integer { min: 2, max: 4 }),
    ("max_dim_rho", NON_NEGATIVE),
    ("cut_off", ANY_FLOAT),
    ("cut_off_rho", ANY_FLOAT),
    (
        "metadata",
        Rule::Str {
            forbid_newline: true,
        },
    ),
    ("load_files_prefix", PLAIN_STR),
    ("output_files_prefix", PLAIN_STR),
    ("unique_id", PLAIN_STR),
    (
        "1q_components",
        Rule::EnumList {
            vocabulary: ONE_QUBIT_COMPONENTS,
            max_len: Some(3),
            unique: true,
            allow_scalar: false,
        },
    ),
    ("1q_indices", Rule::IndexList),
    (
        "2q_components",
        Rule::EnumList {
            vocabulary: TWO_QUBIT_COMPONENTS,
            max_len: Some(6),
            unique: true,
            allow_scalar: false,
        },
    ),
    ("2q_indices", Rule::IndexPairList),
];

/// Look up the built-in rule for a key.
pub fn schema_rule(key: &str) -> Option<&'static Rule> {
    SCHEMA.iter().find(|(k, _)| *k == key).map(|(_, rule)| rule)
}

/// A single validation problem.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParamIssue {
    #[error("N, t_final and tau must be defined as they do not have default values")]
    MissingRequired,

    #[error("{key} should be an integer")]
    NotInteger { key: String },

    #[error("{key} should be bigger/equal to {min} (integer)")]
    BelowMinimum { key: String, min: i64 },

    #[error("{key} should be an integer between {min} and {max}")]
    OutOfRange { key: String, min: i64, max: i64 },

    #[error("{key} is not a float")]
    NotFloat { key: String },

    #[error("{key} must be larger than 0")]
    NotPositive { key: String },

    #[error("t_init must be equal or smaller than t_final")]
    InitAfterFinal,

    #[error("{key} could not be validated because N is not defined properly")]
    SitesUndefined { key: String },

    #[error("{key} is not a float / N-length list / array (of floats)")]
    NotPerSiteVector { key: String },

    #[error("{key} should be a constant, or a square matrix (nested lists/array) of N^2 floats")]
    NotCouplingMatrix { key: String },

    #[error("J and J_z must have the same shape, found {first:?} and {second:?}")]
    CouplingShapeMismatch { first: Vec<usize>, second: Vec<usize> },

    #[error("{key} should be a list of strings from: {allowed}")]
    NotEnumList { key: String, allowed: String },

    #[error("{key} accepts at most {max} entries")]
    TooManyTokens { key: String, max: usize },

    #[error("{key} does not accept '{token}', allowed values are: {allowed}")]
    InvalidToken {
        key: String,
        token: String,
        allowed: String,
    },

    #[error("{key} selects '{token}' more than once")]
    DuplicateToken { key: String, token: String },

    #[error("{key} should be a list of integer site indices")]
    NotIndexList { key: String },

    #[error("{key} should be a list of index pairs (2-element lists of integers)")]
    NotPairList { key: String },

    #[error("{key} references site {index}, but sites are numbered 0 to N-1 with N = {n}")]
    IndexOutOfRange { key: String, index: i64, n: i64 },

    #[error("{key}'s length should be equal/smaller than {max}")]
    TooManyIndices { key: String, max: i64 },

    #[error("{key}'s list does not contain unique elements")]
    DuplicateIndices { key: String },

    #[error("{key} should be a boolean true or false")]
    NotBool { key: String },

    #[error("{key} is not a string")]
    NotString { key: String },

    #[error("{key} cannot contain the new line character ('\\n')")]
    ContainsNewline { key: String },

    #[error("t_final (total time) is smaller than tau (time step for time evolution)")]
    TauExceedsFinal,

    #[error("output_step multiplied by tau is larger than t_final")]
    OutputStepExceedsFinal,

    #[error("unknown parameter key passed: {key}")]
    UnknownKey { key: String },
}

/// All problems found in one validation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics(Vec<ParamIssue>);

impl Diagnostics {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParamIssue> {
        self.0.iter()
    }

    pub fn contains(&self, issue: &ParamIssue) -> bool {
        self.0.contains(issue)
    }

    fn push(&mut self, issue: ParamIssue) {
        self.0.push(issue);
    }

    /// `Ok(())` when there is nothing to report, otherwise
    /// [`LindbladError::InvalidParameters`] carrying the rendered text.
    pub fn into_result(self) -> LindbladResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(LindbladError::InvalidParameters(self.to_string()))
        }
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for issue in &self.0 {
            writeln!(f, "Error: {issue}")?;
        }
        Ok(())
    }
}

/// Caller-supplied adjustments to the built-in schema.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    overrides: FxHashMap<String, Rule>,
    ignored: FxHashSet<String>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule for a new key, or replace the built-in rule of a known key.
    pub fn with_rule(mut self, key: impl Into<String>, rule: Rule) -> Self {
        self.overrides.insert(key.into(), rule);
        self
    }

    /// Accept a key without checking it.
    pub fn ignore(mut self, key: impl Into<String>) -> Self {
        self.ignored.insert(key.into());
        self
    }

    pub fn rule_for(&self, key: &str) -> Option<&Rule> {
        self.overrides.get(key).or_else(|| schema_rule(key))
    }

    pub fn is_ignored(&self, key: &str) -> bool {
        self.ignored.contains(key)
    }
}

/// Validate parameters and return the diagnostic text, empty when the set is
/// acceptable.
pub fn verify_parameters(params: &Parameters, rules: &RuleSet) -> String {
    check_parameters(params, rules).to_string()
}

/// Validate parameters and return the structured diagnostics.
pub fn check_parameters(params: &Parameters, rules: &RuleSet) -> Diagnostics {
    let mut diags = Diagnostics::default();

    if REQUIRED_KEYS.iter().any(|key| !params.contains_key(key)) {
        diags.push(ParamIssue::MissingRequired);
        return diags;
    }

    let n_sites = params.num_sites();
    for (key, value) in params.iter() {
        if value.is_placeholder() {
            continue;
        }
        match rules.rule_for(key) {
            Some(rule) => {
                if let Some(issue) = check_rule(key, value, rule, n_sites) {
                    diags.push(issue);
                }
            }
            None if rules.is_ignored(key) => {}
            None => diags.push(ParamIssue::UnknownKey {
                key: key.to_string(),
            }),
        }
    }

    check_cross_keys(params, &mut diags);
    diags
}

fn check_rule(
    key: &str,
    value: &ParamValue,
    rule: &Rule,
    n_sites: Option<i64>,
) -> Option<ParamIssue> {
    let key_owned = || key.to_string();
    match rule {
        Rule::Integer { min, max } => {
            let Some(v) = value.as_int() else {
                return Some(ParamIssue::NotInteger { key: key_owned() });
            };
            if v < *min || v > *max {
                return Some(if *max == i64::MAX {
                    ParamIssue::BelowMinimum {
                        key: key_owned(),
                        min: *min,
                    }
                } else {
                    ParamIssue::OutOfRange {
                        key: key_owned(),
                        min: *min,
                        max: *max,
                    }
                });
            }
            None
        }
        Rule::Float { strictly_positive } => {
            let Some(v) = value.as_number() else {
                return Some(ParamIssue::NotFloat { key: key_owned() });
            };
            if *strictly_positive && v <= 0.0 {
                return Some(ParamIssue::NotPositive { key: key_owned() });
            }
            None
        }
        Rule::PerSiteVector => {
            if value.is_number() {
                return None;
            }
            let Some(n) = n_sites else {
                return Some(ParamIssue::SitesUndefined { key: key_owned() });
            };
            let ok = match value {
                ParamValue::List(items) => {
                    items.len() as i64 == n && items.iter().all(ParamValue::is_number)
                }
                ParamValue::Array(a) => a.len() == 1 || (a.ndim() == 1 && a.len() as i64 == n),
                _ => false,
            };
            (!ok).then(|| ParamIssue::NotPerSiteVector { key: key_owned() })
        }
        Rule::CouplingMatrix => {
            if value.is_number() {
                return None;
            }
            let Some(n) = n_sites else {
                return Some(ParamIssue::SitesUndefined { key: key_owned() });
            };
            let ok = match value {
                ParamValue::List(rows) => {
                    rows.len() as i64 == n
                        && rows.iter().all(|row| {
                            row.as_list().is_some_and(|row| {
                                row.len() as i64 == n && row.iter().all(ParamValue::is_number)
                            })
                        })
                }
                ParamValue::Array(a) => {
                    a.len() == 1 || (a.ndim() == 2 && a.shape().iter().all(|&d| d as i64 == n))
                }
                _ => false,
            };
            (!ok).then(|| ParamIssue::NotCouplingMatrix { key: key_owned() })
        }
        Rule::EnumList {
            vocabulary,
            max_len,
            unique,
            allow_scalar,
        } => check_enum_list(key, value, vocabulary, *max_len, *unique, *allow_scalar),
        Rule::IndexList => {
            let Some(items) = value.as_list() else {
                return Some(ParamIssue::NotIndexList { key: key_owned() });
            };
            let Some(n) = n_sites else {
                return Some(ParamIssue::SitesUndefined { key: key_owned() });
            };
            let mut indices = Vec::with_capacity(items.len());
            for item in items {
                let Some(index) = item.as_int() else {
                    return Some(ParamIssue::NotIndexList { key: key_owned() });
                };
                if !(0..n).contains(&index) {
                    return Some(ParamIssue::IndexOutOfRange {
                        key: key_owned(),
                        index,
                        n,
                    });
                }
                indices.push(index);
            }
            if indices.len() as i64 > n {
                return Some(ParamIssue::TooManyIndices {
                    key: key_owned(),
                    max: n,
                });
            }
            has_duplicates(&indices).then(|| ParamIssue::DuplicateIndices { key: key_owned() })
        }
        Rule::IndexPairList => {
            let Some(items) = value.as_list() else {
                return Some(ParamIssue::NotPairList { key: key_owned() });
            };
            let Some(n) = n_sites else {
                return Some(ParamIssue::SitesUndefined { key: key_owned() });
            };
            let mut pairs = Vec::with_capacity(items.len());
            for item in items {
                let Some((i, j)) = item.as_index_pair() else {
                    return Some(ParamIssue::NotPairList { key: key_owned() });
                };
                for index in [i, j] {
                    if !(0..n).contains(&index) {
                        return Some(ParamIssue::IndexOutOfRange {
                            key: key_owned(),
                            index,
                            n,
                        });
                    }
                }
                pairs.push((i, j));
            }
            let max = n.saturating_mul(n);
            if pairs.len() as i64 > max {
                return Some(ParamIssue::TooManyIndices {
                    key: key_owned(),
                    max,
                });
            }
            has_duplicates(&pairs).then(|| ParamIssue::DuplicateIndices { key: key_owned() })
        }
        Rule::Bool => value
            .as_bool()
            .is_none()
            .then(|| ParamIssue::NotBool { key: key_owned() }),
        Rule::Str { forbid_newline } => {
            let Some(s) = value.as_str() else {
                return Some(ParamIssue::NotString { key: key_owned() });
            };
            (*forbid_newline && s.contains('\n'))
                .then(|| ParamIssue::ContainsNewline { key: key_owned() })
        }
    }
}

fn check_enum_list(
    key: &str,
    value: &ParamValue,
    vocabulary: &[&[&str]],
    max_len: Option<usize>,
    unique: bool,
    allow_scalar: bool,
) -> Option<ParamIssue> {
    let allowed = vocabulary
        .iter()
        .flat_map(|group| group.iter())
        .copied()
        .collect::<Vec<_>>()
        .join(", ");

    let tokens: Vec<&str> = match value {
        ParamValue::Str(s) if allow_scalar => vec![s.as_str()],
        ParamValue::List(items) => match items.iter().map(ParamValue::as_str).collect() {
            Some(tokens) => tokens,
            None => {
                return Some(ParamIssue::NotEnumList {
                    key: key.to_string(),
                    allowed,
                });
            }
        },
        _ => {
            return Some(ParamIssue::NotEnumList {
                key: key.to_string(),
                allowed,
            });
        }
    };

    if let Some(max) = max_len {
        if tokens.len() > max {
            return Some(ParamIssue::TooManyTokens {
                key: key.to_string(),
                max,
            });
        }
    }

    let mut counts = vec![0usize; vocabulary.len()];
    for token in tokens {
        let lower = token.to_lowercase();
        let Some(group) = vocabulary
            .iter()
            .position(|group| group.contains(&lower.as_str()))
        else {
            return Some(ParamIssue::InvalidToken {
                key: key.to_string(),
                token: token.to_string(),
                allowed,
            });
        };
        counts[group] += 1;
        if unique && counts[group] > 1 {
            return Some(ParamIssue::DuplicateToken {
                key: key.to_string(),
                token: token.to_string(),
            });
        }
    }
    None
}

fn has_duplicates<T: Eq + std::hash::Hash>(items: &[T]) -> bool {
    let mut seen = FxHashSet::default();
    !items.iter().all(|item| seen.insert(item))
}

fn check_cross_keys(params: &Parameters, diags: &mut Diagnostics) {
    let t_final = params.number("t_final");
    let tau = params.number("tau");

    if let (Some(t_init), Some(t_final)) = (params.number("t_init"), t_final) {
        if t_final > 0.0 && t_init > t_final {
            diags.push(ParamIssue::InitAfterFinal);
        }
    }

    if let (Some(tau), Some(t_final)) = (tau, t_final) {
        if tau > 0.0 && t_final > 0.0 {
            if tau > t_final {
                diags.push(ParamIssue::TauExceedsFinal);
            } else if let Some(step) = params.get("output_step").and_then(ParamValue::as_int) {
                if step > 0 && step as f64 * tau > t_final {
                    diags.push(ParamIssue::OutputStepExceedsFinal);
                }
            }
        }
    }

    if let (Some(ParamValue::Array(j)), Some(ParamValue::Array(j_z))) =
        (params.get("J"), params.get("J_z"))
    {
        if j.shape() != j_z.shape() {
            diags.push(ParamIssue::CouplingShapeMismatch {
                first: j.shape().to_vec(),
                second: j_z.shape().to_vec(),
            });
        }
    }
}
