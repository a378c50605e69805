//! Loading of the solver's observable output files.
//!
//! A run writes three files next to its output prefix:
//!
//! | file                  | row layout                     |
//! |-----------------------|--------------------------------|
//! | `<prefix>.obs-1q.dat` | `time name site value`         |
//! | `<prefix>.obs-2q.dat` | `time name site1 site2 value`  |
//! | `<prefix>.global.dat` | `time name value`              |
//!
//! The first line of each file is a header. Site indices are 1-based in the
//! files and 0-based in memory.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Serialize;
use tracing::info;

use crate::error::{LindbladError, LindbladResult};

/// The three kinds of output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    OneQubit,
    TwoQubit,
    Global,
}

impl OutputKind {
    pub const ALL: [OutputKind; 3] = [Self::OneQubit, Self::TwoQubit, Self::Global];

    /// Tag between the prefix and `.dat`.
    pub fn file_tag(self) -> &'static str {
        match self {
            Self::OneQubit => "obs-1q",
            Self::TwoQubit => "obs-2q",
            Self::Global => "global",
        }
    }

    /// Number of site index columns in a row.
    pub fn site_columns(self) -> usize {
        match self {
            Self::OneQubit => 1,
            Self::TwoQubit => 2,
            Self::Global => 0,
        }
    }

    /// Path of this kind's file for an output prefix.
    pub fn path_for(self, prefix: &str) -> PathBuf {
        PathBuf::from(format!("{prefix}.{}.dat", self.file_tag()))
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_tag())
    }
}

/// An observable key: a lowercase name and its 0-based sites.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Observable {
    pub name: String,
    pub sites: Vec<usize>,
}

impl Observable {
    pub fn new(name: &str, sites: Vec<usize>) -> Self {
        Self {
            name: name.to_lowercase(),
            sites,
        }
    }

    pub fn one_qubit(name: &str, site: usize) -> Self {
        Self::new(name, vec![site])
    }

    pub fn two_qubit(name: &str, first: usize, second: usize) -> Self {
        Self::new(name, vec![first, second])
    }

    pub fn global(name: &str) -> Self {
        Self::new(name, Vec::new())
    }
}

impl fmt::Display for Observable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sites.is_empty() {
            return f.write_str(&self.name);
        }
        let sites: Vec<String> = self.sites.iter().map(ToString::to_string).collect();
        write!(f, "{}({})", self.name, sites.join(","))
    }
}

/// Parallel time and value sequences, in file order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimeSeries {
    pub times: Vec<f64>,
    pub values: Vec<f64>,
}

impl TimeSeries {
    pub fn push(&mut self, time: f64, value: f64) {
        self.times.push(time);
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Index of the sample taken exactly at `time`.
    pub fn position_of(&self, time: f64) -> Option<usize> {
        self.times.iter().position(|&t| t == time)
    }

    /// Value sampled exactly at `time`.
    pub fn value_at(&self, time: f64) -> Option<f64> {
        self.position_of(time).map(|i| self.values[i])
    }

    /// The last `(time, value)` sample.
    pub fn last(&self) -> Option<(f64, f64)> {
        Some((*self.times.last()?, *self.values.last()?))
    }
}

/// Observable data of one output file, keyed in first-seen order.
pub type ObservableData = IndexMap<Observable, TimeSeries>;

/// All observables of one solver run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationResult {
    pub obs_1q: ObservableData,
    pub obs_2q: ObservableData,
    pub global: ObservableData,
}

/// Flattened view of one observable for export.
#[derive(Debug, Serialize)]
pub struct ObservableRecord<'a> {
    pub kind: OutputKind,
    pub name: &'a str,
    pub sites: &'a [usize],
    pub times: &'a [f64],
    pub values: &'a [f64],
}

impl SimulationResult {
    pub fn data(&self, kind: OutputKind) -> &ObservableData {
        match kind {
            OutputKind::OneQubit => &self.obs_1q,
            OutputKind::TwoQubit => &self.obs_2q,
            OutputKind::Global => &self.global,
        }
    }

    fn data_mut(&mut self, kind: OutputKind) -> &mut ObservableData {
        match kind {
            OutputKind::OneQubit => &mut self.obs_1q,
            OutputKind::TwoQubit => &mut self.obs_2q,
            OutputKind::Global => &mut self.global,
        }
    }

    pub fn one_qubit(&self, name: &str, site: usize) -> Option<&TimeSeries> {
        self.obs_1q.get(&Observable::one_qubit(name, site))
    }

    pub fn two_qubit(&self, name: &str, first: usize, second: usize) -> Option<&TimeSeries> {
        self.obs_2q.get(&Observable::two_qubit(name, first, second))
    }

    pub fn global(&self, name: &str) -> Option<&TimeSeries> {
        self.global.get(&Observable::global(name))
    }

    /// Total number of observables across the three files.
    pub fn len(&self) -> usize {
        self.obs_1q.len() + self.obs_2q.len() + self.global.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every observable as a flat record, 1Q first, then 2Q, then global.
    pub fn to_records(&self) -> Vec<ObservableRecord<'_>> {
        OutputKind::ALL
            .iter()
            .flat_map(|&kind| {
                self.data(kind).iter().map(move |(obs, series)| ObservableRecord {
                    kind,
                    name: &obs.name,
                    sites: &obs.sites,
                    times: &series.times,
                    values: &series.values,
                })
            })
            .collect()
    }
}

/// Parse the text of one output file. `path` is only used in error messages.
pub fn parse_data_file(kind: OutputKind, path: &Path, text: &str) -> LindbladResult<ObservableData> {
    let site_columns = kind.site_columns();
    let mut data = ObservableData::new();

    // Line 1 is the header.
    for (line_no, line) in text.lines().enumerate().skip(1) {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }
        let line = line_no + 1;
        let parse_error = |message: String| LindbladError::Parse {
            path: path.to_path_buf(),
            line,
            message,
        };

        if tokens.len() < site_columns + 3 {
            return Err(parse_error(format!(
                "expected at least {} columns, found {}",
                site_columns + 3,
                tokens.len()
            )));
        }

        let time: f64 = tokens[0]
            .parse()
            .map_err(|_| parse_error(format!("invalid time '{}'", tokens[0])))?;
        let mut sites = Vec::with_capacity(site_columns);
        for token in &tokens[2..2 + site_columns] {
            let site: usize = token
                .parse()
                .map_err(|_| parse_error(format!("invalid site index '{token}'")))?;
            if site == 0 {
                return Err(parse_error("site indices are 1-based".to_string()));
            }
            sites.push(site - 1);
        }
        let raw_value = tokens[tokens.len() - 1];
        let value: f64 = raw_value
            .parse()
            .map_err(|_| parse_error(format!("invalid value '{raw_value}'")))?;

        data.entry(Observable::new(tokens[1], sites))
            .or_default()
            .push(time, value);
    }

    Ok(data)
}

/// Read and parse one output file.
pub fn read_data_file(prefix: &str, kind: OutputKind) -> LindbladResult<ObservableData> {
    let path = kind.path_for(prefix);
    info!("Loading solver output file {}", path.display());
    let text = fs::read_to_string(&path)?;
    parse_data_file(kind, &path, &text)
}

/// Load all three output files of a run.
///
/// Any missing file fails the whole load; no partial result is returned.
pub fn load_output(prefix: &str) -> LindbladResult<SimulationResult> {
    let mut result = SimulationResult::default();
    for kind in OutputKind::ALL {
        *result.data_mut(kind) = read_data_file(prefix, kind)?;
    }
    Ok(result)
}
