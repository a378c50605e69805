//! Generation of the solver input file.
//!
//! The solver reads a flat text file with one `key = value` line per
//! parameter. Values are written in the solver's conventions:
//!
//! ```text
//! N = 4
//! t_final = 1.0
//! tau = 0.01
//! h_z = 0.1,0.2,0.3,0.4
//! 1q_indices = 1,4
//! 2q_indices = 1,2,3,4
//! J = 1.0,1.0,1.0
//! output_files_prefix = out/lindblad
//! first_bond_indices = 1,2,3
//! second_bond_indices = 2,3,4
//! ```
//!
//! Site indices are 0-based in [`Parameters`] and 1-based in the file. Dense
//! coupling matrices are written sparsely: only the entries on the bonds
//! where `J` or `J_z` is non-zero, with the bond coordinates given once in
//! `first_bond_indices` / `second_bond_indices`.

use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use ndarray::Array2;
use tracing::{debug, info};

use crate::error::{LindbladError, LindbladResult};
use crate::params::{ParamValue, Parameters, format_float};
use crate::validate::{RuleSet, check_parameters};

/// Base name used when no output prefix (or only a directory) is given.
pub const DEFAULT_OUTPUT_NAME: &str = "lindblad";

/// Suffix appended to the output prefix to name the input file.
pub const INPUT_FILE_SUFFIX: &str = ".input.txt";

/// A rendered solver input file and the paths derived from the parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct InputFile {
    /// Full text of the input file.
    pub contents: String,
    /// Where the input file is written.
    pub input_path: PathBuf,
    /// Prefix of the solver's output files, including the id suffix.
    pub output_prefix: String,
    /// `.<id>` when the run carries a unique id, otherwise empty.
    pub id_suffix: String,
    /// The run's unique id, if any.
    pub unique_id: Option<String>,
}

impl InputFile {
    /// Write the input file, creating its parent directory if needed.
    pub fn write(&self) -> LindbladResult<()> {
        if let Some(parent) = self.input_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.input_path, &self.contents)?;
        info!("Created solver input file {}", self.input_path.display());
        Ok(())
    }
}

/// Sparse coordinates of the coupling bonds, 1-based.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BondIndices {
    pub first: Vec<usize>,
    pub second: Vec<usize>,
}

impl BondIndices {
    pub fn len(&self) -> usize {
        self.first.len()
    }

    pub fn is_empty(&self) -> bool {
        self.first.is_empty()
    }

    /// 0-based `(row, col)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.first
            .iter()
            .zip(&self.second)
            .map(|(&i, &j)| (i - 1, j - 1))
    }
}

/// Derive the bond list from up to two dense coupling matrices.
///
/// A bond is any `(i, j)` where either matrix is non-zero. Both matrices must
/// have the same shape.
pub fn bond_indices(
    j: Option<&Array2<f64>>,
    j_z: Option<&Array2<f64>>,
) -> LindbladResult<Option<BondIndices>> {
    let (shape, matrices): (_, Vec<&Array2<f64>>) = match (j, j_z) {
        (None, None) => return Ok(None),
        (Some(a), None) | (None, Some(a)) => (a.dim(), vec![a]),
        (Some(a), Some(b)) => {
            if a.shape() != b.shape() {
                return Err(LindbladError::ShapeMismatch {
                    first: a.shape().to_vec(),
                    second: b.shape().to_vec(),
                });
            }
            (a.dim(), vec![a, b])
        }
    };

    let mut bonds = BondIndices::default();
    let (rows, cols) = shape;
    for i in 0..rows {
        for jj in 0..cols {
            if matrices.iter().any(|m| m[[i, jj]] != 0.0) {
                bonds.first.push(i + 1);
                bonds.second.push(jj + 1);
            }
        }
    }
    debug!("Derived {} coupling bonds", bonds.len());
    Ok(Some(bonds))
}

/// Output prefix before any unique-id suffix.
pub fn base_output_prefix(params: &Parameters) -> String {
    let mut prefix = params
        .get("output_files_prefix")
        .and_then(ParamValue::as_str)
        .unwrap_or("")
        .to_string();
    if prefix.is_empty() || prefix.ends_with(['/', '.', '\\']) {
        prefix.push_str(DEFAULT_OUTPUT_NAME);
    }
    prefix
}

/// The run id: freshly generated when `b_unique_id` is set, otherwise the
/// caller's `unique_id`, if any.
fn resolve_unique_id(params: &Parameters) -> Option<String> {
    if params.get("b_unique_id").and_then(ParamValue::as_bool) == Some(true) {
        let id = uuid::Uuid::new_v4().simple().to_string();
        info!("Generating a unique id for this simulation: {id}");
        return Some(id);
    }
    params
        .get("unique_id")
        .and_then(ParamValue::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// A coupling value to be written sparsely: a matrix with more than one row.
fn dense_coupling(params: &Parameters, key: &str) -> Option<Array2<f64>> {
    params
        .get(key)
        .and_then(ParamValue::as_matrix)
        .filter(|m| m.nrows() > 1)
}

fn join<I: IntoIterator<Item = String>>(items: I) -> String {
    items.into_iter().collect::<Vec<_>>().join(",")
}

/// Render the input file for a parameter set without validating it.
pub fn render_input(params: &Parameters) -> LindbladResult<InputFile> {
    let unique_id = resolve_unique_id(params);
    let id_suffix = unique_id
        .as_ref()
        .map(|id| format!(".{id}"))
        .unwrap_or_default();
    let output_prefix = format!("{}{}", base_output_prefix(params), id_suffix);
    let input_path =
        PathBuf::from(format!("{output_prefix}{INPUT_FILE_SUFFIX}").replace('\\', "/"));

    let j = dense_coupling(params, "J");
    let j_z = dense_coupling(params, "J_z");
    let bonds = bond_indices(j.as_ref(), j_z.as_ref())?;

    let mut contents = String::new();
    let mut push = |key: &str, value: &str| {
        // Writing to a String cannot fail.
        let _ = writeln!(contents, "{key} = {value}");
    };

    for (key, value) in params.iter() {
        match key {
            "b_unique_id" => {}
            "output_files_prefix" => push(key, &output_prefix),
            "unique_id" => push(key, unique_id.as_deref().unwrap_or("")),
            "J" | "J_z" => {
                let matrix = if key == "J" { &j } else { &j_z };
                match (matrix, &bonds) {
                    (Some(matrix), Some(bonds)) => {
                        push(key, &join(bonds.iter().map(|ij| format_float(matrix[ij]))));
                    }
                    _ => push(key, &value.to_string()),
                }
            }
            "1q_indices" => match value.as_list() {
                Some(items) => push(
                    key,
                    &join(items.iter().map(|v| match v.as_int() {
                        Some(i) => (i + 1).to_string(),
                        None => v.to_string(),
                    })),
                ),
                None => push(key, &value.to_string()),
            },
            "2q_indices" | "init_graph_state" => match value.as_list() {
                Some(items) => push(
                    key,
                    &join(items.iter().map(|v| match v.as_index_pair() {
                        Some((i, j)) => format!("{},{}", i + 1, j + 1),
                        None => v.to_string(),
                    })),
                ),
                None => push(key, &value.to_string()),
            },
            _ => push(key, &value.to_string()),
        }
    }

    if !params.contains_key("output_files_prefix") {
        push("output_files_prefix", &output_prefix);
    }
    if let Some(id) = unique_id.as_deref() {
        if !params.contains_key("unique_id") {
            push("unique_id", id);
        }
    }
    if let Some(bonds) = &bonds {
        push(
            "first_bond_indices",
            &join(bonds.first.iter().map(ToString::to_string)),
        );
        push(
            "second_bond_indices",
            &join(bonds.second.iter().map(ToString::to_string)),
        );
    }

    Ok(InputFile {
        contents,
        input_path,
        output_prefix,
        id_suffix,
        unique_id,
    })
}

/// Validate, render and write the input file.
pub fn build_input(params: &Parameters, rules: &RuleSet) -> LindbladResult<InputFile> {
    check_parameters(params, rules).into_result()?;
    let input = render_input(params)?;
    input.write()?;
    Ok(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn lines(input: &InputFile) -> Vec<&str> {
        input.contents.lines().collect()
    }

    #[test]
    fn test_minimal_input() {
        let params = Parameters::new()
            .with("N", 2)
            .with("t_final", 1.0)
            .with("tau", 0.5);
        let input = render_input(&params).unwrap();

        assert_eq!(
            lines(&input),
            vec![
                "N = 2",
                "t_final = 1.0",
                "tau = 0.5",
                "output_files_prefix = lindblad"
            ]
        );
        assert_eq!(input.output_prefix, "lindblad");
        assert_eq!(input.input_path, PathBuf::from("lindblad.input.txt"));
        assert_eq!(input.id_suffix, "");
        assert_eq!(input.unique_id, None);
    }

    #[test]
    fn test_output_prefix_rules() {
        let with_prefix = |p: &str| Parameters::new().with("output_files_prefix", p);
        assert_eq!(base_output_prefix(&with_prefix("")), "lindblad");
        assert_eq!(base_output_prefix(&with_prefix("out/")), "out/lindblad");
        assert_eq!(base_output_prefix(&with_prefix("runs\\")), "runs\\lindblad");
        assert_eq!(base_output_prefix(&with_prefix("sim.")), "sim.lindblad");
        assert_eq!(base_output_prefix(&with_prefix("out/chain")), "out/chain");
    }

    #[test]
    fn test_backslashes_in_input_path() {
        let params = Parameters::new().with("output_files_prefix", "runs\\chain");
        let input = render_input(&params).unwrap();
        assert_eq!(input.input_path, PathBuf::from("runs/chain.input.txt"));
        assert!(input.contents.contains("output_files_prefix = runs\\chain\n"));
    }

    #[test]
    fn test_prefix_line_keeps_caller_position() {
        let params = Parameters::new()
            .with("output_files_prefix", "out/")
            .with("N", 3);
        let input = render_input(&params).unwrap();
        assert_eq!(lines(&input), vec!["output_files_prefix = out/lindblad", "N = 3"]);
    }

    #[test]
    fn test_generated_unique_id() {
        let params = Parameters::new()
            .with("N", 2)
            .with("b_unique_id", true);
        let input = render_input(&params).unwrap();

        let id = input.unique_id.clone().unwrap();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(input.id_suffix, format!(".{id}"));
        assert_eq!(input.output_prefix, format!("lindblad.{id}"));
        assert!(!input.contents.contains("b_unique_id"));
        assert!(input.contents.contains(&format!("unique_id = {id}\n")));
    }

    #[test]
    fn test_supplied_unique_id() {
        let params = Parameters::new()
            .with("unique_id", "run7")
            .with("output_files_prefix", "data/x");
        let input = render_input(&params).unwrap();
        assert_eq!(input.output_prefix, "data/x.run7");
        assert_eq!(input.input_path, PathBuf::from("data/x.run7.input.txt"));
        assert_eq!(
            lines(&input),
            vec!["unique_id = run7", "output_files_prefix = data/x.run7"]
        );
    }

    #[test]
    fn test_list_and_index_encodings() {
        let params = Parameters::new()
            .with("h_z", vec![0.1, 0.2, 0.3])
            .with("g_0", array![1.0, 2.0, 3.0])
            .with("init_pauli_state", "+z")
            .with("1q_components", vec!["x", "z"])
            .with("1q_indices", vec![0, 2])
            .with("2q_indices", vec![(0, 1), (1, 2)])
            .with("init_graph_state", vec![(2, 0)])
            .with("b_periodic_x", true);
        let input = render_input(&params).unwrap();
        assert_eq!(
            lines(&input),
            vec![
                "h_z = 0.1,0.2,0.3",
                "g_0 = 1.0,2.0,3.0",
                "init_pauli_state = +z",
                "1q_components = x,z",
                "1q_indices = 1,3",
                "2q_indices = 1,2,2,3",
                "init_graph_state = 3,1",
                "b_periodic_x = true",
                "output_files_prefix = lindblad",
            ]
        );
    }

    #[test]
    fn test_sparse_couplings_share_bonds() {
        let j = array![[0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 0.0]];
        let j_z = array![[0.0, 0.0, 0.0], [0.0, 0.0, 2.5], [0.0, 0.0, 0.0]];
        let params = Parameters::new()
            .with("N", 3)
            .with("J", j)
            .with("J_z", j_z);
        let input = render_input(&params).unwrap();
        assert_eq!(
            lines(&input),
            vec![
                "N = 3",
                "J = 1.0,1.0,0.0",
                "J_z = 0.0,0.0,2.5",
                "output_files_prefix = lindblad",
                "first_bond_indices = 1,2,2",
                "second_bond_indices = 2,1,3",
            ]
        );
    }

    #[test]
    fn test_nested_list_coupling_is_sparse() {
        let params = Parameters::new().with("J", vec![vec![0.0, 0.5], vec![0.0, 0.0]]);
        let input = render_input(&params).unwrap();
        assert!(input.contents.contains("J = 0.5\n"));
        assert!(input.contents.contains("first_bond_indices = 1\n"));
        assert!(input.contents.contains("second_bond_indices = 2\n"));
    }

    #[test]
    fn test_scalar_coupling_has_no_bonds() {
        let params = Parameters::new().with("J", 1.0).with("J_z", array![[0.5]]);
        let input = render_input(&params).unwrap();
        assert!(input.contents.contains("J = 1.0\n"));
        assert!(input.contents.contains("J_z = 0.5\n"));
        assert!(!input.contents.contains("bond_indices"));
    }

    #[test]
    fn test_bond_indices_shape_mismatch() {
        let a = Array2::<f64>::zeros((2, 2));
        let b = Array2::<f64>::zeros((3, 3));
        let err = bond_indices(Some(&a), Some(&b)).unwrap_err();
        assert!(matches!(err, LindbladError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_bond_indices_single_matrix() {
        let j_z = array![[0.0, 0.0], [3.0, 0.0]];
        let bonds = bond_indices(None, Some(&j_z)).unwrap().unwrap();
        assert_eq!(bonds.first, vec![2]);
        assert_eq!(bonds.second, vec![1]);
        assert_eq!(bonds.iter().collect::<Vec<_>>(), vec![(1, 0)]);
        assert!(bond_indices(None, None).unwrap().is_none());
    }

    #[test]
    fn test_build_rejects_invalid_parameters() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("bad");
        let params = Parameters::new()
            .with("N", 2)
            .with("t_final", 1.0)
            .with("tau", 0.5)
            .with("b_periodic_x", "yes")
            .with("output_files_prefix", prefix.to_string_lossy().to_string());
        let err = build_input(&params, &RuleSet::default()).unwrap_err();
        assert!(matches!(err, LindbladError::InvalidParameters(ref t) if t.contains("b_periodic_x")));
        assert!(!dir.path().join("bad.input.txt").exists());
    }

    #[test]
    fn test_build_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("nested").join("chain");
        let params = Parameters::new()
            .with("N", 2)
            .with("t_final", 1.0)
            .with("tau", 0.5)
            .with("output_files_prefix", prefix.to_string_lossy().to_string());
        let input = build_input(&params, &RuleSet::default()).unwrap();
        let written = fs::read_to_string(&input.input_path).unwrap();
        assert_eq!(written, input.contents);
        assert!(written.starts_with("N = 2\nt_final = 1.0\ntau = 0.5\n"));
    }
}
