//! Data preparation on top of a loaded [`SimulationResult`].
//!
//! Time axes are derived from the run's parameters. Series from different
//! output files are combined when their lengths agree; their time grids are
//! not compared beyond that.

use ndarray::Array2;

use crate::error::{LindbladError, LindbladResult};
use crate::output::{SimulationResult, TimeSeries};
use crate::params::Parameters;

/// The output time axis of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeGrid {
    /// Number of time steps from `t_init` to `t_final`, both included.
    pub n_steps: usize,
    /// `t_init, t_init + tau, ...` below `t_final`, then `t_final`.
    pub t_eval: Vec<f64>,
    /// Step indices at which to place axis ticks.
    pub tick_indices: Vec<usize>,
    /// Rounded times at the tick indices.
    pub tick_labels: Vec<f64>,
}

impl TimeGrid {
    /// Derive the grid from `t_init` (default 0), `t_final` and `tau`.
    pub fn from_parameters(
        params: &Parameters,
        n_ticks: usize,
        round_digits: u32,
    ) -> LindbladResult<Self> {
        let t_final = required_number(params, "t_final")?;
        let tau = required_number(params, "tau")?;
        let t_init = params.number("t_init").unwrap_or(0.0);
        Self::new(t_init, t_final, tau, n_ticks, round_digits)
    }

    pub fn new(
        t_init: f64,
        t_final: f64,
        tau: f64,
        n_ticks: usize,
        round_digits: u32,
    ) -> LindbladResult<Self> {
        if tau.is_nan() || tau <= 0.0 {
            return Err(LindbladError::Configuration(format!(
                "tau must be positive, got {tau}"
            )));
        }
        if t_final < t_init {
            return Err(LindbladError::Configuration(format!(
                "t_final ({t_final}) is before t_init ({t_init})"
            )));
        }

        let n_steps = ((t_final - t_init) / tau) as usize + 1;

        let below_final = ((t_final - t_init) / tau).ceil() as usize;
        let mut t_eval: Vec<f64> = (0..below_final)
            .map(|k| t_init + k as f64 * tau)
            .collect();
        if !t_eval.contains(&t_final) {
            t_eval.push(t_final);
        }

        let stride = (n_steps / n_ticks.max(1)).max(1);
        let tick_indices: Vec<usize> = (0..n_steps).step_by(stride).collect();
        let scale = 10f64.powi(round_digits as i32);
        let tick_labels = tick_indices
            .iter()
            .map(|&i| ((t_init + i as f64 * tau) * scale).round() / scale)
            .collect();

        Ok(Self {
            n_steps,
            t_eval,
            tick_indices,
            tick_labels,
        })
    }
}

fn required_number(params: &Parameters, key: &str) -> LindbladResult<f64> {
    params
        .number(key)
        .ok_or_else(|| LindbladError::Configuration(format!("{key} must be a number")))
}

/// Split a two-letter correlation name into its single-site components.
fn components(name: &str) -> Option<(String, String)> {
    let mut chars = name.chars();
    let (a, b) = (chars.next()?, chars.next()?);
    if chars.next().is_some() {
        return None;
    }
    Some((a.to_string(), b.to_string()))
}

/// Connected correlation `<a_i b_j> - <a_i><b_j>` of a two-site observable
/// such as `"zz"` or `"xy"`.
///
/// `None` unless both single-site series and the two-site series exist and
/// have the same length.
pub fn connected_correlation(
    result: &SimulationResult,
    name: &str,
    sites: (usize, usize),
) -> Option<TimeSeries> {
    let name = name.to_lowercase();
    let (a, b) = components(&name)?;
    let first = result.one_qubit(&a, sites.0)?;
    let second = result.one_qubit(&b, sites.1)?;
    let joint = result.two_qubit(&name, sites.0, sites.1)?;
    if first.len() != second.len() || first.len() != joint.len() {
        return None;
    }

    let values = joint
        .values
        .iter()
        .zip(first.values.iter().zip(&second.values))
        .map(|(ab, (a, b))| ab - a * b)
        .collect();
    Some(TimeSeries {
        times: first.times.clone(),
        values,
    })
}

/// `n x n` matrix of connected correlations at time `t`.
///
/// The diagonal, pairs without data and pairs not sampled at `t` are NaN.
pub fn correlation_matrix(result: &SimulationResult, name: &str, t: f64, n: usize) -> Array2<f64> {
    let mut matrix = Array2::from_elem((n, n), f64::NAN);
    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            if let Some(value) =
                connected_correlation(result, name, (i, j)).and_then(|c| c.value_at(t))
            {
                matrix[[i, j]] = value;
            }
        }
    }
    matrix
}

/// A one-site observable laid out over sites and time steps.
#[derive(Debug, Clone)]
pub struct SpaceTimeData {
    /// `sites.len() x grid.n_steps`, NaN where no sample exists.
    pub data: Array2<f64>,
    pub sites: Vec<usize>,
    pub grid: TimeGrid,
}

/// Collect a one-site observable for `sites` (all `N` sites when `None`).
pub fn space_time_1q(
    params: &Parameters,
    result: &SimulationResult,
    name: &str,
    sites: Option<&[usize]>,
    n_ticks: usize,
) -> LindbladResult<SpaceTimeData> {
    let grid = TimeGrid::from_parameters(params, n_ticks, 2)?;
    let sites: Vec<usize> = match sites {
        Some(sites) => sites.to_vec(),
        None => {
            let n = params
                .num_sites()
                .filter(|&n| n > 0)
                .ok_or_else(|| LindbladError::Configuration("N must be a positive integer".into()))?;
            (0..n as usize).collect()
        }
    };

    let mut data = Array2::from_elem((sites.len(), grid.n_steps), f64::NAN);
    for (row, &site) in sites.iter().enumerate() {
        if let Some(series) = result.one_qubit(name, site) {
            for (col, &value) in series.values.iter().take(grid.n_steps).enumerate() {
                data[[row, col]] = value;
            }
        }
    }

    Ok(SpaceTimeData { data, sites, grid })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Observable;

    fn series(times: &[f64], values: &[f64]) -> TimeSeries {
        TimeSeries {
            times: times.to_vec(),
            values: values.to_vec(),
        }
    }

    fn two_site_result() -> SimulationResult {
        let mut result = SimulationResult::default();
        let t = [0.0, 0.5, 1.0];
        result
            .obs_1q
            .insert(Observable::one_qubit("z", 0), series(&t, &[1.0, 0.5, 0.2]));
        result
            .obs_1q
            .insert(Observable::one_qubit("z", 1), series(&t, &[1.0, 0.8, 0.6]));
        result
            .obs_2q
            .insert(Observable::two_qubit("zz", 0, 1), series(&t, &[1.0, 0.5, 0.3]));
        result
    }

    #[test]
    fn test_time_grid() {
        let grid = TimeGrid::new(0.0, 1.0, 0.25, 2, 2).unwrap();
        assert_eq!(grid.n_steps, 5);
        assert_eq!(grid.t_eval, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(grid.tick_indices, vec![0, 2, 4]);
        assert_eq!(grid.tick_labels, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_time_grid_appends_final_time() {
        let grid = TimeGrid::new(0.0, 1.0, 0.4, 10, 1).unwrap();
        assert_eq!(grid.n_steps, 3);
        assert_eq!(grid.t_eval.len(), 4);
        assert_eq!(grid.t_eval.last(), Some(&1.0));
        assert_eq!(grid.tick_indices, vec![0, 1, 2]);
        assert_eq!(grid.tick_labels, vec![0.0, 0.4, 0.8]);
    }

    #[test]
    fn test_time_grid_from_parameters() {
        let params = Parameters::new()
            .with("N", 2)
            .with("t_init", 1.0)
            .with("t_final", 2.0)
            .with("tau", 0.5);
        let grid = TimeGrid::from_parameters(&params, 4, 2).unwrap();
        assert_eq!(grid.t_eval, vec![1.0, 1.5, 2.0]);

        let err = TimeGrid::from_parameters(&Parameters::new().with("tau", 0.1), 4, 2).unwrap_err();
        assert!(err.to_string().contains("t_final"));
        assert!(TimeGrid::new(0.0, 1.0, 0.0, 4, 2).is_err());
    }

    #[test]
    fn test_connected_correlation() {
        let result = two_site_result();
        let corr = connected_correlation(&result, "ZZ", (0, 1)).unwrap();
        assert_eq!(corr.times, vec![0.0, 0.5, 1.0]);
        let expected = [0.0, 0.1, 0.3 - 0.12];
        for (got, want) in corr.values.iter().zip(expected) {
            assert!((got - want).abs() < 1e-12);
        }

        assert!(connected_correlation(&result, "xx", (0, 1)).is_none());
        assert!(connected_correlation(&result, "zzz", (0, 1)).is_none());
    }

    #[test]
    fn test_connected_correlation_requires_equal_lengths() {
        let mut result = two_site_result();
        result
            .obs_1q
            .insert(Observable::one_qubit("z", 1), series(&[0.0], &[1.0]));
        assert!(connected_correlation(&result, "zz", (0, 1)).is_none());
    }

    #[test]
    fn test_correlation_matrix() {
        let result = two_site_result();
        let matrix = correlation_matrix(&result, "zz", 0.5, 2);
        assert_eq!(matrix.shape(), &[2, 2]);
        assert!(matrix[[0, 0]].is_nan());
        assert!(matrix[[1, 1]].is_nan());
        assert!((matrix[[0, 1]] - 0.1).abs() < 1e-12);
        // (1, 0) was never measured
        assert!(matrix[[1, 0]].is_nan());

        let matrix = correlation_matrix(&result, "zz", 0.25, 2);
        assert!(matrix[[0, 1]].is_nan());
    }

    #[test]
    fn test_space_time_1q() {
        let params = Parameters::new()
            .with("N", 3)
            .with("t_final", 1.0)
            .with("tau", 0.5);
        let result = two_site_result();
        let st = space_time_1q(&params, &result, "z", None, 4).unwrap();
        assert_eq!(st.sites, vec![0, 1, 2]);
        assert_eq!(st.data.shape(), &[3, 3]);
        assert_eq!(st.data[[1, 2]], 0.6);
        assert!(st.data[[2, 0]].is_nan());

        let st = space_time_1q(&params, &result, "z", Some(&[1]), 4).unwrap();
        assert_eq!(st.data.shape(), &[1, 3]);
        assert_eq!(st.data[[0, 0]], 1.0);
    }
}
