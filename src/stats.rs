//! Summary statistics over repeated measurements.

/// Arithmetic mean, `None` for no values.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// `baseline / measured`, or 0 if `measured` is not positive (the
/// plotted value for runs that did not produce a usable time).
pub fn speedup(baseline: f64, measured: f64) -> f64 {
    if measured > 0. {
        baseline / measured
    } else {
        0.
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stats {
    pub num_values: usize,
    pub mean: f64,
    /// Interpolated for even numbers of input values.
    pub median: f64,
    pub min: f64,
    pub max: f64,
    /// Population standard deviation (mean squared difference from the
    /// mean, square-rooted)
    pub standard_deviation: f64,
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum StatsError {
    #[error("no inputs given")]
    NoInputs,
    #[error("input contains NaN")]
    NaN,
}

impl Stats {
    pub fn from_values(values: &[f64]) -> Result<Self, StatsError> {
        if values.iter().any(|v| v.is_nan()) {
            return Err(StatsError::NaN);
        }
        let mean = mean(values).ok_or(StatsError::NoInputs)?;
        let num_values = values.len();

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).expect("NaN excluded above"));
        let mid = num_values / 2;
        let median = if num_values % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.
        } else {
            sorted[mid]
        };

        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / num_values as f64;

        Ok(Stats {
            num_values,
            mean,
            median,
            min: sorted[0],
            max: sorted[num_values - 1],
            standard_deviation: variance.sqrt(),
        })
    }
}
