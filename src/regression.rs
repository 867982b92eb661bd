//! Least-squares line through the log-log box counts.
//!
//! Samples are mapped to `x = -ln(size / normalize)` and `y = ln(count)`, so the
//! slope of the fitted line is the dimension estimate, positive when counts grow as
//! boxes shrink. The normalisation only shifts `x` and leaves the slope unchanged.

use serde::{Deserialize, Serialize};

use crate::errors::{config_error, FractalError, Result};

/// One measurement: the box count found for one box size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxSizeSample {
    pub box_size: usize,
    pub count: u64,
}

impl BoxSizeSample {
    pub fn new(box_size: usize, count: u64) -> Self {
        BoxSizeSample { box_size, count }
    }
}

impl From<(usize, u64)> for BoxSizeSample {
    fn from((box_size, count): (usize, u64)) -> Self {
        BoxSizeSample { box_size, count }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionResult {
    pub slope: f64,
    pub intercept: f64,
}

impl RegressionResult {
    /// The fractal dimension estimate.
    pub fn dimension(&self) -> f64 {
        self.slope
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    /// `n` evenly spaced points of the fitted line over `[x_min, x_max]`, for plotting.
    pub fn fitted_line(&self, x_min: f64, x_max: f64, n: usize) -> Vec<(f64, f64)> {
        match n {
            0 => Vec::new(),
            1 => vec![(x_min, self.predict(x_min))],
            _ => {
                let inc = (x_max - x_min) / (n - 1) as f64;
                (0..n)
                    .map(|i| {
                        let x = x_min + inc * i as f64;
                        (x, self.predict(x))
                    })
                    .collect()
            }
        }
    }
}

/// The `(x, y)` points the line is fitted to.
pub fn log_points(samples: &[BoxSizeSample], normalize: f64) -> Result<Vec<(f64, f64)>> {
    if !normalize.is_finite() || normalize <= 0.0 {
        let msg = format!("box size normalisation must be > 0, got {normalize}");
        return Err(config_error(msg));
    }

    samples
        .iter()
        .map(|s| {
            if s.count == 0 {
                return Err(FractalError::ZeroCount {
                    box_size: s.box_size,
                });
            }
            let x = -(s.box_size as f64 / normalize).ln();
            Ok((x, (s.count as f64).ln()))
        })
        .collect()
}

/// Fits `ln(count) = slope * -ln(size / normalize) + intercept` by ordinary least squares.
pub fn fit(samples: &[BoxSizeSample], normalize: f64) -> Result<RegressionResult> {
    if samples.is_empty() {
        return Err(FractalError::EmptyInput);
    }

    let points = log_points(samples, normalize)?;
    let (xs, ys): (Vec<f64>, Vec<f64>) = points.into_iter().unzip();
    let degenerate = FractalError::DegenerateFit {
        samples: samples.len(),
    };
    linear_regression(&xs, &ys).ok_or(degenerate)
}

// Helper function to perform linear regression, None if all x coincide
fn linear_regression(xs: &[f64], ys: &[f64]) -> Option<RegressionResult> {
    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let sxx = xs.iter().map(|&x| (x - mean_x).powi(2)).sum::<f64>();
    let sxy = xs
        .iter()
        .zip(ys)
        .map(|(&x, &y)| (x - mean_x) * (y - mean_y))
        .sum::<f64>();

    if sxx <= f64::EPSILON * n {
        return None;
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    Some(RegressionResult { slope, intercept })
}
