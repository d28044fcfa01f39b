//! Ordinary least-squares fit of one series against another.

use crate::error::{PipelineError, Result};
use crate::models::FitResult;

/// Fit `y = intercept + slope * x` by ordinary least squares.
///
/// Pairs with a missing value on either side are dropped first. At least two
/// pairs must remain and the x values must not all be equal.
pub fn fit_linear(xs: &[Option<f64>], ys: &[Option<f64>]) -> Result<FitResult> {
    if xs.len() != ys.len() {
        return Err(PipelineError::LengthMismatch {
            xs: xs.len(),
            ys: ys.len(),
        });
    }

    let (xs, ys): (Vec<f64>, Vec<f64>) = xs
        .iter()
        .zip(ys.iter())
        .filter_map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Some((*x, *y)),
            _ => None,
        })
        .unzip();

    if xs.len() < 2 {
        return Err(PipelineError::InsufficientData { valid: xs.len() });
    }

    // Compared exactly: rounding in the mean leaves a non-zero variance for
    // large constant inputs, and tiny but distinct inputs have a tiny one.
    if xs.iter().all(|x| *x == xs[0]) {
        return Err(PipelineError::DegenerateFit);
    }

    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    for (x, y) in xs.iter().zip(ys.iter()) {
        cov += (x - mean_x) * (y - mean_y);
        var_x += (x - mean_x).powi(2);
    }

    if var_x == 0.0 {
        return Err(PipelineError::DegenerateFit);
    }

    let slope = cov / var_x;
    let intercept = mean_y - slope * mean_x;
    let predicted: Vec<f64> = xs.iter().map(|x| intercept + slope * x).collect();

    let ss_tot: f64 = ys.iter().map(|y| (y - mean_y).powi(2)).sum();
    let ss_res: f64 = ys
        .iter()
        .zip(predicted.iter())
        .map(|(y, p)| (y - p).powi(2))
        .sum();
    let r_squared = (ss_tot > 0.0).then(|| 1.0 - ss_res / ss_tot);

    Ok(FitResult {
        slope,
        intercept,
        xs,
        ys,
        predicted,
        r_squared,
    })
}

/// Convenience wrapper for fully populated series.
pub fn fit_linear_values(xs: &[f64], ys: &[f64]) -> Result<FitResult> {
    let xs: Vec<Option<f64>> = xs.iter().copied().map(Some).collect();
    let ys: Vec<Option<f64>> = ys.iter().copied().map(Some).collect();
    fit_linear(&xs, &ys)
}
