//! Ordinary Least Squares regression with coefficient standard errors.
//!
//! Used by the unit-root test, which needs t-statistics and information
//! criteria of small auxiliary regressions.

use crate::error::{ForecastError, Result};

/// Relative pivot size under which the design is treated as singular.
const PIVOT_TOLERANCE: f64 = 1e-12;

/// Fitted OLS regression.
#[derive(Debug, Clone)]
pub struct OLSResult {
    /// Coefficients, one per design column, in column order.
    pub coefficients: Vec<f64>,
    /// Standard errors of the coefficients.
    pub std_errors: Vec<f64>,
    /// Residual sum of squares.
    pub rss: f64,
    /// Number of observations.
    pub nobs: usize,
}

impl OLSResult {
    /// Number of estimated parameters.
    pub fn num_params(&self) -> usize {
        self.coefficients.len()
    }

    /// t-statistic of coefficient `index`.
    pub fn t_value(&self, index: usize) -> f64 {
        match (self.coefficients.get(index), self.std_errors.get(index)) {
            (Some(&b), Some(&se)) if se > 0.0 => b / se,
            _ => f64::NAN,
        }
    }

    /// Gaussian log likelihood at the OLS estimate.
    pub fn log_likelihood(&self) -> f64 {
        let n = self.nobs as f64;
        -0.5 * n * ((2.0 * std::f64::consts::PI).ln() + (self.rss / n).ln() + 1.0)
    }

    /// Akaike information criterion.
    pub fn aic(&self) -> f64 {
        -2.0 * self.log_likelihood() + 2.0 * self.num_params() as f64
    }
}

/// Fit `y = X @ beta` where `columns` are the design columns of `X`.
///
/// No intercept is added; pass a column of ones when one is wanted.
///
/// # Errors
/// * `EmptyData` when there are no observations or no columns
/// * `InsufficientData` when there are not more observations than columns
/// * `InvalidParameter` on ragged columns or a singular design
pub fn ols_fit(y: &[f64], columns: &[Vec<f64>]) -> Result<OLSResult> {
    let n = y.len();
    let k = columns.len();

    if n == 0 || k == 0 {
        return Err(ForecastError::EmptyData);
    }
    if let Some(col) = columns.iter().find(|c| c.len() != n) {
        return Err(ForecastError::InvalidParameter(format!(
            "design column has {} rows, expected {}",
            col.len(),
            n
        )));
    }
    if n <= k {
        return Err(ForecastError::InsufficientData {
            needed: k + 1,
            got: n,
        });
    }

    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    for i in 0..k {
        for j in 0..=i {
            let s: f64 = columns[i].iter().zip(&columns[j]).map(|(a, b)| a * b).sum();
            xtx[i][j] = s;
            xtx[j][i] = s;
        }
        xty[i] = columns[i].iter().zip(y).map(|(a, b)| a * b).sum();
    }

    let chol = cholesky(&xtx).ok_or_else(|| {
        ForecastError::InvalidParameter("OLS regression failed: singular design matrix".into())
    })?;
    let beta = cholesky_solve(&chol, &xty);

    let rss: f64 = (0..n)
        .map(|t| {
            let fitted: f64 = (0..k).map(|j| columns[j][t] * beta[j]).sum();
            (y[t] - fitted).powi(2)
        })
        .sum();
    let sigma_sq = rss / (n - k) as f64;

    // Diagonal of (X'X)^-1 via unit right-hand sides.
    let std_errors = (0..k)
        .map(|j| {
            let mut unit = vec![0.0; k];
            unit[j] = 1.0;
            let inv_col = cholesky_solve(&chol, &unit);
            (sigma_sq * inv_col[j]).max(0.0).sqrt()
        })
        .collect();

    Ok(OLSResult {
        coefficients: beta,
        std_errors,
        rss,
        nobs: n,
    })
}

/// Lower-triangular Cholesky factor of a symmetric positive definite matrix.
fn cholesky(a: &[Vec<f64>]) -> Option<Vec<Vec<f64>>> {
    let n = a.len();
    let mut l = vec![vec![0.0; n]; n];

    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }

            if i == j {
                if !sum.is_finite() || sum <= PIVOT_TOLERANCE * a[i][i].abs() {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    Some(l)
}

/// Solve `L L' x = b` given the Cholesky factor `L`.
fn cholesky_solve(l: &[Vec<f64>], b: &[f64]) -> Vec<f64> {
    let n = b.len();

    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * y[j];
        }
        y[i] = sum / l[i][i];
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum -= l[j][i] * x[j];
        }
        x[i] = sum / l[i][i];
    }

    x
}
