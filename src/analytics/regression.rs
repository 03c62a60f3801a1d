//! Least-squares regression
//!
//! Column standardization and least squares with an intercept. The normal
//! equations are solved through a symmetric eigendecomposition, so collinear
//! or underdetermined systems still get the minimum-norm fit. Both are fit
//! on a single request's training set and dropped afterwards.

use thiserror::Error;

/// Columns whose spread is below this are treated as constant
const CONSTANT_EPSILON: f64 = 1e-12;

/// Eigenvalues below this fraction of the largest are treated as zero
const RANK_TOLERANCE: f64 = 1e-10;

/// Off-diagonal mass, relative to the whole matrix, at which Jacobi stops
const CONVERGENCE_TOLERANCE: f64 = 1e-24;

const MAX_SWEEPS: usize = 100;

/// Errors from fitting a linear model
#[derive(Debug, Error, PartialEq)]
pub enum FitError {
    #[error("Not enough samples to fit: {0}")]
    InsufficientData(usize),

    #[error("Least-squares solve did not produce a usable fit")]
    Singular,

    #[error("Samples contain NaN or infinite values")]
    NonFinite,

    #[error("Rows have inconsistent lengths")]
    Shape,
}

/// Zero-mean, unit-variance rescaling per column
#[derive(Debug, Clone)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    /// Fit column means and (population) standard deviations.
    ///
    /// Constant columns keep a scale of 1, so they transform to all zeros.
    pub fn fit(rows: &[Vec<f64>]) -> Self {
        let width = rows.first().map_or(0, Vec::len);
        let n = rows.len().max(1) as f64;

        let mut means = vec![0.0; width];
        for row in rows {
            for (m, v) in means.iter_mut().zip(row) {
                *m += v / n;
            }
        }

        let mut scales = vec![0.0; width];
        for row in rows {
            for ((s, v), m) in scales.iter_mut().zip(row).zip(&means) {
                *s += (v - m).powi(2) / n;
            }
        }
        for s in scales.iter_mut() {
            *s = s.sqrt();
            if *s < CONSTANT_EPSILON || !s.is_finite() {
                *s = 1.0;
            }
        }

        Self { means, scales }
    }

    pub fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(&self.means)
            .zip(&self.scales)
            .map(|((v, m), s)| (v - m) / s)
            .collect()
    }

    pub fn fit_transform(rows: &[Vec<f64>]) -> (Self, Vec<Vec<f64>>) {
        let scaler = Self::fit(rows);
        let scaled = rows.iter().map(|r| scaler.transform(r)).collect();
        (scaler, scaled)
    }
}

/// A fitted `y = intercept + coefficients . x` model
#[derive(Debug, Clone)]
pub struct LinearModel {
    intercept: f64,
    coefficients: Vec<f64>,
}

impl LinearModel {
    /// Least squares with an intercept.
    ///
    /// Constant columns carry no information and get a zero coefficient.
    /// When the remaining columns are collinear or outnumber the samples,
    /// the solution with the smallest coefficient norm is returned.
    pub fn fit(x: &[Vec<f64>], y: &[f64]) -> Result<Self, FitError> {
        let n = x.len();
        if n < 2 || y.len() != n {
            return Err(FitError::InsufficientData(n.min(y.len())));
        }
        let width = x[0].len();
        if x.iter().any(|row| row.len() != width) {
            return Err(FitError::Shape);
        }
        if x.iter().flatten().chain(y).any(|v| !v.is_finite()) {
            return Err(FitError::NonFinite);
        }

        let col_means: Vec<f64> = (0..width)
            .map(|j| x.iter().map(|row| row[j]).sum::<f64>() / n as f64)
            .collect();
        let y_mean = y.iter().sum::<f64>() / n as f64;

        let active: Vec<usize> = (0..width)
            .filter(|&j| {
                x.iter()
                    .any(|row| (row[j] - col_means[j]).abs() > CONSTANT_EPSILON)
            })
            .collect();

        let p = active.len();
        let mut xtx = vec![vec![0.0; p]; p];
        let mut xty = vec![0.0; p];
        for (row, target) in x.iter().zip(y) {
            let centered: Vec<f64> = active.iter().map(|&j| row[j] - col_means[j]).collect();
            let dy = target - y_mean;
            for a in 0..p {
                xty[a] += centered[a] * dy;
                for b in 0..p {
                    xtx[a][b] += centered[a] * centered[b];
                }
            }
        }

        let beta = minimum_norm_solve(xtx, &xty)?;

        let mut coefficients = vec![0.0; width];
        for (&j, b) in active.iter().zip(&beta) {
            coefficients[j] = *b;
        }
        let intercept = y_mean
            - coefficients
                .iter()
                .zip(&col_means)
                .map(|(c, m)| c * m)
                .sum::<f64>();

        if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err(FitError::Singular);
        }

        Ok(Self {
            intercept,
            coefficients,
        })
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(c, v)| c * v)
                .sum::<f64>()
    }

    /// Coefficient of determination on the given samples.
    ///
    /// A constant target scores 1 when reproduced exactly, 0 otherwise.
    pub fn r_squared(&self, x: &[Vec<f64>], y: &[f64]) -> f64 {
        if y.is_empty() {
            return 0.0;
        }
        let y_mean = y.iter().sum::<f64>() / y.len() as f64;

        let ss_res: f64 = x
            .iter()
            .zip(y)
            .map(|(row, t)| (t - self.predict(row)).powi(2))
            .sum();
        let ss_tot: f64 = y.iter().map(|t| (t - y_mean).powi(2)).sum();

        if ss_tot < CONSTANT_EPSILON {
            return if ss_res < 1e-9 { 1.0 } else { 0.0 };
        }
        1.0 - ss_res / ss_tot
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }
}

/// Minimum-norm solution of `gram * beta = moment` for a symmetric positive
/// semi-definite `gram`
fn minimum_norm_solve(gram: Vec<Vec<f64>>, moment: &[f64]) -> Result<Vec<f64>, FitError> {
    let p = moment.len();
    let (eigenvalues, eigenvectors) = symmetric_eigen(gram)?;
    let largest = eigenvalues.iter().copied().fold(0.0_f64, f64::max);

    let mut beta = vec![0.0; p];
    for (k, &lambda) in eigenvalues.iter().enumerate() {
        // Null directions of the design contribute nothing
        if !(lambda > RANK_TOLERANCE * largest) {
            continue;
        }
        let weight = (0..p).map(|i| eigenvectors[i][k] * moment[i]).sum::<f64>() / lambda;
        for (i, b) in beta.iter_mut().enumerate() {
            *b += weight * eigenvectors[i][k];
        }
    }
    Ok(beta)
}

/// Cyclic Jacobi eigendecomposition of a symmetric matrix.
///
/// Returns the eigenvalues and a matrix holding the matching eigenvectors as
/// columns.
fn symmetric_eigen(mut a: Vec<Vec<f64>>) -> Result<(Vec<f64>, Vec<Vec<f64>>), FitError> {
    let n = a.len();
    let mut v: Vec<Vec<f64>> = (0..n)
        .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect();
    let total: f64 = a.iter().flatten().map(|x| x * x).sum();

    for _ in 0..MAX_SWEEPS {
        let mut off = 0.0;
        for i in 0..n {
            for j in (i + 1)..n {
                off += a[i][j] * a[i][j];
            }
        }
        if off <= CONVERGENCE_TOLERANCE * total {
            let eigenvalues = (0..n).map(|i| a[i][i]).collect();
            return Ok((eigenvalues, v));
        }

        for p in 0..n {
            for q in (p + 1)..n {
                if a[p][q] == 0.0 {
                    continue;
                }
                let theta = (a[q][q] - a[p][p]) / (2.0 * a[p][q]);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for row in a.iter_mut() {
                    let (akp, akq) = (row[p], row[q]);
                    row[p] = c * akp - s * akq;
                    row[q] = s * akp + c * akq;
                }
                for k in 0..n {
                    let (apk, aqk) = (a[p][k], a[q][k]);
                    a[p][k] = c * apk - s * aqk;
                    a[q][k] = s * apk + c * aqk;
                }
                for row in v.iter_mut() {
                    let (vkp, vkq) = (row[p], row[q]);
                    row[p] = c * vkp - s * vkq;
                    row[q] = s * vkp + c * vkq;
                }
            }
        }
    }

    Err(FitError::Singular)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaler_standardizes_columns() {
        let rows = vec![vec![1.0, 10.0], vec![3.0, 10.0], vec![5.0, 10.0]];
        let (_, scaled) = StandardScaler::fit_transform(&rows);

        let col0: Vec<f64> = scaled.iter().map(|r| r[0]).collect();
        let mean: f64 = col0.iter().sum::<f64>() / 3.0;
        let var: f64 = col0.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 3.0;
        assert!(mean.abs() < 1e-12);
        assert!((var - 1.0).abs() < 1e-12);

        // Constant column maps to zeros
        assert!(scaled.iter().all(|r| r[1] == 0.0));
    }

    #[test]
    fn test_fit_recovers_exact_line() {
        let x: Vec<Vec<f64>> = (0..6).map(|i| vec![i as f64, (i * i) as f64]).collect();
        let y: Vec<f64> = x.iter().map(|r| 1.5 + 2.0 * r[0] - 0.5 * r[1]).collect();

        let model = LinearModel::fit(&x, &y).unwrap();
        assert!((model.intercept() - 1.5).abs() < 1e-8);
        assert!((model.coefficients()[0] - 2.0).abs() < 1e-8);
        assert!((model.coefficients()[1] + 0.5).abs() < 1e-8);
        assert!((model.r_squared(&x, &y) - 1.0).abs() < 1e-9);
        assert!((model.predict(&[10.0, 100.0]) - (1.5 + 20.0 - 50.0)).abs() < 1e-6);
    }

    #[test]
    fn test_constant_columns_are_ignored() {
        let x = vec![vec![1.0, 7.0], vec![2.0, 7.0], vec![3.0, 7.0]];
        let y = vec![2.0, 4.0, 6.0];

        let model = LinearModel::fit(&x, &y).unwrap();
        assert_eq!(model.coefficients()[1], 0.0);
        assert!((model.predict(&[4.0, 7.0]) - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_collinear_columns_share_the_weight() {
        let x = vec![
            vec![1.0, 2.0],
            vec![2.0, 4.0],
            vec![3.0, 6.0],
            vec![4.0, 8.0],
        ];
        let y = vec![1.0, 2.0, 3.0, 4.0];

        // Any b0 + 2 * b1 = 1 fits; the smallest is (0.2, 0.4)
        let model = LinearModel::fit(&x, &y).unwrap();
        assert!((model.coefficients()[0] - 0.2).abs() < 1e-9);
        assert!((model.coefficients()[1] - 0.4).abs() < 1e-9);
        assert!(model.intercept().abs() < 1e-9);
        assert!((model.predict(&[5.0, 10.0]) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_more_columns_than_samples_fits_exactly() {
        let x = vec![vec![1.0, 0.0, 3.0], vec![0.0, 1.0, 5.0]];
        let y = vec![1.0, 2.0];

        let model = LinearModel::fit(&x, &y).unwrap();
        assert!((model.predict(&x[0]) - 1.0).abs() < 1e-9);
        assert!((model.predict(&x[1]) - 2.0).abs() < 1e-9);

        // Coefficients lie along the one centered direction the rows span
        let expected = [-1.0 / 6.0, 1.0 / 6.0, 1.0 / 3.0];
        for (c, e) in model.coefficients().iter().zip(expected) {
            assert!((c - e).abs() < 1e-9, "{} != {}", c, e);
        }
        assert!((model.r_squared(&x, &y) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_conflicting_targets_get_least_squares_fit() {
        // Duplicate rows with different targets predict their average
        let x = vec![
            vec![1.0, 1.0, 0.0],
            vec![1.0, 1.0, 0.0],
            vec![0.0, 2.0, 1.0],
        ];
        let y = vec![2.0, 4.0, 9.0];

        let model = LinearModel::fit(&x, &y).unwrap();
        assert!((model.predict(&x[0]) - 3.0).abs() < 1e-9);
        assert!((model.predict(&x[2]) - 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_non_finite_samples_are_rejected() {
        let x = vec![vec![1.0], vec![f64::NAN], vec![3.0]];
        let y = vec![1.0, 2.0, 3.0];
        assert_eq!(LinearModel::fit(&x, &y).unwrap_err(), FitError::NonFinite);

        let x = vec![vec![1.0], vec![2.0], vec![3.0]];
        let y = vec![1.0, f64::INFINITY, 3.0];
        assert_eq!(LinearModel::fit(&x, &y).unwrap_err(), FitError::NonFinite);
    }

    #[test]
    fn test_symmetric_eigen_diagonalizes() {
        let a = vec![vec![2.0, 1.0], vec![1.0, 2.0]];
        let (values, vectors) = symmetric_eigen(a.clone()).unwrap();

        let mut sorted = values.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert!((sorted[0] - 1.0).abs() < 1e-12);
        assert!((sorted[1] - 3.0).abs() < 1e-12);

        // A v = lambda v for every column
        for k in 0..2 {
            for i in 0..2 {
                let av: f64 = (0..2).map(|j| a[i][j] * vectors[j][k]).sum();
                assert!((av - values[k] * vectors[i][k]).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_too_few_samples() {
        let x = vec![vec![1.0]];
        let y = vec![1.0];
        assert_eq!(
            LinearModel::fit(&x, &y).unwrap_err(),
            FitError::InsufficientData(1)
        );
    }

    #[test]
    fn test_r_squared_constant_target() {
        let x = vec![vec![1.0], vec![2.0], vec![3.0]];
        let y = vec![4.0, 4.0, 4.0];
        let model = LinearModel::fit(&x, &y).unwrap();
        assert_eq!(model.r_squared(&x, &y), 1.0);
    }

    #[test]
    fn test_r_squared_partial_fit() {
        let x = vec![vec![1.0], vec![2.0], vec![3.0], vec![4.0]];
        let y = vec![1.0, 3.0, 2.0, 4.0];
        let model = LinearModel::fit(&x, &y).unwrap();
        let r2 = model.r_squared(&x, &y);
        assert!(r2 > 0.0 && r2 < 1.0);
    }
}
