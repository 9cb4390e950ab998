//! Correlation matrix validation and Cholesky factorization for the Gaussian copula.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Absolute tolerance for symmetry and for treating a pivot as zero.
const PSD_TOLERANCE: f64 = 1e-9;

/// Row-major correlation matrix, ordered like the scenario's parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationMatrix {
    rows: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn new(rows: Vec<Vec<f64>>) -> Self {
        Self { rows }
    }

    pub fn identity(n: usize) -> Self {
        let rows = (0..n)
            .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
            .collect();
        Self { rows }
    }

    pub fn dimension(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Shape, range, unit diagonal and symmetry checks. Positive semi-definiteness
    /// is established by [CorrelationMatrix::cholesky].
    pub fn validate(&self, expected: usize) -> Result<(), ValidationError> {
        if self.rows.len() != expected {
            return Err(ValidationError::CorrelationDimension {
                expected,
                rows: self.rows.len(),
            });
        }
        for (row, values) in self.rows.iter().enumerate() {
            if values.len() != expected {
                return Err(ValidationError::CorrelationRowLength {
                    row,
                    len: values.len(),
                    expected,
                });
            }
            for (col, &value) in values.iter().enumerate() {
                if !value.is_finite() || !(-1.0..=1.0).contains(&value) {
                    return Err(ValidationError::CorrelationOutOfRange { row, col, value });
                }
            }
        }
        for i in 0..expected {
            let diagonal = self.rows[i][i];
            if (diagonal - 1.0).abs() > PSD_TOLERANCE {
                return Err(ValidationError::CorrelationDiagonal {
                    index: i,
                    value: diagonal,
                });
            }
            for j in (i + 1)..expected {
                if (self.rows[i][j] - self.rows[j][i]).abs() > PSD_TOLERANCE {
                    return Err(ValidationError::CorrelationAsymmetric { row: i, col: j });
                }
            }
        }
        Ok(())
    }

    /// Validate and factor into a lower-triangular `L` with `L·Lᵀ = C`.
    ///
    /// Semi-definite matrices are accepted: a pivot within tolerance of zero
    /// yields a zero column, as long as the remaining entries of that column
    /// are also zero. A negative pivot means the matrix is not PSD.
    pub fn cholesky(&self, expected: usize) -> Result<CholeskyFactor, ValidationError> {
        self.validate(expected)?;
        let n = expected;
        let mut l = vec![0.0; n * n];
        for j in 0..n {
            let mut pivot = self.rows[j][j];
            for k in 0..j {
                pivot -= l[j * n + k] * l[j * n + k];
            }
            if pivot < -PSD_TOLERANCE {
                return Err(ValidationError::CorrelationNotPositiveSemiDefinite {
                    pivot: j,
                    value: pivot,
                });
            }
            let diagonal = if pivot <= PSD_TOLERANCE { 0.0 } else { pivot.sqrt() };
            l[j * n + j] = diagonal;
            for i in (j + 1)..n {
                let mut sum = self.rows[i][j];
                for k in 0..j {
                    sum -= l[i * n + k] * l[j * n + k];
                }
                if diagonal == 0.0 {
                    if sum.abs() > PSD_TOLERANCE * 10.0 {
                        return Err(ValidationError::CorrelationNotPositiveSemiDefinite {
                            pivot: j,
                            value: pivot,
                        });
                    }
                    l[i * n + j] = 0.0;
                } else {
                    l[i * n + j] = sum / diagonal;
                }
            }
        }
        Ok(CholeskyFactor { n, l })
    }
}

/// Lower-triangular factor stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct CholeskyFactor {
    n: usize,
    l: Vec<f64>,
}

impl CholeskyFactor {
    pub fn dimension(&self) -> usize {
        self.n
    }

    /// `out = L · z`
    #[inline]
    pub fn apply(&self, z: &[f64], out: &mut [f64]) {
        for i in 0..self.n {
            let row = &self.l[i * self.n..i * self.n + i + 1];
            out[i] = row.iter().zip(z).map(|(a, b)| a * b).sum();
        }
    }

    pub fn entry(&self, row: usize, col: usize) -> f64 {
        self.l[row * self.n + col]
    }
}
