//! Per-feature standardization calibrated on historical data only.
//!
//! The scaler is fitted once inside [`crate::model::Aakr::fit`] on the
//! historical matrix and then frozen: query matrices are transformed with
//! fit-time statistics, never refitted.

use log::debug;

use crate::error::{AakrError, Result};

/// Minimum standard deviation; constant channels transform to zero
/// instead of dividing by zero.
const MIN_STD: f64 = 1e-9;

/// Per-feature mean/std standardizer (population statistics).
#[derive(Clone, Debug)]
pub struct Scaler {
    mean: Vec<f64>,
    std: Vec<f64>,
}

impl Scaler {
    /// Fits per-feature mean and population standard deviation from a
    /// row-major matrix.
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self> {
        let nrows = rows.len();
        if nrows == 0 {
            return Err(AakrError::InsufficientData(
                "cannot fit scaler on an empty matrix".into(),
            ));
        }
        let nfeat = rows[0].len();

        let mut mean = vec![0.0; nfeat];
        for row in rows {
            if row.len() != nfeat {
                return Err(AakrError::DimensionMismatch {
                    expected: nfeat,
                    got: row.len(),
                });
            }
            for (m, &v) in mean.iter_mut().zip(row) {
                *m += v;
            }
        }
        for m in mean.iter_mut() {
            *m /= nrows as f64;
        }

        let mut var = vec![0.0; nfeat];
        for row in rows {
            for (v, (&x, &m)) in var.iter_mut().zip(row.iter().zip(&mean)) {
                let d = x - m;
                *v += d * d;
            }
        }
        let std = var
            .iter()
            .map(|&v| (v / nrows as f64).sqrt().max(MIN_STD))
            .collect();

        debug!("Scaler fitted on {} rows x {} features", nrows, nfeat);
        Ok(Self { mean, std })
    }

    /// Standardizes a row-major matrix with fit-time statistics.
    pub fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        let nfeat = self.mean.len();
        rows.iter()
            .map(|row| {
                if row.len() != nfeat {
                    return Err(AakrError::DimensionMismatch {
                        expected: nfeat,
                        got: row.len(),
                    });
                }
                Ok(row
                    .iter()
                    .zip(self.mean.iter().zip(&self.std))
                    .map(|(&x, (&m, &s))| (x - m) / s)
                    .collect())
            })
            .collect()
    }

    /// Fit-time per-feature means.
    #[inline]
    pub fn means(&self) -> &[f64] {
        &self.mean
    }

    /// Fit-time per-feature standard deviations (floored).
    #[inline]
    pub fn stds(&self) -> &[f64] {
        &self.std
    }
}
