//! Named-column numeric tables and feature alignment.
//!
//! A [`Dataset`] is the in-memory handoff format from the (external) data
//! provider: ordered feature names, one equally sized column of `f64` per
//! feature. The model core never reads files; it only aligns and projects
//! these tables into row-major matrices.

use std::collections::HashSet;

use log::debug;

use crate::error::{AakrError, Result};

/// A rectangular, fully numeric table with named feature columns.
///
/// Feature identity is the name; column order is preserved and meaningful
/// (it drives the deterministic intersection order used at fit time).
///
/// # Examples
///
/// ```
/// use aakr::dataset::Dataset;
///
/// let d = Dataset::from_columns(vec![
///     ("temp".into(), vec![1.0, 2.0]),
///     ("flow".into(), vec![3.0, 4.0]),
/// ]).unwrap();
///
/// assert_eq!(d.nrows(), 2);
/// assert_eq!(d.nfeatures(), 2);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl Dataset {
    /// Builds a dataset from `(name, column)` pairs.
    ///
    /// Fails when the table is empty, a column length disagrees with the
    /// first column, or a feature name repeats.
    pub fn from_columns(pairs: Vec<(String, Vec<f64>)>) -> Result<Self> {
        if pairs.is_empty() {
            return Err(AakrError::InsufficientData(
                "dataset has no feature columns".into(),
            ));
        }
        let nrows = pairs[0].1.len();
        if nrows == 0 {
            return Err(AakrError::InsufficientData(
                "dataset has no observations".into(),
            ));
        }

        let mut seen = HashSet::with_capacity(pairs.len());
        let mut names = Vec::with_capacity(pairs.len());
        let mut columns = Vec::with_capacity(pairs.len());
        for (name, column) in pairs {
            if column.len() != nrows {
                return Err(AakrError::DimensionMismatch {
                    expected: nrows,
                    got: column.len(),
                });
            }
            if !seen.insert(name.clone()) {
                return Err(AakrError::DataAlignment(format!(
                    "duplicate feature name '{name}'"
                )));
            }
            names.push(name);
            columns.push(column);
        }

        debug!(
            "Dataset built: {} observations x {} features",
            nrows,
            names.len()
        );
        Ok(Self { names, columns })
    }

    /// Builds a dataset from row-major data plus an ordered name list.
    ///
    /// Convenience for callers that already hold observations as rows.
    pub fn from_rows(names: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        if rows.is_empty() {
            return Err(AakrError::InsufficientData(
                "dataset has no observations".into(),
            ));
        }
        let nfeat = names.len();
        for row in &rows {
            if row.len() != nfeat {
                return Err(AakrError::DimensionMismatch {
                    expected: nfeat,
                    got: row.len(),
                });
            }
        }
        let columns: Vec<Vec<f64>> = (0..nfeat)
            .map(|j| rows.iter().map(|r| r[j]).collect())
            .collect();
        Self::from_columns(names.into_iter().zip(columns).collect())
    }

    /// Number of observations (rows).
    #[inline]
    pub fn nrows(&self) -> usize {
        self.columns.first().map(|c| c.len()).unwrap_or(0)
    }

    /// Number of feature columns.
    #[inline]
    pub fn nfeatures(&self) -> usize {
        self.names.len()
    }

    /// Ordered feature names.
    #[inline]
    pub fn feature_names(&self) -> &[String] {
        &self.names
    }

    /// Column values for `name`, if present.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.columns[i].as_slice())
    }

    /// Order-preserving feature intersection: this table's column order,
    /// filtered by membership in `other`. Deterministic for fixed inputs.
    pub fn intersect_features(&self, other: &Dataset) -> Vec<String> {
        let theirs: HashSet<&str> = other.names.iter().map(|n| n.as_str()).collect();
        self.names
            .iter()
            .filter(|n| theirs.contains(n.as_str()))
            .cloned()
            .collect()
    }

    /// Projects the table onto `features`, producing a row-major matrix
    /// with one row per observation and columns in `features` order.
    ///
    /// Fails when any requested feature is absent from this table.
    pub fn project(&self, features: &[String]) -> Result<Vec<Vec<f64>>> {
        let mut picked = Vec::with_capacity(features.len());
        for name in features {
            let idx = self.names.iter().position(|n| n == name).ok_or_else(|| {
                AakrError::DataAlignment(format!("feature '{name}' missing from table"))
            })?;
            picked.push(idx);
        }

        let nrows = self.nrows();
        let rows = (0..nrows)
            .map(|r| picked.iter().map(|&j| self.columns[j][r]).collect())
            .collect();
        Ok(rows)
    }

    /// New dataset keeping only the observations at `indices`, in order.
    /// Used by the fold partitioner.
    ///
    /// # Panics
    ///
    /// Panics on out-of-range indices.
    pub fn select_rows(&self, indices: &[usize]) -> Dataset {
        let columns = self
            .columns
            .iter()
            .map(|col| indices.iter().map(|&i| col[i]).collect())
            .collect();
        Dataset {
            names: self.names.clone(),
            columns,
        }
    }
}
