//! Auto-Associative Kernel Regression (AAKR) for multivariate sensor
//! fault detection.
//!
//! Given a corpus of historical "normal" observations, the model
//! reconstructs an expected value for each incoming observation as a
//! kernel-weighted average of similar historical observations; deviation
//! between the actual and reconstructed observation signals a faulty
//! channel. Two weighting strategies are provided:
//!
//! - classic AAKR over aggregate Euclidean distance, and
//! - a modified variant using per-feature rank-permutation weighting that
//!   resists masking by a single corrupted sensor.
//!
//! A seed-deterministic k-fold cross-validation harness and a bandwidth
//! grid search select the kernel bandwidth.
//!
//! # Example
//!
//! ```
//! use aakr::dataset::Dataset;
//! use aakr::model::{Aakr, AakrConfig, Weighting};
//!
//! let x = Dataset::from_columns(vec![
//!     ("temp".into(), vec![1.0, 2.0, 3.0, 4.0]),
//!     ("flow".into(), vec![0.5, 0.6, 0.7, 0.8]),
//! ]).unwrap();
//! let y = Dataset::from_columns(vec![
//!     ("temp".into(), vec![2.5]),
//!     ("flow".into(), vec![0.65]),
//! ]).unwrap();
//!
//! let mut model = Aakr::new(AakrConfig::new(1.0, Weighting::Euclidean).unwrap());
//! let (xt, yt) = model.fit_transform(&x, &y).unwrap();
//! let (obs, recon) = model.predict(&xt, &yt).unwrap();
//!
//! assert_eq!(obs.len(), recon.len());
//! assert!(model.variable_importance().is_some());
//! ```

pub mod dataset;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod validation;

#[cfg(test)]
mod tests;
