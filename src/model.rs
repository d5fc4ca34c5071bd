//! Auto-Associative Kernel Regression core.
//!
//! Given a historical matrix of normal observations, each query row is
//! reconstructed as a kernel-weighted average of all historical rows:
//! closer rows receive exponentially larger weight, `w_i ∝ exp(-d_i²/h²)`,
//! with the bandwidth `h` controlling locality (small `h` approaches
//! nearest-neighbor behavior, large `h` approaches the global column mean).
//!
//! Two distance/weighting strategies share the reconstruction path:
//!
//! - [`Weighting::Euclidean`]: classic AAKR, aggregate Euclidean distance
//!   in standardized space.
//! - [`Weighting::RankPermutation`]: per-feature absolute normalized
//!   distances are ranked and the most-distant features are down-weighted
//!   before aggregation, so one corrupted sensor cannot mask genuine
//!   similarity on the healthy channels.

use log::{debug, info, trace, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::error::{AakrError, Result};
use crate::pipeline::Scaler;

/// Kernel weight mass below this falls back to uniform weighting.
const MIN_WEIGHT_MASS: f64 = 1e-12;

/// Distance/weighting strategy, selected at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Weighting {
    /// Aggregate Euclidean distance over all features.
    Euclidean,
    /// Per-feature rank weighting derived from the permutation of
    /// aggregate per-feature distances (masking-resistant).
    RankPermutation,
}

/// Immutable model configuration, validated at construction.
///
/// # Examples
///
/// ```
/// use aakr::model::{AakrConfig, Weighting};
///
/// let cfg = AakrConfig::new(5.0, Weighting::Euclidean).unwrap();
/// assert_eq!(cfg.bandwidth(), 5.0);
///
/// assert!(AakrConfig::new(0.0, Weighting::Euclidean).is_err());
/// ```
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct AakrConfig {
    h: f64,
    weighting: Weighting,
}

impl AakrConfig {
    /// Validates `h > 0` and finite.
    pub fn new(h: f64, weighting: Weighting) -> Result<Self> {
        if !h.is_finite() || h <= 0.0 {
            return Err(AakrError::InvalidConfig(format!(
                "bandwidth must be finite and > 0, got {h}"
            )));
        }
        Ok(Self { h, weighting })
    }

    /// Classic AAKR with the given bandwidth.
    pub fn euclidean(h: f64) -> Result<Self> {
        Self::new(h, Weighting::Euclidean)
    }

    /// Modified AAKR (rank-permutation weighting) with the given bandwidth.
    pub fn rank_permutation(h: f64) -> Result<Self> {
        Self::new(h, Weighting::RankPermutation)
    }

    #[inline]
    pub fn bandwidth(&self) -> f64 {
        self.h
    }

    #[inline]
    pub fn weighting(&self) -> Weighting {
        self.weighting
    }
}

/// Frozen fit-time state: intersected feature list plus the scaler
/// calibrated on the historical matrix restricted to those features.
#[derive(Clone, Debug)]
struct Fitted {
    features: Vec<String>,
    scaler: Scaler,
}

/// AAKR reconstruction model.
///
/// Lifecycle: `fit` captures the feature intersection and preprocessing
/// statistics; `transform` projects tables onto that frozen state;
/// `predict` reconstructs aligned query rows and stores the
/// variable-importance vector. Each `fit` replaces all previous state.
///
/// Not safe for concurrent `fit`/`predict` on one instance; use
/// independent instances per thread (cross-validation does).
#[derive(Clone, Debug)]
pub struct Aakr {
    config: AakrConfig,
    fitted: Option<Fitted>,
    vi: Option<Vec<f64>>,
}

impl Aakr {
    pub fn new(config: AakrConfig) -> Self {
        info!(
            "Initializing AAKR model: h={}, weighting={:?}",
            config.h, config.weighting
        );
        Self {
            config,
            fitted: None,
            vi: None,
        }
    }

    #[inline]
    pub fn config(&self) -> &AakrConfig {
        &self.config
    }

    #[inline]
    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Intersected feature list captured by the last `fit`.
    pub fn features(&self) -> Option<&[String]> {
        self.fitted.as_ref().map(|f| f.features.as_slice())
    }

    /// Variable-importance vector from the last `predict`: one
    /// non-negative scalar per feature.
    pub fn variable_importance(&self) -> Option<&[f64]> {
        self.vi.as_deref()
    }

    /// Captures the order-preserving feature intersection of `x` and `y`
    /// and calibrates the standardization pipeline on `x` restricted to
    /// that feature set. Replaces any previous fitted state.
    pub fn fit(&mut self, x: &Dataset, y: &Dataset) -> Result<()> {
        let features = x.intersect_features(y);
        if features.is_empty() {
            return Err(AakrError::DataAlignment(
                "historical and query data share no features".into(),
            ));
        }
        info!(
            "Fitting AAKR on {} historical rows, {} shared features (of {}/{})",
            x.nrows(),
            features.len(),
            x.nfeatures(),
            y.nfeatures()
        );

        let raw = x.project(&features)?;
        let scaler = Scaler::fit(&raw)?;
        self.fitted = Some(Fitted { features, scaler });
        self.vi = None;
        Ok(())
    }

    /// Projects both tables onto the fit-time feature list and applies the
    /// fit-time standardization. Row counts are preserved; column counts
    /// equal the intersected feature count.
    pub fn transform(&self, x: &Dataset, y: &Dataset) -> Result<(Vec<Vec<f64>>, Vec<Vec<f64>>)> {
        let fitted = self
            .fitted
            .as_ref()
            .ok_or(AakrError::NotFitted("transform"))?;
        let xt = fitted.scaler.transform(&x.project(&fitted.features)?)?;
        let yt = fitted.scaler.transform(&y.project(&fitted.features)?)?;
        trace!(
            "Transformed matrices: X {}x{}, Y {}x{}",
            xt.len(),
            fitted.features.len(),
            yt.len(),
            fitted.features.len()
        );
        Ok((xt, yt))
    }

    /// `fit` followed by `transform` on the same tables.
    pub fn fit_transform(
        &mut self,
        x: &Dataset,
        y: &Dataset,
    ) -> Result<(Vec<Vec<f64>>, Vec<Vec<f64>>)> {
        self.fit(x, y)?;
        self.transform(x, y)
    }

    /// Reconstructs each aligned query row as the kernel-weighted average
    /// of the aligned historical rows. Returns `(Y, Y_hat)` with identical
    /// shapes and stores the variable-importance vector.
    ///
    /// Inputs are the matrices produced by [`Self::transform`]; feature
    /// counts are re-checked defensively.
    pub fn predict(
        &mut self,
        x: &[Vec<f64>],
        y: &[Vec<f64>],
    ) -> Result<(Vec<Vec<f64>>, Vec<Vec<f64>>)> {
        let fitted = self.fitted.as_ref().ok_or(AakrError::NotFitted("predict"))?;
        let nfeat = fitted.features.len();
        check_matrix(x, nfeat)?;
        check_matrix(y, nfeat)?;
        if x.is_empty() {
            return Err(AakrError::InsufficientData(
                "historical matrix has no rows".into(),
            ));
        }
        if y.is_empty() {
            return Err(AakrError::InsufficientData(
                "query matrix has no rows".into(),
            ));
        }

        debug!(
            "Predicting {} query rows against {} historical rows ({:?})",
            y.len(),
            x.len(),
            self.config.weighting
        );
        let h2 = self.config.h * self.config.h;

        let (y_hat, vi) = match self.config.weighting {
            Weighting::Euclidean => predict_euclidean(x, y, h2),
            Weighting::RankPermutation => predict_rank_permutation(x, y, h2),
        };

        debug_assert_eq!(y_hat.len(), y.len());
        self.vi = Some(vi);
        Ok((y.to_vec(), y_hat))
    }
}

fn check_matrix(m: &[Vec<f64>], nfeat: usize) -> Result<()> {
    for row in m {
        if row.len() != nfeat {
            return Err(AakrError::DimensionMismatch {
                expected: nfeat,
                got: row.len(),
            });
        }
    }
    Ok(())
}

/// Classic AAKR: aggregate Euclidean distance per historical row.
///
/// VI here is the inverse of the mean kernel-weighted per-feature absolute
/// residual: features reconstructed closely score near 1.
fn predict_euclidean(x: &[Vec<f64>], y: &[Vec<f64>], h2: f64) -> (Vec<Vec<f64>>, Vec<f64>) {
    let nfeat = x[0].len();

    let per_row: Vec<(Vec<f64>, Vec<f64>)> = y
        .par_iter()
        .map(|q| {
            let d2: Vec<f64> = x
                .iter()
                .map(|row| {
                    row.iter()
                        .zip(q)
                        .map(|(&a, &b)| (a - b) * (a - b))
                        .sum::<f64>()
                })
                .collect();
            let w = kernel_weights(&d2, h2);
            let recon = weighted_average(x, &w, nfeat);

            // Kernel-weighted per-feature deviation, for VI.
            let mut dev = vec![0.0; nfeat];
            for (row, &wi) in x.iter().zip(&w) {
                for (d, (&a, &b)) in dev.iter_mut().zip(row.iter().zip(q)) {
                    *d += wi * (a - b).abs();
                }
            }
            (recon, dev)
        })
        .collect();

    let nq = per_row.len() as f64;
    let mut vi = vec![0.0; nfeat];
    for (_, dev) in &per_row {
        for (v, &d) in vi.iter_mut().zip(dev) {
            *v += d;
        }
    }
    for v in vi.iter_mut() {
        *v = 1.0 / (1.0 + *v / nq);
    }

    let y_hat = per_row.into_iter().map(|(recon, _)| recon).collect();
    (y_hat, vi)
}

/// Modified AAKR: per-feature normalized distances are ranked per query
/// row; the most-distant (most suspect) features receive linearly
/// smaller weights in the aggregate distance, so a single corrupted
/// channel cannot dominate the metric.
///
/// VI is the mean rank-decay feature weight across query rows.
fn predict_rank_permutation(x: &[Vec<f64>], y: &[Vec<f64>], h2: f64) -> (Vec<Vec<f64>>, Vec<f64>) {
    let nfeat = x[0].len();
    let scales = feature_scales(x);

    let per_row: Vec<(Vec<f64>, Vec<f64>)> = y
        .par_iter()
        .map(|q| {
            let dist = abs_normalized_distance_row(x, q, &scales);
            let order = feature_trust_order(&dist);
            let fw = rank_weights(&order);

            let d2: Vec<f64> = dist
                .iter()
                .map(|row| {
                    row.iter()
                        .zip(&fw)
                        .map(|(&d, &w)| w * d * d)
                        .sum::<f64>()
                })
                .collect();
            let w = kernel_weights(&d2, h2);
            let recon = weighted_average(x, &w, nfeat);
            (recon, fw)
        })
        .collect();

    let nq = per_row.len() as f64;
    let mut vi = vec![0.0; nfeat];
    for (_, fw) in &per_row {
        for (v, &f) in vi.iter_mut().zip(fw) {
            *v += f;
        }
    }
    for v in vi.iter_mut() {
        *v /= nq;
    }

    let y_hat = per_row.into_iter().map(|(recon, _)| recon).collect();
    (y_hat, vi)
}

/// Gaussian kernel weights from squared distances, normalized to sum 1.
///
/// Distances are shifted by the minimum before exponentiation; after
/// normalization this is identical to `exp(-d²/h²)` but cannot underflow
/// to an all-zero vector, so a coincident historical row dominates with
/// weight ≈ 1 instead of collapsing the weighting.
pub fn kernel_weights(d2: &[f64], h2: f64) -> Vec<f64> {
    let min_d2 = d2.iter().copied().fold(f64::INFINITY, f64::min);
    let mut w: Vec<f64> = d2.iter().map(|&d| (-(d - min_d2) / h2).exp()).collect();
    let mass: f64 = w.iter().sum();
    if !mass.is_finite() || mass <= MIN_WEIGHT_MASS {
        warn!("degenerate kernel weight mass ({mass}); falling back to uniform weights");
        let u = 1.0 / d2.len() as f64;
        return vec![u; d2.len()];
    }
    for v in w.iter_mut() {
        *v /= mass;
    }
    w
}

fn weighted_average(x: &[Vec<f64>], w: &[f64], nfeat: usize) -> Vec<f64> {
    let mut acc = vec![0.0; nfeat];
    for (row, &wi) in x.iter().zip(w) {
        for (a, &v) in acc.iter_mut().zip(row) {
            *a += wi * v;
        }
    }
    acc
}

/// Per-feature population standard deviation of a row-major matrix,
/// floored like the scaler's statistics (the two normalizations share
/// one floor). Recomputed from the historical matrix argument so the
/// scale stays tied to the reference population handed to `predict`.
/// An empty matrix yields an empty scale vector.
pub fn feature_scales(x: &[Vec<f64>]) -> Vec<f64> {
    Scaler::fit(x).map(|sc| sc.stds().to_vec()).unwrap_or_default()
}

/// Per-feature absolute normalized distance tensor between every query
/// row and every historical row: shape (query-rows, historical-rows,
/// features), entrywise ≥ 0. Normalization is the per-feature population
/// standard deviation of `x` (see [`feature_scales`]).
pub fn abs_normalized_distance(x: &[Vec<f64>], queries: &[Vec<f64>]) -> Result<Vec<Vec<Vec<f64>>>> {
    let nfeat = x.first().map(|r| r.len()).unwrap_or(0);
    check_matrix(x, nfeat)?;
    check_matrix(queries, nfeat)?;

    let scales = feature_scales(x);
    Ok(queries
        .par_iter()
        .map(|q| abs_normalized_distance_row(x, q, &scales))
        .collect())
}

/// Signed per-feature normalized deviation matrix for a single query row:
/// entry `(i, j)` is `(q_j - x_ij) / s_j` with the same normalization as
/// [`abs_normalized_distance`], shape (historical-rows x features). Unlike
/// the absolute tensor this keeps the direction of each deviation, so on a
/// standardized historical matrix its column means reproduce the query row
/// itself.
pub fn signed_normalized_deviation(x: &[Vec<f64>], query: &[f64]) -> Result<Vec<Vec<f64>>> {
    let nfeat = x.first().map(|r| r.len()).unwrap_or(0);
    check_matrix(x, nfeat)?;
    if query.len() != nfeat {
        return Err(AakrError::DimensionMismatch {
            expected: nfeat,
            got: query.len(),
        });
    }

    let scales = feature_scales(x);
    Ok(x.iter()
        .map(|row| {
            row.iter()
                .zip(query.iter().zip(&scales))
                .map(|(&a, (&b, &s))| (b - a) / s)
                .collect()
        })
        .collect())
}

/// Distance matrix (historical-rows x features) for a single query row.
pub(crate) fn abs_normalized_distance_row(
    x: &[Vec<f64>],
    q: &[f64],
    scales: &[f64],
) -> Vec<Vec<f64>> {
    x.iter()
        .map(|row| {
            row.iter()
                .zip(q.iter().zip(scales))
                .map(|(&a, (&b, &s))| (a - b).abs() / s)
                .collect()
        })
        .collect()
}

/// Feature indices ordered by decreasing column mean of a
/// (historical-rows x features) matrix. For an absolute distance matrix
/// that is most-suspect-first; for a signed deviation matrix it orders
/// features by the query's orientation. Ties break by feature index for
/// determinism.
fn feature_trust_order(dist: &[Vec<f64>]) -> Vec<usize> {
    let nfeat = dist.first().map(|r| r.len()).unwrap_or(0);
    let nrows = dist.len().max(1) as f64;

    let mut agg = vec![0.0; nfeat];
    for row in dist {
        for (a, &d) in agg.iter_mut().zip(row) {
            *a += d;
        }
    }
    for a in agg.iter_mut() {
        *a /= nrows;
    }

    let mut order: Vec<usize> = (0..nfeat).collect();
    order.sort_by(|&a, &b| {
        agg[b]
            .partial_cmp(&agg[a])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.cmp(&b))
    });
    order
}

/// Permutation matrix derived from one query row's signed deviation
/// matrix (see [`signed_normalized_deviation`]), shape
/// (historical-rows x features).
///
/// Features are ranked by decreasing column mean; the returned F x F
/// matrix `P` reorders a per-feature vector into that ranking via `v · P`.
/// On a standardized historical matrix the deviation column means equal
/// the query row, so projecting the query row through `P` yields its
/// values sorted in non-increasing order.
pub fn permutation_matrix(dev: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let order = feature_trust_order(dev);
    let nfeat = order.len();
    let mut p = vec![vec![0.0; nfeat]; nfeat];
    for (pos, &feat) in order.iter().enumerate() {
        p[feat][pos] = 1.0;
    }
    p
}

/// Linear rank-decay feature weights from a most-suspect-first ordering:
/// the most suspect feature gets weight 1, the most trusted weight F,
/// normalized to sum 1. No feature exceeds `2 / (F + 1)` of the mass, so
/// a query row coinciding with a historical row on all features still
/// dominates the kernel.
fn rank_weights(order_desc: &[usize]) -> Vec<f64> {
    let nfeat = order_desc.len();
    let mass = (nfeat * (nfeat + 1)) as f64 / 2.0;
    let mut fw = vec![0.0; nfeat];
    for (pos, &feat) in order_desc.iter().enumerate() {
        fw[feat] = (pos + 1) as f64 / mass;
    }
    fw
}
