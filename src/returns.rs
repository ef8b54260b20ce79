//! # Return Samples
//!
//! $$
//! \hat\mu = \frac{1}{T}\sum_t \mathbf{r}_t,\qquad
//! \hat\Sigma = \frac{1}{T-1}\sum_t (\mathbf{r}_t-\hat\mu)(\mathbf{r}_t-\hat\mu)^\top
//! $$
//!
//! Historical return matrix keyed by asset name plus its sufficient
//! statistics for mean-variance optimization.

use ndarray::Array1;
use ndarray::Array2;
use ndarray::Axis;

use crate::error::OptimizeError;

/// Time-ordered sample of per-asset returns.
///
/// Rows are observations in time order, columns follow the asset ordering.
/// Immutable after construction; all optimizer inputs derive from it.
#[derive(Clone, Debug)]
pub struct ReturnSample {
  assets: Vec<String>,
  observations: Array2<f64>,
}

/// Sufficient statistics of a [`ReturnSample`].
#[derive(Clone, Debug)]
pub struct SampleStats {
  /// Per-asset mean return.
  pub mu: Array1<f64>,
  /// Sample covariance matrix (N-1 denominator).
  pub cov: Array2<f64>,
  /// Raw observations, rows in time order.
  pub observations: Array2<f64>,
}

impl ReturnSample {
  /// Build a sample from asset names and a time-by-asset return matrix.
  ///
  /// Rejects duplicate or empty names, a column count that disagrees with
  /// the asset list, and non-finite values.
  pub fn new(assets: Vec<String>, observations: Array2<f64>) -> Result<Self, OptimizeError> {
    if assets.is_empty() {
      return Err(OptimizeError::SchemaMismatch("empty asset set".into()));
    }

    if observations.ncols() != assets.len() {
      return Err(OptimizeError::SchemaMismatch(format!(
        "{} assets named but observations have {} columns",
        assets.len(),
        observations.ncols()
      )));
    }

    for (i, name) in assets.iter().enumerate() {
      if name.is_empty() {
        return Err(OptimizeError::SchemaMismatch("empty asset name".into()));
      }
      if assets[..i].contains(name) {
        return Err(OptimizeError::SchemaMismatch(format!(
          "duplicate asset name '{name}'"
        )));
      }
    }

    if observations.iter().any(|v| !v.is_finite()) {
      return Err(OptimizeError::SchemaMismatch(
        "observations contain non-finite values".into(),
      ));
    }

    Ok(Self {
      assets,
      observations,
    })
  }

  /// Ordered asset names.
  pub fn assets(&self) -> &[String] {
    &self.assets
  }

  /// Number of time observations.
  pub fn n_observations(&self) -> usize {
    self.observations.nrows()
  }

  /// Number of assets.
  pub fn n_assets(&self) -> usize {
    self.assets.len()
  }

  /// Raw observation matrix, rows in time order.
  pub fn observations(&self) -> &Array2<f64> {
    &self.observations
  }

  /// Return of `asset` at time index `t`, if both exist.
  pub fn value(&self, asset: &str, t: usize) -> Option<f64> {
    let col = self.assets.iter().position(|a| a == asset)?;
    self.observations.get((t, col)).copied()
  }

  /// Per-asset mean return.
  pub fn mean_returns(&self) -> Array1<f64> {
    self
      .observations
      .mean_axis(Axis(0))
      .unwrap_or_else(|| Array1::zeros(self.assets.len()))
  }

  /// Sample covariance matrix with N-1 denominator.
  ///
  /// A single-observation sample yields the zero matrix.
  pub fn covariance(&self) -> Array2<f64> {
    let n = self.observations.nrows();
    let k = self.assets.len();
    if n < 2 {
      return Array2::zeros((k, k));
    }

    let mu = self.mean_returns();
    let centered = &self.observations - &mu;
    centered.t().dot(&centered) / (n - 1) as f64
  }

  /// Bundle mean, covariance, and raw observations for the optimizer.
  pub fn stats(&self) -> SampleStats {
    SampleStats {
      mu: self.mean_returns(),
      cov: self.covariance(),
      observations: self.observations.clone(),
    }
  }
}
