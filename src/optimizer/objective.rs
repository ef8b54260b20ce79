//! # Objective Evaluation
//!
//! $$
//! \mathcal{L}(\mathbf{w}) = \sum_k m_k\, s_k\, f_k(\mathbf{w}),\qquad
//! s_k = \begin{cases} +1 & \text{minimized term} \\ -1 & \text{maximized term} \end{cases}
//! $$
//!
//! Evaluates each objective kind on a candidate weight vector and combines
//! them under the minimization convention: risk terms enter positively,
//! return and maximized custom terms are negated.

use ndarray::Array1;
use ndarray::Array2;

use crate::optimizer::types::TermValue;
use crate::returns::SampleStats;
use crate::spec::Direction;
use crate::spec::ObjectiveKind;
use crate::spec::ObjectiveTerm;
use crate::spec::ReturnKind;
use crate::spec::RiskKind;

/// Maximum peak-to-trough decline of the cumulative portfolio value implied
/// by applying `weights` to the observations in time order.
///
/// Returned as a positive fraction of the running peak; zero for a path that
/// never declines.
pub fn max_drawdown(weights: &Array1<f64>, observations: &Array2<f64>) -> f64 {
  let mut wealth = 1.0;
  let mut peak = 1.0;
  let mut drawdown: f64 = 0.0;

  for row in observations.rows() {
    let r = row.dot(weights);
    wealth *= 1.0 + r;
    if wealth > peak {
      peak = wealth;
    } else if peak > 0.0 {
      drawdown = drawdown.max((peak - wealth) / peak);
    }
  }

  drawdown
}

/// Objective terms bound to the sample statistics they are evaluated on.
pub struct ObjectiveEvaluator<'a> {
  terms: &'a [ObjectiveTerm],
  stats: &'a SampleStats,
}

impl<'a> ObjectiveEvaluator<'a> {
  pub fn new(terms: &'a [ObjectiveTerm], stats: &'a SampleStats) -> Self {
    Self { terms, stats }
  }

  /// Raw value of one objective kind at `w`.
  fn raw(&self, kind: &ObjectiveKind, w: &Array1<f64>) -> f64 {
    match kind {
      ObjectiveKind::Risk(RiskKind::StdDev) => {
        let sigma_w = self.stats.cov.dot(w);
        w.dot(&sigma_w).max(0.0).sqrt()
      }
      ObjectiveKind::Risk(RiskKind::MaxDrawdown) => max_drawdown(w, &self.stats.observations),
      ObjectiveKind::Return(ReturnKind::Mean) => self.stats.mu.dot(w),
      ObjectiveKind::Custom(custom) => {
        let ws = w.to_vec();
        custom.evaluate(&ws)
      }
    }
  }

  /// Signed contribution of one term under the minimization convention.
  fn signed(kind: &ObjectiveKind, multiplier: f64, raw: f64) -> f64 {
    match kind {
      ObjectiveKind::Risk(_) => multiplier * raw,
      ObjectiveKind::Return(_) => -multiplier * raw,
      ObjectiveKind::Custom(custom) => match custom.direction() {
        Direction::Maximize => -multiplier * raw,
        Direction::Minimize => multiplier * raw,
      },
    }
  }

  /// Combined scalar objective at `w` (lower is better).
  pub fn combined(&self, w: &Array1<f64>) -> f64 {
    self
      .terms
      .iter()
      .map(|t| Self::signed(&t.kind, t.multiplier, self.raw(&t.kind, w)))
      .sum()
  }

  /// Per-term breakdown at `w`.
  pub fn breakdown(&self, w: &Array1<f64>) -> Vec<TermValue> {
    self
      .terms
      .iter()
      .map(|t| {
        let raw = self.raw(&t.kind, w);
        TermValue {
          label: t.kind.label(),
          value: raw,
          multiplier: t.multiplier,
          contribution: Self::signed(&t.kind, t.multiplier, raw),
        }
      })
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use ndarray::array;

  use super::*;
  use crate::spec::CustomObjective;

  fn stats_2x2() -> SampleStats {
    SampleStats {
      mu: array![0.01, 0.02],
      cov: array![[0.04, 0.0], [0.0, 0.09]],
      observations: array![[0.1, 0.0], [-0.2, 0.0], [0.05, 0.0]],
    }
  }

  #[test]
  fn max_drawdown_tracks_peak_to_trough() {
    // wealth path on asset A alone: 1.1, 0.88, 0.924 -> trough 0.88 off peak 1.1
    let dd = max_drawdown(&array![1.0, 0.0], &stats_2x2().observations);
    assert_abs_diff_eq!(dd, 0.2, epsilon = 1e-12);
  }

  #[test]
  fn max_drawdown_is_zero_for_monotone_growth() {
    let obs = array![[0.01, 0.0], [0.02, 0.0]];
    assert_eq!(max_drawdown(&array![1.0, 0.0], &obs), 0.0);
  }

  #[test]
  fn risk_and_return_signs_follow_the_minimization_convention() {
    let stats = stats_2x2();
    let terms = vec![
      ObjectiveTerm::unit(ObjectiveKind::Risk(RiskKind::StdDev)),
      ObjectiveTerm::unit(ObjectiveKind::Return(ReturnKind::Mean)),
    ];
    let eval = ObjectiveEvaluator::new(&terms, &stats);

    let w = array![0.5, 0.5];
    let stddev = (0.25 * 0.04 + 0.25 * 0.09_f64).sqrt();
    let mean = 0.5 * 0.01 + 0.5 * 0.02;
    assert_abs_diff_eq!(eval.combined(&w), stddev - mean, epsilon = 1e-12);

    let breakdown = eval.breakdown(&w);
    assert_eq!(breakdown.len(), 2);
    assert!(breakdown[0].contribution > 0.0);
    assert!(breakdown[1].contribution < 0.0);
  }

  #[test]
  fn maximized_custom_terms_are_negated() {
    let stats = stats_2x2();
    let terms = vec![ObjectiveTerm::new(
      ObjectiveKind::Custom(CustomObjective::linear(
        "yield",
        Direction::Maximize,
        vec![0.02, 0.04],
      )),
      2.0,
    )];
    let eval = ObjectiveEvaluator::new(&terms, &stats);

    let w = array![0.5, 0.5];
    assert_abs_diff_eq!(eval.combined(&w), -2.0 * 0.03, epsilon = 1e-12);
  }
}
