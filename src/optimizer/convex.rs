//! # Convex Path
//!
//! $$
//! \min_{\mathbf{w}\in\mathcal{F}}\ m_\sigma\sqrt{\mathbf{w}^\top\Sigma\mathbf{w}}
//! \ -\ m_\mu\,\mu^\top\mathbf{w}
//! $$
//!
//! Projected gradient descent with exact projection onto the
//! simplex-with-bounds and escalating quadratic penalties for weight-sum
//! groups. Never inverts Sigma, so a semi-definite covariance is fine.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use ndarray::Array1;
use tracing::debug;

use crate::error::OptimizeError;
use crate::optimizer::feasible::FEASIBILITY_TOL;
use crate::optimizer::feasible::FeasibleRegion;
use crate::optimizer::objective::ObjectiveEvaluator;
use crate::optimizer::types::Convergence;
use crate::optimizer::types::ConvexConfig;
use crate::optimizer::types::OptimizationResult;
use crate::returns::SampleStats;
use crate::spec::ObjectiveKind;
use crate::spec::ObjectiveTerm;
use crate::spec::ReturnKind;
use crate::spec::RiskKind;

struct QuadraticCost<'a> {
  stats: &'a SampleStats,
  region: &'a FeasibleRegion,
  risk_multiplier: f64,
  return_multiplier: f64,
  penalty: f64,
}

impl QuadraticCost<'_> {
  fn value(&self, w: &Array1<f64>) -> f64 {
    let sigma_w = self.stats.cov.dot(w);
    let stddev = w.dot(&sigma_w).max(0.0).sqrt();
    let mean = self.stats.mu.dot(w);

    let mut penalty = 0.0;
    for g in &self.region.groups {
      let s: f64 = g.members.iter().map(|&i| w[i]).sum();
      penalty += (g.min - s).max(0.0).powi(2) + (s - g.max).max(0.0).powi(2);
    }

    self.risk_multiplier * stddev - self.return_multiplier * mean + self.penalty * penalty
  }

  fn gradient(&self, w: &Array1<f64>) -> Array1<f64> {
    let sigma_w = self.stats.cov.dot(w);
    let stddev = w.dot(&sigma_w).max(0.0).sqrt().max(1e-9);

    let mut grad = &sigma_w * (self.risk_multiplier / stddev) - &self.stats.mu * self.return_multiplier;

    for g in &self.region.groups {
      let s: f64 = g.members.iter().map(|&i| w[i]).sum();
      let shortfall = (g.min - s).max(0.0);
      let excess = (s - g.max).max(0.0);
      let slope = self.penalty * 2.0 * (excess - shortfall);
      if slope != 0.0 {
        for &i in &g.members {
          grad[i] += slope;
        }
      }
    }

    grad
  }
}

fn check_cancel(cancel: Option<&AtomicBool>) -> Result<(), OptimizeError> {
  if let Some(flag) = cancel {
    if flag.load(Ordering::Relaxed) {
      return Err(OptimizeError::Cancelled);
    }
  }
  Ok(())
}

pub(crate) fn solve(
  stats: &SampleStats,
  terms: &[ObjectiveTerm],
  region: &FeasibleRegion,
  config: &ConvexConfig,
  cancel: Option<&AtomicBool>,
) -> Result<OptimizationResult, OptimizeError> {
  let n = region.n_assets();
  let evaluator = ObjectiveEvaluator::new(terms, stats);

  if n == 1 {
    let w = Array1::from_elem(1, 1.0);
    if !region.is_feasible(&w, FEASIBILITY_TOL) {
      return Err(OptimizeError::NoFeasibleSolution);
    }
    return Ok(OptimizationResult {
      weights: w.to_vec(),
      objective: evaluator.combined(&w),
      terms: evaluator.breakdown(&w),
      status: Convergence::Converged,
    });
  }

  let mut risk_multiplier = 0.0;
  let mut return_multiplier = 0.0;
  for term in terms {
    match &term.kind {
      ObjectiveKind::Risk(RiskKind::StdDev) => risk_multiplier += term.multiplier,
      ObjectiveKind::Return(ReturnKind::Mean) => return_multiplier += term.multiplier,
      // unsupported kinds are rejected before this point
      _ => {}
    }
  }

  let rounds: &[f64] = if region.groups.is_empty() {
    &[0.0]
  } else {
    &config.penalty_rounds
  };

  let mut w = region.project(&Array1::from_elem(n, 1.0 / n as f64));
  let mut status = Convergence::Converged;

  for &penalty in rounds {
    let cost = QuadraticCost {
      stats,
      region,
      risk_multiplier,
      return_multiplier,
      penalty,
    };

    let mut current = cost.value(&w);
    status = Convergence::BudgetExhausted;

    for _ in 0..config.max_iters {
      check_cancel(cancel)?;

      let grad = cost.gradient(&w);
      let mut step = 1.0;
      let mut improved = false;

      for _ in 0..40 {
        let candidate = region.project(&(&w - &(&grad * step)));
        let value = cost.value(&candidate);
        if value < current - 1e-15 {
          let max_move = candidate
            .iter()
            .zip(w.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max);
          w = candidate;
          current = value;
          improved = true;
          if max_move < config.step_tolerance {
            status = Convergence::Converged;
          }
          break;
        }
        step *= 0.5;
      }

      if !improved || status == Convergence::Converged {
        status = Convergence::Converged;
        break;
      }
    }

    debug!(penalty, objective = current, "convex penalty round finished");
  }

  if !region.is_feasible(&w, FEASIBILITY_TOL) {
    return Err(OptimizeError::NoFeasibleSolution);
  }

  Ok(OptimizationResult {
    weights: w.to_vec(),
    objective: evaluator.combined(&w),
    terms: evaluator.breakdown(&w),
    status,
  })
}

#[cfg(test)]
mod tests {
  use ndarray::array;

  use super::*;
  use crate::optimizer::types::ConvexConfig;
  use crate::spec::PortfolioSpec;

  fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
  }

  fn stats_3() -> SampleStats {
    SampleStats {
      mu: array![0.01, 0.012, 0.008],
      cov: array![
        [0.0025, 0.0, 0.0],
        [0.0, 0.0025, 0.0],
        [0.0, 0.0, 0.0025]
      ],
      observations: array![[0.0, 0.0, 0.0], [0.0, 0.0, 0.0]],
    }
  }

  #[test]
  fn min_variance_on_symmetric_covariance_is_equal_weight() {
    let stats = stats_3();
    let spec = PortfolioSpec::new(names(&["A", "B", "C"])).with_risk(RiskKind::StdDev, 1.0);
    let region = FeasibleRegion::compile(&spec).unwrap();

    let result = solve(
      &stats,
      spec.objectives(),
      &region,
      &ConvexConfig::default(),
      None,
    )
    .unwrap();

    for &wi in &result.weights {
      assert!((wi - 1.0 / 3.0).abs() < 1e-4);
    }
    assert!((result.weights.iter().sum::<f64>() - 1.0).abs() < 1e-6);
  }

  #[test]
  fn pure_return_maximization_saturates_the_best_asset() {
    let stats = stats_3();
    let spec = PortfolioSpec::new(names(&["A", "B", "C"]))
      .with_box(0.0, 0.6)
      .with_return(ReturnKind::Mean, 1.0);
    let region = FeasibleRegion::compile(&spec).unwrap();

    let result = solve(
      &stats,
      spec.objectives(),
      &region,
      &ConvexConfig::default(),
      None,
    )
    .unwrap();

    // asset B has the highest mean, so it hits its upper bound
    assert!((result.weights[1] - 0.6).abs() < 1e-4);
  }

  #[test]
  fn weight_sum_group_is_honored_via_penalties() {
    let stats = stats_3();
    let spec = PortfolioSpec::new(names(&["A", "B", "C"]))
      .with_weight_sum(&["C"], 0.3, 1.0)
      .with_risk(RiskKind::StdDev, 1.0)
      .with_return(ReturnKind::Mean, 1.0);
    let region = FeasibleRegion::compile(&spec).unwrap();

    let result = solve(
      &stats,
      spec.objectives(),
      &region,
      &ConvexConfig::default(),
      None,
    )
    .unwrap();

    assert!(result.weights[2] >= 0.3 - 1e-4);
    assert!((result.weights.iter().sum::<f64>() - 1.0).abs() < 1e-6);
  }

  #[test]
  fn cancellation_is_observed() {
    let stats = stats_3();
    let spec = PortfolioSpec::new(names(&["A", "B", "C"])).with_risk(RiskKind::StdDev, 1.0);
    let region = FeasibleRegion::compile(&spec).unwrap();
    let cancel = AtomicBool::new(true);

    let err = solve(
      &stats,
      spec.objectives(),
      &region,
      &ConvexConfig::default(),
      Some(&cancel),
    );
    assert!(matches!(err, Err(OptimizeError::Cancelled)));
  }
}
