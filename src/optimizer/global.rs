//! # Global Search
//!
//! $$
//! \mathbf{v}_i = \mathbf{x}_{r_1} + F(\mathbf{x}_{r_2}-\mathbf{x}_{r_3})
//! $$
//!
//! Differential evolution (rand/1/bin) for objectives the convex path cannot
//! handle, e.g. maximum drawdown or arbitrary custom terms. Every candidate
//! is repaired onto the simplex-with-bounds after mutation; weight-sum
//! groups enter the fitness as a linear penalty and only candidates feasible
//! within tolerance can become the returned solution.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use ndarray::Array1;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;

use crate::error::OptimizeError;
use crate::optimizer::feasible::FEASIBILITY_TOL;
use crate::optimizer::feasible::FeasibleRegion;
use crate::optimizer::objective::ObjectiveEvaluator;
use crate::optimizer::types::Convergence;
use crate::optimizer::types::GlobalSearchConfig;
use crate::optimizer::types::OptimizationResult;
use crate::returns::SampleStats;
use crate::spec::ObjectiveTerm;

/// Repair passes allowed before a candidate is declared unprojectable.
const REPAIR_CAP: usize = 100;

/// Fitness weight on group-bound violations.
const VIOLATION_PENALTY: f64 = 1e3;

fn check_cancel(cancel: Option<&AtomicBool>) -> Result<(), OptimizeError> {
  if let Some(flag) = cancel {
    if flag.load(Ordering::Relaxed) {
      return Err(OptimizeError::Cancelled);
    }
  }
  Ok(())
}

fn random_candidate(region: &FeasibleRegion, rng: &mut StdRng) -> Array1<f64> {
  Array1::from_iter((0..region.n_assets()).map(|i| {
    let (lo, hi) = (region.lower[i], region.upper[i]);
    if hi > lo { rng.gen_range(lo..=hi) } else { lo }
  }))
}

pub(crate) fn solve(
  stats: &SampleStats,
  terms: &[ObjectiveTerm],
  region: &FeasibleRegion,
  config: &GlobalSearchConfig,
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

  let fitness = |w: &Array1<f64>| -> f64 {
    evaluator.combined(w) + VIOLATION_PENALTY * region.group_violation(w)
  };

  let mut rng = StdRng::seed_from_u64(config.seed);
  let pop_size = config.population.max(8);

  let mut population = Vec::with_capacity(pop_size);
  let mut scores = Vec::with_capacity(pop_size);
  let mut best_feasible: Option<(Array1<f64>, f64)> = None;

  for _ in 0..pop_size {
    let candidate = region.repair(&random_candidate(region, &mut rng), REPAIR_CAP)?;
    let score = fitness(&candidate);
    if region.is_feasible(&candidate, FEASIBILITY_TOL) {
      let objective = evaluator.combined(&candidate);
      if best_feasible.as_ref().map_or(true, |(_, b)| objective < *b) {
        best_feasible = Some((candidate.clone(), objective));
      }
    }
    population.push(candidate);
    scores.push(score);
  }

  let mut status = Convergence::BudgetExhausted;
  let mut stall = 0usize;
  let mut last_best = best_feasible.as_ref().map(|(_, b)| *b).unwrap_or(f64::INFINITY);

  for generation in 0..config.max_generations {
    check_cancel(cancel)?;

    for i in 0..pop_size {
      let mut picks = [0usize; 3];
      let mut filled = 0;
      while filled < 3 {
        let r = rng.gen_range(0..pop_size);
        if r != i && !picks[..filled].contains(&r) {
          picks[filled] = r;
          filled += 1;
        }
      }
      let [r1, r2, r3] = picks;

      let mut trial = population[i].clone();
      let j_rand = rng.gen_range(0..n);
      for j in 0..n {
        if j == j_rand || rng.gen::<f64>() < config.crossover_rate {
          trial[j] = population[r1][j]
            + config.differential_weight * (population[r2][j] - population[r3][j]);
        }
      }

      let trial = region.repair(&trial, REPAIR_CAP)?;
      let trial_score = fitness(&trial);

      if trial_score <= scores[i] {
        if region.is_feasible(&trial, FEASIBILITY_TOL) {
          let objective = evaluator.combined(&trial);
          if best_feasible.as_ref().map_or(true, |(_, b)| objective < *b) {
            best_feasible = Some((trial.clone(), objective));
          }
        }
        population[i] = trial;
        scores[i] = trial_score;
      }
    }

    let current_best = best_feasible.as_ref().map(|(_, b)| *b).unwrap_or(f64::INFINITY);
    if last_best - current_best < config.stall_tolerance {
      stall += 1;
      if stall >= config.stall_generations {
        status = Convergence::Converged;
        debug!(generation, objective = current_best, "global search converged");
        break;
      }
    } else {
      stall = 0;
    }
    last_best = current_best;

    if generation % 50 == 0 {
      debug!(generation, objective = current_best, "global search progress");
    }
  }

  match best_feasible {
    Some((w, _)) => Ok(OptimizationResult {
      weights: w.to_vec(),
      objective: evaluator.combined(&w),
      terms: evaluator.breakdown(&w),
      status,
    }),
    None => Err(OptimizeError::NoFeasibleSolution),
  }
}
