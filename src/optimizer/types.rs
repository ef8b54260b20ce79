//! # Optimizer Types
//!
//! $$
//! \mathbf{w}^\* = \arg\min_{\mathbf{w}\in\mathcal{F}} \sum_k m_k f_k(\mathbf{w})
//! $$
//!
//! Method selection, solver configuration, and result containers.

/// Solution method for a constrained portfolio optimization.
#[derive(Clone, Debug)]
pub enum Method {
  /// Projected-gradient quadratic path for {StdDev, Mean} objectives under
  /// linear constraints.
  Convex(ConvexConfig),
  /// Seeded differential evolution for non-convex or non-smooth objectives.
  GlobalSearch(GlobalSearchConfig),
}

impl Method {
  /// Convex method with default configuration.
  pub fn convex() -> Self {
    Self::Convex(ConvexConfig::default())
  }

  /// Global search with default configuration and an explicit seed.
  pub fn global_search(seed: u64) -> Self {
    Self::GlobalSearch(GlobalSearchConfig {
      seed,
      ..GlobalSearchConfig::default()
    })
  }

  /// Method name used in error messages.
  pub fn name(&self) -> &'static str {
    match self {
      Self::Convex(_) => "convex",
      Self::GlobalSearch(_) => "global-search",
    }
  }
}

/// Configuration for the projected-gradient convex path.
#[derive(Clone, Debug)]
pub struct ConvexConfig {
  /// Gradient iterations per penalty round.
  pub max_iters: usize,
  /// Stop when the projected step moves no coordinate more than this.
  pub step_tolerance: f64,
  /// Escalating quadratic penalty weights for weight-sum constraints.
  pub penalty_rounds: Vec<f64>,
}

impl Default for ConvexConfig {
  fn default() -> Self {
    Self {
      max_iters: 2000,
      step_tolerance: 1e-12,
      penalty_rounds: vec![1e2, 1e4, 1e6],
    }
  }
}

/// Configuration for the differential-evolution global search.
#[derive(Clone, Debug)]
pub struct GlobalSearchConfig {
  /// PRNG seed; runs with equal seed, sample, and spec are identical.
  pub seed: u64,
  /// Candidates per generation (minimum 4 for rand/1/bin mutation).
  pub population: usize,
  /// Generation budget.
  pub max_generations: usize,
  /// Differential weight F.
  pub differential_weight: f64,
  /// Crossover probability CR.
  pub crossover_rate: f64,
  /// Improvement below this counts as a stall.
  pub stall_tolerance: f64,
  /// Consecutive stalled generations before declaring convergence.
  pub stall_generations: usize,
}

impl Default for GlobalSearchConfig {
  fn default() -> Self {
    Self {
      seed: 42,
      population: 60,
      max_generations: 400,
      differential_weight: 0.7,
      crossover_rate: 0.9,
      stall_tolerance: 1e-10,
      stall_generations: 30,
    }
  }
}

/// How a solve terminated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Convergence {
  /// Improvement fell below the configured threshold.
  Converged,
  /// The iteration or generation budget ran out first.
  BudgetExhausted,
}

/// One objective term evaluated at the returned weights.
#[derive(Clone, Debug)]
pub struct TermValue {
  /// Term label, e.g. `risk:stddev` or `custom:yield`.
  pub label: String,
  /// Raw term value at the solution.
  pub value: f64,
  /// Multiplier from the spec.
  pub multiplier: f64,
  /// Signed contribution to the minimization objective.
  pub contribution: f64,
}

/// Output of a successful optimization.
#[derive(Clone, Debug)]
pub struct OptimizationResult {
  /// Final portfolio weights in asset order, summing to one.
  pub weights: Vec<f64>,
  /// Achieved combined objective (minimization convention).
  pub objective: f64,
  /// Per-term breakdown at the solution.
  pub terms: Vec<TermValue>,
  /// Termination status.
  pub status: Convergence,
}
