//! # Constrained Portfolio Optimizer
//!
//! $$
//! \mathbf{w}^\* = \arg\min_{\mathbf{w}\in\mathcal{F}}
//! \sum_k m_k s_k f_k(\mathbf{w})
//! $$
//!
//! Entry point for constrained portfolio optimization over a historical
//! return sample. Validation happens up front: schema agreement between
//! sample and spec, a contributing objective, and static constraint
//! feasibility, in that order. The convex path handles {StdDev, Mean}
//! objectives under linear constraints; everything else goes through the
//! seeded global search.

pub mod convex;
pub mod feasible;
pub mod global;
pub mod objective;
pub mod types;

use std::sync::atomic::AtomicBool;

pub use feasible::FeasibleRegion;
pub use objective::max_drawdown;
pub use types::Convergence;
pub use types::ConvexConfig;
pub use types::GlobalSearchConfig;
pub use types::Method;
pub use types::OptimizationResult;
pub use types::TermValue;

use crate::error::OptimizeError;
use crate::returns::ReturnSample;
use crate::spec::ObjectiveKind;
use crate::spec::PortfolioSpec;
use crate::spec::RiskKind;

fn validate(
  sample: &ReturnSample,
  spec: &PortfolioSpec,
  method: &Method,
) -> Result<FeasibleRegion, OptimizeError> {
  if sample.assets() != spec.assets() {
    return Err(OptimizeError::SchemaMismatch(format!(
      "sample assets {:?} do not match spec assets {:?}",
      sample.assets(),
      spec.assets()
    )));
  }

  if sample.n_observations() < 2 {
    return Err(OptimizeError::SchemaMismatch(format!(
      "sample has {} observations, at least 2 required",
      sample.n_observations()
    )));
  }

  if spec.objectives().is_empty() || spec.objectives().iter().all(|t| t.multiplier == 0.0) {
    return Err(OptimizeError::DegenerateObjective);
  }

  let region = FeasibleRegion::compile(spec)?;

  if let Method::Convex(_) = method {
    for term in spec.objectives() {
      let supported = matches!(
        term.kind,
        ObjectiveKind::Risk(RiskKind::StdDev) | ObjectiveKind::Return(_)
      );
      if !supported {
        return Err(OptimizeError::UnsupportedForMethod {
          objective: term.kind.label(),
          method: method.name().to_string(),
        });
      }
    }
  }

  Ok(region)
}

/// Optimize portfolio weights for `spec` over `sample` using `method`.
///
/// Pure in its inputs: the global search draws randomness only from the seed
/// carried in the method configuration.
pub fn optimize(
  sample: &ReturnSample,
  spec: &PortfolioSpec,
  method: &Method,
) -> Result<OptimizationResult, OptimizeError> {
  optimize_with_cancel(sample, spec, method, None)
}

/// [`optimize`] with a cooperative cancellation signal, checked once per
/// iteration or generation.
pub fn optimize_with_cancel(
  sample: &ReturnSample,
  spec: &PortfolioSpec,
  method: &Method,
  cancel: Option<&AtomicBool>,
) -> Result<OptimizationResult, OptimizeError> {
  let region = validate(sample, spec, method)?;
  let stats = sample.stats();

  match method {
    Method::Convex(config) => convex::solve(&stats, spec.objectives(), &region, config, cancel),
    Method::GlobalSearch(config) => {
      global::solve(&stats, spec.objectives(), &region, config, cancel)
    }
  }
}
