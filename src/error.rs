//! # Errors
//!
//! $$
//! \text{optimize} \mapsto \mathrm{Result}\langle \mathbf{w}^\*, E \rangle
//! $$
//!
//! Failure taxonomy for portfolio optimization. Every failure is a typed
//! value returned to the caller; an infeasible or non-converged run is never
//! masked by a default weight vector.

use thiserror::Error;

/// Errors produced by [`crate::optimizer::optimize`] and sample construction.
#[derive(Debug, Error)]
pub enum OptimizeError {
  /// Sample and spec disagree on the asset set, the sample is too short, or
  /// a constraint names an unknown asset.
  #[error("schema mismatch: {0}")]
  SchemaMismatch(String),

  /// Constraints are statically contradictory, no solve was attempted.
  #[error("infeasible spec: {0}")]
  InfeasibleSpec(String),

  /// The chosen method cannot handle an objective present in the spec.
  #[error("objective '{objective}' is not supported by the {method} method")]
  UnsupportedForMethod { objective: String, method: String },

  /// No objective term contributes to the combined objective.
  #[error("degenerate objective: no term with a non-zero multiplier")]
  DegenerateObjective,

  /// A candidate could not be mapped into the feasible region.
  #[error("projection onto the feasible region failed after {0} passes")]
  ProjectionFailed(usize),

  /// The search budget was exhausted without a feasible candidate.
  #[error("no feasible solution found within the search budget")]
  NoFeasibleSolution,

  /// The cancellation signal was observed during the solve.
  #[error("optimization cancelled")]
  Cancelled,
}
