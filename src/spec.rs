//! # Portfolio Specs
//!
//! $$
//! \min_{\mathbf{w}} \sum_k m_k f_k(\mathbf{w})
//! \quad \text{s.t.} \quad \mathbf{1}^\top\mathbf{w}=1,\ \ l \le \mathbf{w} \le u
//! $$
//!
//! Constraints, objective terms, and the immutable spec builder. Every
//! `with_*` call returns a new [`PortfolioSpec`]; a base spec can be extended
//! from several call sites without aliasing.

use std::fmt;
use std::sync::Arc;

/// Linear constraint on portfolio weights.
#[derive(Clone, Debug)]
pub enum Constraint {
  /// Per-asset lower/upper weight bounds on a subset of assets.
  ///
  /// An empty subset applies the bounds to every asset.
  Box {
    assets: Vec<String>,
    min: f64,
    max: f64,
  },
  /// Lower/upper bound on the summed weight of a named subset.
  WeightSum {
    assets: Vec<String>,
    min: f64,
    max: f64,
  },
}

/// Whether a custom objective is minimized or maximized.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
  Minimize,
  Maximize,
}

/// Risk measures available as objective terms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RiskKind {
  /// Portfolio standard deviation sqrt(w' Sigma w).
  StdDev,
  /// Maximum peak-to-trough decline of the cumulative return path.
  MaxDrawdown,
}

/// Return measures available as objective terms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReturnKind {
  /// Mean portfolio return w' mu.
  Mean,
}

/// A user-supplied objective as data: label, direction, and a pure function
/// of the weight vector.
#[derive(Clone)]
pub struct CustomObjective {
  label: String,
  direction: Direction,
  f: Arc<dyn Fn(&[f64]) -> f64 + Send + Sync>,
}

impl CustomObjective {
  /// Wrap an arbitrary pure function of the weights.
  pub fn new<F>(label: impl Into<String>, direction: Direction, f: F) -> Self
  where
    F: Fn(&[f64]) -> f64 + Send + Sync + 'static,
  {
    Self {
      label: label.into(),
      direction,
      f: Arc::new(f),
    }
  }

  /// Linear objective `w . coeffs`, e.g. portfolio dividend yield from
  /// per-asset yields.
  pub fn linear(label: impl Into<String>, direction: Direction, coeffs: Vec<f64>) -> Self {
    Self::new(label, direction, move |w: &[f64]| {
      w.iter().zip(coeffs.iter()).map(|(wi, ci)| wi * ci).sum()
    })
  }

  /// Objective label used in result breakdowns.
  pub fn label(&self) -> &str {
    &self.label
  }

  /// Minimize or maximize.
  pub fn direction(&self) -> Direction {
    self.direction
  }

  /// Evaluate the objective on a weight vector.
  pub fn evaluate(&self, weights: &[f64]) -> f64 {
    (self.f)(weights)
  }
}

impl fmt::Debug for CustomObjective {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CustomObjective")
      .field("label", &self.label)
      .field("direction", &self.direction)
      .finish_non_exhaustive()
  }
}

/// Objective kinds, a closed set dispatched by one evaluator per kind.
#[derive(Clone, Debug)]
pub enum ObjectiveKind {
  Risk(RiskKind),
  Return(ReturnKind),
  Custom(CustomObjective),
}

impl ObjectiveKind {
  /// Label used in result breakdowns and error messages.
  pub fn label(&self) -> String {
    match self {
      Self::Risk(RiskKind::StdDev) => "risk:stddev".into(),
      Self::Risk(RiskKind::MaxDrawdown) => "risk:max_drawdown".into(),
      Self::Return(ReturnKind::Mean) => "return:mean".into(),
      Self::Custom(c) => format!("custom:{}", c.label()),
    }
  }
}

/// One term of the combined scalar objective.
#[derive(Clone, Debug)]
pub struct ObjectiveTerm {
  /// What is measured.
  pub kind: ObjectiveKind,
  /// Contribution weight in the combined objective.
  pub multiplier: f64,
}

impl ObjectiveTerm {
  /// Term with an explicit multiplier.
  pub fn new(kind: ObjectiveKind, multiplier: f64) -> Self {
    Self { kind, multiplier }
  }

  /// Term with the default multiplier of 1.
  pub fn unit(kind: ObjectiveKind) -> Self {
    Self::new(kind, 1.0)
  }
}

/// Asset set, constraints, and objective terms for one optimization.
///
/// Immutable builder: every `with_*` method clones and returns a new spec,
/// so a base spec can seed several analyses without shared mutation.
#[derive(Clone, Debug)]
pub struct PortfolioSpec {
  assets: Vec<String>,
  constraints: Vec<Constraint>,
  objectives: Vec<ObjectiveTerm>,
}

impl PortfolioSpec {
  /// Spec over the given assets with no constraints or objectives yet.
  pub fn new(assets: Vec<String>) -> Self {
    Self {
      assets,
      constraints: Vec::new(),
      objectives: Vec::new(),
    }
  }

  /// Ordered asset names.
  pub fn assets(&self) -> &[String] {
    &self.assets
  }

  /// Constraints in insertion order.
  pub fn constraints(&self) -> &[Constraint] {
    &self.constraints
  }

  /// Objective terms in insertion order.
  pub fn objectives(&self) -> &[ObjectiveTerm] {
    &self.objectives
  }

  /// New spec with an extra constraint.
  pub fn with_constraint(&self, constraint: Constraint) -> Self {
    let mut next = self.clone();
    next.constraints.push(constraint);
    next
  }

  /// New spec with box bounds on every asset.
  pub fn with_box(&self, min: f64, max: f64) -> Self {
    self.with_constraint(Constraint::Box {
      assets: Vec::new(),
      min,
      max,
    })
  }

  /// New spec with box bounds on a subset of assets.
  pub fn with_box_on(&self, assets: &[&str], min: f64, max: f64) -> Self {
    self.with_constraint(Constraint::Box {
      assets: assets.iter().map(|s| s.to_string()).collect(),
      min,
      max,
    })
  }

  /// New spec with a weight-sum bound over a subset of assets.
  pub fn with_weight_sum(&self, assets: &[&str], min: f64, max: f64) -> Self {
    self.with_constraint(Constraint::WeightSum {
      assets: assets.iter().map(|s| s.to_string()).collect(),
      min,
      max,
    })
  }

  /// New spec with an extra objective term.
  pub fn with_objective(&self, term: ObjectiveTerm) -> Self {
    let mut next = self.clone();
    next.objectives.push(term);
    next
  }

  /// New spec with a risk term.
  pub fn with_risk(&self, kind: RiskKind, multiplier: f64) -> Self {
    self.with_objective(ObjectiveTerm::new(ObjectiveKind::Risk(kind), multiplier))
  }

  /// New spec with a return term.
  pub fn with_return(&self, kind: ReturnKind, multiplier: f64) -> Self {
    self.with_objective(ObjectiveTerm::new(ObjectiveKind::Return(kind), multiplier))
  }

  /// New spec with a custom term.
  pub fn with_custom(&self, objective: CustomObjective, multiplier: f64) -> Self {
    self.with_objective(ObjectiveTerm::new(
      ObjectiveKind::Custom(objective),
      multiplier,
    ))
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;

  use super::*;

  fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
  }

  #[test]
  fn builder_never_mutates_the_base_spec() {
    let base = PortfolioSpec::new(names(&["A", "B"])).with_box(0.0, 1.0);

    let mvp = base.with_risk(RiskKind::StdDev, 1.0);
    let income = base.with_custom(
      CustomObjective::linear("yield", Direction::Maximize, vec![0.02, 0.03]),
      1.0,
    );

    assert_eq!(base.objectives().len(), 0);
    assert_eq!(mvp.objectives().len(), 1);
    assert_eq!(income.objectives().len(), 1);
    assert_eq!(base.constraints().len(), 1);
  }

  #[test]
  fn linear_custom_objective_is_a_dot_product() {
    let yield_obj = CustomObjective::linear("yield", Direction::Maximize, vec![0.02, 0.03, 0.04]);
    let v = yield_obj.evaluate(&[0.5, 0.3, 0.2]);
    assert_abs_diff_eq!(v, 0.5 * 0.02 + 0.3 * 0.03 + 0.2 * 0.04, epsilon = 1e-15);
  }

  #[test]
  fn objective_labels_name_what_they_measure() {
    assert_eq!(ObjectiveKind::Risk(RiskKind::StdDev).label(), "risk:stddev");
    assert_eq!(
      ObjectiveKind::Custom(CustomObjective::linear(
        "yield",
        Direction::Maximize,
        vec![0.0]
      ))
      .label(),
      "custom:yield"
    );
  }
}
