//! # Feasible Region
//!
//! $$
//! \mathcal{F}=\{\mathbf{w}: \mathbf{1}^\top\mathbf{w}=1,\ l\le\mathbf{w}\le u,\
//! g_{\min}\le \mathbf{a}_g^\top\mathbf{w}\le g_{\max}\}
//! $$
//!
//! Compiles spec constraints into per-asset bounds plus group bounds, proves
//! static infeasibility before any solve, and maps candidates back into the
//! simplex-with-bounds.

use ndarray::Array1;

use crate::error::OptimizeError;
use crate::spec::Constraint;
use crate::spec::PortfolioSpec;

pub(crate) const FEASIBILITY_TOL: f64 = 1e-6;

/// Bound on the summed weight of a subset of assets.
#[derive(Clone, Debug)]
pub struct GroupBound {
  /// Column indices of the member assets.
  pub members: Vec<usize>,
  pub min: f64,
  pub max: f64,
}

/// Per-asset bounds and group bounds compiled from a [`PortfolioSpec`].
#[derive(Clone, Debug)]
pub struct FeasibleRegion {
  /// Per-asset lower weight bounds.
  pub lower: Array1<f64>,
  /// Per-asset upper weight bounds.
  pub upper: Array1<f64>,
  /// Weight-sum bounds over asset subsets.
  pub groups: Vec<GroupBound>,
}

fn subset_indices(assets: &[String], subset: &[String]) -> Result<Vec<usize>, OptimizeError> {
  if subset.is_empty() {
    return Ok((0..assets.len()).collect());
  }

  subset
    .iter()
    .map(|name| {
      assets
        .iter()
        .position(|a| a == name)
        .ok_or_else(|| OptimizeError::SchemaMismatch(format!("constraint names unknown asset '{name}'")))
    })
    .collect()
}

impl FeasibleRegion {
  /// Compile the spec's constraints, starting from long-only bounds [0, 1].
  ///
  /// Fails with [`OptimizeError::InfeasibleSpec`] on statically contradictory
  /// constraints and [`OptimizeError::SchemaMismatch`] on unknown assets.
  pub fn compile(spec: &PortfolioSpec) -> Result<Self, OptimizeError> {
    let n = spec.assets().len();
    let mut lower = Array1::<f64>::zeros(n);
    let mut upper = Array1::<f64>::from_elem(n, 1.0);
    let mut groups = Vec::new();

    for constraint in spec.constraints() {
      match constraint {
        Constraint::Box { assets, min, max } => {
          if min > max {
            return Err(OptimizeError::InfeasibleSpec(format!(
              "box constraint with min {min} > max {max}"
            )));
          }
          for idx in subset_indices(spec.assets(), assets)? {
            lower[idx] = lower[idx].max(*min);
            upper[idx] = upper[idx].min(*max);
          }
        }
        Constraint::WeightSum { assets, min, max } => {
          if !(0.0..=1.0).contains(min) || !(0.0..=1.0).contains(max) || min > max {
            return Err(OptimizeError::InfeasibleSpec(format!(
              "weight-sum bounds [{min}, {max}] outside 0 <= min <= max <= 1"
            )));
          }
          groups.push(GroupBound {
            members: subset_indices(spec.assets(), assets)?,
            min: *min,
            max: *max,
          });
        }
      }
    }

    // strict: clamp/project assume lower <= upper per coordinate
    for i in 0..n {
      if lower[i] > upper[i] {
        return Err(OptimizeError::InfeasibleSpec(format!(
          "asset '{}' has contradictory bounds [{}, {}]",
          spec.assets()[i],
          lower[i],
          upper[i]
        )));
      }
    }

    let lower_sum: f64 = lower.sum();
    if lower_sum > 1.0 + FEASIBILITY_TOL {
      return Err(OptimizeError::InfeasibleSpec(format!(
        "lower bounds sum to {lower_sum} > 1"
      )));
    }
    let upper_sum: f64 = upper.sum();
    if upper_sum < 1.0 - FEASIBILITY_TOL {
      return Err(OptimizeError::InfeasibleSpec(format!(
        "upper bounds sum to {upper_sum} < 1"
      )));
    }

    for group in &groups {
      let member_upper: f64 = group.members.iter().map(|&i| upper[i]).sum();
      if group.min > member_upper + FEASIBILITY_TOL {
        return Err(OptimizeError::InfeasibleSpec(format!(
          "weight-sum minimum {} exceeds reachable maximum {member_upper}",
          group.min
        )));
      }
      let member_lower: f64 = group.members.iter().map(|&i| lower[i]).sum();
      if group.max < member_lower - FEASIBILITY_TOL {
        return Err(OptimizeError::InfeasibleSpec(format!(
          "weight-sum maximum {} is below reachable minimum {member_lower}",
          group.max
        )));
      }
    }

    Ok(Self {
      lower,
      upper,
      groups,
    })
  }

  /// Number of assets the region is defined over.
  pub fn n_assets(&self) -> usize {
    self.lower.len()
  }

  /// Clip every coordinate into its box bounds.
  pub fn clamp(&self, w: &Array1<f64>) -> Array1<f64> {
    let mut out = w.clone();
    for i in 0..out.len() {
      out[i] = out[i].clamp(self.lower[i], self.upper[i]);
    }
    out
  }

  /// Exact Euclidean projection onto {sum = 1, lower <= w <= upper} via
  /// bisection on the shift `tau` in `clip(y - tau)`.
  ///
  /// Requires the statically verified condition sum(lower) <= 1 <= sum(upper).
  pub fn project(&self, y: &Array1<f64>) -> Array1<f64> {
    let shifted_sum = |tau: f64| -> f64 {
      (0..y.len())
        .map(|i| (y[i] - tau).clamp(self.lower[i], self.upper[i]))
        .sum()
    };

    let mut lo = (0..y.len())
      .map(|i| y[i] - self.upper[i])
      .fold(f64::INFINITY, f64::min);
    let mut hi = (0..y.len())
      .map(|i| y[i] - self.lower[i])
      .fold(f64::NEG_INFINITY, f64::max);

    for _ in 0..128 {
      let mid = 0.5 * (lo + hi);
      if shifted_sum(mid) > 1.0 {
        lo = mid;
      } else {
        hi = mid;
      }
    }

    let tau = 0.5 * (lo + hi);
    Array1::from_iter((0..y.len()).map(|i| (y[i] - tau).clamp(self.lower[i], self.upper[i])))
  }

  /// Normalize-then-clip repair loop used by the population search.
  ///
  /// Alternates scaling to sum one with clipping into the box until the sum
  /// settles within tolerance, up to `cap` passes.
  pub fn repair(&self, w: &Array1<f64>, cap: usize) -> Result<Array1<f64>, OptimizeError> {
    let mut out = self.clamp(w);

    for _ in 0..cap {
      let sum = out.sum();
      if (sum - 1.0).abs() <= 1e-9 {
        return Ok(out);
      }
      if sum.abs() < 1e-12 {
        // degenerate candidate, restart from the midpoint of the box
        out = Array1::from_iter(
          (0..out.len()).map(|i| 0.5 * (self.lower[i] + self.upper[i])),
        );
        continue;
      }
      out.mapv_inplace(|v| v / sum);
      out = self.clamp(&out);
    }

    Err(OptimizeError::ProjectionFailed(cap))
  }

  /// Total linear violation of the group bounds at `w`.
  pub fn group_violation(&self, w: &Array1<f64>) -> f64 {
    self
      .groups
      .iter()
      .map(|g| {
        let s: f64 = g.members.iter().map(|&i| w[i]).sum();
        (g.min - s).max(0.0) + (s - g.max).max(0.0)
      })
      .sum()
  }

  /// Whether `w` satisfies every constraint within `tol`.
  pub fn is_feasible(&self, w: &Array1<f64>, tol: f64) -> bool {
    if (w.sum() - 1.0).abs() > tol {
      return false;
    }
    for i in 0..w.len() {
      if w[i] < self.lower[i] - tol || w[i] > self.upper[i] + tol {
        return false;
      }
    }
    self.group_violation(w) <= tol
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use ndarray::array;

  use super::*;
  use crate::spec::PortfolioSpec;

  fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
  }

  #[test]
  fn compile_intersects_box_constraints() {
    let spec = PortfolioSpec::new(names(&["A", "B", "C"]))
      .with_box(0.05, 0.9)
      .with_box_on(&["B"], 0.2, 0.6);
    let region = FeasibleRegion::compile(&spec).unwrap();

    assert_abs_diff_eq!(region.lower[1], 0.2, epsilon = 1e-15);
    assert_abs_diff_eq!(region.upper[1], 0.6, epsilon = 1e-15);
    assert_abs_diff_eq!(region.lower[0], 0.05, epsilon = 1e-15);
  }

  #[test]
  fn crossing_box_intersections_are_infeasible() {
    // each box alone is fine, their intersection leaves min just above max
    let spec = PortfolioSpec::new(names(&["A", "B", "C"]))
      .with_box_on(&["A"], 0.0, 0.5)
      .with_box_on(&["A"], 0.5000005, 1.0);
    let err = FeasibleRegion::compile(&spec);
    assert!(matches!(err, Err(OptimizeError::InfeasibleSpec(_))));
  }

  #[test]
  fn lower_bounds_summing_past_one_are_infeasible() {
    let spec = PortfolioSpec::new(names(&["A", "B", "C"])).with_box(0.5, 1.0);
    let err = FeasibleRegion::compile(&spec);
    assert!(matches!(err, Err(OptimizeError::InfeasibleSpec(_))));
  }

  #[test]
  fn unknown_asset_in_constraint_is_a_schema_mismatch() {
    let spec = PortfolioSpec::new(names(&["A", "B"])).with_weight_sum(&["Z"], 0.1, 0.5);
    let err = FeasibleRegion::compile(&spec);
    assert!(matches!(err, Err(OptimizeError::SchemaMismatch(_))));
  }

  #[test]
  fn group_minimum_beyond_member_uppers_is_infeasible() {
    let spec = PortfolioSpec::new(names(&["A", "B", "C"]))
      .with_box_on(&["A"], 0.0, 0.1)
      .with_weight_sum(&["A"], 0.3, 1.0);
    let err = FeasibleRegion::compile(&spec);
    assert!(matches!(err, Err(OptimizeError::InfeasibleSpec(_))));
  }

  #[test]
  fn projection_lands_on_the_simplex_within_bounds() {
    let spec = PortfolioSpec::new(names(&["A", "B", "C"])).with_box(0.1, 0.9);
    let region = FeasibleRegion::compile(&spec).unwrap();

    let w = region.project(&array![5.0, -3.0, 0.2]);
    assert!((w.sum() - 1.0).abs() < 1e-9);
    for i in 0..3 {
      assert!(w[i] >= 0.1 - 1e-9 && w[i] <= 0.9 + 1e-9);
    }
    // largest input keeps the largest weight
    assert!(w[0] >= w[2] && w[2] >= w[1]);
  }

  #[test]
  fn projection_is_identity_on_feasible_points() {
    let spec = PortfolioSpec::new(names(&["A", "B", "C"])).with_box(0.1, 0.9);
    let region = FeasibleRegion::compile(&spec).unwrap();

    let w = region.project(&array![0.3, 0.3, 0.4]);
    assert_abs_diff_eq!(w[0], 0.3, epsilon = 1e-9);
    assert_abs_diff_eq!(w[1], 0.3, epsilon = 1e-9);
    assert_abs_diff_eq!(w[2], 0.4, epsilon = 1e-9);
  }

  #[test]
  fn repair_settles_inside_the_box() {
    let spec = PortfolioSpec::new(names(&["A", "B", "C"])).with_box(0.1, 0.9);
    let region = FeasibleRegion::compile(&spec).unwrap();

    let w = region.repair(&array![3.0, 0.0, 0.5], 100).unwrap();
    assert!((w.sum() - 1.0).abs() < 1e-8);
    for i in 0..3 {
      assert!(w[i] >= 0.1 - 1e-9 && w[i] <= 0.9 + 1e-9);
    }
  }

  #[test]
  fn group_violation_measures_shortfall() {
    let spec = PortfolioSpec::new(names(&["Cash", "Eq"])).with_weight_sum(&["Cash"], 0.2, 1.0);
    let region = FeasibleRegion::compile(&spec).unwrap();

    let v = region.group_violation(&array![0.05, 0.95]);
    assert_abs_diff_eq!(v, 0.15, epsilon = 1e-12);
    assert_eq!(region.group_violation(&array![0.25, 0.75]), 0.0);
  }

  #[test]
  fn repair_reports_failure_when_the_cap_is_too_small() {
    let spec = PortfolioSpec::new(names(&["A", "B", "C"])).with_box(0.1, 0.9);
    let region = FeasibleRegion::compile(&spec).unwrap();

    // the candidate needs several normalize-clip passes to settle
    let err = region.repair(&array![3.0, 0.0, 0.5], 1);
    assert!(matches!(err, Err(OptimizeError::ProjectionFailed(1))));
  }
}
