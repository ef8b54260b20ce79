//! # Summary Projection
//!
//! $$
//! \mathbb{E}[R_p]=\mathbf{w}^\top\mu,\qquad
//! \sigma_p=\sqrt{\mathbf{w}^\top\Sigma\mathbf{w}},\qquad
//! y_p=\mathbf{w}^\top\mathbf{y}
//! $$
//!
//! Pure reporting helpers: project a weight vector onto sample statistics
//! for comparison tables and risk/return scatter plots. Nothing here feeds
//! back into the optimizer.

use ndarray::Array1;
use prettytable::Table;
use prettytable::row;

use crate::returns::SampleStats;

/// Point statistics of a weight vector under sample statistics.
#[derive(Clone, Debug)]
pub struct PortfolioSummary {
  /// Expected portfolio return w' mu.
  pub expected_return: f64,
  /// Portfolio standard deviation sqrt(w' Sigma w).
  pub risk: f64,
  /// Portfolio income w' yield, when a yield vector was supplied.
  pub income: Option<f64>,
}

/// A labelled (risk, return) pair for the scatter renderer.
#[derive(Clone, Debug)]
pub struct RiskReturnPoint {
  pub label: String,
  pub risk: f64,
  pub expected_return: f64,
}

/// Project `weights` onto the sample statistics, optionally with a per-asset
/// yield vector for the income column.
pub fn summarize(weights: &[f64], stats: &SampleStats, yields: Option<&[f64]>) -> PortfolioSummary {
  let w = Array1::from_iter(weights.iter().copied());
  let sigma_w = stats.cov.dot(&w);

  PortfolioSummary {
    expected_return: stats.mu.dot(&w),
    risk: w.dot(&sigma_w).max(0.0).sqrt(),
    income: yields.map(|y| {
      weights
        .iter()
        .zip(y.iter())
        .map(|(wi, yi)| wi * yi)
        .sum()
    }),
  }
}

/// Labelled risk/return point for one portfolio.
pub fn risk_return_point(label: impl Into<String>, weights: &[f64], stats: &SampleStats) -> RiskReturnPoint {
  let summary = summarize(weights, stats, None);
  RiskReturnPoint {
    label: label.into(),
    risk: summary.risk,
    expected_return: summary.expected_return,
  }
}

/// Comparison table across labelled portfolios, one row per label.
pub fn comparison_table(
  entries: &[(String, PortfolioSummary)],
) -> Table {
  let mut table = Table::new();
  table.add_row(row!["portfolio", "expected return", "risk", "income"]);

  for (label, summary) in entries {
    let income = summary
      .income
      .map(|v| format!("{v:.6}"))
      .unwrap_or_else(|| "-".to_string());
    table.add_row(row![
      label,
      format!("{:.6}", summary.expected_return),
      format!("{:.6}", summary.risk),
      income
    ]);
  }

  table
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use ndarray::array;

  use super::*;

  fn stats() -> SampleStats {
    SampleStats {
      mu: array![0.01, 0.02],
      cov: array![[0.04, 0.01], [0.01, 0.09]],
      observations: array![[0.0, 0.0], [0.0, 0.0]],
    }
  }

  #[test]
  fn summary_matches_hand_computation() {
    let s = summarize(&[0.6, 0.4], &stats(), Some(&[0.02, 0.03]));

    assert_abs_diff_eq!(s.expected_return, 0.6 * 0.01 + 0.4 * 0.02, epsilon = 1e-15);
    let var: f64 = 0.36 * 0.04 + 0.16 * 0.09 + 2.0 * 0.6 * 0.4 * 0.01;
    assert_abs_diff_eq!(s.risk, var.sqrt(), epsilon = 1e-15);
    assert_abs_diff_eq!(s.income.unwrap(), 0.6 * 0.02 + 0.4 * 0.03, epsilon = 1e-15);
  }

  #[test]
  fn income_is_omitted_without_yields() {
    let s = summarize(&[0.5, 0.5], &stats(), None);
    assert!(s.income.is_none());
  }

  #[test]
  fn comparison_table_has_one_row_per_portfolio() {
    let entries = vec![
      ("MVP".to_string(), summarize(&[0.5, 0.5], &stats(), None)),
      (
        "Markowitz".to_string(),
        summarize(&[0.3, 0.7], &stats(), Some(&[0.02, 0.03])),
      ),
    ];
    let table = comparison_table(&entries);
    // header plus two portfolios
    assert_eq!(table.len(), 3);
  }
}
