//! # Visualization
//!
//! $$
//! \{(\sigma_p^{(k)},\ \mathbb{E}[R_p^{(k)}])\}_k \mapsto \text{scatter}
//! $$
//!
//! Risk/return scatter across labelled portfolios. The renderer consumes
//! only labels and (risk, return) pairs; it never touches optimizer state.

use plotly::Layout;
use plotly::Plot;
use plotly::Scatter;
use plotly::common::Marker;
use plotly::common::Mode;
use plotly::layout::Axis;

use crate::summary::RiskReturnPoint;

/// Build a risk/return scatter with one labelled marker per portfolio.
pub fn risk_return_scatter(points: &[RiskReturnPoint]) -> Plot {
  let mut plot = Plot::new();

  for point in points {
    let trace = Scatter::new(vec![point.risk], vec![point.expected_return])
      .name(point.label.as_str())
      .mode(Mode::Markers)
      .marker(Marker::new().size(10));
    plot.add_trace(trace);
  }

  plot.set_layout(
    Layout::new()
      .title("Risk / return comparison")
      .x_axis(Axis::new().title("risk (std dev)"))
      .y_axis(Axis::new().title("expected return")),
  );

  plot
}
