//! # portopt-rs
//!
//! Constrained portfolio optimization over a fixed historical return sample:
//! mean-variance portfolios through a convex projected-gradient path, and
//! multi-objective portfolios (drawdown, custom income proxies) through a
//! seeded differential-evolution search.
//!
//! ## Modules
//!
//! | Module            | Description                                                                    |
//! |-------------------|--------------------------------------------------------------------------------|
//! | [`returns`]       | Return samples keyed by asset name and their sufficient statistics.            |
//! | [`spec`]          | Constraints, objective terms, and the immutable portfolio spec builder.        |
//! | [`optimizer`]     | Validation, method dispatch, and the convex / global-search solvers.           |
//! | [`summary`]       | Pure summary projection: expected return, risk, income, comparison tables.     |
//! | [`simulate`]      | Seeded synthetic monthly return generation.                                    |
//! | [`visualization`] | Risk/return scatter across labelled portfolios.                                |
//! | [`error`]         | Typed failure taxonomy.                                                        |
//!
//! ## Example
//!
//! ```rust
//! use ndarray::array;
//! use portopt_rs::optimizer::{optimize, Method};
//! use portopt_rs::simulate::SyntheticReturns;
//! use portopt_rs::spec::{CustomObjective, Direction, PortfolioSpec, ReturnKind, RiskKind};
//!
//! let assets = vec!["Stocks".to_string(), "Bonds".to_string(), "Cash".to_string()];
//! let sample = SyntheticReturns::new(array![0.01, 0.006, 0.002], array![0.05, 0.02, 0.004], 60, 42, None)
//!   .sample(assets.clone())
//!   .unwrap();
//!
//! let base = PortfolioSpec::new(assets).with_box(0.0, 0.9);
//! let mvp = base.with_risk(RiskKind::StdDev, 1.0);
//! let markowitz = mvp.with_return(ReturnKind::Mean, 1.0);
//! let retirement = base
//!   .with_weight_sum(&["Cash"], 0.2, 1.0)
//!   .with_risk(RiskKind::MaxDrawdown, 1.0)
//!   .with_custom(
//!     CustomObjective::linear("yield", Direction::Maximize, vec![0.02, 0.03, 0.04]),
//!     1.0,
//!   );
//!
//! let w_mvp = optimize(&sample, &mvp, &Method::convex()).unwrap();
//! let w_markowitz = optimize(&sample, &markowitz, &Method::convex()).unwrap();
//! let w_retirement = optimize(&sample, &retirement, &Method::global_search(7)).unwrap();
//! assert!((w_mvp.weights.iter().sum::<f64>() - 1.0).abs() < 1e-6);
//! # let _ = (w_markowitz, w_retirement);
//! ```

pub mod error;
pub mod optimizer;
pub mod returns;
pub mod simulate;
pub mod spec;
pub mod summary;
pub mod visualization;

pub use error::OptimizeError;
pub use optimizer::Method;
pub use optimizer::OptimizationResult;
pub use optimizer::optimize;
pub use optimizer::optimize_with_cancel;
pub use returns::ReturnSample;
pub use spec::PortfolioSpec;
pub use summary::PortfolioSummary;
pub use summary::summarize;
