//! spcc: SPC control chart constants from first principles
//!
//! Computes c4, c5, d2, d3 and the derived chart factors (A, A2, A3, B3–B6,
//! D1–D4, E2, E3) for any sample size n ≥ 2 and sigma multiplier z > 0,
//! without lookup tables. c4 comes from a log-gamma ratio; d2 and d3 come
//! from adaptive quadrature over the distribution of the sample range.
//!
//! ```no_run
//! use spcc::core::ConstantSet;
//!
//! let set = ConstantSet::new(5.0, 3.0)?;
//! let a2 = set.A2()?;
//! assert!((a2 - 0.577).abs() < 1e-3);
//! # Ok::<(), spcc::core::ConstantError>(())
//! ```

pub mod cli;
pub mod core;
