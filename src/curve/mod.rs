//! Curve Pricing & Fees
//!
//! Pure functions only: no state, no side effects.
//! - **CurvePricer**: supply -> unit price, and the fixed-point conversions
//! - **FeeCalculator**: gross -> (net, fee)

mod fees;
pub mod math;
mod pricer;

pub use fees::{FeeCalculator, FeeConfig, FeeSplit};
pub use math::{units, BPS_DENOMINATOR, UNIT};
pub use pricer::{CurveConfig, CurvePricer};
