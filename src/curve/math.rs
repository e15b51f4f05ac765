//! Fixed-point helpers
//!
//! All amounts are 18-decimal fixed point stored in `U256`.

use alloy_primitives::U256;

use crate::error::{MarketError, MarketResult};

/// One whole unit (1e18)
pub const UNIT: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Basis-point denominator (10000 bps = 100%)
pub const BPS_DENOMINATOR: u64 = 10_000;

/// floor(a * b / denominator), failing on overflow or a zero denominator
pub fn mul_div(a: U256, b: U256, denominator: U256) -> MarketResult<U256> {
    if denominator.is_zero() {
        return Err(MarketError::Overflow);
    }
    a.checked_mul(b)
        .map(|product| product / denominator)
        .ok_or(MarketError::Overflow)
}

/// Whole units to fixed point (`units(5)` == 5e18)
pub fn units(whole: u64) -> U256 {
    U256::from(whole) * UNIT
}

/// Integer square root (floor) via Newton's method
pub fn isqrt(x: U256) -> U256 {
    if x.is_zero() {
        return U256::ZERO;
    }

    let mut z = (x >> 1usize) + U256::from(1);
    let mut y = x;

    while z < y {
        y = z;
        z = (x / z + z) >> 1usize;
    }

    y
}
