//! Trade fees in basis points

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use super::math::{mul_div, BPS_DENOMINATOR};
use crate::error::{MarketError, MarketResult};

/// Fee schedule (immutable after construction)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeConfig {
    /// Fee on buys (100 = 1%, max 10000 = 100%)
    pub buy_fee_bps: u16,

    /// Fee on sells (100 = 1%, max 10000 = 100%)
    pub sell_fee_bps: u16,
}

impl FeeConfig {
    pub fn new(buy_fee_bps: u16, sell_fee_bps: u16) -> MarketResult<Self> {
        let config = Self {
            buy_fee_bps,
            sell_fee_bps,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> MarketResult<()> {
        for (side, bps) in [("buy", self.buy_fee_bps), ("sell", self.sell_fee_bps)] {
            if u64::from(bps) > BPS_DENOMINATOR {
                return Err(MarketError::InvalidConfig(format!(
                    "{} fee {} bps exceeds {} bps",
                    side, bps, BPS_DENOMINATOR
                )));
            }
        }
        Ok(())
    }
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            buy_fee_bps: 100,
            sell_fee_bps: 100,
        }
    }
}

/// Gross amount split into the part that moves and the part kept as fee
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSplit {
    pub net: U256,
    pub fee: U256,
}

/// Splits gross amounts by a bps rate
#[derive(Debug, Clone, Copy, Default)]
pub struct FeeCalculator;

impl FeeCalculator {
    /// fee = floor(gross * fee_bps / 10000), net = gross - fee
    pub fn split(gross: U256, fee_bps: u16) -> MarketResult<FeeSplit> {
        if u64::from(fee_bps) > BPS_DENOMINATOR {
            return Err(MarketError::InvalidConfig(format!(
                "fee {} bps exceeds {} bps",
                fee_bps, BPS_DENOMINATOR
            )));
        }

        let fee = mul_div(gross, U256::from(fee_bps), U256::from(BPS_DENOMINATOR))?;
        Ok(FeeSplit {
            net: gross - fee,
            fee,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::math::UNIT;

    #[test]
    fn test_split_exact_values() {
        let split = FeeCalculator::split(U256::from(10_000), 100).unwrap();
        assert_eq!(split.fee, U256::from(100));
        assert_eq!(split.net, U256::from(9_900));

        // 1% of 99 truncates to 0
        let split = FeeCalculator::split(U256::from(99), 100).unwrap();
        assert_eq!(split.fee, U256::ZERO);
        assert_eq!(split.net, U256::from(99));
    }

    #[test]
    fn test_split_conserves_gross() {
        let max_gross = U256::from(10u64).pow(U256::from(24));
        let grosses = [
            U256::ZERO,
            U256::from(1),
            U256::from(9_999),
            U256::from(123_456_789),
            UNIT,
            UNIT * U256::from(7) + U256::from(3),
            max_gross - U256::from(1),
            max_gross,
        ];
        let rates = [0u16, 1, 30, 100, 250, 5_000, 9_999, 10_000];

        for gross in grosses {
            for bps in rates {
                let split = FeeCalculator::split(gross, bps).unwrap();
                assert_eq!(split.net + split.fee, gross);
                assert!(split.fee <= gross);
                assert_eq!(
                    split.fee,
                    gross * U256::from(bps) / U256::from(BPS_DENOMINATOR)
                );
            }
        }
    }

    #[test]
    fn test_full_and_zero_rates() {
        let gross = UNIT;
        assert_eq!(FeeCalculator::split(gross, 0).unwrap().fee, U256::ZERO);
        assert_eq!(FeeCalculator::split(gross, 10_000).unwrap().net, U256::ZERO);
    }

    #[test]
    fn test_rate_above_100_percent_rejected() {
        assert!(FeeCalculator::split(UNIT, 10_001).is_err());
        assert!(FeeConfig::new(10_001, 0).is_err());
        assert!(FeeConfig::new(0, 10_001).is_err());
        assert!(FeeConfig::new(10_000, 10_000).is_ok());
    }
}
