//! Linear Supply Curve
//!
//! ```text
//! price(s) = initial_price + (max_supply - s) * price_slope
//! ```
//!
//! Price is tied to the headroom left under `max_supply`: every token minted
//! shrinks the headroom, so price falls toward `initial_price` as supply
//! approaches the cap and rises again as tokens are burned.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use super::math::{mul_div, UNIT};
use crate::error::{MarketError, MarketResult};

/// Curve parameters (immutable after construction)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurveConfig {
    /// Price floor, reached when supply hits `max_supply`
    pub initial_price: U256,

    /// Price change per whole token of headroom
    pub price_slope: U256,

    /// Hard cap on circulating supply
    pub max_supply: U256,
}

impl CurveConfig {
    pub fn new(initial_price: U256, price_slope: U256, max_supply: U256) -> MarketResult<Self> {
        let config = Self {
            initial_price,
            price_slope,
            max_supply,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> MarketResult<()> {
        if self.max_supply.is_zero() {
            return Err(MarketError::InvalidConfig("max_supply must be non-zero".into()));
        }
        if self.initial_price.is_zero() {
            return Err(MarketError::InvalidConfig("initial_price must be non-zero".into()));
        }
        // Highest price is at zero supply; make sure it fits.
        mul_div(self.max_supply, self.price_slope, UNIT)?
            .checked_add(self.initial_price)
            .ok_or(MarketError::Overflow)?;
        Ok(())
    }
}

/// Maps circulating supply to unit price
#[derive(Debug, Clone, Copy)]
pub struct CurvePricer {
    config: CurveConfig,
}

impl CurvePricer {
    pub fn new(config: CurveConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CurveConfig {
        &self.config
    }

    pub fn max_supply(&self) -> U256 {
        self.config.max_supply
    }

    /// Unit price at the given supply
    pub fn price(&self, supplied_so_far: U256) -> MarketResult<U256> {
        let tokens_remaining = self
            .config
            .max_supply
            .checked_sub(supplied_so_far)
            .ok_or(MarketError::SupplyOverflow {
                supply: supplied_so_far,
                max_supply: self.config.max_supply,
            })?;

        mul_div(tokens_remaining, self.config.price_slope, UNIT)?
            .checked_add(self.config.initial_price)
            .ok_or(MarketError::Overflow)
    }

    /// Tokens bought by `currency` at `price` (truncating)
    pub fn tokens_for_currency(&self, currency: U256, price: U256) -> MarketResult<U256> {
        mul_div(currency, UNIT, price)
    }

    /// Currency paid for `tokens` at `price` (truncating)
    pub fn currency_for_tokens(&self, tokens: U256, price: U256) -> MarketResult<U256> {
        mul_div(tokens, price, UNIT)
    }

    /// supply * price(supply)
    pub fn market_cap(&self, supply: U256) -> MarketResult<U256> {
        let price = self.price(supply)?;
        self.currency_for_tokens(supply, price)
    }
}
