//! External Liquidity Venue
//!
//! After migration the curve stops trading and the accumulated currency plus
//! a token reserve are deposited into an external venue (an AMM pool in
//! practice). The market only needs one call from it.

use alloy_primitives::{keccak256, Address, B256, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::curve::math::isqrt;

/// Error from the venue
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VenueError {
    #[error("Venue rejected deposit: {0}")]
    Rejected(String),

    #[error("Venue unavailable")]
    Unavailable,
}

/// Proof of a liquidity deposit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityReceipt {
    /// Venue-assigned deposit id
    pub id: B256,
    pub venue: Address,
    pub currency_amount: U256,
    pub token_amount: U256,
    /// LP units issued for the deposit
    pub liquidity: U256,
}

pub trait LiquidityVenue: Send {
    fn deposit_liquidity(
        &mut self,
        currency_amount: U256,
        token_amount: U256,
    ) -> Result<LiquidityReceipt, VenueError>;
}

/// In-process venue that accepts every deposit
///
/// Issues `sqrt(currency * tokens)` LP units per deposit, like a fresh
/// constant-product pool.
#[derive(Debug, Clone)]
pub struct SimulatedVenue {
    address: Address,
    deposits: Vec<LiquidityReceipt>,
}

impl SimulatedVenue {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            deposits: Vec::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn deposits(&self) -> &[LiquidityReceipt] {
        &self.deposits
    }
}

impl LiquidityVenue for SimulatedVenue {
    fn deposit_liquidity(
        &mut self,
        currency_amount: U256,
        token_amount: U256,
    ) -> Result<LiquidityReceipt, VenueError> {
        let nonce = self.deposits.len() as u64;
        let mut preimage = Vec::with_capacity(28);
        preimage.extend_from_slice(self.address.as_slice());
        preimage.extend_from_slice(&nonce.to_be_bytes());

        let liquidity = currency_amount
            .checked_mul(token_amount)
            .map(isqrt)
            .ok_or_else(|| VenueError::Rejected("liquidity overflow".into()))?;

        let receipt = LiquidityReceipt {
            id: keccak256(&preimage),
            venue: self.address,
            currency_amount,
            token_amount,
            liquidity,
        };

        info!(
            "Venue {} accepted deposit #{}: {} currency + {} tokens -> {} LP",
            self.address, nonce, currency_amount, token_amount, liquidity
        );

        self.deposits.push(receipt.clone());
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::math::units;

    #[test]
    fn test_simulated_venue_issues_geometric_mean_liquidity() {
        let mut venue = SimulatedVenue::new(Address::repeat_byte(0x77));

        let receipt = venue.deposit_liquidity(units(4), units(9)).unwrap();
        assert_eq!(receipt.liquidity, units(6));
        assert_eq!(receipt.venue, venue.address());
        assert_eq!(venue.deposits().len(), 1);
    }

    #[test]
    fn test_receipt_ids_are_unique_per_deposit() {
        let mut venue = SimulatedVenue::new(Address::repeat_byte(0x77));

        let first = venue.deposit_liquidity(units(1), units(1)).unwrap();
        let second = venue.deposit_liquidity(units(1), units(1)).unwrap();
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_empty_deposit_is_accepted() {
        let mut venue = SimulatedVenue::new(Address::ZERO);
        let receipt = venue.deposit_liquidity(U256::ZERO, U256::ZERO).unwrap();
        assert_eq!(receipt.liquidity, U256::ZERO);
    }
}
