//! Market Events
//!
//! Append-only log of trades and the migration. Each event also has a
//! Solidity ABI encoding so indexers expecting EVM logs can consume it.

use alloy_primitives::{Address, LogData, U256};
use alloy_sol_types::{sol, SolEvent};
use serde::{Deserialize, Serialize};

sol! {
    #[derive(Debug, PartialEq, Eq)]
    event TokensPurchased(address indexed buyer, uint256 currencyAmount, uint256 tokenAmount);

    #[derive(Debug, PartialEq, Eq)]
    event TokensSold(address indexed seller, uint256 tokenAmount, uint256 currencyAmount);

    #[derive(Debug, PartialEq, Eq)]
    event LPMigrated(uint256 marketCap);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MarketEvent {
    TokensPurchased {
        buyer: Address,
        currency_amount: U256,
        token_amount: U256,
    },
    TokensSold {
        seller: Address,
        token_amount: U256,
        currency_amount: U256,
    },
    LpMigrated {
        market_cap: U256,
    },
}

impl MarketEvent {
    /// Solidity event signature, e.g. `LPMigrated(uint256)`
    pub fn signature(&self) -> &'static str {
        match self {
            MarketEvent::TokensPurchased { .. } => TokensPurchased::SIGNATURE,
            MarketEvent::TokensSold { .. } => TokensSold::SIGNATURE,
            MarketEvent::LpMigrated { .. } => LPMigrated::SIGNATURE,
        }
    }

    /// ABI-encoded log (topics + data)
    pub fn to_log_data(&self) -> LogData {
        match *self {
            MarketEvent::TokensPurchased {
                buyer,
                currency_amount,
                token_amount,
            } => TokensPurchased {
                buyer,
                currencyAmount: currency_amount,
                tokenAmount: token_amount,
            }
            .encode_log_data(),
            MarketEvent::TokensSold {
                seller,
                token_amount,
                currency_amount,
            } => TokensSold {
                seller,
                tokenAmount: token_amount,
                currencyAmount: currency_amount,
            }
            .encode_log_data(),
            MarketEvent::LpMigrated { market_cap } => LPMigrated {
                marketCap: market_cap,
            }
            .encode_log_data(),
        }
    }

    pub fn is_trade(&self) -> bool {
        !matches!(self, MarketEvent::LpMigrated { .. })
    }
}

impl std::fmt::Display for MarketEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarketEvent::TokensPurchased {
                buyer,
                currency_amount,
                token_amount,
            } => write!(f, "TokensPurchased({}, {}, {})", buyer, currency_amount, token_amount),
            MarketEvent::TokensSold {
                seller,
                token_amount,
                currency_amount,
            } => write!(f, "TokensSold({}, {}, {})", seller, token_amount, currency_amount),
            MarketEvent::LpMigrated { market_cap } => write!(f, "LPMigrated({})", market_cap),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::B256;

    #[test]
    fn test_signatures() {
        let migrated = MarketEvent::LpMigrated {
            market_cap: U256::from(1),
        };
        assert_eq!(migrated.signature(), "LPMigrated(uint256)");
        assert_eq!(
            TokensPurchased::SIGNATURE,
            "TokensPurchased(address,uint256,uint256)"
        );
        assert_eq!(TokensSold::SIGNATURE, "TokensSold(address,uint256,uint256)");
    }

    #[test]
    fn test_purchase_log_indexes_buyer() {
        let buyer = Address::repeat_byte(0x42);
        let event = MarketEvent::TokensPurchased {
            buyer,
            currency_amount: U256::from(5),
            token_amount: U256::from(7),
        };

        let log = event.to_log_data();
        assert_eq!(log.topics().len(), 2);
        assert_eq!(log.topics()[0], TokensPurchased::SIGNATURE_HASH);
        assert_eq!(log.topics()[1], B256::left_padding_from(buyer.as_slice()));
        // Two non-indexed uint256 words
        assert_eq!(log.data.len(), 64);
    }

    #[test]
    fn test_migration_log_has_no_indexed_fields() {
        let log = MarketEvent::LpMigrated {
            market_cap: U256::from(100),
        }
        .to_log_data();
        assert_eq!(log.topics().len(), 1);
        assert_eq!(log.data.len(), 32);
    }

    #[test]
    fn test_json_shape() {
        let event = MarketEvent::LpMigrated {
            market_cap: U256::from(1),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "lp_migrated");
        assert!(!event.is_trade());
    }
}
