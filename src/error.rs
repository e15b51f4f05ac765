//! Market Errors

use alloy_primitives::{Address, U256};
use thiserror::Error;

use crate::ledger::LedgerError;

/// Error during curve pricing or trading
///
/// Every variant aborts the call it came from with no state change.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketError {
    #[error("Trading is closed: liquidity has migrated")]
    TradingClosed,

    #[error("Buy of {requested} tokens exceeds max supply (supply {supply}, max {max_supply})")]
    ExceedsMaxSupply {
        requested: U256,
        supply: U256,
        max_supply: U256,
    },

    #[error("Insufficient token balance: have {have}, need {need}")]
    InsufficientBalance { have: U256, need: U256 },

    /// Supply above the curve cap. Unreachable unless the ledger was mutated
    /// behind the market's back.
    #[error("Supply {supply} exceeds max supply {max_supply}")]
    SupplyOverflow { supply: U256, max_supply: U256 },

    #[error("Trade amount must be non-zero")]
    ZeroAmount,

    #[error("Trade too small: output rounds down to zero")]
    ZeroOutput,

    #[error("Caller {0} is not authorized")]
    Unauthorized(Address),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Ledger refused operation: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Market state lock poisoned")]
    StatePoisoned,
}

/// Result type for market operations
pub type MarketResult<T> = Result<T, MarketError>;

impl MarketError {
    /// Short stable name for tallying rejections
    pub fn kind(&self) -> &'static str {
        match self {
            MarketError::TradingClosed => "trading_closed",
            MarketError::ExceedsMaxSupply { .. } => "exceeds_max_supply",
            MarketError::InsufficientBalance { .. } => "insufficient_balance",
            MarketError::SupplyOverflow { .. } => "supply_overflow",
            MarketError::ZeroAmount => "zero_amount",
            MarketError::ZeroOutput => "zero_output",
            MarketError::Unauthorized(_) => "unauthorized",
            MarketError::InvalidConfig(_) => "invalid_config",
            MarketError::Overflow => "overflow",
            MarketError::Ledger(LedgerError::InsufficientFunds { .. }) => "insufficient_funds",
            MarketError::Ledger(_) => "ledger_refused",
            MarketError::StatePoisoned => "state_poisoned",
        }
    }
}

/// Error while launching a new token market
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LaunchError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Fee recipient not set")]
    FeeRecipientNotSet,

    #[error(transparent)]
    Market(#[from] MarketError),
}
