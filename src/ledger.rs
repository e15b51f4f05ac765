//! Token Ledger & Currency Bank
//!
//! The market never stores balances itself. Token balances and supply live
//! in a [`TokenLedger`]; native currency lives in a [`CurrencyBank`]. Both
//! are external collaborators in production, so the market only relies on
//! the calls below. In-memory versions back the simulator and the tests.

use alloy_primitives::{Address, U256};
use std::collections::HashMap;
use thiserror::Error;

/// Error from a ledger or bank operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Insufficient funds in {account}: have {have}, need {need}")]
    InsufficientFunds {
        account: Address,
        have: U256,
        need: U256,
    },

    #[error("Balance overflow for {0}")]
    Overflow(Address),

    #[error("Transfer rejected: {0}")]
    Rejected(String),
}

/// Fungible token ledger with standard conservation semantics
pub trait TokenLedger: Send {
    fn mint(&mut self, to: Address, amount: U256) -> Result<(), LedgerError>;
    fn burn(&mut self, from: Address, amount: U256) -> Result<(), LedgerError>;
    fn balance_of(&self, account: Address) -> U256;
    fn total_supply(&self) -> U256;
}

/// Native currency movements
///
/// Transfers are synchronous; an `Err` means no funds moved.
pub trait CurrencyBank: Send {
    fn transfer(&mut self, from: Address, to: Address, amount: U256) -> Result<(), LedgerError>;
    fn balance_of(&self, account: Address) -> U256;
}

// ============================================
// IN-MEMORY TOKEN LEDGER
// ============================================

#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    balances: HashMap<Address, U256>,
    total_supply: U256,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of accounts with a non-zero balance
    pub fn holder_count(&self) -> usize {
        self.balances.values().filter(|b| !b.is_zero()).count()
    }
}

impl TokenLedger for InMemoryLedger {
    fn mint(&mut self, to: Address, amount: U256) -> Result<(), LedgerError> {
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::Overflow(to))?;
        let balance = self.balances.entry(to).or_default();
        // Balance <= supply, so this cannot overflow once supply didn't
        *balance += amount;
        self.total_supply = supply;
        Ok(())
    }

    fn burn(&mut self, from: Address, amount: U256) -> Result<(), LedgerError> {
        let have = TokenLedger::balance_of(self, from);
        if have < amount {
            return Err(LedgerError::InsufficientFunds {
                account: from,
                have,
                need: amount,
            });
        }
        self.balances.insert(from, have - amount);
        self.total_supply -= amount;
        Ok(())
    }

    fn balance_of(&self, account: Address) -> U256 {
        self.balances.get(&account).copied().unwrap_or_default()
    }

    fn total_supply(&self) -> U256 {
        self.total_supply
    }
}

// ============================================
// IN-MEMORY CURRENCY BANK
// ============================================

#[derive(Debug, Clone, Default)]
pub struct InMemoryBank {
    balances: HashMap<Address, U256>,
}

impl InMemoryBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit new currency to an account (faucet / genesis funding)
    pub fn credit(&mut self, account: Address, amount: U256) -> Result<(), LedgerError> {
        let balance = self.balances.entry(account).or_default();
        *balance = balance
            .checked_add(amount)
            .ok_or(LedgerError::Overflow(account))?;
        Ok(())
    }

    /// Sum of all balances
    pub fn total(&self) -> U256 {
        self.balances.values().fold(U256::ZERO, |acc, b| acc + *b)
    }
}

impl CurrencyBank for InMemoryBank {
    fn transfer(&mut self, from: Address, to: Address, amount: U256) -> Result<(), LedgerError> {
        let have = self.balance_of(from);
        if have < amount {
            return Err(LedgerError::InsufficientFunds {
                account: from,
                have,
                need: amount,
            });
        }
        if from == to {
            return Ok(());
        }
        let received = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow(to))?;
        self.balances.insert(from, have - amount);
        self.balances.insert(to, received);
        Ok(())
    }

    fn balance_of(&self, account: Address) -> U256 {
        self.balances.get(&account).copied().unwrap_or_default()
    }
}
