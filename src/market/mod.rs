//! The Market
//!
//! Responsible for:
//! - Owning the mutable market state behind a single lock
//! - Exposing price / buy / sell / receive and the read-only views
//! - Gating the one administrative call (fee recipient) on the owner
//!
//! Every trade runs start to finish under one lock acquisition, so the price
//! quoted, the supply checked and the mint/burn that follows can never
//! interleave with another trade.

mod engine;
mod events;
mod migration;

pub use engine::{BuyQuote, SellQuote, TradeEngine, TradeReceipt, TradeSide};
pub use events::{LPMigrated, MarketEvent, TokensPurchased, TokensSold};
pub use migration::{MigrationConfig, MigrationController, MigrationRecord};

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};
use tracing::info;

use crate::curve::{CurveConfig, CurvePricer, FeeConfig};
use crate::error::{MarketError, MarketResult};
use crate::ledger::{CurrencyBank, TokenLedger};
use crate::venue::LiquidityVenue;

/// Everything needed to stand up a market
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketParams {
    pub curve: CurveConfig,
    pub fees: FeeConfig,
    pub migration: MigrationConfig,
    /// Only identity allowed to change the fee recipient
    pub owner: Address,
    pub fee_recipient: Address,
    /// Account holding deposited currency
    pub treasury: Address,
}

impl MarketParams {
    pub fn validate(&self) -> MarketResult<()> {
        self.curve.validate()?;
        self.fees.validate()?;
        if self.treasury == self.fee_recipient {
            return Err(MarketError::InvalidConfig(
                "fee recipient must differ from treasury".into(),
            ));
        }
        if self.treasury == self.migration.venue {
            return Err(MarketError::InvalidConfig(
                "venue must differ from treasury".into(),
            ));
        }
        Ok(())
    }
}

/// Mutable market state
///
/// Circulating supply is always read from the ledger, never cached here.
#[derive(Debug)]
pub struct MarketState<L, B, V> {
    pub(crate) ledger: L,
    pub(crate) bank: B,
    pub(crate) venue: V,
    pub(crate) migrated: bool,
    pub(crate) fee_recipient: Address,
    pub(crate) events: Vec<MarketEvent>,
    pub(crate) migration: Option<MigrationRecord>,
}

impl<L, B, V> MarketState<L, B, V> {
    pub fn new(ledger: L, bank: B, venue: V, fee_recipient: Address) -> Self {
        Self {
            ledger,
            bank,
            venue,
            migrated: false,
            fee_recipient,
            events: Vec::new(),
            migration: None,
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn bank(&self) -> &B {
        &self.bank
    }

    pub fn venue(&self) -> &V {
        &self.venue
    }

    pub fn is_migrated(&self) -> bool {
        self.migrated
    }

    pub fn fee_recipient(&self) -> Address {
        self.fee_recipient
    }

    pub fn events(&self) -> &[MarketEvent] {
        &self.events
    }

    pub fn migration_record(&self) -> Option<&MigrationRecord> {
        self.migration.as_ref()
    }
}

/// A bonding-curve market, shareable across threads via `Arc`
#[derive(Debug)]
pub struct Market<L, B, V> {
    engine: TradeEngine,
    owner: Address,
    state: Mutex<MarketState<L, B, V>>,
}

impl<L, B, V> Market<L, B, V>
where
    L: TokenLedger,
    B: CurrencyBank,
    V: LiquidityVenue,
{
    pub fn new(params: MarketParams, ledger: L, bank: B, venue: V) -> MarketResult<Self> {
        params.validate()?;

        let pricer = CurvePricer::new(params.curve);
        // Reject a ledger that already sits above the cap
        pricer.price(ledger.total_supply())?;

        let engine = TradeEngine::new(
            pricer,
            params.fees,
            MigrationController::new(params.migration),
            params.treasury,
        );

        info!(
            "Market opened: treasury {}, max supply {}, cap threshold {}",
            params.treasury, params.curve.max_supply, params.migration.cap_threshold
        );

        Ok(Self {
            engine,
            owner: params.owner,
            state: Mutex::new(MarketState::new(ledger, bank, venue, params.fee_recipient)),
        })
    }

    fn lock(&self) -> MarketResult<MutexGuard<'_, MarketState<L, B, V>>> {
        self.state.lock().map_err(|_| MarketError::StatePoisoned)
    }

    // ========== Trading ==========

    /// Spend `currency_amount` on tokens
    pub fn buy(&self, caller: Address, currency_amount: U256) -> MarketResult<TradeReceipt> {
        let mut state = self.lock()?;
        self.engine.buy(&mut state, caller, currency_amount)
    }

    /// Redeem `token_amount` tokens for currency
    pub fn sell(&self, caller: Address, token_amount: U256) -> MarketResult<TradeReceipt> {
        let mut state = self.lock()?;
        self.engine.sell(&mut state, caller, token_amount)
    }

    /// Currency sent with no instructions is a buy
    pub fn receive(&self, caller: Address, currency_amount: U256) -> MarketResult<TradeReceipt> {
        self.buy(caller, currency_amount)
    }

    /// Quotes follow the trade paths: none once the market has migrated
    pub fn quote_buy(&self, currency_amount: U256) -> MarketResult<BuyQuote> {
        let state = self.lock()?;
        if state.migrated {
            return Err(MarketError::TradingClosed);
        }
        self.engine.quote_buy(state.ledger.total_supply(), currency_amount)
    }

    pub fn quote_sell(&self, token_amount: U256) -> MarketResult<SellQuote> {
        let state = self.lock()?;
        if state.migrated {
            return Err(MarketError::TradingClosed);
        }
        self.engine.quote_sell(state.ledger.total_supply(), token_amount)
    }

    // ========== Admin ==========

    pub fn set_fee_recipient(&self, caller: Address, fee_recipient: Address) -> MarketResult<()> {
        if caller != self.owner {
            return Err(MarketError::Unauthorized(caller));
        }
        if fee_recipient == self.engine.treasury() {
            return Err(MarketError::InvalidConfig(
                "fee recipient must differ from treasury".into(),
            ));
        }

        let mut state = self.lock()?;
        info!("Fee recipient changed: {} -> {}", state.fee_recipient, fee_recipient);
        state.fee_recipient = fee_recipient;
        Ok(())
    }

    // ========== Views ==========

    /// Current unit price
    pub fn price(&self) -> MarketResult<U256> {
        let state = self.lock()?;
        self.engine.pricer().price(state.ledger.total_supply())
    }

    pub fn market_cap(&self) -> MarketResult<U256> {
        let state = self.lock()?;
        self.engine.pricer().market_cap(state.ledger.total_supply())
    }

    pub fn total_supply(&self) -> MarketResult<U256> {
        Ok(self.lock()?.ledger.total_supply())
    }

    /// Token balance
    pub fn balance_of(&self, account: Address) -> MarketResult<U256> {
        Ok(self.lock()?.ledger.balance_of(account))
    }

    /// Native currency balance
    pub fn currency_balance(&self, account: Address) -> MarketResult<U256> {
        Ok(self.lock()?.bank.balance_of(account))
    }

    pub fn treasury_balance(&self) -> MarketResult<U256> {
        self.currency_balance(self.engine.treasury())
    }

    pub fn is_migrated(&self) -> MarketResult<bool> {
        Ok(self.lock()?.migrated)
    }

    pub fn fee_recipient(&self) -> MarketResult<Address> {
        Ok(self.lock()?.fee_recipient)
    }

    pub fn events(&self) -> MarketResult<Vec<MarketEvent>> {
        Ok(self.lock()?.events.clone())
    }

    pub fn migration_record(&self) -> MarketResult<Option<MigrationRecord>> {
        Ok(self.lock()?.migration.clone())
    }

    /// Read-only access to the whole state under the lock
    pub fn with_state<R>(&self, f: impl FnOnce(&MarketState<L, B, V>) -> R) -> MarketResult<R> {
        let state = self.lock()?;
        Ok(f(&state))
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn treasury(&self) -> Address {
        self.engine.treasury()
    }

    pub fn engine(&self) -> &TradeEngine {
        &self.engine
    }

    pub fn pricer(&self) -> &CurvePricer {
        self.engine.pricer()
    }
}
