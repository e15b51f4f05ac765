//! Migration Controller
//!
//! One-way state machine `Trading -> Migrated`. After every successful trade
//! the market cap is compared against the threshold; on crossing, the
//! treasury and a token reserve are handed to the external venue and the
//! curve closes for good.
//!
//! The handoff runs with the market's own authority: it is never checked
//! against the trader whose call tripped the threshold.
//!
//! Migration cannot fail once triggered. If the venue handoff breaks, the
//! failure is recorded on the [`MigrationRecord`] and `migrated` is still set.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::events::MarketEvent;
use super::MarketState;
use crate::curve::CurvePricer;
use crate::error::MarketResult;
use crate::ledger::{CurrencyBank, LedgerError, TokenLedger};
use crate::venue::{LiquidityReceipt, LiquidityVenue, VenueError};

/// Migration parameters (immutable after construction)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Market cap (in currency) that triggers migration
    pub cap_threshold: U256,

    /// Venue account receiving the handoff
    pub venue: Address,

    /// Tokens minted to the venue alongside the currency, clamped to the
    /// headroom left under max supply
    pub liquidity_token_reserve: U256,
}

/// What happened at migration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRecord {
    pub market_cap: U256,
    pub currency_amount: U256,
    pub token_amount: U256,
    pub receipt: Option<LiquidityReceipt>,
    pub failure: Option<String>,
}

impl MigrationRecord {
    /// Whether the venue accepted the deposit
    pub fn is_complete(&self) -> bool {
        self.receipt.is_some()
    }
}

#[derive(Error, Debug)]
enum HandoffError {
    #[error("{0}")]
    Ledger(#[from] LedgerError),

    #[error("{0}")]
    Venue(#[from] VenueError),
}

#[derive(Debug, Clone, Copy)]
pub struct MigrationController {
    config: MigrationConfig,
}

impl MigrationController {
    pub fn new(config: MigrationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// Market cap if it has reached the threshold, `None` otherwise
    ///
    /// Pure; always `None` once migrated.
    pub fn evaluate(
        &self,
        pricer: &CurvePricer,
        supply: U256,
        migrated: bool,
    ) -> MarketResult<Option<U256>> {
        if migrated {
            return Ok(None);
        }

        let market_cap = pricer.market_cap(supply)?;
        if market_cap >= self.config.cap_threshold {
            Ok(Some(market_cap))
        } else {
            Ok(None)
        }
    }

    /// Hand off reserves, close trading and record `LPMigrated`
    pub(crate) fn migrate<L, B, V>(
        &self,
        state: &mut MarketState<L, B, V>,
        pricer: &CurvePricer,
        treasury: Address,
        market_cap: U256,
    ) -> MigrationRecord
    where
        L: TokenLedger,
        B: CurrencyBank,
        V: LiquidityVenue,
    {
        let currency_amount = state.bank.balance_of(treasury);
        let headroom = pricer
            .max_supply()
            .saturating_sub(state.ledger.total_supply());
        let token_amount = self.config.liquidity_token_reserve.min(headroom);

        info!(
            "🚀 Market cap {} crossed threshold {} - migrating {} currency + {} tokens to {}",
            market_cap, self.config.cap_threshold, currency_amount, token_amount, self.config.venue
        );

        let (receipt, failure) =
            match self.hand_off(state, treasury, currency_amount, token_amount) {
                Ok(receipt) => (Some(receipt), None),
                Err(e) => {
                    warn!("Liquidity handoff failed, closing curve anyway: {}", e);
                    (None, Some(e.to_string()))
                }
            };

        let record = MigrationRecord {
            market_cap,
            currency_amount,
            token_amount,
            receipt,
            failure,
        };

        state.migrated = true;
        state.events.push(MarketEvent::LpMigrated { market_cap });
        state.migration = Some(record.clone());

        record
    }

    fn hand_off<L, B, V>(
        &self,
        state: &mut MarketState<L, B, V>,
        treasury: Address,
        currency_amount: U256,
        token_amount: U256,
    ) -> Result<LiquidityReceipt, HandoffError>
    where
        L: TokenLedger,
        B: CurrencyBank,
        V: LiquidityVenue,
    {
        let venue = self.config.venue;
        if !currency_amount.is_zero() {
            state.bank.transfer(treasury, venue, currency_amount)?;
        }
        if !token_amount.is_zero() {
            state.ledger.mint(venue, token_amount)?;
        }
        Ok(state.venue.deposit_liquidity(currency_amount, token_amount)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{units, CurveConfig, UNIT};
    use crate::ledger::{InMemoryBank, InMemoryLedger};
    use crate::venue::SimulatedVenue;

    const TREASURY: Address = Address::repeat_byte(0x10);
    const VENUE: Address = Address::repeat_byte(0x20);

    fn pricer() -> CurvePricer {
        let curve = CurveConfig::new(units(1), UNIT / U256::from(1000), units(1_000_000)).unwrap();
        CurvePricer::new(curve)
    }

    fn controller(cap: u64, reserve: U256) -> MigrationController {
        MigrationController::new(MigrationConfig {
            cap_threshold: units(cap),
            venue: VENUE,
            liquidity_token_reserve: reserve,
        })
    }

    struct DownVenue;

    impl LiquidityVenue for DownVenue {
        fn deposit_liquidity(&mut self, _: U256, _: U256) -> Result<LiquidityReceipt, VenueError> {
            Err(VenueError::Unavailable)
        }
    }

    #[test]
    fn test_evaluate_threshold() {
        let controller = controller(100, U256::ZERO);
        let pricer = pricer();

        assert_eq!(controller.evaluate(&pricer, U256::ZERO, false).unwrap(), None);

        // 1 token at ~1001 is already past 100
        let cap = controller.evaluate(&pricer, units(1), false).unwrap();
        assert_eq!(cap, Some(pricer.market_cap(units(1)).unwrap()));

        // Never again once migrated
        assert_eq!(controller.evaluate(&pricer, units(1), true).unwrap(), None);
    }

    #[test]
    fn test_migrate_hands_off_treasury_and_clamped_reserve() {
        let controller = controller(0, units(2_000_000));
        let pricer = pricer();

        let mut bank = InMemoryBank::new();
        bank.credit(TREASURY, units(50)).unwrap();
        let mut ledger = InMemoryLedger::new();
        ledger.mint(Address::repeat_byte(0x01), units(400_000)).unwrap();

        let mut state = MarketState::new(ledger, bank, SimulatedVenue::new(VENUE), TREASURY);
        let record = controller.migrate(&mut state, &pricer, TREASURY, units(42));

        assert!(record.is_complete());
        assert_eq!(record.currency_amount, units(50));
        assert_eq!(record.token_amount, units(600_000));
        assert!(state.is_migrated());
        assert_eq!(state.bank.balance_of(TREASURY), U256::ZERO);
        assert_eq!(state.bank.balance_of(VENUE), units(50));
        assert_eq!(state.ledger.total_supply(), units(1_000_000));
        assert_eq!(state.venue().deposits().len(), 1);
        assert_eq!(
            state.events().last(),
            Some(&MarketEvent::LpMigrated { market_cap: units(42) })
        );
    }

    #[test]
    fn test_venue_failure_still_migrates() {
        let controller = controller(0, U256::ZERO);
        let pricer = pricer();

        let mut bank = InMemoryBank::new();
        bank.credit(TREASURY, units(5)).unwrap();

        let mut state = MarketState::new(InMemoryLedger::new(), bank, DownVenue, TREASURY);
        let record = controller.migrate(&mut state, &pricer, TREASURY, units(1));

        assert!(!record.is_complete());
        assert_eq!(record.failure.as_deref(), Some("Venue unavailable"));
        assert!(state.is_migrated());
        assert_eq!(state.migration_record(), Some(&record));
    }
}
