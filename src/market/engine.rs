//! Trade Engine
//!
//! Buy and sell against the curve. Each call either completes every step or
//! leaves ledger, bank and event log exactly as it found them:
//! - preconditions are checked before anything moves
//! - every applied effect is journaled, and undone in reverse if a later
//!   step is refused (e.g. an under-funded treasury on a sell)
//!
//! Ordering inside a trade:
//! - buy: deposit -> mint -> fee transfer -> migration check
//! - sell: burn -> payout -> fee transfer -> migration check
//!
//! Supply always shrinks before currency leaves the treasury.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::events::MarketEvent;
use super::migration::{MigrationController, MigrationRecord};
use super::MarketState;
use crate::curve::{CurvePricer, FeeCalculator, FeeConfig};
use crate::error::{MarketError, MarketResult};
use crate::ledger::{CurrencyBank, LedgerError, TokenLedger};
use crate::venue::LiquidityVenue;

// ============================================
// QUOTES & RECEIPTS
// ============================================

/// Exact outcome of a buy at the current supply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuyQuote {
    pub price: U256,
    pub currency_amount: U256,
    pub token_amount: U256,
    pub fee: U256,
    /// Currency that stays in the treasury
    pub net: U256,
}

/// Exact outcome of a sell at the current supply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SellQuote {
    pub price: U256,
    pub token_amount: U256,
    pub gross: U256,
    pub fee: U256,
    /// Currency paid to the seller
    pub net: U256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeSide {
    Buy,
    Sell,
}

impl std::fmt::Display for TradeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeSide::Buy => write!(f, "BUY"),
            TradeSide::Sell => write!(f, "SELL"),
        }
    }
}

/// Result of a completed trade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeReceipt {
    pub side: TradeSide,
    pub trader: Address,
    /// Price the trade executed at
    pub price: U256,
    /// Buy: currency paid in. Sell: currency paid out (after fee).
    pub currency_amount: U256,
    /// Buy: tokens minted. Sell: tokens burned.
    pub token_amount: U256,
    pub fee: U256,
    /// Set when this trade tripped the migration
    pub migration: Option<MigrationRecord>,
}

// ============================================
// JOURNAL
// ============================================

#[derive(Debug)]
enum Effect {
    Minted { to: Address, amount: U256 },
    Burned { from: Address, amount: U256 },
    Moved { from: Address, to: Address, amount: U256 },
}

/// Applied side effects of an in-flight trade
#[derive(Debug, Default)]
struct Journal {
    effects: Vec<Effect>,
}

impl Journal {
    fn mint<L: TokenLedger>(
        &mut self,
        ledger: &mut L,
        to: Address,
        amount: U256,
    ) -> Result<(), LedgerError> {
        ledger.mint(to, amount)?;
        self.effects.push(Effect::Minted { to, amount });
        Ok(())
    }

    fn burn<L: TokenLedger>(
        &mut self,
        ledger: &mut L,
        from: Address,
        amount: U256,
    ) -> Result<(), LedgerError> {
        ledger.burn(from, amount)?;
        self.effects.push(Effect::Burned { from, amount });
        Ok(())
    }

    fn transfer<B: CurrencyBank>(
        &mut self,
        bank: &mut B,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), LedgerError> {
        if amount.is_zero() {
            return Ok(());
        }
        bank.transfer(from, to, amount)?;
        self.effects.push(Effect::Moved { from, to, amount });
        Ok(())
    }

    /// Undo every effect, newest first
    ///
    /// Each undo is the inverse of a step that just succeeded against the same
    /// collaborators, so it is expected to succeed too. A collaborator that
    /// refuses an undo breaks the all-or-nothing guarantee: the failure is
    /// logged and the remaining effects are still undone.
    fn rollback<L: TokenLedger, B: CurrencyBank>(self, ledger: &mut L, bank: &mut B) {
        for effect in self.effects.into_iter().rev() {
            let undone = match effect {
                Effect::Minted { to, amount } => ledger.burn(to, amount),
                Effect::Burned { from, amount } => ledger.mint(from, amount),
                Effect::Moved { from, to, amount } => bank.transfer(to, from, amount),
            };
            if let Err(e) = undone {
                error!("Rollback step failed, state is partially applied: {}", e);
            }
        }
    }
}

// ============================================
// ENGINE
// ============================================

/// Curve trading logic over a borrowed [`MarketState`]
///
/// Holds only immutable configuration; callers serialize access to the state.
#[derive(Debug, Clone)]
pub struct TradeEngine {
    pricer: CurvePricer,
    fees: FeeConfig,
    migration: MigrationController,
    treasury: Address,
}

impl TradeEngine {
    pub fn new(
        pricer: CurvePricer,
        fees: FeeConfig,
        migration: MigrationController,
        treasury: Address,
    ) -> Self {
        Self {
            pricer,
            fees,
            migration,
            treasury,
        }
    }

    pub fn pricer(&self) -> &CurvePricer {
        &self.pricer
    }

    pub fn fees(&self) -> &FeeConfig {
        &self.fees
    }

    pub fn migration(&self) -> &MigrationController {
        &self.migration
    }

    pub fn treasury(&self) -> Address {
        self.treasury
    }

    /// What `currency_amount` buys at `supply`
    pub fn quote_buy(&self, supply: U256, currency_amount: U256) -> MarketResult<BuyQuote> {
        if currency_amount.is_zero() {
            return Err(MarketError::ZeroAmount);
        }

        let price = self.pricer.price(supply)?;
        let token_amount = self.pricer.tokens_for_currency(currency_amount, price)?;
        if token_amount.is_zero() {
            return Err(MarketError::ZeroOutput);
        }

        let max_supply = self.pricer.max_supply();
        let new_supply = supply.checked_add(token_amount).ok_or(MarketError::Overflow)?;
        if new_supply > max_supply {
            return Err(MarketError::ExceedsMaxSupply {
                requested: token_amount,
                supply,
                max_supply,
            });
        }

        let split = FeeCalculator::split(currency_amount, self.fees.buy_fee_bps)?;
        debug!(
            "Quote buy: {} currency @ {} -> {} tokens (fee {})",
            currency_amount, price, token_amount, split.fee
        );

        Ok(BuyQuote {
            price,
            currency_amount,
            token_amount,
            fee: split.fee,
            net: split.net,
        })
    }

    /// What selling `token_amount` pays at `supply`
    pub fn quote_sell(&self, supply: U256, token_amount: U256) -> MarketResult<SellQuote> {
        if token_amount.is_zero() {
            return Err(MarketError::ZeroAmount);
        }

        let price = self.pricer.price(supply)?;
        let gross = self.pricer.currency_for_tokens(token_amount, price)?;
        if gross.is_zero() {
            return Err(MarketError::ZeroOutput);
        }

        let split = FeeCalculator::split(gross, self.fees.sell_fee_bps)?;
        debug!(
            "Quote sell: {} tokens @ {} -> {} currency (fee {})",
            token_amount, price, split.net, split.fee
        );

        Ok(SellQuote {
            price,
            token_amount,
            gross,
            fee: split.fee,
            net: split.net,
        })
    }

    pub fn buy<L, B, V>(
        &self,
        state: &mut MarketState<L, B, V>,
        caller: Address,
        currency_amount: U256,
    ) -> MarketResult<TradeReceipt>
    where
        L: TokenLedger,
        B: CurrencyBank,
        V: LiquidityVenue,
    {
        if state.migrated {
            return Err(MarketError::TradingClosed);
        }

        let quote = self.quote_buy(state.ledger.total_supply(), currency_amount)?;
        let fee_recipient = state.fee_recipient;

        let mut journal = Journal::default();
        let applied = self.apply_buy(state, &mut journal, caller, fee_recipient, &quote);
        let trigger = match applied {
            Ok(trigger) => trigger,
            Err(e) => {
                warn!("Buy by {} reverted: {}", caller, e);
                journal.rollback(&mut state.ledger, &mut state.bank);
                return Err(e);
            }
        };

        state.events.push(MarketEvent::TokensPurchased {
            buyer: caller,
            currency_amount,
            token_amount: quote.token_amount,
        });
        info!(
            "🟢 BUY {}: {} currency -> {} tokens @ {} (fee {})",
            caller, currency_amount, quote.token_amount, quote.price, quote.fee
        );

        let migration =
            trigger.map(|cap| self.migration.migrate(state, &self.pricer, self.treasury, cap));

        Ok(TradeReceipt {
            side: TradeSide::Buy,
            trader: caller,
            price: quote.price,
            currency_amount,
            token_amount: quote.token_amount,
            fee: quote.fee,
            migration,
        })
    }

    pub fn sell<L, B, V>(
        &self,
        state: &mut MarketState<L, B, V>,
        caller: Address,
        token_amount: U256,
    ) -> MarketResult<TradeReceipt>
    where
        L: TokenLedger,
        B: CurrencyBank,
        V: LiquidityVenue,
    {
        if state.migrated {
            return Err(MarketError::TradingClosed);
        }
        if token_amount.is_zero() {
            return Err(MarketError::ZeroAmount);
        }

        let have = state.ledger.balance_of(caller);
        if have < token_amount {
            return Err(MarketError::InsufficientBalance {
                have,
                need: token_amount,
            });
        }

        let quote = self.quote_sell(state.ledger.total_supply(), token_amount)?;
        let fee_recipient = state.fee_recipient;

        let mut journal = Journal::default();
        let applied = self.apply_sell(state, &mut journal, caller, fee_recipient, &quote);
        let trigger = match applied {
            Ok(trigger) => trigger,
            Err(e) => {
                warn!("Sell by {} reverted: {}", caller, e);
                journal.rollback(&mut state.ledger, &mut state.bank);
                return Err(e);
            }
        };

        state.events.push(MarketEvent::TokensSold {
            seller: caller,
            token_amount,
            currency_amount: quote.net,
        });
        info!(
            "🔴 SELL {}: {} tokens -> {} currency @ {} (fee {})",
            caller, token_amount, quote.net, quote.price, quote.fee
        );

        let migration =
            trigger.map(|cap| self.migration.migrate(state, &self.pricer, self.treasury, cap));

        Ok(TradeReceipt {
            side: TradeSide::Sell,
            trader: caller,
            price: quote.price,
            currency_amount: quote.net,
            token_amount,
            fee: quote.fee,
            migration,
        })
    }

    fn apply_buy<L, B, V>(
        &self,
        state: &mut MarketState<L, B, V>,
        journal: &mut Journal,
        caller: Address,
        fee_recipient: Address,
        quote: &BuyQuote,
    ) -> MarketResult<Option<U256>>
    where
        L: TokenLedger,
        B: CurrencyBank,
        V: LiquidityVenue,
    {
        journal.transfer(&mut state.bank, caller, self.treasury, quote.currency_amount)?;
        journal.mint(&mut state.ledger, caller, quote.token_amount)?;
        journal.transfer(&mut state.bank, self.treasury, fee_recipient, quote.fee)?;

        self.migration
            .evaluate(&self.pricer, state.ledger.total_supply(), state.migrated)
    }

    fn apply_sell<L, B, V>(
        &self,
        state: &mut MarketState<L, B, V>,
        journal: &mut Journal,
        caller: Address,
        fee_recipient: Address,
        quote: &SellQuote,
    ) -> MarketResult<Option<U256>>
    where
        L: TokenLedger,
        B: CurrencyBank,
        V: LiquidityVenue,
    {
        journal.burn(&mut state.ledger, caller, quote.token_amount)?;
        journal.transfer(&mut state.bank, self.treasury, caller, quote.net)?;
        journal.transfer(&mut state.bank, self.treasury, fee_recipient, quote.fee)?;

        self.migration
            .evaluate(&self.pricer, state.ledger.total_supply(), state.migrated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{units, CurveConfig, UNIT};
    use crate::ledger::{InMemoryBank, InMemoryLedger};
    use crate::market::migration::MigrationConfig;
    use crate::venue::SimulatedVenue;

    const TREASURY: Address = Address::repeat_byte(0x10);
    const FEES: Address = Address::repeat_byte(0xfe);
    const ALICE: Address = Address::repeat_byte(0xa1);

    fn engine(cap: U256) -> TradeEngine {
        let curve = CurveConfig::new(units(1), UNIT / U256::from(1000), units(1_000_000)).unwrap();
        TradeEngine::new(
            CurvePricer::new(curve),
            FeeConfig::new(100, 200).unwrap(),
            MigrationController::new(MigrationConfig {
                cap_threshold: cap,
                venue: Address::repeat_byte(0x20),
                liquidity_token_reserve: U256::ZERO,
            }),
            TREASURY,
        )
    }

    fn state(alice_currency: U256) -> MarketState<InMemoryLedger, InMemoryBank, SimulatedVenue> {
        let mut bank = InMemoryBank::new();
        bank.credit(ALICE, alice_currency).unwrap();
        MarketState::new(
            InMemoryLedger::new(),
            bank,
            SimulatedVenue::new(Address::repeat_byte(0x20)),
            FEES,
        )
    }

    #[test]
    fn test_quote_buy_at_zero_supply() {
        let engine = engine(U256::MAX);
        let quote = engine.quote_buy(U256::ZERO, units(1001)).unwrap();

        assert_eq!(quote.price, units(1001));
        assert_eq!(quote.token_amount, units(1));
        assert_eq!(quote.fee, U256::from(10_010_000_000_000_000_000u128)); // 1%
        assert_eq!(quote.net + quote.fee, units(1001));
    }

    #[test]
    fn test_quote_rejects_zero_and_dust() {
        let engine = engine(U256::MAX);
        assert_eq!(engine.quote_buy(U256::ZERO, U256::ZERO), Err(MarketError::ZeroAmount));
        // 1 wei buys nothing at a price of 1001
        assert_eq!(engine.quote_buy(U256::ZERO, U256::from(1)), Err(MarketError::ZeroOutput));
        assert_eq!(engine.quote_sell(U256::ZERO, U256::ZERO), Err(MarketError::ZeroAmount));
    }

    #[test]
    fn test_buy_moves_currency_and_mints() {
        let engine = engine(U256::MAX);
        let mut state = state(units(5_000));

        let receipt = engine.buy(&mut state, ALICE, units(1001)).unwrap();

        assert_eq!(receipt.side, TradeSide::Buy);
        assert_eq!(receipt.token_amount, units(1));
        assert!(receipt.migration.is_none());
        assert_eq!(state.ledger.balance_of(ALICE), units(1));
        assert_eq!(state.bank.balance_of(ALICE), units(5_000 - 1001));
        assert_eq!(state.bank.balance_of(FEES), receipt.fee);
        assert_eq!(state.bank.balance_of(TREASURY), units(1001) - receipt.fee);
        assert_eq!(state.events().len(), 1);
    }

    #[test]
    fn test_buy_without_funds_changes_nothing() {
        let engine = engine(U256::MAX);
        let mut state = state(units(10));

        let err = engine.buy(&mut state, ALICE, units(1001)).unwrap_err();
        assert!(matches!(err, MarketError::Ledger(LedgerError::InsufficientFunds { .. })));
        assert_eq!(state.ledger.total_supply(), U256::ZERO);
        assert_eq!(state.bank.balance_of(ALICE), units(10));
        assert!(state.events().is_empty());
    }

    #[test]
    fn test_sell_with_underfunded_treasury_rolls_back_burn() {
        let engine = engine(U256::MAX);
        let mut state = state(units(5_000));

        engine.buy(&mut state, ALICE, units(1001)).unwrap();
        let treasury_before = state.bank.balance_of(TREASURY);

        // Gross payout is ~1000.999 but treasury only kept 1001 - 1% fee
        let err = engine.sell(&mut state, ALICE, units(1)).unwrap_err();
        assert!(matches!(err, MarketError::Ledger(LedgerError::InsufficientFunds { .. })));

        assert_eq!(state.ledger.balance_of(ALICE), units(1));
        assert_eq!(state.ledger.total_supply(), units(1));
        assert_eq!(state.bank.balance_of(TREASURY), treasury_before);
        assert_eq!(state.events().len(), 1);
    }

    /// Bank that accepts one-way payments out of `frozen` but never back in
    struct OneWayBank {
        inner: InMemoryBank,
        frozen: Address,
    }

    impl CurrencyBank for OneWayBank {
        fn transfer(
            &mut self,
            from: Address,
            to: Address,
            amount: U256,
        ) -> Result<(), LedgerError> {
            if to == self.frozen {
                return Err(LedgerError::Rejected(format!("{} is frozen", to)));
            }
            self.inner.transfer(from, to, amount)
        }

        fn balance_of(&self, account: Address) -> U256 {
            self.inner.balance_of(account)
        }
    }

    #[test]
    fn test_rollback_continues_past_refused_undo() {
        let mut ledger = InMemoryLedger::new();
        let mut inner = InMemoryBank::new();
        inner.credit(ALICE, units(10)).unwrap();
        let mut bank = OneWayBank { inner, frozen: ALICE };

        let mut journal = Journal::default();
        journal.mint(&mut ledger, ALICE, units(1)).unwrap();
        journal.transfer(&mut bank, ALICE, TREASURY, units(5)).unwrap();
        journal.rollback(&mut ledger, &mut bank);

        // Mint is still undone even though the refund was refused
        assert_eq!(ledger.total_supply(), U256::ZERO);
        assert_eq!(bank.balance_of(TREASURY), units(5));
        assert_eq!(bank.balance_of(ALICE), units(5));
    }

    #[test]
    fn test_zero_fee_skips_transfer() {
        let mut journal = Journal::default();
        let mut bank = InMemoryBank::new();
        journal.transfer(&mut bank, ALICE, FEES, U256::ZERO).unwrap();
        assert!(journal.effects.is_empty());
    }
}
