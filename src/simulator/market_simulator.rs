//! Market Simulator - Concurrent Random Traders
//!
//! Plays seeded random buys and sells against one shared market. Each round
//! plans one action per trader, then runs them all at once on tokio tasks so
//! the market's lock is actually contended.

use alloy_primitives::{keccak256, Address, U256};
use eyre::Result;
use futures::future::join_all;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::MarketResult;
use crate::ledger::{CurrencyBank, InMemoryBank, LedgerError, TokenLedger};
use crate::market::{Market, MigrationRecord, TradeReceipt, TradeSide};
use crate::venue::LiquidityVenue;

/// Simulation knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SimulationConfig {
    pub rounds: usize,
    pub seed: u64,

    /// Chance (percent) that a trader buys rather than sells
    pub buy_bias_pct: u8,

    /// Upper bound of a single buy, in base currency units
    pub max_buy: u128,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            rounds: 20,
            seed: 42,
            buy_bias_pct: 70,
            max_buy: 1_000_000_000_000_000, // 0.001
        }
    }
}

/// One planned trader action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeAction {
    Buy { trader: Address, currency_amount: U256 },
    Sell { trader: Address, token_amount: U256 },
}

impl TradeAction {
    pub fn side(&self) -> TradeSide {
        match self {
            TradeAction::Buy { .. } => TradeSide::Buy,
            TradeAction::Sell { .. } => TradeSide::Sell,
        }
    }
}

/// Outcome of a whole simulation run
#[derive(Debug, Clone, Default, Serialize)]
pub struct SimulationReport {
    pub rounds_run: usize,
    pub buys: usize,
    pub sells: usize,
    /// Rejected actions by error kind
    pub rejections: BTreeMap<&'static str, usize>,
    pub volume: U256,
    pub fees: U256,
    /// Round (1-based) in which the market migrated
    pub migration_round: Option<usize>,
    pub final_supply: U256,
    pub final_price: U256,
    pub final_market_cap: U256,
    pub migration: Option<MigrationRecord>,
    #[serde(skip)]
    pub receipts: Vec<TradeReceipt>,
}

impl SimulationReport {
    pub fn trades(&self) -> usize {
        self.buys + self.sells
    }

    pub fn rejected(&self) -> usize {
        self.rejections.values().sum()
    }
}

/// Deterministic trader addresses
pub fn trader_addresses(count: usize) -> Vec<Address> {
    (0..count)
        .map(|i| Address::from_word(keccak256(format!("trader-{}", i))))
        .collect()
}

/// Credit every trader with `amount` of currency
pub fn fund_traders(
    bank: &mut InMemoryBank,
    traders: &[Address],
    amount: U256,
) -> Result<(), LedgerError> {
    for trader in traders {
        bank.credit(*trader, amount)?;
    }
    Ok(())
}

pub struct MarketSimulator<L, B, V> {
    market: Arc<Market<L, B, V>>,
    traders: Vec<Address>,
    config: SimulationConfig,
    rng: StdRng,
    round: usize,
    report: SimulationReport,
}

impl<L, B, V> MarketSimulator<L, B, V>
where
    L: TokenLedger + 'static,
    B: CurrencyBank + 'static,
    V: LiquidityVenue + 'static,
{
    pub fn new(
        market: Arc<Market<L, B, V>>,
        traders: Vec<Address>,
        config: SimulationConfig,
    ) -> Self {
        info!(
            "Simulator ready: {} traders, {} rounds, seed {}",
            traders.len(),
            config.rounds,
            config.seed
        );

        Self {
            market,
            traders,
            rng: StdRng::seed_from_u64(config.seed),
            config,
            round: 0,
            report: SimulationReport::default(),
        }
    }

    pub fn market(&self) -> &Arc<Market<L, B, V>> {
        &self.market
    }

    pub fn round(&self) -> usize {
        self.round
    }

    pub fn report(&self) -> &SimulationReport {
        &self.report
    }

    /// Whether another round would run
    pub fn is_running(&self) -> Result<bool> {
        Ok(self.round < self.config.rounds && !self.market.is_migrated()?)
    }

    /// Plan one action per trader for the coming round
    pub fn plan_round(&mut self) -> Result<Vec<TradeAction>> {
        let mut actions = Vec::with_capacity(self.traders.len());

        for &trader in &self.traders {
            let buy = self.rng.gen_range(0..100u8) < self.config.buy_bias_pct;
            let held = self.market.balance_of(trader)?;

            if buy || held.is_zero() {
                let amount = self.rng.gen_range(1..=self.config.max_buy.max(1));
                actions.push(TradeAction::Buy {
                    trader,
                    currency_amount: U256::from(amount),
                });
            } else {
                let pct = self.rng.gen_range(1..=100u64);
                actions.push(TradeAction::Sell {
                    trader,
                    token_amount: held * U256::from(pct) / U256::from(100),
                });
            }
        }

        Ok(actions)
    }

    /// Run one round; `false` once the simulation is over
    pub async fn step(&mut self) -> Result<bool> {
        if !self.is_running()? {
            return Ok(false);
        }

        self.round += 1;
        let actions = self.plan_round()?;
        debug!("Round {}: {} actions", self.round, actions.len());

        let tasks = actions.into_iter().map(|action| {
            let market = Arc::clone(&self.market);
            tokio::spawn(async move { (action, execute(&market, action)) })
        });

        for joined in join_all(tasks).await {
            let (action, outcome) = joined?;
            self.record(action, outcome);
        }

        self.report.rounds_run = self.round;
        Ok(true)
    }

    fn record(&mut self, action: TradeAction, outcome: MarketResult<TradeReceipt>) {
        match outcome {
            Ok(receipt) => {
                match receipt.side {
                    TradeSide::Buy => self.report.buys += 1,
                    TradeSide::Sell => self.report.sells += 1,
                }
                self.report.volume += receipt.currency_amount;
                self.report.fees += receipt.fee;

                if let Some(record) = &receipt.migration {
                    info!("Market migrated in round {}: cap {}", self.round, record.market_cap);
                    self.report.migration_round = Some(self.round);
                    self.report.migration = Some(record.clone());
                }
                self.report.receipts.push(receipt);
            }
            Err(e) => {
                debug!("{} rejected: {}", action.side(), e);
                *self.report.rejections.entry(e.kind()).or_insert(0) += 1;
            }
        }
    }

    /// Run every remaining round
    pub async fn run(mut self) -> Result<SimulationReport> {
        while self.step().await? {}
        self.finish()
    }

    /// Close out the report with the final market state
    pub fn finish(mut self) -> Result<SimulationReport> {
        self.report.final_supply = self.market.total_supply()?;
        self.report.final_price = self.market.price()?;
        self.report.final_market_cap = self.market.market_cap()?;
        if self.report.migration.is_none() {
            self.report.migration = self.market.migration_record()?;
        }

        info!(
            "Simulation done: {} rounds, {} trades, {} rejected, migrated: {}",
            self.report.rounds_run,
            self.report.trades(),
            self.report.rejected(),
            self.report.migration.is_some()
        );

        Ok(self.report)
    }
}

fn execute<L, B, V>(market: &Market<L, B, V>, action: TradeAction) -> MarketResult<TradeReceipt>
where
    L: TokenLedger,
    B: CurrencyBank,
    V: LiquidityVenue,
{
    match action {
        TradeAction::Buy { trader, currency_amount } => market.buy(trader, currency_amount),
        TradeAction::Sell { trader, token_amount } => market.sell(trader, token_amount),
    }
}
