//! Launchpad - Bonding-Curve Token Markets
//!
//! Tokens are bought from and sold back to a linear supply curve. Once the
//! market cap crosses a threshold, the accumulated currency and a token
//! reserve migrate to an external liquidity venue and the curve closes.
//!
//! Layers:
//! - `curve`: pure pricing and fee math
//! - `market`: trade engine, migration and the thread-safe [`Market`] facade
//! - `ledger` / `venue`: the external collaborators, with in-memory versions
//! - `launcher`: stands up new markets from shared defaults
//! - `simulator`: concurrent random traders against one market
//! - `config`: env / TOML configuration and the JSONL trade log

pub mod config;
pub mod curve;
pub mod error;
pub mod launcher;
pub mod ledger;
pub mod market;
pub mod simulator;
pub mod venue;

pub use curve::{CurveConfig, CurvePricer, FeeCalculator, FeeConfig};
pub use error::{LaunchError, MarketError, MarketResult};
pub use launcher::{LaunchDefaults, LaunchRequest, LaunchedToken, Launcher, TokenMetadata};
pub use ledger::{CurrencyBank, InMemoryBank, InMemoryLedger, LedgerError, TokenLedger};
pub use market::{Market, MarketEvent, MarketParams, MigrationConfig, MigrationRecord, TradeReceipt};
pub use venue::{LiquidityReceipt, LiquidityVenue, SimulatedVenue, VenueError};
