//! The Simulator
//!
//! Responsible for:
//! - Funding a set of deterministic trader accounts
//! - Driving seeded random buys/sells concurrently against one market
//! - Reporting trades, rejections, fees and when migration happened

pub mod market_simulator;

pub use market_simulator::{
    fund_traders, trader_addresses, MarketSimulator, SimulationConfig, SimulationReport,
    TradeAction,
};
