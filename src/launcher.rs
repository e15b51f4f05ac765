//! Token Launcher
//!
//! Stands up one market per launch request from shared defaults. Each token
//! address is derived CREATE-style from the deployer and a launch nonce, and
//! doubles as the market's treasury account.

use alloy_primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::curve::{CurveConfig, FeeConfig, UNIT};
use crate::error::LaunchError;
use crate::ledger::{InMemoryBank, InMemoryLedger};
use crate::market::{Market, MarketParams, MigrationConfig};
use crate::venue::SimulatedVenue;

/// Default market cap that triggers migration: 0.01 currency
pub const DEFAULT_MIGRATION_CAP: U256 = U256::from_limbs([10_000_000_000_000_000, 0, 0, 0]);

/// Placeholder venue for launches that don't configure one
pub const DEFAULT_VENUE: Address = Address::repeat_byte(0x11);

/// Market backed by the in-memory collaborators
pub type LaunchedMarket = Market<InMemoryLedger, InMemoryBank, SimulatedVenue>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchRequest {
    pub name: String,
    pub symbol: String,
}

impl LaunchRequest {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub address: Address,
    pub owner: Address,
    /// Deployer nonce the address was derived from
    pub nonce: u64,
    pub launched_at: DateTime<Utc>,
}

/// Curve, fee and migration settings applied to every launch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchDefaults {
    pub curve: CurveConfig,
    pub fees: FeeConfig,
    pub migration: MigrationConfig,
}

impl Default for LaunchDefaults {
    /// 1B max supply, price from 2 gwei down to 1 gwei, 1% fees, 0.01 cap
    fn default() -> Self {
        Self {
            curve: CurveConfig {
                initial_price: U256::from(1_000_000_000u64),
                price_slope: U256::from(1),
                max_supply: U256::from(1_000_000_000u64) * UNIT,
            },
            fees: FeeConfig::default(),
            migration: MigrationConfig {
                cap_threshold: DEFAULT_MIGRATION_CAP,
                venue: DEFAULT_VENUE,
                liquidity_token_reserve: U256::ZERO,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct LaunchedToken {
    pub metadata: TokenMetadata,
    pub market: Arc<LaunchedMarket>,
}

#[derive(Debug, Clone)]
pub struct Launcher {
    deployer: Address,
    /// Owner of every launched market
    owner: Address,
    nonce: u64,
    defaults: LaunchDefaults,
    fee_recipient: Option<Address>,
    launched: Vec<TokenMetadata>,
}

impl Launcher {
    pub fn new(deployer: Address, defaults: LaunchDefaults) -> Self {
        Self {
            deployer,
            owner: deployer,
            nonce: 0,
            defaults,
            fee_recipient: None,
            launched: Vec::new(),
        }
    }

    pub fn with_fee_recipient(mut self, fee_recipient: Address) -> Self {
        self.fee_recipient = Some(fee_recipient);
        self
    }

    pub fn set_owner(&mut self, owner: Address) {
        self.owner = owner;
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn set_fee_recipient(&mut self, fee_recipient: Address) {
        self.fee_recipient = Some(fee_recipient);
    }

    pub fn fee_recipient(&self) -> Option<Address> {
        self.fee_recipient
    }

    pub fn deployer(&self) -> Address {
        self.deployer
    }

    pub fn defaults(&self) -> &LaunchDefaults {
        &self.defaults
    }

    /// Address the next launch will get
    pub fn next_address(&self) -> Address {
        self.deployer.create(self.nonce)
    }

    /// Every token launched so far, oldest first
    pub fn launched(&self) -> &[TokenMetadata] {
        &self.launched
    }

    /// Launch a market whose currency lives in `bank`
    ///
    /// The nonce only advances when the market is actually created.
    pub fn launch(
        &mut self,
        request: LaunchRequest,
        bank: InMemoryBank,
    ) -> Result<LaunchedToken, LaunchError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(LaunchError::MissingField("name"));
        }
        let symbol = request.symbol.trim();
        if symbol.is_empty() {
            return Err(LaunchError::MissingField("symbol"));
        }
        let fee_recipient = self.fee_recipient.ok_or(LaunchError::FeeRecipientNotSet)?;

        let address = self.next_address();
        let params = MarketParams {
            curve: self.defaults.curve,
            fees: self.defaults.fees,
            migration: self.defaults.migration,
            owner: self.owner,
            fee_recipient,
            treasury: address,
        };

        let market = Market::new(
            params,
            InMemoryLedger::new(),
            bank,
            SimulatedVenue::new(self.defaults.migration.venue),
        )?;

        let metadata = TokenMetadata {
            name: name.to_string(),
            symbol: symbol.to_string(),
            address,
            owner: self.owner,
            nonce: self.nonce,
            launched_at: Utc::now(),
        };

        info!("🚀 Launched {} ({}) at {}", metadata.name, metadata.symbol, address);

        self.nonce += 1;
        self.launched.push(metadata.clone());

        Ok(LaunchedToken {
            metadata,
            market: Arc::new(market),
        })
    }
}
