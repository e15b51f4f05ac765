//! Launch Configuration
//!
//! Everything needed to launch and trade a token, loaded from environment
//! variables (with `.env` support) or a TOML file. Amounts are kept as
//! decimal strings in whole currency/token units and converted to 18-decimal
//! fixed point on use.

use alloy_primitives::utils::{format_ether, parse_ether};
use alloy_primitives::{Address, U256};
use chrono::{DateTime, Utc};
use eyre::{eyre, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use crate::curve::{CurveConfig, FeeConfig, BPS_DENOMINATOR};
use crate::launcher::{LaunchDefaults, LaunchRequest, Launcher, DEFAULT_VENUE};
use crate::market::{MigrationConfig, TradeReceipt, TradeSide};

const DEFAULT_DEPLOYER: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

// ============================================
// MAIN CONFIGURATION
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchConfig {
    // ========== Token ==========
    pub token_name: String,
    pub token_symbol: String,

    // ========== Identities ==========
    /// Account allowed to change the fee recipient (defaults to deployer)
    pub owner_address: Option<String>,

    /// Account token addresses are derived from
    pub deployer_address: String,

    /// Receives buy and sell fees. Launches are refused until set.
    pub fee_recipient_address: Option<String>,

    /// Liquidity venue receiving the migration handoff
    pub venue_address: String,

    // ========== Curve ==========
    /// Price floor in currency per token
    pub initial_price: String,

    /// Price added per whole token of headroom
    pub price_slope: String,

    /// Hard supply cap in whole tokens
    pub max_supply: String,

    // ========== Fees ==========
    pub buy_fee_bps: u16,
    pub sell_fee_bps: u16,

    // ========== Migration ==========
    /// Market cap in currency that triggers migration
    pub lp_migration_market_cap: String,

    /// Tokens minted to the venue at migration
    pub liquidity_token_reserve: String,

    // ========== Logging ==========
    pub trade_log: bool,
    pub trade_log_path: String,
}

impl LaunchConfig {
    /// Load configuration from environment variables and .env file
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        Ok(Self {
            token_name: env::var("TOKEN_NAME").unwrap_or(defaults.token_name),
            token_symbol: env::var("TOKEN_SYMBOL").unwrap_or(defaults.token_symbol),

            owner_address: env::var("OWNER_ADDRESS").ok(),
            deployer_address: env::var("DEPLOYER_ADDRESS").unwrap_or(defaults.deployer_address),
            fee_recipient_address: env::var("FEE_RECIPIENT_ADDRESS").ok(),
            venue_address: env::var("VENUE_ADDRESS").unwrap_or(defaults.venue_address),

            initial_price: env::var("INITIAL_PRICE").unwrap_or(defaults.initial_price),
            price_slope: env::var("PRICE_SLOPE").unwrap_or(defaults.price_slope),
            max_supply: env::var("MAX_SUPPLY").unwrap_or(defaults.max_supply),

            buy_fee_bps: env::var("BUY_FEE_BPS")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .unwrap_or(defaults.buy_fee_bps),
            sell_fee_bps: env::var("SELL_FEE_BPS")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .unwrap_or(defaults.sell_fee_bps),

            lp_migration_market_cap: env::var("LP_MIGRATION_MARKET_CAP")
                .unwrap_or(defaults.lp_migration_market_cap),
            liquidity_token_reserve: env::var("LIQUIDITY_TOKEN_RESERVE")
                .unwrap_or(defaults.liquidity_token_reserve),

            trade_log: env::var("TRADE_LOG")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
            trade_log_path: env::var("TRADE_LOG_PATH").unwrap_or(defaults.trade_log_path),
        })
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    // ========== Typed accessors ==========

    pub fn deployer(&self) -> Result<Address> {
        parse_address("DEPLOYER_ADDRESS", &self.deployer_address)
    }

    pub fn owner(&self) -> Result<Address> {
        match &self.owner_address {
            Some(owner) => parse_address("OWNER_ADDRESS", owner),
            None => self.deployer(),
        }
    }

    pub fn fee_recipient(&self) -> Result<Option<Address>> {
        self.fee_recipient_address
            .as_deref()
            .map(|s| parse_address("FEE_RECIPIENT_ADDRESS", s))
            .transpose()
    }

    pub fn venue(&self) -> Result<Address> {
        parse_address("VENUE_ADDRESS", &self.venue_address)
    }

    pub fn curve(&self) -> Result<CurveConfig> {
        let curve = CurveConfig::new(
            parse_amount("INITIAL_PRICE", &self.initial_price)?,
            parse_amount("PRICE_SLOPE", &self.price_slope)?,
            parse_amount("MAX_SUPPLY", &self.max_supply)?,
        )?;
        Ok(curve)
    }

    pub fn fees(&self) -> Result<FeeConfig> {
        Ok(FeeConfig::new(self.buy_fee_bps, self.sell_fee_bps)?)
    }

    pub fn migration(&self) -> Result<MigrationConfig> {
        Ok(MigrationConfig {
            cap_threshold: parse_amount("LP_MIGRATION_MARKET_CAP", &self.lp_migration_market_cap)?,
            venue: self.venue()?,
            liquidity_token_reserve: parse_amount(
                "LIQUIDITY_TOKEN_RESERVE",
                &self.liquidity_token_reserve,
            )?,
        })
    }

    pub fn launch_defaults(&self) -> Result<LaunchDefaults> {
        Ok(LaunchDefaults {
            curve: self.curve()?,
            fees: self.fees()?,
            migration: self.migration()?,
        })
    }

    pub fn launch_request(&self) -> LaunchRequest {
        LaunchRequest::new(&self.token_name, &self.token_symbol)
    }

    /// Launcher for the configured deployer, fee recipient and defaults
    pub fn launcher(&self) -> Result<Launcher> {
        let mut launcher = Launcher::new(self.deployer()?, self.launch_defaults()?);
        launcher.set_owner(self.owner()?);
        if let Some(fee_recipient) = self.fee_recipient()? {
            launcher.set_fee_recipient(fee_recipient);
        }
        Ok(launcher)
    }

    /// Validate configuration before launching
    pub fn validate(&self) -> Result<()> {
        if self.token_name.trim().is_empty() {
            return Err(eyre!("TOKEN_NAME must not be empty"));
        }
        if self.token_symbol.trim().is_empty() {
            return Err(eyre!("TOKEN_SYMBOL must not be empty"));
        }
        if u64::from(self.buy_fee_bps) > BPS_DENOMINATOR
            || u64::from(self.sell_fee_bps) > BPS_DENOMINATOR
        {
            return Err(eyre!(
                "Fees must be at most {} bps (buy {}, sell {})",
                BPS_DENOMINATOR,
                self.buy_fee_bps,
                self.sell_fee_bps
            ));
        }

        self.owner()?;
        self.fee_recipient()?;
        self.launch_defaults()
            .wrap_err("Invalid curve, fee or migration settings")?;

        Ok(())
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        let owner = self
            .owner_address
            .clone()
            .unwrap_or_else(|| "(deployer)".to_string());
        let fee_recipient = self
            .fee_recipient_address
            .clone()
            .unwrap_or_else(|| "✗ Not Set".to_string());

        println!("╔════════════════════════════════════════════════════════════════╗");
        println!("║                 LAUNCHPAD - CONFIGURATION                      ║");
        println!("╠════════════════════════════════════════════════════════════════╣");
        let token = format!("{} ({})", self.token_name, self.token_symbol);
        println!("║ Token:             {:<44} ║", token);
        println!("╠════════════════════════════════════════════════════════════════╣");
        println!("║ IDENTITIES                                                     ║");
        println!("║ • Deployer:        {:<44} ║", self.deployer_address);
        println!("║ • Owner:           {:<44} ║", owner);
        println!("║ • Fee Recipient:   {:<44} ║", fee_recipient);
        println!("║ • Venue:           {:<44} ║", self.venue_address);
        println!("╠════════════════════════════════════════════════════════════════╣");
        println!("║ CURVE                                                          ║");
        println!("║ • Initial Price:   {:<44} ║", self.initial_price);
        println!("║ • Price Slope:     {:<44} ║", self.price_slope);
        println!("║ • Max Supply:      {:<44} ║", self.max_supply);
        println!("╠════════════════════════════════════════════════════════════════╣");
        println!("║ FEES                                                           ║");
        println!("║ • Buy:             {:<44} ║", format!("{} bps", self.buy_fee_bps));
        println!("║ • Sell:            {:<44} ║", format!("{} bps", self.sell_fee_bps));
        println!("╠════════════════════════════════════════════════════════════════╣");
        println!("║ MIGRATION                                                      ║");
        println!("║ • Market Cap:      {:<44} ║", self.lp_migration_market_cap);
        println!("║ • Token Reserve:   {:<44} ║", self.liquidity_token_reserve);
        println!("╠════════════════════════════════════════════════════════════════╣");
        let trade_log = if self.trade_log {
            self.trade_log_path.as_str()
        } else {
            "✗ Disabled"
        };
        println!("║ • Trade Log:       {:<44} ║", trade_log);
        println!("╚════════════════════════════════════════════════════════════════╝");
    }
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            token_name: "Launchpad Token".to_string(),
            token_symbol: "PAD".to_string(),
            owner_address: None,
            deployer_address: DEFAULT_DEPLOYER.to_string(),
            fee_recipient_address: None,
            venue_address: DEFAULT_VENUE.to_string(),
            initial_price: "0.000000001".to_string(),
            price_slope: "0.000000000000000001".to_string(),
            max_supply: "1000000000".to_string(),
            buy_fee_bps: 100,
            sell_fee_bps: 100,
            lp_migration_market_cap: "0.01".to_string(),
            liquidity_token_reserve: "0".to_string(),
            trade_log: true,
            trade_log_path: "./logs/trades.jsonl".to_string(),
        }
    }
}

fn parse_address(key: &str, value: &str) -> Result<Address> {
    Address::from_str(value.trim()).map_err(|e| eyre!("Invalid {} '{}': {}", key, value, e))
}

/// Decimal whole units to 18-decimal fixed point
fn parse_amount(key: &str, value: &str) -> Result<U256> {
    parse_ether(value.trim()).map_err(|e| eyre!("Invalid {} '{}': {}", key, value, e))
}

// ============================================
// TRADE LOGGER
// ============================================

/// One executed trade, as written to the JSONL trade log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeLog {
    pub timestamp: DateTime<Utc>,
    pub token: Address,
    pub side: TradeSide,
    pub trader: Address,
    /// Decimal strings, in whole units
    pub price: String,
    pub currency_amount: String,
    pub token_amount: String,
    pub fee: String,
    pub migrated: bool,
}

impl TradeLog {
    pub fn from_receipt(token: Address, receipt: &TradeReceipt) -> Self {
        Self {
            timestamp: Utc::now(),
            token,
            side: receipt.side,
            trader: receipt.trader,
            price: format_ether(receipt.price),
            currency_amount: format_ether(receipt.currency_amount),
            token_amount: format_ether(receipt.token_amount),
            fee: format_ether(receipt.fee),
            migrated: receipt.migration.is_some(),
        }
    }

    /// Append this log to a file
    pub fn append_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        // Create parent directories if needed
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;

        let json = serde_json::to_string(self)?;
        writeln!(file, "{}", json)?;

        Ok(())
    }
}

// ============================================
// TESTS
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::UNIT;
    use crate::launcher::DEFAULT_MIGRATION_CAP;

    #[test]
    fn test_default_config() {
        let config = LaunchConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.fee_recipient().unwrap().is_none());
        assert_eq!(config.owner().unwrap(), config.deployer().unwrap());
    }

    #[test]
    fn test_defaults_match_launcher_defaults() {
        let config = LaunchConfig::default();
        assert_eq!(config.launch_defaults().unwrap(), LaunchDefaults::default());
        assert_eq!(config.migration().unwrap().cap_threshold, DEFAULT_MIGRATION_CAP);
    }

    #[test]
    fn test_amounts_are_fixed_point() {
        let config = LaunchConfig {
            initial_price: "1".to_string(),
            price_slope: "0.001".to_string(),
            max_supply: "1000000".to_string(),
            ..LaunchConfig::default()
        };

        let curve = config.curve().unwrap();
        assert_eq!(curve.initial_price, UNIT);
        assert_eq!(curve.price_slope, UNIT / U256::from(1000));
        assert_eq!(curve.max_supply, U256::from(1_000_000u64) * UNIT);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let blank = LaunchConfig {
            token_symbol: " ".to_string(),
            ..LaunchConfig::default()
        };
        assert!(blank.validate().is_err());

        let fees = LaunchConfig {
            sell_fee_bps: 10_001,
            ..LaunchConfig::default()
        };
        assert!(fees.validate().is_err());

        let address = LaunchConfig {
            fee_recipient_address: Some("0x1234".to_string()),
            ..LaunchConfig::default()
        };
        assert!(address.validate().is_err());

        let amount = LaunchConfig {
            max_supply: "lots".to_string(),
            ..LaunchConfig::default()
        };
        assert!(amount.validate().is_err());
    }

    #[test]
    fn test_launcher_picks_up_fee_recipient() {
        let fee_recipient = Address::repeat_byte(0xfe);
        let config = LaunchConfig {
            fee_recipient_address: Some(fee_recipient.to_string()),
            ..LaunchConfig::default()
        };

        let launcher = config.launcher().unwrap();
        assert_eq!(launcher.fee_recipient(), Some(fee_recipient));
        assert_eq!(launcher.deployer(), config.deployer().unwrap());
    }

    #[test]
    fn test_toml_round_trip() {
        let path =
            std::env::temp_dir().join(format!("launchpad-config-{}.toml", std::process::id()));
        let config = LaunchConfig {
            fee_recipient_address: Some(Address::repeat_byte(0xfe).to_string()),
            ..LaunchConfig::default()
        };

        config.save_to_file(&path).unwrap();
        let loaded = LaunchConfig::from_file(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_trade_log_appends_lines() {
        let path = std::env::temp_dir()
            .join(format!("launchpad-log-{}", std::process::id()))
            .join("trades.jsonl");
        let receipt = TradeReceipt {
            side: TradeSide::Buy,
            trader: Address::repeat_byte(0xa1),
            price: UNIT,
            currency_amount: UNIT,
            token_amount: UNIT,
            fee: U256::ZERO,
            migration: None,
        };

        let entry = TradeLog::from_receipt(Address::repeat_byte(0x10), &receipt);
        assert_eq!(parse_ether(&entry.price).unwrap(), UNIT);
        entry.append_to_file(&path).unwrap();
        entry.append_to_file(&path).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        fs::remove_dir_all(path.parent().unwrap()).ok();

        assert_eq!(written.lines().count(), 2);
        let parsed: TradeLog = serde_json::from_str(written.lines().next().unwrap()).unwrap();
        assert_eq!(parsed.side, TradeSide::Buy);
    }
}
