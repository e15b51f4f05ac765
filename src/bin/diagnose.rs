//! Diagnostic tool - Check launch configuration
//!
//! Run with: cargo run --bin diagnose

use std::env;

use launchpad::config::LaunchConfig;

fn main() {
    println!("🔍 LAUNCHPAD DIAGNOSTIC CHECK\n");

    // Load .env
    dotenvy::dotenv().ok();

    println!("═══════════════════════════════════════════════════");
    println!("                  CONFIGURATION                     ");
    println!("═══════════════════════════════════════════════════\n");

    let defaults = LaunchConfig::default();
    let buy_fee = defaults.buy_fee_bps.to_string();
    let sell_fee = defaults.sell_fee_bps.to_string();

    let checks = [
        ("TOKEN_NAME", defaults.token_name.as_str(), "Token name"),
        ("TOKEN_SYMBOL", defaults.token_symbol.as_str(), "Token symbol"),
        ("INITIAL_PRICE", defaults.initial_price.as_str(), "Price floor (currency per token)"),
        ("PRICE_SLOPE", defaults.price_slope.as_str(), "Price added per token of headroom"),
        ("MAX_SUPPLY", defaults.max_supply.as_str(), "Hard supply cap (whole tokens)"),
        ("BUY_FEE_BPS", buy_fee.as_str(), "Buy fee (100 = 1%)"),
        ("SELL_FEE_BPS", sell_fee.as_str(), "Sell fee (100 = 1%)"),
        (
            "LP_MIGRATION_MARKET_CAP",
            defaults.lp_migration_market_cap.as_str(),
            "Market cap that triggers migration",
        ),
        (
            "LIQUIDITY_TOKEN_RESERVE",
            defaults.liquidity_token_reserve.as_str(),
            "Tokens minted to the venue",
        ),
        ("TRADE_LOG", "true", "Log trades?"),
        ("TRADE_LOG_PATH", defaults.trade_log_path.as_str(), "Where trades are logged"),
    ];

    for (key, default, desc) in checks {
        let value = env::var(key).unwrap_or_else(|_| default.to_string());
        let is_default = env::var(key).is_err();
        let marker = if is_default { "(default)" } else { "(from .env)" };
        println!("  {}: {} {}", key, value, marker);
        println!("    └─ {}\n", desc);
    }

    println!("═══════════════════════════════════════════════════");
    println!("                    IDENTITIES                      ");
    println!("═══════════════════════════════════════════════════\n");

    let deployer = env::var("DEPLOYER_ADDRESS").is_ok();
    let owner = env::var("OWNER_ADDRESS").is_ok();
    let fee_recipient = env::var("FEE_RECIPIENT_ADDRESS").is_ok();
    let venue = env::var("VENUE_ADDRESS").is_ok();

    println!(
        "  DEPLOYER_ADDRESS:      {}",
        if deployer { "✅ Set" } else { "⚪ Default dev account" }
    );
    println!("  OWNER_ADDRESS:         {}", if owner { "✅ Set" } else { "⚪ Same as deployer" });
    println!("  FEE_RECIPIENT_ADDRESS: {}", if fee_recipient { "✅ Set" } else { "❌ Not set" });
    println!("  VENUE_ADDRESS:         {}", if venue { "✅ Set" } else { "⚪ Placeholder venue" });

    println!("\n═══════════════════════════════════════════════════");
    println!("                     STATUS                         ");
    println!("═══════════════════════════════════════════════════\n");

    let config = match LaunchConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            println!("  ❌ Could not load configuration: {}", e);
            return;
        }
    };

    match config.validate() {
        Ok(()) => println!("  ✅ Configuration is valid"),
        Err(e) => println!("  ❌ Invalid configuration: {:#}", e),
    }

    if !fee_recipient {
        println!("\n  ⚠️  WARNING: no fee recipient configured!");
        println!("     `launch` will refuse to run until FEE_RECIPIENT_ADDRESS is set.");
        println!("     `simulate` routes fees to a placeholder account instead.");
    }

    if config.buy_fee_bps == 0 && config.sell_fee_bps == 0 {
        println!("\n  ⚠️  Zero fees: round trips are free apart from curve movement.");
    }

    println!("\n✅ Diagnostic complete!\n");
}
