//! Launchpad - Bonding-Curve Token Launcher
//!
//! Run with: cargo run -- <command>
//!
//! Commands:
//! - config:   show (or save) the resolved configuration
//! - quote:    price, market cap and trade quotes at a given supply
//! - launch:   launch a token market and print its address
//! - simulate: concurrent random traders until migration or the last round

use alloy_primitives::utils::{format_ether, parse_ether};
use alloy_primitives::Address;
use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use launchpad::config::{LaunchConfig, TradeLog};
use launchpad::curve::CurvePricer;
use launchpad::ledger::InMemoryBank;
use launchpad::market::{MigrationController, TradeEngine};
use launchpad::simulator::{
    fund_traders, trader_addresses, MarketSimulator, SimulationConfig, SimulationReport,
};
use launchpad::LaunchRequest;

/// Fee sink used by `simulate` when no fee recipient is configured
const SIMULATION_FEE_SINK: Address = Address::repeat_byte(0xfe);

#[derive(Parser)]
#[command(name = "launchpad", version, about = "Bonding-curve token launcher")]
struct Cli {
    /// Load configuration from a TOML file instead of the environment
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the resolved configuration
    Config {
        /// Also write it to this TOML file
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Quote the curve at a hypothetical supply
    Quote {
        /// Circulating supply in whole tokens
        #[arg(long, default_value = "0")]
        supply: String,
        /// Currency to spend
        #[arg(long)]
        buy: Option<String>,
        /// Tokens to sell
        #[arg(long)]
        sell: Option<String>,
    },
    /// Launch a token market
    Launch {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Run random traders against a fresh market
    Simulate {
        #[arg(long, default_value_t = 20)]
        rounds: usize,
        #[arg(long, default_value_t = 8)]
        traders: usize,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Currency given to each trader
        #[arg(long, default_value = "1")]
        funds: String,
    },
}

fn print_banner() {
    println!();
    println!(
        "{}",
        style("═══════════════════════════════════════════════════════════════").cyan()
    );
    println!(
        "{}",
        style(" 🚀 LAUNCHPAD - Bonding-Curve Token Markets").cyan().bold()
    );
    println!(
        "{}",
        style("    Linear Curve | Fees | One-Shot Liquidity Migration").cyan()
    );
    println!(
        "{}",
        style("═══════════════════════════════════════════════════════════════").cyan()
    );
    println!();
}

fn load_config(path: Option<&PathBuf>) -> Result<LaunchConfig> {
    let config = match path {
        Some(path) => LaunchConfig::from_file(path)?,
        None => LaunchConfig::from_env()?,
    };

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        error!("Please check your .env file");
        return Err(e);
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("launchpad=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    print_banner();

    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Config { save } => {
            config.print_summary();
            if let Some(path) = save {
                config.save_to_file(&path)?;
                println!();
                println!("{} Saved to {}", style("✓").green(), path.display());
            }
        }
        Commands::Quote { supply, buy, sell } => run_quote(&config, &supply, buy, sell)?,
        Commands::Launch { name, symbol } => run_launch(&config, name, symbol)?,
        Commands::Simulate {
            rounds,
            traders,
            seed,
            funds,
        } => run_simulate(&config, rounds, traders, seed, &funds).await?,
    }

    Ok(())
}

fn run_quote(
    config: &LaunchConfig,
    supply: &str,
    buy: Option<String>,
    sell: Option<String>,
) -> Result<()> {
    let defaults = config.launch_defaults()?;
    let engine = TradeEngine::new(
        CurvePricer::new(defaults.curve),
        defaults.fees,
        MigrationController::new(defaults.migration),
        Address::ZERO,
    );
    let pricer = engine.pricer();
    let supply = parse_ether(supply.trim())?;

    println!("{}", style("═══ CURVE ═══").blue().bold());
    println!();
    println!("  Supply:      {}", format_ether(supply));
    println!("  Price:       {}", format_ether(pricer.price(supply)?));
    println!("  Market cap:  {}", format_ether(pricer.market_cap(supply)?));
    println!(
        "  Migrates:    {}",
        match engine.migration().evaluate(pricer, supply, false)? {
            Some(_) => style("yes").yellow().to_string(),
            None => style("no").green().to_string(),
        }
    );

    if let Some(amount) = buy {
        let quote = engine.quote_buy(supply, parse_ether(amount.trim())?)?;
        println!();
        println!("{}", style("═══ BUY ═══").green().bold());
        println!("  Spend:       {}", format_ether(quote.currency_amount));
        println!("  Receive:     {} tokens", format_ether(quote.token_amount));
        println!("  Fee:         {}", format_ether(quote.fee));
        println!("  Treasury:    +{}", format_ether(quote.net));
    }

    if let Some(amount) = sell {
        let quote = engine.quote_sell(supply, parse_ether(amount.trim())?)?;
        println!();
        println!("{}", style("═══ SELL ═══").red().bold());
        println!("  Sell:        {} tokens", format_ether(quote.token_amount));
        println!("  Gross:       {}", format_ether(quote.gross));
        println!("  Fee:         {}", format_ether(quote.fee));
        println!("  Receive:     {}", format_ether(quote.net));
    }

    Ok(())
}

fn run_launch(config: &LaunchConfig, name: Option<String>, symbol: Option<String>) -> Result<()> {
    let mut launcher = config.launcher()?;
    let request = LaunchRequest::new(
        name.unwrap_or_else(|| config.token_name.clone()),
        symbol.unwrap_or_else(|| config.token_symbol.clone()),
    );

    let token = launcher.launch(request, InMemoryBank::new())?;
    let market = &token.market;

    println!(
        "{} Launched {} ({})",
        style("✓").green(),
        style(&token.metadata.name).cyan().bold(),
        token.metadata.symbol
    );
    println!("  Address:       {}", token.metadata.address);
    println!("  Owner:         {}", token.metadata.owner);
    println!("  Fee recipient: {}", market.fee_recipient()?);
    println!("  Start price:   {}", format_ether(market.price()?));
    println!(
        "  Migrates at:   {} market cap",
        format_ether(market.engine().migration().config().cap_threshold)
    );

    Ok(())
}

async fn run_simulate(
    config: &LaunchConfig,
    rounds: usize,
    traders: usize,
    seed: u64,
    funds: &str,
) -> Result<()> {
    if traders == 0 {
        return Err(eyre!("Need at least one trader"));
    }

    let mut launcher = config.launcher()?;
    if launcher.fee_recipient().is_none() {
        warn!("FEE_RECIPIENT_ADDRESS not set, routing fees to {}", SIMULATION_FEE_SINK);
        launcher.set_fee_recipient(SIMULATION_FEE_SINK);
    }

    let accounts = trader_addresses(traders);
    let mut bank = InMemoryBank::new();
    fund_traders(&mut bank, &accounts, parse_ether(funds.trim())?)?;

    let token = launcher.launch(config.launch_request(), bank)?;
    let token_address = token.metadata.address;

    println!("{}", style("═══ SIMULATION ═══").green().bold());
    println!();
    println!(
        "{} {} traders x {} rounds against {} ({})",
        style("▶").green(),
        traders,
        rounds,
        token.metadata.symbol,
        token_address
    );
    println!();

    let sim_config = SimulationConfig {
        rounds,
        seed,
        ..SimulationConfig::default()
    };
    let mut sim = MarketSimulator::new(token.market, accounts, sim_config);

    let pb = ProgressBar::new(rounds as u64);
    pb.set_style(ProgressStyle::with_template(
        "{spinner:.green} [{bar:40.cyan/blue}] round {pos}/{len} {msg}",
    )?);

    let start = Instant::now();
    while sim.step().await? {
        pb.set_position(sim.round() as u64);
        pb.set_message(format!("cap {}", format_ether(sim.market().market_cap()?)));
    }
    pb.finish_and_clear();

    let report = sim.finish()?;

    if config.trade_log {
        for receipt in &report.receipts {
            TradeLog::from_receipt(token_address, receipt).append_to_file(&config.trade_log_path)?;
        }
    }

    print_report(&report, start.elapsed().as_secs_f64());
    if config.trade_log {
        println!(
            "{} {} trades logged to: {}",
            style("📝").cyan(),
            report.receipts.len(),
            config.trade_log_path
        );
    }

    Ok(())
}

fn print_report(report: &SimulationReport, secs: f64) {
    println!("{} Simulation complete in {:.2}s", style("✓").green(), secs);
    println!();
    println!("Summary:");
    println!("  • Rounds run:    {}", report.rounds_run);
    println!(
        "  • Trades:        {} ({} buys, {} sells)",
        report.trades(),
        report.buys,
        report.sells
    );
    println!("  • Rejected:      {}", report.rejected());
    for (kind, count) in &report.rejections {
        println!("      {}: {}", kind, count);
    }
    println!("  • Volume:        {}", format_ether(report.volume));
    println!("  • Fees routed:   {}", format_ether(report.fees));
    println!("  • Final supply:  {}", format_ether(report.final_supply));
    println!("  • Final price:   {}", format_ether(report.final_price));
    println!("  • Market cap:    {}", format_ether(report.final_market_cap));
    println!();

    match (&report.migration, report.migration_round) {
        (Some(record), round) => {
            let round = round.map(|r| r.to_string()).unwrap_or_else(|| "?".to_string());
            let headline = format!(
                "🚀 Migrated in round {} at cap {}",
                round,
                format_ether(record.market_cap)
            );
            println!("{}", style(headline).green().bold());
            println!("   Currency handed off: {}", format_ether(record.currency_amount));
            println!("   Tokens handed off:   {}", format_ether(record.token_amount));
            match (&record.receipt, &record.failure) {
                (Some(receipt), _) => {
                    println!("   LP issued:           {}", format_ether(receipt.liquidity))
                }
                (None, Some(failure)) => {
                    println!("   {} Venue failed: {}", style("⚠️").yellow(), failure)
                }
                (None, None) => {}
            }
        }
        (None, _) => {
            println!(
                "{}",
                style(format!(
                    "💡 Not migrated yet (market cap {}). Try more rounds or traders.",
                    format_ether(report.final_market_cap)
                ))
                .cyan()
            );
        }
    }

    if report.trades() == 0 && report.rounds_run > 0 {
        println!("{}", style("No trade went through; check trader funds.").yellow());
    }
}
