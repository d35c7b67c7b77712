//! Cipher Journal
//!
//! Personal trading journal: fixed-fractional position sizing, a trade
//! ledger persisted to CSV or SQLite, and equity analytics.

mod api;
mod metrics;
mod models;
mod store;
mod trading;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::api::PriceClient;
use crate::metrics::StatsCalculator;
use crate::models::Direction;
use crate::store::{CsvStore, SqliteStore, TradeStore};
use crate::trading::{compute, JournalConfig, Ledger, REWARD_RISK_MULTIPLE};

/// Trading journal CLI.
#[derive(Parser)]
#[command(name = "cipher")]
#[command(about = "Personal trading journal with fixed-fractional risk sizing", long_about = None)]
struct Cli {
    /// Store location: a CSV file path, or a sqlite: URL
    #[arg(short, long, env = "CIPHER_STORE", default_value = "./journal.csv")]
    store: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pre-trade sizing analysis without registering anything
    Size {
        /// Trade direction (long or short)
        direction: String,

        /// Planned entry price
        entry: Decimal,

        /// Stop-loss price
        stop: Decimal,

        /// Risk budget in dollars
        #[arg(short, long)]
        risk: Option<Decimal>,

        /// Account capital in dollars
        #[arg(short, long)]
        capital: Option<Decimal>,
    },

    /// Register a new trade in the ledger
    Add {
        /// Instrument ticker (e.g. BTC, ETH/USDT)
        symbol: String,

        /// Trade direction (long or short)
        direction: String,

        /// Entry price
        entry: Decimal,

        /// Stop-loss price
        stop: Decimal,

        /// Risk budget in dollars
        #[arg(short, long)]
        risk: Option<Decimal>,

        /// Account capital in dollars
        #[arg(short, long)]
        capital: Option<Decimal>,

        /// Also fetch the live price for reference
        #[arg(long)]
        quote: bool,
    },

    /// Print the ledger
    List,

    /// Close a trade and recompute its P&L
    Close {
        /// Row index from `list`
        row: usize,

        /// Exit price
        #[arg(short, long)]
        exit: Decimal,
    },

    /// Cancel an open trade
    Cancel {
        /// Row index from `list`
        row: usize,
    },

    /// Recompute P&L across the ledger and write it back
    Sync,

    /// Show ledger analytics
    Stats {
        /// Emit the stats as JSON instead of the text panel
        #[arg(long)]
        json: bool,
    },

    /// Look up a live price
    Price {
        /// Instrument ticker
        symbol: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = JournalConfig::default();

    match cli.command {
        Commands::Size {
            direction,
            entry,
            stop,
            risk,
            capital,
        } => {
            let direction = parse_direction(&direction)?;
            let risk = risk.unwrap_or(config.default_risk);
            let capital = capital.unwrap_or(config.default_capital);

            match compute(entry, stop, risk, capital, direction) {
                Some(sizing) => print_analysis(&sizing),
                None => print_insufficient_input(),
            }
        }

        Commands::Add {
            symbol,
            direction,
            entry,
            stop,
            risk,
            capital,
            quote,
        } => {
            let direction = parse_direction(&direction)?;
            let risk = risk.unwrap_or(config.default_risk);
            let capital = capital.unwrap_or(config.default_capital);

            let Some(sizing) = compute(entry, stop, risk, capital, direction) else {
                print_insufficient_input();
                return Ok(());
            };

            print_analysis(&sizing);

            if quote {
                let client = PriceClient::new()?;
                let live = client.lookup(&symbol).await;
                if live.price > Decimal::ZERO {
                    println!("Live price ({}): ${}", live.resolved_symbol, live.price);
                } else {
                    println!("Live price unavailable for {}", live.resolved_symbol);
                }
            }

            let ledger = open_ledger(&cli.store).await?;
            let (row, record) = ledger.append(&symbol, direction, &sizing).await?;
            info!(row = row, "trade saved");

            println!(
                "\nRegistered {} {} at row {} (target ${}, size ${})",
                record.direction.as_str(),
                record.symbol,
                row,
                record.target_price,
                record.position_size
            );
        }

        Commands::List => {
            let ledger = open_ledger(&cli.store).await?;
            let records = ledger.records().await?;

            if records.is_empty() {
                println!("Ledger is empty. Use 'cipher add' to register a trade.");
                return Ok(());
            }

            println!(
                "\n{:>3} {:<19} {:<10} {:<5} {:>10} {:>10} {:>10} {:>10} {:>5} {:>10} {:>10} {:<9}",
                "ROW",
                "Data",
                "Symbol",
                "Dir",
                "Entrada",
                "Stop",
                "Target",
                "Size($)",
                "Lev",
                "Saída",
                "PnL($)",
                "Status"
            );
            println!("{}", "-".repeat(122));

            for (row, r) in records.iter().enumerate() {
                println!(
                    "{:>3} {:<19} {:<10} {:<5} {:>10} {:>10} {:>10} {:>10} {:>5} {:>10} {:>10} {:<9}",
                    row,
                    r.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    truncate(&r.symbol, 10),
                    r.direction.as_str(),
                    r.entry_price.to_string(),
                    r.stop_price.to_string(),
                    r.target_price.to_string(),
                    r.position_size.to_string(),
                    r.leverage.to_string(),
                    r.exit_price.to_string(),
                    r.pnl.to_string(),
                    r.status.as_str()
                );
            }
        }

        Commands::Close { row, exit } => {
            let ledger = open_ledger(&cli.store).await?;
            let record = ledger.close(row, exit).await?;

            println!(
                "Closed {} {} at ${} -> P&L ${}",
                record.direction.as_str(),
                record.symbol,
                record.exit_price,
                record.pnl
            );
        }

        Commands::Cancel { row } => {
            let ledger = open_ledger(&cli.store).await?;
            let record = ledger.cancel(row).await?;
            println!("Cancelled {} at row {}", record.symbol, row);
        }

        Commands::Sync => {
            let ledger = open_ledger(&cli.store).await?;
            let changed = ledger.sync().await?;
            println!("Ledger synchronized, {} record(s) recomputed.", changed);
        }

        Commands::Stats { json } => {
            let ledger = open_ledger(&cli.store).await?;
            let records = ledger.records().await?;
            let stats = StatsCalculator::calculate(&records);

            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
                return Ok(());
            }

            if stats.closed_trades == 0 {
                println!("Close trades to see statistics.");
                return Ok(());
            }

            println!("\n{}", stats);

            println!("\n--- Equity Curve ---");
            for point in &stats.equity_curve {
                println!(
                    "  {} {:<10} {:>12}",
                    point.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    truncate(&point.symbol, 10),
                    format!("${:.2}", point.equity)
                );
            }

            println!("\n--- Exposure by Symbol ---");
            for (symbol, size) in &stats.exposure_by_symbol {
                println!("  {:<10} {:>12}", truncate(symbol, 10), format!("${:.2}", size));
            }
        }

        Commands::Price { symbol } => {
            let client = PriceClient::new()?;
            let quote = client.lookup(&symbol).await;

            if quote.price > Decimal::ZERO {
                println!("{}: ${}", quote.resolved_symbol, quote.price);
            } else {
                println!(
                    "No live price for {} (enter a price manually).",
                    quote.resolved_symbol
                );
            }
        }
    }

    Ok(())
}

/// Pick the store backend from the `--store` flag.
async fn open_ledger(store: &str) -> Result<Ledger> {
    let backend: Box<dyn TradeStore> = if store.starts_with("sqlite:") {
        Box::new(SqliteStore::new(store).await?)
    } else {
        Box::new(CsvStore::new(store))
    };

    Ok(Ledger::new(backend))
}

fn parse_direction(s: &str) -> Result<Direction> {
    Direction::parse(s).ok_or_else(|| anyhow!("direction must be 'long' or 'short', got {s:?}"))
}

fn print_analysis(sizing: &crate::trading::SizingResult) {
    println!("\n=== Pre-Trade Analysis ===");
    println!("Leverage:         {:.1}x", sizing.leverage);
    println!("Position Size:    ${:.2}", sizing.position_size);
    println!(
        "Potential Profit: ${:.2} ({}R)",
        sizing.potential_profit, REWARD_RISK_MULTIPLE
    );
    println!("Target:           ${:.2}", sizing.target_price);
}

fn print_insufficient_input() {
    println!(
        "No analysis yet: entry and stop must be positive and different, risk and capital positive."
    );
}

/// Truncate a string with ellipsis if too long. Counts chars, not bytes, so
/// accented tickers never split mid-character.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_is_char_boundary_safe() {
        assert_eq!(truncate("BTC", 10), "BTC");
        assert_eq!(truncate("LONGTICKER123", 10), "LONGTIC...");
        // Multibyte symbol longer than the column width must not panic
        assert_eq!(truncate("AÇÚCAR/ÍNDICE", 10), "AÇÚCAR/...");
        assert_eq!(truncate("ÀÇÉÍÓÚÃÕÂÊ", 10), "ÀÇÉÍÓÚÃÕÂÊ");
    }

    #[test]
    fn direction_flag_parsing() {
        assert!(parse_direction("long").is_ok());
        assert!(parse_direction("SHORT").is_ok());
        assert!(parse_direction("both").is_err());
    }
}
