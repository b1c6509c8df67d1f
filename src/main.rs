use analytics::{AnalyticsEngine, PerformanceReport};
use anyhow::Context;
use api_client::YahooClient;
use chrono::{Duration, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use configuration::{BacktestOverrides, Config, DataConfig, SimulationConfig};
use core_types::{AllocationMatrix, PriceProvider, PriceSeries};
use portfolio_backtester::{BacktestHistory, PortfolioSimulator, StaticPriceProvider};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};

mod export;

/// The main entry point for the rebal backtester.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let cli = Cli::parse();

    let mut config = configuration::load_config(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;
    // Held until exit so the file writer flushes.
    let _guard = configuration::init_tracing(&config.logging)?;

    // Execute the appropriate command
    match cli.command {
        Commands::Run(args) => {
            args.overrides.apply(&mut config.backtest);
            handle_run(args, config).await
        }
        Commands::Fetch(args) => handle_fetch(args, config).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Backtests a date-indexed allocation matrix against daily prices.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration. Missing files fall back to defaults.
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate an allocation matrix and write the resulting histories.
    Run(RunArgs),
    /// Download daily prices and save them as a price CSV.
    Fetch(FetchArgs),
}

#[derive(Parser)]
struct RunArgs {
    /// CSV of target weights: a date column followed by one column per symbol.
    #[arg(long)]
    allocations: PathBuf,

    /// Read prices from this CSV instead of downloading them.
    #[arg(long)]
    prices: Option<PathBuf>,

    /// Directory for values.csv, positions.csv, transactions.csv, returns.csv and report.json.
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    #[command(flatten)]
    overrides: BacktestOverrides,
}

#[derive(Parser)]
struct FetchArgs {
    /// Comma-separated symbols (e.g. "SPY,TLT").
    #[arg(long, value_delimiter = ',', required = true)]
    symbols: Vec<String>,

    /// The start date for data download (format: YYYY-MM-DD). Defaults to 52 weeks ago.
    #[arg(long)]
    from: Option<NaiveDate>,

    /// The end date for data download (format: YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Where to write the price CSV.
    #[arg(long, default_value = "prices.csv")]
    output: PathBuf,
}

// ==============================================================================
// Run Command Logic
// ==============================================================================

async fn handle_run(args: RunArgs, config: Config) -> anyhow::Result<()> {
    let simulation = SimulationConfig::try_from(&config.backtest).context("invalid [backtest] configuration")?;
    let allocation = AllocationMatrix::from_csv(&args.allocations)
        .with_context(|| format!("failed to load allocations from {}", args.allocations.display()))?;

    let provider: Box<dyn PriceProvider> = match &args.prices {
        Some(path) => {
            let prices = PriceSeries::from_csv(path)
                .with_context(|| format!("failed to load prices from {}", path.display()))?;
            Box::new(StaticPriceProvider::new(prices))
        }
        None => {
            let data = DataConfig::try_from(&config.data).context("invalid [data] configuration")?;
            Box::new(YahooClient::new(data)?)
        }
    };

    let simulator = PortfolioSimulator::new(simulation, allocation);
    let history = simulator.run(provider.as_ref()).await?;

    for path in publish(&args.output_dir, &history)? {
        tracing::info!("Wrote {}", path.display());
    }
    Ok(())
}

/// Writes the histories, then the performance report. A failed report is
/// logged and leaves the history files in place.
fn publish(output_dir: &Path, history: &BacktestHistory) -> anyhow::Result<Vec<PathBuf>> {
    let mut written = export::write_history(output_dir, history)?;

    match AnalyticsEngine::new().calculate(history.values.rows(), history.transactions.rows()) {
        Ok(report) => {
            print_report(&report);
            written.push(export::write_report(output_dir, &report)?);
        }
        Err(e) => tracing::error!(error = %e, "Performance report skipped"),
    }
    Ok(written)
}

fn print_report(report: &PerformanceReport) {
    let optional = |value: Option<Decimal>| value.map_or_else(|| "n/a".to_string(), |v| v.round_dp(4).to_string());
    let date = |value: Option<NaiveDate>| value.map_or_else(|| "n/a".to_string(), |d| d.to_string());

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![Cell::new("Metric"), Cell::new("Value")]);

    let rows = [
        ("Start", date(report.start_date)),
        ("End", date(report.end_date)),
        ("Valuation days", report.valuation_days.to_string()),
        ("Starting value", report.starting_value.round_dp(2).to_string()),
        ("Final value", report.final_value.round_dp(2).to_string()),
        ("Net profit", report.total_net_profit.round_dp(2).to_string()),
        ("Total return %", report.total_return_pct.round_dp(2).to_string()),
        ("Max drawdown", report.max_drawdown.round_dp(2).to_string()),
        ("Max drawdown %", report.max_drawdown_pct.round_dp(2).to_string()),
        ("Sharpe (daily)", optional(report.sharpe_ratio)),
        ("Sharpe (annualized)", optional(report.annualized_sharpe_ratio)),
        ("Calmar", optional(report.calmar_ratio)),
        ("Rebalances", report.rebalance_count.to_string()),
        ("Transactions", report.transaction_count.to_string()),
        ("Traded value", report.traded_value.round_dp(2).to_string()),
    ];
    for (metric, value) in rows {
        table.add_row(vec![Cell::new(metric), Cell::new(value)]);
    }

    println!("{table}");
}

// ==============================================================================
// Fetch Command Logic
// ==============================================================================

async fn handle_fetch(args: FetchArgs, config: Config) -> anyhow::Result<()> {
    let from = args.from.unwrap_or_else(|| Utc::now().date_naive() - Duration::weeks(52));
    if let Some(to) = args.to {
        anyhow::ensure!(to >= from, "--to {} precedes --from {}", to, from);
    }

    let data = DataConfig::try_from(&config.data).context("invalid [data] configuration")?;
    let client = YahooClient::new(data)?;
    let prices = client.fetch(&args.symbols, from, args.to).await?;

    export::write_prices(&args.output, &prices)?;
    tracing::info!(rows = prices.len(), "Saved prices to {}", args.output.display());
    Ok(())
}
