//! Tranche Sale CLI - run a period-gated sale from a TOML config

mod app;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::debug;
use owo_colors::OwoColorize;
use std::path::PathBuf;

use app::{parse_amount, SaleApp};
use tranche_sale::{Amount, PeriodParams, SaleConfig, SaleEngine, Timestamp};

#[derive(Parser)]
#[command(name = "tranche-cli")]
#[command(about = "Period-gated primary sale with rebate pricing", version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE", default_value = "config/sale.toml")]
    config: PathBuf,

    /// Unix time to act at (defaults to the system clock)
    #[arg(long, global = true)]
    now: Option<Timestamp>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the sale from the config's periods and accounts
    Init {
        /// Discard an existing sale in the data directory
        #[arg(long)]
        force: bool,
    },

    /// Show sale progress
    Status,

    /// List all periods
    Periods,

    /// Price the next sale without buying
    Quote,

    /// Buy one unit
    Sell {
        /// Paying account
        buyer: String,
    },

    /// Append a period (admin)
    AddPeriod {
        /// Acting account
        #[arg(long, value_name = "ACCOUNT")]
        caller: String,

        #[arg(long)]
        end_time: Timestamp,

        #[arg(long)]
        max_supply: u64,

        #[arg(long, value_parser = parse_amount)]
        price: Amount,
    },

    /// Change the rebate curve (admin)
    SetRebate {
        /// Acting account
        #[arg(long, value_name = "ACCOUNT")]
        caller: String,

        /// Asymptotic rebate in percent
        #[arg(long)]
        max_rebate: u8,

        /// Sales needed to reach half the maximum rebate
        #[arg(long)]
        curve_steepness: u64,
    },

    /// Advance the current period past closed ones
    Refresh,

    /// Credit a demo ledger account
    Fund {
        account: String,

        #[arg(value_parser = parse_amount)]
        amount: Amount,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "❌ Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = SaleConfig::load_from_file(&cli.config)?;
    let now = cli.now.unwrap_or_else(system_now);
    debug!("Acting at {} with config {}", now, cli.config.display());

    match cli.command {
        Commands::Init { force } => {
            let app = SaleApp::init(&config, now, force)?;
            println!(
                "{} {} periods, data in {}",
                "✓ Sale initialized:".green().bold(),
                app.engine().periods().len(),
                app.data_dir().display()
            );
        }

        Commands::Status => {
            let app = SaleApp::open(&config)?;
            print_status(app.engine(), now);
        }

        Commands::Periods => {
            let app = SaleApp::open(&config)?;
            print_periods(app.engine(), now);
        }

        Commands::Quote => {
            let app = SaleApp::open(&config)?;
            let quote = app.engine().quote(now)?;
            println!("\n{}", "💵 Next Sale".cyan().bold());
            println!("═══════════════════════════════════");
            println!("{:<14}{}", "Period:".yellow().bold(), quote.period_index);
            println!("{:<14}{}", "Base price:".yellow().bold(), quote.quote.base_price);
            println!("{:<14}{}", "Discount:".yellow().bold(), quote.discount());
            println!("{:<14}{}", "Price:".yellow().bold(), quote.price().green());
            println!();
        }

        Commands::Sell { buyer } => {
            let mut app = SaleApp::open(&config)?;
            let sale = app.engine_mut().sell(&buyer, now)?;
            app.save()?;
            println!(
                "{} unit {} to {} in period {} for {}",
                "✓ Sold".green().bold(),
                sale.unit_id,
                buyer,
                sale.period_index,
                sale.price.green()
            );
            println!("  Balance left: {}", app.balance_of(&buyer));
        }

        Commands::AddPeriod {
            caller,
            end_time,
            max_supply,
            price,
        } => {
            let mut app = SaleApp::open(&config)?;
            let index = app.engine_mut().add_period(
                &caller,
                now,
                PeriodParams::new(end_time, max_supply, price),
            )?;
            app.save()?;
            println!("{} period {}", "✓ Added".green().bold(), index);
        }

        Commands::SetRebate {
            caller,
            max_rebate,
            curve_steepness,
        } => {
            let mut app = SaleApp::open(&config)?;
            app.engine_mut()
                .change_rebate_config(&caller, max_rebate, curve_steepness)?;
            app.save()?;
            println!(
                "{} max {}%, steepness {}",
                "✓ Rebate updated:".green().bold(),
                max_rebate,
                curve_steepness
            );
        }

        Commands::Refresh => {
            let mut app = SaleApp::open(&config)?;
            let before = app.engine().current_period_index();
            let after = app.engine_mut().refresh(now);
            app.save()?;
            if after == before {
                println!("Current period unchanged ({})", after);
            } else {
                println!(
                    "{} {} -> {}",
                    "✓ Advanced:".green().bold(),
                    before,
                    after
                );
            }
        }

        Commands::Fund { account, amount } => {
            let app = SaleApp::open(&config)?;
            let balance = app.fund(&account, amount);
            app.save()?;
            println!(
                "{} {} now holds {}",
                "✓ Funded:".green().bold(),
                account,
                balance.green()
            );
        }
    }

    Ok(())
}

fn print_status(engine: &SaleEngine, now: Timestamp) {
    let stats = engine.stats(now);
    let rebate = engine.rebate_config();

    println!("\n{}", "📊 Sale Status".cyan().bold());
    println!("═══════════════════════════════════");
    match engine.current_period(now) {
        Some((index, period)) => {
            println!(
                "{:<18}{} (ends {}, {} left)",
                "Current period:".yellow().bold(),
                index,
                format_time(period.end_time),
                period.remaining()
            );
        }
        None => println!("{:<18}{}", "Current period:".yellow().bold(), "none".red()),
    }
    println!("{:<18}{}", "Units sold:".yellow().bold(), stats.total_sold);
    println!("{:<18}{}", "Still on offer:".yellow().bold(), stats.remaining_supply);
    println!("{:<18}{}", "Periods:".yellow().bold(), stats.period_count);
    println!(
        "{:<18}max {}%, steepness {}",
        "Rebate:".yellow().bold(),
        rebate.max_rebate,
        rebate.curve_steepness
    );
    if stats.exhausted {
        println!("\n{}", "Sale is over: no open period left".red());
    }
    println!();
}

fn print_periods(engine: &SaleEngine, now: Timestamp) {
    let current = engine.current_period(now).map(|(index, _)| index);

    println!("\n{}", "🗓️  Periods".cyan().bold());
    println!("═══════════════════════════════════");
    for (index, period) in engine.periods().iter().enumerate() {
        let marker = if Some(index) == current { "▶" } else { " " };
        let state = if period.is_exhausted() {
            "sold out".red().to_string()
        } else if period.is_expired(now) {
            "closed".yellow().to_string()
        } else {
            "open".green().to_string()
        };

        println!(
            "{} #{:<3} {:>6}/{:<6} price {:<24} ends {} [{}]",
            marker,
            index,
            period.minted_count,
            period.max_supply,
            period.price,
            format_time(period.end_time),
            state
        );
    }
    println!();
}

fn system_now() -> Timestamp {
    chrono::Utc::now().timestamp().max(0) as Timestamp
}

fn format_time(timestamp: Timestamp) -> String {
    i64::try_from(timestamp)
        .ok()
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}
