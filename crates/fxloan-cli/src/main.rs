mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::loan::{LoanArgs, ScheduleArgs};
use commands::rates::RatesArgs;

const LOG_ENV: &str = "FXLOAN_LOG";

/// Exchange-rate dashboards and loan amortization
#[derive(Parser)]
#[command(
    name = "fxloan",
    version,
    about = "Exchange-rate dashboards and loan amortization",
    long_about = "Aggregates MYR remittance rates (CIMB, Wise, PandaRemit) into time buckets \
                  with trend forecasts, and amortizes level-payment loans with optional \
                  extra monthly payments. All figures use decimal arithmetic."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log debug detail to stderr (FXLOAN_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Bucketed rate dashboard: chart and table rows, latest rates, axis domain, forecast
    Rates(RatesArgs),
    /// Linear-trend forecast for one rate column
    Forecast(RatesArgs),
    /// Loan summary with extra-payment savings
    Loan(LoanArgs),
    /// Paginated month-by-month amortization schedule
    Schedule(ScheduleArgs),
    /// Yearly principal/interest rollups and shares
    Yearly(LoanArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Rates(args) => commands::rates::run_rates(args),
        Commands::Forecast(args) => commands::rates::run_forecast(args),
        Commands::Loan(args) => commands::loan::run_loan(args),
        Commands::Schedule(args) => commands::loan::run_schedule(args),
        Commands::Yearly(args) => commands::loan::run_yearly(args),
        Commands::Version => {
            println!("fxloan {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
