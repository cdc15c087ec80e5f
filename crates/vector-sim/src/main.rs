// crates/vector-sim/src/main.rs
//
// CLI entrypoint for the Vector Protocol simulator.
//
// Deploys a fresh in-memory protocol per run and drives it through a
// scenario: repeated bond purchases against one market, or a sequence of
// staking rebases.

mod config;
mod error;
mod output;
mod scenarios;

use clap::{Parser, Subcommand};
use config::SimConfig;
use output::{format_json, format_table, OutputFormat};
use scenarios::bond::{BondRow, Completion};
use scenarios::rebase::EpochRow;

/// Vector Protocol simulator.
#[derive(Parser, Debug)]
#[command(
    name = "vector-sim",
    version = "0.1.0",
    about = "Simulate Vector Protocol bond markets and staking rebases"
)]
struct Cli {
    /// Path to the TOML scenario file.
    #[arg(long, global = true, default_value = "~/.vector/sim.toml")]
    config: String,

    /// Print JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Buy bonds repeatedly and watch the price recover.
    Bond {
        /// Override the configured number of purchases.
        #[arg(long)]
        rounds: Option<u32>,
    },

    /// Stake and rebase epoch by epoch.
    Rebase {
        /// Override the configured number of epochs.
        #[arg(long)]
        epochs: Option<u32>,
    },

    /// Print the effective configuration.
    Config,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Table
    };

    let mut sim_config = match SimConfig::load(&cli.config) {
        Ok(cfg) => {
            tracing::info!("Loaded configuration from {}", cli.config);
            cfg
        }
        Err(e) => {
            tracing::warn!(
                "Could not load config from {}: {}. Using defaults.",
                cli.config,
                e
            );
            SimConfig::default()
        }
    };

    match &cli.command {
        Commands::Bond { rounds } => {
            if let Some(rounds) = rounds {
                sim_config.bond.rounds = *rounds;
            }
            let report = scenarios::bond::run(&sim_config)?;
            match format {
                OutputFormat::Json => println!("{}", format_json(&report)),
                OutputFormat::Table => {
                    let rows: Vec<BondRow> = report
                        .rounds
                        .iter()
                        .map(|r| BondRow::from_round(r, sim_config.start_timestamp))
                        .collect();
                    println!("{}", format_table(&rows));
                    if let Completion::Halted { round, reason } = &report.completion {
                        println!("Stopped at round {}: {}", round, reason);
                    }
                    println!(
                        "Bonder holds {} sVEC",
                        output::format_units(report.bonder_staked, vector_core::VEC_DECIMALS, 4)
                    );
                }
            }
        }
        Commands::Rebase { epochs } => {
            if let Some(epochs) = epochs {
                sim_config.rebase.epochs = *epochs;
            }
            let report = scenarios::rebase::run(&sim_config)?;
            match format {
                OutputFormat::Json => println!("{}", format_json(&report)),
                OutputFormat::Table => {
                    let rows: Vec<EpochRow> = report
                        .epochs
                        .iter()
                        .map(|e| EpochRow::from_record(e, sim_config.start_timestamp))
                        .collect();
                    println!("{}", format_table(&rows));
                }
            }
        }
        Commands::Config => println!("{}", format_json(&sim_config)),
    }

    Ok(())
}
