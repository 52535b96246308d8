//! LuckyDraw simulator
//!
//! Usage:
//!   ld-sim batch --draws 1000000 --seed 42     - Check selection against the prize table
//!   ld-sim replay --variant slot               - Print one draw's event timeline
//!   ld-sim config                              - Print the effective configuration

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};

use ld_core::{DrawVariant, LotteryConfig};
use ld_sim::{BatchConfig, DEFAULT_SHARDS, ReplayOptions, replay, run_batch};

#[derive(Parser)]
#[command(name = "ld-sim", about = "LuckyDraw simulator")]
struct Cli {
    /// Configuration file (.yaml/.yml/.json); built-in prizes when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Emit JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Variant {
    Grid,
    Slot,
}

impl From<Variant> for DrawVariant {
    fn from(v: Variant) -> Self {
        match v {
            Variant::Grid => DrawVariant::Grid,
            Variant::Slot => DrawVariant::Slot,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run many selections and compare observed shares with the table
    Batch {
        #[arg(short, long, default_value_t = 1_000_000)]
        draws: u64,
        #[arg(short, long, default_value_t = 0)]
        seed: u64,
        /// Independent RNG streams
        #[arg(long, default_value_t = DEFAULT_SHARDS)]
        shards: u64,
    },
    /// Replay draws on a virtual clock
    Replay {
        #[arg(short, long, value_enum, default_value = "grid")]
        variant: Variant,
        #[arg(short, long, default_value_t = 0)]
        seed: u64,
        #[arg(short = 'n', long, default_value_t = 1)]
        draws: usize,
        /// Run at a third of the configured delays
        #[arg(long)]
        turbo: bool,
    },
    /// Print the effective configuration
    Config,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => LotteryConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => LotteryConfig::default(),
    };

    match cli.command {
        Commands::Batch { draws, seed, shards } => {
            if draws == 0 {
                bail!("--draws must be at least 1");
            }
            batch(&config, BatchConfig { draws, seed, shards }, cli.json)
        }
        Commands::Replay {
            variant,
            seed,
            draws,
            turbo,
        } => {
            let options = ReplayOptions {
                variant: variant.into(),
                seed,
                time_scale: if turbo { 1.0 / 3.0 } else { 1.0 },
                draws,
            };
            timeline(&config, &options, cli.json)
        }
        Commands::Config => {
            println!("{}", config.to_json()?);
            Ok(())
        }
    }
}

fn batch(config: &LotteryConfig, settings: BatchConfig, json: bool) -> Result<()> {
    let report = run_batch(&config.prizes, &settings);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{} draws, seed {}\n", report.draws, report.seed);
    println!(
        "{:<24} {:>10} {:>10} {:>10} {:>12}",
        "prize", "weight", "expected", "observed", "count"
    );
    for t in &report.tallies {
        println!(
            "{:<24} {:>10.4} {:>10.4} {:>10.4} {:>12}",
            t.name, t.configured, t.expected_share, t.observed_share, t.count
        );
    }
    println!(
        "\nchi² = {:.3} ({} dof), max share error {:.5}",
        report.chi_squared,
        report.degrees_of_freedom,
        report.max_share_error()
    );
    if report.unreachable_hits > 0 {
        bail!("{} draws hit prizes that should be unreachable", report.unreachable_hits);
    }
    Ok(())
}

fn timeline(config: &LotteryConfig, options: &ReplayOptions, json: bool) -> Result<()> {
    let entries = replay(config, options);
    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for entry in &entries {
        println!("{:>9.1} ms  {}", entry.at_ms, serde_json::to_string(&entry.event)?);
    }
    Ok(())
}
