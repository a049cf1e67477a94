#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Rampart session.

mod session;

use std::{path::PathBuf, time::Duration};

use anyhow::{ensure, Context, Result};
use clap::Parser;
use rampart_simulation::{Simulation, SimulationConfig};

use session::{SessionPlan, SessionReport, TowerOrder};

/// Runs a scripted tower-defense session and prints its outcome.
#[derive(Debug, Parser)]
#[command(name = "rampart", version, about)]
struct CliArgs {
    /// TOML file overriding the economy, wave pacing or map.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Simulated seconds to run before reporting.
    #[arg(long, default_value_t = 120.0)]
    seconds: f64,
    /// Length of a single simulation step in milliseconds.
    #[arg(long, default_value_t = 16)]
    step_ms: u64,
    /// Tower to buy before the first wave, as KIND@COLUMN,ROW.
    #[arg(long = "tower", value_name = "KIND@COLUMN,ROW")]
    towers: Vec<TowerOrder>,
    /// Parallel waves to send alongside the first main wave.
    #[arg(long, default_value_t = 0)]
    extra_waves: u32,
    /// Skip every funds check.
    #[arg(long)]
    unlimited_money: bool,
    /// Print the report as JSON.
    #[arg(long)]
    json: bool,
}

/// Entry point for the Rampart command-line interface.
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = CliArgs::parse();
    let duration = session_length(args.seconds)?;
    ensure!(args.step_ms > 0, "--step-ms must be positive");

    let mut config = match &args.config {
        Some(path) => SimulationConfig::load(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => SimulationConfig::default(),
    };
    if args.unlimited_money {
        config.economy.unlimited_money = true;
    }

    let mut simulation = Simulation::new(config).context("failed to build the simulation")?;
    log::info!("{}", simulation.welcome_banner());

    let plan = SessionPlan {
        duration,
        step: Duration::from_millis(args.step_ms),
        towers: args.towers,
        extra_waves: args.extra_waves,
    };
    let report = session::run(&mut simulation, &plan);

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("failed to encode the report")?
        );
    } else {
        print_report(&report);
    }
    Ok(())
}

fn session_length(seconds: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(seconds).with_context(|| {
        format!("--seconds must be a non-negative number of seconds in range, got {seconds}")
    })
}

fn print_report(report: &SessionReport) {
    println!("elapsed:          {:.1}s", report.elapsed_secs);
    println!("wave:             {}", report.wave);
    println!("waves completed:  {}", report.waves_completed);
    println!("health:           {}", report.health);
    println!("money:            {}", report.money);
    println!("kills:            {}", report.kills);
    println!("damage dealt:     {:.0}", report.damage_dealt);
    println!("enemies escaped:  {}", report.enemies_escaped);
    println!(
        "towers:           {} built, {} rejected",
        report.towers_built, report.orders_rejected
    );
    if report.game_over {
        println!("the base has fallen");
    }
}
