use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pso_swarm_lib::prelude::*;

/// Coordinate-wise PSO parameter sweep on one benchmark function
#[derive(Parser)]
#[command(name = "parameter_search")]
struct Args {
    /// Objective function to tune on
    #[arg(short, long, default_value = "rastrigin")]
    function: String,

    /// Independent runs averaged per candidate value
    #[arg(short, long, default_value = "5")]
    trials: usize,

    /// Seed for reproducible sweeps
    #[arg(short, long)]
    seed: Option<u64>,

    /// Workbook with every trial
    #[arg(short, long, default_value = "pso_parameter_sweep.xlsx")]
    output: PathBuf,

    /// Also print the full report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let objective: Objective = args.function.parse()?;
    let range = ParamRange::default();

    println!("📊 Sweeping PSO parameters on {objective}:");
    println!("- swarm_size       : {:?}", range.swarm_size);
    println!("- max_iterations   : {:?}", range.max_iterations);
    println!("- inertia_weight   : {:?}", range.inertia_weight);
    println!("- cognitive_weight : {:?}", range.cognitive_weight);
    println!("- social_weight    : {:?}", range.social_weight);

    let start_time = Instant::now();

    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
            .template("{spinner:.cyan} {msg}")?,
    );
    pb.set_message("Sweeping parameters...");

    let report = optimize_by_range(objective, &range, args.trials, args.seed, |trial| {
        pb.set_message(format!(
            "{} = {:.2} -> {:.6}",
            trial.parameter.name(),
            trial.value,
            trial.fitness
        ));
    });

    pb.finish_with_message("✅ Sweep finished.");

    let elapsed = start_time.elapsed();
    println!("🕒 Total time: {} min {} s", elapsed.as_secs() / 60, elapsed.as_secs() % 60);

    println!("\n=== Best parameters ===");
    println!("Swarm Size     : {}", report.best_params.swarm_size);
    println!("Max Iterations : {}", report.best_params.max_iterations);
    println!("Inertia Weight : {:.2}", report.best_params.inertia_weight);
    println!("Cognitive W    : {:.2}", report.best_params.cognitive_weight);
    println!("Social W       : {:.2}", report.best_params.social_weight);
    println!("\nFitness: {:.6}", report.fitness);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    export_full_experiments_single_sheet(&report, &args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    println!("💾 Saved every trial to {}", args.output.display());
    Ok(())
}
