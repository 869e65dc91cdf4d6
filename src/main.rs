use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::runtime::Runtime;
use tokio::sync::{mpsc, watch};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pso_swarm_lib::prelude::*;

#[derive(Parser)]
#[command(name = "pso-swarm")]
#[command(about = "Watch a particle swarm minimize a 2D benchmark function")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Step the swarm on a timer until the step limit, the target or Ctrl-C
    Run {
        #[command(flatten)]
        swarm: SwarmArgs,

        /// Stop after this many steps
        #[arg(short = 'n', long)]
        steps: Option<usize>,
    },
    /// Drive the swarm with commands read from stdin (play, pause, step, reset, w 0.7, ...)
    Interactive {
        #[command(flatten)]
        swarm: SwarmArgs,
    },
    /// Take a fixed number of manual steps and print every particle
    Step {
        #[command(flatten)]
        swarm: SwarmArgs,

        /// Number of steps to take
        #[arg(short = 'n', long, default_value = "1")]
        steps: usize,

        /// Write every particle's state after every step to this CSV file
        #[arg(long)]
        trace: Option<PathBuf>,
    },
    /// Repeat independent runs in parallel and summarize the best results
    Batch {
        #[command(flatten)]
        swarm: SwarmArgs,

        /// Number of independent runs
        #[arg(short, long, default_value = "10")]
        runs: usize,

        /// Iterations per run
        #[arg(short = 'n', long, default_value = "200")]
        iterations: usize,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the benchmark functions and their known minima
    Functions,
}

#[derive(Args)]
struct SwarmArgs {
    /// JSON config file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of particles (5-50)
    #[arg(short, long)]
    particles: Option<usize>,

    /// Objective function (sphere, rastrigin, ackley, rosenbrock, himmelblau, beale)
    #[arg(short, long, value_parser = parse_objective)]
    function: Option<Objective>,

    /// Inertia weight w (0-1)
    #[arg(short = 'w', long)]
    inertia: Option<f64>,

    /// Cognitive coefficient c1 (0-3)
    #[arg(long)]
    c1: Option<f64>,

    /// Social coefficient c2 (0-3)
    #[arg(long)]
    c2: Option<f64>,

    /// Milliseconds between timer-driven steps
    #[arg(short, long)]
    interval: Option<u64>,

    /// Stop once the best fitness is at or below this value
    #[arg(short, long)]
    target: Option<f64>,

    /// Seed for reproducible runs
    #[arg(short, long)]
    seed: Option<u64>,

    /// Check swarm invariants after every step
    #[arg(long)]
    audit: bool,
}

fn parse_objective(name: &str) -> Result<Objective, String> {
    name.parse().map_err(|e: PsoError| e.to_string())
}

impl SwarmArgs {
    fn into_config(self) -> anyhow::Result<SwarmConfig> {
        let mut config = match &self.config {
            Some(path) => SwarmConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => SwarmConfig::default(),
        };

        if let Some(particles) = self.particles {
            config.particle_count = particles;
        }
        if let Some(function) = self.function {
            config.objective = function;
        }
        if let Some(w) = self.inertia {
            config.inertia_weight = w;
        }
        if let Some(c1) = self.c1 {
            config.cognitive_weight = c1;
        }
        if let Some(c2) = self.c2 {
            config.social_weight = c2;
        }
        if let Some(interval) = self.interval {
            config.step_interval_ms = interval;
        }
        if self.target.is_some() {
            config.target_fitness = self.target;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config.audit |= self.audit;

        config.validate()?;
        Ok(config)
    }
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn print_progress(progress: &OptimizationProgress) {
    let best = match (progress.best_fitness, progress.best_position) {
        (Some(fitness), Some([x, y])) => format!("{fitness:.4} at ({x:.2}, {y:.2})"),
        _ => "none yet".to_string(),
    };
    let marker = if progress.improved { "⬇" } else { " " };
    println!("{marker} iteration {:>5} | best {}", progress.iteration, best);
}

fn print_particles(swarm: &Swarm) {
    println!(" #      x        y       vx       vy     fitness   personal best");
    for (i, p) in swarm.particles().iter().enumerate() {
        println!(
            "{:>2} {:>8.3} {:>8.3} {:>8.3} {:>8.3} {:>11.5} {:>11.5}",
            i,
            p.position[0],
            p.position[1],
            p.velocity[0],
            p.velocity[1],
            p.fitness,
            p.pbest_fitness
        );
    }
}

fn stop_on_ctrl_c(rt: &Runtime) -> watch::Receiver<bool> {
    let (stop_tx, stop_rx) = watch::channel(false);
    rt.spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = stop_tx.send(true);
        }
    });
    stop_rx
}

fn run(config: SwarmConfig, steps: Option<usize>) -> anyhow::Result<()> {
    let rt = Runtime::new().context("Failed to start the Tokio runtime")?;
    let stop = stop_on_ctrl_c(&rt);
    let mut driver = SwarmDriver::new(config)?;

    println!(
        "🚀 {} particles on {} (w={}, c1={}, c2={}), step every {:?}",
        driver.config().particle_count,
        driver.config().objective,
        driver.config().inertia_weight,
        driver.config().cognitive_weight,
        driver.config().social_weight,
        driver.config().step_interval()
    );

    let done = rt.block_on(driver.run(stop, steps, |progress| {
        if !progress.is_finished {
            print_progress(progress);
        }
    }));

    println!(
        "🏁 Stopped after {} iterations in {:.2?}. Best: {}",
        done.iteration,
        done.elapsed_time,
        driver.swarm().global_best()
    );
    Ok(())
}

fn interactive(config: SwarmConfig) -> anyhow::Result<()> {
    let rt = Runtime::new().context("Failed to start the Tokio runtime")?;
    let stop = stop_on_ctrl_c(&rt);
    let mut driver = SwarmDriver::new(config)?;

    let (tx, rx) = mpsc::channel(16);
    rt.spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).await.is_err() {
                break;
            }
        }
    });

    println!("🎛  Commands: <enter>/toggle, play, pause, step, reset, w|c1|c2 <value>,");
    println!("   interval <ms>, particles <n>, function <name>, status, quit");

    let done = rt.block_on(driver.run_interactive(rx, stop, print_progress, |message| {
        println!("   {message}")
    }));

    println!("🏁 Iteration {}. Best: {}", done.iteration, driver.swarm().global_best());
    // Stdin reader may still be blocked on a read.
    rt.shutdown_timeout(Duration::from_millis(100));
    Ok(())
}

fn step(config: SwarmConfig, steps: usize, trace: Option<PathBuf>) -> anyhow::Result<()> {
    let mut driver = SwarmDriver::new(config)?;
    let mut writer = match &trace {
        Some(path) => Some(
            TraceWriter::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?,
        ),
        None => None,
    };

    if let Some(writer) = writer.as_mut() {
        writer.write_all(&driver.swarm().trace_records())?;
    }

    for _ in 0..steps {
        let progress = driver.step();
        print_progress(&progress);
        if let Some(writer) = writer.as_mut() {
            writer.write_all(&driver.swarm().trace_records())?;
        }
    }

    print_particles(driver.swarm());

    if let (Some(writer), Some(path)) = (writer, trace) {
        let rows = writer.rows();
        writer.finish()?;
        println!("💾 Wrote {} rows to {}", rows, path.display());
    }
    Ok(())
}

fn batch(config: SwarmConfig, runs: usize, iterations: usize, json: bool) -> anyhow::Result<()> {
    let pb = ProgressBar::new(runs as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:30}] {pos}/{len} runs {msg}")?
            .progress_chars("=> "),
    );

    let summary = process_runs(&config, runs, iterations, |_, _| pb.inc(1))?;
    pb.finish_and_clear();

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("=== {} runs on {} ===", summary.runs, summary.objective);
    for (run, fitness) in summary.all_best_fitness.iter().enumerate() {
        println!("Run {:>3}: {:.6}", run + 1, fitness);
    }
    println!("Mean best fitness : {:.6}", summary.mean_fitness);
    println!("Best overall      : {}", summary.best);
    Ok(())
}

fn functions() {
    for objective in Objective::ALL {
        let optima = objective
            .global_optima()
            .iter()
            .map(|&(x, y)| format!("({x}, {y}) f={:.2e}", objective.evaluate(x, y)))
            .collect::<Vec<_>>()
            .join(", ");
        println!("{:<11} {}", objective.name(), optima);
    }
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Command::Run { swarm, steps } => run(swarm.into_config()?, steps),
        Command::Interactive { swarm } => interactive(swarm.into_config()?),
        Command::Step { swarm, steps, trace } => step(swarm.into_config()?, steps, trace),
        Command::Batch {
            swarm,
            runs,
            iterations,
            json,
        } => batch(swarm.into_config()?, runs, iterations, json),
        Command::Functions => {
            functions();
            Ok(())
        }
    }
}
