use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::Serialize;

pub mod algorithms;
pub mod config;
pub mod error;
pub mod export;

use algorithms::fitness::Objective;
use algorithms::models::GlobalBest;
use algorithms::optimizer::Swarm;
use config::SwarmConfig;
use error::PsoResult;

pub mod prelude {
    pub use crate::algorithms::{
        checker::{StepAudit, Violation},
        driver::{CommandOutcome, DriverCommand, SwarmDriver},
        fitness::Objective,
        models::{
            GlobalBest, OptimizationProgress, PsoParameters, TraceRecord, MAX_PARTICLES,
            MIN_PARTICLES, SEARCH_MAX, SEARCH_MIN,
        },
        optimizer::Swarm,
        particle::{CoefficientSource, ConstantCoefficients, Particle, RandomCoefficients},
        tune::{optimize_by_range, ParamRange, SweptParameter, TrialParameters, TuneReport},
    };
    pub use crate::config::SwarmConfig;
    pub use crate::error::{PsoError, PsoResult};
    pub use crate::export::{export_full_experiments_single_sheet, TraceWriter};
    pub use crate::{process_runs, BatchSummary};
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub objective: Objective,
    pub runs: usize,
    pub max_iterations: usize,
    pub all_best_fitness: Vec<f64>,
    pub best: GlobalBest,
    pub mean_fitness: f64,
}

/// Run `runs` independent swarms to completion and collect their results.
///
/// Runs execute on the rayon pool, each with its own generator; with a seed
/// in `config`, run `i` is seeded with `seed + i`.
pub fn process_runs<F>(
    config: &SwarmConfig,
    runs: usize,
    max_iterations: usize,
    on_run: F,
) -> PsoResult<BatchSummary>
where
    F: Fn(usize, &GlobalBest) + Sync,
{
    config.validate()?;
    let params = config.parameters();
    info!(
        "running {runs} swarm(s) of {} on {} for up to {max_iterations} iterations",
        config.particle_count, config.objective
    );

    let results: Vec<GlobalBest> = (0..runs)
        .into_par_iter()
        .map(|run| {
            let mut rng = match config.seed {
                Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(run as u64)),
                None => StdRng::from_os_rng(),
            };
            let mut swarm = Swarm::initialize(config.particle_count, config.objective, &mut rng);
            let best = swarm.optimize(&params, max_iterations, config.target_fitness, &mut rng);
            on_run(run, &best);
            best
        })
        .collect();

    let mut best_overall = GlobalBest::UNSET;
    for best in &results {
        if best.fitness < best_overall.fitness {
            best_overall = *best;
        }
    }

    let all_best_fitness: Vec<f64> = results.iter().map(|best| best.fitness).collect();
    let mean_fitness = if all_best_fitness.is_empty() {
        f64::INFINITY
    } else {
        all_best_fitness.iter().sum::<f64>() / all_best_fitness.len() as f64
    };

    Ok(BatchSummary {
        objective: config.objective,
        runs,
        max_iterations,
        all_best_fitness,
        best: best_overall,
        mean_fitness,
    })
}
