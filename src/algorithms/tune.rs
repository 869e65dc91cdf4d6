use hashbrown::HashMap;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::Serialize;

use super::fitness::Objective;
use super::models::{PsoParameters, MAX_PARTICLES, MIN_PARTICLES};
use super::optimizer::Swarm;

/// Inclusive search range and step for every swept parameter.
#[derive(Debug, Clone)]
pub struct ParamRange {
    pub swarm_size: (usize, usize, usize),
    pub max_iterations: (usize, usize, usize),
    pub inertia_weight: (f64, f64, f64),
    pub cognitive_weight: (f64, f64, f64),
    pub social_weight: (f64, f64, f64),
}

impl Default for ParamRange {
    fn default() -> Self {
        Self {
            swarm_size: (MIN_PARTICLES, MAX_PARTICLES, 5),
            max_iterations: (50, 300, 50),
            inertia_weight: (0.0, 1.0, 0.1),
            cognitive_weight: (0.0, 3.0, 0.25),
            social_weight: (0.0, 3.0, 0.25),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrialParameters {
    pub swarm_size: usize,
    pub max_iterations: usize,
    pub inertia_weight: f64,
    pub cognitive_weight: f64,
    pub social_weight: f64,
}

impl TrialParameters {
    pub fn pso(&self) -> PsoParameters {
        PsoParameters {
            inertia_weight: self.inertia_weight,
            cognitive_weight: self.cognitive_weight,
            social_weight: self.social_weight,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SweptParameter {
    SwarmSize,
    MaxIterations,
    InertiaWeight,
    CognitiveWeight,
    SocialWeight,
}

impl SweptParameter {
    /// Sweep order: each parameter is fixed at its best value before the next one is tried.
    pub const ORDER: [SweptParameter; 5] = [
        SweptParameter::SwarmSize,
        SweptParameter::MaxIterations,
        SweptParameter::InertiaWeight,
        SweptParameter::CognitiveWeight,
        SweptParameter::SocialWeight,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SweptParameter::SwarmSize => "swarm_size",
            SweptParameter::MaxIterations => "max_iterations",
            SweptParameter::InertiaWeight => "inertia_weight",
            SweptParameter::CognitiveWeight => "cognitive_weight",
            SweptParameter::SocialWeight => "social_weight",
        }
    }

    fn values(self, range: &ParamRange) -> Vec<f64> {
        match self {
            SweptParameter::SwarmSize => range_int(range.swarm_size),
            SweptParameter::MaxIterations => range_int(range.max_iterations),
            SweptParameter::InertiaWeight => range_float(range.inertia_weight),
            SweptParameter::CognitiveWeight => range_float(range.cognitive_weight),
            SweptParameter::SocialWeight => range_float(range.social_weight),
        }
    }

    fn apply(self, params: &mut TrialParameters, value: f64) {
        match self {
            SweptParameter::SwarmSize => params.swarm_size = value as usize,
            SweptParameter::MaxIterations => params.max_iterations = value as usize,
            SweptParameter::InertiaWeight => params.inertia_weight = value,
            SweptParameter::CognitiveWeight => params.cognitive_weight = value,
            SweptParameter::SocialWeight => params.social_weight = value,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TrialResult {
    pub parameter: SweptParameter,
    pub value: f64,
    pub params: TrialParameters,
    pub fitness: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TuneReport {
    pub objective: Objective,
    pub best_params: TrialParameters,
    pub fitness: f64,
    /// (value, mean best fitness) per swept parameter.
    pub history: HashMap<SweptParameter, Vec<(f64, f64)>>,
    pub experiments: HashMap<SweptParameter, Vec<(TrialParameters, f64)>>,
}

// Built from an index so accumulated rounding never drops the last value.
fn range_float((start, end, step): (f64, f64, f64)) -> Vec<f64> {
    if step <= 0.0 || end < start {
        return vec![start];
    }
    let count = ((end - start) / step + 1e-9).floor() as usize;
    (0..=count).map(|i| start + i as f64 * step).collect()
}

fn range_int((start, end, step): (usize, usize, usize)) -> Vec<f64> {
    (start..=end.max(start))
        .step_by(step.max(1))
        .map(|v| v as f64)
        .collect()
}

/// Mean best fitness of `trials` independent runs with `params`.
pub fn run_fitness(
    objective: Objective,
    params: &TrialParameters,
    trials: usize,
    seed: Option<u64>,
) -> f64 {
    let trials = trials.max(1);
    let total: f64 = (0..trials)
        .map(|trial| {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(trial as u64)),
                None => StdRng::from_os_rng(),
            };
            let mut swarm = Swarm::initialize(params.swarm_size, objective, &mut rng);
            swarm
                .optimize(&params.pso(), params.max_iterations, None, &mut rng)
                .fitness
        })
        .sum();
    total / trials as f64
}

/// Coordinate-wise parameter sweep. Candidate values of one parameter are
/// scored in parallel; the winner is kept before moving to the next.
pub fn optimize_by_range<F>(
    objective: Objective,
    range: &ParamRange,
    trials: usize,
    seed: Option<u64>,
    on_trial: F,
) -> TuneReport
where
    F: Fn(&TrialResult) + Sync,
{
    info!("sweeping PSO parameters on {objective} with {trials} trial(s) per value");

    let defaults = PsoParameters::default();
    let mut best_params = TrialParameters {
        swarm_size: range.swarm_size.0,
        max_iterations: range.max_iterations.0,
        inertia_weight: defaults.inertia_weight,
        cognitive_weight: defaults.cognitive_weight,
        social_weight: defaults.social_weight,
    };

    let mut history = HashMap::new();
    let mut experiments = HashMap::new();

    for parameter in SweptParameter::ORDER {
        let values = parameter.values(range);

        let results: Vec<TrialResult> = values
            .par_iter()
            .map(|&value| {
                let mut params = best_params;
                parameter.apply(&mut params, value);
                let result = TrialResult {
                    parameter,
                    value,
                    params,
                    fitness: run_fitness(objective, &params, trials, seed),
                };
                on_trial(&result);
                result
            })
            .collect();

        let mut best: Option<&TrialResult> = None;
        for result in &results {
            if best.is_none_or(|b| result.fitness < b.fitness) {
                best = Some(result);
            }
        }
        if let Some(best) = best {
            info!(
                "best {} = {} (fitness {:.6})",
                parameter.name(),
                best.value,
                best.fitness
            );
            best_params = best.params;
        }

        history.insert(parameter, results.iter().map(|r| (r.value, r.fitness)).collect());
        experiments.insert(parameter, results.iter().map(|r| (r.params, r.fitness)).collect());
    }

    let fitness = run_fitness(objective, &best_params, trials, seed);
    info!("final fitness with tuned parameters: {fitness:.6}");

    TuneReport {
        objective,
        best_params,
        fitness,
        history,
        experiments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn float_range_includes_the_end() {
        let values = range_float((0.0, 1.0, 0.1));
        assert_eq!(values.len(), 11);
        assert!((values[10] - 1.0).abs() < 1e-12);
        assert_eq!(range_float((0.5, 0.5, 0.1)), vec![0.5]);
    }

    #[test]
    fn int_range_steps() {
        assert_eq!(range_int((5, 20, 5)), vec![5.0, 10.0, 15.0, 20.0]);
        assert_eq!(range_int((10, 10, 0)), vec![10.0]);
    }

    #[test]
    fn seeded_fitness_is_reproducible() {
        let params = TrialParameters {
            swarm_size: 10,
            max_iterations: 20,
            inertia_weight: 0.5,
            cognitive_weight: 1.5,
            social_weight: 1.5,
        };
        let a = run_fitness(Objective::Rastrigin, &params, 3, Some(9));
        let b = run_fitness(Objective::Rastrigin, &params, 3, Some(9));
        assert_eq!(a, b);
    }

    #[test]
    fn sweep_reports_every_parameter() {
        let range = ParamRange {
            swarm_size: (5, 10, 5),
            max_iterations: (10, 20, 10),
            inertia_weight: (0.4, 0.6, 0.2),
            cognitive_weight: (1.0, 2.0, 1.0),
            social_weight: (1.0, 2.0, 1.0),
        };
        let calls = AtomicUsize::new(0);

        let report = optimize_by_range(Objective::Sphere, &range, 2, Some(3), |_| {
            calls.fetch_add(1, Ordering::Relaxed);
        });

        assert_eq!(calls.load(Ordering::Relaxed), 10);
        assert_eq!(report.history.len(), 5);
        assert_eq!(report.experiments[&SweptParameter::SwarmSize].len(), 2);
        let best_sizes = &report.history[&SweptParameter::SwarmSize];
        let min = best_sizes.iter().map(|&(_, f)| f).fold(f64::INFINITY, f64::min);
        assert!(report.experiments[&SweptParameter::SocialWeight]
            .iter()
            .all(|(p, _)| p.inertia_weight == report.best_params.inertia_weight));
        assert!(min.is_finite());
        assert!(report.fitness.is_finite());
    }
}
