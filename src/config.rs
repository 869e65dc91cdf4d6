//! Run configuration: swarm size, objective, PSO weights and driver timing.
//!
//! Loaded from a JSON file (every field optional) and overridden by CLI flags.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::algorithms::fitness::Objective;
use crate::algorithms::models::{PsoParameters, MAX_PARTICLES, MIN_PARTICLES};
use crate::error::{PsoError, PsoResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmConfig {
    pub particle_count: usize,
    pub objective: Objective,
    pub inertia_weight: f64,
    pub cognitive_weight: f64,
    pub social_weight: f64,
    pub step_interval_ms: u64,
    pub max_iterations: Option<usize>,
    pub target_fitness: Option<f64>,
    pub seed: Option<u64>,
    pub audit: bool,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        let params = PsoParameters::default();
        Self {
            particle_count: 20,
            objective: Objective::Sphere,
            inertia_weight: params.inertia_weight,
            cognitive_weight: params.cognitive_weight,
            social_weight: params.social_weight,
            step_interval_ms: 100,
            max_iterations: None,
            target_fitness: None,
            seed: None,
            audit: false,
        }
    }
}

impl SwarmConfig {
    pub fn from_json_str(json: &str) -> PsoResult<Self> {
        let config: SwarmConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> PsoResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn parameters(&self) -> PsoParameters {
        PsoParameters {
            inertia_weight: self.inertia_weight,
            cognitive_weight: self.cognitive_weight,
            social_weight: self.social_weight,
        }
    }

    pub fn set_parameters(&mut self, params: PsoParameters) {
        self.inertia_weight = params.inertia_weight;
        self.cognitive_weight = params.cognitive_weight;
        self.social_weight = params.social_weight;
    }

    pub fn step_interval(&self) -> Duration {
        Duration::from_millis(self.step_interval_ms)
    }

    pub fn validate(&self) -> PsoResult<()> {
        validate_particle_count(self.particle_count)?;
        validate_parameters(&self.parameters())?;
        validate_interval(self.step_interval_ms)?;
        if let Some(target) = self.target_fitness {
            if !target.is_finite() {
                return Err(PsoError::invalid("target_fitness", target, "a finite number"));
            }
        }
        Ok(())
    }
}

pub fn validate_particle_count(count: usize) -> PsoResult<()> {
    if (MIN_PARTICLES..=MAX_PARTICLES).contains(&count) {
        Ok(())
    } else {
        Err(PsoError::invalid("particle_count", count, "5..=50"))
    }
}

pub fn validate_parameters(params: &PsoParameters) -> PsoResult<()> {
    check_range("inertia_weight", params.inertia_weight, 1.0, "0.0..=1.0")?;
    check_range("cognitive_weight", params.cognitive_weight, 3.0, "0.0..=3.0")?;
    check_range("social_weight", params.social_weight, 3.0, "0.0..=3.0")
}

pub fn validate_interval(interval_ms: u64) -> PsoResult<()> {
    if interval_ms == 0 {
        return Err(PsoError::invalid("step_interval_ms", interval_ms, "at least 1"));
    }
    Ok(())
}

fn check_range(field: &'static str, value: f64, max: f64, expected: &'static str) -> PsoResult<()> {
    if (0.0..=max).contains(&value) {
        Ok(())
    } else {
        Err(PsoError::invalid(field, value, expected))
    }
}
