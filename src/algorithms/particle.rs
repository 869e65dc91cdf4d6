use rand::Rng;
use serde::{Deserialize, Serialize};

use super::fitness::Objective;
use super::models::{PsoParameters, SEARCH_MAX, SEARCH_MIN};

/// Source of the r1/r2 factors in the velocity update.
pub trait CoefficientSource {
    /// Next factor in `[0, 1)`.
    fn next_coefficient(&mut self) -> f64;
}

/// Uniform draws from any `rand` generator.
#[derive(Debug, Clone)]
pub struct RandomCoefficients<R>(pub R);

impl<R: Rng> CoefficientSource for RandomCoefficients<R> {
    fn next_coefficient(&mut self) -> f64 {
        self.0.random()
    }
}

/// Always returns the same factor. Useful to pin r1/r2 in tests.
#[derive(Debug, Clone, Copy)]
pub struct ConstantCoefficients(pub f64);

impl CoefficientSource for ConstantCoefficients {
    fn next_coefficient(&mut self) -> f64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub position: [f64; 2],
    pub velocity: [f64; 2],
    pub pbest_position: [f64; 2],
    pub pbest_fitness: f64,
    pub fitness: f64,
}

impl Particle {
    /// Create new particle with a uniformly random position in the search square
    pub fn new<R: Rng + ?Sized>(objective: Objective, rng: &mut R) -> Self {
        let x = rng.random_range(SEARCH_MIN..SEARCH_MAX);
        let y = rng.random_range(SEARCH_MIN..SEARCH_MAX);
        Self::at(x, y, objective)
    }

    /// Particle at rest at `(x, y)`, personal best equal to its own position.
    pub fn at(x: f64, y: f64, objective: Objective) -> Self {
        let fitness = objective.evaluate(x, y);
        Particle {
            position: [x, y],
            velocity: [0.0, 0.0],
            pbest_position: [x, y],
            pbest_fitness: fitness,
            fitness,
        }
    }

    pub fn with_velocity(mut self, vx: f64, vy: f64) -> Self {
        self.velocity = [vx, vy];
        self
    }

    /// Standard PSO velocity update; every axis draws its own r1 and r2.
    pub fn update_velocity<C: CoefficientSource + ?Sized>(
        &mut self,
        gbest: &[f64; 2],
        params: &PsoParameters,
        coefficients: &mut C,
    ) {
        for i in 0..2 {
            let r1 = coefficients.next_coefficient();
            let r2 = coefficients.next_coefficient();

            let cognitive =
                params.cognitive_weight * r1 * (self.pbest_position[i] - self.position[i]);
            let social = params.social_weight * r2 * (gbest[i] - self.position[i]);

            self.velocity[i] = params.inertia_weight * self.velocity[i] + cognitive + social;
        }
    }

    /// Move by the current velocity, then hard-clamp into the search square.
    pub fn update_position(&mut self) {
        for i in 0..2 {
            self.position[i] = (self.position[i] + self.velocity[i]).clamp(SEARCH_MIN, SEARCH_MAX);
        }
    }

    pub fn evaluate(&mut self, objective: Objective) {
        self.fitness = objective.evaluate(self.position[0], self.position[1]);
    }

    /// Strict improvement only; ties keep the older personal best.
    pub fn update_personal_best(&mut self) -> bool {
        if self.fitness < self.pbest_fitness {
            self.pbest_fitness = self.fitness;
            self.pbest_position = self.position;
            true
        } else {
            false
        }
    }
}
