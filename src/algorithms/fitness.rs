use std::f64::consts::{E, PI};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PsoError;

/// Benchmark functions the swarm can minimize. Lower fitness is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Objective {
    #[default]
    Sphere,
    Rastrigin,
    Ackley,
    Rosenbrock,
    Himmelblau,
    Beale,
}

const ORIGIN: &[(f64, f64)] = &[(0.0, 0.0)];
const ROSENBROCK_OPTIMA: &[(f64, f64)] = &[(1.0, 1.0)];
const HIMMELBLAU_OPTIMA: &[(f64, f64)] = &[
    (3.0, 2.0),
    (-2.805118, 3.131312),
    (-3.779310, -3.283186),
    (3.584428, -1.848126),
];
const BEALE_OPTIMA: &[(f64, f64)] = &[(3.0, 0.5)];

impl Objective {
    pub const ALL: [Objective; 6] = [
        Objective::Sphere,
        Objective::Rastrigin,
        Objective::Ackley,
        Objective::Rosenbrock,
        Objective::Himmelblau,
        Objective::Beale,
    ];

    pub fn evaluate(self, x: f64, y: f64) -> f64 {
        match self {
            Objective::Sphere => sphere(x, y),
            Objective::Rastrigin => rastrigin(x, y),
            Objective::Ackley => ackley(x, y),
            Objective::Rosenbrock => rosenbrock(x, y),
            Objective::Himmelblau => himmelblau(x, y),
            Objective::Beale => beale(x, y),
        }
    }

    /// Known global minima, used for reference marking only.
    pub fn global_optima(self) -> &'static [(f64, f64)] {
        match self {
            Objective::Sphere | Objective::Rastrigin | Objective::Ackley => ORIGIN,
            Objective::Rosenbrock => ROSENBROCK_OPTIMA,
            Objective::Himmelblau => HIMMELBLAU_OPTIMA,
            Objective::Beale => BEALE_OPTIMA,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Objective::Sphere => "sphere",
            Objective::Rastrigin => "rastrigin",
            Objective::Ackley => "ackley",
            Objective::Rosenbrock => "rosenbrock",
            Objective::Himmelblau => "himmelblau",
            Objective::Beale => "beale",
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Objective {
    type Err = PsoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Objective::ALL
            .into_iter()
            .find(|objective| objective.name() == wanted)
            .ok_or_else(|| PsoError::UnknownObjective(s.to_string()))
    }
}

pub fn sphere(x: f64, y: f64) -> f64 {
    x * x + y * y
}

pub fn rastrigin(x: f64, y: f64) -> f64 {
    20.0 + (x * x - 10.0 * (2.0 * PI * x).cos()) + (y * y - 10.0 * (2.0 * PI * y).cos())
}

pub fn ackley(x: f64, y: f64) -> f64 {
    -20.0 * (-0.2 * (0.5 * (x * x + y * y)).sqrt()).exp()
        - (0.5 * ((2.0 * PI * x).cos() + (2.0 * PI * y).cos())).exp()
        + E
        + 20.0
}

pub fn rosenbrock(x: f64, y: f64) -> f64 {
    100.0 * (y - x * x).powi(2) + (1.0 - x).powi(2)
}

pub fn himmelblau(x: f64, y: f64) -> f64 {
    (x * x + y - 11.0).powi(2) + (x + y * y - 7.0).powi(2)
}

pub fn beale(x: f64, y: f64) -> f64 {
    (1.5 - x + x * y).powi(2)
        + (2.25 - x + x * y * y).powi(2)
        + (2.625 - x + x * y * y * y).powi(2)
}
