use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Lower and upper edge of the square search domain, on both axes.
pub const SEARCH_MIN: f64 = -5.0;
pub const SEARCH_MAX: f64 = 5.0;

pub const MIN_PARTICLES: usize = 5;
pub const MAX_PARTICLES: usize = 50;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct PsoParameters {
    pub inertia_weight: f64,
    pub cognitive_weight: f64,
    pub social_weight: f64,
}

impl Default for PsoParameters {
    fn default() -> Self {
        Self {
            inertia_weight: 0.5,
            cognitive_weight: 1.5,
            social_weight: 1.5,
        }
    }
}

/// Best position seen by the whole swarm.
///
/// Starts out as an unset sentinel with infinite fitness; the position of
/// the sentinel is the origin and still feeds the social term of the first
/// step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlobalBest {
    pub position: [f64; 2],
    #[serde(with = "unset_fitness")]
    pub fitness: f64,
}

impl GlobalBest {
    pub const UNSET: GlobalBest = GlobalBest {
        position: [0.0, 0.0],
        fitness: f64::INFINITY,
    };

    pub fn is_found(&self) -> bool {
        self.fitness.is_finite()
    }

    /// Fitness for display purposes; `None` until a particle has improved on the sentinel.
    pub fn fitness(&self) -> Option<f64> {
        self.is_found().then_some(self.fitness)
    }
}

impl Default for GlobalBest {
    fn default() -> Self {
        Self::UNSET
    }
}

impl fmt::Display for GlobalBest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.fitness() {
            Some(fitness) => write!(
                f,
                "{:.4} at ({:.2}, {:.2})",
                fitness, self.position[0], self.position[1]
            ),
            None => f.write_str("none yet"),
        }
    }
}

// JSON has no infinity, so the sentinel travels as null.
mod unset_fitness {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(fitness: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if fitness.is_finite() {
            serializer.serialize_some(fitness)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct OptimizationProgress {
    pub iteration: usize,
    pub elapsed_time: Duration,
    pub best_fitness: Option<f64>,
    pub best_position: Option<[f64; 2]>,
    pub improved: bool,
    pub is_finished: bool,
}

/// One row of a trajectory trace: a particle's state after a given step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TraceRecord {
    pub iteration: usize,
    pub particle: usize,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub fitness: f64,
    pub best_x: f64,
    pub best_y: f64,
    pub best_fitness: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_is_not_displayed_as_a_number() {
        let best = GlobalBest::UNSET;
        assert!(!best.is_found());
        assert_eq!(best.fitness(), None);
        assert_eq!(best.to_string(), "none yet");
    }

    #[test]
    fn found_best_is_formatted_like_the_status_panel() {
        let best = GlobalBest {
            position: [3.0, 4.0],
            fitness: 25.0,
        };
        assert_eq!(best.to_string(), "25.0000 at (3.00, 4.00)");
    }

    #[test]
    fn sentinel_round_trips_through_json_as_null() {
        let json = serde_json::to_string(&GlobalBest::UNSET).unwrap();
        assert_eq!(json, r#"{"position":[0.0,0.0],"fitness":null}"#);
        let back: GlobalBest = serde_json::from_str(&json).unwrap();
        assert!(back.fitness.is_infinite());
    }
}
