use serde::Serialize;

use super::models::{SEARCH_MAX, SEARCH_MIN};
use super::optimizer::Swarm;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Violation {
    OutOfBounds { particle: usize, position: [f64; 2] },
    PersonalBestIncreased { particle: usize, before: f64, after: f64 },
    PersonalBestAboveCurrent { particle: usize, best: f64, current: f64 },
    GlobalBestIncreased { before: f64, after: f64 },
    IterationNotAdvanced { before: usize, after: usize },
    SwarmResized { before: usize, after: usize },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StepAudit {
    pub violations: Vec<Violation>,
}

impl StepAudit {
    /// Compare a swarm before and after one step.
    pub fn compare(before: &Swarm, after: &Swarm) -> Self {
        let mut violations = Vec::new();

        if after.iteration() != before.iteration() + 1 {
            violations.push(Violation::IterationNotAdvanced {
                before: before.iteration(),
                after: after.iteration(),
            });
        }

        if after.global_best().fitness > before.global_best().fitness {
            violations.push(Violation::GlobalBestIncreased {
                before: before.global_best().fitness,
                after: after.global_best().fitness,
            });
        }

        if before.len() != after.len() {
            violations.push(Violation::SwarmResized {
                before: before.len(),
                after: after.len(),
            });
        }

        for (i, (old, new)) in before.particles().iter().zip(after.particles()).enumerate() {
            if new.position.iter().any(|c| !(SEARCH_MIN..=SEARCH_MAX).contains(c)) {
                violations.push(Violation::OutOfBounds {
                    particle: i,
                    position: new.position,
                });
            }
            if new.pbest_fitness > old.pbest_fitness {
                violations.push(Violation::PersonalBestIncreased {
                    particle: i,
                    before: old.pbest_fitness,
                    after: new.pbest_fitness,
                });
            }
            if new.pbest_fitness > new.fitness {
                violations.push(Violation::PersonalBestAboveCurrent {
                    particle: i,
                    best: new.pbest_fitness,
                    current: new.fitness,
                });
            }
        }

        StepAudit { violations }
    }

    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}
