use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::fitness::Objective;
use super::models::{GlobalBest, PsoParameters, TraceRecord};
use super::particle::{CoefficientSource, Particle, RandomCoefficients};

/// Swarm state: particles, the best record found so far and the step counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Swarm {
    objective: Objective,
    particles: Vec<Particle>,
    global_best: GlobalBest,
    iteration: usize,
}

// ============================================================================
// CONSTRUCTION
// ============================================================================
impl Swarm {
    /// Scatter `num_particles` particles uniformly over the search square.
    ///
    /// The global best starts as the unset sentinel; initial positions are
    /// never global-best candidates, only positions reached by a step are.
    pub fn initialize<R: Rng + ?Sized>(
        num_particles: usize,
        objective: Objective,
        rng: &mut R,
    ) -> Self {
        let particles = (0..num_particles)
            .map(|_| Particle::new(objective, rng))
            .collect();

        info!("initialized {num_particles} particles on {objective}");
        Self::from_particles(objective, particles)
    }

    /// Swarm made of the given particles, with an unset global best.
    pub fn from_particles(objective: Objective, particles: Vec<Particle>) -> Self {
        Self::from_parts(objective, particles, GlobalBest::UNSET, 0)
    }

    pub fn from_parts(
        objective: Objective,
        particles: Vec<Particle>,
        global_best: GlobalBest,
        iteration: usize,
    ) -> Self {
        Swarm {
            objective,
            particles,
            global_best,
            iteration,
        }
    }

    pub fn objective(&self) -> Objective {
        self.objective
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn global_best(&self) -> GlobalBest {
        self.global_best
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}

// ============================================================================
// PSO STEP
// ============================================================================
impl Swarm {
    /// Advance every particle once using thread-local randomness.
    pub fn step(&mut self, params: &PsoParameters) -> bool {
        self.step_with(params, &mut RandomCoefficients(rand::rng()))
    }

    /// Advance every particle once, drawing r1/r2 from `coefficients`.
    ///
    /// All particles steer towards the global best as it was when the step
    /// began. Improvements are collected and the lowest one is committed
    /// after the last particle, so the result does not depend on particle
    /// order. Returns whether the global best changed.
    pub fn step_with<C: CoefficientSource + ?Sized>(
        &mut self,
        params: &PsoParameters,
        coefficients: &mut C,
    ) -> bool {
        let snapshot = self.global_best;
        let objective = self.objective;
        let mut candidate: Option<GlobalBest> = None;

        for particle in &mut self.particles {
            particle.update_velocity(&snapshot.position, params, coefficients);
            particle.update_position();
            particle.evaluate(objective);
            particle.update_personal_best();

            let beats_candidate = candidate.is_none_or(|best| particle.fitness < best.fitness);
            if particle.fitness < snapshot.fitness && beats_candidate {
                candidate = Some(GlobalBest {
                    position: particle.position,
                    fitness: particle.fitness,
                });
            }
        }

        self.iteration += 1;

        match candidate {
            Some(best) => {
                debug!(
                    "iteration {}: global best {:.6} -> {:.6}",
                    self.iteration, snapshot.fitness, best.fitness
                );
                self.global_best = best;
                true
            }
            None => false,
        }
    }

    /// Step until `max_iterations` steps have been taken or the global best
    /// reaches `target_fitness`.
    pub fn optimize<R: Rng>(
        &mut self,
        params: &PsoParameters,
        max_iterations: usize,
        target_fitness: Option<f64>,
        rng: &mut R,
    ) -> GlobalBest {
        let mut coefficients = RandomCoefficients(rng);

        for _ in 0..max_iterations {
            self.step_with(params, &mut coefficients);

            // Early stopping for good enough solutions
            if target_fitness.is_some_and(|target| self.global_best.fitness <= target) {
                debug!("target reached after {} iterations", self.iteration);
                break;
            }
        }

        self.global_best
    }

    /// Current particle states as trace rows.
    pub fn trace_records(&self) -> Vec<TraceRecord> {
        self.particles
            .iter()
            .enumerate()
            .map(|(index, p)| TraceRecord {
                iteration: self.iteration,
                particle: index,
                x: p.position[0],
                y: p.position[1],
                vx: p.velocity[0],
                vy: p.velocity[1],
                fitness: p.fitness,
                best_x: p.pbest_position[0],
                best_y: p.pbest_position[1],
                best_fitness: p.pbest_fitness,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::particle::ConstantCoefficients;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn frozen() -> PsoParameters {
        PsoParameters {
            inertia_weight: 0.0,
            cognitive_weight: 0.0,
            social_weight: 0.0,
        }
    }

    #[test]
    fn initialize_sets_sentinel_and_counts() {
        let mut rng = StdRng::seed_from_u64(1);
        let swarm = Swarm::initialize(20, Objective::Ackley, &mut rng);

        assert_eq!(swarm.len(), 20);
        assert_eq!(swarm.iteration(), 0);
        assert_eq!(swarm.global_best(), GlobalBest::UNSET);
        for p in swarm.particles() {
            assert_eq!(p.pbest_fitness, Objective::Ackley.evaluate(p.position[0], p.position[1]));
        }
    }

    #[test]
    fn resting_particle_sets_first_global_best() {
        let mut swarm = Swarm::from_particles(
            Objective::Sphere,
            vec![Particle::at(3.0, 4.0, Objective::Sphere)],
        );
        assert_eq!(swarm.particles()[0].fitness, 25.0);

        let improved = swarm.step_with(&frozen(), &mut ConstantCoefficients(0.5));

        assert!(improved);
        let p = &swarm.particles()[0];
        assert_eq!(p.velocity, [0.0, 0.0]);
        assert_eq!(p.position, [3.0, 4.0]);
        assert_eq!(p.fitness, 25.0);
        assert_eq!(
            swarm.global_best(),
            GlobalBest {
                position: [3.0, 4.0],
                fitness: 25.0
            }
        );
        assert_eq!(swarm.iteration(), 1);
    }

    #[test]
    fn tie_with_global_best_is_not_an_improvement() {
        let pinned = GlobalBest {
            position: [0.0, 0.0],
            fitness: 0.0,
        };
        let mut swarm = Swarm::from_parts(
            Objective::Sphere,
            vec![
                Particle::at(0.0, 0.0, Objective::Sphere),
                Particle::at(2.0, 0.0, Objective::Sphere),
            ],
            pinned,
            0,
        );
        let params = PsoParameters {
            inertia_weight: 0.0,
            cognitive_weight: 0.0,
            social_weight: 1.0,
        };

        let improved = swarm.step_with(&params, &mut ConstantCoefficients(1.0));

        assert!(!improved);
        let second = &swarm.particles()[1];
        assert_eq!(second.velocity, [-2.0, 0.0]);
        assert_eq!(second.position, [0.0, 0.0]);
        assert_eq!(second.fitness, 0.0);
        assert_eq!(swarm.global_best(), pinned);
    }

    #[test]
    fn lowest_candidate_wins_regardless_of_order() {
        let particles = vec![
            Particle::at(1.0, 1.0, Objective::Sphere),
            Particle::at(0.5, 0.0, Objective::Sphere),
            Particle::at(-2.0, 3.0, Objective::Sphere),
        ];
        let mut forward = Swarm::from_particles(Objective::Sphere, particles.clone());
        let mut reversed =
            Swarm::from_particles(Objective::Sphere, particles.into_iter().rev().collect());

        forward.step_with(&frozen(), &mut ConstantCoefficients(0.3));
        reversed.step_with(&frozen(), &mut ConstantCoefficients(0.3));

        assert_eq!(forward.global_best(), reversed.global_best());
        assert_eq!(forward.global_best().fitness, 0.25);
    }

    #[test]
    fn optimize_stops_at_target() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut swarm = Swarm::initialize(30, Objective::Sphere, &mut rng);
        let best = swarm.optimize(&PsoParameters::default(), 500, Some(1e-3), &mut rng);

        assert!(best.fitness <= 1e-3);
        assert!(swarm.iteration() < 500);
    }

    #[test]
    fn trace_rows_follow_particles() {
        let swarm = Swarm::from_particles(
            Objective::Sphere,
            vec![
                Particle::at(1.0, 2.0, Objective::Sphere),
                Particle::at(-1.0, 0.0, Objective::Sphere),
            ],
        );
        let rows = swarm.trace_records();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].particle, 1);
        assert_eq!(rows[0].fitness, 5.0);
        assert_eq!(rows[0].iteration, 0);
    }
}
