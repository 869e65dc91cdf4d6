//! Property-based tests for the swarm invariants.

use proptest::prelude::*;
use pso_swarm_lib::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn objective() -> impl Strategy<Value = Objective> {
    prop::sample::select(Objective::ALL.to_vec())
}

fn params() -> impl Strategy<Value = PsoParameters> {
    (0.0..=1.0f64, 0.0..=3.0f64, 0.0..=3.0f64).prop_map(|(w, c1, c2)| PsoParameters {
        inertia_weight: w,
        cognitive_weight: c1,
        social_weight: c2,
    })
}

fn particles(objective: Objective) -> impl Strategy<Value = Vec<Particle>> {
    prop::collection::vec(
        (-5.0..=5.0f64, -5.0..=5.0f64, -10.0..10.0f64, -10.0..10.0f64),
        1..20,
    )
    .prop_map(move |states| {
        states
            .into_iter()
            .map(|(x, y, vx, vy)| Particle::at(x, y, objective).with_velocity(vx, vy))
            .collect()
    })
}

fn swarm() -> impl Strategy<Value = Swarm> {
    objective().prop_flat_map(|objective| {
        particles(objective).prop_map(move |particles| Swarm::from_particles(objective, particles))
    })
}

proptest! {
    #[test]
    fn positions_stay_inside_the_square(
        mut swarm in swarm(),
        params in params(),
        seed in any::<u64>(),
        steps in 1usize..30,
    ) {
        let mut draws = RandomCoefficients(StdRng::seed_from_u64(seed));
        for _ in 0..steps {
            swarm.step_with(&params, &mut draws);
            for p in swarm.particles() {
                prop_assert!(p.position.iter().all(|c| (SEARCH_MIN..=SEARCH_MAX).contains(c)));
            }
        }
    }

    #[test]
    fn bests_never_get_worse(
        mut swarm in swarm(),
        params in params(),
        seed in any::<u64>(),
        steps in 1usize..30,
    ) {
        let mut draws = RandomCoefficients(StdRng::seed_from_u64(seed));
        for _ in 0..steps {
            let before = swarm.clone();
            swarm.step_with(&params, &mut draws);

            prop_assert!(swarm.global_best().fitness <= before.global_best().fitness);
            for (old, new) in before.particles().iter().zip(swarm.particles()) {
                prop_assert!(new.pbest_fitness <= old.pbest_fitness);
                prop_assert!(new.pbest_fitness <= new.fitness);
            }
            // Whatever is committed was reached by some particle this step.
            if swarm.global_best() != before.global_best() {
                let best = swarm.global_best();
                prop_assert!(swarm
                    .particles()
                    .iter()
                    .any(|p| p.position == best.position && p.fitness == best.fitness));
            }
        }
    }

    #[test]
    fn particle_order_does_not_change_the_best(
        swarm in swarm(),
        params in params(),
        r in 0.0..1.0f64,
        rotation in 0usize..20,
    ) {
        let objective = swarm.objective();
        let mut reordered: Vec<Particle> = swarm.particles().to_vec();
        reordered.reverse();
        let len = reordered.len();
        reordered.rotate_left(rotation % len);

        let mut forward = swarm.clone();
        let mut shuffled = Swarm::from_particles(objective, reordered);
        forward.step_with(&params, &mut ConstantCoefficients(r));
        shuffled.step_with(&params, &mut ConstantCoefficients(r));
        prop_assert_eq!(forward.global_best().fitness, shuffled.global_best().fitness);
    }
}
