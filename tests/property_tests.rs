//! Property tests for genome operators.

use std::collections::HashSet;

use enneos_neat::{
    crossover, sigmoid, FitnessTracking, Genome, InnovationRegistry, NeatConfig, RunMode, Species,
};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Two genomes sharing one registry, each grown by `steps` rounds of mutation.
fn evolved_pair(seed: u64, inputs: usize, outputs: usize, steps: usize) -> (Genome, Genome, InnovationRegistry) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut first = Genome::minimal(0, inputs, outputs, &mut rng);
    let mut registry = InnovationRegistry::from_genome(&first);
    let mut second = first.clone();
    second.set_id(1);

    for genome in [&mut first, &mut second] {
        for _ in 0..steps {
            genome.add_neuron_mutation(0.4, &mut registry, 10, &mut rng).unwrap();
            genome
                .add_link_mutation(0.6, 0.1, &mut registry, 10, 10, &mut rng)
                .unwrap();
            genome.mutate_weights(1.0, 0.2, 0.5, &mut rng);
            genome.sort_genes();
        }
    }
    (first, second, registry)
}

proptest! {
    #[test]
    fn prop_compatibility_is_a_symmetric_distance(
        seed in any::<u64>(),
        inputs in 1usize..4,
        outputs in 1usize..3,
        steps in 0usize..8,
    ) {
        let config = NeatConfig::default();
        let (a, b, _) = evolved_pair(seed, inputs, outputs, steps);

        let ab = a.compatibility_distance(&b, &config);
        let ba = b.compatibility_distance(&a, &config);
        prop_assert!(ab >= 0.0);
        prop_assert!((ab - ba).abs() < 1e-9);
        prop_assert_eq!(a.compatibility_distance(&a, &config), 0.0);
    }

    #[test]
    fn prop_crossover_child_is_sorted_and_contained(
        seed in any::<u64>(),
        steps in 0usize..8,
        mum_fitness in 0.0f64..10.0,
        dad_fitness in 0.0f64..10.0,
    ) {
        let (mut mum, mut dad, registry) = evolved_pair(seed, 2, 1, steps);
        mum.fitness = mum_fitness;
        dad.fitness = dad_fitness;
        let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(1));

        let child = crossover(&mum, &dad, &registry, 2, &mut rng).unwrap();
        prop_assert!(child.is_sorted());

        let parents: HashSet<_> = mum.links().iter().chain(dad.links()).map(|l| l.innovation).collect();
        let mut seen = HashSet::new();
        for link in child.links() {
            prop_assert!(parents.contains(&link.innovation));
            prop_assert!(seen.insert(link.innovation), "duplicate innovation {}", link.innovation);
            prop_assert!(child.has_neuron(link.from));
            prop_assert!(child.has_neuron(link.to));
        }
    }

    #[test]
    fn prop_evolved_networks_stay_finite(
        seed in any::<u64>(),
        steps in 0usize..10,
        x in -5.0f64..5.0,
        y in -5.0f64..5.0,
    ) {
        let (mut genome, _, _) = evolved_pair(seed, 2, 2, steps);
        let network = genome.create_phenotype().unwrap();
        for mode in [RunMode::Active, RunMode::Snapshot] {
            let outputs = network.update(&[x, y], mode);
            prop_assert_eq!(outputs.len(), 2);
            for out in outputs {
                prop_assert!((0.0..=1.0).contains(&out));
            }
        }
    }

    #[test]
    fn prop_fitness_sharing_conserves_scaled_total(
        fitnesses in prop::collection::vec(0.0f64..100.0, 1..20),
        age in 0usize..100,
    ) {
        let config = NeatConfig::default();
        let mut genomes: Vec<Genome> = fitnesses
            .iter()
            .enumerate()
            .map(|(i, &fitness)| {
                let mut genome = Genome::from_genes(i as u64, vec![], vec![], 0, 0);
                genome.fitness = fitness;
                genome
            })
            .collect();

        let mut species = Species::new(0, &genomes[0], 0);
        for (idx, genome) in genomes.iter().enumerate().skip(1) {
            species.add_member(idx, genome, FitnessTracking::ResetEachGeneration);
        }
        for _ in 0..age {
            species.age_one_generation();
        }
        species.adjust_fitnesses(&mut genomes, &config);

        let scale = if age < config.young_bonus_age_threshold {
            config.young_fitness_bonus
        } else if age > config.old_age_threshold {
            config.old_age_penalty
        } else {
            1.0
        };
        let expected = fitnesses.iter().map(|f| f * scale).sum::<f64>() / fitnesses.len() as f64;
        let shared: f64 = genomes.iter().map(|g| g.adjusted_fitness).sum();
        prop_assert!((shared - expected).abs() <= 1e-9 * expected.max(1.0));
    }

    #[test]
    fn prop_sigmoid_is_bounded_and_monotone(
        a in -1.0e6f64..1.0e6,
        b in -1.0e6f64..1.0e6,
        response in 0.1f64..5.0,
    ) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let (s_lo, s_hi) = (sigmoid(lo, response), sigmoid(hi, response));
        prop_assert!((0.0..=1.0).contains(&s_lo));
        prop_assert!((0.0..=1.0).contains(&s_hi));
        prop_assert!(s_lo <= s_hi);
    }
}
