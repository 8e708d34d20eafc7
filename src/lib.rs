//! # Enneos NEAT
//!
//! A generational NeuroEvolution of Augmenting Topologies (NEAT) engine:
//! genomes of neuron and link genes grow in complexity under mutation, are
//! grouped into species by structural similarity, and breed in proportion to
//! their shared fitness.
//!
//! ## Features
//!
//! - **Historical Markings**: An append-only innovation registry gives the same
//!   structural change the same identity across the population
//! - **Speciation**: Compatibility distance over excess, disjoint and matched
//!   genes, with age bonuses and penalties
//! - **Layered Phenotypes**: Neuron placements drive both the evaluation
//!   depth of a network and the recurrence test for new links
//! - **Archives**: Best-of-generation, hall of fame and a caller-managed custom archive
//! - **DNA Files**: A line-oriented text format for saving and loading genomes
//!
//! ## Quick Start
//!
//! ```rust
//! use enneos_neat::{NeatConfig, Population, RunMode};
//!
//! let config = NeatConfig {
//!     population_size: 20,
//!     random_seed: Some(42),
//!     ..NeatConfig::new(2, 1)
//! };
//! let mut population = Population::new(config).unwrap();
//!
//! let mut networks = population.create_phenotypes().unwrap();
//! for _ in 0..3 {
//!     // Score every network; here, reward a high output for (1, 0).
//!     let fitness: Vec<f64> = networks
//!         .iter_mut()
//!         .map(|net| net.update(&[1.0, 0.0], RunMode::Snapshot)[0])
//!         .collect();
//!     networks = population.epoch(&fitness).unwrap();
//! }
//! assert_eq!(population.generation(), 3);
//! ```
//!
//! ## Architecture
//!
//! ### Innovation Registry
//!
//! Every new link and every link split is recorded once per run. Later
//! genomes making the same change look it up and reuse its innovation
//! number and neuron id, so crossover can align genes by innovation alone.
//!
//! ### Epoch
//!
//! [`Population::epoch`] takes one fitness score per network of the previous
//! generation and returns the next generation's networks. The returned
//! networks borrow the population, so all scoring has to finish before the
//! next epoch.

pub mod activation;
pub mod config;
pub mod crossover;
pub mod depth;
pub mod error;
pub mod gene;
pub mod genome;
pub mod innovation;
pub mod network;
pub mod persistence;
pub mod population;
pub mod species;
pub mod xor;

// Re-exports for convenience
pub use activation::sigmoid;
pub use config::{FitnessTracking, NeatConfig, UnderflowMode};
pub use crossover::crossover;
pub use depth::{DepthTable, SplitDepth};
pub use error::{ConfigError, NeatError, Result};
pub use gene::{
    GenomeId, InnovationId, LinkGene, NeuronGene, NeuronId, NeuronType, Placement, SpeciesId,
};
pub use genome::Genome;
pub use innovation::{Innovation, InnovationKind, InnovationRegistry};
pub use network::{Network, RunMode};
pub use persistence::{from_dna_str, load, read_dna, save, to_dna_string, write_dna};
pub use population::Population;
pub use species::Species;
pub use xor::{run_xor_validation, XorReport};

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_mutate_then_crossover() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut mum = Genome::minimal(0, 2, 1, &mut rng);
        let mut registry = InnovationRegistry::from_genome(&mum);

        let mut dad = mum.clone();
        dad.set_id(1);
        mum.add_neuron_mutation(1.0, &mut registry, 10, &mut rng).unwrap();
        dad.add_neuron_mutation(1.0, &mut registry, 10, &mut rng).unwrap();
        mum.sort_genes();
        dad.sort_genes();
        mum.fitness = 2.0;

        let child = crossover(&mum, &dad, &registry, 2, &mut rng).unwrap();
        assert!(child.is_sorted());
        assert_eq!(child.num_inputs(), 2);
        assert_eq!(child.num_outputs(), 1);
        assert!(child.num_hidden() >= 1);
    }

    #[test]
    fn test_serialization_roundtrip() {
        let mut rng = ChaCha8Rng::seed_from_u64(123);
        let mut genome = Genome::minimal(5, 3, 2, &mut rng);
        let mut registry = InnovationRegistry::from_genome(&genome);
        genome.add_neuron_mutation(1.0, &mut registry, 10, &mut rng).unwrap();

        let json = serde_json::to_string(&genome).expect("Serialization failed");
        let restored: Genome = serde_json::from_str(&json).expect("Deserialization failed");

        assert_eq!(genome.num_neurons(), restored.num_neurons());
        assert_eq!(genome.num_inputs(), restored.num_inputs());
        for (a, b) in genome.links().iter().zip(restored.links()) {
            assert_eq!(a.innovation, b.innovation);
            assert_eq!((a.from, a.to, a.enabled), (b.from, b.to, b.enabled));
            assert!((a.weight - b.weight).abs() < 1e-12);
        }
        assert!(restored.phenotype().is_none());
    }

    #[test]
    fn test_phenotype_follows_genome() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut genome = Genome::minimal(9, 2, 1, &mut rng);
        let network = genome.create_phenotype().unwrap();
        assert_eq!(network.genome_id(), 9);
        assert_eq!(network.depth(), 2);

        let output = network.update(&[0.5, -0.5], RunMode::Snapshot);
        assert_eq!(output.len(), 1);
        assert!((0.0..=1.0).contains(&output[0]));
    }
}
