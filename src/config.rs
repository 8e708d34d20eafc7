//! Run configuration for NEAT populations.
//!
//! [`NeatConfig`] gathers every tunable of the evolutionary loop. All fields
//! have defaults, so partial configurations deserialize cleanly:
//!
//! ```rust
//! use enneos_neat::NeatConfig;
//!
//! let config: NeatConfig = serde_json::from_str(r#"{ "population_size": 50 }"#).unwrap();
//! assert_eq!(config.population_size, 50);
//! assert_eq!(config.kill_worst_species_age, 60);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How a population fills remaining slots when species quotas under-produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum UnderflowMode {
    /// Tournament over the previous generation, copying winners whose id is
    /// not already present in the new population.
    OriginalTournament,
    /// Tournament over the previous generation; winners get a fresh id and a
    /// round of amplified mutations.
    #[default]
    HighMutationTournament,
}

/// How best-ever fitness values are tracked across generations.
///
/// Applies both to the population's best-ever record and to the baseline a
/// species compares new members against when picking its leader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FitnessTracking {
    /// Best-ever is replaced by each generation's best.
    #[default]
    ResetEachGeneration,
    /// Best-ever only ever increases.
    Monotonic,
}

/// Configuration for a NEAT population.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NeatConfig {
    /// Number of genomes per generation.
    pub population_size: usize,
    /// Number of input neurons (excluding bias).
    pub num_inputs: usize,
    /// Number of output neurons.
    pub num_outputs: usize,
    /// Genomes at or above this neuron count never gain hidden neurons.
    pub max_permitted_neurons: usize,
    /// Attempts to find an old link to split while the genome is small.
    pub old_link_attempts: usize,
    /// Attempts to find a neuron for a self-loop.
    pub looped_link_attempts: usize,
    /// Attempts to find an unconnected neuron pair.
    pub add_link_attempts: usize,
    /// Species older than this become candidates for extinction.
    pub kill_worst_species_age: usize,
    /// Species younger than this get [`Self::young_fitness_bonus`].
    pub young_bonus_age_threshold: usize,
    /// Species older than this get [`Self::old_age_penalty`].
    pub old_age_threshold: usize,
    pub young_fitness_bonus: f64,
    pub old_age_penalty: f64,
    /// Fraction of a species eligible to breed.
    pub survival_rate: f64,
    pub underflow_mode: UnderflowMode,
    /// Scale applied to mutation rates in [`UnderflowMode::HighMutationTournament`].
    pub underflow_mutation_multiplier: f64,
    pub fitness_tracking: FitnessTracking,
    pub crossover_rate: f64,
    pub chance_add_recurrent_link: f64,
    pub chance_add_node: f64,
    pub chance_add_link: f64,
    /// Per-link chance of a weight mutation. Values above 1.0 mutate every link.
    pub weight_mutation_rate: f64,
    /// Chance that a mutated weight is replaced rather than perturbed.
    pub probability_weight_replaced: f64,
    pub max_weight_perturbation: f64,
    pub activation_mutation_rate: f64,
    pub max_activation_perturbation: f64,
    /// Coefficient for excess genes in compatibility distance.
    pub compatibility_excess_coeff: f64,
    /// Coefficient for disjoint genes in compatibility distance.
    pub compatibility_disjoint_coeff: f64,
    /// Coefficient for the mean weight difference of matched genes.
    pub compatibility_weight_coeff: f64,
    pub compatibility_threshold: f64,
    pub min_compatibility_threshold: f64,
    pub max_compatibility_threshold: f64,
    /// Species count a caller may steer the threshold toward. Not used internally.
    pub target_num_species: usize,
    /// Reassignment passes allowed before speciation is declared divergent.
    pub speciation_pass_limit: usize,
    /// When set, the hall of fame is only filled through
    /// [`Population::add_to_hall_of_fame`](crate::Population::add_to_hall_of_fame).
    pub manual_hall_of_fame: bool,
    /// Forces monotonic best-ever tracking and disables recurrent links.
    pub xor_test_mode: bool,
    /// Size of the best-genome snapshot taken each epoch; `None` keeps the whole population.
    pub best_genomes_to_keep: Option<usize>,
    /// Seed for the population's RNG; `None` seeds from the thread RNG.
    pub random_seed: Option<u64>,
}

impl Default for NeatConfig {
    fn default() -> Self {
        Self {
            population_size: 150,
            num_inputs: 2,
            num_outputs: 1,
            max_permitted_neurons: 3000,
            old_link_attempts: 10,
            looped_link_attempts: 10,
            add_link_attempts: 10,
            kill_worst_species_age: 60,
            young_bonus_age_threshold: 30,
            old_age_threshold: 70,
            young_fitness_bonus: 1.3,
            old_age_penalty: 0.7,
            survival_rate: 0.3,
            underflow_mode: UnderflowMode::HighMutationTournament,
            underflow_mutation_multiplier: 2.0,
            fitness_tracking: FitnessTracking::ResetEachGeneration,
            crossover_rate: 0.7,
            chance_add_recurrent_link: 0.0005,
            chance_add_node: 0.05,
            chance_add_link: 0.4,
            weight_mutation_rate: 1.2,
            probability_weight_replaced: 0.4,
            max_weight_perturbation: 1.0,
            activation_mutation_rate: 0.5,
            max_activation_perturbation: 0.5,
            compatibility_excess_coeff: 1.0,
            compatibility_disjoint_coeff: 1.0,
            compatibility_weight_coeff: 3.0,
            compatibility_threshold: 3.0,
            min_compatibility_threshold: 0.1,
            max_compatibility_threshold: 500.0,
            target_num_species: 100,
            speciation_pass_limit: 500,
            manual_hall_of_fame: false,
            xor_test_mode: false,
            best_genomes_to_keep: None,
            random_seed: None,
        }
    }
}

impl NeatConfig {
    /// Default configuration for the given network shape.
    #[must_use]
    pub fn new(num_inputs: usize, num_outputs: usize) -> Self {
        Self {
            num_inputs,
            num_outputs,
            ..Default::default()
        }
    }

    /// Configuration for the XOR validation run: two inputs, one output,
    /// monotonic best-ever tracking and no self-loops.
    #[must_use]
    pub fn xor() -> Self {
        Self {
            num_inputs: 2,
            num_outputs: 1,
            xor_test_mode: true,
            ..Default::default()
        }
    }

    /// Recurrent link probability after applying [`Self::xor_test_mode`].
    #[inline]
    #[must_use]
    pub fn effective_recurrent_chance(&self) -> f64 {
        if self.xor_test_mode {
            0.0
        } else {
            self.chance_add_recurrent_link
        }
    }

    /// Best-ever tracking policy after applying [`Self::xor_test_mode`].
    #[inline]
    #[must_use]
    pub fn effective_fitness_tracking(&self) -> FitnessTracking {
        if self.xor_test_mode {
            FitnessTracking::Monotonic
        } else {
            self.fitness_tracking
        }
    }

    /// Tournament size used when refilling an under-produced population.
    #[must_use]
    pub fn underflow_tournament_size(&self) -> usize {
        let divisor = match self.underflow_mode {
            UnderflowMode::OriginalTournament => 20,
            UnderflowMode::HighMutationTournament => 5,
        };
        (self.population_size / divisor).max(1)
    }

    /// Check the configuration for values the population cannot run with.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if self.num_outputs == 0 {
            return Err(ConfigError::NoOutputs);
        }
        let probabilities = [
            ("survival_rate", self.survival_rate),
            ("crossover_rate", self.crossover_rate),
            ("chance_add_recurrent_link", self.chance_add_recurrent_link),
            ("chance_add_node", self.chance_add_node),
            ("chance_add_link", self.chance_add_link),
            ("probability_weight_replaced", self.probability_weight_replaced),
            ("activation_mutation_rate", self.activation_mutation_rate),
        ];
        for (name, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ProbabilityOutOfRange { name, value });
            }
        }
        if self.min_compatibility_threshold > self.max_compatibility_threshold {
            return Err(ConfigError::InvertedThresholdBounds {
                min: self.min_compatibility_threshold,
                max: self.max_compatibility_threshold,
            });
        }
        if self.speciation_pass_limit == 0 {
            return Err(ConfigError::ZeroSpeciationPasses);
        }
        Ok(())
    }

    /// Clamp a compatibility threshold into the configured bounds.
    #[inline]
    #[must_use]
    pub fn clamp_threshold(&self, threshold: f64) -> f64 {
        threshold.clamp(
            self.min_compatibility_threshold,
            self.max_compatibility_threshold,
        )
    }
}
