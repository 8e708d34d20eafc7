//! Error types for NEAT evolution.
//!
//! Every variant of [`NeatError`] is fatal for the current run: the population
//! is left in an unspecified state and should be discarded. Recoverable misses
//! (a mutation that finds no candidate, an innovation lookup miss) are reported
//! through `Option` instead.

use thiserror::Error;

use crate::gene::{GenomeId, NeuronId};

/// Fatal errors raised by the evolutionary core.
#[derive(Debug, Error)]
pub enum NeatError {
    #[error("fitness vector has {got} scores but the population holds {expected} genomes")]
    FitnessLengthMismatch { expected: usize, got: usize },

    #[error("speciation did not converge after {passes} passes")]
    SpeciationDiverged { passes: usize },

    #[error("population holds {actual} genomes after reproduction, expected {expected}")]
    PopulationSizeMismatch { expected: usize, actual: usize },

    #[error("genome id {genome_id} appears more than once in the new population")]
    DuplicateGenomeId { genome_id: GenomeId },

    #[error("malformed genome data at line {line}: {reason}")]
    MalformedGenome { line: usize, reason: String },

    #[error("index {index} is out of bounds for {collection} of length {len}")]
    IndexOutOfBounds {
        collection: &'static str,
        index: usize,
        len: usize,
    },

    #[error("genome at index {index} has id {actual}, expected {expected}")]
    GenomeIdMismatch {
        index: usize,
        expected: GenomeId,
        actual: GenomeId,
    },

    #[error("hall of fame is under automatic control; enable manual control first")]
    HallOfFameNotManual,

    #[error("neuron {neuron_id} does not exist in genome {genome_id}")]
    UnknownNeuron {
        genome_id: GenomeId,
        neuron_id: NeuronId,
    },

    #[error("innovation registry holds no template for neuron {neuron_id}")]
    UnknownNeuronTemplate { neuron_id: NeuronId },

    #[error("splitting link {from} -> {to} would place a hidden neuron at output depth")]
    HiddenNeuronAtOutputDepth { from: NeuronId, to: NeuronId },

    #[error("attempted to split link {from} -> {to} between two output neurons")]
    SplitBetweenOutputs { from: NeuronId, to: NeuronId },

    #[error("registry has no link innovations for neuron {neuron_id} splitting {from} -> {to}")]
    MissingSplitInnovation {
        from: NeuronId,
        to: NeuronId,
        neuron_id: NeuronId,
    },

    #[error("genome {genome_id} not found in population or archives")]
    GenomeNotFound { genome_id: GenomeId },

    #[error("invalid XOR solution from genome {genome_id}: {reason}")]
    InvalidXorSolution { genome_id: GenomeId, reason: String },

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("genome I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("population size must be at least 1")]
    EmptyPopulation,

    #[error("genomes need at least one output neuron")]
    NoOutputs,

    #[error("`{name}` must lie in [0, 1], got {value}")]
    ProbabilityOutOfRange { name: &'static str, value: f64 },

    #[error("compatibility threshold bounds are inverted: min {min} > max {max}")]
    InvertedThresholdBounds { min: f64, max: f64 },

    #[error("speciation pass limit must be at least 1")]
    ZeroSpeciationPasses,
}

pub type Result<T, E = NeatError> = std::result::Result<T, E>;
