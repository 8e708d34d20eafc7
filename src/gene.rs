//! Gene types for NEAT genomes.
//!
//! This module defines the fundamental building blocks of a genome:
//! - [`NeuronGene`]: a neuron with its role and placement in the network
//! - [`LinkGene`]: a weighted connection carrying its historical marking

use serde::{Deserialize, Serialize};

/// Historical marking of a structural innovation.
pub type InnovationId = u64;
/// Identity of a neuron, shared by every genome carrying it.
pub type NeuronId = u64;
/// Identity of a genome within a run.
pub type GenomeId = u64;
/// Identity of a species within a run.
pub type SpeciesId = u64;

/// The type/role of a neuron in the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NeuronType {
    /// Input neuron - receives external values, no activation applied.
    Input,
    /// Hidden neuron - added by splitting links.
    Hidden,
    /// Output neuron - produces final network output.
    Output,
    /// Bias neuron - always outputs 1.0.
    Bias,
}

impl NeuronType {
    /// Input and bias neurons are never the target of a link.
    #[inline]
    #[must_use]
    pub fn is_source_only(self) -> bool {
        matches!(self, Self::Input | Self::Bias)
    }
}

/// Position of a neuron in the network's layout.
///
/// `depth` runs from 0.0 (input layer) to 1.0 (output layer); hidden neurons
/// sit strictly between. `width` orders neurons within a layer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Placement {
    pub depth: f64,
    pub width: f64,
}

impl Placement {
    #[inline]
    #[must_use]
    pub const fn new(depth: f64, width: f64) -> Self {
        Self { depth, width }
    }

    /// Point halfway between two placements.
    #[inline]
    #[must_use]
    pub fn midpoint(self, other: Self) -> Self {
        Self {
            depth: (self.depth + other.depth) / 2.0,
            width: (self.width + other.width) / 2.0,
        }
    }
}

/// A neuron gene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeuronGene {
    pub id: NeuronId,
    pub neuron_type: NeuronType,
    /// Set when the neuron carries a self-loop.
    pub recurrent: bool,
    pub placement: Placement,
    /// Divisor applied to the summed input before the sigmoid.
    pub activation_response: f64,
}

impl NeuronGene {
    #[must_use]
    pub fn new(id: NeuronId, neuron_type: NeuronType, placement: Placement) -> Self {
        Self {
            id,
            neuron_type,
            recurrent: false,
            placement,
            activation_response: 1.0,
        }
    }
}

/// A link gene representing a weighted connection between two neurons.
///
/// Disabled links are skipped when compiling a phenotype but kept for
/// crossover and compatibility measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkGene {
    pub innovation: InnovationId,
    pub from: NeuronId,
    pub to: NeuronId,
    pub weight: f64,
    pub enabled: bool,
    pub recurrent: bool,
}

impl LinkGene {
    /// Create a new enabled link.
    #[must_use]
    pub fn new(
        innovation: InnovationId,
        from: NeuronId,
        to: NeuronId,
        weight: f64,
        recurrent: bool,
    ) -> Self {
        Self {
            innovation,
            from,
            to,
            weight,
            enabled: true,
            recurrent,
        }
    }
}
