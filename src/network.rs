//! Executable phenotype compiled from a genome.
//!
//! A [`Network`] owns its neurons in a flat arena; links refer to neurons by
//! arena index. Neurons are evaluated in gene order, so a single pass gives
//! "active" semantics where a neuron may read another neuron's value from the
//! previous call. A snapshot runs enough passes for a signal to cross the
//! whole network and then clears all state.

use std::collections::HashMap;

use crate::activation::sigmoid;
use crate::error::{NeatError, Result};
use crate::gene::{GenomeId, NeuronId, NeuronType, Placement};
use crate::genome::Genome;

/// How [`Network::update`] propagates a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// One pass; neuron outputs persist between calls.
    Active,
    /// One pass per network layer, then every output is reset to zero.
    Snapshot,
}

/// A compiled link.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Link {
    /// Arena index of the source neuron.
    pub from: usize,
    /// Arena index of the target neuron.
    pub to: usize,
    pub weight: f64,
    pub recurrent: bool,
}

/// A compiled neuron.
#[derive(Debug, Clone)]
pub struct Neuron {
    pub id: NeuronId,
    pub neuron_type: NeuronType,
    pub output: f64,
    pub placement: Placement,
    pub activation_response: f64,
    pub links_in: Vec<Link>,
    pub links_out: Vec<Link>,
}

/// An evaluation-ready neural network.
#[derive(Debug, Clone)]
pub struct Network {
    neurons: Vec<Neuron>,
    /// Arena indices of input neurons, in gene order.
    input_indices: Vec<usize>,
    /// Arena indices of output neurons, in gene order.
    output_indices: Vec<usize>,
    depth: usize,
    genome_id: GenomeId,
    fitness: f64,
    clone_id: Option<u64>,
}

impl Network {
    /// Compile a genome's neurons and enabled links.
    ///
    /// # Errors
    ///
    /// Returns [`NeatError::UnknownNeuron`] if an enabled link references a
    /// neuron the genome does not contain.
    pub fn from_genome(genome: &Genome, depth: usize) -> Result<Self> {
        let mut neurons = Vec::with_capacity(genome.num_neurons());
        let mut index_of: HashMap<NeuronId, usize> = HashMap::with_capacity(genome.num_neurons());
        let mut input_indices = Vec::with_capacity(genome.num_inputs());
        let mut output_indices = Vec::with_capacity(genome.num_outputs());

        for gene in genome.neurons() {
            let idx = neurons.len();
            index_of.insert(gene.id, idx);
            match gene.neuron_type {
                NeuronType::Input => input_indices.push(idx),
                NeuronType::Output => output_indices.push(idx),
                NeuronType::Hidden | NeuronType::Bias => {}
            }
            neurons.push(Neuron {
                id: gene.id,
                neuron_type: gene.neuron_type,
                output: 0.0,
                placement: gene.placement,
                activation_response: gene.activation_response,
                links_in: Vec::new(),
                links_out: Vec::new(),
            });
        }

        for gene in genome.links().iter().filter(|l| l.enabled) {
            let resolve = |id: NeuronId| {
                index_of.get(&id).copied().ok_or(NeatError::UnknownNeuron {
                    genome_id: genome.id(),
                    neuron_id: id,
                })
            };
            let link = Link {
                from: resolve(gene.from)?,
                to: resolve(gene.to)?,
                weight: gene.weight,
                recurrent: gene.recurrent,
            };
            neurons[link.from].links_out.push(link);
            neurons[link.to].links_in.push(link);
        }

        Ok(Self {
            neurons,
            input_indices,
            output_indices,
            depth,
            genome_id: genome.id(),
            fitness: genome.fitness,
            clone_id: None,
        })
    }

    /// Feed `inputs` through the network and return the output neurons'
    /// values in gene order.
    ///
    /// # Panics
    ///
    /// Panics if `inputs.len()` differs from the number of input neurons.
    pub fn update(&mut self, inputs: &[f64], mode: RunMode) -> Vec<f64> {
        assert_eq!(
            inputs.len(),
            self.input_indices.len(),
            "Input length mismatch"
        );

        let passes = match mode {
            RunMode::Active => 1,
            RunMode::Snapshot => self.depth,
        };

        let mut outputs = Vec::with_capacity(self.output_indices.len());
        for _ in 0..passes {
            for (slot, &idx) in self.input_indices.iter().enumerate() {
                self.neurons[idx].output = inputs[slot];
            }

            for idx in 0..self.neurons.len() {
                match self.neurons[idx].neuron_type {
                    NeuronType::Input => {}
                    NeuronType::Bias => self.neurons[idx].output = 1.0,
                    NeuronType::Hidden | NeuronType::Output => {
                        let sum: f64 = self.neurons[idx]
                            .links_in
                            .iter()
                            .map(|link| link.weight * self.neurons[link.from].output)
                            .sum();
                        let neuron = &mut self.neurons[idx];
                        neuron.output = sigmoid(sum, neuron.activation_response);
                    }
                }
            }

            outputs.clear();
            outputs.extend(self.output_indices.iter().map(|&idx| self.neurons[idx].output));
        }

        if mode == RunMode::Snapshot {
            self.reset();
        }

        outputs
    }

    /// Zero every neuron's output.
    pub fn reset(&mut self) {
        for neuron in &mut self.neurons {
            neuron.output = 0.0;
        }
    }

    #[must_use]
    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    #[must_use]
    pub fn neuron(&self, index: usize) -> Option<&Neuron> {
        self.neurons.get(index)
    }

    #[inline]
    #[must_use]
    pub fn num_inputs(&self) -> usize {
        self.input_indices.len()
    }

    #[inline]
    #[must_use]
    pub fn num_outputs(&self) -> usize {
        self.output_indices.len()
    }

    #[must_use]
    pub fn num_neurons(&self) -> usize {
        self.neurons.len()
    }

    #[must_use]
    pub fn num_connections(&self) -> usize {
        self.neurons.iter().map(|n| n.links_in.len()).sum()
    }

    #[must_use]
    pub fn num_hidden(&self) -> usize {
        self.neurons
            .iter()
            .filter(|n| n.neuron_type == NeuronType::Hidden)
            .count()
    }

    #[must_use]
    pub fn num_recurrent(&self) -> usize {
        self.neurons
            .iter()
            .flat_map(|n| &n.links_in)
            .filter(|link| link.recurrent)
            .count()
    }

    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Id of the genome this network was compiled from.
    #[inline]
    #[must_use]
    pub fn genome_id(&self) -> GenomeId {
        self.genome_id
    }

    /// Raw fitness of the genome at compile time.
    #[inline]
    #[must_use]
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    /// Caller-assigned tag for telling copies of one network apart.
    #[inline]
    #[must_use]
    pub fn clone_id(&self) -> Option<u64> {
        self.clone_id
    }

    #[inline]
    pub fn set_clone_id(&mut self, clone_id: u64) {
        self.clone_id = Some(clone_id);
    }

    /// Spread neurons sharing a layer evenly across its width, for drawing.
    pub fn tidy_x_splits(&mut self) {
        let mut layers: Vec<f64> = self.neurons.iter().map(|n| n.placement.depth).collect();
        layers.sort_by(f64::total_cmp);
        layers.dedup();

        for layer in layers {
            let members: Vec<usize> = (0..self.neurons.len())
                .filter(|&idx| self.neurons[idx].placement.depth == layer)
                .collect();
            let slice = 1.0 / (members.len() + 1) as f64;
            for (rank, idx) in members.into_iter().enumerate() {
                self.neurons[idx].placement.width = slice * (rank + 1) as f64;
            }
        }
    }
}
