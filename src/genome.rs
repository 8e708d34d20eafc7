//! NEAT genome: neuron and link genes plus the structural and parametric
//! mutation operators.
//!
//! Link genes are kept sorted by innovation number between mutations (see
//! [`Genome::sort_genes`]); crossover and compatibility measurement rely on it.

use std::cmp::Ordering;

use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::NeatConfig;
use crate::depth::DepthTable;
use crate::error::{NeatError, Result};
use crate::gene::{
    GenomeId, InnovationId, LinkGene, NeuronGene, NeuronId, NeuronType, Placement, SpeciesId,
};
use crate::innovation::{InnovationKind, InnovationRegistry};
use crate::network::Network;

/// While a genome has fewer than `inputs + outputs + SMALL_GENOME_MARGIN`
/// neurons, link splitting favours older links.
const SMALL_GENOME_MARGIN: usize = 5;

/// A NEAT genome.
///
/// Cloning a genome copies its genes and bookkeeping but never its compiled
/// phenotype.
#[derive(Debug, Serialize, Deserialize)]
pub struct Genome {
    id: GenomeId,
    neurons: Vec<NeuronGene>,
    links: Vec<LinkGene>,
    /// Raw fitness assigned by the caller.
    pub fitness: f64,
    /// Fitness after species age scaling and fitness sharing.
    pub adjusted_fitness: f64,
    /// Offspring this genome is entitled to, relative to the population average.
    pub spawn_amount: f64,
    num_inputs: usize,
    num_outputs: usize,
    /// Species the genome was last assigned to.
    pub species: Option<SpeciesId>,
    depth: Option<usize>,
    #[serde(skip)]
    phenotype: Option<Box<Network>>,
}

impl Clone for Genome {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            neurons: self.neurons.clone(),
            links: self.links.clone(),
            fitness: self.fitness,
            adjusted_fitness: self.adjusted_fitness,
            spawn_amount: self.spawn_amount,
            num_inputs: self.num_inputs,
            num_outputs: self.num_outputs,
            species: self.species,
            depth: self.depth,
            phenotype: None,
        }
    }
}

impl Genome {
    /// Create the minimal genome: inputs and a bias fully connected to every
    /// output, with weights drawn uniformly from [-1, 1].
    ///
    /// Neuron ids are `0..inputs` for inputs, `inputs` for the bias and
    /// `inputs + 1..` for outputs. Link innovations start after the last
    /// neuron's innovation, matching a registry seeded from this genome.
    #[must_use]
    pub fn minimal<R: Rng>(id: GenomeId, num_inputs: usize, num_outputs: usize, rng: &mut R) -> Self {
        let mut neurons = Vec::with_capacity(num_inputs + num_outputs + 1);
        let input_span = (num_inputs + 2) as f64;

        for i in 0..num_inputs {
            neurons.push(NeuronGene::new(
                i as NeuronId,
                NeuronType::Input,
                Placement::new(0.0, (i + 2) as f64 / input_span),
            ));
        }

        neurons.push(NeuronGene::new(
            num_inputs as NeuronId,
            NeuronType::Bias,
            Placement::new(0.0, 1.0 / input_span),
        ));

        let output_span = (num_outputs + 1) as f64;
        for i in 0..num_outputs {
            neurons.push(NeuronGene::new(
                (num_inputs + 1 + i) as NeuronId,
                NeuronType::Output,
                Placement::new(1.0, (i + 1) as f64 / output_span),
            ));
        }

        let mut links = Vec::with_capacity((num_inputs + 1) * num_outputs);
        let first_innovation = (num_inputs + num_outputs + 1) as InnovationId;
        for source in &neurons[..=num_inputs] {
            for target in &neurons[num_inputs + 1..] {
                let innovation = first_innovation + links.len() as InnovationId;
                let weight = rng.random_range(-1.0..=1.0);
                links.push(LinkGene::new(innovation, source.id, target.id, weight, false));
            }
        }

        Self::from_genes(id, neurons, links, num_inputs, num_outputs)
    }

    /// Assemble a genome from explicit genes.
    #[must_use]
    pub fn from_genes(
        id: GenomeId,
        neurons: Vec<NeuronGene>,
        links: Vec<LinkGene>,
        num_inputs: usize,
        num_outputs: usize,
    ) -> Self {
        Self {
            id,
            neurons,
            links,
            fitness: 0.0,
            adjusted_fitness: 0.0,
            spawn_amount: 0.0,
            num_inputs,
            num_outputs,
            species: None,
            depth: None,
            phenotype: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> GenomeId {
        self.id
    }

    #[inline]
    pub fn set_id(&mut self, id: GenomeId) {
        self.id = id;
    }

    #[inline]
    #[must_use]
    pub fn neurons(&self) -> &[NeuronGene] {
        &self.neurons
    }

    #[inline]
    #[must_use]
    pub fn links(&self) -> &[LinkGene] {
        &self.links
    }

    /// Mutable access to the link genes. Callers must restore innovation
    /// order with [`sort_genes`](Self::sort_genes) if they reorder or append.
    #[inline]
    pub fn links_mut(&mut self) -> &mut [LinkGene] {
        &mut self.links
    }

    #[inline]
    #[must_use]
    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    #[inline]
    #[must_use]
    pub fn num_outputs(&self) -> usize {
        self.num_outputs
    }

    #[must_use]
    pub fn num_neurons(&self) -> usize {
        self.neurons.len()
    }

    #[must_use]
    pub fn num_links(&self) -> usize {
        self.links.len()
    }

    /// Number of hidden neurons.
    #[must_use]
    pub fn num_hidden(&self) -> usize {
        self.neurons
            .iter()
            .filter(|n| n.neuron_type == NeuronType::Hidden)
            .count()
    }

    /// Network depth, once computed by the population.
    #[inline]
    #[must_use]
    pub fn depth(&self) -> Option<usize> {
        self.depth
    }

    #[inline]
    pub fn set_depth(&mut self, depth: usize) {
        self.depth = Some(depth);
    }

    #[must_use]
    pub fn neuron(&self, id: NeuronId) -> Option<&NeuronGene> {
        self.neurons.iter().find(|n| n.id == id)
    }

    fn neuron_or_err(&self, id: NeuronId) -> Result<&NeuronGene> {
        self.neuron(id).ok_or(NeatError::UnknownNeuron {
            genome_id: self.id,
            neuron_id: id,
        })
    }

    #[must_use]
    pub fn has_neuron(&self, id: NeuronId) -> bool {
        self.neuron(id).is_some()
    }

    /// Whether a link (enabled or not) already joins `from` to `to`.
    #[must_use]
    pub fn has_link(&self, from: NeuronId, to: NeuronId) -> bool {
        self.links.iter().any(|l| l.from == from && l.to == to)
    }

    /// Try to add a new link.
    ///
    /// With probability `loop_chance` the search looks for a hidden or output
    /// neuron without a self-loop and loops it; otherwise it draws random
    /// `(source, target)` pairs, rejecting identical neurons and existing
    /// links. A link whose source lies deeper than its target is marked
    /// recurrent whichever branch found it.
    ///
    /// Returns the innovation of the added link, or `None` when the mutation
    /// did not fire or no candidate was found.
    ///
    /// # Errors
    ///
    /// Fails only if the genome references a neuron it does not contain.
    pub fn add_link_mutation<R: Rng>(
        &mut self,
        mutation_rate: f64,
        loop_chance: f64,
        registry: &mut InnovationRegistry,
        looped_attempts: usize,
        link_attempts: usize,
        rng: &mut R,
    ) -> Result<Option<InnovationId>> {
        if rng.random::<f64>() > mutation_rate {
            return Ok(None);
        }

        // Inputs and the bias precede every other neuron.
        let first_target = self.num_inputs + 1;
        if self.neurons.len() <= first_target {
            return Ok(None);
        }

        let candidate = if rng.random::<f64>() < loop_chance {
            self.find_self_loop(looped_attempts, rng)
        } else {
            self.find_unlinked_pair(link_attempts, rng)
        };

        let Some((from, to)) = candidate else {
            debug!("genome {}: no room for a new link", self.id);
            return Ok(None);
        };

        let innovation = match registry.lookup(from, to, InnovationKind::NewLink) {
            Some(innovation) => innovation,
            None => registry.record(from, to, InnovationKind::NewLink),
        };

        let from_depth = self.neuron_or_err(from)?.placement.depth;
        let to_depth = self.neuron_or_err(to)?.placement.depth;
        let recurrent = from == to || from_depth > to_depth;

        let weight = rng.random_range(-1.0..=1.0);
        self.links
            .push(LinkGene::new(innovation, from, to, weight, recurrent));
        Ok(Some(innovation))
    }

    fn find_self_loop<R: Rng>(&mut self, attempts: usize, rng: &mut R) -> Option<(NeuronId, NeuronId)> {
        let first_target = self.num_inputs + 1;
        for _ in 0..attempts {
            let pos = rng.random_range(first_target..self.neurons.len());
            let neuron = &self.neurons[pos];
            if neuron.recurrent
                || neuron.neuron_type.is_source_only()
                || self.has_link(neuron.id, neuron.id)
            {
                continue;
            }
            let neuron = &mut self.neurons[pos];
            neuron.recurrent = true;
            return Some((neuron.id, neuron.id));
        }
        None
    }

    fn find_unlinked_pair<R: Rng>(&self, attempts: usize, rng: &mut R) -> Option<(NeuronId, NeuronId)> {
        let first_target = self.num_inputs + 1;
        for _ in 0..attempts {
            let from = &self.neurons[rng.random_range(0..self.neurons.len())];
            let to = &self.neurons[rng.random_range(first_target..self.neurons.len())];

            if from.id == to.id
                || to.neuron_type.is_source_only()
                || self.has_link(from.id, to.id)
            {
                continue;
            }
            return Some((from.id, to.id));
        }
        None
    }

    /// Try to split an enabled link with a new hidden neuron.
    ///
    /// The split link is disabled; a link into the new neuron gets weight 1.0
    /// and the link out of it inherits the old weight, so the network's
    /// response is initially close to unchanged. A split recorded earlier in
    /// the run reuses its neuron id and link innovations unless this genome
    /// already carries that neuron, in which case a fresh innovation is made.
    ///
    /// Returns the id of the added neuron, or `None` when the mutation did not
    /// fire or no eligible link was found.
    ///
    /// # Errors
    ///
    /// - [`NeatError::SplitBetweenOutputs`] if the chosen link joins two outputs
    /// - [`NeatError::HiddenNeuronAtOutputDepth`] if the new neuron would sit on the output layer
    /// - [`NeatError::MissingSplitInnovation`] if a recorded split has no link innovations
    /// - [`NeatError::UnknownNeuron`] if a link references a missing neuron
    pub fn add_neuron_mutation<R: Rng>(
        &mut self,
        mutation_rate: f64,
        registry: &mut InnovationRegistry,
        old_link_attempts: usize,
        rng: &mut R,
    ) -> Result<Option<NeuronId>> {
        if rng.random::<f64>() > mutation_rate || self.links.is_empty() {
            return Ok(None);
        }

        let Some(chosen) = self.pick_link_to_split(old_link_attempts, rng) else {
            debug!("genome {}: no link eligible for splitting", self.id);
            return Ok(None);
        };

        let link = &mut self.links[chosen];
        link.enabled = false;
        let (from, to, weight) = (link.from, link.to, link.weight);

        let placement = self.split_placement(from, to)?;

        let reusable = registry
            .lookup(from, to, InnovationKind::NewNeuron)
            .and_then(|innovation| registry.neuron_id(innovation))
            .filter(|&neuron_id| !self.has_neuron(neuron_id));

        let (neuron_id, into, out_of) = match reusable {
            Some(neuron_id) => {
                let into = registry.lookup(from, neuron_id, InnovationKind::NewLink);
                let out_of = registry.lookup(neuron_id, to, InnovationKind::NewLink);
                let (Some(into), Some(out_of)) = (into, out_of) else {
                    return Err(NeatError::MissingSplitInnovation {
                        from,
                        to,
                        neuron_id,
                    });
                };
                (neuron_id, into, out_of)
            }
            None => {
                let neuron_id = registry.next_neuron_id();
                registry.record_neuron(from, to, NeuronType::Hidden, placement);
                let into = registry.record(from, neuron_id, InnovationKind::NewLink);
                let out_of = registry.record(neuron_id, to, InnovationKind::NewLink);
                (neuron_id, into, out_of)
            }
        };

        self.neurons
            .push(NeuronGene::new(neuron_id, NeuronType::Hidden, placement));
        self.links
            .push(LinkGene::new(into, from, neuron_id, 1.0, false));
        self.links
            .push(LinkGene::new(out_of, neuron_id, to, weight, false));
        self.depth = None;

        Ok(Some(neuron_id))
    }

    /// Placement of a neuron splitting `from -> to`. Output-to-output links
    /// are never picked for splitting, so that error only fires on a
    /// corrupted genome.
    fn split_placement(&self, from: NeuronId, to: NeuronId) -> Result<Placement> {
        let source = self.neuron_or_err(from)?;
        let target = self.neuron_or_err(to)?;
        if source.neuron_type == NeuronType::Output && target.neuron_type == NeuronType::Output {
            return Err(NeatError::SplitBetweenOutputs { from, to });
        }
        let placement = source.placement.midpoint(target.placement);
        if placement.depth == 1.0 {
            return Err(NeatError::HiddenNeuronAtOutputDepth { from, to });
        }
        Ok(placement)
    }

    fn pick_link_to_split<R: Rng>(&self, attempts: usize, rng: &mut R) -> Option<usize> {
        if self.neurons.len() < self.num_inputs + self.num_outputs + SMALL_GENOME_MARGIN {
            // Leave out the newest sqrt(n) links to avoid chaining splits.
            let len = self.links.len();
            let newest = (len as f64).sqrt().floor() as usize;
            let upper = (len - 1).saturating_sub(newest);
            for _ in 0..attempts {
                let idx = rng.random_range(0..=upper);
                if self.is_splittable(&self.links[idx]) {
                    return Some(idx);
                }
            }
            None
        } else {
            let eligible: Vec<usize> = (0..self.links.len())
                .filter(|&idx| self.is_splittable(&self.links[idx]))
                .collect();
            if eligible.is_empty() {
                None
            } else {
                Some(eligible[rng.random_range(0..eligible.len())])
            }
        }
    }

    fn is_splittable(&self, link: &LinkGene) -> bool {
        if !link.enabled || link.recurrent {
            return false;
        }
        let source = self.neuron(link.from).map(|n| n.neuron_type);
        let target = self.neuron(link.to).map(|n| n.neuron_type);
        match (source, target) {
            (Some(NeuronType::Bias), _) => false,
            (Some(NeuronType::Output), Some(NeuronType::Output)) => false,
            (Some(_), Some(_)) => true,
            _ => false,
        }
    }

    /// Mutate link weights.
    ///
    /// Each link mutates with probability `mutation_rate`; a mutated weight is
    /// replaced by a fresh draw from [-1, 1] with probability `replace_chance`,
    /// otherwise nudged by up to `max_perturbation`.
    pub fn mutate_weights<R: Rng>(
        &mut self,
        mutation_rate: f64,
        replace_chance: f64,
        max_perturbation: f64,
        rng: &mut R,
    ) {
        for link in &mut self.links {
            if rng.random::<f64>() < mutation_rate {
                if rng.random::<f64>() < replace_chance {
                    link.weight = rng.random_range(-1.0..=1.0);
                } else {
                    link.weight += rng.random_range(-1.0..=1.0) * max_perturbation;
                }
            }
        }
    }

    /// Nudge each neuron's activation response by up to `max_perturbation`
    /// with probability `mutation_rate`.
    pub fn mutate_activation_response<R: Rng>(
        &mut self,
        mutation_rate: f64,
        max_perturbation: f64,
        rng: &mut R,
    ) {
        for neuron in &mut self.neurons {
            if rng.random::<f64>() < mutation_rate {
                neuron.activation_response += rng.random_range(-1.0..=1.0) * max_perturbation;
            }
        }
    }

    /// Compatibility distance to another genome.
    ///
    /// `c1 * excess / N + c2 * disjoint / N + c3 * mean |weight difference|`
    /// over matched genes, with `N` the larger link count. Both genomes must
    /// have sorted link genes. Two genomes without links are identical.
    #[must_use]
    pub fn compatibility_distance(&self, other: &Genome, config: &NeatConfig) -> f64 {
        let (a, b) = (&self.links, &other.links);
        let mut excess = 0usize;
        let mut disjoint = 0usize;
        let mut matched = 0usize;
        let mut weight_difference = 0.0;

        let (mut i, mut j) = (0, 0);
        while i < a.len() || j < b.len() {
            if i == a.len() {
                excess += 1;
                j += 1;
                continue;
            }
            if j == b.len() {
                excess += 1;
                i += 1;
                continue;
            }
            match a[i].innovation.cmp(&b[j].innovation) {
                Ordering::Equal => {
                    matched += 1;
                    weight_difference += (a[i].weight - b[j].weight).abs();
                    i += 1;
                    j += 1;
                }
                Ordering::Less => {
                    disjoint += 1;
                    i += 1;
                }
                Ordering::Greater => {
                    disjoint += 1;
                    j += 1;
                }
            }
        }

        let longest = a.len().max(b.len());
        if longest == 0 {
            return 0.0;
        }
        let longest = longest as f64;
        let weight_term = if matched > 0 {
            config.compatibility_weight_coeff * weight_difference / matched as f64
        } else {
            0.0
        };

        config.compatibility_excess_coeff * excess as f64 / longest
            + config.compatibility_disjoint_coeff * disjoint as f64 / longest
            + weight_term
    }

    /// Restore innovation order of the link genes.
    pub fn sort_genes(&mut self) {
        self.links.sort_by_key(|l| l.innovation);
    }

    #[must_use]
    pub fn is_sorted(&self) -> bool {
        self.links
            .windows(2)
            .all(|pair| pair[0].innovation <= pair[1].innovation)
    }

    /// Order genomes by descending raw fitness, NaN last.
    #[must_use]
    pub fn cmp_by_fitness(a: &Genome, b: &Genome) -> Ordering {
        match (a.fitness.is_nan(), b.fitness.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => b.fitness.total_cmp(&a.fitness),
        }
    }

    /// Compile the genome into a fresh phenotype, replacing any previous one.
    ///
    /// Uses the stored depth, computing it first if the population has not.
    ///
    /// # Errors
    ///
    /// Returns [`NeatError::UnknownNeuron`] if a link references a missing neuron.
    pub fn create_phenotype(&mut self) -> Result<&mut Network> {
        self.phenotype = None;
        let depth = match self.depth {
            Some(depth) => depth,
            None => {
                let depth = DepthTable::new().net_depth(self);
                self.depth = Some(depth);
                depth
            }
        };
        let network = Network::from_genome(self, depth)?;
        Ok(&mut **self.phenotype.insert(Box::new(network)))
    }

    pub fn delete_phenotype(&mut self) {
        self.phenotype = None;
    }

    #[must_use]
    pub fn phenotype(&self) -> Option<&Network> {
        self.phenotype.as_deref()
    }

    pub fn phenotype_mut(&mut self) -> Option<&mut Network> {
        self.phenotype.as_deref_mut()
    }
}
