//! Global innovation tracking for NEAT.
//!
//! Every structural change (a new link between two neurons, or a new neuron
//! splitting a link) is recorded once per run. Genomes that independently make
//! the same change receive the same historical marking, which is what lets
//! crossover align genes and speciation measure structural distance.
//!
//! The registry is an explicit context object: the population owns one and
//! passes it by `&mut` into every mutation that may create structure.

use serde::{Deserialize, Serialize};

use crate::gene::{InnovationId, NeuronGene, NeuronId, NeuronType, Placement};
use crate::genome::Genome;

/// Kind of structural change an innovation records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InnovationKind {
    NewNeuron,
    NewLink,
}

/// One recorded innovation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Innovation {
    pub kind: InnovationKind,
    pub id: InnovationId,
    /// Link endpoints, or the endpoints of the link that was split. Neurons
    /// seeded from the starting genome have none.
    pub endpoints: Option<(NeuronId, NeuronId)>,
    /// Neuron allocated by a [`InnovationKind::NewNeuron`] record.
    pub neuron_id: Option<NeuronId>,
    /// Role of the allocated neuron. `None` for link records.
    pub role: Option<NeuronType>,
    pub placement: Placement,
}

/// Append-only log of innovations, shared by every genome in a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InnovationRegistry {
    records: Vec<Innovation>,
    next_innovation: InnovationId,
    next_neuron_id: NeuronId,
}

impl InnovationRegistry {
    /// Create an empty registry with both counters at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a registry from the starting genome.
    ///
    /// Every neuron is recorded first, in gene order, so the n-th neuron gets
    /// innovation n and neuron id n. The seed links follow.
    #[must_use]
    pub fn from_genome(genome: &Genome) -> Self {
        let mut registry = Self::new();

        for neuron in genome.neurons() {
            let id = registry.next_innovation;
            registry.records.push(Innovation {
                kind: InnovationKind::NewNeuron,
                id,
                endpoints: None,
                neuron_id: Some(registry.next_neuron_id),
                role: Some(neuron.neuron_type),
                placement: neuron.placement,
            });
            registry.next_innovation += 1;
            registry.next_neuron_id += 1;
        }

        for link in genome.links() {
            registry.record(link.from, link.to, InnovationKind::NewLink);
        }

        registry
    }

    /// Find the innovation for a structural change.
    ///
    /// Scans in recording order, so the earliest record for a tuple wins.
    #[must_use]
    pub fn lookup(&self, from: NeuronId, to: NeuronId, kind: InnovationKind) -> Option<InnovationId> {
        self.records
            .iter()
            .find(|rec| rec.kind == kind && rec.endpoints == Some((from, to)))
            .map(|rec| rec.id)
    }

    /// Record a new innovation and return its number.
    ///
    /// A [`InnovationKind::NewNeuron`] record also allocates the next neuron
    /// id. Recording does not check for an existing record of the same tuple;
    /// callers use [`lookup`](Self::lookup) first.
    pub fn record(&mut self, from: NeuronId, to: NeuronId, kind: InnovationKind) -> InnovationId {
        let role = match kind {
            InnovationKind::NewNeuron => Some(NeuronType::Hidden),
            InnovationKind::NewLink => None,
        };
        self.push(from, to, kind, role, Placement::default())
    }

    /// Record a new neuron split with its role and placement.
    pub fn record_neuron(
        &mut self,
        from: NeuronId,
        to: NeuronId,
        role: NeuronType,
        placement: Placement,
    ) -> InnovationId {
        self.push(from, to, InnovationKind::NewNeuron, Some(role), placement)
    }

    fn push(
        &mut self,
        from: NeuronId,
        to: NeuronId,
        kind: InnovationKind,
        role: Option<NeuronType>,
        placement: Placement,
    ) -> InnovationId {
        let id = self.next_innovation;
        let neuron_id = match kind {
            InnovationKind::NewNeuron => {
                let neuron_id = self.next_neuron_id;
                self.next_neuron_id += 1;
                Some(neuron_id)
            }
            InnovationKind::NewLink => None,
        };
        self.records.push(Innovation {
            kind,
            id,
            endpoints: Some((from, to)),
            neuron_id,
            role,
            placement,
        });
        self.next_innovation += 1;
        id
    }

    /// Neuron allocated by a neuron innovation.
    #[must_use]
    pub fn neuron_id(&self, innovation: InnovationId) -> Option<NeuronId> {
        self.records
            .iter()
            .find(|rec| rec.id == innovation)
            .and_then(|rec| rec.neuron_id)
    }

    /// Fresh gene for a recorded neuron: its role and placement, no self-loop,
    /// unit activation response.
    #[must_use]
    pub fn neuron_template(&self, neuron_id: NeuronId) -> Option<NeuronGene> {
        self.records
            .iter()
            .find(|rec| rec.neuron_id == Some(neuron_id))
            .map(|rec| {
                NeuronGene::new(
                    neuron_id,
                    rec.role.unwrap_or(NeuronType::Hidden),
                    rec.placement,
                )
            })
    }

    /// Skip `n` innovation numbers and return the next number to be assigned.
    pub fn reserve_range(&mut self, n: u64) -> InnovationId {
        self.next_innovation += n;
        self.next_innovation
    }

    /// Drop every record and reset both counters.
    pub fn reset(&mut self) {
        self.records.clear();
        self.next_innovation = 0;
        self.next_neuron_id = 0;
    }

    #[inline]
    #[must_use]
    pub fn next_innovation(&self) -> InnovationId {
        self.next_innovation
    }

    #[inline]
    #[must_use]
    pub fn next_neuron_id(&self) -> NeuronId {
        self.next_neuron_id
    }

    #[must_use]
    pub fn records(&self) -> &[Innovation] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
