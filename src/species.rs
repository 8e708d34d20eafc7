//! Species: niches of structurally similar genomes.
//!
//! A species keeps a copy of its leader (the genome new candidates are
//! measured against) and the indices of its current members in the
//! population's genome list. Members are added in population order, which is
//! sorted by descending fitness, so member 0 is the fittest. Membership only
//! lives inside an epoch: once the offspring replace the population, every
//! species is purged and keeps just its leader.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{FitnessTracking, NeatConfig};
use crate::error::{NeatError, Result};
use crate::gene::SpeciesId;
use crate::genome::Genome;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Species {
    id: SpeciesId,
    leader: Genome,
    members: Vec<usize>,
    best_fitness: f64,
    gens_no_improvement: usize,
    age: usize,
    spawns_required: f64,
}

impl Species {
    /// Found a species with `founder` (at population index `index`) as leader
    /// and sole member.
    #[must_use]
    pub fn new(id: SpeciesId, founder: &Genome, index: usize) -> Self {
        Self {
            id,
            leader: founder.clone(),
            members: vec![index],
            best_fitness: founder.fitness,
            gens_no_improvement: 0,
            age: 0,
            spawns_required: 0.0,
        }
    }

    /// Add the genome at population index `index`.
    ///
    /// The genome becomes leader if its fitness beats the baseline: the
    /// leader's fitness under [`FitnessTracking::ResetEachGeneration`], the
    /// species' best-ever fitness under [`FitnessTracking::Monotonic`].
    /// Returns whether the leader changed.
    pub fn add_member(&mut self, index: usize, genome: &Genome, tracking: FitnessTracking) -> bool {
        self.members.push(index);

        let baseline = match tracking {
            FitnessTracking::ResetEachGeneration => self.leader.fitness,
            FitnessTracking::Monotonic => self.best_fitness,
        };
        if genome.fitness > baseline {
            self.best_fitness = genome.fitness;
            self.gens_no_improvement = 0;
            self.leader = genome.clone();
            true
        } else {
            false
        }
    }

    /// Forget all members; the leader is kept.
    pub fn purge(&mut self) {
        self.members.clear();
    }

    pub fn age_one_generation(&mut self) {
        self.age += 1;
        self.gens_no_improvement += 1;
        self.spawns_required = 0.0;
    }

    /// Write each member's adjusted fitness: raw fitness scaled by the
    /// species' age bonus or penalty, shared among all members.
    pub fn adjust_fitnesses(&self, genomes: &mut [Genome], config: &NeatConfig) {
        let share = self.members.len() as f64;
        for &idx in &self.members {
            let genome = &mut genomes[idx];
            let mut fitness = genome.fitness;
            if self.age < config.young_bonus_age_threshold {
                fitness *= config.young_fitness_bonus;
            }
            if self.age > config.old_age_threshold {
                fitness *= config.old_age_penalty;
            }
            genome.adjusted_fitness = fitness / share;
        }
    }

    /// Sum the members' individual spawn amounts into the species quota.
    pub fn calculate_spawn_amount(&mut self, genomes: &[Genome]) {
        self.spawns_required = self
            .members
            .iter()
            .map(|&idx| genomes[idx].spawn_amount)
            .sum();
    }

    /// Copy a random member from the top `survival_rate` fraction.
    ///
    /// # Errors
    ///
    /// Returns [`NeatError::IndexOutOfBounds`] if the species has no members.
    pub fn spawn<R: Rng>(&self, genomes: &[Genome], survival_rate: f64, rng: &mut R) -> Result<Genome> {
        let len = self.members.len();
        let rank = match len {
            0 => {
                return Err(NeatError::IndexOutOfBounds {
                    collection: "species members",
                    index: 0,
                    len: 0,
                })
            }
            1 => 0,
            _ => {
                let max_rank = ((survival_rate * len as f64) as usize + 1).min(len - 1);
                rng.random_range(0..=max_rank)
            }
        };
        let idx = self.members[rank];
        genomes
            .get(idx)
            .cloned()
            .ok_or(NeatError::IndexOutOfBounds {
                collection: "population",
                index: idx,
                len: genomes.len(),
            })
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> SpeciesId {
        self.id
    }

    #[must_use]
    pub fn leader(&self) -> &Genome {
        &self.leader
    }

    #[inline]
    #[must_use]
    pub fn leader_fitness(&self) -> f64 {
        self.leader.fitness
    }

    #[inline]
    #[must_use]
    pub fn best_fitness(&self) -> f64 {
        self.best_fitness
    }

    #[inline]
    #[must_use]
    pub fn age(&self) -> usize {
        self.age
    }

    #[inline]
    #[must_use]
    pub fn gens_no_improvement(&self) -> usize {
        self.gens_no_improvement
    }

    /// Population indices of the current members, fittest first. Empty
    /// between epochs.
    #[must_use]
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    #[inline]
    #[must_use]
    pub fn num_members(&self) -> usize {
        self.members.len()
    }

    #[inline]
    #[must_use]
    pub fn spawns_required(&self) -> f64 {
        self.spawns_required
    }
}
