//! Population controller.
//!
//! [`Population`] owns the genomes, species, innovation registry and RNG of
//! a run, and advances them one generation per [`Population::epoch`] call:
//!
//! 1. fitness scores are attached to the current genomes
//! 2. genomes are sorted and the best performers archived
//! 3. genomes are assigned to species until species leaders are stable
//! 4. fitness is shared within species and offspring quotas are derived
//! 5. the worst stagnant old species may be culled
//! 6. each species breeds its quota (elite copy, crossover, mutation)
//! 7. rounding shortfalls are filled by tournament selection
//! 8. the new generation is compiled into networks
//!
//! The networks returned by `epoch` borrow the population, so every fitness
//! score has to be collected before the next epoch can run.

use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::{FitnessTracking, NeatConfig, UnderflowMode};
use crate::crossover::crossover;
use crate::depth::DepthTable;
use crate::error::{NeatError, Result};
use crate::gene::{GenomeId, SpeciesId};
use crate::genome::Genome;
use crate::innovation::InnovationRegistry;
use crate::network::Network;
use crate::persistence;
use crate::species::Species;

/// Attempts to find a second, distinct crossover parent.
const PARTNER_ATTEMPTS: usize = 5;
/// Tournament picks per slot when hunting for a genome not yet in the new population.
const ORIGINAL_TOURNAMENT_PICKS: usize = 100;
/// Tournament picks per slot when hunting for a genome not picked earlier in this fill.
const HIGH_MUTATION_UNIQUE_PICKS: usize = 10;

/// A NEAT population and everything needed to evolve it.
#[derive(Debug)]
pub struct Population {
    config: NeatConfig,
    genomes: Vec<Genome>,
    best_genomes: Vec<Genome>,
    hall_of_fame: Vec<Genome>,
    custom_archive: Vec<Genome>,
    species_leaders: Vec<Genome>,
    species: Vec<Species>,
    registry: InnovationRegistry,
    depth_table: DepthTable,
    rng: ChaCha8Rng,
    generation: usize,
    next_genome_id: GenomeId,
    next_species_id: SpeciesId,
    compatibility_threshold: f64,
    best_ever_fitness: f64,
    total_adjusted_fitness: f64,
    average_adjusted_fitness: f64,
}

impl Population {
    /// Seed a population of minimal genomes with random weights.
    ///
    /// No phenotypes exist yet; call [`create_phenotypes`](Self::create_phenotypes)
    /// to get the first generation's networks.
    ///
    /// # Errors
    ///
    /// Returns [`NeatError::Config`] if the configuration is invalid.
    pub fn new(config: NeatConfig) -> Result<Self> {
        config.validate()?;

        let mut rng = match config.random_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_rng(&mut rand::rng()),
        };

        let genomes: Vec<Genome> = (0..config.population_size)
            .map(|id| Genome::minimal(id as GenomeId, config.num_inputs, config.num_outputs, &mut rng))
            .collect();
        let registry = InnovationRegistry::from_genome(&genomes[0]);
        let compatibility_threshold = config.clamp_threshold(config.compatibility_threshold);

        info!(
            "seeded population of {} genomes ({} inputs, {} outputs)",
            genomes.len(),
            config.num_inputs,
            config.num_outputs
        );

        Ok(Self {
            next_genome_id: genomes.len() as GenomeId,
            genomes,
            best_genomes: Vec::new(),
            hall_of_fame: Vec::new(),
            custom_archive: Vec::new(),
            species_leaders: Vec::new(),
            species: Vec::new(),
            registry,
            depth_table: DepthTable::new(),
            rng,
            generation: 0,
            next_species_id: 0,
            compatibility_threshold,
            best_ever_fitness: 0.0,
            total_adjusted_fitness: 0.0,
            average_adjusted_fitness: 0.0,
            config,
        })
    }

    /// Compile every genome of the current generation.
    ///
    /// # Errors
    ///
    /// Returns [`NeatError::UnknownNeuron`] if a genome is malformed.
    pub fn create_phenotypes(&mut self) -> Result<Vec<&mut Network>> {
        compile_all(&mut self.genomes, &self.depth_table)
    }

    /// Networks compiled for the current generation, in population order.
    pub fn phenotypes_mut(&mut self) -> Vec<&mut Network> {
        self.genomes
            .iter_mut()
            .filter_map(Genome::phenotype_mut)
            .collect()
    }

    /// Advance one generation.
    ///
    /// `fitness[i]` scores the i-th genome (the i-th network handed out by the
    /// previous epoch or by [`create_phenotypes`](Self::create_phenotypes)).
    /// Returns the networks of the new generation.
    ///
    /// # Errors
    ///
    /// - [`NeatError::FitnessLengthMismatch`] if `fitness` does not match the population
    /// - [`NeatError::SpeciationDiverged`] if species leaders never settle
    /// - [`NeatError::PopulationSizeMismatch`] if the new generation has the wrong size
    /// - [`NeatError::DuplicateGenomeId`] if two new genomes share an id
    /// - any structural error raised while breeding
    pub fn epoch(&mut self, fitness: &[f64]) -> Result<Vec<&mut Network>> {
        if fitness.len() != self.genomes.len() {
            error!(
                "epoch received {} fitness scores for {} genomes",
                fitness.len(),
                self.genomes.len()
            );
            return Err(NeatError::FitnessLengthMismatch {
                expected: self.genomes.len(),
                got: fitness.len(),
            });
        }

        for species in &mut self.species {
            species.purge();
            species.age_one_generation();
        }

        for (genome, &score) in self.genomes.iter_mut().zip(fitness) {
            genome.delete_phenotype();
            genome.fitness = score;
        }

        self.sort_and_record();
        self.speciate()?;
        self.calculate_spawn_levels();
        self.kill_worst_old_species();

        let mut offspring = self.reproduce()?;
        self.trim_overflow(&mut offspring);
        self.fill_underflow(&mut offspring)?;
        check_new_population(&offspring, self.config.population_size)?;

        self.genomes = offspring;
        self.generation += 1;
        // Member indices point into the generation just replaced.
        for species in &mut self.species {
            species.purge();
        }

        info!(
            "generation {}: {} species, best fitness {:.4}, threshold {:.3}",
            self.generation,
            self.species.len(),
            self.best_ever_fitness,
            self.compatibility_threshold
        );

        compile_all(&mut self.genomes, &self.depth_table)
    }

    fn sort_and_record(&mut self) {
        self.genomes.sort_by(Genome::cmp_by_fitness);

        if let Some(best) = self.genomes.first().map(|g| g.fitness) {
            match self.config.effective_fitness_tracking() {
                FitnessTracking::ResetEachGeneration => {
                    self.best_ever_fitness = best;
                }
                FitnessTracking::Monotonic => {
                    if best > self.best_ever_fitness {
                        self.best_ever_fitness = best;
                    }
                }
            }
        }

        let keep = self
            .config
            .best_genomes_to_keep
            .unwrap_or(self.genomes.len())
            .min(self.genomes.len());
        self.best_genomes = self.genomes[..keep].to_vec();

        if !self.config.manual_hall_of_fame {
            if let Some(best) = self.best_genomes.first() {
                self.hall_of_fame.push(best.clone());
            }
        }
    }

    /// Assign every genome to the first species whose leader is within the
    /// compatibility threshold, founding new species as needed, and repeat
    /// until no leader changes and no species is founded.
    fn speciate(&mut self) -> Result<()> {
        let tracking = self.config.effective_fitness_tracking();
        let limit = self.config.speciation_pass_limit;
        let mut passes = 0;

        loop {
            passes += 1;
            if passes > limit {
                error!("speciation still unsettled after {limit} passes");
                return Err(NeatError::SpeciationDiverged { passes: limit });
            }

            for species in &mut self.species {
                species.purge();
            }

            let mut unsettled = false;
            for idx in 0..self.genomes.len() {
                let genome = &self.genomes[idx];
                let compatible = self.species.iter().position(|species| {
                    genome.compatibility_distance(species.leader(), &self.config)
                        <= self.compatibility_threshold
                });

                let species_id = match compatible {
                    Some(pos) => {
                        if self.species[pos].add_member(idx, genome, tracking) {
                            unsettled = true;
                        }
                        self.species[pos].id()
                    }
                    None => {
                        let id = self.next_species_id;
                        self.next_species_id += 1;
                        debug!("genome {} founds species {id}", genome.id());
                        self.species.push(Species::new(id, genome, idx));
                        unsettled = true;
                        id
                    }
                };
                self.genomes[idx].species = Some(species_id);
            }

            if !unsettled {
                break;
            }
        }

        self.species.retain(|species| species.num_members() > 0);
        debug!(
            "speciation settled after {passes} passes into {} species",
            self.species.len()
        );
        Ok(())
    }

    fn calculate_spawn_levels(&mut self) {
        for species in &self.species {
            species.adjust_fitnesses(&mut self.genomes, &self.config);
        }

        self.total_adjusted_fitness = self.genomes.iter().map(|g| g.adjusted_fitness).sum();
        self.average_adjusted_fitness = self.total_adjusted_fitness / self.genomes.len() as f64;

        let average = self.average_adjusted_fitness;
        let degenerate = !(average.is_finite() && average > 0.0);
        if degenerate {
            warn!("average adjusted fitness is {average}; spawning uniformly");
        }
        for genome in &mut self.genomes {
            genome.spawn_amount = if degenerate {
                1.0
            } else {
                genome.adjusted_fitness / average
            };
        }

        for species in &mut self.species {
            species.calculate_spawn_amount(&self.genomes);
        }
    }

    /// Remove the worst old species that trails the best-ever fitness. A
    /// lone species is never culled.
    fn kill_worst_old_species(&mut self) {
        if self.species.len() <= 1 {
            return;
        }

        let mut worst_seen = self.species[0].best_fitness() + 1.0;
        let mut doomed = None;
        for (pos, species) in self.species.iter().enumerate() {
            if species.age() > self.config.kill_worst_species_age
                && species.best_fitness() < worst_seen
                && species.best_fitness() < self.best_ever_fitness
            {
                worst_seen = species.best_fitness();
                doomed = Some(pos);
            }
        }

        if let Some(pos) = doomed {
            let culled = self.species.remove(pos);
            debug!(
                "culled species {} (age {}, best fitness {:.4})",
                culled.id(),
                culled.age(),
                culled.best_fitness()
            );
        }
    }

    fn reproduce(&mut self) -> Result<Vec<Genome>> {
        let target = self.config.population_size;
        let mut offspring: Vec<Genome> = Vec::with_capacity(target);

        'species: for s_idx in 0..self.species.len() {
            if offspring.len() >= target {
                break;
            }

            let quota = self.species[s_idx].spawns_required().round() as usize;
            for nth in 0..quota {
                let mut baby = if nth == 0 {
                    let mut elite = self.species[s_idx].leader().clone();
                    if offspring.iter().any(|g| g.id() == elite.id()) {
                        let id = self.take_genome_id();
                        debug!("leader {} already copied; elite gets id {id}", elite.id());
                        elite.set_id(id);
                    }
                    elite
                } else {
                    let mut baby = self.breed(s_idx)?;
                    let id = self.take_genome_id();
                    baby.set_id(id);
                    mutate_offspring(&mut baby, &self.config, &mut self.registry, &mut self.rng, 1.0)?;
                    baby
                };
                baby.sort_genes();
                offspring.push(baby);

                if offspring.len() == target {
                    break 'species;
                }
            }
        }

        Ok(offspring)
    }

    /// One unmutated child of species `s_idx`: a copy of a top member, or a
    /// crossover of two distinct top members.
    fn breed(&mut self, s_idx: usize) -> Result<Genome> {
        let species = &self.species[s_idx];
        let survival = self.config.survival_rate;

        if species.num_members() == 1 {
            return species.spawn(&self.genomes, survival, &mut self.rng);
        }

        let mum = species.spawn(&self.genomes, survival, &mut self.rng)?;
        if self.rng.random::<f64>() >= self.config.crossover_rate {
            return Ok(mum);
        }

        let mut dad = species.spawn(&self.genomes, survival, &mut self.rng)?;
        let mut attempts = PARTNER_ATTEMPTS;
        while dad.id() == mum.id() && attempts > 0 {
            dad = species.spawn(&self.genomes, survival, &mut self.rng)?;
            attempts -= 1;
        }

        if dad.id() == mum.id() {
            debug!("species {}: no distinct partner for genome {}", species.id(), mum.id());
            return Ok(mum);
        }
        crossover(&mum, &dad, &self.registry, mum.id(), &mut self.rng)
    }

    fn trim_overflow(&mut self, offspring: &mut Vec<Genome>) {
        let target = self.config.population_size;
        if offspring.len() > target {
            warn!("{} offspring for {} slots; culling at random", offspring.len(), target);
        }
        while offspring.len() > target {
            let idx = self.rng.random_range(0..offspring.len());
            offspring.remove(idx);
        }
    }

    fn fill_underflow(&mut self, offspring: &mut Vec<Genome>) -> Result<()> {
        let target = self.config.population_size;
        if offspring.len() >= target || self.genomes.is_empty() {
            return Ok(());
        }

        let missing = target - offspring.len();
        warn!(
            "{missing} slots left after reproduction; filling with {:?}",
            self.config.underflow_mode
        );

        let tournament_size = self.config.underflow_tournament_size();
        match self.config.underflow_mode {
            UnderflowMode::OriginalTournament => {
                for _ in 0..missing {
                    for _ in 0..ORIGINAL_TOURNAMENT_PICKS {
                        let pick = self.tournament(tournament_size);
                        let candidate = &self.genomes[pick];
                        if offspring.iter().all(|g| g.id() != candidate.id()) {
                            debug!("tournament fill adds genome {}", candidate.id());
                            offspring.push(candidate.clone());
                            break;
                        }
                    }
                }
            }
            UnderflowMode::HighMutationTournament => {
                let mut picked: Vec<GenomeId> = Vec::with_capacity(missing);
                let multiplier = self.config.underflow_mutation_multiplier;
                for _ in 0..missing {
                    let mut pick = self.tournament(tournament_size);
                    for _ in 1..HIGH_MUTATION_UNIQUE_PICKS {
                        if !picked.contains(&self.genomes[pick].id()) {
                            break;
                        }
                        pick = self.tournament(tournament_size);
                    }
                    picked.push(self.genomes[pick].id());

                    let mut baby = self.genomes[pick].clone();
                    let id = self.take_genome_id();
                    debug!("high-mutation fill: genome {} -> {id}", baby.id());
                    baby.set_id(id);
                    mutate_offspring(
                        &mut baby,
                        &self.config,
                        &mut self.registry,
                        &mut self.rng,
                        multiplier,
                    )?;
                    offspring.push(baby);
                }
            }
        }
        Ok(())
    }

    /// Index of the fittest of `comparisons` random draws from the current generation.
    fn tournament(&mut self, comparisons: usize) -> usize {
        let len = self.genomes.len();
        let mut chosen = self.rng.random_range(0..len);
        for _ in 1..comparisons {
            let challenger = self.rng.random_range(0..len);
            if self.genomes[challenger].fitness > self.genomes[chosen].fitness {
                chosen = challenger;
            }
        }
        chosen
    }

    fn take_genome_id(&mut self) -> GenomeId {
        let id = self.next_genome_id;
        self.next_genome_id += 1;
        id
    }

    /// Compile the first `count` genomes of last generation's best snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`NeatError::IndexOutOfBounds`] if fewer genomes were kept.
    pub fn best_phenotypes_from_last_generation(&mut self, count: usize) -> Result<Vec<&mut Network>> {
        if count > self.best_genomes.len() {
            return Err(NeatError::IndexOutOfBounds {
                collection: "best genomes",
                index: count,
                len: self.best_genomes.len(),
            });
        }
        compile_all(&mut self.best_genomes[..count], &self.depth_table)
    }

    /// Drop the phenotypes of the first `count` best genomes.
    pub fn clear_best_phenotypes(&mut self, count: usize) {
        for genome in self.best_genomes.iter_mut().take(count) {
            genome.delete_phenotype();
        }
    }

    /// Compile the best genome of last generation.
    ///
    /// # Errors
    ///
    /// Returns [`NeatError::IndexOutOfBounds`] before the first epoch.
    pub fn single_best_phenotype(&mut self) -> Result<&mut Network> {
        let len = self.best_genomes.len();
        let best = self.best_genomes.first_mut().ok_or(NeatError::IndexOutOfBounds {
            collection: "best genomes",
            index: 0,
            len,
        })?;
        let depth = self.depth_table.net_depth(best);
        best.set_depth(depth);
        best.create_phenotype()
    }

    /// Number of genomes tied with last generation's top fitness.
    #[must_use]
    pub fn number_sharing_top_fitness(&self) -> usize {
        let Some(top) = self.best_genomes.first().map(|g| g.fitness) else {
            return 0;
        };
        self.best_genomes
            .iter()
            .take_while(|g| g.fitness == top)
            .count()
    }

    /// Compile every hall-of-fame genome.
    ///
    /// # Errors
    ///
    /// Returns [`NeatError::UnknownNeuron`] if a genome is malformed.
    pub fn hall_of_fame_phenotypes(&mut self) -> Result<Vec<&mut Network>> {
        compile_all(&mut self.hall_of_fame, &self.depth_table)
    }

    /// Compile every custom-archive genome.
    ///
    /// # Errors
    ///
    /// Returns [`NeatError::UnknownNeuron`] if a genome is malformed.
    pub fn custom_archive_phenotypes(&mut self) -> Result<Vec<&mut Network>> {
        compile_all(&mut self.custom_archive, &self.depth_table)
    }

    /// Snapshot every species' leader and compile them.
    ///
    /// # Errors
    ///
    /// Returns [`NeatError::UnknownNeuron`] if a genome is malformed.
    pub fn leader_phenotypes(&mut self) -> Result<Vec<&mut Network>> {
        self.species_leaders = self.species.iter().map(|s| s.leader().clone()).collect();
        compile_all(&mut self.species_leaders, &self.depth_table)
    }

    /// Genome at `index` of the current generation.
    ///
    /// # Errors
    ///
    /// Returns [`NeatError::IndexOutOfBounds`] for an invalid index.
    pub fn genome(&self, index: usize) -> Result<&Genome> {
        self.genomes.get(index).ok_or(NeatError::IndexOutOfBounds {
            collection: "population",
            index,
            len: self.genomes.len(),
        })
    }

    /// Copy the genome at `index` into the custom archive.
    ///
    /// # Errors
    ///
    /// Fails if `index` is out of bounds or the genome there is not `genome_id`.
    pub fn add_to_custom_archive(&mut self, index: usize, genome_id: GenomeId) -> Result<()> {
        let genome = self.checked_genome(index, genome_id)?.clone();
        self.custom_archive.push(genome);
        Ok(())
    }

    pub fn clear_custom_archive(&mut self) {
        self.custom_archive.clear();
    }

    pub fn set_manual_hall_of_fame(&mut self, manual: bool) {
        self.config.manual_hall_of_fame = manual;
    }

    /// Copy the genome at `index` into the hall of fame.
    ///
    /// # Errors
    ///
    /// - [`NeatError::HallOfFameNotManual`] unless manual control is enabled
    /// - [`NeatError::IndexOutOfBounds`] / [`NeatError::GenomeIdMismatch`] for a bad index or id
    pub fn add_to_hall_of_fame(&mut self, index: usize, genome_id: GenomeId) -> Result<()> {
        if !self.config.manual_hall_of_fame {
            return Err(NeatError::HallOfFameNotManual);
        }
        let genome = self.checked_genome(index, genome_id)?.clone();
        self.hall_of_fame.push(genome);
        Ok(())
    }

    fn checked_genome(&self, index: usize, genome_id: GenomeId) -> Result<&Genome> {
        let genome = self.genome(index)?;
        if genome.id() != genome_id {
            return Err(NeatError::GenomeIdMismatch {
                index,
                expected: genome_id,
                actual: genome.id(),
            });
        }
        Ok(genome)
    }

    /// Save a genome found in the population, the hall of fame or the best
    /// snapshot, in that order, as `<path>.dna`. Returns the written path.
    ///
    /// # Errors
    ///
    /// Returns [`NeatError::GenomeNotFound`] if no genome has that id, or
    /// [`NeatError::Io`] if writing fails.
    pub fn write_genome_to_file(&mut self, genome_id: GenomeId, path: impl AsRef<Path>) -> Result<PathBuf> {
        let table = &self.depth_table;
        let genome = self
            .genomes
            .iter_mut()
            .chain(self.hall_of_fame.iter_mut())
            .chain(self.best_genomes.iter_mut())
            .find(|g| g.id() == genome_id)
            .ok_or(NeatError::GenomeNotFound { genome_id })?;
        let depth = table.net_depth(genome);
        genome.set_depth(depth);
        info!("saving genome {genome_id} to {}", path.as_ref().display());
        persistence::save(genome, path)
    }

    /// Save every hall-of-fame genome as `<dir>/<descriptor>_<id>.dna`.
    ///
    /// # Errors
    ///
    /// Returns [`NeatError::Io`] if any write fails.
    pub fn dump_hall_of_fame(&mut self, dir: impl AsRef<Path>, descriptor: &str) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        let mut written = Vec::with_capacity(self.hall_of_fame.len());
        for genome in &mut self.hall_of_fame {
            let depth = self.depth_table.net_depth(genome);
            genome.set_depth(depth);
            let path = dir.join(format!("{descriptor}_{}", genome.id()));
            written.push(persistence::save(genome, path)?);
        }
        Ok(written)
    }

    /// Set the compatibility threshold, clamped to the configured bounds.
    pub fn set_compatibility_threshold(&mut self, threshold: f64) {
        self.compatibility_threshold = self.config.clamp_threshold(threshold);
    }

    #[must_use]
    pub fn compatibility_threshold(&self) -> f64 {
        self.compatibility_threshold
    }

    pub fn set_xor_test_mode(&mut self, enabled: bool) {
        self.config.xor_test_mode = enabled;
    }

    #[must_use]
    pub fn config(&self) -> &NeatConfig {
        &self.config
    }

    #[must_use]
    pub fn genomes(&self) -> &[Genome] {
        &self.genomes
    }

    #[must_use]
    pub fn species(&self) -> &[Species] {
        &self.species
    }

    #[must_use]
    pub fn num_species(&self) -> usize {
        self.species.len()
    }

    #[must_use]
    pub fn best_genomes(&self) -> &[Genome] {
        &self.best_genomes
    }

    #[must_use]
    pub fn hall_of_fame(&self) -> &[Genome] {
        &self.hall_of_fame
    }

    #[must_use]
    pub fn num_hall_of_famers(&self) -> usize {
        self.hall_of_fame.len()
    }

    #[must_use]
    pub fn custom_archive(&self) -> &[Genome] {
        &self.custom_archive
    }

    #[must_use]
    pub fn num_custom_archived(&self) -> usize {
        self.custom_archive.len()
    }

    #[must_use]
    pub fn registry(&self) -> &InnovationRegistry {
        &self.registry
    }

    #[must_use]
    pub fn generation(&self) -> usize {
        self.generation
    }

    #[must_use]
    pub fn best_ever_fitness(&self) -> f64 {
        self.best_ever_fitness
    }

    #[must_use]
    pub fn total_adjusted_fitness(&self) -> f64 {
        self.total_adjusted_fitness
    }

    #[must_use]
    pub fn average_adjusted_fitness(&self) -> f64 {
        self.average_adjusted_fitness
    }
}

/// Apply one round of structural and parametric mutation, with every rate
/// scaled by `scale`.
fn mutate_offspring<R: Rng>(
    baby: &mut Genome,
    config: &NeatConfig,
    registry: &mut InnovationRegistry,
    rng: &mut R,
    scale: f64,
) -> Result<()> {
    if baby.num_neurons() < config.max_permitted_neurons {
        baby.add_neuron_mutation(
            scale * config.chance_add_node,
            registry,
            config.old_link_attempts,
            rng,
        )?;
    }

    baby.add_link_mutation(
        scale * config.chance_add_link,
        scale * config.effective_recurrent_chance(),
        registry,
        config.looped_link_attempts,
        config.add_link_attempts,
        rng,
    )?;

    baby.mutate_weights(
        scale * config.weight_mutation_rate,
        config.probability_weight_replaced,
        config.max_weight_perturbation,
        rng,
    );
    baby.mutate_activation_response(
        scale * config.activation_mutation_rate,
        config.max_activation_perturbation,
        rng,
    );
    baby.sort_genes();
    Ok(())
}

fn compile_all<'a>(genomes: &'a mut [Genome], table: &DepthTable) -> Result<Vec<&'a mut Network>> {
    let mut networks = Vec::with_capacity(genomes.len());
    for genome in genomes.iter_mut() {
        let depth = table.net_depth(genome);
        genome.set_depth(depth);
        networks.push(genome.create_phenotype()?);
    }
    Ok(networks)
}

fn check_new_population(genomes: &[Genome], expected: usize) -> Result<()> {
    if genomes.len() != expected {
        error!("new population holds {} genomes, expected {expected}", genomes.len());
        return Err(NeatError::PopulationSizeMismatch {
            expected,
            actual: genomes.len(),
        });
    }

    let mut ids: Vec<GenomeId> = genomes.iter().map(Genome::id).collect();
    ids.sort_unstable();
    if let Some(pair) = ids.windows(2).find(|pair| pair[0] == pair[1]) {
        error!("new population contains genome {} twice", pair[0]);
        return Err(NeatError::DuplicateGenomeId { genome_id: pair[0] });
    }
    Ok(())
}
