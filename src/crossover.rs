//! Innovation-aligned crossover.

use std::cmp::Ordering;

use log::trace;
use rand::Rng;

use crate::error::{NeatError, Result};
use crate::gene::{GenomeId, LinkGene, NeuronId};
use crate::genome::Genome;
use crate::innovation::InnovationRegistry;

/// Which parent carries the structure the child inherits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Parent {
    Mum,
    Dad,
}

/// Breed a child from two parents with sorted link genes.
///
/// The fitter parent is the one with higher raw fitness; ties go to the
/// parent with fewer links, then to a coin flip. Matched genes are inherited
/// from either parent at random, disjoint and excess genes only from the
/// fitter parent. The child's neurons are rebuilt from the registry's
/// templates for every neuron its links reference.
///
/// # Errors
///
/// Returns [`NeatError::UnknownNeuronTemplate`] if a referenced neuron was
/// never recorded in `registry`.
pub fn crossover<R: Rng>(
    mum: &Genome,
    dad: &Genome,
    registry: &InnovationRegistry,
    child_id: GenomeId,
    rng: &mut R,
) -> Result<Genome> {
    let best = fitter_parent(mum, dad, rng);
    let (mum_links, dad_links) = (mum.links(), dad.links());

    let mut links: Vec<LinkGene> = Vec::with_capacity(mum_links.len().max(dad_links.len()));
    let mut neuron_ids: Vec<NeuronId> = Vec::with_capacity(mum.num_neurons().max(dad.num_neurons()));

    let (mut i, mut j) = (0, 0);
    while i < mum_links.len() || j < dad_links.len() {
        let selected = match (mum_links.get(i), dad_links.get(j)) {
            (Some(m), None) => {
                i += 1;
                (best == Parent::Mum).then_some(m)
            }
            (None, Some(d)) => {
                j += 1;
                (best == Parent::Dad).then_some(d)
            }
            (Some(m), Some(d)) => match m.innovation.cmp(&d.innovation) {
                Ordering::Less => {
                    i += 1;
                    (best == Parent::Mum).then_some(m)
                }
                Ordering::Greater => {
                    j += 1;
                    (best == Parent::Dad).then_some(d)
                }
                Ordering::Equal => {
                    i += 1;
                    j += 1;
                    Some(if rng.random::<bool>() { m } else { d })
                }
            },
            (None, None) => break,
        };

        let Some(gene) = selected else { continue };
        if links.last().is_some_and(|last| last.innovation == gene.innovation) {
            continue;
        }
        neuron_ids.push(gene.from);
        neuron_ids.push(gene.to);
        links.push(gene.clone());
    }

    neuron_ids.sort_unstable();
    neuron_ids.dedup();

    let neurons = neuron_ids
        .into_iter()
        .map(|neuron_id| {
            registry
                .neuron_template(neuron_id)
                .ok_or(NeatError::UnknownNeuronTemplate { neuron_id })
        })
        .collect::<Result<Vec<_>>>()?;

    trace!(
        "crossover {} x {} -> {} ({} links)",
        mum.id(),
        dad.id(),
        child_id,
        links.len()
    );

    Ok(Genome::from_genes(
        child_id,
        neurons,
        links,
        mum.num_inputs(),
        mum.num_outputs(),
    ))
}

fn fitter_parent<R: Rng>(mum: &Genome, dad: &Genome, rng: &mut R) -> Parent {
    if mum.fitness == dad.fitness {
        match mum.num_links().cmp(&dad.num_links()) {
            Ordering::Less => Parent::Mum,
            Ordering::Greater => Parent::Dad,
            Ordering::Equal => {
                if rng.random::<bool>() {
                    Parent::Mum
                } else {
                    Parent::Dad
                }
            }
        }
    } else if mum.fitness > dad.fitness {
        Parent::Mum
    } else {
        Parent::Dad
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gene::{NeuronGene, NeuronType, Placement};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    fn test_rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    /// Registry knowing neurons 0..=5, parents wired from those.
    fn setup() -> (InnovationRegistry, Genome, Genome) {
        let mut registry = InnovationRegistry::new();
        for n in 0..6 {
            registry.record_neuron(100, 100 + n, NeuronType::Hidden, Placement::new(0.5, 0.5));
        }
        let neuron = |id| NeuronGene::new(id, NeuronType::Hidden, Placement::new(0.5, 0.5));

        let mum = Genome::from_genes(
            1,
            (0..4).map(neuron).collect(),
            vec![
                LinkGene::new(1, 0, 1, 0.1, false),
                LinkGene::new(2, 1, 2, 0.2, false),
                LinkGene::new(3, 2, 3, 0.3, false),
            ],
            0,
            0,
        );
        let dad = Genome::from_genes(
            2,
            [0, 1, 2, 4, 5].into_iter().map(neuron).collect(),
            vec![
                LinkGene::new(1, 0, 1, -0.1, false),
                LinkGene::new(2, 1, 2, -0.2, false),
                LinkGene::new(4, 2, 4, -0.4, false),
                LinkGene::new(5, 4, 5, -0.5, false),
            ],
            0,
            0,
        );
        (registry, mum, dad)
    }

    #[test]
    fn test_fitter_parent_structure_wins() {
        let mut rng = test_rng();
        let (registry, mut mum, dad) = setup();
        mum.fitness = 5.0;

        for _ in 0..20 {
            let child = crossover(&mum, &dad, &registry, 10, &mut rng).unwrap();
            let innovations: Vec<_> = child.links().iter().map(|l| l.innovation).collect();
            assert_eq!(innovations, vec![1, 2, 3]);
            assert_eq!(child.id(), 10);
            let ids: Vec<_> = child.neurons().iter().map(|n| n.id).collect();
            assert_eq!(ids, vec![0, 1, 2, 3]);
        }
    }

    #[test]
    fn test_tie_prefers_fewer_links() {
        let mut rng = test_rng();
        let (registry, mum, dad) = setup();
        // Equal fitness: mum has 3 links, dad 4.
        let child = crossover(&mum, &dad, &registry, 10, &mut rng).unwrap();
        let innovations: Vec<_> = child.links().iter().map(|l| l.innovation).collect();
        assert_eq!(innovations, vec![1, 2, 3]);
    }

    #[test]
    fn test_matched_genes_come_from_either_parent() {
        let mut rng = test_rng();
        let (registry, mum, mut dad) = setup();
        dad.fitness = 1.0;

        let mut seen = HashSet::new();
        for _ in 0..50 {
            let child = crossover(&mum, &dad, &registry, 10, &mut rng).unwrap();
            let innovations: Vec<_> = child.links().iter().map(|l| l.innovation).collect();
            assert_eq!(innovations, vec![1, 2, 4, 5]);
            seen.insert(child.links()[0].weight.to_bits());
        }
        assert_eq!(seen.len(), 2, "both parents' weights should be inherited");
    }

    #[test]
    fn test_child_contained_in_parents() {
        let mut rng = test_rng();
        let (registry, mum, dad) = setup();
        let parent_innovations: HashSet<_> = mum
            .links()
            .iter()
            .chain(dad.links())
            .map(|l| l.innovation)
            .collect();

        for _ in 0..20 {
            let child = crossover(&mum, &dad, &registry, 10, &mut rng).unwrap();
            assert!(child.is_sorted());
            for link in child.links() {
                assert!(parent_innovations.contains(&link.innovation));
                assert!(child.has_neuron(link.from));
                assert!(child.has_neuron(link.to));
            }
        }
    }

    #[test]
    fn test_missing_template_is_fatal() {
        let mut rng = test_rng();
        let (_, mut mum, dad) = setup();
        mum.fitness = 1.0;
        let empty = InnovationRegistry::new();
        let err = crossover(&mum, &dad, &empty, 10, &mut rng).unwrap_err();
        assert!(matches!(err, NeatError::UnknownNeuronTemplate { neuron_id: 0 }));
    }
}
