//! Network depth inference from neuron placements.
//!
//! Hidden neurons are always placed at the midpoint of the link they split,
//! so every hidden depth is a dyadic fraction of [0, 1]. Bisecting the unit
//! interval recursively and remembering the level at which each midpoint
//! appears gives the number of layers a genome's neurons span.

use crate::genome::Genome;

/// Deepest bisection level that still recurses. The table holds 255
/// midpoints at levels 1..=8.
const MAX_SPLIT_RECURSION: usize = 6;

/// A placement depth and the bisection level it first appears at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitDepth {
    pub value: f64,
    pub level: usize,
}

/// Lookup table from placement depth to layer level.
#[derive(Debug, Clone)]
pub struct DepthTable {
    splits: Vec<SplitDepth>,
}

impl Default for DepthTable {
    fn default() -> Self {
        Self::new()
    }
}

impl DepthTable {
    #[must_use]
    pub fn new() -> Self {
        let mut splits = Vec::with_capacity(1 << (MAX_SPLIT_RECURSION + 2));
        bisect(0.0, 1.0, 0, &mut splits);
        Self { splits }
    }

    #[must_use]
    pub fn splits(&self) -> &[SplitDepth] {
        &self.splits
    }

    /// Layer level of a placement depth, if it is a tabled midpoint.
    #[must_use]
    pub fn level_of(&self, depth: f64) -> Option<usize> {
        self.splits
            .iter()
            .filter(|split| split.value == depth)
            .map(|split| split.level)
            .max()
    }

    /// Number of update passes a snapshot evaluation of `genome` needs:
    /// the deepest hidden level plus two for the input and output layers.
    #[must_use]
    pub fn net_depth(&self, genome: &Genome) -> usize {
        let deepest = genome
            .neurons()
            .iter()
            .filter_map(|neuron| self.level_of(neuron.placement.depth))
            .max()
            .unwrap_or(0);
        deepest + 2
    }
}

fn bisect(low: f64, high: f64, level: usize, out: &mut Vec<SplitDepth>) {
    let span = high - low;
    let mid = low + span / 2.0;
    out.push(SplitDepth {
        value: mid,
        level: level + 1,
    });
    if level > MAX_SPLIT_RECURSION {
        return;
    }
    bisect(low, mid, level + 1, out);
    bisect(mid, high, level + 1, out);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gene::{NeuronGene, NeuronType, Placement};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn test_rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    #[test]
    fn test_table_shape() {
        let table = DepthTable::new();
        assert_eq!(table.splits().len(), 255);
        let levels = table.splits().iter().map(|split| split.level);
        assert_eq!(levels.clone().min(), Some(1));
        assert_eq!(levels.max(), Some(8));
        assert_eq!(table.splits()[0], SplitDepth { value: 0.5, level: 1 });
        assert_eq!(table.level_of(0.25), Some(2));
        assert_eq!(table.level_of(0.75), Some(2));
        assert_eq!(table.level_of(0.125), Some(3));
        assert_eq!(table.level_of(1.0 / 256.0), Some(8));
        assert_eq!(table.level_of(0.0), None);
        assert_eq!(table.level_of(1.0), None);
        assert_eq!(table.level_of(0.3), None);
    }

    #[test]
    fn test_minimal_genome_depth() {
        let mut rng = test_rng();
        let genome = Genome::minimal(0, 3, 2, &mut rng);
        assert_eq!(DepthTable::new().net_depth(&genome), 2);
    }

    #[test]
    fn test_hidden_layers_add_depth() {
        let mut rng = test_rng();
        let minimal = Genome::minimal(0, 1, 1, &mut rng);
        let mut neurons = minimal.neurons().to_vec();
        neurons.push(NeuronGene::new(3, NeuronType::Hidden, Placement::new(0.5, 0.5)));
        neurons.push(NeuronGene::new(4, NeuronType::Hidden, Placement::new(0.25, 0.5)));
        let genome = Genome::from_genes(1, neurons, minimal.links().to_vec(), 1, 1);
        assert_eq!(DepthTable::new().net_depth(&genome), 4);
    }
}
