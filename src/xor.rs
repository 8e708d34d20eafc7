//! XOR validation harness.
//!
//! Evolves 2-input, 1-output networks until one of them classifies all four
//! XOR cases, repeated over several independent runs. The number of
//! generations and hidden neurons a solution needs is the classic sanity
//! check for a NEAT implementation.

use log::info;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::NeatConfig;
use crate::error::{NeatError, Result};
use crate::network::{Network, RunMode};
use crate::population::Population;

/// The XOR truth table as `(inputs, expected)`.
pub const XOR_CASES: [([f64; 2], f64); 4] = [
    ([0.0, 0.0], 0.0),
    ([0.0, 1.0], 1.0),
    ([1.0, 0.0], 1.0),
    ([1.0, 1.0], 0.0),
];

/// Outcome of a batch of XOR runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XorReport {
    pub runs: usize,
    /// Generation each solved run found its solution in.
    pub solve_generations: Vec<usize>,
    /// Hidden neuron count of each solution.
    pub hidden_neurons: Vec<usize>,
}

impl XorReport {
    #[must_use]
    pub fn solved_runs(&self) -> usize {
        self.solve_generations.len()
    }

    #[must_use]
    pub fn mean_generation(&self) -> f64 {
        mean(&self.solve_generations)
    }

    #[must_use]
    pub fn std_dev_generation(&self) -> f64 {
        std_dev(&self.solve_generations)
    }

    #[must_use]
    pub fn mean_hidden_neurons(&self) -> f64 {
        mean(&self.hidden_neurons)
    }

    #[must_use]
    pub fn std_dev_hidden_neurons(&self) -> f64 {
        std_dev(&self.hidden_neurons)
    }
}

/// Fitness of one network on the shuffled truth table, and whether it
/// classified every case (an output of 0.5 or more reads as true).
///
/// The network runs in [`RunMode::Active`], so state carries over between
/// cases. Fitness is `(4 - total absolute error)^2`.
pub fn score_xor(network: &mut Network, cases: &[([f64; 2], f64)]) -> (f64, bool) {
    let mut error = 0.0;
    let mut correct = 0;
    for (inputs, expected) in cases {
        let output = network.update(inputs, RunMode::Active)[0];
        error += (expected - output).abs();
        if (output >= 0.5) == (*expected >= 0.5) {
            correct += 1;
        }
    }
    ((4.0 - error).powi(2), correct == cases.len())
}

/// Run `runs` independent XOR experiments of at most `max_generations`
/// generations each.
///
/// `config` is forced into XOR shape (two inputs, one output, XOR test
/// mode). When it carries a seed, run `r` uses `seed + r`.
///
/// # Errors
///
/// Returns [`NeatError::InvalidXorSolution`] if a solution has no hidden
/// neurons or uses a recurrent link, and propagates any epoch error.
pub fn run_xor_validation(config: &NeatConfig, runs: usize, max_generations: usize) -> Result<XorReport> {
    let mut report = XorReport {
        runs,
        ..Default::default()
    };

    for run in 0..runs {
        let run_config = NeatConfig {
            num_inputs: 2,
            num_outputs: 1,
            xor_test_mode: true,
            random_seed: config.random_seed.map(|seed| seed.wrapping_add(run as u64)),
            ..config.clone()
        };
        let mut rng = match run_config.random_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_rng(&mut rand::rng()),
        };

        info!("XOR run {} of {runs}", run + 1);
        match solve_once(run_config, max_generations, &mut rng)? {
            Some((generation, hidden)) => {
                info!("XOR solved in generation {generation} with {hidden} hidden neurons");
                report.solve_generations.push(generation);
                report.hidden_neurons.push(hidden);
            }
            None => info!("XOR unsolved after {max_generations} generations"),
        }
    }

    info!(
        "XOR: {}/{} runs solved, generation {:.2} +/- {:.2}, hidden neurons {:.2} +/- {:.2}",
        report.solved_runs(),
        report.runs,
        report.mean_generation(),
        report.std_dev_generation(),
        report.mean_hidden_neurons(),
        report.std_dev_hidden_neurons()
    );
    Ok(report)
}

fn solve_once(config: NeatConfig, max_generations: usize, rng: &mut ChaCha8Rng) -> Result<Option<(usize, usize)>> {
    let mut population = Population::new(config)?;
    population.create_phenotypes()?;
    let mut cases = XOR_CASES;

    for generation in 0..max_generations {
        cases.shuffle(rng);

        let mut scores = Vec::with_capacity(population.genomes().len());
        for network in population.phenotypes_mut() {
            let (fitness, solved) = score_xor(network, &cases);
            if solved {
                return check_solution(network).map(|hidden| Some((generation, hidden)));
            }
            scores.push(fitness);
        }

        population.epoch(&scores)?;
    }
    Ok(None)
}

fn check_solution(network: &Network) -> Result<usize> {
    let genome_id = network.genome_id();
    if network.num_hidden() == 0 {
        return Err(NeatError::InvalidXorSolution {
            genome_id,
            reason: "solution has no hidden neurons".to_string(),
        });
    }
    if network.num_recurrent() > 0 {
        return Err(NeatError::InvalidXorSolution {
            genome_id,
            reason: format!("solution uses {} recurrent links", network.num_recurrent()),
        });
    }
    Ok(network.num_hidden())
}

fn mean(values: &[usize]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<usize>() as f64 / values.len() as f64
}

fn std_dev(values: &[usize]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = mean(values);
    let variance = values
        .iter()
        .map(|&v| (v as f64 - mean).powi(2))
        .sum::<f64>()
        / values.len() as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gene::{LinkGene, NeuronGene, NeuronType, Placement};
    use crate::genome::Genome;

    /// Hand-wired XOR: one AND hidden unit, out = OR(x1, x2) minus AND.
    fn xor_genome() -> Genome {
        let neurons = vec![
            NeuronGene::new(0, NeuronType::Input, Placement::new(0.0, 0.5)),
            NeuronGene::new(1, NeuronType::Input, Placement::new(0.0, 0.75)),
            NeuronGene::new(2, NeuronType::Bias, Placement::new(0.0, 0.25)),
            NeuronGene::new(3, NeuronType::Output, Placement::new(1.0, 0.5)),
            NeuronGene::new(4, NeuronType::Hidden, Placement::new(0.5, 0.5)),
        ];
        let links = vec![
            LinkGene::new(4, 0, 3, 20.0, false),
            LinkGene::new(5, 1, 3, 20.0, false),
            LinkGene::new(6, 2, 3, -10.0, false),
            LinkGene::new(7, 0, 4, 20.0, false),
            LinkGene::new(8, 1, 4, 20.0, false),
            LinkGene::new(9, 2, 4, -30.0, false),
            LinkGene::new(10, 4, 3, -40.0, false),
        ];
        Genome::from_genes(0, neurons, links, 2, 1)
    }

    #[test]
    fn test_score_xor_hand_wired() {
        // Hidden is evaluated after the output in gene order, so settle the
        // hidden unit with a snapshot before scoring each case.
        let genome = xor_genome();
        let mut network = Network::from_genome(&genome, 3).unwrap();
        for (inputs, expected) in XOR_CASES {
            let output = network.update(&inputs, RunMode::Snapshot)[0];
            assert_eq!(output >= 0.5, expected >= 0.5, "case {inputs:?}");
        }
        assert_eq!(check_solution(&network).unwrap(), 1);
    }

    #[test]
    fn test_score_of_constant_half_network() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut genome = Genome::minimal(0, 2, 1, &mut rng);
        for link in genome.links_mut() {
            link.weight = 0.0;
        }
        let mut network = Network::from_genome(&genome, 2).unwrap();
        let (fitness, solved) = score_xor(&mut network, &XOR_CASES);
        // Every output is exactly 0.5: error 2.0, two cases read as correct.
        assert!((fitness - 4.0).abs() < 1e-12);
        assert!(!solved);
    }

    #[test]
    fn test_check_solution_rejects_perceptron() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let genome = Genome::minimal(3, 2, 1, &mut rng);
        let network = Network::from_genome(&genome, 2).unwrap();
        assert!(matches!(
            check_solution(&network),
            Err(NeatError::InvalidXorSolution { genome_id: 3, .. })
        ));
    }

    #[test]
    fn test_check_solution_rejects_backward_link() {
        let mut genome = xor_genome();
        genome.links_mut()[6].recurrent = true;
        let network = Network::from_genome(&genome, 3).unwrap();
        match check_solution(&network) {
            Err(NeatError::InvalidXorSolution { reason, .. }) => assert!(reason.contains("recurrent")),
            other => panic!("expected InvalidXorSolution, got {other:?}"),
        }
    }

    #[test]
    fn test_report_statistics() {
        let report = XorReport {
            runs: 4,
            solve_generations: vec![10, 20, 30],
            hidden_neurons: vec![1, 1, 1],
        };
        assert_eq!(report.solved_runs(), 3);
        assert!((report.mean_generation() - 20.0).abs() < 1e-12);
        assert!((report.std_dev_generation() - (200.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(report.std_dev_hidden_neurons(), 0.0);
        assert_eq!(XorReport::default().mean_generation(), 0.0);
    }

    #[test]
    fn test_short_validation_run() {
        let config = NeatConfig {
            population_size: 50,
            random_seed: Some(42),
            ..NeatConfig::xor()
        };
        let report = match run_xor_validation(&config, 2, 5) {
            Ok(report) => report,
            Err(NeatError::InvalidXorSolution { reason, .. }) if reason.contains("recurrent") => return,
            Err(err) => panic!("XOR run failed: {err}"),
        };
        assert_eq!(report.runs, 2);
        assert!(report.solved_runs() <= 2);
        assert_eq!(report.solve_generations.len(), report.hidden_neurons.len());
        assert!(report.hidden_neurons.iter().all(|&h| h > 0));
    }
}
