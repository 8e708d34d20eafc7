//! XOR example.
//!
//! Evolves networks that solve XOR, first once by hand-driving the
//! population's epoch loop, then as a batch of runs through the validation
//! harness.
//!
//! Run with: `RUST_LOG=info cargo run --example xor`

use enneos_neat::xor::{score_xor, XOR_CASES};
use enneos_neat::{run_xor_validation, NeatConfig, Population, RunMode};

fn main() -> enneos_neat::Result<()> {
    env_logger::init();

    println!("NEAT XOR Example");
    println!("================\n");

    let config = NeatConfig {
        population_size: 150,
        random_seed: Some(42),
        ..NeatConfig::xor()
    };
    let generations = 200;

    println!("Population: {}", config.population_size);
    println!("Generations: {generations}");
    println!();

    let mut population = Population::new(config.clone())?;
    population.create_phenotypes()?;
    let mut solution = None;

    for gen in 0..generations {
        let mut fitness = Vec::with_capacity(config.population_size);
        for network in population.phenotypes_mut() {
            let (score, solved) = score_xor(network, &XOR_CASES);
            if solved && solution.is_none() {
                solution = Some((gen, network.genome_id()));
            }
            fitness.push(score);
        }

        if gen % 10 == 0 || solution.is_some() {
            let best = fitness.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let avg = fitness.iter().sum::<f64>() / fitness.len() as f64;
            println!(
                "Gen {gen:3}: best={best:.4}, avg={avg:.4}, species={}",
                population.num_species()
            );
        }
        if solution.is_some() {
            break;
        }
        population.epoch(&fitness)?;
    }

    println!();
    let Some((gen, genome_id)) = solution else {
        println!("No solution within {generations} generations");
        return Ok(());
    };

    let champion = population
        .genomes()
        .iter()
        .find(|g| g.id() == genome_id)
        .cloned();
    if let Some(mut champion) = champion {
        println!("Solution found at generation {gen}");
        println!("Neurons: {}", champion.num_neurons());
        println!("Hidden neurons: {}", champion.num_hidden());
        println!("Links: {}", champion.num_links());

        println!("\nChampion XOR outputs:");
        let network = champion.create_phenotype()?;
        for (inputs, expected) in XOR_CASES {
            let output = network.update(&inputs, RunMode::Active)[0];
            let status = if (output >= 0.5) == (expected >= 0.5) { "ok" } else { "miss" };
            println!(
                "  {} XOR {} = {:.4} (expected {}) {}",
                inputs[0] as i32, inputs[1] as i32, output, expected as i32, status
            );
        }
    }

    println!("\nValidation over 10 runs");
    let report = run_xor_validation(&config, 10, generations)?;
    println!("Solved: {}/{}", report.solved_runs(), report.runs);
    println!(
        "Generations: {:.2} +/- {:.2}",
        report.mean_generation(),
        report.std_dev_generation()
    );
    println!(
        "Hidden neurons: {:.2} +/- {:.2}",
        report.mean_hidden_neurons(),
        report.std_dev_hidden_neurons()
    );
    Ok(())
}
