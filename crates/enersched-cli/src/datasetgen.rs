//! enersched-datasetgen - synthetic instance families
//!
//! Generates datasets of random instances from a generator prescription.
//! Processing times are uniform over the metering interval length, release
//! times come from exponential interarrivals, due dates follow the
//! release-plus-slack construction of Baptiste et al., and power
//! consumptions spread a uniform energy demand over each operation's
//! processing time. Every emitted instance is certified feasible by the
//! greedy tardiness heuristic before it is written.

use anyhow::{bail, Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use enersched_core::{Instance, ObjectiveKind, SolverConfig, SolverStatus};
use enersched_io::write_instance;
use enersched_solver::{GreedyHeuristics, Solver};

const INTERVAL_LENGTH: i64 = 15;
const MAX_ENERGY_CONSUMPTION: f64 = 100.0;

#[derive(Parser)]
#[command(name = "enersched-datasetgen")]
#[command(author, version, about = "Synthetic instance generator", long_about = None)]
struct Cli {
    /// Generator prescription file (JSON)
    #[arg(value_name = "PRESCRIPTION")]
    prescription: PathBuf,

    /// Output directory for the dataset
    #[arg(value_name = "OUTPUT_DIR")]
    output_dir: PathBuf,

    /// PRNG seed
    #[arg(long, default_value = "0")]
    seed: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratorPrescription {
    num_instances: usize,
    num_operations: Vec<usize>,
    num_metering_intervals_mul: Vec<usize>,
    alpha1: Vec<f64>,
    alpha2: Vec<f64>,
    alpha3: Vec<f64>,
    max_deviation: Vec<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RealisationDocument {
    num_operations: usize,
    num_metering_intervals_mul: usize,
    alpha1: f64,
    alpha2: f64,
    alpha3: f64,
    max_deviation: i64,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                    ExitCode::SUCCESS
                }
                _ => ExitCode::FAILURE,
            };
        }
    };

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let text = fs::read_to_string(&cli.prescription)
        .with_context(|| format!("reading prescription {}", cli.prescription.display()))?;
    let prescription: GeneratorPrescription =
        serde_json::from_str(&text).context("parsing generator prescription")?;

    let mut rng = StdRng::seed_from_u64(cli.seed);
    generate(&prescription, &cli.output_dir, &mut rng)
}

/// Exponential sample by inverse transform.
fn sample_exponential(mean: f64, rng: &mut StdRng) -> f64 {
    -mean * (1.0 - rng.gen::<f64>()).ln()
}

fn generate(
    prescription: &GeneratorPrescription,
    output_dir: &Path,
    rng: &mut StdRng,
) -> Result<()> {
    fs::create_dir_all(output_dir)?;

    let mut realisation_index = 0usize;
    for &num_operations in &prescription.num_operations {
        for &mul in &prescription.num_metering_intervals_mul {
            for &alpha1 in &prescription.alpha1 {
                for &alpha2 in &prescription.alpha2 {
                    for &alpha3 in &prescription.alpha3 {
                        // One realisation directory per deviation level; the
                        // sampled parameters are shared across them so the
                        // deviation is the only thing that varies.
                        let mut instance_dirs = Vec::new();
                        for &max_deviation in &prescription.max_deviation {
                            let realisation_dir = output_dir.join(realisation_index.to_string());
                            let instances_dir = realisation_dir.join("instances");
                            fs::create_dir_all(&instances_dir)?;

                            let doc = RealisationDocument {
                                num_operations,
                                num_metering_intervals_mul: mul,
                                alpha1,
                                alpha2,
                                alpha3,
                                max_deviation,
                            };
                            fs::write(
                                realisation_dir.join("prescription-realisation.json"),
                                serde_json::to_string_pretty(&doc)?,
                            )?;

                            instance_dirs.push((max_deviation, instances_dir));
                            realisation_index += 1;
                        }

                        for instance_index in 0..prescription.num_instances {
                            emit_instance(
                                num_operations,
                                mul,
                                alpha1,
                                alpha2,
                                alpha3,
                                &instance_dirs,
                                instance_index,
                                rng,
                            )?;
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

fn emit_instance(
    num_operations: usize,
    mul: usize,
    alpha1: f64,
    alpha2: f64,
    alpha3: f64,
    instance_dirs: &[(i64, PathBuf)],
    instance_index: usize,
    rng: &mut StdRng,
) -> Result<()> {
    let num_metering_intervals = mul * num_operations;

    let processing_times: Vec<i64> = (0..num_operations)
        .map(|_| rng.gen_range(1..=INTERVAL_LENGTH))
        .collect();
    let sum_processing: i64 = processing_times.iter().sum();
    let average_processing = sum_processing as f64 / num_operations as f64;

    // Release times from exponential interarrivals with mean
    // alpha1 * average processing time.
    let mut release_times = Vec::with_capacity(num_operations);
    let mut current_time = 0i64;
    for _ in 0..num_operations {
        current_time += sample_exponential(alpha1 * average_processing, rng) as i64;
        release_times.push(current_time);
    }

    let due_slack_bound = (alpha2 * sum_processing as f64).ceil() as i64;
    let due_dates: Vec<i64> = (0..num_operations)
        .map(|j| release_times[j] + processing_times[j] + rng.gen_range(0..=due_slack_bound))
        .collect();

    // A uniform energy demand spread over the processing time.
    let power_consumptions: Vec<f64> = (0..num_operations)
        .map(|j| {
            let energy =
                rng.gen_range(alpha3 * MAX_ENERGY_CONSUMPTION..MAX_ENERGY_CONSUMPTION);
            energy / processing_times[j] as f64
        })
        .collect();

    for (max_deviation, instances_dir) in instance_dirs {
        let instance = Instance::new(
            release_times.clone(),
            due_dates.clone(),
            processing_times.clone(),
            power_consumptions.clone(),
            *max_deviation,
            num_metering_intervals,
            INTERVAL_LENGTH,
            vec![MAX_ENERGY_CONSUMPTION; num_metering_intervals],
            Default::default(),
        )?;

        let mut cfg = SolverConfig::new(Duration::from_secs(3600), ObjectiveKind::TotalTardiness);
        cfg.specialized.set_str(
            GreedyHeuristics::KEY,
            GreedyHeuristics::KEY_RULE,
            GreedyHeuristics::RULE_TARDINESS,
        );
        let status = GreedyHeuristics::new(&instance).solve(&cfg)?.status;
        if status != SolverStatus::Feasible {
            bail!(
                "sampled instance {instance_index} with deviation {max_deviation} \
                 has no greedy-feasible schedule; relax the prescription"
            );
        }

        write_instance(
            &instance,
            &instances_dir.join(format!("{instance_index}.json")),
        )?;
    }

    Ok(())
}
