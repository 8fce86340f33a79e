//! enersched CLI - robust energy-constrained scheduling
//!
//! Runs one solver stage described by a prescription file against an
//! instance file and writes the result file. Exit code 0 on success, 1 on
//! malformed input, bad arguments or an unknown solver.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use enersched_io::{read_instance, read_prescription, read_result, write_result};
use enersched_solver::{create_solver, RobustnessChecker, RobustnessVerdict};

#[derive(Parser)]
#[command(name = "enersched")]
#[command(author, version, about = "Robust energy-constrained scheduling solver", long_about = None)]
struct Cli {
    /// Solver prescription file (JSON)
    #[arg(value_name = "PRESCRIPTION")]
    prescription: PathBuf,

    /// Instance file (JSON)
    #[arg(value_name = "INSTANCE")]
    instance: PathBuf,

    /// Result output file (JSON)
    #[arg(value_name = "RESULT")]
    result: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    // Argument errors exit with code 1, matching the other input errors;
    // help and version output stay successful.
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
    let prescription = read_prescription(&cli.prescription)
        .with_context(|| format!("reading prescription {}", cli.prescription.display()))?;
    let instance = read_instance(&cli.instance)
        .with_context(|| format!("reading instance {}", cli.instance.display()))?;

    let mut config = prescription.config.clone();

    // A previous stage's result warm-starts this one when it carries a
    // usable schedule.
    if let Some(previous_stage) = &prescription.previous_stage {
        let previous = read_result(previous_stage.as_ref())
            .with_context(|| format!("reading previous stage result {previous_stage}"))?;
        if previous.status.has_solution() {
            config = config.with_warm_start(previous.start_times);
        }
    }

    if config.use_init_start_times
        && config.init_start_times.len() != instance.num_operations()
    {
        bail!(
            "warm-start schedule has {} entries, instance has {} operations",
            config.init_start_times.len(),
            instance.num_operations()
        );
    }

    let mut solver = create_solver(&prescription.solver_name, &instance)?;
    let result = solver.solve(&config)?;
    tracing::debug!(
        solver = %prescription.solver_name,
        runtime_ms = result.runtime.as_millis() as u64,
        "solver finished"
    );

    // Every emitted schedule must pass the ground-truth checker; a rejection
    // here means a solver bug, not a bad input.
    if result.status.has_solution() {
        let verdict = RobustnessChecker::new(&instance).check(&result.start_times);
        if let RobustnessVerdict::Violated { interval_index, .. } = verdict {
            bail!(
                "solver {} produced a schedule that violates metering interval {}",
                prescription.solver_name,
                interval_index
            );
        }
    }

    write_result(&result, &cli.result)
        .with_context(|| format!("writing result {}", cli.result.display()))?;

    println!("status: {}", result.status);
    println!("objective: {}", result.objective_value);
    Ok(())
}
