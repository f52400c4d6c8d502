//! Interarrival-time sweep runner
//!
//! Usage:
//!   cargo run --release --bin sweep -- experiments/sweep.toml

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use env_logger::Builder;
use log::LevelFilter;

use coffee_shop::sweep::{SweepConfig, SweepRow, run_sweep, write_rows};

/// Run one coffee shop per interarrival time and tabulate the results
#[derive(Parser, Debug)]
#[command(about, long_about = None)]
struct Args {
    /// Experiment description (TOML)
    experiment: PathBuf,

    /// Override the thread count from the experiment file
    #[arg(long, short)]
    threads: Option<usize>,
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = SweepConfig::from_file(&args.experiment)?;
    let scenarios = config.scenarios()?;
    log::info!(
        "{}: {} scenarios from {}",
        config.experiment.name,
        scenarios.len(),
        config.experiment.config.display()
    );

    let start = Instant::now();
    let results = run_sweep(&scenarios, args.threads.or(config.experiment.threads));

    let mut rows: Vec<SweepRow> = Vec::with_capacity(results.len());
    for (scenario, result) in scenarios.iter().zip(results) {
        match result {
            Ok(row) => rows.push(row),
            Err(e) => log::error!(
                "interarrival time {} failed: {}",
                scenario.interarrival_time,
                e
            ),
        }
    }

    write_rows(File::create(&config.experiment.output)?, &rows)?;
    log::info!(
        "wrote {} rows to {} in {:.2?}",
        rows.len(),
        config.experiment.output.display(),
        start.elapsed()
    );
    Ok(())
}

fn main() -> ExitCode {
    Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("ERROR: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
