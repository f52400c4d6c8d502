use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use env_logger::Builder;

use coffee_shop::event_log::write_event_log;
use coffee_shop::report::write_report;
use coffee_shop::{ShopConfig, ShopStats, simulate};

/// Coffee shop queueing simulation
#[derive(Parser, Debug)]
#[command(about, long_about = None)]
struct Args {
    /// Servers and customer arrivals (YAML)
    #[arg(default_value = "config.yaml")]
    config: PathBuf,

    /// Time limit and seed (YAML); skipped if the file does not exist
    #[arg(default_value = "job.yaml")]
    job: PathBuf,

    /// Print the aggregate statistics as JSON instead of text
    #[arg(long)]
    json: bool,
}

fn print(stats: &ShopStats, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_event_log(&mut out, &stats.log)?;
    if json {
        writeln!(out)?;
        serde_json::to_writer_pretty(&mut out, &stats.report)?;
        writeln!(out)?;
    } else {
        write_report(&mut out, &stats.report)?;
    }
    out.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    Builder::from_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();

    let args = Args::parse();

    let config = match ShopConfig::from_files(&args.config, &args.job) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let stats = simulate(&config);

    if let Err(e) = print(&stats, args.json) {
        eprintln!("ERROR: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
