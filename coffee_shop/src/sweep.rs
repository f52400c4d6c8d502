//! Interarrival-time sweeps.
//!
//! An experiment file (TOML) points at a base shop configuration and lists the
//! interarrival times to try. Every variant runs as an independent scenario
//! on the rayon pool and yields one summary row.
//!
//! ```toml
//! [experiment]
//! name = "lunch rush"
//! config = "config.yaml"
//! job = "job.yaml"        # optional
//! output = "sweep.csv"
//! threads = 4             # optional
//!
//! [sweep]
//! interarrival_times = [1.0, 2.0, 3.0, 4.0]
//! ```

use std::error::Error;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use des::parallel::{ParallelRunner, progress_logger};

use crate::config::ShopConfig;
use crate::{Stats, build_event_loop};

#[derive(Debug, Clone, Deserialize)]
pub struct SweepConfig {
    pub experiment: ExperimentSettings,
    pub sweep: SweepSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExperimentSettings {
    pub name: String,
    pub config: PathBuf,
    pub job: Option<PathBuf>,
    pub output: PathBuf,
    pub threads: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SweepSettings {
    pub interarrival_times: Vec<f64>,
}

impl SweepConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Can't read {}: {}", path.display(), e))?;
        let mut config: SweepConfig = toml::from_str(&contents)?;

        // relative paths are taken from the experiment file's directory
        if let Some(base) = path.parent() {
            config.experiment.config = base.join(&config.experiment.config);
            config.experiment.job = config.experiment.job.map(|job| base.join(job));
            config.experiment.output = base.join(&config.experiment.output);
        }
        Ok(config)
    }

    /// Load the base shop and derive one validated variant per interarrival time.
    pub fn scenarios(&self) -> Result<Vec<ShopConfig>, Box<dyn Error>> {
        let job = self
            .experiment
            .job
            .clone()
            .unwrap_or_else(|| self.experiment.config.with_file_name("job.yaml"));
        let base = ShopConfig::from_files(&self.experiment.config, job)?;
        let scenarios = self
            .sweep
            .interarrival_times
            .iter()
            .map(|&t| base.with_interarrival_time(t))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(scenarios)
    }
}

/// Summary of one scenario
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepRow {
    pub interarrival_time: f64,
    pub arrivals: usize,
    pub started: usize,
    pub completed: usize,
    pub average_queue_length: f64,
    pub max_queue_length: usize,
    pub average_wait: f64,
    pub overall_utilization: f64,
}

fn summarise(interarrival_time: f64, stats: Vec<Stats>) -> Result<SweepRow, String> {
    let report = crate::shop_stats(stats)
        .ok_or_else(|| "scenario produced no shop statistics".to_string())?
        .report;
    Ok(SweepRow {
        interarrival_time,
        arrivals: report.arrivals,
        started: report.started,
        completed: report.completed,
        average_queue_length: report.average_queue_length,
        max_queue_length: report.max_queue_length,
        average_wait: report.average_wait,
        overall_utilization: report.overall_utilization,
    })
}

/// Run every scenario in parallel; results keep scenario order.
///
/// All scenarios must share one time limit.
pub fn run_sweep(scenarios: &[ShopConfig], threads: Option<usize>) -> Vec<Result<SweepRow, String>> {
    let Some(first) = scenarios.first() else {
        return Vec::new();
    };
    let until = first.time_limit;
    debug_assert!(scenarios.iter().all(|s| s.time_limit == until));

    let mut runner = ParallelRunner::new(scenarios.len(), |scenario_id| {
        build_event_loop(&scenarios[scenario_id])
    })
    .progress(progress_logger(10));
    if let Some(n) = threads {
        runner = runner.num_threads(n);
    }

    runner
        .run(until)
        .into_iter()
        .zip(scenarios)
        .map(|(result, scenario)| result.and_then(|stats| summarise(scenario.interarrival_time, stats)))
        .collect()
}

pub fn write_rows<W: io::Write>(writer: W, rows: &[SweepRow]) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}
