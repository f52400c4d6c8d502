//! Parallel execution of independent EventLoop scenarios
//!
//! Each scenario is built, run and summarised on a rayon worker. Scenarios
//! share nothing, so results are identical whatever the thread count or
//! completion order, and they are returned in scenario_id order.
//!
//! # Example
//!
//! ```rust
//! use des::parallel::{ParallelRunner, progress_logger};
//! # use des::{Agent, EventLoop};
//! # struct Idle;
//! # impl Agent<u8, usize> for Idle {
//! #     fn stats(&self) -> usize { 0 }
//! # }
//!
//! let results = ParallelRunner::new(16, |scenario_id| {
//!     let agents: Vec<Box<dyn Agent<u8, usize>>> = vec![Box::new(Idle)];
//!     EventLoop::new(vec![(scenario_id as f64, 1)], agents)
//! })
//! .progress(progress_logger(4))
//! .num_threads(2)
//! .run(100.0);
//!
//! assert_eq!(results.len(), 16);
//! ```
//!
//! # Error Handling
//!
//! A panic inside one scenario is caught and returned as `Err(String)`; the
//! other scenarios still run.

use crate::{EventLoop, Time};
use rayon::prelude::*;
use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Executes multiple EventLoop scenarios in parallel
///
/// The builder receives the scenario_id and returns a fresh EventLoop. It is
/// called on the worker thread, so the loop itself never crosses threads.
pub struct ParallelRunner<T, S, F>
where
    F: Fn(usize) -> EventLoop<T, S> + Send + Sync,
    S: Send,
{
    num_scenarios: usize,
    builder: F,
    num_threads: Option<usize>,
    progress_callback: Option<ProgressCallback>,
    _scenario: PhantomData<fn() -> (T, S)>,
}

impl<T, S, F> ParallelRunner<T, S, F>
where
    F: Fn(usize) -> EventLoop<T, S> + Send + Sync,
    S: Send,
{
    pub fn new(num_scenarios: usize, builder: F) -> Self {
        ParallelRunner {
            num_scenarios,
            builder,
            num_threads: None,
            progress_callback: None,
            _scenario: PhantomData,
        }
    }

    /// Set number of threads (defaults to rayon's global pool)
    pub fn num_threads(mut self, n: usize) -> Self {
        self.num_threads = Some(n);
        self
    }

    /// Set progress callback, called with `(completed, total)` after each scenario
    pub fn progress<P>(mut self, callback: P) -> Self
    where
        P: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }

    /// Execute all scenarios up to `run_until` and return their stats in order
    pub fn run(self, run_until: Time) -> Vec<Result<Vec<S>, String>> {
        let progress_counter = AtomicUsize::new(0);

        let execute = || {
            (0..self.num_scenarios)
                .into_par_iter()
                .map(|scenario_id| {
                    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                        let mut event_loop = (self.builder)(scenario_id);
                        event_loop.run(run_until);
                        event_loop.stats()
                    }));

                    let completed = progress_counter.fetch_add(1, Ordering::SeqCst) + 1;
                    if let Some(ref callback) = self.progress_callback {
                        callback(completed, self.num_scenarios);
                    }

                    result.map_err(panic_message)
                })
                .collect()
        };

        let pool = self
            .num_threads
            .map(|n| rayon::ThreadPoolBuilder::new().num_threads(n).build());

        match pool {
            Some(Ok(pool)) => pool.install(execute),
            Some(Err(e)) => {
                log::warn!("falling back to the global rayon pool: {}", e);
                execute()
            }
            None => execute(),
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(msg) => *msg,
        Err(payload) => payload
            .downcast_ref::<&str>()
            .map_or_else(|| "scenario panicked".to_string(), |msg| msg.to_string()),
    }
}

/// Run scenarios in parallel on the global pool
pub fn run_parallel<T, S, F>(
    num_scenarios: usize,
    builder: F,
    run_until: Time,
) -> Vec<Result<Vec<S>, String>>
where
    F: Fn(usize) -> EventLoop<T, S> + Send + Sync,
    S: Send,
{
    ParallelRunner::new(num_scenarios, builder).run(run_until)
}

/// Progress callback that logs every `interval` completed scenarios (and the last one)
pub fn progress_logger(interval: usize) -> impl Fn(usize, usize) + Send + Sync {
    let interval = interval.max(1);
    move |completed, total| {
        if completed.is_multiple_of(interval) || completed == total {
            log::info!("completed {}/{} scenarios", completed, total);
        }
    }
}
