//! Partitioned execution of the per-animal update loops.
//!
//! Work is split across animals in fixed-size partitions. Each partition
//! accumulates into its own tally, which is merged into the shared result under
//! a single lock once the partition is done.

use eco_core::{Error, Result, SchedulerConfig};
use parking_lot::Mutex;
use rayon::prelude::*;
use rayon::ThreadPool;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, info};

/// Per-partition accumulator
pub trait Tally: Default + Send {
    fn merge(&mut self, other: Self);
}

impl Tally for () {
    fn merge(&mut self, _other: Self) {}
}

pub struct Scheduler {
    pool: Option<ThreadPool>,
    partition_size: usize,
}

impl Scheduler {
    pub fn new(config: &SchedulerConfig) -> Result<Self> {
        config.validate()?;

        if config.workers == 1 {
            debug!("Using sequential scheduler");
            return Ok(Self::sequential_with(config.partition_size));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            // 0 lets rayon pick one thread per available core
            .num_threads(config.workers)
            .thread_name(|i| format!("ecosim-worker-{}", i))
            .build()
            .map_err(|e| {
                Error::ConcurrencyContention(format!("failed to build worker pool: {}", e))
            })?;

        info!(
            workers = pool.current_num_threads(),
            partition_size = config.partition_size,
            "Worker pool ready"
        );

        Ok(Self {
            pool: Some(pool),
            partition_size: config.partition_size,
        })
    }

    pub fn sequential() -> Self {
        Self::sequential_with(SchedulerConfig::default().partition_size)
    }

    fn sequential_with(partition_size: usize) -> Self {
        Self {
            pool: None,
            partition_size,
        }
    }

    pub fn workers(&self) -> usize {
        self.pool
            .as_ref()
            .map(|pool| pool.current_num_threads())
            .unwrap_or(1)
    }

    #[cfg(test)]
    pub fn is_parallel(&self) -> bool {
        self.pool.is_some()
    }

    /// Apply `work` to every item and return the merged tallies.
    ///
    /// A panicking partition fails the whole call with
    /// [`Error::ConcurrencyContention`]; nothing is returned for the partitions
    /// that did finish.
    pub fn run<T, S, F>(&self, items: &[T], work: F) -> Result<S>
    where
        T: Sync,
        S: Tally,
        F: Fn(&mut S, &T) + Sync,
    {
        let merged = Mutex::new(S::default());
        let partition = |chunk: &[T]| {
            let mut local = S::default();
            for item in chunk {
                work(&mut local, item);
            }
            merged.lock().merge(local);
        };

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| match &self.pool {
            Some(pool) => pool.install(|| {
                items
                    .par_chunks(self.partition_size)
                    .for_each(&partition)
            }),
            None => items.chunks(self.partition_size).for_each(&partition),
        }));

        if let Err(payload) = outcome {
            return Err(Error::ConcurrencyContention(format!(
                "worker partition did not complete: {}",
                panic_message(payload.as_ref())
            )));
        }

        Ok(merged.into_inner())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
