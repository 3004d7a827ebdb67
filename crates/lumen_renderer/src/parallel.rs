//! Worker pool for tile rendering.
//!
//! Work items are handed out through a shared atomic counter. The calling
//! thread pulls items alongside the pool's workers and returns once every item
//! has finished.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::RenderResult;

pub struct ThreadPool {
    /// `None` when the machine has a single core and the caller does all the work
    pool: Option<rayon::ThreadPool>,
    workers: usize,
}

impl ThreadPool {
    /// Pool with `workers` background threads, or one fewer than the number of
    /// hardware threads when `None`.
    pub fn new(workers: Option<usize>) -> RenderResult<Self> {
        let workers = workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
                .saturating_sub(1)
        });

        let pool = if workers == 0 {
            None
        } else {
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(workers)
                    .thread_name(|i| format!("lumen-worker-{}", i))
                    .build()?,
            )
        };

        log::debug!("Thread pool with {} workers plus the calling thread", workers);
        Ok(Self { pool, workers })
    }

    /// Background workers, not counting the caller.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `f(i)` for every `i` in `0..count` and wait for all of them.
    ///
    /// Items are claimed in increasing order, but completion order is arbitrary.
    pub fn parallel_for<F>(&self, count: usize, f: F)
    where
        F: Fn(usize) + Sync,
    {
        let next = AtomicUsize::new(0);
        let work = || loop {
            let i = next.fetch_add(1, Ordering::Relaxed);
            if i >= count {
                break;
            }
            f(i);
        };

        match &self.pool {
            Some(pool) => pool.in_place_scope(|scope| {
                for _ in 0..self.workers.min(count) {
                    scope.spawn(|_| work());
                }
                work();
            }),
            None => work(),
        }
    }
}
