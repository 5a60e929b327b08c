//! Per-run state handed to the calibrator, encoder and reconstructor

use gzqr_core::{GzqrError, GzqrResult};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Progress callback: (completed, total, phase label)
pub type ProgressFn = Box<dyn Fn(u64, u64, &str) + Send + Sync>;

pub struct RunContext {
    /// Worker threads for the encode and scan pools (at least 1)
    pub workers: usize,
    /// Source of salts and nonces
    pub rng: StdRng,
    pub progress: Option<ProgressFn>,
}

impl RunContext {
    /// Context seeded from the OS entropy source.
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            rng: StdRng::from_entropy(),
            progress: None,
        }
    }

    /// Deterministic context for tests and reproducible fixtures.
    pub fn seeded(workers: usize, seed: u64) -> Self {
        Self {
            workers: workers.max(1),
            rng: StdRng::seed_from_u64(seed),
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn report(&self, done: u64, total: u64, phase: &str) {
        if let Some(cb) = &self.progress {
            cb(done, total, phase);
        }
    }

    pub(crate) fn pool(&self) -> GzqrResult<rayon::ThreadPool> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers.max(1))
            .thread_name(|i| format!("gzqr-worker-{i}"))
            .build()
            .map_err(|e| GzqrError::Other(anyhow::anyhow!("building worker pool: {e}")))
    }
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("workers", &self.workers)
            .field("progress", &self.progress.is_some())
            .finish_non_exhaustive()
    }
}
