/// Worker pool for package generation.
/// Uses a local pool so several generators (and tests) can run side by side.
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

/// Builds a pool with `threads` workers, or one per logical CPU when unset.
pub fn build_pool(threads: Option<usize>) -> Result<ThreadPool, ThreadPoolBuildError> {
    let cores = num_cpus::get();
    let workers = threads.unwrap_or(cores).max(1);

    tracing::debug!(workers, cores, "building package worker pool");

    ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|index| format!("debugtwin-worker-{}", index))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_pool_sizes() {
        let pool = build_pool(Some(2)).unwrap();
        assert_eq!(pool.current_num_threads(), 2);

        let pool = build_pool(Some(0)).unwrap();
        assert_eq!(pool.current_num_threads(), 1);

        let pool = build_pool(None).unwrap();
        assert_eq!(pool.current_num_threads(), num_cpus::get().max(1));
    }
}
