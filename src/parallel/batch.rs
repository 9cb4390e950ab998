//! Batch distribution for parallel simulation.
//!
//! The iteration range is split into a fixed number of batches. Each batch is
//! an independent unit of work with its own sample stream; results come back
//! in batch order whatever order the workers finish in.

use rayon::prelude::*;

use crate::parallel::pool::WorkerPool;

/// Split `total` items into up to `num_batches` ranges `[start, end)`.
/// Batches are as equal in size as possible; later batches may be smaller.
///
/// # Example
/// ```
/// # use kriegspiel::parallel::batch_ranges;
/// let ranges = batch_ranges(100, 4);
/// assert_eq!(ranges, vec![(0, 25), (25, 50), (50, 75), (75, 100)]);
/// ```
pub fn batch_ranges(total: usize, num_batches: usize) -> Vec<(usize, usize)> {
    if total == 0 || num_batches == 0 {
        return Vec::new();
    }
    let num_batches = num_batches.min(total);
    let base = total / num_batches;
    let remainder = total % num_batches;
    let mut ranges = Vec::with_capacity(num_batches);
    let mut start = 0;
    for i in 0..num_batches {
        let size = base + if i < remainder { 1 } else { 0 };
        let end = start + size;
        ranges.push((start, end));
        start = end;
    }
    ranges
}

/// Run `run_one(batch_index, range)` for every range. With `parallel` the
/// batches are spread over `pool`; otherwise they run in order on the caller's
/// thread. Output order always matches `ranges`.
pub fn run_batches<T, F>(
    ranges: &[(usize, usize)],
    pool: &WorkerPool,
    parallel: bool,
    run_one: F,
) -> Vec<T>
where
    T: Send,
    F: Fn(usize, (usize, usize)) -> T + Send + Sync,
{
    if parallel {
        pool.install(|| {
            ranges
                .par_iter()
                .enumerate()
                .map(|(index, &range)| run_one(index, range))
                .collect()
        })
    } else {
        ranges
            .iter()
            .enumerate()
            .map(|(index, &range)| run_one(index, range))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_ranges_even_split() {
        let r = batch_ranges(100, 4);
        assert_eq!(r, vec![(0, 25), (25, 50), (50, 75), (75, 100)]);
    }

    #[test]
    fn batch_ranges_with_remainder() {
        let r = batch_ranges(10, 3);
        assert_eq!(r, vec![(0, 4), (4, 7), (7, 10)]);
    }

    #[test]
    fn batch_ranges_more_batches_than_items() {
        let r = batch_ranges(3, 10);
        assert_eq!(r.len(), 3);
        assert_eq!(r, vec![(0, 1), (1, 2), (2, 3)]);
    }

    #[test]
    fn batch_ranges_empty() {
        assert!(batch_ranges(0, 5).is_empty());
        assert!(batch_ranges(10, 0).is_empty());
    }

    #[test]
    fn run_batches_keeps_batch_order() {
        let ranges = batch_ranges(1_000, 16);
        let sum_range = |_: usize, (start, end): (usize, usize)| (start..end).sum::<usize>();
        let sequential = run_batches(&ranges, &WorkerPool::default(), false, sum_range);
        let parallel = run_batches(&ranges, &WorkerPool::with_workers(4), true, sum_range);
        assert_eq!(sequential, parallel);
        assert_eq!(parallel.iter().sum::<usize>(), (0..1_000).sum::<usize>());

        let indices = run_batches(&ranges, &WorkerPool::default(), true, |i, _| i);
        assert_eq!(indices, (0..16).collect::<Vec<_>>());
    }
}
