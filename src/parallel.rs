//! Bounded data-parallel execution over disjoint index ranges.
//!
//! `max_workers` of `None` or `Some(0)` uses rayon's default worker count.
//! `Some(1)` never touches a thread pool: the action runs in a plain loop on
//! the calling thread, in index order.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::{ExecutionError, Result};

/// Resolves a requested worker count to a concrete one.
#[must_use]
pub fn worker_count(max_workers: Option<usize>) -> usize {
    match max_workers {
        None | Some(0) => rayon::current_num_threads().max(1),
        Some(n) => n,
    }
}

fn build_pool(workers: usize) -> Result<ThreadPool> {
    ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| ExecutionError::from(e).into())
}

/// Invokes `action` exactly once for every index in `[0, count)`.
///
/// # Errors
///
/// Returns `ExecutionError::WorkerPool` if the worker pool cannot be built.
pub fn for_each_index<F>(count: usize, max_workers: Option<usize>, action: F) -> Result<()>
where
    F: Fn(usize) + Sync + Send,
{
    let workers = worker_count(max_workers);
    if workers == 1 || count <= 1 {
        (0..count).for_each(action);
        return Ok(());
    }
    build_pool(workers)?.install(|| (0..count).into_par_iter().for_each(action));
    Ok(())
}

/// Maps every index in `[0, count)` and returns the results in index order.
///
/// # Errors
///
/// Returns `ExecutionError::WorkerPool` if the worker pool cannot be built.
pub fn map_index<T, F>(count: usize, max_workers: Option<usize>, f: F) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(usize) -> T + Sync + Send,
{
    let workers = worker_count(max_workers);
    if workers == 1 || count <= 1 {
        return Ok((0..count).map(f).collect());
    }
    Ok(build_pool(workers)?.install(|| (0..count).into_par_iter().map(f).collect()))
}

/// Splits `data` into consecutive chunks of `chunk_len` elements and invokes
/// `action(chunk_index, chunk)` once per chunk. Chunks are disjoint, so
/// actions never observe each other's writes.
///
/// # Errors
///
/// Returns `ExecutionError::WorkerPool` if the worker pool cannot be built,
/// otherwise the error of the lowest-numbered failing chunk. With one worker
/// no chunk after it is visited.
pub fn for_each_chunk_mut<T, F>(
    data: &mut [T],
    chunk_len: usize,
    max_workers: Option<usize>,
    action: F,
) -> Result<()>
where
    T: Send,
    F: Fn(usize, &mut [T]) -> Result<()> + Sync + Send,
{
    if chunk_len == 0 || data.is_empty() {
        return Ok(());
    }
    let workers = worker_count(max_workers);
    if workers == 1 || data.len() <= chunk_len {
        for (i, chunk) in data.chunks_mut(chunk_len).enumerate() {
            action(i, chunk)?;
        }
        return Ok(());
    }
    let results: Vec<Result<()>> = build_pool(workers)?.install(|| {
        data.par_chunks_mut(chunk_len)
            .enumerate()
            .map(|(i, chunk)| action(i, chunk))
            .collect()
    });
    results.into_iter().collect()
}
