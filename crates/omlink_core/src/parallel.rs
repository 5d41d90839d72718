use std::{panic, thread};

/// Get the number of CPUs.
pub(crate) fn num_cpus() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

pub(crate) fn worker_count(jobs: usize, len: usize) -> usize {
    let jobs = if jobs == 0 { num_cpus() } else { jobs };
    jobs.clamp(1, len.max(1))
}

/// Applies `f` to every item, handing out contiguous chunks to scoped worker threads.
///
/// `f` receives the item's index in `items`. Results come back in input order no matter
/// which worker finished first. A panic in a worker is re-raised on the calling thread.
pub(crate) fn parallel_map<T, R, F>(items: &mut [T], jobs: usize, f: F) -> Vec<R>
where
    T: Send,
    R: Send,
    F: Fn(usize, &mut T) -> R + Sync,
{
    let workers = worker_count(jobs, items.len());
    if workers <= 1 {
        return items
            .iter_mut()
            .enumerate()
            .map(|(idx, item)| f(idx, item))
            .collect();
    }

    let chunk_len = items.len().div_ceil(workers);
    let f = &f;

    thread::scope(|scope| {
        let handles: Vec<_> = items
            .chunks_mut(chunk_len)
            .enumerate()
            .map(|(chunk_idx, chunk)| {
                scope.spawn(move || {
                    let base = chunk_idx * chunk_len;
                    chunk
                        .iter_mut()
                        .enumerate()
                        .map(|(offset, item)| f(base + offset, item))
                        .collect::<Vec<R>>()
                })
            })
            .collect();

        let mut results = Vec::new();
        for handle in handles {
            match handle.join() {
                Ok(chunk) => results.extend(chunk),
                Err(payload) => panic::resume_unwind(payload),
            }
        }
        results
    })
}
