use std::sync::Mutex;
use std::thread;

/// Hands out work items one at a time to whichever worker asks first.
struct Manager<I> {
    tasks: Mutex<I>,
}

impl<I: Iterator> Manager<I> {
    fn new(tasks: I) -> Self {
        Manager {
            tasks: Mutex::new(tasks),
        }
    }

    // A poisoned queue means a worker panicked; the scope re-raises it.
    fn next(&self) -> Option<I::Item> {
        self.tasks.lock().ok()?.next()
    }
}

/// Data-parallel loop over a fixed pool of scoped worker threads with dynamic
/// scheduling: each idle worker takes the next `chunk` items.
#[derive(Clone, Copy, Debug)]
pub struct ParallelFor {
    nthread: usize,
    chunk: usize,
}

impl ParallelFor {
    pub fn new(nthread: usize) -> Self {
        ParallelFor {
            nthread: nthread.max(1),
            chunk: 1,
        }
    }

    pub fn with_chunk(self, chunk: usize) -> Self {
        ParallelFor {
            chunk: chunk.max(1),
            ..self
        }
    }

    pub fn nthread(&self) -> usize {
        self.nthread
    }

    /// Calls `f(i)` once for every `i` in `0..n`.
    pub fn for_each<F>(&self, n: usize, f: F)
    where
        F: Fn(usize) + Sync,
    {
        let chunk = self.chunk;
        let ranges = (0..n)
            .step_by(chunk)
            .map(move |start| start..(start + chunk).min(n));
        self.run(Manager::new(ranges), |range| range.for_each(&f));
    }

    /// Calls `f(row, pixels)` once per row of a row-major buffer. Each row
    /// slice is handed to exactly one worker.
    pub fn for_each_row<T, F>(&self, buf: &mut [T], width: usize, f: F)
    where
        T: Send,
        F: Fn(usize, &mut [T]) + Sync,
    {
        if width == 0 {
            return;
        }
        let rows_per_task = self.chunk;
        let tasks = buf.chunks_mut(width * rows_per_task).enumerate();
        self.run(Manager::new(tasks), |(task, rows)| {
            for (k, row) in rows.chunks_mut(width).enumerate() {
                f(task * rows_per_task + k, row);
            }
        });
    }

    fn run<I, W>(&self, manager: Manager<I>, work: W)
    where
        I: Iterator + Send,
        W: Fn(I::Item) + Sync,
    {
        let manager = &manager;
        let work = &work;
        thread::scope(|s| {
            for _ in 0..self.nthread {
                s.spawn(move || {
                    while let Some(task) = manager.next() {
                        work(task);
                    }
                });
            }
        });
    }
}

/// Seed for the random stream of one task, mixed from a base seed and the
/// indices naming the task (splitmix64 finalizer per key).
pub fn stream_seed(seed: u64, keys: &[u64]) -> u64 {
    keys.iter().fold(seed, |acc, key| {
        let mut z = acc
            .wrapping_add(0x9e37_79b9_7f4a_7c15)
            .wrapping_add(key.wrapping_mul(0xbf58_476d_1ce4_e5b9));
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    })
}
