use std::future::Future;

use futures::future::join_all;
use tracing::info;

/// Default number of conversations transitioned concurrently.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Position of a settled window within the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowInfo {
    /// Zero-based window index.
    pub index: usize,
    pub size: usize,
    /// Items settled so far, this window included.
    pub settled: usize,
    pub total: usize,
}

/// Runs items in consecutive fixed-size windows.
///
/// Items inside a window run concurrently; the next window only starts once
/// every item of the current one has settled. Tasks return plain values, so
/// one item's failure can never cut its siblings short.
#[derive(Debug, Clone, Copy)]
pub struct BatchScheduler {
    concurrency: usize,
}

impl Default for BatchScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY)
    }
}

impl BatchScheduler {
    /// A bound of zero is treated as one.
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Sizes of the windows `total` items are split into.
    pub fn window_sizes(&self, total: usize) -> Vec<usize> {
        (0..total)
            .step_by(self.concurrency)
            .map(|start| self.concurrency.min(total - start))
            .collect()
    }

    /// Run `task` over every item, handing each window's results to `settle`
    /// in window order once the whole window is done.
    pub async fn run<I, O, F, Fut, S>(&self, items: Vec<I>, mut task: F, mut settle: S)
    where
        F: FnMut(I) -> Fut,
        Fut: Future<Output = O>,
        S: FnMut(WindowInfo, Vec<O>),
    {
        let total = items.len();
        let mut items = items.into_iter().peekable();
        let mut index = 0;
        let mut settled = 0;

        while items.peek().is_some() {
            let window: Vec<Fut> = items.by_ref().take(self.concurrency).map(&mut task).collect();
            let size = window.len();
            info!(window = index + 1, size, "dispatching window");

            let results = join_all(window).await;
            settled += size;
            settle(
                WindowInfo {
                    index,
                    size,
                    settled,
                    total,
                },
                results,
            );
            index += 1;
        }
    }
}
