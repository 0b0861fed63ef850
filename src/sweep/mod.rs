mod fetcher;
mod lifecycle;
mod outcome;
mod pipeline;
mod report;
mod scheduler;

#[cfg(test)]
pub(crate) mod testing;

pub use fetcher::PageFetcher;
pub use lifecycle::{Lifecycle, LifecycleState};
pub use outcome::{EventKind, Mode, Settled, SweepEvent, TransitionOutcome};
pub use pipeline::{PipelineOptions, TransitionPipeline};
pub use report::{ResultAggregator, RunReport, RunTotals};
pub use scheduler::{BatchScheduler, DEFAULT_CONCURRENCY, WindowInfo};
