use tracing::info;

use crate::conversations::ConversationsApi;
use crate::error::FetchError;
use crate::sweep::{
    BatchScheduler, DEFAULT_CONCURRENCY, Mode, PageFetcher, PipelineOptions, ResultAggregator,
    RunReport, RunTotals, TransitionPipeline, WindowInfo,
};

/// Default number of conversations requested per listing page.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Everything a run needs besides the API handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub mode: Mode,
    pub concurrency: usize,
    pub page_size: u32,
    pub pipeline: PipelineOptions,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            concurrency: DEFAULT_CONCURRENCY,
            page_size: DEFAULT_PAGE_SIZE,
            pipeline: PipelineOptions::default(),
        }
    }
}

/// Enumerates every conversation, transitions them window by window and
/// aggregates the outcomes.
pub struct Reconciler<C> {
    api: C,
    options: RunOptions,
}

impl<C: ConversationsApi> Reconciler<C> {
    pub fn new(api: C, options: RunOptions) -> Self {
        Self { api, options }
    }

    pub fn api(&self) -> &C {
        &self.api
    }

    pub async fn run(&self) -> Result<RunReport, FetchError> {
        self.run_observed(|_, _| {}).await
    }

    /// Like [`run`](Self::run), calling `on_window` after each window settles.
    ///
    /// Enumeration failures abort before any conversation is touched.
    /// Per-conversation failures never do; they end up in the report.
    pub async fn run_observed<F>(&self, mut on_window: F) -> Result<RunReport, FetchError>
    where
        F: FnMut(WindowInfo, RunTotals),
    {
        let RunOptions {
            mode,
            concurrency,
            page_size,
            pipeline,
        } = self.options;

        let conversations = PageFetcher::new(&self.api, page_size).fetch_all().await?;
        info!(count = conversations.len(), %mode, "enumerated conversations");

        let pipeline = TransitionPipeline::new(&self.api, mode, pipeline);
        let mut aggregator = ResultAggregator::new(mode);

        BatchScheduler::new(concurrency)
            .run(
                conversations,
                |conversation| {
                    let pipeline = &pipeline;
                    async move { pipeline.run(&conversation).await }
                },
                |window, settled| {
                    aggregator.record_window(settled);
                    let totals = aggregator.totals();
                    info!(
                        window = window.index + 1,
                        settled = window.settled,
                        total = window.total,
                        failed = totals.failed_count,
                        "window settled"
                    );
                    on_window(window, totals);
                },
            )
            .await;

        let report = aggregator.finish();
        info!(run_id = %report.run_id, "{}", report.summary_line());
        Ok(report)
    }
}
