//! Aggregation of per-conversation outcomes into a [`RunReport`].

use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tabled::{Table, Tabled, settings::Style};
use uuid::Uuid;

use super::outcome::{Mode, Settled, SweepEvent, TransitionOutcome};

/// Running totals over every recorded outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTotals {
    pub closed_count: usize,
    pub skipped_count: usize,
    pub failed_count: usize,
    pub deleted_count: usize,
    pub total_participants_removed: u64,
}

impl RunTotals {
    fn add(&mut self, outcome: &TransitionOutcome) {
        if outcome.is_closed() {
            self.closed_count += 1;
        }
        if outcome.skipped {
            self.skipped_count += 1;
        }
        if outcome.is_failed() {
            self.failed_count += 1;
        }
        if outcome.deleted {
            self.deleted_count += 1;
        }
        self.total_participants_removed += u64::from(outcome.participants_removed);
    }
}

/// Outcome of one reconciliation run, in window-arrival order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub mode: Mode,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub window_count: usize,
    pub outcomes: Vec<TransitionOutcome>,
    /// Recovered and recorded problems, in the order they were reported.
    pub events: Vec<SweepEvent>,
    pub totals: RunTotals,
}

impl RunReport {
    pub fn is_finalized(&self) -> bool {
        self.finished_at.is_some()
    }

    pub fn summary_line(&self) -> String {
        let t = &self.totals;
        format!(
            "closed: {}, skipped: {}, failed: {}, totalParticipantsRemoved: {}, deletedCount: {}",
            t.closed_count,
            t.skipped_count,
            t.failed_count,
            t.total_participants_removed,
            t.deleted_count
        )
    }

    /// Write the report as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Tabular view of every outcome.
    pub fn render_table(&self) -> String {
        let rows: Vec<OutcomeRow> = self.outcomes.iter().map(OutcomeRow::from).collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        table.to_string()
    }
}

#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "id")]
    id: String,
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "previous")]
    previous: String,
    #[tabled(rename = "new")]
    new: String,
    #[tabled(rename = "participants removed")]
    participants_removed: u32,
    #[tabled(rename = "deleted")]
    deleted: bool,
    #[tabled(rename = "result")]
    result: String,
}

impl From<&TransitionOutcome> for OutcomeRow {
    fn from(o: &TransitionOutcome) -> Self {
        let result = match (&o.error, o.skipped) {
            (Some(err), _) => format!("failed: {err}"),
            (None, true) => "skipped".to_string(),
            (None, false) => "ok".to_string(),
        };
        Self {
            id: o.id.clone(),
            name: o.display_name.clone().unwrap_or_else(|| "-".to_string()),
            previous: display_state(&o.previous_state),
            new: display_state(&o.new_state),
            participants_removed: o.participants_removed,
            deleted: o.deleted,
            result,
        }
    }
}

fn display_state(state: &str) -> String {
    if state.is_empty() {
        "-".to_string()
    } else {
        state.to_string()
    }
}

/// Append-only collector. Outcomes arrive one window at a time and are never rewritten.
#[derive(Debug)]
pub struct ResultAggregator {
    report: RunReport,
}

impl ResultAggregator {
    pub fn new(mode: Mode) -> Self {
        Self {
            report: RunReport {
                run_id: Uuid::new_v4(),
                mode,
                started_at: Utc::now(),
                finished_at: None,
                window_count: 0,
                outcomes: Vec::new(),
                events: Vec::new(),
                totals: RunTotals::default(),
            },
        }
    }

    pub fn record(&mut self, settled: Settled) {
        self.report.totals.add(&settled.outcome);
        self.report.outcomes.push(settled.outcome);
        self.report.events.extend(settled.events);
    }

    /// Record every outcome of a settled window.
    pub fn record_window(&mut self, window: Vec<Settled>) {
        self.report.window_count += 1;
        for settled in window {
            self.record(settled);
        }
    }

    pub fn totals(&self) -> RunTotals {
        self.report.totals
    }

    /// Stamp the finish time and hand the report out read-only.
    pub fn finish(mut self) -> RunReport {
        self.report.finished_at = Some(Utc::now());
        self.report
    }
}
