//! Terminal output: progress bar while windows settle, styled report afterwards.
//!
//! Uses `indicatif` for the progress bar and `console` for colors. The bar
//! hides itself when stderr is not a terminal.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::sweep::{RunReport, RunTotals, WindowInfo};

/// Progress across the windows of one run.
pub struct SweepProgress {
    pb: ProgressBar,
}

impl SweepProgress {
    pub fn start(dry: bool) -> Self {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) =
            ProgressStyle::default_spinner().template("{spinner:.cyan} {msg} [{pos}/{len}]")
        {
            pb.set_style(style);
        }
        pb.set_message(if dry {
            "listing conversations (dry run)"
        } else {
            "listing conversations"
        });
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self { pb }
    }

    /// Advance after a window settles.
    pub fn window_settled(&self, window: WindowInfo, totals: RunTotals) {
        self.pb.set_length(window.total as u64);
        self.pb.set_position(window.settled as u64);
        self.pb.set_message(format!(
            "window {} settled ({} failed)",
            window.index + 1,
            totals.failed_count
        ));
    }

    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

/// Print the table, every recorded warning and the one-line summary.
pub fn print_report(report: &RunReport) {
    if report.outcomes.is_empty() {
        println!("No conversations found.");
    } else {
        println!("{}", report.render_table());
    }

    let yellow = Style::new().yellow();
    for event in &report.events {
        eprintln!("  {} {event}", yellow.apply_to("!"));
    }

    let style = if report.totals.failed_count > 0 {
        Style::new().red().bold()
    } else {
        Style::new().green().bold()
    };
    let prefix = if report.mode.dry { "[dry-run] " } else { "" };
    println!("{prefix}{}", style.apply_to(report.summary_line()));
}
