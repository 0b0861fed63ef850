//! Command-line interface built on clap.
//!
//! Mode flags (`--dry`, `--hard`, `--delete`) select which pipeline steps run;
//! the remaining flags override values from `convsweep.toml`.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{DEFAULT_CONFIG_FILE, SweepConfig};
use crate::sweep::Mode;

/// Close, evict and delete every conversation of a Conversations service.
#[derive(Debug, Parser)]
#[command(name = "convsweep", version, about)]
pub struct Cli {
    /// Simulate: list conversations and report, without changing anything.
    #[arg(long)]
    pub dry: bool,

    /// Remove every participant after closing.
    #[arg(long)]
    pub hard: bool,

    /// Delete conversations once they are closed.
    #[arg(long)]
    pub delete: bool,

    /// Conversations transitioned concurrently per window.
    #[arg(long, short = 'c')]
    pub concurrency: Option<usize>,

    /// Conversations requested per listing page.
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Maximum participants evicted per conversation.
    #[arg(long)]
    pub participant_limit: Option<u32>,

    /// Path to the configuration file.
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Print the report as JSON instead of a table.
    #[arg(long)]
    pub json: bool,

    /// Also write the JSON report to this file.
    #[arg(long)]
    pub report_file: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(long, short, default_value_t = false)]
    pub verbose: bool,
}

impl Cli {
    pub fn mode(&self) -> Mode {
        Mode {
            dry: self.dry,
            hard: self.hard,
            delete: self.delete,
        }
    }

    /// Apply flag overrides on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut SweepConfig) {
        if let Some(n) = self.concurrency {
            config.concurrency = n;
        }
        if let Some(n) = self.page_size {
            config.page_size = n;
        }
        if let Some(n) = self.participant_limit {
            config.participant_limit = n;
        }
    }
}
