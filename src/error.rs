use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::conversations::ApiError;

/// Fatal errors that end a run without a report.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Enumeration failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Conversations API error: {0}")]
    Api(#[from] ApiError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl SweepError {
    /// Process exit code for this error: 2 for pre-flight problems, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        match self {
            SweepError::Config(_) | SweepError::Toml(_) => 2,
            _ => 1,
        }
    }
}

/// Enumeration failure. Always fatal: a partial listing is never acted upon.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("page {page} request failed: {source}")]
    Page {
        page: usize,
        #[source]
        source: ApiError,
    },

    #[error("page {page} reported more results but carried no cursor")]
    MissingCursor { page: usize },
}

/// Close-step failure recorded in a single conversation's outcome.
///
/// Never propagated across conversations: siblings in the same window and
/// later windows keep running.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransitionError {
    #[error("close rejected ({primary}); timer fallback rejected ({fallback})")]
    CloseRejected { primary: String, fallback: String },

    #[error("transition did not settle within {ms}ms")]
    TimedOut { ms: u64 },
}
