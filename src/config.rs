//! Configuration loaded from `convsweep.toml` and the environment.
//!
//! Every tunable has a default; credentials and the target service have none
//! and must come from the file or the environment. Environment variables take
//! precedence over the file, CLI flags over both. [`SweepConfig::validate`]
//! runs before any network call.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::conversations::{ClientOptions, DEFAULT_BASE_URL};
use crate::error::SweepError;
use crate::reconciler::{DEFAULT_PAGE_SIZE, RunOptions};
use crate::sweep::{DEFAULT_CONCURRENCY, Mode, PipelineOptions};

pub const DEFAULT_CONFIG_FILE: &str = "convsweep.toml";

pub const ENV_ACCOUNT_SID: &str = "TWILIO_ACCOUNT_SID";
pub const ENV_AUTH_TOKEN: &str = "TWILIO_AUTH_TOKEN";
pub const ENV_SERVICE_SID: &str = "TWILIO_CONVERSATIONS_SERVICE_SID";
pub const ENV_BASE_URL: &str = "CONVSWEEP_BASE_URL";

/// Raw configuration as read from `convsweep.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub account_sid: String,
    pub auth_token: String,
    /// Conversation service whose conversations are reconciled.
    pub service_sid: String,
    pub base_url: String,
    pub concurrency: usize,
    pub page_size: u32,
    pub participant_limit: u32,
    /// Pause between participant removals, in milliseconds. 0 disables it.
    pub eviction_pause_ms: u64,
    pub request_timeout_secs: u64,
    /// Abandon a single conversation after this many seconds. Unset waits forever.
    pub transition_timeout_secs: Option<u64>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            account_sid: String::new(),
            auth_token: String::new(),
            service_sid: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
            page_size: DEFAULT_PAGE_SIZE,
            participant_limit: 200,
            eviction_pause_ms: 50,
            request_timeout_secs: 30,
            transition_timeout_secs: None,
        }
    }
}

/// Validated configuration, ready to build a client and a run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub client: ClientOptions,
    pub run: RunOptions,
}

impl SweepConfig {
    /// Load from `path` (missing file means defaults), then apply process environment overrides.
    pub fn load(path: &Path) -> Result<Self, SweepError> {
        Self::load_with_env(path, |key| std::env::var(key).ok())
    }

    /// Same as [`load`](Self::load) with an injectable environment lookup.
    pub fn load_with_env<E>(path: &Path, env: E) -> Result<Self, SweepError>
    where
        E: Fn(&str) -> Option<String>,
    {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<SweepConfig>(&contents)?
        } else {
            Self::default()
        };
        config.apply_env(env);
        Ok(config)
    }

    fn apply_env<E>(&mut self, env: E)
    where
        E: Fn(&str) -> Option<String>,
    {
        let overrides = [
            (ENV_ACCOUNT_SID, &mut self.account_sid),
            (ENV_AUTH_TOKEN, &mut self.auth_token),
            (ENV_SERVICE_SID, &mut self.service_sid),
            (ENV_BASE_URL, &mut self.base_url),
        ];
        for (key, field) in overrides {
            if let Some(value) = env(key)
                && !value.is_empty()
            {
                *field = value;
            }
        }
    }

    /// Check required keys and bounds, reporting every problem at once.
    pub fn validate(&self, mode: Mode) -> Result<Settings, SweepError> {
        let mut problems = Vec::new();
        let required = [
            ("account_sid", ENV_ACCOUNT_SID, &self.account_sid),
            ("auth_token", ENV_AUTH_TOKEN, &self.auth_token),
            ("service_sid", ENV_SERVICE_SID, &self.service_sid),
        ];
        for (key, env, value) in required {
            if value.trim().is_empty() {
                problems.push(format!("missing {key} (set {env} or `{key}` in {DEFAULT_CONFIG_FILE})"));
            }
        }
        if self.concurrency == 0 {
            problems.push("concurrency must be at least 1".to_string());
        }
        if self.page_size == 0 {
            problems.push("page_size must be at least 1".to_string());
        }
        if self.participant_limit == 0 {
            problems.push("participant_limit must be at least 1".to_string());
        }
        if self.base_url.trim().is_empty() {
            problems.push("base_url must not be empty".to_string());
        }

        if !problems.is_empty() {
            return Err(SweepError::Config(problems.join("; ")));
        }

        Ok(Settings {
            client: ClientOptions {
                base_url: self.base_url.clone(),
                account_sid: self.account_sid.clone(),
                auth_token: self.auth_token.clone(),
                service_sid: self.service_sid.clone(),
                request_timeout: Duration::from_secs(self.request_timeout_secs),
            },
            run: RunOptions {
                mode,
                concurrency: self.concurrency,
                page_size: self.page_size,
                pipeline: PipelineOptions {
                    participant_limit: self.participant_limit,
                    eviction_pause: Duration::from_millis(self.eviction_pause_ms),
                    transition_timeout: self.transition_timeout_secs.map(Duration::from_secs),
                },
            },
        })
    }
}
