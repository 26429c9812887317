//! Command-line flags and layered settings.
//!
//! Settings are resolved in this order, later sources winning:
//!
//! 1. built-in defaults
//! 2. the file given with `--config` (TOML, YAML or JSON, by extension)
//! 3. `HEALTHWATCH_*` environment variables (`HEALTHWATCH_TOPIC`,
//!    `HEALTHWATCH_DRY_RUN`, ...)
//! 4. command-line flags
//!
//! AWS credentials are not part of the layered settings. They come from
//! `--access-key-id`/`--secret-access-key`/`--session-token` or the usual
//! `AWS_*` variables.
//!
//! # Example file
//!
//! ```toml
//! topic = "alerts"
//! region = "eu-west-1"
//! escalation = true
//! filter = '{"critical": ["passing"]}'
//! publish_retries = 3
//! on_publish_error = "abort"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::data::TransitionPolicy;
use crate::error::ConfigError;
use crate::publish::{PublishFailurePolicy, RetryPolicy};

/// Prefix for settings read from the environment.
pub const ENV_PREFIX: &str = "HEALTHWATCH";

pub const DEFAULT_REGION: &str = "us-east-1";

#[derive(Parser, Debug, Default)]
#[command(name = "healthwatch", version)]
#[command(about = "Forward Consul health-check state transitions to AWS SNS")]
pub struct Args {
    /// SNS topic: a bare name, a partial ARN or a full ARN
    #[arg(short, long)]
    pub topic: Option<String>,

    /// AWS region used to complete partial topic ARNs
    #[arg(short, long)]
    pub region: Option<String>,

    /// Explicit transition filter, e.g. '{"warning": ["critical"]}'
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Forward transitions to a worse status
    #[arg(long)]
    pub escalation: bool,

    /// Forward transitions to a better status
    #[arg(long)]
    pub de_escalation: bool,

    /// AWS access key id
    #[arg(long, env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
    pub access_key_id: Option<String>,

    /// AWS secret access key
    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub secret_access_key: Option<String>,

    /// AWS session token, for temporary credentials
    #[arg(long, env = "AWS_SESSION_TOKEN", hide_env_values = true)]
    pub session_token: Option<String>,

    /// Dump every computed delta set and enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Settings file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print deltas to stdout instead of publishing them
    #[arg(long)]
    pub dry_run: bool,

    /// Fixed AWS account id; skips the IAM lookup
    #[arg(long)]
    pub account_id: Option<String>,

    /// Retries for a failed publish
    #[arg(long)]
    pub publish_retries: Option<u32>,

    /// Delay before the first retry, in milliseconds
    #[arg(long)]
    pub retry_backoff_ms: Option<u32>,

    /// What to do when a publish keeps failing
    #[arg(long, value_enum)]
    pub on_publish_error: Option<PublishFailurePolicy>,

    /// Log output format
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
        }
    }
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub topic: Option<String>,
    pub region: String,
    pub filter: Option<String>,
    pub escalation: bool,
    pub de_escalation: bool,
    pub verbose: bool,
    pub dry_run: bool,
    pub account_id: Option<String>,
    pub publish_retries: u32,
    pub retry_backoff_ms: u64,
    pub on_publish_error: PublishFailurePolicy,
    pub log_format: LogFormat,
    pub sns_endpoint: Option<String>,
    pub iam_endpoint: Option<String>,
}

impl Settings {
    /// Resolve settings from defaults, the config file, the process
    /// environment and `args`.
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        Self::load_with_env(args, Environment::with_prefix(ENV_PREFIX))
    }

    /// Like [`Settings::load`] with a caller-supplied environment source.
    pub fn load_with_env(args: &Args, env: Environment) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("region", DEFAULT_REGION)?
            .set_default("escalation", false)?
            .set_default("de_escalation", false)?
            .set_default("verbose", false)?
            .set_default("dry_run", false)?
            .set_default("publish_retries", 0i64)?
            .set_default("retry_backoff_ms", 200i64)?
            .set_default("on_publish_error", PublishFailurePolicy::default().as_str())?
            .set_default("log_format", LogFormat::default().as_str())?;

        if let Some(path) = &args.config {
            builder = builder.add_source(File::from(path.as_path()));
        }

        let settings: Settings = builder
            .add_source(env)
            .set_override_option("topic", args.topic.clone())?
            .set_override_option("region", args.region.clone())?
            .set_override_option("filter", args.filter.clone())?
            .set_override_option("escalation", args.escalation.then_some(true))?
            .set_override_option("de_escalation", args.de_escalation.then_some(true))?
            .set_override_option("verbose", args.verbose.then_some(true))?
            .set_override_option("dry_run", args.dry_run.then_some(true))?
            .set_override_option("account_id", args.account_id.clone())?
            .set_override_option("publish_retries", args.publish_retries.map(i64::from))?
            .set_override_option("retry_backoff_ms", args.retry_backoff_ms.map(i64::from))?
            .set_override_option("on_publish_error", args.on_publish_error.map(|p| p.as_str()))?
            .set_override_option("log_format", args.log_format.map(|f| f.as_str()))?
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.topic.as_deref().map_or(true, |t| t.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "a topic is required (--topic, HEALTHWATCH_TOPIC or `topic` in the config file)"
                    .to_string(),
            ));
        }
        if self.region.trim().is_empty() {
            return Err(ConfigError::Invalid("region must not be empty".to_string()));
        }
        Ok(())
    }

    /// The topic identifier as configured. Always set after loading.
    pub fn topic(&self) -> &str {
        self.topic.as_deref().unwrap_or_default()
    }

    /// Build the transition policy from the filter settings.
    pub fn policy(&self) -> Result<TransitionPolicy, ConfigError> {
        let mut builder = TransitionPolicy::builder()
            .escalation(self.escalation)
            .de_escalation(self.de_escalation);
        if let Some(filter) = &self.filter {
            builder = builder.filter_json(filter)?;
        }
        builder.build()
    }

    pub fn retry(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.publish_retries,
            backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }
}
