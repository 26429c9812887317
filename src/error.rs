//! Error kinds for the relay.
//!
//! Startup errors ([`ConfigError`], [`AddressError`]) are fatal. A
//! [`ParseError`] only costs the one input record. A [`PublishError`] is
//! handled according to the configured [`PublishFailurePolicy`]. A
//! [`RunError`] stops the relay.
//!
//! [`PublishFailurePolicy`]: crate::publish::PublishFailurePolicy

use healthwatch_aws::AwsError;
use thiserror::Error;

/// An input record could not be turned into a snapshot.
#[derive(Debug, Error)]
#[error("unparsable snapshot: {source}")]
pub struct ParseError {
    #[from]
    source: serde_json::Error,
}

/// Invalid relay configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("filter is not valid JSON: {0}")]
    FilterJson(#[source] serde_json::Error),

    #[error("filter must be a dictionary")]
    FilterNotObject,

    #[error("'{0}' is not a valid state")]
    InvalidState(String),

    #[error("value of '{0}' must be an array")]
    TargetsNotArray(String),

    #[error("all values of '{0}' must be strings")]
    TargetNotString(String),

    #[error("value '{target}' of '{source_state}' is not a valid state")]
    InvalidTarget { source_state: String, target: String },

    #[error("{0}")]
    Settings(#[from] config::ConfigError),

    #[error("{0}")]
    Invalid(String),
}

/// The topic address could not be resolved.
#[derive(Debug, Error)]
pub enum AddressError {
    #[error("topic identifier is empty")]
    Empty,

    #[error("{0} doesn't look like a valid SNS ARN")]
    InvalidArn(String),

    #[error("{0} doesn't look like an account ID")]
    InvalidAccountId(String),

    #[error("{0} doesn't look like an IAM ARN")]
    InvalidCallerArn(String),

    #[error("identity lookup failed: {0}")]
    Identity(#[source] AwsError),
}

/// A forwarded delta could not be published.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to serialize delta: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Aws(#[from] AwsError),

    #[error("failed to write delta: {0}")]
    Io(#[from] std::io::Error),

    #[error("publish channel closed")]
    Closed,
}

/// The relay loop stopped before its input was exhausted.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to read input: {0}")]
    Input(#[source] std::io::Error),

    #[error(transparent)]
    Publish(#[from] PublishError),
}
