//! # healthwatch
//!
//! Relays Consul health-check state transitions to an AWS SNS topic.
//!
//! `consul watch -type checks` prints the full list of health checks every
//! time any of them changes. This crate reads that output one JSON array per
//! line, works out which checks changed status since the previous line, keeps
//! the transitions the configured policy cares about, and publishes each one
//! to SNS.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                           Pipeline                            │
//! │  ┌─────────┐    ┌──────────┐    ┌──────────┐    ┌───────────┐ │
//! │  │ source  │───▶│   data   │───▶│   data   │───▶│  publish  │ │
//! │  │ (lines) │    │ (delta)  │    │ (policy) │    │ (SNS/...) │ │
//! │  └─────────┘    └──────────┘    └──────────┘    └─────┬─────┘ │
//! │                                                       │       │
//! │                                   topic::resolve ─────┘       │
//! │                                   (identity lookup)           │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`source`]**: Snapshot input ([`SnapshotSource`] trait, [`StreamSource`])
//! - **[`data`]**: Delta computation and the [`TransitionPolicy`]
//! - **[`topic`]** / **[`identity`]**: Expanding a partial topic into a full ARN
//! - **[`publish`]**: The [`Publisher`] trait with SNS, stdout and channel targets
//! - **[`report`]**: JSON diagnostics for unparsable lines and verbose dumps
//! - **[`pipeline`]**: The loop tying it together
//! - **[`settings`]**: Command-line flags and layered configuration
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Forward every transition to arn:aws:sns:us-east-1:<account>:alerts
//! consul watch -type checks | healthwatch --topic alerts
//!
//! # Only worsening transitions, to a topic in another region
//! consul watch -type checks | healthwatch -t eu-west-1:019661432785:ops --escalation
//! ```
//!
//! ### As a library
//!
//! ```
//! use std::io::Cursor;
//! use healthwatch::{ChannelPublisher, Pipeline, StreamSource, TopicAddress, TransitionPolicy};
//!
//! # tokio_test::block_on(async {
//! let input = concat!(
//!     r#"[{"CheckID":"web","Status":"passing"}]"#, "\n",
//!     r#"[{"CheckID":"web","Status":"critical"}]"#, "\n",
//! );
//! let mut source = StreamSource::spawn(Cursor::new(input), "example");
//!
//! let (publisher, mut published) = ChannelPublisher::create(16);
//! let topic = TopicAddress::parse("arn:aws:sns:us-east-1:019661432785:alerts").unwrap();
//! let mut pipeline = Pipeline::new(topic, TransitionPolicy::default(), Box::new(publisher));
//!
//! pipeline.run(&mut source).await.unwrap();
//!
//! let message = published.recv().await.unwrap().message;
//! assert!(message.contains(r#""PreviousStatus":"passing""#));
//! # });
//! ```

pub mod data;
pub mod error;
pub mod identity;
pub mod pipeline;
pub mod publish;
pub mod report;
pub mod settings;
pub mod source;
pub mod topic;

// Re-export main types for convenience
pub use data::{DeltaTracker, TransitionPolicy};
pub use error::{AddressError, ConfigError, ParseError, PublishError, RunError};
pub use identity::{IamAccountLookup, StaticAccountId, UnavailableLookup};
pub use pipeline::{Outcome, Pipeline, PipelineStats};
pub use publish::{
    ChannelPublisher, PublishFailurePolicy, Publisher, RetryPolicy, SnsPublisher, StdoutPublisher,
};
pub use report::Reporter;
pub use settings::{Args, LogFormat, Settings};
pub use source::{parse_snapshot, Record, SnapshotSource, StreamSource};
pub use topic::{resolve, IdentityLookup, TopicAddress};
