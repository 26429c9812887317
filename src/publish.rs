//! Outbound side of the relay: where forwarded deltas go.

use std::io::Write;
use std::time::Duration;

use async_trait::async_trait;
use healthwatch_aws::SnsClient;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::PublishError;
use crate::topic::TopicAddress;

/// Trait for publish targets (SNS, stdout, channels).
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Get the name of this publisher.
    fn name(&self) -> &'static str;

    /// Publish one serialized delta to `topic`.
    async fn publish(&self, topic: &TopicAddress, payload: &str) -> Result<(), PublishError>;
}

/// Publishes to AWS SNS.
#[derive(Debug, Clone)]
pub struct SnsPublisher {
    client: SnsClient,
}

impl SnsPublisher {
    pub fn new(client: SnsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Publisher for SnsPublisher {
    fn name(&self) -> &'static str {
        "sns"
    }

    async fn publish(&self, topic: &TopicAddress, payload: &str) -> Result<(), PublishError> {
        self.client.publish(topic.as_str(), payload).await?;
        Ok(())
    }
}

/// A message as written by [`StdoutPublisher`] or sent by [`ChannelPublisher`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Published {
    pub topic: String,
    pub message: String,
}

/// Writes each message to stdout as a JSON line instead of publishing it.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutPublisher;

#[async_trait]
impl Publisher for StdoutPublisher {
    fn name(&self) -> &'static str {
        "stdout"
    }

    async fn publish(&self, topic: &TopicAddress, payload: &str) -> Result<(), PublishError> {
        let line = serde_json::to_string(&Published {
            topic: topic.to_string(),
            message: payload.to_string(),
        })?;
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", line)?;
        stdout.flush()?;
        Ok(())
    }
}

/// Sends each message through a channel.
///
/// Useful for embedding the relay, or for tests.
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    tx: mpsc::Sender<Published>,
}

impl ChannelPublisher {
    /// Create a channel publisher and return it with the receiver.
    pub fn create(buffer: usize) -> (Self, mpsc::Receiver<Published>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Publisher for ChannelPublisher {
    fn name(&self) -> &'static str {
        "channel"
    }

    async fn publish(&self, topic: &TopicAddress, payload: &str) -> Result<(), PublishError> {
        self.tx
            .send(Published {
                topic: topic.to_string(),
                message: payload.to_string(),
            })
            .await
            .map_err(|_| PublishError::Closed)
    }
}

/// What to do when a publish fails after all retries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PublishFailurePolicy {
    /// Log the failure and carry on with the next delta.
    #[default]
    Log,
    /// Stop the pipeline with the error.
    Abort,
}

impl PublishFailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Log => "log",
            Self::Abort => "abort",
        }
    }
}

/// Retry schedule for failed publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one. Zero disables retries.
    pub retries: u32,
    /// Delay before the first retry; doubled for each further retry.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 0,
            backoff: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        self.backoff
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

/// Publish with retries, returning the last error if every attempt fails.
pub async fn publish_with_retry(
    publisher: &dyn Publisher,
    topic: &TopicAddress,
    payload: &str,
    retry: RetryPolicy,
) -> Result<(), PublishError> {
    let mut attempt = 0;
    loop {
        match publisher.publish(topic, payload).await {
            Ok(()) => {
                debug!(publisher = publisher.name(), topic = %topic, "published");
                return Ok(());
            }
            Err(e) if attempt < retry.retries => {
                attempt += 1;
                let delay = retry.delay(attempt);
                warn!(
                    publisher = publisher.name(),
                    error = %e,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "publish failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
