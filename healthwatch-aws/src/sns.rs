//! SNS client for publishing notifications.
//!
//! ## Example
//!
//! ```rust,no_run
//! use healthwatch_aws::{Credentials, SnsClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = SnsClient::builder()
//!         .region("eu-west-1")
//!         .credentials(Credentials::new("AKID", "secret"))
//!         .build()?;
//!
//!     client
//!         .publish("arn:aws:sns:eu-west-1:019661432785:alerts", "hello")
//!         .await?;
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use tracing::debug;

use crate::query::{xml_text, QueryClient, DEFAULT_TIMEOUT};
use crate::{AwsError, Credentials};

const SNS_API_VERSION: &str = "2010-03-31";

/// Client for the SNS query API.
#[derive(Debug, Clone)]
pub struct SnsClient {
    inner: QueryClient,
}

impl SnsClient {
    /// Create a new builder for configuring the client.
    pub fn builder() -> SnsClientBuilder {
        SnsClientBuilder::default()
    }

    /// Publish `message` to the topic and return the SNS message id.
    pub async fn publish(&self, topic_arn: &str, message: &str) -> Result<String, AwsError> {
        let body = self
            .inner
            .call("Publish", &[("TopicArn", topic_arn), ("Message", message)])
            .await?;

        let message_id = xml_text(&body, "MessageId")
            .ok_or_else(|| AwsError::Parse("Publish response has no MessageId".to_string()))?;
        debug!(topic_arn, message_id = %message_id, "published to SNS");
        Ok(message_id)
    }

    /// The region requests are signed for.
    pub fn region(&self) -> &str {
        self.inner.region()
    }

    /// The endpoint requests are sent to.
    pub fn endpoint(&self) -> &str {
        self.inner.endpoint().as_str()
    }
}

/// Builder for SnsClient.
#[derive(Debug, Default)]
pub struct SnsClientBuilder {
    region: Option<String>,
    endpoint: Option<String>,
    credentials: Option<Credentials>,
    timeout: Option<Duration>,
}

impl SnsClientBuilder {
    /// Set the region (default: "us-east-1").
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Override the endpoint (default: `https://sns.<region>.amazonaws.com/`).
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the credentials used to sign requests.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set the request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client.
    ///
    /// Falls back to environment credentials when none were set.
    pub fn build(self) -> Result<SnsClient, AwsError> {
        let region = self.region.unwrap_or_else(|| "us-east-1".to_string());
        let endpoint = self
            .endpoint
            .unwrap_or_else(|| format!("https://sns.{}.amazonaws.com/", region));
        let credentials = match self.credentials {
            Some(credentials) => credentials,
            None => Credentials::from_env()?,
        };

        let inner = QueryClient::new(
            &endpoint,
            "sns",
            region,
            SNS_API_VERSION,
            credentials,
            self.timeout.unwrap_or(DEFAULT_TIMEOUT),
        )?;

        Ok(SnsClient { inner })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PUBLISH_RESPONSE: &str = r#"<PublishResponse xmlns="http://sns.amazonaws.com/doc/2010-03-31/">
  <PublishResult>
    <MessageId>94f20ce6-13c5-43a0-9a9e-ca52d816e90b</MessageId>
  </PublishResult>
  <ResponseMetadata>
    <RequestId>f187a3c1-376f-11df-8963-01868b7c937a</RequestId>
  </ResponseMetadata>
</PublishResponse>"#;

    fn client_for(server: &MockServer) -> SnsClient {
        SnsClient::builder()
            .region("us-east-1")
            .endpoint(server.uri())
            .credentials(Credentials::new("AKID", "secret"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_defaults() {
        let client = SnsClient::builder()
            .credentials(Credentials::new("AKID", "secret"))
            .build()
            .unwrap();
        assert_eq!(client.region(), "us-east-1");
        assert_eq!(client.endpoint(), "https://sns.us-east-1.amazonaws.com/");
    }

    #[test]
    fn test_builder_region_sets_endpoint() {
        let client = SnsClient::builder()
            .region("eu-west-1")
            .credentials(Credentials::new("AKID", "secret"))
            .build()
            .unwrap();
        assert_eq!(client.endpoint(), "https://sns.eu-west-1.amazonaws.com/");
    }

    #[tokio::test]
    async fn test_publish() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .and(header_exists("authorization"))
            .and(header_exists("x-amz-date"))
            .and(body_string_contains("Action=Publish"))
            .and(body_string_contains(
                "TopicArn=arn%3Aaws%3Asns%3Aus-east-1%3A019661432785%3Aalerts",
            ))
            .and(body_string_contains("Version=2010-03-31"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PUBLISH_RESPONSE))
            .expect(1)
            .mount(&server)
            .await;

        let message_id = client_for(&server)
            .publish("arn:aws:sns:us-east-1:019661432785:alerts", "{}")
            .await
            .unwrap();

        assert_eq!(message_id, "94f20ce6-13c5-43a0-9a9e-ca52d816e90b");
    }

    #[tokio::test]
    async fn test_publish_service_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_string(
                "<ErrorResponse><Error><Type>Sender</Type><Code>NotFound</Code>\
                 <Message>Topic does not exist</Message></Error></ErrorResponse>",
            ))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .publish("arn:aws:sns:us-east-1:019661432785:missing", "{}")
            .await
            .unwrap_err();

        match err {
            AwsError::Service {
                status,
                code,
                message,
                ..
            } => {
                assert_eq!(status, 404);
                assert_eq!(code, "NotFound");
                assert_eq!(message, "Topic does not exist");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
