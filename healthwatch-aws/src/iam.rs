//! IAM client for discovering the caller's identity.

use std::time::Duration;

use tracing::debug;

use crate::query::{xml_text, QueryClient, DEFAULT_TIMEOUT};
use crate::{AwsError, Credentials};

const IAM_API_VERSION: &str = "2010-05-08";

/// IAM is a global service; it is always signed for us-east-1.
const IAM_SIGNING_REGION: &str = "us-east-1";

const IAM_ENDPOINT: &str = "https://iam.amazonaws.com/";

/// Client for the IAM query API.
#[derive(Debug, Clone)]
pub struct IamClient {
    inner: QueryClient,
}

impl IamClient {
    /// Create a new builder for configuring the client.
    pub fn builder() -> IamClientBuilder {
        IamClientBuilder::default()
    }

    /// ARN of the user the credentials belong to (`GetUser` with no name).
    ///
    /// Callers without `iam:GetUser` get an [`AwsError::Service`] for which
    /// [`AwsError::is_access_denied`] is true.
    pub async fn get_user_arn(&self) -> Result<String, AwsError> {
        let body = self.inner.call("GetUser", &[]).await?;
        let arn = xml_text(&body, "Arn")
            .ok_or_else(|| AwsError::Parse("GetUser response has no Arn".to_string()))?;
        debug!(arn = %arn, "resolved caller identity");
        Ok(arn)
    }

    /// The endpoint requests are sent to.
    pub fn endpoint(&self) -> &str {
        self.inner.endpoint().as_str()
    }
}

/// Builder for IamClient.
#[derive(Debug, Default)]
pub struct IamClientBuilder {
    endpoint: Option<String>,
    credentials: Option<Credentials>,
    timeout: Option<Duration>,
}

impl IamClientBuilder {
    /// Override the endpoint (default: `https://iam.amazonaws.com/`).
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
    pub fn build(self) -> Result<IamClient, AwsError> {
        let endpoint = self.endpoint.unwrap_or_else(|| IAM_ENDPOINT.to_string());
        let credentials = match self.credentials {
            Some(credentials) => credentials,
            None => Credentials::from_env()?,
        };

        let inner = QueryClient::new(
            &endpoint,
            "iam",
            IAM_SIGNING_REGION.to_string(),
            IAM_API_VERSION,
            credentials,
            self.timeout.unwrap_or(DEFAULT_TIMEOUT),
        )?;

        Ok(IamClient { inner })
    }
}
