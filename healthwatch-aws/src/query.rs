//! Shared transport for AWS query-protocol services.
//!
//! Every call is a signed, form-encoded `POST /` carrying `Action` and
//! `Version`. Successful responses are XML documents; failures are
//! `ErrorResponse` documents with a `Code` and `Message`.

use std::time::Duration;

use chrono::Utc;
use reqwest::{Client, Url};
use tracing::debug;

use crate::signing::{sign_form_post, FORM_CONTENT_TYPE};
use crate::{AwsError, Credentials};

/// Default request timeout.
pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A signed client bound to one service endpoint.
#[derive(Debug, Clone)]
pub(crate) struct QueryClient {
    client: Client,
    endpoint: Url,
    host: String,
    service: &'static str,
    region: String,
    version: &'static str,
    credentials: Credentials,
}

impl QueryClient {
    pub(crate) fn new(
        endpoint: &str,
        service: &'static str,
        region: String,
        version: &'static str,
        credentials: Credentials,
        timeout: Duration,
    ) -> Result<Self, AwsError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| AwsError::Config(format!("invalid endpoint '{}': {}", endpoint, e)))?;
        let host = host_header(&endpoint)?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AwsError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            host,
            service,
            region,
            version,
            credentials,
        })
    }

    pub(crate) fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub(crate) fn region(&self) -> &str {
        &self.region
    }

    /// Invoke `action` and return the raw XML response body.
    pub(crate) async fn call(
        &self,
        action: &str,
        params: &[(&str, &str)],
    ) -> Result<String, AwsError> {
        let mut pairs = vec![("Action", action), ("Version", self.version)];
        pairs.extend_from_slice(params);
        let body = form_encode(&pairs);

        let signed = sign_form_post(
            &self.credentials,
            &self.region,
            self.service,
            &self.host,
            &body,
            Utc::now(),
        );

        debug!(service = self.service, action, "calling AWS");

        let mut request = self
            .client
            .post(self.endpoint.clone())
            .header("content-type", FORM_CONTENT_TYPE)
            .header("x-amz-date", &signed.amz_date)
            .header("authorization", &signed.authorization);
        if let Some(token) = &signed.security_token {
            request = request.header("x-amz-security-token", token);
        }

        let response = request.body(body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(AwsError::Service {
                service: self.service,
                status: status.as_u16(),
                code: xml_text(&text, "Code").unwrap_or_else(|| "Unknown".to_string()),
                message: xml_text(&text, "Message").unwrap_or_else(|| text.trim().to_string()),
            });
        }

        Ok(text)
    }
}

fn host_header(url: &Url) -> Result<String, AwsError> {
    let host = url
        .host_str()
        .ok_or_else(|| AwsError::Config(format!("endpoint '{}' has no host", url)))?;
    Ok(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// Form-encode pairs with SigV4-compatible percent encoding.
pub(crate) fn form_encode(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Text of the first `<tag>...</tag>` element, with entities decoded.
///
/// Handles the documents the query API returns: unprefixed elements under a
/// default `xmlns`, no attributes on the element read, text content only.
/// Prefixed names (`<ns:Code>`), CDATA sections and numeric character
/// references are not recognised; SNS and IAM responses use none of them.
pub(crate) fn xml_text(xml: &str, tag: &str) -> Option<String> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let start = xml.find(&open)? + open.len();
    let end = start + xml[start..].find(&close)?;
    Some(unescape(xml[start..end].trim()))
}

fn unescape(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
