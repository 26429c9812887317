//! Topic address resolution.
//!
//! A fully-qualified SNS topic ARN has six colon-separated segments:
//!
//! ```text
//! arn:aws:sns:<region>:<account id>:<topic name>
//! ```
//!
//! Users may give any right-hand suffix of that. Missing segments are filled
//! in from the right: the account id (looked up), then the region, then the
//! literals `sns`, `aws` and `arn`.

use std::fmt;

use async_trait::async_trait;

use crate::error::AddressError;

const SEGMENTS: usize = 6;
const PREFIX: [&str; 3] = ["arn", "aws", "sns"];

/// Source of the caller's AWS account id.
///
/// Only consulted when the topic identifier is a bare topic name.
#[async_trait]
pub trait IdentityLookup: Send + Sync {
    /// The twelve-digit account id of the caller.
    async fn account_id(&self) -> Result<String, AddressError>;
}

/// A validated, fully-qualified SNS topic ARN.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicAddress {
    arn: String,
}

impl TopicAddress {
    /// Validate a fully-qualified ARN.
    pub fn parse(arn: &str) -> Result<Self, AddressError> {
        let segments: Vec<&str> = arn.split(':').collect();
        if segments.len() != SEGMENTS || segments[..3] != PREFIX {
            return Err(AddressError::InvalidArn(arn.to_string()));
        }
        Ok(Self {
            arn: arn.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.arn
    }

    pub fn region(&self) -> &str {
        self.segment(3)
    }

    fn segment(&self, index: usize) -> &str {
        self.arn.split(':').nth(index).unwrap_or_default()
    }
}

impl fmt::Display for TopicAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.arn)
    }
}

/// Expand a partial topic identifier into a full ARN.
///
/// `lookup` is called only when `partial` has a single segment.
pub async fn resolve(
    partial: &str,
    region: &str,
    lookup: &dyn IdentityLookup,
) -> Result<TopicAddress, AddressError> {
    if partial.trim().is_empty() {
        return Err(AddressError::Empty);
    }

    let mut segments: Vec<String> = partial.split(':').map(str::to_string).collect();

    if segments.len() == 1 {
        segments.insert(0, lookup.account_id().await?);
    }
    if segments.len() == 2 {
        segments.insert(0, region.to_string());
    }
    if segments.len() == 3 {
        segments.insert(0, "sns".to_string());
    }
    if segments.len() == 4 {
        segments.insert(0, "aws".to_string());
    }
    if segments.len() == 5 {
        segments.insert(0, "arn".to_string());
    }

    TopicAddress::parse(&segments.join(":"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedAccount {
        account_id: &'static str,
        calls: AtomicUsize,
    }

    impl FixedAccount {
        fn new(account_id: &'static str) -> Self {
            Self {
                account_id,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl IdentityLookup for FixedAccount {
        async fn account_id(&self) -> Result<String, AddressError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.account_id.to_string())
        }
    }

    struct FailingLookup;

    #[async_trait]
    impl IdentityLookup for FailingLookup {
        async fn account_id(&self) -> Result<String, AddressError> {
            Err(AddressError::InvalidAccountId("12345".to_string()))
        }
    }

    const FULL: &str = "arn:aws:sns:us-east-1:019661432785:alerts";

    #[tokio::test]
    async fn test_bare_name_uses_lookup() {
        let lookup = FixedAccount::new("019661432785");
        let topic = resolve("alerts", "us-east-1", &lookup).await.unwrap();

        assert_eq!(topic.as_str(), FULL);
        assert_eq!(lookup.calls(), 1);
    }

    #[tokio::test]
    async fn test_account_and_name() {
        let lookup = FixedAccount::new("999999999999");
        let topic = resolve("019661432785:alerts", "us-east-1", &lookup).await.unwrap();

        assert_eq!(topic.as_str(), FULL);
        assert_eq!(lookup.calls(), 0);
    }

    #[tokio::test]
    async fn test_every_suffix_resolves() {
        let lookup = FixedAccount::new("019661432785");
        let partials = [
            "us-east-1:019661432785:alerts",
            "sns:us-east-1:019661432785:alerts",
            "aws:sns:us-east-1:019661432785:alerts",
            FULL,
        ];

        for partial in partials {
            let topic = resolve(partial, "eu-west-1", &lookup).await.unwrap();
            assert_eq!(topic.as_str(), FULL, "partial: {partial}");
        }
        assert_eq!(lookup.calls(), 0);
    }

    #[tokio::test]
    async fn test_region_default_applies_to_short_forms_only() {
        let lookup = FixedAccount::new("019661432785");
        let topic = resolve("alerts", "ap-southeast-2", &lookup).await.unwrap();
        assert_eq!(topic.region(), "ap-southeast-2");
        assert_eq!(topic.as_str(), "arn:aws:sns:ap-southeast-2:019661432785:alerts");
    }

    #[tokio::test]
    async fn test_seven_segments_fail() {
        let lookup = FixedAccount::new("019661432785");
        let err = resolve("x:arn:aws:sns:us-east-1:019661432785:alerts", "us-east-1", &lookup)
            .await
            .unwrap_err();
        assert!(matches!(err, AddressError::InvalidArn(_)));
    }

    #[tokio::test]
    async fn test_wrong_prefix_fails() {
        let lookup = FixedAccount::new("019661432785");
        for partial in [
            "arn:aws:sqs:us-east-1:019661432785:alerts",
            "arn:aws-cn:sns:us-east-1:019661432785:alerts",
            "xyz:sns:us-east-1:019661432785:alerts",
        ] {
            let err = resolve(partial, "us-east-1", &lookup).await.unwrap_err();
            assert!(matches!(err, AddressError::InvalidArn(_)), "partial: {partial}");
        }
    }

    #[tokio::test]
    async fn test_lookup_failure_propagates() {
        let err = resolve("alerts", "us-east-1", &FailingLookup).await.unwrap_err();
        assert!(matches!(err, AddressError::InvalidAccountId(_)));
    }

    #[tokio::test]
    async fn test_empty_identifier() {
        let lookup = FixedAccount::new("019661432785");
        let err = resolve("", "us-east-1", &lookup).await.unwrap_err();
        assert!(matches!(err, AddressError::Empty));
        assert_eq!(lookup.calls(), 0);
    }

    #[test]
    fn test_error_message() {
        let err = TopicAddress::parse("arn:aws:sqs:us-east-1:019661432785:alerts").unwrap_err();
        assert_eq!(
            err.to_string(),
            "arn:aws:sqs:us-east-1:019661432785:alerts doesn't look like a valid SNS ARN"
        );
    }
}
