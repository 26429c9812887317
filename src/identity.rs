//! Caller identity: where the account id for bare topic names comes from.
//!
//! The primary path asks IAM for the caller's own user (`GetUser`). Callers
//! without `iam:GetUser` get an access-denied rejection whose message names
//! their ARN:
//!
//! ```text
//! User: arn:aws:iam::123456789012:user/relay is not authorized to perform: iam:GetUser ...
//! ```
//!
//! [`caller_arn_from_denial`] pulls the ARN out of that text. It depends on
//! the wording of an error message and is kept as a separate, clearly named
//! fallback so it can be replaced without touching topic resolution.

use std::sync::OnceLock;

use async_trait::async_trait;
use healthwatch_aws::{AwsError, IamClient};
use regex::Regex;
use tracing::{debug, warn};

use crate::error::AddressError;
use crate::topic::IdentityLookup;

fn account_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]{12}$").expect("account id pattern is valid"))
}

/// Accept `account_id` only if it is exactly twelve decimal digits.
pub fn validate_account_id(account_id: &str) -> Result<String, AddressError> {
    if account_id_pattern().is_match(account_id) {
        Ok(account_id.to_string())
    } else {
        Err(AddressError::InvalidAccountId(account_id.to_string()))
    }
}

/// Extract and validate the account id from an IAM ARN.
///
/// The account id is the fifth segment: `arn:aws:iam::<account>:user/name`.
pub fn account_id_from_arn(arn: &str) -> Result<String, AddressError> {
    let account_id = arn
        .split(':')
        .nth(4)
        .ok_or_else(|| AddressError::InvalidCallerArn(arn.to_string()))?;
    validate_account_id(account_id)
}

/// Fallback: the caller's ARN as quoted in an access-denied message.
///
/// Returns the second whitespace-separated word if it looks like an ARN.
pub fn caller_arn_from_denial(message: &str) -> Option<&str> {
    message
        .split_whitespace()
        .nth(1)
        .filter(|word| word.starts_with("arn:"))
}

/// Account id lookup backed by IAM `GetUser`.
#[derive(Debug, Clone)]
pub struct IamAccountLookup {
    client: IamClient,
}

impl IamAccountLookup {
    pub fn new(client: IamClient) -> Self {
        Self { client }
    }

    /// Caller ARN via `GetUser`, falling back to the denial message.
    async fn caller_arn(&self) -> Result<String, AddressError> {
        match self.client.get_user_arn().await {
            Ok(arn) => Ok(arn),
            Err(err) if err.is_access_denied() => Self::arn_from_rejection(err),
            Err(err) => Err(AddressError::Identity(err)),
        }
    }

    fn arn_from_rejection(err: AwsError) -> Result<String, AddressError> {
        let arn = err
            .service_message()
            .and_then(caller_arn_from_denial)
            .map(str::to_string);

        match arn {
            Some(arn) => {
                warn!(arn = %arn, "iam:GetUser denied, using ARN from the error message");
                Ok(arn)
            }
            None => Err(AddressError::Identity(err)),
        }
    }
}

#[async_trait]
impl IdentityLookup for IamAccountLookup {
    async fn account_id(&self) -> Result<String, AddressError> {
        let arn = self.caller_arn().await?;
        let account_id = account_id_from_arn(&arn)?;
        debug!(account_id = %account_id, "resolved account id");
        Ok(account_id)
    }
}

/// A configured account id; no network lookup.
#[derive(Debug, Clone)]
pub struct StaticAccountId(String);

impl StaticAccountId {
    /// Validates `account_id` up front.
    pub fn new(account_id: &str) -> Result<Self, AddressError> {
        validate_account_id(account_id).map(Self)
    }
}

#[async_trait]
impl IdentityLookup for StaticAccountId {
    async fn account_id(&self) -> Result<String, AddressError> {
        Ok(self.0.clone())
    }
}

/// Stands in when there are no credentials to ask IAM with.
///
/// Fails only if a lookup is actually needed, so fully-qualified topics still
/// resolve.
#[derive(Debug, Clone)]
pub struct UnavailableLookup {
    reason: String,
}

impl UnavailableLookup {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl IdentityLookup for UnavailableLookup {
    async fn account_id(&self) -> Result<String, AddressError> {
        Err(AddressError::Identity(AwsError::Credentials(self.reason.clone())))
    }
}
