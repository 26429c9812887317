//! AWS credentials.

use std::fmt;

use crate::AwsError;

const ENV_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
const ENV_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
const ENV_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";

/// An access key pair, optionally with a session token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
}

impl Credentials {
    /// Create credentials from an explicit key pair.
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        }
    }

    /// Attach a session token (temporary credentials).
    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    /// Read credentials from the standard `AWS_*` environment variables.
    pub fn from_env() -> Result<Self, AwsError> {
        let access_key_id = non_empty_env(ENV_ACCESS_KEY_ID)
            .ok_or_else(|| AwsError::Credentials(format!("{ENV_ACCESS_KEY_ID} is not set")))?;
        let secret_access_key = non_empty_env(ENV_SECRET_ACCESS_KEY)
            .ok_or_else(|| AwsError::Credentials(format!("{ENV_SECRET_ACCESS_KEY} is not set")))?;

        Ok(Self {
            access_key_id,
            secret_access_key,
            session_token: non_empty_env(ENV_SESSION_TOKEN),
        })
    }

    /// Use the explicit pair when both halves are given, else the environment.
    ///
    /// Supplying only one half of a key pair is an error.
    pub fn resolve(
        access_key_id: Option<&str>,
        secret_access_key: Option<&str>,
    ) -> Result<Self, AwsError> {
        match (access_key_id, secret_access_key) {
            (Some(id), Some(secret)) => Ok(Self::new(id, secret)),
            (None, None) => Self::from_env(),
            _ => Err(AwsError::Credentials(
                "access key id and secret access key must be given together".to_string(),
            )),
        }
    }

    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }

    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
