//! Health-check status values.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The state a health check can be in.
///
/// Ordered by severity: `Passing < Warning < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Passing,
    Warning,
    Critical,
}

impl Status {
    /// All states, in severity order.
    pub const ALL: [Status; 3] = [Status::Passing, Status::Warning, Status::Critical];

    /// The wire name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Passing => "passing",
            Status::Warning => "warning",
            Status::Critical => "critical",
        }
    }

    /// Returns true if moving from `self` to `to` is a worsening.
    pub fn escalates_to(&self, to: Status) -> bool {
        to > *self
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a known status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a valid state", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for Status {
    type Err = UnknownStatus;

    /// Case-insensitive parse of `passing`, `warning` or `critical`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "passing" => Ok(Status::Passing),
            "warning" => Ok(Status::Warning),
            "critical" => Ok(Status::Critical),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("Passing".parse::<Status>(), Ok(Status::Passing));
        assert_eq!("WARNING".parse::<Status>(), Ok(Status::Warning));
        assert_eq!("critical".parse::<Status>(), Ok(Status::Critical));
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = "maintenance".parse::<Status>().unwrap_err();
        assert_eq!(err.to_string(), "'maintenance' is not a valid state");
    }

    #[test]
    fn test_severity_order() {
        assert!(Status::Passing.escalates_to(Status::Critical));
        assert!(Status::Warning.escalates_to(Status::Critical));
        assert!(!Status::Critical.escalates_to(Status::Warning));
        assert!(!Status::Warning.escalates_to(Status::Warning));
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Status::Warning).unwrap(), r#""warning""#);
        let status: Status = serde_json::from_str(r#""critical""#).unwrap();
        assert_eq!(status, Status::Critical);
    }
}
