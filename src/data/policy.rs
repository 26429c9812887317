//! Transition policy: which status changes are worth forwarding.
//!
//! A policy maps each source status to the set of destination statuses that
//! should be forwarded. It is assembled once at startup from three knobs:
//!
//! - **escalation** adds every worsening transition
//! - **de-escalation** adds every improving transition
//! - **filter** adds explicit `source -> [targets]` pairs from JSON
//!
//! The knobs are additive. With none of them set, every transition is
//! forwarded. Once any knob is set the allow-all default is off and the
//! policy is exactly the union of what the knobs contribute, so an explicit
//! filter combined with `escalation` forwards the filter's pairs *and* all
//! escalations.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use healthwatch_types::{StateDelta, Status};
use serde_json::Value;

use crate::error::ConfigError;

/// Allowed destination statuses per source status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionPolicy {
    allowed: BTreeMap<Status, BTreeSet<Status>>,
}

impl Default for TransitionPolicy {
    fn default() -> Self {
        Self::allow_all()
    }
}

impl TransitionPolicy {
    /// A policy that forwards nothing.
    pub fn empty() -> Self {
        Self {
            allowed: Status::ALL.iter().map(|s| (*s, BTreeSet::new())).collect(),
        }
    }

    /// A policy that forwards every change of status.
    pub fn allow_all() -> Self {
        let mut policy = Self::empty();
        for from in Status::ALL {
            for to in Status::ALL {
                if from != to {
                    policy.allow(from, to);
                }
            }
        }
        policy
    }

    /// Create a builder.
    pub fn builder() -> PolicyBuilder {
        PolicyBuilder::default()
    }

    /// Build a policy from the three configuration knobs.
    pub fn from_flags(
        escalation: bool,
        de_escalation: bool,
        filter: Option<&Value>,
    ) -> Result<Self, ConfigError> {
        let mut policy = if !escalation && !de_escalation && filter.is_none() {
            Self::allow_all()
        } else {
            Self::empty()
        };

        if escalation {
            policy.allow(Status::Passing, Status::Warning);
            policy.allow(Status::Passing, Status::Critical);
            policy.allow(Status::Warning, Status::Critical);
        }
        if de_escalation {
            policy.allow(Status::Critical, Status::Passing);
            policy.allow(Status::Critical, Status::Warning);
            policy.allow(Status::Warning, Status::Passing);
        }
        if let Some(filter) = filter {
            for (from, to) in parse_filter(filter)? {
                policy.allow(from, to);
            }
        }

        Ok(policy)
    }

    /// Forward transitions from `from` to `to`.
    pub fn allow(&mut self, from: Status, to: Status) {
        self.allowed.entry(from).or_default().insert(to);
    }

    /// Returns true if a change from `from` to `to` is forwarded.
    pub fn allows(&self, from: Status, to: Status) -> bool {
        self.allowed.get(&from).is_some_and(|targets| targets.contains(&to))
    }

    /// Destination statuses forwarded when leaving `from`.
    pub fn targets(&self, from: Status) -> impl Iterator<Item = Status> + '_ {
        self.allowed.get(&from).into_iter().flatten().copied()
    }

    /// Decide whether a delta should be published.
    pub fn should_forward(&self, delta: &StateDelta) -> bool {
        self.allows(delta.previous_status, delta.status())
    }
}

impl fmt::Display for TransitionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rules: Vec<String> = Status::ALL
            .iter()
            .map(|from| {
                let targets: Vec<&str> = self.targets(*from).map(|s| s.as_str()).collect();
                format!("{} -> [{}]", from, targets.join(", "))
            })
            .collect();
        f.write_str(&rules.join("; "))
    }
}

/// Decide whether `delta` passes `policy`.
pub fn should_forward(delta: &StateDelta, policy: &TransitionPolicy) -> bool {
    policy.should_forward(delta)
}

/// Turn a filter document into `(source, target)` pairs.
///
/// The document must be an object mapping state names to arrays of state
/// names. State names are matched case-insensitively.
fn parse_filter(filter: &Value) -> Result<Vec<(Status, Status)>, ConfigError> {
    let entries = filter.as_object().ok_or(ConfigError::FilterNotObject)?;

    let mut pairs = Vec::new();
    for (key, targets) in entries {
        let from: Status = key
            .parse()
            .map_err(|_| ConfigError::InvalidState(key.clone()))?;
        let targets = targets
            .as_array()
            .ok_or_else(|| ConfigError::TargetsNotArray(key.clone()))?;

        for target in targets {
            let name = target
                .as_str()
                .ok_or_else(|| ConfigError::TargetNotString(key.clone()))?;
            let to: Status = name.parse().map_err(|_| ConfigError::InvalidTarget {
                source_state: key.clone(),
                target: name.to_string(),
            })?;
            pairs.push((from, to));
        }
    }
    Ok(pairs)
}

/// Builder for [`TransitionPolicy`].
///
/// # Example
///
/// ```
/// use healthwatch::TransitionPolicy;
/// use healthwatch_types::Status;
///
/// let policy = TransitionPolicy::builder()
///     .filter_json(r#"{"warning": ["critical"]}"#)
///     .unwrap()
///     .build()
///     .unwrap();
///
/// assert!(policy.allows(Status::Warning, Status::Critical));
/// assert!(!policy.allows(Status::Passing, Status::Critical));
/// ```
#[derive(Debug, Default, Clone)]
pub struct PolicyBuilder {
    escalation: bool,
    de_escalation: bool,
    filter: Option<Value>,
}

impl PolicyBuilder {
    /// Forward worsening transitions.
    pub fn escalation(mut self, enabled: bool) -> Self {
        self.escalation = enabled;
        self
    }

    /// Forward improving transitions.
    pub fn de_escalation(mut self, enabled: bool) -> Self {
        self.de_escalation = enabled;
        self
    }

    /// Add an explicit filter document.
    pub fn filter(mut self, filter: Value) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Add an explicit filter from its JSON text.
    pub fn filter_json(self, json: &str) -> Result<Self, ConfigError> {
        let value = serde_json::from_str(json).map_err(ConfigError::FilterJson)?;
        Ok(self.filter(value))
    }

    /// Build the policy, validating the filter.
    pub fn build(self) -> Result<TransitionPolicy, ConfigError> {
        TransitionPolicy::from_flags(self.escalation, self.de_escalation, self.filter.as_ref())
    }
}
