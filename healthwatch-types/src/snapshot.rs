//! Snapshot - the full set of check states observed at one point in time.

use std::collections::BTreeMap;

use crate::CheckRecord;

/// A point-in-time view of every health check, keyed by `CheckID`.
///
/// Built fresh from each record the watcher emits. Identifiers are unique;
/// when the source contains duplicates the last one wins.
///
/// # Example
///
/// ```rust
/// use healthwatch_types::{CheckRecord, Snapshot, Status};
///
/// let snapshot = Snapshot::from_records(vec![
///     CheckRecord::new("web", Status::Passing),
///     CheckRecord::new("web", Status::Warning),
/// ]);
///
/// assert_eq!(snapshot.len(), 1);
/// assert_eq!(snapshot.get("web").unwrap().status, Status::Warning);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    checks: BTreeMap<String, CheckRecord>,
}

impl Snapshot {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from an ordered sequence of records.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = CheckRecord>,
    {
        let checks = records
            .into_iter()
            .map(|record| (record.check_id.clone(), record))
            .collect();
        Self { checks }
    }

    /// Parse a snapshot from the watcher's JSON array form.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let records: Vec<CheckRecord> = serde_json::from_str(json)?;
        Ok(Self::from_records(records))
    }

    /// Check if the snapshot is empty (no checks).
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Number of checks in the snapshot.
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// Get a specific check.
    pub fn get(&self, check_id: &str) -> Option<&CheckRecord> {
        self.checks.get(check_id)
    }

    /// Check whether a check is present.
    pub fn contains(&self, check_id: &str) -> bool {
        self.checks.contains_key(check_id)
    }

    /// Iterate over all checks in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &CheckRecord)> {
        self.checks.iter()
    }
}

impl FromIterator<CheckRecord> for Snapshot {
    fn from_iter<I: IntoIterator<Item = CheckRecord>>(iter: I) -> Self {
        Self::from_records(iter)
    }
}
