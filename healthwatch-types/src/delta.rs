//! State deltas between two snapshots.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{CheckRecord, Status};

/// Key under which the previous status is serialized.
pub const PREVIOUS_STATUS_KEY: &str = "PreviousStatus";

/// A single check whose status changed between two consecutive snapshots.
///
/// Serializes as the current record's fields plus a `PreviousStatus` key,
/// which is the payload published for each forwarded transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDelta {
    /// The check as it looks now.
    #[serde(flatten)]
    pub current: CheckRecord,

    /// The status the check had in the previous snapshot.
    #[serde(rename = "PreviousStatus")]
    pub previous_status: Status,
}

impl StateDelta {
    /// Combine the current record with the status it used to have.
    ///
    /// Any `PreviousStatus` carried in the record's own fields is dropped so
    /// the computed one is the only one serialized.
    pub fn new(mut current: CheckRecord, previous_status: Status) -> Self {
        current.fields.remove(PREVIOUS_STATUS_KEY);
        Self {
            current,
            previous_status,
        }
    }

    /// Identifier of the check that changed.
    pub fn check_id(&self) -> &str {
        &self.current.check_id
    }

    /// The status transitioned into.
    pub fn status(&self) -> Status {
        self.current.status
    }

    /// Returns true if the change is a worsening.
    pub fn is_escalation(&self) -> bool {
        self.previous_status.escalates_to(self.current.status)
    }
}

/// All deltas computed for one snapshot, keyed by `CheckID`.
pub type DeltaSet = BTreeMap<String, StateDelta>;
