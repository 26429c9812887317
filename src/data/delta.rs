//! State deltas between consecutive snapshots.

use healthwatch_types::{DeltaSet, Snapshot, StateDelta};

/// Compute the checks whose status changed from `previous` to `current`.
///
/// Only checks present in both snapshots are compared. A check that appears
/// for the first time, or that vanished since `previous`, produces nothing.
pub fn compute(previous: &Snapshot, current: &Snapshot) -> DeltaSet {
    current
        .iter()
        .filter_map(|(check_id, now)| {
            let then = previous.get(check_id)?;
            (then.status != now.status)
                .then(|| (check_id.clone(), StateDelta::new(now.clone(), then.status)))
        })
        .collect()
}

/// Holds the last accepted snapshot and diffs each new one against it.
///
/// The first snapshot only establishes the baseline. Mutation goes through
/// `&mut self`, so there is exactly one writer.
#[derive(Debug, Clone, Default)]
pub struct DeltaTracker {
    previous: Option<Snapshot>,
}

impl DeltaTracker {
    /// Create a tracker with no baseline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Diff `current` against the stored snapshot, then store `current`.
    ///
    /// Returns an empty set when there was no baseline yet.
    pub fn observe(&mut self, current: Snapshot) -> DeltaSet {
        let delta = match &self.previous {
            Some(previous) => compute(previous, &current),
            None => DeltaSet::new(),
        };
        self.previous = Some(current);
        delta
    }

    /// The snapshot the next one will be compared against.
    pub fn previous(&self) -> Option<&Snapshot> {
        self.previous.as_ref()
    }

    /// Returns true once a baseline has been established.
    pub fn has_baseline(&self) -> bool {
        self.previous.is_some()
    }
}
