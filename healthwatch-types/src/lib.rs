//! # healthwatch-types
//!
//! Core types for tracking health-check state across successive snapshots.
//! These types match the JSON emitted by `consul watch -type=checks`: every
//! snapshot is an array of check objects carrying at least a `CheckID` and a
//! `Status`, plus free-form descriptive fields that are passed through
//! untouched.
//!
//! ## Example
//!
//! ```rust
//! use healthwatch_types::{CheckRecord, Snapshot, Status};
//!
//! let snapshot = Snapshot::from_records(vec![
//!     CheckRecord::new("service:web", Status::Passing),
//!     CheckRecord::new("serfHealth", Status::Critical),
//! ]);
//!
//! assert_eq!(snapshot.len(), 2);
//! assert_eq!(snapshot.get("serfHealth").map(|c| c.status), Some(Status::Critical));
//! ```

mod check;
mod delta;
mod snapshot;
mod status;

pub use check::*;
pub use delta::*;
pub use snapshot::*;
pub use status::*;
