//! Change detection and transition filtering.
//!
//! ## Submodules
//!
//! - [`delta`]: Per-check status changes between consecutive snapshots
//! - [`policy`]: Which status transitions are forwarded ([`TransitionPolicy`])
//!
//! ## Data Flow
//!
//! ```text
//! Snapshot (parsed line)
//!        │
//!        ▼
//! DeltaTracker::observe()  ──▶ DeltaSet (changed checks + PreviousStatus)
//!        │
//!        ▼
//! TransitionPolicy::should_forward() per delta
//! ```

pub mod delta;
pub mod policy;

pub use delta::{compute, DeltaTracker};
pub use policy::{should_forward, PolicyBuilder, TransitionPolicy};
