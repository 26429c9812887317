//! Input side of the relay: where snapshot records come from.
//!
//! The watcher emits one JSON array per line. A source turns those lines into
//! [`Record`]s in arrival order, each carrying the raw text and either the
//! parsed [`Snapshot`](healthwatch_types::Snapshot) or the [`ParseError`].
//!
//! A failure to read the input itself is not a bad record; it ends the source
//! and is handed to the caller as an [`io::Error`](std::io::Error).

mod snapshot;
mod stream;

pub use snapshot::{parse_snapshot, Record};
pub use stream::StreamSource;

use std::fmt::Debug;
use std::io;

use async_trait::async_trait;

/// Trait for receiving snapshot records from various sources.
///
/// # Example
///
/// ```
/// use healthwatch::{SnapshotSource, StreamSource};
///
/// # tokio_test::block_on(async {
/// let input = std::io::Cursor::new(b"[{\"CheckID\":\"web\",\"Status\":\"passing\"}]\n".to_vec());
/// let mut source = StreamSource::spawn(input, "stdin");
/// let record = source.next().await.unwrap().unwrap();
/// assert_eq!(record.parsed.unwrap().len(), 1);
/// # });
/// ```
#[async_trait]
pub trait SnapshotSource: Send + Debug {
    /// Wait for the next record.
    ///
    /// Returns `None` once the source is exhausted. Records are yielded in
    /// the order they were read. A read error is yielded once, as the last
    /// item.
    async fn next(&mut self) -> Option<io::Result<Record>>;

    /// Returns a human-readable description of the source.
    fn description(&self) -> &str;
}
