//! Stream-based snapshot source.
//!
//! Reads newline-delimited watcher output from a byte stream such as stdin,
//! a pipe or a file.

use std::io::{self, BufRead, BufReader, Read};
use std::thread;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, error};

use super::{Record, SnapshotSource};

/// Records buffered between the reader thread and the pipeline.
const CHANNEL_CAPACITY: usize = 16;

/// A source that receives snapshot records from a byte stream.
///
/// A dedicated reader thread reads lines and parses them; the channel between
/// the thread and [`next`](SnapshotSource::next) preserves line order, so
/// snapshot *n* is always delivered before snapshot *n + 1*. Blank lines are
/// skipped.
///
/// The reader is a plain OS thread rather than a runtime blocking task. A
/// read on an idle pipe cannot be cancelled, and the runtime would otherwise
/// wait for it on shutdown; the process exits without joining this thread.
///
/// # Example
///
/// ```
/// use std::io::Cursor;
/// use healthwatch::StreamSource;
///
/// # tokio_test::block_on(async {
/// let data = b"[]\n";
/// let stream = Cursor::new(data.to_vec());
/// let source = StreamSource::spawn(stream, "example");
/// # });
/// ```
#[derive(Debug)]
pub struct StreamSource {
    receiver: mpsc::Receiver<io::Result<Record>>,
    description: String,
}

impl StreamSource {
    /// Spawn a reader thread for the given reader.
    ///
    /// The thread ends at end-of-input, after forwarding a read error, or
    /// when the source is dropped.
    pub fn spawn<R>(reader: R, description: &str) -> Self
    where
        R: Read + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let desc = description.to_string();

        thread::spawn(move || read_lines(BufReader::new(reader), &desc, tx));

        Self {
            receiver: rx,
            description: format!("stream: {}", description),
        }
    }
}

fn read_lines<R: BufRead>(mut reader: R, desc: &str, tx: mpsc::Sender<io::Result<Record>>) {
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => {
                debug!(source = %desc, "end of input");
                break;
            }
            Ok(_) => {
                // Invalid UTF-8 is kept so the line is reported as unparsable
                let line = String::from_utf8_lossy(&buf);
                let raw = line.trim_end_matches(['\r', '\n']);
                if raw.trim().is_empty() {
                    continue;
                }
                if tx.blocking_send(Ok(Record::parse(raw))).is_err() {
                    // Receiver dropped
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                error!(source = %desc, error = %e, "read error");
                let _ = tx.blocking_send(Err(e));
                break;
            }
        }
    }
}

#[async_trait]
impl SnapshotSource for StreamSource {
    async fn next(&mut self) -> Option<io::Result<Record>> {
        self.receiver.recv().await
    }

    fn description(&self) -> &str {
        &self.description
    }
}
