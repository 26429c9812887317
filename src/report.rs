//! Machine-readable diagnostics.
//!
//! Diagnostics go to their own stream (stdout by default) as JSON so that a
//! supervisor can collect them separately from the `tracing` log on stderr:
//!
//! - every unparsable input line as `{"unparsable line": "<raw>"}`
//! - in verbose mode, every computed delta set before filtering, pretty
//!   printed as an object keyed by check id

use std::io::{self, Write};

use healthwatch_types::DeltaSet;
use serde_json::json;

/// Writes diagnostic records to a stream.
pub struct Reporter {
    out: Box<dyn Write + Send>,
    verbose: bool,
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter").field("verbose", &self.verbose).finish()
    }
}

impl Reporter {
    /// Report to `out`.
    pub fn new(out: Box<dyn Write + Send>, verbose: bool) -> Self {
        Self { out, verbose }
    }

    /// Report to stdout.
    pub fn stdout(verbose: bool) -> Self {
        Self::new(Box::new(io::stdout()), verbose)
    }

    /// Discard everything.
    pub fn sink() -> Self {
        Self::new(Box::new(io::sink()), false)
    }

    /// Record a line that could not be parsed.
    pub fn unparsable(&mut self, raw: &str) -> io::Result<()> {
        let record = json!({ "unparsable line": raw });
        writeln!(self.out, "{}", record)?;
        self.out.flush()
    }

    /// Dump a delta set. Does nothing unless verbose.
    pub fn deltas(&mut self, deltas: &DeltaSet) -> io::Result<()> {
        if !self.verbose {
            return Ok(());
        }
        let pretty = serde_json::to_string_pretty(deltas)?;
        writeln!(self.out, "{}", pretty)?;
        self.out.flush()
    }
}
