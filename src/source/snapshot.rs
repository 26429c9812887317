//! Parsing of watcher output into snapshots.

use healthwatch_types::Snapshot;

use crate::error::ParseError;

/// One line of input, parsed or not.
#[derive(Debug)]
pub struct Record {
    /// The line as received, without the trailing newline.
    pub raw: String,
    /// The snapshot, or why the line could not be read as one.
    pub parsed: Result<Snapshot, ParseError>,
}

impl Record {
    /// Parse a raw line into a record.
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let parsed = parse_snapshot(&raw);
        Self { raw, parsed }
    }
}

/// Parse one record of `consul watch -type=checks` output.
///
/// The record must be a JSON array of check objects, each with at least a
/// `CheckID` and a `Status` of `passing`, `warning` or `critical`.
pub fn parse_snapshot(line: &str) -> Result<Snapshot, ParseError> {
    Ok(Snapshot::from_json(line.trim())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use healthwatch_types::Status;

    #[test]
    fn test_parse_consul_watch_line() {
        let line = r#"[{"Node":"foobar","CheckID":"serfHealth","Name":"Serf Health Status","Status":"passing","Notes":"","Output":"","ServiceID":"","ServiceName":""},{"Node":"foobar","CheckID":"service:redis","Name":"Service 'redis' check","Status":"critical","Notes":"","Output":"timeout","ServiceID":"redis","ServiceName":"redis"}]"#;

        let snapshot = parse_snapshot(line).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get("service:redis").unwrap().status, Status::Critical);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_snapshot("not valid json").is_err());
        assert!(parse_snapshot(r#"{"CheckID":"web","Status":"passing"}"#).is_err());
        assert!(parse_snapshot(r#"[{"CheckID":"web"}]"#).is_err());
        assert!(parse_snapshot(r#"[{"Status":"passing"}]"#).is_err());
        assert!(parse_snapshot(r#"[{"CheckID":"web","Status":"maintenance"}]"#).is_err());
    }

    #[test]
    fn test_record_keeps_raw_line() {
        let record = Record::parse("garbage");
        assert_eq!(record.raw, "garbage");
        assert!(record.parsed.is_err());
    }
}
