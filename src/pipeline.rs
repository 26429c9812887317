//! The relay loop: parse, diff, filter, publish.
//!
//! ```text
//!   SnapshotSource ──▶ Record ──▶ DeltaTracker ──▶ TransitionPolicy ──▶ Publisher
//!                        │              │
//!                        ▼              ▼
//!                     Reporter       Reporter
//!                  (unparsable)   (verbose deltas)
//! ```
//!
//! Records are handled strictly one at a time. Each forwarded delta is
//! published and awaited before the next delta, and the next record is not
//! read until the current one is done.

use healthwatch_types::{DeltaSet, Snapshot};
use tracing::{debug, error, info, warn};

use crate::data::{DeltaTracker, TransitionPolicy};
use crate::error::{PublishError, RunError};
use crate::publish::{publish_with_retry, PublishFailurePolicy, Publisher, RetryPolicy};
use crate::report::Reporter;
use crate::source::{Record, SnapshotSource};
use crate::topic::TopicAddress;

/// Counters kept over the life of a pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub records: u64,
    pub unparsable: u64,
    pub deltas: u64,
    pub forwarded: u64,
    pub filtered: u64,
    pub publish_failures: u64,
}

/// What happened to a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The line was not a snapshot; state is unchanged.
    Unparsable,
    /// First snapshot; stored as the baseline.
    Baseline,
    /// Diffed against the previous snapshot.
    Processed { deltas: usize, forwarded: usize },
}

/// Owns the previous-snapshot state and drives records through the relay.
pub struct Pipeline {
    tracker: DeltaTracker,
    policy: TransitionPolicy,
    topic: TopicAddress,
    publisher: Box<dyn Publisher>,
    reporter: Reporter,
    retry: RetryPolicy,
    on_publish_error: PublishFailurePolicy,
    stats: PipelineStats,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("topic", &self.topic)
            .field("policy", &self.policy.to_string())
            .field("publisher", &self.publisher.name())
            .field("stats", &self.stats)
            .finish()
    }
}

impl Pipeline {
    /// Create a pipeline with no baseline, silent diagnostics and no retries.
    pub fn new(
        topic: TopicAddress,
        policy: TransitionPolicy,
        publisher: Box<dyn Publisher>,
    ) -> Self {
        Self {
            tracker: DeltaTracker::new(),
            policy,
            topic,
            publisher,
            reporter: Reporter::sink(),
            retry: RetryPolicy::default(),
            on_publish_error: PublishFailurePolicy::default(),
            stats: PipelineStats::default(),
        }
    }

    /// Where diagnostics are written.
    pub fn with_reporter(mut self, reporter: Reporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// How failed publishes are retried.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// What happens when a publish still fails after retrying.
    pub fn on_publish_error(mut self, policy: PublishFailurePolicy) -> Self {
        self.on_publish_error = policy;
        self
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    /// The snapshot the next record will be diffed against.
    pub fn previous(&self) -> Option<&Snapshot> {
        self.tracker.previous()
    }

    /// Consume records until the source is exhausted.
    ///
    /// Returns early if the input cannot be read, or if a publish fails under
    /// [`PublishFailurePolicy::Abort`].
    pub async fn run(
        &mut self,
        source: &mut dyn SnapshotSource,
    ) -> Result<PipelineStats, RunError> {
        info!(
            source = source.description(),
            topic = %self.topic,
            publisher = self.publisher.name(),
            policy = %self.policy,
            "relay started"
        );

        while let Some(item) = source.next().await {
            let record = item.map_err(RunError::Input)?;
            self.process(record).await?;
        }

        info!(
            records = self.stats.records,
            unparsable = self.stats.unparsable,
            forwarded = self.stats.forwarded,
            filtered = self.stats.filtered,
            publish_failures = self.stats.publish_failures,
            "input exhausted"
        );
        Ok(self.stats)
    }

    /// Handle one record.
    pub async fn process(&mut self, record: Record) -> Result<Outcome, PublishError> {
        self.stats.records += 1;

        let snapshot = match record.parsed {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.stats.unparsable += 1;
                warn!(error = %e, "skipping unparsable line");
                if let Err(io) = self.reporter.unparsable(&record.raw) {
                    warn!(error = %io, "failed to write diagnostic");
                }
                return Ok(Outcome::Unparsable);
            }
        };

        if !self.tracker.has_baseline() {
            debug!(checks = snapshot.len(), "baseline snapshot");
            self.tracker.observe(snapshot);
            return Ok(Outcome::Baseline);
        }

        let deltas = self.tracker.observe(snapshot);
        self.stats.deltas += deltas.len() as u64;
        if let Err(io) = self.reporter.deltas(&deltas) {
            warn!(error = %io, "failed to write diagnostic");
        }

        let forwarded = self.forward(&deltas).await?;
        Ok(Outcome::Processed {
            deltas: deltas.len(),
            forwarded,
        })
    }

    /// Publish every delta the policy allows, one at a time.
    async fn forward(&mut self, deltas: &DeltaSet) -> Result<usize, PublishError> {
        let mut forwarded = 0;

        for (check_id, delta) in deltas {
            if !self.policy.should_forward(delta) {
                self.stats.filtered += 1;
                debug!(
                    check_id = %check_id,
                    from = %delta.previous_status,
                    to = %delta.status(),
                    "transition filtered"
                );
                continue;
            }

            let payload = serde_json::to_string(delta)?;
            match publish_with_retry(self.publisher.as_ref(), &self.topic, &payload, self.retry)
                .await
            {
                Ok(()) => {
                    forwarded += 1;
                    self.stats.forwarded += 1;
                    info!(
                        check_id = %check_id,
                        from = %delta.previous_status,
                        to = %delta.status(),
                        escalation = delta.is_escalation(),
                        "transition forwarded"
                    );
                }
                Err(e) => {
                    self.stats.publish_failures += 1;
                    match self.on_publish_error {
                        PublishFailurePolicy::Log => {
                            error!(check_id = %check_id, error = %e, "publish failed, delta dropped");
                        }
                        PublishFailurePolicy::Abort => return Err(e),
                    }
                }
            }
        }

        Ok(forwarded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publish::{ChannelPublisher, Published};
    use crate::report::tests::SharedBuf;
    use crate::source::StreamSource;
    use async_trait::async_trait;
    use healthwatch_types::Status;
    use std::io::{self, Cursor};
    use tokio::sync::mpsc;

    const TOPIC: &str = "arn:aws:sns:us-east-1:019661432785:alerts";

    fn line(checks: &[(&str, &str)]) -> String {
        let items: Vec<String> = checks
            .iter()
            .map(|(id, status)| {
                format!(r#"{{"Node":"n1","CheckID":"{}","Status":"{}"}}"#, id, status)
            })
            .collect();
        format!("[{}]", items.join(","))
    }

    fn pipeline(policy: TransitionPolicy) -> (Pipeline, mpsc::Receiver<Published>) {
        let (publisher, rx) = ChannelPublisher::create(64);
        let topic = TopicAddress::parse(TOPIC).unwrap();
        (Pipeline::new(topic, policy, Box::new(publisher)), rx)
    }

    fn drain(rx: &mut mpsc::Receiver<Published>) -> Vec<serde_json::Value> {
        let mut out = Vec::new();
        while let Ok(published) = rx.try_recv() {
            assert_eq!(published.topic, TOPIC);
            out.push(serde_json::from_str(&published.message).unwrap());
        }
        out
    }

    struct Failing;

    /// Yields a fixed list of items, then ends.
    #[derive(Debug)]
    struct Scripted(Vec<io::Result<Record>>);

    #[async_trait]
    impl SnapshotSource for Scripted {
        async fn next(&mut self) -> Option<io::Result<Record>> {
            (!self.0.is_empty()).then(|| self.0.remove(0))
        }

        fn description(&self) -> &str {
            "scripted"
        }
    }

    #[async_trait]
    impl Publisher for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn publish(&self, _: &TopicAddress, _: &str) -> Result<(), PublishError> {
            Err(PublishError::Closed)
        }
    }

    #[tokio::test]
    async fn test_first_snapshot_is_baseline() {
        let (mut pipeline, mut rx) = pipeline(TransitionPolicy::allow_all());

        let outcome = pipeline
            .process(Record::parse(line(&[("web", "critical")])))
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Baseline);
        assert!(drain(&mut rx).is_empty());
        assert!(pipeline.previous().is_some());
    }

    #[tokio::test]
    async fn test_forwards_changed_checks() {
        let (mut pipeline, mut rx) = pipeline(TransitionPolicy::allow_all());

        pipeline
            .process(Record::parse(line(&[("web", "passing"), ("db", "passing")])))
            .await
            .unwrap();
        let outcome = pipeline
            .process(Record::parse(line(&[("web", "critical"), ("db", "passing")])))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            Outcome::Processed {
                deltas: 1,
                forwarded: 1
            }
        );
        let published = drain(&mut rx);
        assert_eq!(published.len(), 1);
        assert_eq!(published[0]["CheckID"], "web");
        assert_eq!(published[0]["Status"], "critical");
        assert_eq!(published[0]["PreviousStatus"], "passing");
        assert_eq!(published[0]["Node"], "n1");
    }

    #[tokio::test]
    async fn test_policy_filters_deltas() {
        let policy = TransitionPolicy::from_flags(true, false, None).unwrap();
        let (mut pipeline, mut rx) = pipeline(policy);

        pipeline
            .process(Record::parse(line(&[("a", "passing"), ("b", "critical")])))
            .await
            .unwrap();
        pipeline
            .process(Record::parse(line(&[("a", "warning"), ("b", "passing")])))
            .await
            .unwrap();

        let published = drain(&mut rx);
        assert_eq!(published.len(), 1);
        assert_eq!(published[0]["CheckID"], "a");
        assert_eq!(pipeline.stats().filtered, 1);
        assert_eq!(pipeline.stats().forwarded, 1);
    }

    #[tokio::test]
    async fn test_malformed_line_leaves_state_untouched() {
        let diagnostics = SharedBuf::default();
        let (pipeline, mut rx) = pipeline(TransitionPolicy::allow_all());
        let mut pipeline = pipeline.with_reporter(Reporter::new(Box::new(diagnostics.clone()), false));

        pipeline
            .process(Record::parse(line(&[("web", "passing")])))
            .await
            .unwrap();
        let before = pipeline.previous().cloned();

        let outcome = pipeline.process(Record::parse("{oops")).await.unwrap();
        assert_eq!(outcome, Outcome::Unparsable);
        assert_eq!(pipeline.previous().cloned(), before);
        assert_eq!(diagnostics.contents().trim(), r#"{"unparsable line":"{oops"}"#);

        pipeline
            .process(Record::parse(line(&[("web", "warning")])))
            .await
            .unwrap();
        let published = drain(&mut rx);
        assert_eq!(published.len(), 1);
        assert_eq!(published[0]["PreviousStatus"], "passing");
    }

    #[tokio::test]
    async fn test_malformed_first_line_does_not_set_baseline() {
        let (mut pipeline, _rx) = pipeline(TransitionPolicy::allow_all());

        pipeline.process(Record::parse("nope")).await.unwrap();
        assert!(pipeline.previous().is_none());

        let outcome = pipeline
            .process(Record::parse(line(&[("web", "passing")])))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Baseline);
    }

    #[tokio::test]
    async fn test_verbose_dumps_deltas_before_filtering() {
        let diagnostics = SharedBuf::default();
        let policy = TransitionPolicy::from_flags(false, true, None).unwrap();
        let (pipeline, mut rx) = pipeline(policy);
        let mut pipeline = pipeline.with_reporter(Reporter::new(Box::new(diagnostics.clone()), true));

        pipeline
            .process(Record::parse(line(&[("web", "passing")])))
            .await
            .unwrap();
        assert!(diagnostics.contents().is_empty());

        pipeline
            .process(Record::parse(line(&[("web", "critical")])))
            .await
            .unwrap();

        assert!(drain(&mut rx).is_empty());
        let dump: serde_json::Value = serde_json::from_str(&diagnostics.contents()).unwrap();
        assert_eq!(dump["web"]["Status"], "critical");
    }

    #[tokio::test]
    async fn test_publish_failure_is_logged_by_default() {
        let topic = TopicAddress::parse(TOPIC).unwrap();
        let mut pipeline = Pipeline::new(topic, TransitionPolicy::allow_all(), Box::new(Failing));

        pipeline
            .process(Record::parse(line(&[("a", "passing"), ("b", "passing")])))
            .await
            .unwrap();
        let outcome = pipeline
            .process(Record::parse(line(&[("a", "critical"), ("b", "critical")])))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            Outcome::Processed {
                deltas: 2,
                forwarded: 0
            }
        );
        assert_eq!(pipeline.stats().publish_failures, 2);
        assert_eq!(
            pipeline.previous().unwrap().get("a").unwrap().status,
            Status::Critical
        );
    }

    #[tokio::test]
    async fn test_publish_failure_can_abort() {
        let topic = TopicAddress::parse(TOPIC).unwrap();
        let mut pipeline = Pipeline::new(topic, TransitionPolicy::allow_all(), Box::new(Failing))
            .on_publish_error(PublishFailurePolicy::Abort);

        pipeline
            .process(Record::parse(line(&[("a", "passing")])))
            .await
            .unwrap();
        let result = pipeline
            .process(Record::parse(line(&[("a", "critical")])))
            .await;

        assert!(matches!(result, Err(PublishError::Closed)));
    }

    #[tokio::test]
    async fn test_run_over_stream() {
        let input = [
            line(&[("web", "passing"), ("db", "passing")]),
            "garbage".to_string(),
            line(&[("web", "warning"), ("db", "passing")]),
            line(&[("web", "warning"), ("db", "critical"), ("new", "critical")]),
            line(&[("web", "passing")]),
        ]
        .join("\n");

        let mut source = StreamSource::spawn(Cursor::new(input), "test");
        let (mut pipeline, mut rx) = pipeline(TransitionPolicy::allow_all());

        let stats = pipeline.run(&mut source).await.unwrap();

        assert_eq!(stats.records, 5);
        assert_eq!(stats.unparsable, 1);
        assert_eq!(stats.forwarded, 3);

        let published: Vec<(String, String)> = drain(&mut rx)
            .iter()
            .map(|v| {
                (
                    v["CheckID"].as_str().unwrap().to_string(),
                    v["Status"].as_str().unwrap().to_string(),
                )
            })
            .collect();
        assert_eq!(
            published,
            vec![
                ("web".to_string(), "warning".to_string()),
                ("db".to_string(), "critical".to_string()),
                ("web".to_string(), "passing".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_run_stops_on_read_error() {
        let mut source = Scripted(vec![
            Ok(Record::parse(line(&[("web", "passing")]))),
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "input went away")),
            Ok(Record::parse(line(&[("web", "critical")]))),
        ]);
        let (mut pipeline, mut rx) = pipeline(TransitionPolicy::allow_all());

        let result = pipeline.run(&mut source).await;

        assert!(matches!(result, Err(RunError::Input(_))));
        assert_eq!(pipeline.stats().records, 1);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_run_stops_on_abort() {
        let topic = TopicAddress::parse(TOPIC).unwrap();
        let mut pipeline = Pipeline::new(topic, TransitionPolicy::allow_all(), Box::new(Failing))
            .on_publish_error(PublishFailurePolicy::Abort);
        let mut source = Scripted(vec![
            Ok(Record::parse(line(&[("web", "passing")]))),
            Ok(Record::parse(line(&[("web", "critical")]))),
            Ok(Record::parse(line(&[("web", "passing")]))),
        ]);

        let result = pipeline.run(&mut source).await;

        assert!(matches!(result, Err(RunError::Publish(PublishError::Closed))));
        assert_eq!(pipeline.stats().records, 2);
    }
}
