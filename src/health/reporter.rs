//! Heartbeat and terminal reporting
//!
//! The reporter owns a sink and emits two kinds of messages: a periodic heartbeat
//! while the crawl runs, and a single terminal message when it ends.

use crate::health::sink::{Notification, NotificationSink};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub const HEARTBEAT_SUBJECT: &str = "Crawler Heartbeat: still running";
const HEARTBEAT_BODY: &str = "Your Wikipedia crawler is still running.";

/// How the crawl ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    pub fn subject(&self) -> &'static str {
        match self {
            Outcome::Success => "Crawler Finished Successfully",
            Outcome::Failure => "Crawler Failed",
        }
    }

    fn body(&self, details: &str) -> String {
        match self {
            Outcome::Success => details.to_string(),
            Outcome::Failure => format!("The crawler stopped with an error:\n\n{}", details),
        }
    }
}

/// Handle to a running heartbeat task; the task stops when this is stopped or dropped
#[derive(Debug)]
pub struct HeartbeatHandle {
    task: Option<JoinHandle<()>>,
}

impl HeartbeatHandle {
    pub fn stop(mut self) {
        self.abort();
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    fn abort(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for HeartbeatHandle {
    fn drop(&mut self) {
        self.abort();
    }
}

/// Sends heartbeat and terminal notifications through one sink
pub struct HealthReporter {
    sink: Arc<dyn NotificationSink>,
    terminal_sent: AtomicBool,
}

impl HealthReporter {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            sink,
            terminal_sent: AtomicBool::new(false),
        }
    }

    /// Spawns the heartbeat task
    ///
    /// The first heartbeat goes out immediately, then one per `interval`. The task
    /// reads nothing from the crawl, so it cannot contend with it.
    pub fn start_heartbeat(&self, interval: Duration) -> HeartbeatHandle {
        let sink = Arc::clone(&self.sink);
        tracing::info!(
            "Heartbeat every {:?} via {} sink",
            interval,
            sink.name()
        );

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let heartbeat = Notification::new(HEARTBEAT_SUBJECT, HEARTBEAT_BODY);
            loop {
                ticker.tick().await;
                deliver(sink.as_ref(), &heartbeat).await;
            }
        });

        HeartbeatHandle { task: Some(task) }
    }

    /// Sends the terminal notification
    ///
    /// Only the first call sends anything; later calls return false. A success report
    /// carries `artifact` as an attachment when the file exists.
    pub async fn report_terminal(
        &self,
        outcome: Outcome,
        details: &str,
        artifact: Option<&Path>,
    ) -> bool {
        if self.terminal_sent.swap(true, Ordering::SeqCst) {
            tracing::warn!("Terminal notification already sent, ignoring {:?}", outcome);
            return false;
        }

        let mut notification = Notification::new(outcome.subject(), outcome.body(details));
        if outcome == Outcome::Success {
            match artifact {
                Some(path) if path.exists() => notification = notification.with_attachment(path),
                Some(path) => tracing::warn!(
                    "Export {} not found, sending report without attachment",
                    path.display()
                ),
                None => {}
            }
        }

        deliver(self.sink.as_ref(), &notification).await;
        true
    }
}

async fn deliver(sink: &dyn NotificationSink, notification: &Notification) {
    if let Err(e) = sink.send(notification).await {
        tracing::warn!(
            "Failed to deliver '{}' via {} sink: {}",
            notification.subject,
            sink.name(),
            e
        );
    }
}

/// Renders an error and every underlying cause, outermost first
pub fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        rendered.push_str("\n  caused by: ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::sink::NotifyError;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<Notification>>,
        fail: bool,
    }

    impl RecordingSink {
        fn subjects(&self) -> Vec<String> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .map(|n| n.subject.clone())
                .collect()
        }
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push(notification.clone());
            if self.fail {
                return Err(NotifyError::Config("offline".to_string()));
            }
            Ok(())
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_fires_immediately_then_periodically() {
        let sink = Arc::new(RecordingSink::default());
        let reporter = HealthReporter::new(sink.clone());

        let handle = reporter.start_heartbeat(Duration::from_secs(60));
        tokio::time::sleep(Duration::from_secs(150)).await;

        assert!(handle.is_running());
        assert_eq!(sink.subjects(), vec![HEARTBEAT_SUBJECT; 3]);

        handle.stop();
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(sink.subjects().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_stops_heartbeat() {
        let sink = Arc::new(RecordingSink::default());
        let reporter = HealthReporter::new(sink.clone());

        drop(reporter.start_heartbeat(Duration::from_secs(60)));
        tokio::time::sleep(Duration::from_secs(300)).await;

        assert!(sink.subjects().len() <= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_survives_sink_failures() {
        let sink = Arc::new(RecordingSink {
            fail: true,
            ..RecordingSink::default()
        });
        let reporter = HealthReporter::new(sink.clone());

        let handle = reporter.start_heartbeat(Duration::from_secs(10));
        tokio::time::sleep(Duration::from_secs(25)).await;

        assert_eq!(sink.subjects().len(), 3);
        handle.stop();
    }

    #[tokio::test]
    async fn test_terminal_report_sent_once() {
        let sink = Arc::new(RecordingSink::default());
        let reporter = HealthReporter::new(sink.clone());

        assert!(reporter.report_terminal(Outcome::Success, "Crawl complete: 3 nodes, 2 edges.", None).await);
        assert!(!reporter.report_terminal(Outcome::Failure, "late", None).await);

        let sent = sink.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Crawler Finished Successfully");
        assert_eq!(sent[0].body, "Crawl complete: 3 nodes, 2 edges.");
    }

    #[tokio::test]
    async fn test_success_attaches_existing_artifact() {
        let dir = TempDir::new().unwrap();
        let artifact = dir.path().join("elements.json");
        std::fs::write(&artifact, "[]").unwrap();

        let sink = Arc::new(RecordingSink::default());
        let reporter = HealthReporter::new(sink.clone());
        reporter
            .report_terminal(Outcome::Success, "done", Some(artifact.as_path()))
            .await;

        let sent = sink.sent.lock().unwrap().clone();
        assert_eq!(sent[0].attachment.as_deref(), Some(artifact.as_path()));
    }

    #[tokio::test]
    async fn test_failure_carries_error_and_no_attachment() {
        let dir = TempDir::new().unwrap();
        let artifact = dir.path().join("elements.json");
        std::fs::write(&artifact, "[]").unwrap();

        let sink = Arc::new(RecordingSink::default());
        let reporter = HealthReporter::new(sink.clone());
        reporter
            .report_terminal(Outcome::Failure, "disk full", Some(artifact.as_path()))
            .await;

        let sent = sink.sent.lock().unwrap().clone();
        assert_eq!(sent[0].subject, "Crawler Failed");
        assert!(sent[0].body.contains("disk full"));
        assert!(sent[0].attachment.is_none());
    }

    #[tokio::test]
    async fn test_terminal_sink_failure_swallowed() {
        let sink = Arc::new(RecordingSink {
            fail: true,
            ..RecordingSink::default()
        });
        let reporter = HealthReporter::new(sink);
        assert!(reporter.report_terminal(Outcome::Success, "done", None).await);
    }

    #[test]
    fn test_error_chain_lists_causes() {
        let inner = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let outer = crate::WikiGraphError::Checkpoint {
            path: "checkpoint.json".to_string(),
            source: crate::storage::StorageError::Io(inner),
        };

        let rendered = error_chain(&outer);
        assert!(rendered.starts_with("Checkpoint at checkpoint.json unusable"));
        assert!(rendered.contains("caused by: IO error: disk full"));
    }
}
