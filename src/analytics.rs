//! Background interaction logger.
//!
//! Assistant turns hand their [`InteractionRecord`] to an
//! [`InteractionLogger`], which forwards it over a bounded channel to a
//! worker task that writes to the [`AnalyticsSink`]. Logging never blocks or
//! fails a turn: a full queue drops the record, and sink errors are reported
//! only through `tracing`.

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;

use civic_assist_core::models::InteractionRecord;
use civic_assist_core::store::AnalyticsSink;

enum Message {
    Record(Box<InteractionRecord>),
    Flush(oneshot::Sender<()>),
}

/// Handle to the interaction-logging worker. Cheap to clone.
#[derive(Clone)]
pub struct InteractionLogger {
    tx: Option<mpsc::Sender<Message>>,
    worker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl InteractionLogger {
    /// Start a worker writing to `sink`, buffering up to `capacity` records.
    pub fn spawn(sink: Arc<dyn AnalyticsSink>, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<Message>(capacity.max(1));

        let handle = tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                match msg {
                    Message::Record(record) => {
                        if let Err(e) = sink.record_interaction(&record).await {
                            tracing::error!(
                                interaction_id = %record.id,
                                error = %e,
                                "failed to record interaction"
                            );
                        }
                    }
                    Message::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
            tracing::debug!("interaction logger stopped");
        });

        Self {
            tx: Some(tx),
            worker: Arc::new(Mutex::new(Some(handle))),
        }
    }

    /// A logger that discards every record.
    pub fn disabled() -> Self {
        Self {
            tx: None,
            worker: Arc::new(Mutex::new(None)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    /// Enqueue a record without waiting.
    pub fn log(&self, record: InteractionRecord) {
        let Some(tx) = &self.tx else {
            return;
        };
        if let Err(e) = tx.try_send(Message::Record(Box::new(record))) {
            let reason = match e {
                mpsc::error::TrySendError::Full(_) => "queue full",
                mpsc::error::TrySendError::Closed(_) => "logger closed",
            };
            tracing::warn!(reason, "dropping interaction record");
        }
    }

    /// Wait until every record enqueued before this call has been written.
    pub async fn flush(&self) {
        let Some(tx) = &self.tx else {
            return;
        };
        let (done_tx, done_rx) = oneshot::channel();
        if tx.send(Message::Flush(done_tx)).await.is_ok() {
            let _ = done_rx.await;
        }
    }

    /// Drain the queue and stop the worker.
    ///
    /// Other clones keep their sender, so the worker exits only after the
    /// last clone is dropped. Only the last clone awaits the worker; earlier
    /// ones flush and leave the handle in place.
    pub async fn shutdown(self) {
        self.flush().await;
        let Self { tx, worker } = self;
        drop(tx);
        if Arc::strong_count(&worker) > 1 {
            return;
        }
        let handle = worker.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "interaction logger task failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{bail, Result};
    use async_trait::async_trait;
    use civic_assist_core::models::ResponseType;
    use civic_assist_core::store::memory::InMemoryStore;

    fn record(query: &str) -> InteractionRecord {
        InteractionRecord {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: Some("s1".into()),
            query_text: query.into(),
            response_text: "answer".into(),
            confidence: 0.6,
            response_time_ms: 12,
            result_count: 0,
            has_results: false,
            sources: vec![],
            response_type: ResponseType::Text,
            response_length: 6,
            created_at: 0,
        }
    }

    struct FailingSink;

    #[async_trait]
    impl AnalyticsSink for FailingSink {
        async fn record_interaction(&self, _record: &InteractionRecord) -> Result<()> {
            bail!("analytics table missing")
        }
        async fn delete_interactions(&self, _session_id: &str) -> Result<u64> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn test_records_reach_sink_after_flush() {
        let store = Arc::new(InMemoryStore::new());
        let logger = InteractionLogger::spawn(store.clone(), 8);
        logger.log(record("pothole"));
        logger.log(record("streetlight"));
        logger.flush().await;
        assert_eq!(store.interactions().len(), 2);
        logger.shutdown().await;
    }

    #[tokio::test]
    async fn test_sink_failure_is_swallowed() {
        let logger = InteractionLogger::spawn(Arc::new(FailingSink), 4);
        logger.log(record("q"));
        logger.flush().await;
        logger.shutdown().await;
    }

    #[tokio::test]
    async fn test_clone_shutdown_leaves_worker_for_last_handle() {
        let store = Arc::new(InMemoryStore::new());
        let logger = InteractionLogger::spawn(store.clone(), 8);
        let per_request = logger.clone();

        per_request.log(record("pothole"));
        per_request.shutdown().await;
        assert!(logger.worker.lock().await.is_some());

        logger.log(record("streetlight"));
        logger.shutdown().await;
        assert_eq!(store.interactions().len(), 2);
        // The finished worker has released its handle on the sink.
        assert_eq!(Arc::strong_count(&store), 1);
    }

    #[tokio::test]
    async fn test_disabled_logger_discards() {
        let logger = InteractionLogger::disabled();
        assert!(!logger.is_enabled());
        logger.log(record("q"));
        logger.flush().await;
        logger.shutdown().await;
    }
}
