use crate::config::IngestionConfig;
use crate::error::AppError;
use crate::metrics;
use async_trait::async_trait;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Processes one dequeued message
#[async_trait]
pub trait MessageHandler: Send + Sync + 'static {
    type Message: Send + Sync + 'static;

    async fn handle(&self, message: &Self::Message) -> Result<(), AppError>;
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("Ingestion queue is full")]
    Full,

    #[error("Ingestion queue is closed")]
    Closed,
}

/// How failed messages are retried
#[derive(Debug, Clone, Copy)]
pub struct RedeliveryPolicy {
    pub max_redeliveries: u32,
    pub delay: Duration,
}

impl From<&IngestionConfig> for RedeliveryPolicy {
    fn from(config: &IngestionConfig) -> Self {
        Self {
            max_redeliveries: config.max_redeliveries,
            delay: Duration::from_millis(config.redelivery_delay_ms),
        }
    }
}

/// Publisher side of a bounded queue drained by one background worker
///
/// The worker exits once every publisher clone has been dropped and the
/// remaining messages are processed.
pub struct IngestionQueue<M> {
    tx: mpsc::Sender<M>,
}

impl<M> Clone for IngestionQueue<M> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<M: Send + Sync + 'static> IngestionQueue<M> {
    /// Start the worker and return the publisher together with its handle
    pub fn spawn<H>(handler: H, config: &IngestionConfig) -> (Self, JoinHandle<()>)
    where
        H: MessageHandler<Message = M>,
    {
        let (tx, rx) = mpsc::channel::<M>(config.buffer_size.max(1));
        let policy = RedeliveryPolicy::from(config);

        let handle = tokio::spawn(run_worker(handler, rx, policy));

        tracing::info!(
            buffer_size = config.buffer_size,
            max_redeliveries = policy.max_redeliveries,
            "Ingestion worker started"
        );

        (Self { tx }, handle)
    }

    /// Enqueue, waiting for capacity
    pub async fn publish(&self, message: M) -> Result<(), QueueError> {
        self.tx.send(message).await.map_err(|_| QueueError::Closed)?;
        metrics::record_ingestion("accepted");
        Ok(())
    }

    /// Enqueue without waiting
    pub fn try_publish(&self, message: M) -> Result<(), QueueError> {
        self.tx.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => QueueError::Full,
            mpsc::error::TrySendError::Closed(_) => QueueError::Closed,
        })?;
        metrics::record_ingestion("accepted");
        Ok(())
    }
}

enum Delivery {
    Done,
    Redeliver,
}

async fn run_worker<H: MessageHandler>(
    handler: H,
    mut rx: mpsc::Receiver<H::Message>,
    policy: RedeliveryPolicy,
) {
    while let Some(message) = rx.recv().await {
        let started = Instant::now();
        let mut attempt: u32 = 0;

        loop {
            match deliver(&handler, &message, attempt, &policy).await {
                Delivery::Done => break,
                Delivery::Redeliver => {
                    attempt += 1;
                    tokio::time::sleep(policy.delay).await;
                }
            }
        }

        metrics::record_ingestion_duration(started.elapsed());
    }

    tracing::info!("Ingestion queue closed, worker exiting");
}

async fn deliver<H: MessageHandler>(
    handler: &H,
    message: &H::Message,
    attempt: u32,
    policy: &RedeliveryPolicy,
) -> Delivery {
    let result = AssertUnwindSafe(handler.handle(message)).catch_unwind().await;

    match result {
        Ok(Ok(())) => {
            metrics::record_ingestion("written");
            Delivery::Done
        }
        Ok(Err(err)) if !err.is_retryable() => {
            metrics::record_ingestion("dropped");
            tracing::warn!(error = %err, "Dropping ingestion message");
            Delivery::Done
        }
        Ok(Err(err)) if attempt < policy.max_redeliveries => {
            metrics::record_ingestion("redelivered");
            tracing::warn!(
                error = %err,
                attempt = attempt + 1,
                max_redeliveries = policy.max_redeliveries,
                "Ingestion failed, redelivering"
            );
            Delivery::Redeliver
        }
        Ok(Err(err)) => {
            metrics::record_ingestion("failed");
            tracing::error!(
                error = %err,
                attempts = attempt + 1,
                "Ingestion failed, redeliveries exhausted"
            );
            Delivery::Done
        }
        Err(panic) => {
            metrics::record_ingestion("failed");
            tracing::error!(panic = ?panic, "Ingestion handler panicked");
            Delivery::Done
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    /// Fails the first `failures` calls with the given error kind
    struct FlakyHandler {
        calls: Arc<AtomicU32>,
        failures: u32,
        retryable: bool,
    }

    #[async_trait]
    impl MessageHandler for FlakyHandler {
        type Message = String;

        async fn handle(&self, message: &String) -> Result<(), AppError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if message == "panic" {
                panic!("poisoned message");
            }
            if call < self.failures {
                return Err(if self.retryable {
                    AppError::Internal("database is locked".to_string())
                } else {
                    AppError::bad_request(
                        "Severity not found.",
                        "Cannot find severity with given name.",
                    )
                });
            }
            Ok(())
        }
    }

    fn create_test_config(buffer_size: usize, max_redeliveries: u32) -> IngestionConfig {
        IngestionConfig {
            enabled: true,
            buffer_size,
            max_redeliveries,
            redelivery_delay_ms: 1,
        }
    }

    fn spawn_flaky(
        failures: u32,
        retryable: bool,
        max_redeliveries: u32,
    ) -> (IngestionQueue<String>, JoinHandle<()>, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        let handler = FlakyHandler {
            calls: calls.clone(),
            failures,
            retryable,
        };
        let (queue, handle) =
            IngestionQueue::spawn(handler, &create_test_config(8, max_redeliveries));
        (queue, handle, calls)
    }

    #[tokio::test]
    async fn test_retryable_failure_is_redelivered() {
        let (queue, handle, calls) = spawn_flaky(2, true, 3);

        queue.publish("msg".to_string()).await.unwrap();
        drop(queue);
        handle.await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_redeliveries_are_bounded() {
        let (queue, handle, calls) = spawn_flaky(u32::MAX, true, 2);

        queue.publish("msg".to_string()).await.unwrap();
        drop(queue);
        handle.await.unwrap();

        // first delivery plus two redeliveries
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_failure_is_dropped() {
        let (queue, handle, calls) = spawn_flaky(1, false, 5);

        queue.publish("bad".to_string()).await.unwrap();
        queue.publish("good".to_string()).await.unwrap();
        drop(queue);
        handle.await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_panic_does_not_stop_worker() {
        let (queue, handle, calls) = spawn_flaky(0, true, 0);

        queue.publish("panic".to_string()).await.unwrap();
        queue.publish("after".to_string()).await.unwrap();
        drop(queue);
        handle.await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_try_publish_reports_full_and_closed() {
        let (tx, rx) = mpsc::channel::<String>(1);
        let queue = IngestionQueue { tx };

        queue.try_publish("one".to_string()).unwrap();
        assert_eq!(queue.try_publish("two".to_string()), Err(QueueError::Full));

        drop(rx);
        assert_eq!(queue.try_publish("three".to_string()), Err(QueueError::Closed));
    }
}
