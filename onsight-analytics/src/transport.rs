use crate::events::Event;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// A pluggable sink for event batches.
///
/// The pipeline worker treats any error as "the whole batch failed" and
/// applies its bounded retry policy; implementations should not retry
/// internally.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_batch(&self, write_key: &str, batch: &[Event]) -> Result<()>;
}

/// Ships batches to the ingestion endpoint as JSON over HTTP.
pub struct HttpTransport {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send_batch(&self, write_key: &str, batch: &[Event]) -> Result<()> {
        let url = format!("{}/v0/events", self.endpoint.trim_end_matches('/'));
        let body = serde_json::json!({
            "batch": batch,
            "sent-at": chrono::Utc::now(),
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(write_key)
            .json(&body)
            .send()
            .await?;
        response.error_for_status()?;
        Ok(())
    }
}

/// An in-memory transport that records every delivered batch.
///
/// Used by integration tests and offline demos; supports injecting a number
/// of failures to exercise the retry path.
#[derive(Default)]
pub struct MemoryTransport {
    batches: Mutex<Vec<Vec<Event>>>,
    fail_next: AtomicU32,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` sends fail.
    pub fn fail_next(&self, count: u32) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    /// All batches delivered so far, in delivery order.
    pub fn batches(&self) -> Vec<Vec<Event>> {
        self.lock().clone()
    }

    pub fn batch_count(&self) -> usize {
        self.lock().len()
    }

    pub fn event_count(&self) -> usize {
        self.lock().iter().map(|batch| batch.len()).sum()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Vec<Event>>> {
        self.batches.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send_batch(&self, _write_key: &str, batch: &[Event]) -> Result<()> {
        let inject = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if inject {
            anyhow::bail!("injected transport failure");
        }

        self.lock().push(batch.to_vec());
        Ok(())
    }
}
