//! Append-only record of every completed scheduled call.

use crate::invoker::Outcome;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};

/// Outcome of one scheduled call, stamped when the attempt concluded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallRecord {
    pub timestamp: DateTime<Utc>,
    pub url: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl CallRecord {
    pub fn new(url: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            timestamp: crate::clock::now(),
            url: url.into(),
            outcome,
        }
    }
}

/// Point-in-time copy of the log.
#[derive(Debug, Clone, Serialize)]
pub struct HistorySnapshot {
    pub records: Vec<CallRecord>,
    pub total_count: usize,
}

/// Shared, insertion-ordered call log. Cloning shares the same log.
///
/// Records land in completion order and are never removed or mutated.
#[derive(Clone)]
pub struct CallHistory {
    records: Arc<RwLock<Vec<CallRecord>>>,
    count_tx: Arc<watch::Sender<usize>>,
}

impl Default for CallHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl CallHistory {
    pub fn new() -> Self {
        let (count_tx, _) = watch::channel(0);
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
            count_tx: Arc::new(count_tx),
        }
    }

    pub async fn append(&self, record: CallRecord) {
        let mut records = self.records.write().await;
        records.push(record);
        // Published while holding the write lock so the count never runs
        // ahead of what a snapshot can observe.
        self.count_tx.send_replace(records.len());
    }

    pub async fn snapshot(&self) -> HistorySnapshot {
        let records = self.records.read().await.clone();
        let total_count = records.len();
        HistorySnapshot {
            records,
            total_count,
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Watch the record count. `wait_for(|n| *n >= k)` resolves once at
    /// least `k` records exist.
    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.count_tx.subscribe()
    }
}
