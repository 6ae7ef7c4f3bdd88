//! The shared "who is online" registry: the `PresenceStore` seam and an
//! in-process implementation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bazaar_common::{PresenceError, UserId};
use futures_util::stream::{BoxStream, StreamExt};
use tokio::sync::{mpsc, RwLock};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::debug;

use crate::record::PresenceRecord;

/// Live feed of full registry snapshots. Dropping it unsubscribes.
pub type SnapshotStream = BoxStream<'static, Result<Vec<PresenceRecord>, PresenceError>>;

/// Registry of presence records keyed by user id.
#[async_trait]
pub trait PresenceStore: Send + Sync {
    /// Overwrite this user's record, merging label fields the write omits.
    async fn put(&self, record: PresenceRecord) -> Result<(), PresenceError>;

    /// Subscribe to the full record set. The first item is the current
    /// snapshot; a fresh one follows every change.
    async fn subscribe(&self) -> Result<SnapshotStream, PresenceError>;
}

type SnapshotSender = mpsc::UnboundedSender<Result<Vec<PresenceRecord>, PresenceError>>;

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// In-process registry with last-writer-wins semantics per user.
///
/// Clones share the same registry.
#[derive(Clone, Default)]
pub struct MemoryPresenceStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    records: RwLock<HashMap<UserId, PresenceRecord>>,
    subscribers: Mutex<Vec<SnapshotSender>>,
    failing_puts: AtomicUsize,
    applied_puts: AtomicUsize,
}

impl MemoryPresenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` puts fail with `TransientWriteFailure`.
    pub fn fail_next_puts(&self, n: usize) {
        self.inner.failing_puts.store(n, Ordering::SeqCst);
    }

    /// Deliver a subscription error to every live subscriber and end
    /// their feeds.
    pub fn break_subscriptions(&self, message: &str) {
        let mut subs = self.lock_subscribers();
        for tx in subs.drain(..) {
            let _ = tx.send(Err(PresenceError::Subscription(message.to_string())));
        }
    }

    /// Number of puts that were applied to the registry.
    pub fn put_count(&self) -> usize {
        self.inner.applied_puts.load(Ordering::SeqCst)
    }

    /// Number of subscribers that are still listening.
    pub fn subscriber_count(&self) -> usize {
        let mut subs = self.lock_subscribers();
        subs.retain(|tx| !tx.is_closed());
        subs.len()
    }

    pub async fn get(&self, user_id: &UserId) -> Option<PresenceRecord> {
        self.inner.records.read().await.get(user_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.records.read().await.is_empty()
    }

    fn lock_subscribers(&self) -> std::sync::MutexGuard<'_, Vec<SnapshotSender>> {
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    fn take_injected_failure(&self) -> bool {
        self.inner
            .failing_puts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

fn snapshot(records: &HashMap<UserId, PresenceRecord>) -> Vec<PresenceRecord> {
    let mut out: Vec<PresenceRecord> = records.values().cloned().collect();
    out.sort_by(|a, b| a.user_id.cmp(&b.user_id));
    out
}

#[async_trait]
impl PresenceStore for MemoryPresenceStore {
    async fn put(&self, record: PresenceRecord) -> Result<(), PresenceError> {
        if self.take_injected_failure() {
            return Err(PresenceError::TransientWriteFailure(
                "injected write failure".into(),
            ));
        }

        let mut records = self.inner.records.write().await;
        match records.get_mut(&record.user_id) {
            Some(existing) => existing.merge(record),
            None => {
                records.insert(record.user_id.clone(), record);
            }
        }
        self.inner.applied_puts.fetch_add(1, Ordering::SeqCst);

        // Fan out while still holding the write lock so every subscriber
        // sees snapshots in apply order.
        let snap = snapshot(&records);
        let mut subs = self.lock_subscribers();
        subs.retain(|tx| tx.send(Ok(snap.clone())).is_ok());
        debug!(records = snap.len(), subscribers = subs.len(), "Presence registry updated");
        Ok(())
    }

    async fn subscribe(&self) -> Result<SnapshotStream, PresenceError> {
        let (tx, rx) = mpsc::unbounded_channel();

        // Register under the read lock so no write slips in between the
        // initial snapshot and the first live update.
        let records = self.inner.records.read().await;
        let _ = tx.send(Ok(snapshot(&records)));
        self.lock_subscribers().push(tx);
        drop(records);

        Ok(UnboundedReceiverStream::new(rx).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn at(ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(ms).unwrap()
    }

    fn record(id: &str, name: Option<&str>, lat: f64, ms: i64) -> PresenceRecord {
        PresenceRecord {
            user_id: UserId::from(id),
            display_name: name.map(str::to_string),
            contact: None,
            latitude: lat,
            longitude: 0.0,
            last_active_at: at(ms),
        }
    }

    #[tokio::test]
    async fn put_overwrites_by_key() {
        let store = MemoryPresenceStore::new();
        store.put(record("u1", Some("Ann"), 1.0, 0)).await.unwrap();
        store.put(record("u1", Some("Ann"), 2.0, 30_000)).await.unwrap();
        store.put(record("u1", Some("Ann"), 3.0, 60_000)).await.unwrap();

        assert_eq!(store.len().await, 1);
        let rec = store.get(&UserId::from("u1")).await.unwrap();
        assert_eq!(rec.latitude, 3.0);
        assert_eq!(rec.last_active_at, at(60_000));
        assert_eq!(store.put_count(), 3);
    }

    #[tokio::test]
    async fn put_merges_missing_labels() {
        let store = MemoryPresenceStore::new();
        store.put(record("u1", Some("Ann"), 1.0, 0)).await.unwrap();
        store.put(record("u1", None, 2.0, 1)).await.unwrap();

        let rec = store.get(&UserId::from("u1")).await.unwrap();
        assert_eq!(rec.display_name.as_deref(), Some("Ann"));
        assert_eq!(rec.latitude, 2.0);

        store.put(record("u1", Some("Annie"), 2.0, 2)).await.unwrap();
        let rec = store.get(&UserId::from("u1")).await.unwrap();
        assert_eq!(rec.display_name.as_deref(), Some("Annie"));
    }

    #[tokio::test]
    async fn injected_failures_are_not_applied() {
        let store = MemoryPresenceStore::new();
        store.fail_next_puts(2);

        let err = store.put(record("u1", None, 1.0, 0)).await.unwrap_err();
        assert!(matches!(err, PresenceError::TransientWriteFailure(_)));
        assert!(store.put(record("u1", None, 1.0, 0)).await.is_err());
        assert!(store.is_empty().await);

        store.put(record("u1", None, 1.0, 0)).await.unwrap();
        assert_eq!(store.put_count(), 1);
    }

    #[tokio::test]
    async fn subscribe_yields_current_snapshot_first() {
        let store = MemoryPresenceStore::new();
        let mut feed = store.subscribe().await.unwrap();
        let first = feed.next().await.unwrap().unwrap();
        assert!(first.is_empty());

        store.put(record("u1", None, 1.0, 0)).await.unwrap();
        let second = feed.next().await.unwrap().unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].user_id.as_str(), "u1");
    }

    #[tokio::test]
    async fn late_subscriber_sees_existing_records() {
        let store = MemoryPresenceStore::new();
        store.put(record("b", None, 1.0, 0)).await.unwrap();
        store.put(record("a", None, 1.0, 0)).await.unwrap();

        let mut feed = store.subscribe().await.unwrap();
        let snap = feed.next().await.unwrap().unwrap();
        let ids: Vec<&str> = snap.iter().map(|r| r.user_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn broken_subscription_reports_error_then_ends() {
        let store = MemoryPresenceStore::new();
        let mut feed = store.subscribe().await.unwrap();
        let _ = feed.next().await;

        store.break_subscriptions("listener revoked");
        let err = feed.next().await.unwrap().unwrap_err();
        assert_eq!(err, PresenceError::Subscription("listener revoked".into()));
        assert!(feed.next().await.is_none());
        assert_eq!(store.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn dropped_feed_is_pruned() {
        let store = MemoryPresenceStore::new();
        let feed = store.subscribe().await.unwrap();
        assert_eq!(store.subscriber_count(), 1);
        drop(feed);
        assert_eq!(store.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn clones_share_registry() {
        let store = MemoryPresenceStore::new();
        let other = store.clone();
        other.put(record("u1", None, 1.0, 0)).await.unwrap();
        assert_eq!(store.len().await, 1);
    }
}
