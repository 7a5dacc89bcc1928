//! Entitlement lookup with a time-bounded snapshot cache

use std::sync::Arc;
use std::time::Duration;

use rinpass_types::{Rin, SubscriptionRecord};
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

use crate::{EntitlementSource, GateError};

/// Full entitlement collection as of one fetch
///
/// Snapshots are immutable; a refresh builds a new one and swaps it into the
/// store's slot, so readers never observe a partially parsed collection.
#[derive(Debug)]
pub struct EntitlementSnapshot {
    records: Vec<SubscriptionRecord>,
    fetched_at: Instant,
}

impl EntitlementSnapshot {
    /// Create a snapshot fetched now
    pub fn new(records: Vec<SubscriptionRecord>) -> Self {
        Self {
            records,
            fetched_at: Instant::now(),
        }
    }

    /// All records in source order
    pub fn records(&self) -> &[SubscriptionRecord] {
        &self.records
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the collection is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Time since the snapshot was fetched
    pub fn age(&self) -> Duration {
        self.fetched_at.elapsed()
    }

    /// Whether the snapshot may still be served under `ttl`
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.age() < ttl
    }

    /// First record with the given identifier
    ///
    /// Duplicate identifiers are a data-quality problem of the source; the
    /// earliest entry wins.
    pub fn find(&self, rin: &Rin) -> Option<&SubscriptionRecord> {
        self.records.iter().find(|record| record.rin == *rin)
    }
}

/// Resolves identifiers to subscription records through a cached snapshot
///
/// One store owns one snapshot slot. A lookup answers from the slot while it
/// is younger than the TTL and otherwise refreshes it from the backing
/// source first. Refreshes are coalesced: callers that find the slot stale
/// while another refresh is running wait for it instead of fetching again.
/// A failed refresh is returned to the caller; a stale snapshot is never
/// served in its place.
pub struct EntitlementStore {
    source: Arc<dyn EntitlementSource>,
    ttl: Duration,
    fetch_timeout: Option<Duration>,
    slot: RwLock<Option<Arc<EntitlementSnapshot>>>,
    refresh_lock: Mutex<()>,
}

impl EntitlementStore {
    /// Create a store over `source` with the given snapshot TTL
    ///
    /// A zero TTL disables caching: every lookup refetches.
    pub fn new(source: Arc<dyn EntitlementSource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            fetch_timeout: None,
            slot: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Bound each backing-source fetch
    pub fn with_fetch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Snapshot TTL
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up the first record for `rin`
    pub async fn lookup(&self, rin: &Rin) -> Result<Option<SubscriptionRecord>, GateError> {
        let snapshot = self.snapshot().await?;
        let record = snapshot.find(rin).cloned();

        tracing::debug!(
            rin = %rin,
            found = record.is_some(),
            snapshot_age_ms = snapshot.age().as_millis() as u64,
            "Entitlement lookup"
        );

        Ok(record)
    }

    /// Check whether a record is active right now
    pub fn is_active(&self, record: &SubscriptionRecord) -> bool {
        record.is_active()
    }

    /// Current snapshot, refreshing it first if it is missing or stale
    pub async fn snapshot(&self) -> Result<Arc<EntitlementSnapshot>, GateError> {
        if let Some(snapshot) = self.fresh_snapshot().await {
            return Ok(snapshot);
        }

        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited for the lock
        if let Some(snapshot) = self.fresh_snapshot().await {
            return Ok(snapshot);
        }

        self.refresh().await
    }

    /// Drop the cached snapshot so the next lookup refetches
    pub async fn invalidate(&self) {
        self.slot.write().await.take();
    }

    async fn fresh_snapshot(&self) -> Option<Arc<EntitlementSnapshot>> {
        self.slot
            .read()
            .await
            .as_ref()
            .filter(|snapshot| snapshot.is_fresh(self.ttl))
            .cloned()
    }

    async fn refresh(&self) -> Result<Arc<EntitlementSnapshot>, GateError> {
        let started = Instant::now();
        let source = self.source.describe();

        let fetch = self.source.fetch_entitlements();
        let fetched = match self.fetch_timeout {
            Some(limit) => tokio::time::timeout(limit, fetch).await.unwrap_or_else(|_| {
                Err(GateError::SourceUnavailable(format!(
                    "no response within {}ms",
                    limit.as_millis()
                )))
            }),
            None => fetch.await,
        };

        let records = fetched.map_err(|e| {
            tracing::error!(source = %source, error = %e, "Entitlement refresh failed");
            e
        })?;

        let snapshot = Arc::new(EntitlementSnapshot::new(records));
        *self.slot.write().await = Some(Arc::clone(&snapshot));

        tracing::info!(
            source = %source,
            records = snapshot.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Entitlement snapshot refreshed"
        );

        Ok(snapshot)
    }
}

impl std::fmt::Debug for EntitlementStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntitlementStore")
            .field("source", &self.source.describe())
            .field("ttl", &self.ttl)
            .field("fetch_timeout", &self.fetch_timeout)
            .finish_non_exhaustive()
    }
}
