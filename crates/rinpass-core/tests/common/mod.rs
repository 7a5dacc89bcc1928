//! Common test utilities for rinpass-core integration tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use rinpass_core::{EntitlementSource, GateError};
use rinpass_types::{Rin, SubscriptionRecord};

/// Secret long enough not to trigger the weak-key warning
#[allow(dead_code)]
pub const TEST_SECRET: &str = "rinpass-integration-test-secret-0123456789";

/// In-memory entitlement source that counts fetches
///
/// Records can be swapped between fetches, fetches can be made to fail, and
/// an artificial delay can be added to exercise timeouts and coalescing.
#[derive(Default)]
pub struct MockSource {
    records: Mutex<Vec<SubscriptionRecord>>,
    fetches: AtomicUsize,
    failing: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

#[allow(dead_code)]
impl MockSource {
    pub fn new(records: Vec<SubscriptionRecord>) -> Arc<Self> {
        Arc::new(Self {
            records: Mutex::new(records),
            ..Default::default()
        })
    }

    pub fn set_records(&self, records: Vec<SubscriptionRecord>) {
        *self.records.lock().unwrap() = records;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EntitlementSource for MockSource {
    async fn fetch_entitlements(&self) -> Result<Vec<SubscriptionRecord>, GateError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(GateError::SourceUnavailable("mock source down".to_string()));
        }
        Ok(self.records.lock().unwrap().clone())
    }

    fn describe(&self) -> String {
        "mock".to_string()
    }
}

#[allow(dead_code)]
pub fn rin(value: &str) -> Rin {
    Rin::parse(value).unwrap()
}

/// Record expiring `offset` from now (negative for already expired)
#[allow(dead_code)]
pub fn record(value: &str, offset: ChronoDuration) -> SubscriptionRecord {
    SubscriptionRecord::new(rin(value), Utc::now() + offset)
}

#[allow(dead_code)]
pub fn active(value: &str) -> SubscriptionRecord {
    record(value, ChronoDuration::days(30))
}
