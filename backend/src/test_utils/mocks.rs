//! Mock implementations of port traits
//!
//! These wrap the in-memory engine so tests can verify how callers react to
//! store failures.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::adapters::memory::InMemoryEntityStore;
use crate::domain::item::{Item, PrimaryKey};
use crate::domain::ports::{EntityStore, IndexQuery, Page, PartitionQuery};
use crate::error::StoreError;

// ============================================================================
// Flaky Entity Store
// ============================================================================

/// Store that answers the first `failures` calls with `Unavailable`
/// before delegating to an in-memory engine
#[derive(Default)]
pub struct FlakyEntityStore {
    inner: InMemoryEntityStore,
    failures: AtomicU32,
    calls: AtomicU32,
    permanent: bool,
    puts: AtomicU32,
    rejected_put: Option<u32>,
}

impl FlakyEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `failures` calls with a transient error
    pub fn failing(failures: u32) -> Self {
        Self {
            failures: AtomicU32::new(failures),
            ..Self::default()
        }
    }

    /// Fail every call with a non-retryable backend error
    pub fn broken() -> Self {
        Self {
            permanent: true,
            ..Self::default()
        }
    }

    /// Reject the `nth` put (counting from 1) with a non-retryable error
    pub fn rejecting_put(nth: u32) -> Self {
        Self {
            rejected_put: Some(nth),
            ..Self::default()
        }
    }

    /// The wrapped engine; calls on it are not counted and never fail
    pub fn inner(&self) -> &InMemoryEntityStore {
        &self.inner
    }

    /// Number of calls made through the port so far
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Arm the store to fail the next `failures` calls
    pub fn fail_next(&self, failures: u32) {
        self.failures.store(failures, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.permanent {
            return Err(StoreError::Backend("table does not exist".to_string()));
        }

        let consumed = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if consumed {
            Err(StoreError::Unavailable("throttled".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl EntityStore for FlakyEntityStore {
    async fn get(&self, key: &PrimaryKey) -> Result<Option<Item>, StoreError> {
        self.check()?;
        self.inner.get(key).await
    }

    async fn put(&self, item: Item) -> Result<(), StoreError> {
        self.check()?;
        let nth = self.puts.fetch_add(1, Ordering::SeqCst) + 1;
        if self.rejected_put == Some(nth) {
            return Err(StoreError::Backend("item size limit exceeded".to_string()));
        }
        self.inner.put(item).await
    }

    async fn delete(&self, key: &PrimaryKey) -> Result<(), StoreError> {
        self.check()?;
        self.inner.delete(key).await
    }

    async fn query_partition(&self, query: &PartitionQuery) -> Result<Page, StoreError> {
        self.check()?;
        self.inner.query_partition(query).await
    }

    async fn query_index(&self, query: &IndexQuery) -> Result<Page, StoreError> {
        self.check()?;
        self.inner.query_index(query).await
    }
}
