//! Application layer
//!
//! Contains use cases and service orchestration.
//! Services coordinate between domain entities and ports, retrying transient
//! store failures on the caller side.

pub mod account_service;
pub mod event_catalog_service;
pub mod retry;

pub use account_service::AccountService;
pub use event_catalog_service::{EventBundle, EventCatalogService, MAX_TICKETS_PER_BATCH};
pub use retry::{with_retry, RetryPolicy, Retryable};
