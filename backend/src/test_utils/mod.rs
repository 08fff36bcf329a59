//! Test utilities
//!
//! Hand-written store mocks and test fixtures for unit testing.
//!
//! The `IdentityDirectory` port is mocked with mockall (`MockIdentityDirectory`).
//! The entity store is not: `InMemoryEntityStore` is the reference engine, and
//! `FlakyEntityStore` wraps it to inject transient failures.

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
