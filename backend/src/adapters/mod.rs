//! Adapters layer
//!
//! Implementations of port traits for external systems.

pub mod dynamodb;
pub mod memory;

pub use dynamodb::{DynamoDbConfig, DynamoDbEntityStore};
pub use memory::{InMemoryEntityStore, InMemoryIdentityDirectory};
