//! In-process adapters
//!
//! Implementations of the store and directory ports that live in memory.
//! Used for local runs and as reference behaviour in tests.

pub mod directory;
pub mod store;

pub use directory::InMemoryIdentityDirectory;
pub use store::InMemoryEntityStore;
