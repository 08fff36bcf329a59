//! Domain ports (traits)
//!
//! Port traits define interfaces that the domain layer requires.
//! Adapters provide concrete implementations of these traits.

pub mod directory;
pub mod store;

pub use directory::{AuthRequest, AuthSession, IdentityDirectory, SignUpOutcome};
#[cfg(test)]
pub use directory::MockIdentityDirectory;
pub use store::{
    check_limit, collect_all, Cursor, EntityStore, IndexQuery, Page, PartitionQuery, Query, SortKeyCondition,
};
