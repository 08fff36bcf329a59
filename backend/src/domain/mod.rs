//! Domain layer
//!
//! Contains the storage contract and business types with no external dependencies.
//! - `schema`: Key schema of the single-table entity store
//! - `item`: Untyped store record
//! - `entities`: Typed entities decoded from items
//! - `identity`: Identity directory declaration
//! - `stack`: Whole-stack declaration and published outputs
//! - `ports`: Trait definitions for external dependencies

pub mod entities;
pub mod identity;
pub mod item;
pub mod ports;
pub mod schema;
pub mod stack;
