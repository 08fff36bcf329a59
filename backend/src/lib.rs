//! TicketPro backend
//!
//! Single-table entity store for events, tickets and orders, plus the identity
//! directory contract. Uses hexagonal (ports & adapters) architecture for
//! clean separation of concerns.

pub mod adapters;
pub mod app;
pub mod config;
pub mod domain;
pub mod error;

#[cfg(test)]
mod test_utils;
