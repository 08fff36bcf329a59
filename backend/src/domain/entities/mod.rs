//! Domain entities
//!
//! Strongly-typed views of the records kept in the entity store.
//! Each entity knows its key and how to encode itself as an `Item`.

pub mod event;
pub mod order;
pub mod record;
pub mod ticket;

pub use event::{Event, EventId, NewEvent};
pub use order::{NewOrder, Order, OrderId, OrderStatus};
pub use record::EventRecord;
pub use ticket::{NewTickets, Ticket, TicketId, TicketStatus};
