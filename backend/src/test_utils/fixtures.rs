//! Test fixtures
//!
//! Factory functions for creating test data with sensible defaults.
//! Each fixture function creates a valid entity that can be customized.

use chrono::{DateTime, SubsecRound, TimeZone, Utc};

use crate::domain::entities::{
    Event, EventId, NewEvent, NewOrder, NewTickets, Order, OrderId, OrderStatus, Ticket, TicketId,
    TicketStatus,
};
use crate::domain::identity::EmailAddress;

/// Fixed start time so index sort keys are predictable
pub fn test_starts_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 12, 21, 30, 0).unwrap()
}

/// Create a test event with default values
pub fn test_event() -> Event {
    Event {
        id: EventId::new(),
        name: "Show A".to_string(),
        category: "music".to_string(),
        city: "Madrid".to_string(),
        venue: "WiZink Center".to_string(),
        starts_at: test_starts_at(),
        description: None,
        created_at: Utc::now().trunc_subsecs(0),
    }
}

/// Create a test event in a specific category and city
pub fn test_event_in(category: &str, city: &str) -> Event {
    Event {
        category: category.to_string(),
        city: city.to_string(),
        ..test_event()
    }
}

/// Input for creating an event
pub fn test_new_event() -> NewEvent {
    NewEvent {
        name: "Show A".to_string(),
        category: "Music".to_string(),
        city: "Madrid".to_string(),
        venue: "WiZink Center".to_string(),
        starts_at: test_starts_at(),
        description: Some("Opening night".to_string()),
    }
}

/// Input for creating an event in a specific category and city
pub fn test_new_event_in(category: &str, city: &str, starts_at: DateTime<Utc>) -> NewEvent {
    NewEvent {
        category: category.to_string(),
        city: city.to_string(),
        starts_at,
        ..test_new_event()
    }
}

/// Create an available general-admission ticket for `event_id`
pub fn test_ticket(event_id: EventId) -> Ticket {
    Ticket {
        id: TicketId::new(),
        event_id,
        tier: "general".to_string(),
        price_cents: 4500,
        currency: "EUR".to_string(),
        status: TicketStatus::Available,
    }
}

/// Input for issuing `count` general-admission tickets
pub fn test_new_tickets(count: u32) -> NewTickets {
    NewTickets {
        tier: "general".to_string(),
        price_cents: 4500,
        currency: "EUR".to_string(),
        count,
    }
}

/// Create a pending order for the given tickets
pub fn test_order(event_id: EventId, ticket_ids: Vec<TicketId>) -> Order {
    Order {
        id: OrderId::new(),
        event_id,
        buyer_email: "ana@example.com".to_string(),
        total_cents: 4500 * ticket_ids.len() as i64,
        ticket_ids,
        currency: "EUR".to_string(),
        status: OrderStatus::Pending,
        created_at: Utc::now().trunc_subsecs(0),
    }
}

/// Input for ordering the given tickets
pub fn test_new_order(event_id: EventId, ticket_ids: Vec<TicketId>) -> NewOrder {
    NewOrder {
        event_id,
        buyer_email: "ana@example.com".to_string(),
        ticket_ids,
    }
}

pub fn test_email() -> EmailAddress {
    EmailAddress::parse("ana@example.com").unwrap()
}
