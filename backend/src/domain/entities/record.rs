//! Discriminated union over the record kinds of an event partition
//!
//! The store is untyped; the sort key tells which entity a record holds.

use super::event::Event;
use super::order::Order;
use super::ticket::Ticket;
use crate::domain::item::Item;
use crate::domain::schema::{sort_key_prefix, EntityType, SK_METADATA};
use crate::error::DecodeError;

/// One decoded record of an `EVENT#<id>` partition
#[derive(Debug, Clone, PartialEq)]
pub enum EventRecord {
    Metadata(Event),
    Ticket(Ticket),
    Order(Order),
}

impl EventRecord {
    pub fn from_item(item: &Item) -> Result<Self, DecodeError> {
        let sk = item.sk();

        if sk == SK_METADATA {
            Event::from_item(item).map(EventRecord::Metadata)
        } else if sk.starts_with(&sort_key_prefix(EntityType::Ticket)) {
            Ticket::from_item(item).map(EventRecord::Ticket)
        } else if sk.starts_with(&sort_key_prefix(EntityType::Order)) {
            Order::from_item(item).map(EventRecord::Order)
        } else {
            Err(DecodeError::UnknownRecordKind(sk.to_string()))
        }
    }

    pub fn to_item(&self) -> Item {
        match self {
            EventRecord::Metadata(event) => event.to_item(),
            EventRecord::Ticket(ticket) => ticket.to_item(),
            EventRecord::Order(order) => order.to_item(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{EventId, TicketId, TicketStatus};
    use crate::domain::item::PrimaryKey;

    #[test]
    fn dispatches_on_sort_key() {
        let ticket = Ticket {
            id: TicketId::new(),
            event_id: EventId::new(),
            tier: "vip".to_string(),
            price_cents: 12000,
            currency: "EUR".to_string(),
            status: TicketStatus::Available,
        };

        let item = ticket.to_item();
        let record = EventRecord::from_item(&item).unwrap();
        assert_eq!(record, EventRecord::Ticket(ticket));
        assert_eq!(record.to_item(), item);
    }

    #[test]
    fn unknown_sort_key_is_an_error() {
        let item = Item::new(PrimaryKey::new(EventId::new().partition_key(), "REVIEW#1"));

        assert_eq!(
            EventRecord::from_item(&item),
            Err(DecodeError::UnknownRecordKind("REVIEW#1".to_string()))
        );
    }

    #[test]
    fn metadata_without_attributes_is_an_error() {
        let item = Item::new(PrimaryKey::new(EventId::new().partition_key(), "METADATA"));
        assert!(matches!(
            EventRecord::from_item(&item),
            Err(DecodeError::MissingAttribute(_))
        ));
    }
}
