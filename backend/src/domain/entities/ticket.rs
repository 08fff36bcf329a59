//! Ticket domain entity
//!
//! Tickets live inside their event's partition under `TICKET#<id>` sort keys,
//! so an event's whole inventory is one `begins_with` partition query.
//! They carry no search attributes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::event::EventId;
use crate::domain::item::{Item, PrimaryKey};
use crate::domain::schema::{entity_key, parse_entity_key, EntityType};
use crate::error::DecodeError;

const ATTR_TIER: &str = "tier";
const ATTR_PRICE_CENTS: &str = "price_cents";
const ATTR_CURRENCY: &str = "currency";
const ATTR_STATUS: &str = "status";

/// Unique identifier for a ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketId(pub Uuid);

impl TicketId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Sort key of this ticket within its event partition
    pub fn sort_key(&self) -> String {
        entity_key(EntityType::Ticket, self)
    }

    pub fn from_sort_key(sk: &str) -> Result<Self, DecodeError> {
        match parse_entity_key(sk)? {
            (EntityType::Ticket, id) => id
                .parse::<Uuid>()
                .map(Self)
                .map_err(|e| DecodeError::InvalidKey(format!("{}: {}", sk, e))),
            (other, _) => Err(DecodeError::UnknownRecordKind(other.to_string())),
        }
    }
}

impl Default for TicketId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for TicketId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TicketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TicketId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// Ticket status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Available,
    Reserved,
    Sold,
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TicketStatus::Available => write!(f, "available"),
            TicketStatus::Reserved => write!(f, "reserved"),
            TicketStatus::Sold => write!(f, "sold"),
        }
    }
}

impl std::str::FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "available" => Ok(TicketStatus::Available),
            "reserved" => Ok(TicketStatus::Reserved),
            "sold" => Ok(TicketStatus::Sold),
            _ => Err(format!("Unknown ticket status: {}", s)),
        }
    }
}

/// A sellable ticket for an event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ticket {
    pub id: TicketId,
    pub event_id: EventId,
    /// Price tier label, e.g. "general" or "vip"
    pub tier: String,
    /// Price in minor currency units
    pub price_cents: i64,
    pub currency: String,
    pub status: TicketStatus,
}

impl Ticket {
    pub fn key(&self) -> PrimaryKey {
        PrimaryKey::new(self.event_id.partition_key(), self.id.sort_key())
    }

    /// Check if the ticket can be put in an order
    pub fn is_available(&self) -> bool {
        self.status == TicketStatus::Available
    }

    pub fn to_item(&self) -> Item {
        Item::new(self.key())
            .with(ATTR_TIER, self.tier.clone())
            .with(ATTR_PRICE_CENTS, self.price_cents)
            .with(ATTR_CURRENCY, self.currency.clone())
            .with(ATTR_STATUS, self.status.to_string())
    }

    pub fn from_item(item: &Item) -> Result<Self, DecodeError> {
        let status = item.require_str(ATTR_STATUS)?;

        Ok(Ticket {
            id: TicketId::from_sort_key(item.sk())?,
            event_id: EventId::from_partition_key(item.pk())?,
            tier: item.require_str(ATTR_TIER)?.to_string(),
            price_cents: item.require_i64(ATTR_PRICE_CENTS)?,
            currency: item.require_str(ATTR_CURRENCY)?.to_string(),
            status: status
                .parse()
                .map_err(|reason| DecodeError::InvalidAttribute {
                    name: ATTR_STATUS.to_string(),
                    reason,
                })?,
        })
    }
}

/// Data needed to issue a batch of identical tickets
#[derive(Debug, Clone)]
pub struct NewTickets {
    pub tier: String,
    pub price_cents: i64,
    pub currency: String,
    pub count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::{ATTR_GSI_PK, ATTR_GSI_SK};

    fn make_ticket(status: TicketStatus) -> Ticket {
        Ticket {
            id: TicketId(Uuid::nil()),
            event_id: EventId(Uuid::nil()),
            tier: "general".to_string(),
            price_cents: 4500,
            currency: "EUR".to_string(),
            status,
        }
    }

    #[test]
    fn ticket_is_available_only_when_available() {
        assert!(make_ticket(TicketStatus::Available).is_available());
        assert!(!make_ticket(TicketStatus::Reserved).is_available());
        assert!(!make_ticket(TicketStatus::Sold).is_available());
    }

    #[test]
    fn ticket_record_shares_event_partition() {
        let ticket = make_ticket(TicketStatus::Available);
        let item = ticket.to_item();

        assert_eq!(item.pk(), ticket.event_id.partition_key());
        assert!(item.sk().starts_with("TICKET#"));
    }

    #[test]
    fn ticket_record_is_not_searchable() {
        let item = make_ticket(TicketStatus::Available).to_item();

        assert!(item.get(ATTR_GSI_PK).is_none());
        assert!(item.get(ATTR_GSI_SK).is_none());
        assert!(item.search_key().is_none());
    }

    #[test]
    fn decodes_what_it_encodes() {
        let ticket = make_ticket(TicketStatus::Reserved);
        assert_eq!(Ticket::from_item(&ticket.to_item()).unwrap(), ticket);
    }

    #[test]
    fn rejects_unknown_status() {
        let item = make_ticket(TicketStatus::Sold)
            .to_item()
            .with("status", "refunded");

        assert!(matches!(
            Ticket::from_item(&item),
            Err(DecodeError::InvalidAttribute { .. })
        ));
    }

    #[test]
    fn ticket_status_display() {
        assert_eq!(TicketStatus::Available.to_string(), "available");
        assert_eq!(TicketStatus::Reserved.to_string(), "reserved");
        assert_eq!(TicketStatus::Sold.to_string(), "sold");
    }

    #[test]
    fn ticket_status_from_str() {
        assert_eq!(
            "available".parse::<TicketStatus>().unwrap(),
            TicketStatus::Available
        );
        assert_eq!(
            "RESERVED".parse::<TicketStatus>().unwrap(),
            TicketStatus::Reserved
        );
        assert_eq!("sold".parse::<TicketStatus>().unwrap(), TicketStatus::Sold);
        assert!("invalid".parse::<TicketStatus>().is_err());
    }

    #[test]
    fn ticket_id_display() {
        let id = TicketId(uuid::Uuid::nil());
        assert_eq!(id.to_string(), "00000000-0000-0000-0000-000000000000");
        assert_eq!(id.sort_key(), "TICKET#00000000-0000-0000-0000-000000000000");
    }
}
