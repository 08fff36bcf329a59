//! Order domain entity
//!
//! Orders are stored in the event partition under `ORDER#<id>` sort keys.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::event::EventId;
use super::ticket::TicketId;
use crate::domain::item::{format_datetime, Item, PrimaryKey};
use crate::domain::schema::{entity_key, parse_entity_key, EntityType};
use crate::error::DecodeError;

const ATTR_BUYER_EMAIL: &str = "buyer_email";
const ATTR_TICKET_IDS: &str = "ticket_ids";
const ATTR_TOTAL_CENTS: &str = "total_cents";
const ATTR_CURRENCY: &str = "currency";
const ATTR_STATUS: &str = "status";
const ATTR_CREATED_AT: &str = "created_at";

/// Unique identifier for an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub Uuid);

impl OrderId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn sort_key(&self) -> String {
        entity_key(EntityType::Order, self)
    }

    pub fn from_sort_key(sk: &str) -> Result<Self, DecodeError> {
        match parse_entity_key(sk)? {
            (EntityType::Order, id) => id
                .parse::<Uuid>()
                .map(Self)
                .map_err(|e| DecodeError::InvalidKey(format!("{}: {}", sk, e))),
            (other, _) => Err(DecodeError::UnknownRecordKind(other.to_string())),
        }
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "pending"),
            OrderStatus::Confirmed => write!(f, "confirmed"),
            OrderStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "cancelled" | "canceled" => Ok(OrderStatus::Cancelled),
            _ => Err(format!("Unknown order status: {}", s)),
        }
    }
}

/// A buyer's order for one or more tickets of an event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub event_id: EventId,
    pub buyer_email: String,
    pub ticket_ids: Vec<TicketId>,
    pub total_cents: i64,
    pub currency: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn key(&self) -> PrimaryKey {
        PrimaryKey::new(self.event_id.partition_key(), self.id.sort_key())
    }

    pub fn to_item(&self) -> Item {
        let ticket_ids: Vec<String> = self.ticket_ids.iter().map(|t| t.to_string()).collect();

        Item::new(self.key())
            .with(ATTR_BUYER_EMAIL, self.buyer_email.clone())
            .with(ATTR_TICKET_IDS, ticket_ids)
            .with(ATTR_TOTAL_CENTS, self.total_cents)
            .with(ATTR_CURRENCY, self.currency.clone())
            .with(ATTR_STATUS, self.status.to_string())
            .with(ATTR_CREATED_AT, format_datetime(&self.created_at))
    }

    pub fn from_item(item: &Item) -> Result<Self, DecodeError> {
        let ticket_ids = item
            .require_str_list(ATTR_TICKET_IDS)?
            .iter()
            .map(|raw| {
                raw.parse::<TicketId>()
                    .map_err(|e| DecodeError::InvalidAttribute {
                        name: ATTR_TICKET_IDS.to_string(),
                        reason: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Order {
            id: OrderId::from_sort_key(item.sk())?,
            event_id: EventId::from_partition_key(item.pk())?,
            buyer_email: item.require_str(ATTR_BUYER_EMAIL)?.to_string(),
            ticket_ids,
            total_cents: item.require_i64(ATTR_TOTAL_CENTS)?,
            currency: item.require_str(ATTR_CURRENCY)?.to_string(),
            status: item
                .require_str(ATTR_STATUS)?
                .parse()
                .map_err(|reason| DecodeError::InvalidAttribute {
                    name: ATTR_STATUS.to_string(),
                    reason,
                })?,
            created_at: item.require_datetime(ATTR_CREATED_AT)?,
        })
    }
}

/// Data needed to place an order
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub event_id: EventId,
    pub buyer_email: String,
    pub ticket_ids: Vec<TicketId>,
}
