//! Event domain entity
//!
//! An event owns the `EVENT#<id>` partition. Its `METADATA` record is the only
//! record of the partition projected into the search index.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::item::{format_datetime, IndexKey, Item, PrimaryKey};
use crate::domain::schema::{
    entity_key, parse_entity_key, search_partition, search_sort, EntityType, SK_METADATA,
};
use crate::error::DecodeError;

const ATTR_NAME: &str = "name";
const ATTR_CATEGORY: &str = "category";
const ATTR_CITY: &str = "city";
const ATTR_VENUE: &str = "venue";
const ATTR_STARTS_AT: &str = "starts_at";
const ATTR_DESCRIPTION: &str = "description";
const ATTR_CREATED_AT: &str = "created_at";

/// Unique identifier for an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub Uuid);

impl EventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Partition key of every record belonging to this event
    pub fn partition_key(&self) -> String {
        entity_key(EntityType::Event, self)
    }

    /// Parse an `EVENT#<uuid>` partition key
    pub fn from_partition_key(pk: &str) -> Result<Self, DecodeError> {
        match parse_entity_key(pk)? {
            (EntityType::Event, id) => id
                .parse::<Uuid>()
                .map(Self)
                .map_err(|e| DecodeError::InvalidKey(format!("{}: {}", pk, e))),
            (other, _) => Err(DecodeError::InvalidKey(format!(
                "expected an EVENT partition, got {}",
                other
            ))),
        }
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for EventId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A ticketed event (the partition's metadata record)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    /// Search grouping, e.g. "music"
    pub category: String,
    pub city: String,
    pub venue: String,
    pub starts_at: DateTime<Utc>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub fn key(&self) -> PrimaryKey {
        PrimaryKey::new(self.id.partition_key(), SK_METADATA)
    }

    /// Position of this event in the search index
    pub fn search_key(&self) -> IndexKey {
        IndexKey::new(
            search_partition(&self.category),
            search_sort(&self.city, &self.starts_at),
        )
    }

    pub fn to_item(&self) -> Item {
        let mut item = Item::new(self.key())
            .with(ATTR_NAME, self.name.clone())
            .with(ATTR_CATEGORY, self.category.clone())
            .with(ATTR_CITY, self.city.clone())
            .with(ATTR_VENUE, self.venue.clone())
            .with(ATTR_STARTS_AT, format_datetime(&self.starts_at))
            .with(ATTR_CREATED_AT, format_datetime(&self.created_at))
            .with_search_key(self.search_key());

        if let Some(ref description) = self.description {
            item.set(ATTR_DESCRIPTION, description.clone());
        }

        item
    }

    pub fn from_item(item: &Item) -> Result<Self, DecodeError> {
        if item.sk() != SK_METADATA {
            return Err(DecodeError::UnknownRecordKind(format!(
                "expected {}, got {}",
                SK_METADATA,
                item.sk()
            )));
        }

        Ok(Event {
            id: EventId::from_partition_key(item.pk())?,
            name: item.require_str(ATTR_NAME)?.to_string(),
            category: item.require_str(ATTR_CATEGORY)?.to_string(),
            city: item.require_str(ATTR_CITY)?.to_string(),
            venue: item.require_str(ATTR_VENUE)?.to_string(),
            starts_at: item.require_datetime(ATTR_STARTS_AT)?,
            description: item.optional_str(ATTR_DESCRIPTION)?.map(str::to_string),
            created_at: item.require_datetime(ATTR_CREATED_AT)?,
        })
    }
}

/// Data needed to create a new event
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub name: String,
    pub category: String,
    pub city: String,
    pub venue: String,
    pub starts_at: DateTime<Utc>,
    pub description: Option<String>,
}
