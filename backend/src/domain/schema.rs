//! Entity store key schema
//!
//! Attribute names, index names and key builders for the single-table layout.
//!
//! ## Table Schema
//!
//! ```text
//! Table: ticketpro-main-<stage>
//!
//! Primary Key:
//!   - PK (String, Partition Key): "<ENTITY-TYPE>#<id>", e.g. "EVENT#123"
//!   - SK (String, Sort Key): sub-record kind, e.g. "METADATA", "TICKET#<id>"
//!
//! Global Secondary Index "GSI-busqueda":
//!   - GSI-PK (String, Partition Key): category, lowercased
//!   - GSI-SK (String, Sort Key): "<city, lowercased>#<starts_at RFC 3339>"
//!
//! Records without GSI-PK/GSI-SK are not projected into the index.
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::DecodeError;

/// Partition key attribute
pub const ATTR_PK: &str = "PK";

/// Sort key attribute
pub const ATTR_SK: &str = "SK";

/// Search index partition key attribute
pub const ATTR_GSI_PK: &str = "GSI-PK";

/// Search index sort key attribute
pub const ATTR_GSI_SK: &str = "GSI-SK";

/// Name of the search index (category/city)
pub const SEARCH_INDEX_NAME: &str = "GSI-busqueda";

/// Separator between an entity tag and its id
pub const KEY_DELIMITER: char = '#';

/// Sort key of an entity's metadata record
pub const SK_METADATA: &str = "METADATA";

/// Table name prefix; the stage is appended
pub const TABLE_NAME_PREFIX: &str = "ticketpro-main";

/// A (partition, sort) pair of attribute names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDefinition {
    pub partition_key: String,
    pub sort_key: String,
}

impl KeyDefinition {
    pub fn new(partition_key: impl Into<String>, sort_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            sort_key: sort_key.into(),
        }
    }
}

/// A global secondary index over the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDefinition {
    pub name: String,
    pub key: KeyDefinition,
}

/// Declared shape of the entity store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinition {
    pub name: String,
    pub primary_key: KeyDefinition,
    pub indexes: Vec<IndexDefinition>,
}

impl TableDefinition {
    /// The TicketPro main table: PK/SK primary key plus the search index
    pub fn ticketpro(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: KeyDefinition::new(ATTR_PK, ATTR_SK),
            indexes: vec![IndexDefinition {
                name: SEARCH_INDEX_NAME.to_string(),
                key: KeyDefinition::new(ATTR_GSI_PK, ATTR_GSI_SK),
            }],
        }
    }

    /// Default table name for a stage, e.g. `ticketpro-main-dev`
    pub fn default_name(stage: &str) -> String {
        format!("{}-{}", TABLE_NAME_PREFIX, stage)
    }

    pub fn index(&self, name: &str) -> Option<&IndexDefinition> {
        self.indexes.iter().find(|i| i.name == name)
    }

    /// True if `attribute` is part of the primary key or any index key
    pub fn is_key_attribute(&self, attribute: &str) -> bool {
        self.primary_key.partition_key == attribute
            || self.primary_key.sort_key == attribute
            || self
                .indexes
                .iter()
                .any(|i| i.key.partition_key == attribute || i.key.sort_key == attribute)
    }
}

/// Entity type tag carried in the partition key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityType {
    Event,
    Ticket,
    Order,
    /// Reserved for user-scoped partitions
    User,
}

impl EntityType {
    pub fn tag(&self) -> &'static str {
        match self {
            EntityType::Event => "EVENT",
            EntityType::Ticket => "TICKET",
            EntityType::Order => "ORDER",
            EntityType::User => "USER",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for EntityType {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EVENT" => Ok(EntityType::Event),
            "TICKET" => Ok(EntityType::Ticket),
            "ORDER" => Ok(EntityType::Order),
            "USER" => Ok(EntityType::User),
            _ => Err(DecodeError::InvalidKey(format!("unknown entity type: {}", s))),
        }
    }
}

/// Build a namespaced key: `<TAG>#<id>`
pub fn entity_key(entity: EntityType, id: impl fmt::Display) -> String {
    format!("{}{}{}", entity.tag(), KEY_DELIMITER, id)
}

/// Split a namespaced key into its entity type and id
pub fn parse_entity_key(key: &str) -> Result<(EntityType, &str), DecodeError> {
    let (tag, id) = key
        .split_once(KEY_DELIMITER)
        .ok_or_else(|| DecodeError::InvalidKey(format!("missing '#' in key: {}", key)))?;

    if id.is_empty() {
        return Err(DecodeError::InvalidKey(format!("empty id in key: {}", key)));
    }

    Ok((tag.parse()?, id))
}

/// Sort key prefix shared by every record of an entity type: `<TAG>#`
pub fn sort_key_prefix(entity: EntityType) -> String {
    format!("{}{}", entity.tag(), KEY_DELIMITER)
}

/// Search index partition value for a category
pub fn search_partition(category: &str) -> String {
    category.trim().to_lowercase()
}

/// Search index sort prefix for a city: `<city>#`
pub fn search_city_prefix(city: &str) -> String {
    format!("{}{}", city.trim().to_lowercase(), KEY_DELIMITER)
}

/// Search index sort value: `<city>#<starts_at>`, ordered by city then date
pub fn search_sort(city: &str, starts_at: &DateTime<Utc>) -> String {
    format!(
        "{}{}",
        search_city_prefix(city),
        starts_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    )
}
