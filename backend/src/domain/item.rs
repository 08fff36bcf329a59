//! Untyped store record
//!
//! An `Item` is the wire-level record the entity store holds: the primary key
//! plus a flat map of JSON-compatible attributes. Index key attributes
//! (`GSI-PK`, `GSI-SK`) are ordinary attributes; an item is projected into an
//! index only when both of that index's attributes are present as strings.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::schema::{IndexDefinition, ATTR_GSI_PK, ATTR_GSI_SK, ATTR_PK, ATTR_SK};
use crate::error::{DecodeError, StoreError};

/// Primary identity of a record
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PrimaryKey {
    #[serde(rename = "PK")]
    pub pk: String,
    #[serde(rename = "SK")]
    pub sk: String,
}

impl PrimaryKey {
    pub fn new(pk: impl Into<String>, sk: impl Into<String>) -> Self {
        Self {
            pk: pk.into(),
            sk: sk.into(),
        }
    }
}

impl std::fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.pk, self.sk)
    }
}

/// Key of a record within a secondary index
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IndexKey {
    pub pk: String,
    pub sk: String,
}

impl IndexKey {
    pub fn new(pk: impl Into<String>, sk: impl Into<String>) -> Self {
        Self {
            pk: pk.into(),
            sk: sk.into(),
        }
    }
}

/// A record in the entity store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "PK")]
    pk: String,
    #[serde(rename = "SK")]
    sk: String,
    #[serde(flatten)]
    attributes: Map<String, Value>,
}

impl Item {
    pub fn new(key: PrimaryKey) -> Self {
        Self {
            pk: key.pk,
            sk: key.sk,
            attributes: Map::new(),
        }
    }

    pub fn pk(&self) -> &str {
        &self.pk
    }

    pub fn sk(&self) -> &str {
        &self.sk
    }

    pub fn key(&self) -> PrimaryKey {
        PrimaryKey::new(self.pk.clone(), self.sk.clone())
    }

    /// Non-key attributes, including index attributes
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Set an attribute. `PK` and `SK` are fixed by the key and are ignored here.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        if name == ATTR_PK || name == ATTR_SK {
            tracing::warn!(attribute = %name, key = %self.key(), "Ignoring write to primary key attribute");
            return;
        }
        self.attributes.insert(name, value.into());
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Populate the search index attributes
    pub fn with_search_key(self, key: IndexKey) -> Self {
        self.with(ATTR_GSI_PK, key.pk).with(ATTR_GSI_SK, key.sk)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.attributes.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(Value::as_str)
    }

    /// Key of this item in the search index, if it participates
    pub fn search_key(&self) -> Option<IndexKey> {
        self.string_pair(ATTR_GSI_PK, ATTR_GSI_SK)
    }

    /// Key of this item in the given index, if both index attributes are strings
    pub fn index_key(&self, index: &IndexDefinition) -> Option<IndexKey> {
        self.string_pair(&index.key.partition_key, &index.key.sort_key)
    }

    fn string_pair(&self, pk: &str, sk: &str) -> Option<IndexKey> {
        let pk = self.get_str(pk)?;
        let sk = self.get_str(sk)?;
        Some(IndexKey::new(pk, sk))
    }

    // Typed accessors used when decoding entities

    pub fn require_str(&self, name: &str) -> Result<&str, DecodeError> {
        match self.attributes.get(name) {
            None | Some(Value::Null) => Err(DecodeError::MissingAttribute(name.to_string())),
            Some(Value::String(s)) => Ok(s),
            Some(_) => Err(invalid(name, "expected a string")),
        }
    }

    pub fn optional_str(&self, name: &str) -> Result<Option<&str>, DecodeError> {
        match self.attributes.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(_) => Err(invalid(name, "expected a string")),
        }
    }

    pub fn require_i64(&self, name: &str) -> Result<i64, DecodeError> {
        match self.attributes.get(name) {
            None | Some(Value::Null) => Err(DecodeError::MissingAttribute(name.to_string())),
            Some(v) => v.as_i64().ok_or_else(|| invalid(name, "expected an integer")),
        }
    }

    pub fn require_u32(&self, name: &str) -> Result<u32, DecodeError> {
        let n = self.require_i64(name)?;
        u32::try_from(n).map_err(|_| invalid(name, "out of range"))
    }

    pub fn require_datetime(&self, name: &str) -> Result<DateTime<Utc>, DecodeError> {
        let raw = self.require_str(name)?;
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| invalid(name, &e.to_string()))
    }

    pub fn require_str_list(&self, name: &str) -> Result<Vec<String>, DecodeError> {
        match self.attributes.get(name) {
            None | Some(Value::Null) => Err(DecodeError::MissingAttribute(name.to_string())),
            Some(Value::Array(values)) => values
                .iter()
                .map(|v| {
                    v.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| invalid(name, "expected a list of strings"))
                })
                .collect(),
            Some(_) => Err(invalid(name, "expected a list")),
        }
    }

    /// Flat JSON object with `PK` and `SK` beside the other attributes
    pub fn to_value(&self) -> Value {
        let mut object = Map::with_capacity(self.attributes.len() + 2);
        object.insert(ATTR_PK.to_string(), Value::String(self.pk.clone()));
        object.insert(ATTR_SK.to_string(), Value::String(self.sk.clone()));
        for (name, value) in &self.attributes {
            object.insert(name.clone(), value.clone());
        }
        Value::Object(object)
    }
}

impl TryFrom<Value> for Item {
    type Error = StoreError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        serde_json::from_value(value).map_err(|e| StoreError::MalformedItem(e.to_string()))
    }
}

/// RFC 3339 with second precision, the stored form of timestamps
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn invalid(name: &str, reason: &str) -> DecodeError {
    DecodeError::InvalidAttribute {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}
