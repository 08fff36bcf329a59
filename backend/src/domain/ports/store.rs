//! Entity store port
//!
//! The access patterns the key schema supports: lookup by primary key,
//! partition query ordered by `SK`, and index query ordered by the index sort
//! key. There is no scan; a new access pattern needs a new index.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::item::{IndexKey, Item, PrimaryKey};
use crate::domain::schema::SEARCH_INDEX_NAME;
use crate::error::StoreError;

/// Restriction on the sort key of a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKeyCondition {
    Equals(String),
    BeginsWith(String),
    /// Inclusive on both ends
    Between(String, String),
}

impl SortKeyCondition {
    pub fn begins_with(prefix: impl Into<String>) -> Self {
        SortKeyCondition::BeginsWith(prefix.into())
    }

    pub fn matches(&self, sort_key: &str) -> bool {
        match self {
            SortKeyCondition::Equals(v) => sort_key == v,
            SortKeyCondition::BeginsWith(prefix) => sort_key.starts_with(prefix.as_str()),
            SortKeyCondition::Between(low, high) => {
                sort_key >= low.as_str() && sort_key <= high.as_str()
            }
        }
    }
}

/// Position to resume a query after: the last item returned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub key: PrimaryKey,
    /// Set for index queries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_key: Option<IndexKey>,
}

/// Records sharing a partition key, ordered by `SK` ascending
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionQuery {
    pub pk: String,
    pub sort: Option<SortKeyCondition>,
    pub limit: Option<usize>,
    pub cursor: Option<Cursor>,
}

impl PartitionQuery {
    pub fn new(pk: impl Into<String>) -> Self {
        Self {
            pk: pk.into(),
            sort: None,
            limit: None,
            cursor: None,
        }
    }

    pub fn sort(mut self, condition: SortKeyCondition) -> Self {
        self.sort = Some(condition);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn after(mut self, cursor: Cursor) -> Self {
        self.cursor = Some(cursor);
        self
    }
}

/// Records sharing an index partition key, ordered by index sort key
/// (ties broken by primary key)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexQuery {
    pub index: String,
    pub pk: String,
    pub sort: Option<SortKeyCondition>,
    pub limit: Option<usize>,
    pub cursor: Option<Cursor>,
}

impl IndexQuery {
    pub fn new(index: impl Into<String>, pk: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            pk: pk.into(),
            sort: None,
            limit: None,
            cursor: None,
        }
    }

    /// Query the search index (`GSI-busqueda`)
    pub fn search(pk: impl Into<String>) -> Self {
        Self::new(SEARCH_INDEX_NAME, pk)
    }

    pub fn sort(mut self, condition: SortKeyCondition) -> Self {
        self.sort = Some(condition);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn after(mut self, cursor: Cursor) -> Self {
        self.cursor = Some(cursor);
        self
    }
}

/// Either query shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Partition(PartitionQuery),
    Index(IndexQuery),
}

impl Query {
    fn set_cursor(&mut self, cursor: Cursor) {
        match self {
            Query::Partition(q) => q.cursor = Some(cursor),
            Query::Index(q) => q.cursor = Some(cursor),
        }
    }
}

impl From<PartitionQuery> for Query {
    fn from(q: PartitionQuery) -> Self {
        Query::Partition(q)
    }
}

impl From<IndexQuery> for Query {
    fn from(q: IndexQuery) -> Self {
        Query::Index(q)
    }
}

/// One page of query results
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Page {
    pub items: Vec<Item>,
    /// Resume point; `None` once the sequence is exhausted
    pub next: Option<Cursor>,
}

/// Reject a page size of zero; a page must be able to make progress
pub fn check_limit(limit: Option<usize>) -> Result<(), StoreError> {
    match limit {
        Some(0) => Err(StoreError::Backend(
            "Query limit must be at least 1".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Sorted key/value store holding every entity kind
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Fetch one record; `None` if the key is absent
    async fn get(&self, key: &PrimaryKey) -> Result<Option<Item>, StoreError>;

    /// Insert or fully replace the record with the item's `(PK, SK)`
    async fn put(&self, item: Item) -> Result<(), StoreError>;

    /// Remove a record. Removing an absent key succeeds.
    async fn delete(&self, key: &PrimaryKey) -> Result<(), StoreError>;

    async fn query_partition(&self, query: &PartitionQuery) -> Result<Page, StoreError>;

    async fn query_index(&self, query: &IndexQuery) -> Result<Page, StoreError>;

    async fn query(&self, query: &Query) -> Result<Page, StoreError> {
        match query {
            Query::Partition(q) => self.query_partition(q).await,
            Query::Index(q) => self.query_index(q).await,
        }
    }
}

/// Drain a query by following cursors until the sequence is exhausted
pub async fn collect_all<S>(store: &S, query: impl Into<Query>) -> Result<Vec<Item>, StoreError>
where
    S: EntityStore + ?Sized,
{
    let mut query = query.into();
    let mut items = Vec::new();

    loop {
        let page = store.query(&query).await?;
        items.extend(page.items);

        match page.next {
            Some(cursor) => query.set_cursor(cursor),
            None => break,
        }
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_key_conditions() {
        assert!(SortKeyCondition::Equals("METADATA".into()).matches("METADATA"));
        assert!(!SortKeyCondition::Equals("METADATA".into()).matches("METADATA#2"));

        let tickets = SortKeyCondition::begins_with("TICKET#");
        assert!(tickets.matches("TICKET#1"));
        assert!(!tickets.matches("ORDER#1"));

        let range = SortKeyCondition::Between("B".into(), "D".into());
        assert!(range.matches("B"));
        assert!(range.matches("C#x"));
        assert!(range.matches("D"));
        assert!(!range.matches("D#x"));
        assert!(!range.matches("A"));
    }

    #[test]
    fn zero_limit_is_rejected() {
        assert!(matches!(check_limit(Some(0)), Err(StoreError::Backend(_))));
        assert!(check_limit(Some(1)).is_ok());
        assert!(check_limit(None).is_ok());
    }

    #[test]
    fn search_query_targets_search_index() {
        let q = IndexQuery::search("music").limit(10);
        assert_eq!(q.index, "GSI-busqueda");
        assert_eq!(q.pk, "music");
        assert_eq!(q.limit, Some(10));
    }

    #[test]
    fn cursor_serializes_without_index_key_for_partitions() {
        let cursor = Cursor {
            key: PrimaryKey::new("EVENT#1", "TICKET#2"),
            index_key: None,
        };
        assert_eq!(
            serde_json::to_string(&cursor).unwrap(),
            r#"{"key":{"PK":"EVENT#1","SK":"TICKET#2"}}"#
        );
    }
}
