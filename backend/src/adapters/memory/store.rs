//! In-memory entity store
//!
//! Reference engine for the key schema. The primary table is an ordered map
//! keyed by `(PK, SK)`; each declared index is an ordered set keyed by
//! `(index PK, index SK, PK, SK)` and is updated under the same write lock as
//! the primary record, so index reads never lag writes.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Bound;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::item::{IndexKey, Item, PrimaryKey};
use crate::domain::ports::{check_limit, Cursor, EntityStore, IndexQuery, Page, PartitionQuery};
use crate::domain::schema::TableDefinition;
use crate::error::StoreError;

type IndexEntry = (IndexKey, PrimaryKey);

#[derive(Default)]
struct Tables {
    items: BTreeMap<PrimaryKey, Item>,
    indexes: HashMap<String, BTreeSet<IndexEntry>>,
}

/// Entity store held in process memory
pub struct InMemoryEntityStore {
    table: TableDefinition,
    tables: RwLock<Tables>,
}

impl Default for InMemoryEntityStore {
    fn default() -> Self {
        Self::new(TableDefinition::ticketpro(TableDefinition::default_name(
            "local",
        )))
    }
}

impl InMemoryEntityStore {
    pub fn new(table: TableDefinition) -> Self {
        Self {
            table,
            tables: RwLock::new(Tables::default()),
        }
    }

    pub fn table(&self) -> &TableDefinition {
        &self.table
    }

    /// Number of records in the primary table
    pub async fn len(&self) -> usize {
        self.tables.read().await.items.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tables.read().await.items.is_empty()
    }

    fn add_to_indexes(&self, tables: &mut Tables, item: &Item) {
        for index in &self.table.indexes {
            if let Some(index_key) = item.index_key(index) {
                tables
                    .indexes
                    .entry(index.name.clone())
                    .or_default()
                    .insert((index_key, item.key()));
            }
        }
    }

    /// Key attributes must be non-empty strings, as DynamoDB requires
    fn check_keys(&self, item: &Item) -> Result<(), StoreError> {
        let key = item.key();
        if key.pk.is_empty() || key.sk.is_empty() {
            return Err(StoreError::Backend(
                "Primary key attributes must not be empty".to_string(),
            ));
        }
        for index in &self.table.indexes {
            for attr in [&index.key.partition_key, &index.key.sort_key] {
                if item.get_str(attr) == Some("") {
                    return Err(StoreError::Backend(format!(
                        "Index key attribute {attr} of {} must not be empty",
                        index.name
                    )));
                }
            }
        }
        Ok(())
    }

    fn remove_from_indexes(&self, tables: &mut Tables, item: &Item) {
        for index in &self.table.indexes {
            if let Some(index_key) = item.index_key(index) {
                if let Some(entries) = tables.indexes.get_mut(&index.name) {
                    entries.remove(&(index_key, item.key()));
                }
            }
        }
    }
}

/// Take up to `limit` items and report whether more remain
fn paginate<'a, I>(mut matching: I, limit: Option<usize>) -> (Vec<Item>, bool)
where
    I: Iterator<Item = &'a Item>,
{
    let limit = limit.unwrap_or(usize::MAX);
    let items: Vec<Item> = matching.by_ref().take(limit).cloned().collect();
    let more = items.len() == limit && matching.next().is_some();
    (items, more)
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn get(&self, key: &PrimaryKey) -> Result<Option<Item>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.items.get(key).cloned())
    }

    async fn put(&self, item: Item) -> Result<(), StoreError> {
        self.check_keys(&item)?;
        let key = item.key();
        let mut tables = self.tables.write().await;

        if let Some(previous) = tables.items.remove(&key) {
            self.remove_from_indexes(&mut tables, &previous);
        }
        self.add_to_indexes(&mut tables, &item);
        tables.items.insert(key.clone(), item);

        tracing::debug!(pk = %key.pk, sk = %key.sk, "Stored item");
        Ok(())
    }

    async fn delete(&self, key: &PrimaryKey) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;

        if let Some(previous) = tables.items.remove(key) {
            self.remove_from_indexes(&mut tables, &previous);
            tracing::debug!(pk = %key.pk, sk = %key.sk, "Deleted item");
        }
        Ok(())
    }

    async fn query_partition(&self, query: &PartitionQuery) -> Result<Page, StoreError> {
        check_limit(query.limit)?;
        let tables = self.tables.read().await;

        let start = match &query.cursor {
            Some(cursor) => Bound::Excluded(cursor.key.clone()),
            None => Bound::Included(PrimaryKey::new(query.pk.clone(), String::new())),
        };

        let matching = tables
            .items
            .range((start, Bound::Unbounded))
            .take_while(|(key, _)| key.pk == query.pk)
            .filter(|(key, _)| query.sort.as_ref().map_or(true, |c| c.matches(&key.sk)))
            .map(|(_, item)| item);

        let (items, more) = paginate(matching, query.limit);
        let next = if more {
            items.last().map(|item| Cursor {
                key: item.key(),
                index_key: None,
            })
        } else {
            None
        };

        Ok(Page { items, next })
    }

    async fn query_index(&self, query: &IndexQuery) -> Result<Page, StoreError> {
        check_limit(query.limit)?;
        let index = self
            .table
            .index(&query.index)
            .ok_or_else(|| StoreError::Backend(format!("Unknown index: {}", query.index)))?;

        let start = match &query.cursor {
            Some(Cursor {
                key,
                index_key: Some(index_key),
            }) => Bound::Excluded((index_key.clone(), key.clone())),
            Some(_) => {
                return Err(StoreError::Backend(
                    "Index query cursor has no index key".to_string(),
                ))
            }
            None => Bound::Included((
                IndexKey::new(query.pk.clone(), String::new()),
                PrimaryKey::new(String::new(), String::new()),
            )),
        };

        let tables = self.tables.read().await;
        let Some(entries) = tables.indexes.get(&index.name) else {
            return Ok(Page::default());
        };

        let matching = entries
            .range((start, Bound::Unbounded))
            .take_while(|(index_key, _)| index_key.pk == query.pk)
            .filter(|(index_key, _)| {
                query
                    .sort
                    .as_ref()
                    .map_or(true, |c| c.matches(&index_key.sk))
            })
            .filter_map(|(_, key)| tables.items.get(key));

        let (items, more) = paginate(matching, query.limit);
        let next = if more {
            items.last().map(|item| Cursor {
                key: item.key(),
                index_key: item.index_key(index),
            })
        } else {
            None
        };

        Ok(Page { items, next })
    }
}
