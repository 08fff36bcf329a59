//! DynamoDB entity store
//!
//! Provides `DynamoDbEntityStore`, which implements the `EntityStore` port on
//! a DynamoDB table declared by a `TableDefinition`. Key attributes are always
//! referenced through expression attribute names since `GSI-PK`/`GSI-SK`
//! contain a hyphen.

mod convert;

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use aws_smithy_types::timeout::TimeoutConfig;

use crate::domain::item::{Item, PrimaryKey};
use crate::domain::ports::{
    check_limit, EntityStore, IndexQuery, Page, PartitionQuery, SortKeyCondition,
};
use crate::domain::schema::{KeyDefinition, TableDefinition};
use crate::error::StoreError;
use convert::{
    attributes_to_item, cursor_to_start_key, item_to_attributes, key_to_attributes,
    start_key_to_cursor, AttributeMap,
};

/// Service error codes worth retrying
const RETRYABLE_CODES: &[&str] = &[
    "ProvisionedThroughputExceededException",
    "RequestLimitExceeded",
    "ThrottlingException",
    "InternalServerError",
    "ServiceUnavailable",
];

/// Expression attribute name placeholders for table keys
const TABLE_KEY_NAMES: KeyNames = KeyNames {
    partition: "#pk",
    sort: "#sk",
};

/// Expression attribute name placeholders for index keys
const INDEX_KEY_NAMES: KeyNames = KeyNames {
    partition: "#gpk",
    sort: "#gsk",
};

/// DynamoDB store configuration
#[derive(Debug, Clone)]
pub struct DynamoDbConfig {
    /// DynamoDB table name
    pub table_name: String,
    /// AWS region (optional, uses SDK default if not specified)
    pub region: Option<String>,
    /// Optional endpoint override (e.g. LocalStack)
    pub endpoint: Option<String>,
    /// Timeout in milliseconds
    pub timeout_ms: Option<u64>,
}

/// DynamoDB-backed entity store
#[derive(Clone)]
pub struct DynamoDbEntityStore {
    client: Client,
    table: TableDefinition,
}

impl std::fmt::Debug for DynamoDbEntityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamoDbEntityStore")
            .field("table_name", &self.table.name)
            .finish()
    }
}

impl DynamoDbEntityStore {
    /// Create a store on the TicketPro table layout
    ///
    /// Configuration:
    /// - `region`: Override SDK region (uses SDK default if not specified)
    /// - `endpoint`: Override the service endpoint
    /// - `timeout_ms`: Operation timeout in milliseconds
    pub fn new(sdk_config: &aws_config::SdkConfig, config: DynamoDbConfig) -> Self {
        // Inherit HTTP client, retry config, credentials etc. from the shared SdkConfig
        let mut builder = aws_sdk_dynamodb::config::Builder::from(sdk_config);

        if let Some(region) = config.region {
            builder = builder.region(aws_sdk_dynamodb::config::Region::new(region));
        }

        if let Some(endpoint) = config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        if let Some(timeout_ms) = config.timeout_ms {
            let timeout_config = TimeoutConfig::builder()
                .operation_timeout(Duration::from_millis(timeout_ms))
                .build();
            builder = builder.timeout_config(timeout_config);
        }

        Self {
            client: Client::from_conf(builder.build()),
            table: TableDefinition::ticketpro(config.table_name),
        }
    }

    /// Create from a pre-built client (for testing)
    pub fn from_client(client: Client, table: TableDefinition) -> Self {
        Self { client, table }
    }

    pub fn table(&self) -> &TableDefinition {
        &self.table
    }

    fn index_key_definition(&self, name: &str) -> Result<&KeyDefinition, StoreError> {
        self.table
            .index(name)
            .map(|i| &i.key)
            .ok_or_else(|| StoreError::Backend(format!("Unknown index: {}", name)))
    }

    /// Run one Query page and decode it
    async fn run_query(
        &self,
        index_name: Option<&str>,
        condition: KeyCondition,
        limit: Option<usize>,
        start_key: Option<AttributeMap>,
        index_key: Option<&KeyDefinition>,
    ) -> Result<Page, StoreError> {
        // DynamoDB answers Limit < 1 with a ValidationException
        check_limit(limit)?;

        let response = self
            .client
            .query()
            .table_name(&self.table.name)
            .set_index_name(index_name.map(str::to_string))
            .key_condition_expression(condition.expression)
            .set_expression_attribute_names(Some(condition.names))
            .set_expression_attribute_values(Some(condition.values))
            .set_limit(limit.map(|l| i32::try_from(l).unwrap_or(i32::MAX)))
            .set_exclusive_start_key(start_key)
            .send()
            .await
            .map_err(|e| map_sdk_error("Query", e))?;

        let items = response
            .items()
            .iter()
            .map(|attrs| attributes_to_item(attrs, &self.table.primary_key))
            .collect::<Result<Vec<_>, _>>()?;

        let next = match response.last_evaluated_key() {
            Some(key) if !key.is_empty() => Some(start_key_to_cursor(
                key,
                &self.table.primary_key,
                index_key,
            )?),
            _ => None,
        };

        Ok(Page { items, next })
    }
}

#[async_trait]
impl EntityStore for DynamoDbEntityStore {
    async fn get(&self, key: &PrimaryKey) -> Result<Option<Item>, StoreError> {
        let response = self
            .client
            .get_item()
            .table_name(&self.table.name)
            .set_key(Some(key_to_attributes(key, &self.table.primary_key)))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| map_sdk_error("GetItem", e))?;

        response
            .item()
            .map(|attrs| attributes_to_item(attrs, &self.table.primary_key))
            .transpose()
    }

    async fn put(&self, item: Item) -> Result<(), StoreError> {
        self.client
            .put_item()
            .table_name(&self.table.name)
            .set_item(Some(item_to_attributes(&item, &self.table.primary_key)))
            .send()
            .await
            .map_err(|e| map_sdk_error("PutItem", e))?;

        tracing::debug!(pk = %item.pk(), sk = %item.sk(), table = %self.table.name, "Stored item");
        Ok(())
    }

    async fn delete(&self, key: &PrimaryKey) -> Result<(), StoreError> {
        // DeleteItem on an absent key succeeds
        self.client
            .delete_item()
            .table_name(&self.table.name)
            .set_key(Some(key_to_attributes(key, &self.table.primary_key)))
            .send()
            .await
            .map_err(|e| map_sdk_error("DeleteItem", e))?;

        tracing::debug!(pk = %key.pk, sk = %key.sk, table = %self.table.name, "Deleted item");
        Ok(())
    }

    async fn query_partition(&self, query: &PartitionQuery) -> Result<Page, StoreError> {
        let condition = key_condition(
            &self.table.primary_key,
            TABLE_KEY_NAMES,
            &query.pk,
            query.sort.as_ref(),
        );
        let start_key = query
            .cursor
            .as_ref()
            .map(|c| cursor_to_start_key(c, &self.table.primary_key, None))
            .transpose()?;

        self.run_query(None, condition, query.limit, start_key, None)
            .await
    }

    async fn query_index(&self, query: &IndexQuery) -> Result<Page, StoreError> {
        let index_key = self.index_key_definition(&query.index)?;
        let condition = key_condition(index_key, INDEX_KEY_NAMES, &query.pk, query.sort.as_ref());
        let start_key = query
            .cursor
            .as_ref()
            .map(|c| cursor_to_start_key(c, &self.table.primary_key, Some(index_key)))
            .transpose()?;

        self.run_query(
            Some(&query.index),
            condition,
            query.limit,
            start_key,
            Some(index_key),
        )
        .await
    }
}

#[derive(Debug, Clone, Copy)]
struct KeyNames {
    partition: &'static str,
    sort: &'static str,
}

/// A key condition expression with its placeholders
#[derive(Debug, Clone, PartialEq)]
struct KeyCondition {
    expression: String,
    names: HashMap<String, String>,
    values: HashMap<String, AttributeValue>,
}

fn key_condition(
    key: &KeyDefinition,
    placeholders: KeyNames,
    pk: &str,
    sort: Option<&SortKeyCondition>,
) -> KeyCondition {
    let KeyNames {
        partition: pk_name,
        sort: sk_name,
    } = placeholders;

    let mut expression = format!("{} = :pk", pk_name);
    let mut names = HashMap::from([(pk_name.to_string(), key.partition_key.clone())]);
    let mut values = HashMap::from([(":pk".to_string(), AttributeValue::S(pk.to_string()))]);

    if let Some(sort) = sort {
        names.insert(sk_name.to_string(), key.sort_key.clone());
        match sort {
            SortKeyCondition::Equals(v) => {
                expression.push_str(&format!(" AND {} = :sk", sk_name));
                values.insert(":sk".to_string(), AttributeValue::S(v.clone()));
            }
            SortKeyCondition::BeginsWith(prefix) => {
                expression.push_str(&format!(" AND begins_with({}, :sk)", sk_name));
                values.insert(":sk".to_string(), AttributeValue::S(prefix.clone()));
            }
            SortKeyCondition::Between(low, high) => {
                expression.push_str(&format!(" AND {} BETWEEN :sk_low AND :sk_high", sk_name));
                values.insert(":sk_low".to_string(), AttributeValue::S(low.clone()));
                values.insert(":sk_high".to_string(), AttributeValue::S(high.clone()));
            }
        }
    }

    KeyCondition {
        expression,
        names,
        values,
    }
}

fn is_retryable_code(code: &str) -> bool {
    RETRYABLE_CODES.contains(&code)
}

/// Classify an SDK failure: throttling, timeouts and transport errors are
/// transient; anything else is a backend fault
fn map_sdk_error<E, R>(operation: &str, err: SdkError<E, R>) -> StoreError
where
    E: ProvideErrorMetadata,
    SdkError<E, R>: std::fmt::Display,
{
    let (retryable, detail) = match &err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            (true, err.to_string())
        }
        SdkError::ServiceError(service_err) => {
            let inner = service_err.err();
            let code = inner.code().unwrap_or("Unknown");
            (
                is_retryable_code(code),
                format!("{}: {}", code, inner.message().unwrap_or("no message")),
            )
        }
        _ => (false, err.to_string()),
    };

    let message = format!("DynamoDB {} failed: {}", operation, detail);
    if retryable {
        tracing::warn!(operation, "{}", message);
        StoreError::Unavailable(message)
    } else {
        tracing::error!(operation, "{}", message);
        StoreError::Backend(message)
    }
}
