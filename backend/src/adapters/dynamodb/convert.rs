//! Conversions between store items and DynamoDB attribute maps

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use serde_json::{Map, Number, Value};

use crate::domain::item::{IndexKey, Item, PrimaryKey};
use crate::domain::ports::Cursor;
use crate::domain::schema::KeyDefinition;
use crate::error::StoreError;

pub(crate) type AttributeMap = HashMap<String, AttributeValue>;

/// JSON value -> DynamoDB attribute
pub(crate) fn to_attribute(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(values) => AttributeValue::L(values.iter().map(to_attribute).collect()),
        Value::Object(object) => AttributeValue::M(
            object
                .iter()
                .map(|(k, v)| (k.clone(), to_attribute(v)))
                .collect(),
        ),
    }
}

/// DynamoDB attribute -> JSON value
pub(crate) fn from_attribute(attr: &AttributeValue) -> Result<Value, StoreError> {
    let value = match attr {
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::N(n) => parse_number(n)?,
        AttributeValue::Ss(values) => Value::Array(values.iter().cloned().map(Value::String).collect()),
        AttributeValue::Ns(values) => Value::Array(
            values
                .iter()
                .map(|n| parse_number(n))
                .collect::<Result<_, _>>()?,
        ),
        AttributeValue::L(values) => Value::Array(
            values
                .iter()
                .map(from_attribute)
                .collect::<Result<_, _>>()?,
        ),
        AttributeValue::M(map) => {
            let mut object = Map::with_capacity(map.len());
            for (k, v) in map {
                object.insert(k.clone(), from_attribute(v)?);
            }
            Value::Object(object)
        }
        AttributeValue::B(_) | AttributeValue::Bs(_) => {
            return Err(StoreError::MalformedItem(
                "binary attributes are not supported".to_string(),
            ))
        }
        _ => {
            return Err(StoreError::MalformedItem(
                "unsupported attribute type".to_string(),
            ))
        }
    };

    Ok(value)
}

fn parse_number(raw: &str) -> Result<Value, StoreError> {
    if let Ok(i) = raw.parse::<i64>() {
        return Ok(Value::from(i));
    }
    if let Ok(u) = raw.parse::<u64>() {
        return Ok(Value::from(u));
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| StoreError::MalformedItem(format!("invalid number: {}", raw)))
}

pub(crate) fn key_to_attributes(key: &PrimaryKey, def: &KeyDefinition) -> AttributeMap {
    HashMap::from([
        (def.partition_key.clone(), AttributeValue::S(key.pk.clone())),
        (def.sort_key.clone(), AttributeValue::S(key.sk.clone())),
    ])
}

pub(crate) fn item_to_attributes(item: &Item, def: &KeyDefinition) -> AttributeMap {
    let mut attributes = key_to_attributes(&item.key(), def);
    for (name, value) in item.attributes() {
        attributes.insert(name.clone(), to_attribute(value));
    }
    attributes
}

fn require_string<'a>(attrs: &'a AttributeMap, name: &str) -> Result<&'a str, StoreError> {
    attrs
        .get(name)
        .and_then(|v| v.as_s().ok())
        .map(String::as_str)
        .ok_or_else(|| StoreError::MalformedItem(format!("missing string attribute {}", name)))
}

pub(crate) fn attributes_to_item(attrs: &AttributeMap, def: &KeyDefinition) -> Result<Item, StoreError> {
    let key = PrimaryKey::new(
        require_string(attrs, &def.partition_key)?,
        require_string(attrs, &def.sort_key)?,
    );

    let mut item = Item::new(key);
    for (name, value) in attrs {
        if *name == def.partition_key || *name == def.sort_key {
            continue;
        }
        item.set(name.clone(), from_attribute(value)?);
    }
    Ok(item)
}

/// Cursor -> ExclusiveStartKey
pub(crate) fn cursor_to_start_key(
    cursor: &Cursor,
    primary: &KeyDefinition,
    index: Option<&KeyDefinition>,
) -> Result<AttributeMap, StoreError> {
    let mut start = key_to_attributes(&cursor.key, primary);

    if let Some(index) = index {
        let index_key = cursor.index_key.as_ref().ok_or_else(|| {
            StoreError::Backend("Index query cursor has no index key".to_string())
        })?;
        start.insert(
            index.partition_key.clone(),
            AttributeValue::S(index_key.pk.clone()),
        );
        start.insert(index.sort_key.clone(), AttributeValue::S(index_key.sk.clone()));
    }

    Ok(start)
}

/// LastEvaluatedKey -> Cursor
pub(crate) fn start_key_to_cursor(
    key: &AttributeMap,
    primary: &KeyDefinition,
    index: Option<&KeyDefinition>,
) -> Result<Cursor, StoreError> {
    let index_key = match index {
        Some(index) => Some(IndexKey::new(
            require_string(key, &index.partition_key)?,
            require_string(key, &index.sort_key)?,
        )),
        None => None,
    };

    Ok(Cursor {
        key: PrimaryKey::new(
            require_string(key, &primary.partition_key)?,
            require_string(key, &primary.sort_key)?,
        ),
        index_key,
    })
}
