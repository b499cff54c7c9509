//! Conversion between store items and DynamoDB attribute maps.
//!
//! Every [`AttributeValue`] variant has a DynamoDB counterpart, so writes
//! never fail here. Reads reject the set types (`SS`, `NS`, `BS`), which the
//! store model has no variant for.

use std::collections::HashMap;

use authkv_storage::{AttributeValue, Item, PrimaryKey, StorageError, StorageResult};
use aws_sdk_dynamodb::{primitives::Blob, types::AttributeValue as DynamoValue};
use bytes::Bytes;

/// DynamoDB's wire form of an item.
pub(crate) type DynamoItem = HashMap<String, DynamoValue>;

pub(crate) fn to_dynamo(value: AttributeValue) -> DynamoValue {
    match value {
        AttributeValue::S(s) => DynamoValue::S(s),
        AttributeValue::N(n) => DynamoValue::N(n),
        AttributeValue::B(bytes) => DynamoValue::B(Blob::new(bytes.to_vec())),
        AttributeValue::Bool(b) => DynamoValue::Bool(b),
        AttributeValue::Null => DynamoValue::Null(true),
        AttributeValue::L(values) => DynamoValue::L(values.into_iter().map(to_dynamo).collect()),
        AttributeValue::M(map) => {
            DynamoValue::M(map.into_iter().map(|(name, value)| (name, to_dynamo(value))).collect())
        },
    }
}

pub(crate) fn from_dynamo(name: &str, value: DynamoValue) -> StorageResult<AttributeValue> {
    Ok(match value {
        DynamoValue::S(s) => AttributeValue::S(s),
        DynamoValue::N(n) => AttributeValue::N(n),
        DynamoValue::B(blob) => AttributeValue::B(Bytes::from(blob.into_inner())),
        DynamoValue::Bool(b) => AttributeValue::Bool(b),
        DynamoValue::Null(_) => AttributeValue::Null,
        DynamoValue::L(values) => AttributeValue::L(
            values.into_iter().map(|value| from_dynamo(name, value)).collect::<StorageResult<_>>()?,
        ),
        DynamoValue::M(map) => AttributeValue::M(
            map.into_iter()
                .map(|(key, value)| Ok((key, from_dynamo(name, value)?)))
                .collect::<StorageResult<_>>()?,
        ),
        DynamoValue::Ss(_) | DynamoValue::Ns(_) | DynamoValue::Bs(_) => {
            return Err(StorageError::serialization(format!(
                "attribute '{name}' is a set, which has no item representation"
            )));
        },
        _ => {
            return Err(StorageError::serialization(format!(
                "attribute '{name}' has an unrecognised type"
            )));
        },
    })
}

pub(crate) fn item_to_dynamo(item: Item) -> DynamoItem {
    item.into_iter().map(|(name, value)| (name, to_dynamo(value))).collect()
}

pub(crate) fn item_from_dynamo(item: DynamoItem) -> StorageResult<Item> {
    item.into_iter()
        .map(|(name, value)| {
            let value = from_dynamo(&name, value)?;
            Ok((name, value))
        })
        .collect()
}

pub(crate) fn key_to_dynamo(key: &PrimaryKey) -> DynamoItem {
    HashMap::from([(key.attribute.clone(), DynamoValue::S(key.value.clone()))])
}

/// Builds a `ProjectionExpression` and its name placeholders.
///
/// Names go through `#pN` placeholders so reserved words (`token`, `name`)
/// and arbitrary characters are accepted. An empty projection still has to
/// name something, so it projects the key attribute, which the caller then
/// strips.
pub(crate) fn projection_expression(
    names: &[&str],
    key_attribute: &str,
) -> (String, HashMap<String, String>) {
    let names: Vec<&str> = if names.is_empty() { vec![key_attribute] } else { names.to_vec() };
    let placeholders: HashMap<String, String> = names
        .iter()
        .enumerate()
        .map(|(i, name)| (format!("#p{i}"), (*name).to_owned()))
        .collect();
    let expression = (0..names.len()).map(|i| format!("#p{i}")).collect::<Vec<_>>().join(", ");
    (expression, placeholders)
}
