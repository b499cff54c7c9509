//! Mapping between OAuth records and store items.
//!
//! Every stored item has the shape `{<key attribute>: S, payload: S, ...}`
//! where `payload` holds the record as JSON. Extension attributes projected
//! from token user data sit next to the payload.

use authkv_storage::{AttributeValue, Item, PrimaryKey};
use serde::{Serialize, de::DeserializeOwned};

use crate::error::{EntityKind, OAuthResult, OAuthStorageError};

/// Name of the attribute holding the JSON-encoded record.
pub const PAYLOAD_ATTRIBUTE: &str = "payload";

/// Encodes a record as its JSON payload.
///
/// # Errors
///
/// Returns [`OAuthStorageError::Serialization`] if the record cannot be
/// encoded.
pub fn encode<T: Serialize>(entity: EntityKind, record: &T) -> OAuthResult<String> {
    serde_json::to_string(record).map_err(|e| OAuthStorageError::serialization(entity, e))
}

/// Decodes the JSON payload of a stored item.
///
/// # Errors
///
/// Returns [`OAuthStorageError::Serialization`] if the item has no string
/// payload or the payload does not decode as `T`.
pub fn decode<T: DeserializeOwned>(entity: EntityKind, item: &Item) -> OAuthResult<T> {
    let payload = item
        .get(PAYLOAD_ATTRIBUTE)
        .and_then(AttributeValue::as_s)
        .ok_or_else(|| OAuthStorageError::malformed(entity, "item has no string payload"))?;
    serde_json::from_str(payload).map_err(|e| OAuthStorageError::serialization(entity, e))
}

/// Assembles the item for a record.
///
/// Extension attributes never replace the key or the payload; colliding
/// names are dropped with a warning.
#[must_use]
pub fn build_item(key: &PrimaryKey, payload: String, extensions: Option<Item>) -> Item {
    let mut item = Item::new();
    for (name, value) in extensions.into_iter().flatten() {
        if name == key.attribute || name == PAYLOAD_ATTRIBUTE {
            tracing::warn!(attribute = %name, "dropping extension attribute that shadows a reserved attribute");
            continue;
        }
        item.insert(name, value);
    }
    let (key_name, key_value) = key.to_entry();
    item.insert(key_name, key_value);
    item.insert(PAYLOAD_ATTRIBUTE.to_owned(), AttributeValue::S(payload));
    item
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::Client;

    fn key() -> PrimaryKey {
        PrimaryKey::new("token", "9999")
    }

    #[test]
    fn build_item_keeps_reserved_attributes() {
        let extensions = Item::from([
            ("token".to_owned(), AttributeValue::string("forged")),
            ("payload".to_owned(), AttributeValue::string("forged")),
            ("tenant".to_owned(), AttributeValue::string("acme")),
        ]);
        let item = build_item(&key(), "{}".into(), Some(extensions));

        assert_eq!(item.get("token").and_then(AttributeValue::as_s), Some("9999"));
        assert_eq!(item.get("payload").and_then(AttributeValue::as_s), Some("{}"));
        assert_eq!(item.get("tenant").and_then(AttributeValue::as_s), Some("acme"));
        assert_eq!(item.len(), 3);
    }

    #[test]
    fn decode_reports_missing_payload() {
        let item = Item::from([key().to_entry()]);
        let err = decode::<Client>(EntityKind::Client, &item).unwrap_err();
        assert!(matches!(err, OAuthStorageError::Serialization { entity: EntityKind::Client, .. }));
    }

    #[test]
    fn decode_reports_corrupt_payload() {
        let item = build_item(&key(), "{not json".into(), None);
        let err = decode::<Client>(EntityKind::AccessToken, &item).unwrap_err();
        assert_eq!(err.entity(), Some(EntityKind::AccessToken));
    }

    #[test]
    fn encode_then_decode_client() {
        let client = Client::builder().id("1234").secret("aabbccdd").redirect_uri("x").build();
        let payload = encode(EntityKind::Client, &client).unwrap();
        let item = build_item(&PrimaryKey::new("id", "1234"), payload, None);
        assert_eq!(decode::<Client>(EntityKind::Client, &item).unwrap(), client);
    }
}
