//! Access and refresh token behaviour through the storage contract.

#![allow(clippy::expect_used, clippy::panic)]

use std::any::Any;

use authkv_oauth::{
    AccessToken, EntityKind, OAuthStorage, OAuthStorageError, ProjectAttributes, StorageConfig,
    UserData, UserDataFactory, UserDataRef, assert_expired, assert_not_found,
    testutil::{default_storage, provisioned_storage, sample_access, sample_client, seconds_ago},
};
use authkv_storage::{AttributeValue, Item, KeyValueStore, PrimaryKey, StorageError};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Session {
    tenant: String,
    roles: Vec<String>,
}

impl UserData for Session {
    fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    fn as_attributes(&self) -> Option<&dyn ProjectAttributes> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ProjectAttributes for Session {
    fn project_attributes(&self) -> Item {
        Item::from([
            ("tenant".to_owned(), AttributeValue::string(&self.tenant)),
            ("token".to_owned(), AttributeValue::string("shadowed")),
        ])
    }
}

fn session() -> Session {
    Session { tenant: "acme".into(), roles: vec!["admin".into()] }
}

#[tokio::test]
async fn save_access_mirrors_under_refresh_token() {
    let storage = default_storage().await;
    let token = sample_access(&sample_client());

    storage.save_access(&token).await.expect("save");

    let by_access = storage.load_access("9999").await.expect("load access");
    let by_refresh = storage.load_refresh("r9999").await.expect("load refresh");
    assert_eq!(by_access, token);
    assert_eq!(by_refresh, token);
}

#[tokio::test]
async fn token_without_refresh_is_not_mirrored() {
    let storage = default_storage().await;
    let client = sample_client();
    let no_refresh = AccessToken { refresh_token: None, ..sample_access(&client) };
    let empty_refresh = AccessToken {
        access_token: "8888".into(),
        refresh_token: Some(String::new()),
        ..sample_access(&client)
    };

    storage.save_access(&no_refresh).await.expect("save without refresh");
    storage.save_access(&empty_refresh).await.expect("save with empty refresh");

    storage.load_access("9999").await.expect("access stored");
    storage.load_access("8888").await.expect("access stored");
    assert_not_found!(storage.load_refresh("").await, EntityKind::RefreshToken);
    assert_not_found!(storage.load_refresh("r9999").await, EntityKind::RefreshToken);
}

#[tokio::test]
async fn removing_one_key_leaves_the_other() {
    let storage = default_storage().await;
    storage.save_access(&sample_access(&sample_client())).await.expect("save");

    storage.remove_access("9999").await.expect("remove access");
    assert_not_found!(storage.load_access("9999").await, EntityKind::AccessToken);
    storage.load_refresh("r9999").await.expect("mirror survives access removal");

    storage.save_access(&sample_access(&sample_client())).await.expect("save again");
    storage.remove_refresh("r9999").await.expect("remove refresh");
    assert_not_found!(storage.load_refresh("r9999").await, EntityKind::RefreshToken);
    storage.load_access("9999").await.expect("access survives refresh removal");
}

#[tokio::test]
async fn removes_of_unknown_tokens_succeed() {
    let storage = default_storage().await;
    storage.remove_access("nope").await.expect("remove unknown access");
    storage.remove_refresh("nope").await.expect("remove unknown refresh");
}

#[tokio::test]
async fn expired_token_is_reported_on_both_keys() {
    let storage = default_storage().await;
    let token = AccessToken {
        expires_in: 60,
        created_at: seconds_ago(61),
        ..sample_access(&sample_client())
    };
    storage.save_access(&token).await.expect("save");

    assert_expired!(storage.load_access("9999").await, EntityKind::AccessToken);
    assert_expired!(storage.load_refresh("r9999").await, EntityKind::RefreshToken);

    storage.remove_access("9999").await.expect("expired record is still removable");
}

#[tokio::test]
async fn save_refresh_without_refresh_token_is_rejected_by_store() {
    let storage = default_storage().await;
    let token = AccessToken { refresh_token: None, ..sample_access(&sample_client()) };

    let err = storage.save_refresh(&token).await.expect_err("empty key");
    assert!(matches!(err, OAuthStorageError::Store(StorageError::Validation { .. })), "{err:?}");
}

#[tokio::test]
async fn save_access_with_empty_token_is_rejected_by_store() {
    let storage = default_storage().await;
    let token = AccessToken { access_token: String::new(), ..sample_access(&sample_client()) };

    let err = storage.save_access(&token).await.expect_err("empty key");
    assert!(matches!(err, OAuthStorageError::Store(StorageError::Validation { .. })), "{err:?}");
    assert_not_found!(storage.load_refresh("r9999").await, EntityKind::RefreshToken);
}

#[tokio::test]
async fn embedded_authorization_and_previous_round_trip() {
    let storage = default_storage().await;
    let client = sample_client();
    let previous = sample_access(&client);
    let token = AccessToken {
        access_token: "2".into(),
        refresh_token: Some("r2".into()),
        previous: Some(Box::new(previous.clone())),
        ..sample_access(&client)
    };

    storage.save_access(&token).await.expect("save");
    let loaded = storage.load_refresh("r2").await.expect("load");
    assert_eq!(loaded.previous.as_deref(), Some(&previous));
}

#[tokio::test]
async fn user_data_without_factory_loads_as_raw_json() {
    let storage = default_storage().await;
    let token = AccessToken {
        user_data: Some(UserDataRef::new(session())),
        ..sample_access(&sample_client())
    };
    storage.save_access(&token).await.expect("save");

    let loaded = storage.load_access("9999").await.expect("load");
    let data = loaded.user_data.expect("user data present");
    assert_eq!(data.as_raw(), Some(&json!({"tenant": "acme", "roles": ["admin"]})));
    assert!(data.downcast_ref::<Session>().is_none());
}

#[tokio::test]
async fn null_user_data_round_trips() {
    let storage = default_storage().await;
    let token = AccessToken {
        user_data: Some(UserDataRef::new(Value::Null)),
        ..sample_access(&sample_client())
    };
    storage.save_access(&token).await.expect("save");

    assert_eq!(storage.load_access("9999").await.expect("load access"), token);
    assert_eq!(storage.load_refresh("r9999").await.expect("load refresh"), token);

    let loaded = storage.load_access("9999").await.expect("load access");
    assert_eq!(loaded.user_data.as_ref().and_then(UserDataRef::as_raw), Some(&Value::Null));
}

#[tokio::test]
async fn factory_rebuilds_user_data_on_both_loads() {
    let config = StorageConfig::builder()
        .prefix("factory_")
        .user_data_factory(UserDataFactory::of::<Session>())
        .build()
        .expect("config");
    let (storage, _) = provisioned_storage(config).await;
    let token = AccessToken {
        user_data: Some(UserDataRef::new(session())),
        ..sample_access(&sample_client())
    };
    storage.save_access(&token).await.expect("save");

    for loaded in [
        storage.load_access("9999").await.expect("load access"),
        storage.load_refresh("r9999").await.expect("load refresh"),
    ] {
        let data = loaded.user_data.expect("user data present");
        assert_eq!(data.downcast_ref::<Session>(), Some(&session()));
    }
}

#[tokio::test]
async fn factory_mismatch_is_a_serialization_error() {
    let config = StorageConfig::with_prefix("mismatch_")
        .expect("config")
        .with_user_data_factory(UserDataFactory::of::<Session>());
    let (storage, _) = provisioned_storage(config).await;
    let token = AccessToken {
        user_data: Some(UserDataRef::new(json!({"unexpected": true}))),
        ..sample_access(&sample_client())
    };
    storage.save_access(&token).await.expect("save");

    let err = storage.load_access("9999").await.expect_err("mismatched user data");
    assert!(matches!(
        err,
        OAuthStorageError::Serialization { entity: EntityKind::AccessToken, .. }
    ));
}

#[tokio::test]
async fn projected_attributes_are_stored_on_both_items() {
    let config = StorageConfig::with_prefix("projected_").expect("config");
    let (storage, store) = provisioned_storage(config).await;
    let token = AccessToken {
        user_data: Some(UserDataRef::new(session())),
        ..sample_access(&sample_client())
    };
    storage.save_access(&token).await.expect("save");

    for (collection, key) in [("projected_access", "9999"), ("projected_refresh", "r9999")] {
        let item = store
            .get_item(collection, &PrimaryKey::new("token", key), None)
            .await
            .expect("get")
            .expect("item stored");
        assert_eq!(item.get("tenant").and_then(AttributeValue::as_s), Some("acme"));
        assert_eq!(
            item.get("token").and_then(AttributeValue::as_s),
            Some(key),
            "projection must not replace the key"
        );
        assert!(item.get("payload").and_then(AttributeValue::as_s).is_some());
    }
}
