//! Application data attached to access tokens.
//!
//! An embedding server can hang arbitrary data off a token through
//! [`UserData`]. The data travels inside the token payload as JSON. Two
//! optional hooks extend that:
//!
//! - A [`UserData`] value that also implements [`ProjectAttributes`] (exposed through
//!   [`UserData::as_attributes`]) contributes extra top-level attributes to the stored token items,
//!   which lets operators inspect or filter tokens without decoding payloads.
//! - A [`UserDataFactory`] supplied through [`StorageConfig`](crate::StorageConfig) turns the raw
//!   JSON read back from the store into the server's concrete type.
//!
//! Without a factory, loaded tokens carry the raw [`serde_json::Value`].

use std::{any::Any, fmt, sync::Arc};

use authkv_storage::Item;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de::DeserializeOwned};
use serde_json::Value;

/// Application data stored with a token.
///
/// # Example
///
/// ```
/// use std::any::Any;
/// use authkv_oauth::user_data::UserData;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Session {
///     tenant: String,
/// }
///
/// impl UserData for Session {
///     fn to_value(&self) -> serde_json::Result<serde_json::Value> {
///         serde_json::to_value(self)
///     }
///
///     fn as_any(&self) -> &dyn Any {
///         self
///     }
/// }
/// ```
pub trait UserData: Send + Sync + 'static {
    /// Converts the data to the JSON stored in the token payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the data cannot be represented as JSON.
    fn to_value(&self) -> serde_json::Result<Value>;

    /// Returns the attribute projection of this data, if it has one.
    fn as_attributes(&self) -> Option<&dyn ProjectAttributes> {
        None
    }

    /// Returns `self` for downcasting.
    fn as_any(&self) -> &dyn Any;
}

/// User data that contributes extra attributes to stored token items.
///
/// Attributes named like the item's key or payload attribute are dropped.
pub trait ProjectAttributes {
    /// Returns the attributes to store next to the token payload.
    fn project_attributes(&self) -> Item;
}

impl UserData for Value {
    fn to_value(&self) -> serde_json::Result<Value> {
        Ok(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Shared handle to the user data carried by a token.
///
/// Serializes through [`UserData::to_value`] and deserializes into a raw
/// [`serde_json::Value`]. Two handles are equal when their JSON forms are.
#[derive(Clone)]
pub struct UserDataRef(Arc<dyn UserData>);

impl UserDataRef {
    /// Wraps a user data value.
    #[must_use]
    pub fn new(data: impl UserData) -> Self {
        Self(Arc::new(data))
    }

    /// Wraps an already shared user data value.
    #[must_use]
    pub fn from_arc(data: Arc<dyn UserData>) -> Self {
        Self(data)
    }

    /// Returns the JSON form of the data.
    ///
    /// # Errors
    ///
    /// Returns an error if the data cannot be represented as JSON.
    pub fn to_value(&self) -> serde_json::Result<Value> {
        self.0.to_value()
    }

    /// Returns the attribute projection of the data, if it has one.
    #[must_use]
    pub fn as_attributes(&self) -> Option<&dyn ProjectAttributes> {
        self.0.as_attributes()
    }

    /// Returns the data as `T` if that is its concrete type.
    #[must_use]
    pub fn downcast_ref<T: UserData>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    /// Returns the raw JSON if no factory has reconstructed the data.
    #[must_use]
    pub fn as_raw(&self) -> Option<&Value> {
        self.downcast_ref::<Value>()
    }
}

impl fmt::Debug for UserDataRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.to_value() {
            Ok(value) => f.debug_tuple("UserDataRef").field(&value).finish(),
            Err(_) => f.write_str("UserDataRef(<unrepresentable>)"),
        }
    }
}

/// Compares the JSON forms of both handles.
///
/// A handle whose data fails [`UserData::to_value`] compares unequal to
/// every handle, itself included, so this relation is not reflexive and
/// `Eq` is not implemented.
impl PartialEq for UserDataRef {
    fn eq(&self, other: &Self) -> bool {
        match (self.to_value(), other.to_value()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

impl Serialize for UserDataRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().map_err(serde::ser::Error::custom)?.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for UserDataRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::new)
    }
}

type Reconstruct = dyn Fn(Value) -> serde_json::Result<UserDataRef> + Send + Sync;

/// Rebuilds concrete user data from the raw JSON read back from the store.
#[derive(Clone)]
pub struct UserDataFactory(Arc<Reconstruct>);

impl UserDataFactory {
    /// Creates a factory from a reconstruction function.
    #[must_use]
    pub fn new(
        reconstruct: impl Fn(Value) -> serde_json::Result<UserDataRef> + Send + Sync + 'static,
    ) -> Self {
        Self(Arc::new(reconstruct))
    }

    /// Creates a factory that deserializes the raw JSON into `T`.
    #[must_use]
    pub fn of<T: UserData + DeserializeOwned>() -> Self {
        Self::new(|value| serde_json::from_value::<T>(value).map(UserDataRef::new))
    }

    /// Rebuilds `raw` into the configured type.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not match the configured type.
    pub fn reconstruct(&self, raw: &UserDataRef) -> serde_json::Result<UserDataRef> {
        (self.0)(raw.to_value()?)
    }
}

impl fmt::Debug for UserDataFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UserDataFactory(..)")
    }
}
