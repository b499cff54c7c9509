//! DynamoDB-backed key-value store.
//!
//! Each collection is one DynamoDB table with a single string hash key.
//! Tables are provisioned with fixed read/write capacity taken from the
//! [`CollectionSpec`].

use std::sync::Arc;

use async_trait::async_trait;
use authkv_storage::{
    CollectionDescription, CollectionSpec, CollectionStatus, ConfigError, Item, KeyValueStore,
    PrimaryKey, StorageError, StorageResult,
};
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::{
    Client,
    config::Credentials,
    error::BuildError,
    types::{
        AttributeDefinition, KeySchemaElement, KeyType, ProvisionedThroughput,
        ScalarAttributeType, TableDescription, TableStatus,
    },
};
use aws_types::region::Region;

use crate::{
    config::DynamoConfig,
    convert::{item_from_dynamo, item_to_dynamo, key_to_dynamo, projection_expression},
    error::sdk_error_to_storage_error,
};

/// Provider name reported for [`StaticCredentials`](crate::StaticCredentials).
const CREDENTIALS_PROVIDER: &str = "authkv-static";

/// DynamoDB implementation of [`KeyValueStore`].
///
/// Collection names are mapped to table names by prepending the configured
/// prefix; descriptions report the unprefixed collection name.
///
/// # Cloning
///
/// Clones share the underlying SDK client.
///
/// # Example
///
/// ```no_run
/// // Requires a reachable DynamoDB endpoint.
/// use authkv_storage::{CollectionSpec, KeyValueStore};
/// use authkv_storage_dynamodb::{DynamoConfig, DynamoStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = DynamoConfig::builder().region("us-east-1").table_prefix("oauth.").build()?;
/// let store = DynamoStore::new(config).await?;
///
/// let spec = CollectionSpec::builder().name("client").key_attribute("id").build();
/// store.create_collection(&spec).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct DynamoStore {
    client: Arc<Client>,
    table_prefix: Arc<str>,
    consistent_read: bool,
}

impl std::fmt::Debug for DynamoStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamoStore")
            .field("table_prefix", &self.table_prefix)
            .field("consistent_read", &self.consistent_read)
            .finish_non_exhaustive()
    }
}

impl DynamoStore {
    /// Builds an SDK client from `config` and wraps it.
    ///
    /// Without static credentials the default AWS provider chain is used
    /// (environment, profile, instance metadata). No request is sent here.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `config` does not validate, which can
    /// only happen for configurations deserialized without validation.
    pub async fn new(config: DynamoConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region().to_owned()));
        if let Some(credentials) = config.credentials() {
            loader = loader.credentials_provider(Credentials::new(
                credentials.access_key_id.as_str(),
                credentials.secret_access_key.as_str(),
                credentials.session_token.as_ref().map(|token| token.as_str().to_owned()),
                None,
                CREDENTIALS_PROVIDER,
            ));
        }
        let sdk_config = loader.load().await;

        let mut builder = aws_sdk_dynamodb::config::Builder::from(&sdk_config);
        if let Some(endpoint_url) = config.endpoint_url() {
            builder = builder.endpoint_url(endpoint_url);
        }
        let client = Client::from_conf(builder.build());

        tracing::debug!(
            region = config.region(),
            endpoint = config.endpoint_url(),
            table_prefix = config.table_prefix(),
            "DynamoDB store configured"
        );
        Ok(Self::from_client(Arc::new(client), config.table_prefix(), config.consistent_read()))
    }

    /// Wraps an existing SDK client.
    ///
    /// The prefix is used as given; validate it with [`DynamoConfig`] first
    /// if it comes from user input.
    #[must_use]
    pub fn from_client(client: Arc<Client>, table_prefix: &str, consistent_read: bool) -> Self {
        Self { client, table_prefix: Arc::from(table_prefix), consistent_read }
    }

    /// Returns the underlying SDK client.
    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Returns a shared handle to the underlying SDK client.
    #[must_use]
    pub fn client_arc(&self) -> Arc<Client> {
        Arc::clone(&self.client)
    }

    /// Returns the table prefix.
    #[must_use]
    pub fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    fn table(&self, collection: &str) -> String {
        format!("{}{collection}", self.table_prefix)
    }

    /// Replaces the status guessed for a `CollectionInUse` error with the
    /// one the table reports now.
    async fn refine_in_use(&self, collection: &str, err: StorageError) -> StorageError {
        if !err.is_collection_in_use() {
            return err;
        }
        match self.describe_collection(collection).await {
            Ok(description) => StorageError::collection_in_use(collection, description.status),
            Err(_) => err,
        }
    }
}

fn build_error(err: BuildError) -> StorageError {
    StorageError::validation(err.to_string())
}

fn capacity(field: &str, units: u64) -> StorageResult<i64> {
    i64::try_from(units)
        .map_err(|_| StorageError::validation(format!("{field} of {units} is out of range")))
}

/// Maps a table status to a collection status.
///
/// `UPDATING` tables still serve reads and writes, so they count as active.
/// Archived or inaccessible tables have no collection counterpart.
fn collection_status(
    collection: &str,
    status: Option<&TableStatus>,
) -> StorageResult<CollectionStatus> {
    match status {
        Some(TableStatus::Creating) => Ok(CollectionStatus::Creating),
        Some(TableStatus::Active | TableStatus::Updating) => Ok(CollectionStatus::Active),
        Some(TableStatus::Deleting) => Ok(CollectionStatus::Deleting),
        Some(other) => Err(StorageError::internal(format!(
            "table for {collection} is {}",
            other.as_str()
        ))),
        None => Err(StorageError::internal(format!("table for {collection} reported no status"))),
    }
}

fn describe_table(
    collection: &str,
    table: &TableDescription,
) -> StorageResult<CollectionDescription> {
    let status = collection_status(collection, table.table_status())?;
    let key_attribute = table
        .key_schema()
        .iter()
        .find(|element| *element.key_type() == KeyType::Hash)
        .map(|element| element.attribute_name().to_owned())
        .ok_or_else(|| {
            StorageError::internal(format!("table for {collection} has no hash key"))
        })?;
    let item_count = table.item_count().map_or(0, |count| usize::try_from(count).unwrap_or(0));

    Ok(CollectionDescription { name: collection.to_owned(), key_attribute, status, item_count })
}

#[async_trait]
impl KeyValueStore for DynamoStore {
    #[tracing::instrument(skip_all, fields(collection = %spec.name))]
    async fn create_collection(&self, spec: &CollectionSpec) -> StorageResult<()> {
        if spec.key_attribute.is_empty() {
            return Err(StorageError::validation("key attribute name must not be empty"));
        }

        let attribute = AttributeDefinition::builder()
            .attribute_name(&spec.key_attribute)
            .attribute_type(ScalarAttributeType::S)
            .build()
            .map_err(build_error)?;
        let key = KeySchemaElement::builder()
            .attribute_name(&spec.key_attribute)
            .key_type(KeyType::Hash)
            .build()
            .map_err(build_error)?;
        let throughput = ProvisionedThroughput::builder()
            .read_capacity_units(capacity(
                "read_capacity_units",
                spec.throughput.read_capacity_units,
            )?)
            .write_capacity_units(capacity(
                "write_capacity_units",
                spec.throughput.write_capacity_units,
            )?)
            .build()
            .map_err(build_error)?;

        let result = self
            .client
            .create_table()
            .table_name(self.table(&spec.name))
            .attribute_definitions(attribute)
            .key_schema(key)
            .provisioned_throughput(throughput)
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) => {
                let err = sdk_error_to_storage_error(err, &spec.name, CollectionStatus::Active);
                Err(self.refine_in_use(&spec.name, err).await)
            },
        }
    }

    #[tracing::instrument(skip_all, fields(collection = %name))]
    async fn describe_collection(&self, name: &str) -> StorageResult<CollectionDescription> {
        let output = self
            .client
            .describe_table()
            .table_name(self.table(name))
            .send()
            .await
            .map_err(|err| sdk_error_to_storage_error(err, name, CollectionStatus::Active))?;

        let table = output.table().ok_or_else(|| {
            StorageError::internal(format!("DescribeTable for {name} returned no table"))
        })?;
        describe_table(name, table)
    }

    #[tracing::instrument(skip_all, fields(collection = %name))]
    async fn delete_collection(&self, name: &str) -> StorageResult<()> {
        let result = self.client.delete_table().table_name(self.table(name)).send().await;

        match result {
            Ok(_) => Ok(()),
            Err(err) => {
                let err = sdk_error_to_storage_error(err, name, CollectionStatus::Creating);
                Err(self.refine_in_use(name, err).await)
            },
        }
    }

    #[tracing::instrument(skip_all, fields(collection = %collection))]
    async fn put_item(&self, collection: &str, item: Item) -> StorageResult<()> {
        self.client
            .put_item()
            .table_name(self.table(collection))
            .set_item(Some(item_to_dynamo(item)))
            .send()
            .await
            .map_err(|err| sdk_error_to_storage_error(err, collection, CollectionStatus::Active))?;
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(collection = %collection))]
    async fn get_item(
        &self,
        collection: &str,
        key: &PrimaryKey,
        projection: Option<&[&str]>,
    ) -> StorageResult<Option<Item>> {
        let mut request = self
            .client
            .get_item()
            .table_name(self.table(collection))
            .set_key(Some(key_to_dynamo(key)))
            .consistent_read(self.consistent_read);
        if let Some(names) = projection {
            let (expression, placeholders) = projection_expression(names, &key.attribute);
            request = request
                .projection_expression(expression)
                .set_expression_attribute_names(Some(placeholders));
        }

        let output = request
            .send()
            .await
            .map_err(|err| sdk_error_to_storage_error(err, collection, CollectionStatus::Active))?;

        let Some(item) = output.item().cloned() else {
            return Ok(None);
        };
        let mut item = item_from_dynamo(item)?;
        if projection.is_some_and(|names| names.is_empty()) {
            item.remove(&key.attribute);
        }
        Ok(Some(item))
    }

    #[tracing::instrument(skip_all, fields(collection = %collection))]
    async fn delete_item(&self, collection: &str, key: &PrimaryKey) -> StorageResult<()> {
        self.client
            .delete_item()
            .table_name(self.table(collection))
            .set_key(Some(key_to_dynamo(key)))
            .send()
            .await
            .map_err(|err| sdk_error_to_storage_error(err, collection, CollectionStatus::Active))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn table(status: TableStatus, hash_key: &str) -> TableDescription {
        TableDescription::builder()
            .table_name(format!("oauth.{hash_key}"))
            .table_status(status)
            .key_schema(
                KeySchemaElement::builder()
                    .attribute_name(hash_key)
                    .key_type(KeyType::Hash)
                    .build()
                    .unwrap(),
            )
            .item_count(3)
            .build()
    }

    #[test]
    fn table_statuses_map_to_collection_statuses() {
        let cases = [
            (TableStatus::Creating, CollectionStatus::Creating),
            (TableStatus::Active, CollectionStatus::Active),
            (TableStatus::Updating, CollectionStatus::Active),
            (TableStatus::Deleting, CollectionStatus::Deleting),
        ];
        for (table_status, expected) in cases {
            assert_eq!(collection_status("client", Some(&table_status)).unwrap(), expected);
        }
    }

    #[test]
    fn archived_table_is_an_internal_error() {
        let err = collection_status("client", Some(&TableStatus::Archived)).unwrap_err();
        assert!(matches!(err, StorageError::Internal { .. }), "{err:?}");
        assert!(collection_status("client", None).is_err());
    }

    #[test]
    fn description_reports_logical_name_and_hash_key() {
        let description = describe_table("access", &table(TableStatus::Active, "token")).unwrap();
        assert_eq!(
            description,
            CollectionDescription {
                name: "access".into(),
                key_attribute: "token".into(),
                status: CollectionStatus::Active,
                item_count: 3,
            }
        );
    }

    #[test]
    fn description_without_hash_key_is_rejected() {
        let table = TableDescription::builder().table_status(TableStatus::Active).build();
        assert!(describe_table("access", &table).is_err());
    }

    #[test]
    fn capacity_must_fit_the_wire_type() {
        assert_eq!(capacity("read_capacity_units", 5).unwrap(), 5);
        let err = capacity("read_capacity_units", u64::MAX).unwrap_err();
        assert!(matches!(err, StorageError::Validation { .. }));
    }

    #[tokio::test]
    async fn store_maps_collection_names_to_prefixed_tables() {
        let config = DynamoConfig::builder()
            .region("us-east-1")
            .endpoint_url("http://localhost:8000")
            .credentials(crate::StaticCredentials::new("local", "local"))
            .table_prefix("test.")
            .build()
            .unwrap();
        let store = DynamoStore::new(config).await.unwrap();

        assert_eq!(store.table("refresh"), "test.refresh");
        assert_eq!(store.table_prefix(), "test.");
        assert!(format!("{store:?}").contains("test."));
    }
}
