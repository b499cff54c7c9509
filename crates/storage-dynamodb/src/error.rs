//! Mapping from DynamoDB SDK errors to [`StorageError`].
//!
//! Service errors are classified by their error code, which is shared by
//! every operation, so one mapping serves the control and data planes.
//! Transport failures (dispatch, timeout, unreadable response) become
//! [`StorageError::Connection`] with the SDK error kept as the source.

use authkv_storage::{CollectionStatus, StorageError};
use aws_sdk_dynamodb::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};

/// Converts an SDK error raised for `collection` to a storage error.
///
/// `in_use` is the status reported if the table turns out to be busy; the
/// store refines it with a fresh describe where that is cheap.
pub(crate) fn sdk_error_to_storage_error<E, R>(
    err: SdkError<E, R>,
    collection: &str,
    in_use: CollectionStatus,
) -> StorageError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug + Send + Sync + 'static,
{
    if let SdkError::ServiceError(context) = &err {
        let service = context.err();
        return from_service_code(
            service.code().unwrap_or_default(),
            service.message().unwrap_or_default(),
            collection,
            in_use,
        );
    }

    let transport = matches!(
        err,
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) | SdkError::ResponseError(_)
    );
    if transport {
        tracing::warn!(collection, error = %DisplayErrorContext(&err), "DynamoDB request failed");
        return StorageError::connection_with_source(
            format!("DynamoDB request for {collection} failed"),
            err,
        );
    }

    tracing::error!(collection, error = %DisplayErrorContext(&err), "DynamoDB request not sent");
    StorageError::internal(format!(
        "DynamoDB request for {collection}: {}",
        DisplayErrorContext(&err)
    ))
}

/// Maps a DynamoDB service error code to a storage error.
pub(crate) fn from_service_code(
    code: &str,
    message: &str,
    collection: &str,
    in_use: CollectionStatus,
) -> StorageError {
    match code {
        "ResourceNotFoundException" => StorageError::collection_not_found(collection),
        "ResourceInUseException" => StorageError::collection_in_use(collection, in_use),
        "ProvisionedThroughputExceededException"
        | "ThrottlingException"
        | "RequestLimitExceeded"
        | "LimitExceededException" => StorageError::throttled(format!("{code}: {message}")),
        "ValidationException" => StorageError::validation(message),
        // Retryable on the service side.
        "InternalServerError" | "ServiceUnavailable" => {
            StorageError::connection(format!("{code}: {message}"))
        },
        "" => StorageError::internal(format!("unclassified DynamoDB error: {message}")),
        _ => StorageError::internal(format!("{code}: {message}")),
    }
}

#[cfg(test)]
mod tests {
    use aws_sdk_dynamodb::{config::http::HttpResponse, operation::get_item::GetItemError};

    use super::*;

    #[test]
    fn test_timeout_mapping_keeps_source() {
        let err: SdkError<GetItemError, HttpResponse> =
            SdkError::timeout_error("operation timed out");
        let mapped = sdk_error_to_storage_error(err, "access", CollectionStatus::Active);

        assert!(matches!(mapped, StorageError::Connection { source: Some(_), .. }), "{mapped:?}");
        assert!(mapped.is_transient());
        assert!(std::error::Error::source(&mapped).is_some());
    }

    #[test]
    fn test_construction_failure_mapping() {
        let err: SdkError<GetItemError, HttpResponse> =
            SdkError::construction_failure("table name is required");
        let mapped = sdk_error_to_storage_error(err, "access", CollectionStatus::Active);

        assert!(matches!(mapped, StorageError::Internal { .. }), "{mapped:?}");
        assert!(!mapped.is_transient());
    }

    #[test]
    fn test_resource_not_found_mapping() {
        let err = from_service_code(
            "ResourceNotFoundException",
            "Requested resource not found",
            "access",
            CollectionStatus::Active,
        );
        assert!(err.is_collection_not_found());
        assert_eq!(err.to_string(), "Collection not found: access");
    }

    #[test]
    fn test_resource_in_use_mapping() {
        let err = from_service_code(
            "ResourceInUseException",
            "Table already exists: access",
            "access",
            CollectionStatus::Creating,
        );
        assert!(matches!(
            err,
            StorageError::CollectionInUse { ref name, status: CollectionStatus::Creating }
                if name == "access"
        ));
    }

    #[test]
    fn test_throughput_exceeded_mapping() {
        for code in ["ProvisionedThroughputExceededException", "ThrottlingException"] {
            let err = from_service_code(code, "slow down", "refresh", CollectionStatus::Active);
            assert!(matches!(err, StorageError::Throttled { .. }), "{code}");
            assert!(err.is_transient());
        }
    }

    #[test]
    fn test_validation_mapping() {
        let err = from_service_code(
            "ValidationException",
            "One or more parameter values were invalid: Missing the key id in the item",
            "client",
            CollectionStatus::Active,
        );
        assert!(matches!(
            err,
            StorageError::Validation { ref message } if message.contains("key id")
        ));
    }

    #[test]
    fn test_server_error_mapping_is_transient() {
        let err =
            from_service_code("InternalServerError", "oops", "client", CollectionStatus::Active);
        assert!(matches!(err, StorageError::Connection { .. }));
        assert!(err.is_transient());
    }

    #[test]
    fn test_unknown_code_mapping() {
        let err = from_service_code(
            "AccessDeniedException",
            "not authorized",
            "client",
            CollectionStatus::Active,
        );
        assert!(matches!(err, StorageError::Internal { .. }));
        assert!(!err.is_transient());
        assert!(err.to_string().contains("AccessDeniedException"));
    }
}
