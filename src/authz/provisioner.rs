use crate::errors::AppError;
use crate::storage::StorageService;

/// Idempotently ensure the per-identity namespace exists: look for any key
/// under `{account_id}/`, and write the zero-byte marker object if none is
/// found.
///
/// Check-then-put is not atomic against concurrent first logins for the
/// same identity; that race is tolerated because the marker put is
/// idempotent at the key level.
pub async fn ensure_namespace(
    storage: &dyn StorageService,
    bucket: &str,
    account_id: &str,
) -> Result<(), AppError> {
    let marker_key = format!("{account_id}/");
    let existing = storage.count_keys_with_prefix(bucket, &marker_key, 1).await?;
    if existing == 0 {
        tracing::debug!(account_id, "creating namespace marker");
        storage.put_empty_object(bucket, &marker_key).await?;
    }
    Ok(())
}
