//! Object-storage capability.

mod s3;
mod sigv4;

pub use s3::S3Storage;

use async_trait::async_trait;

use crate::errors::AppError;

#[async_trait]
pub trait StorageService: Send + Sync {
    /// Number of keys under `prefix`, capped at `max_keys`. Checking
    /// existence must not itself create state.
    async fn count_keys_with_prefix(
        &self,
        bucket: &str,
        prefix: &str,
        max_keys: u32,
    ) -> Result<u64, AppError>;

    /// Write a zero-byte object at `key`. Overwriting an existing marker is
    /// harmless: same key, same empty content.
    async fn put_empty_object(&self, bucket: &str, key: &str) -> Result<(), AppError>;
}
