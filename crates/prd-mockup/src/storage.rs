//! The `MockupStorage` port (§6) fronting whatever object store holds the
//! raw mockup image bytes. `prd-mockup` never reasons about buckets or
//! signed-URL mechanics beyond what this trait exposes.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::error::{MockupError, MockupResult};

/// Default signed-URL lifetime handed to vision providers (§4.4 b).
pub const SIGNED_URL_TTL_SECONDS: u64 = 3600;

/// Persistence for raw mockup bytes, independent of the `MockupUpload`
/// metadata record that `prd-store` owns.
#[async_trait]
pub trait MockupStorage: Send + Sync {
    /// Store `bytes` under `storage_path` in `bucket`, returning nothing on
    /// success; the caller already minted `storage_path`/`bucket` via
    /// [`prd_store::models::MockupUpload::new`].
    async fn upload(&self, bucket: &str, storage_path: &str, bytes: Vec<u8>) -> MockupResult<()>;

    /// Mint a time-limited URL a vision provider can fetch the image from.
    async fn signed_url(
        &self,
        bucket: &str,
        storage_path: &str,
        ttl_seconds: u64,
    ) -> MockupResult<String>;

    async fn download(&self, bucket: &str, storage_path: &str) -> MockupResult<Vec<u8>>;

    async fn delete(&self, bucket: &str, storage_path: &str) -> MockupResult<()>;

    async fn exists(&self, bucket: &str, storage_path: &str) -> MockupResult<bool>;

    /// Remove every object belonging to a request (§3 retention / request
    /// deletion cascade), returning the count removed.
    async fn delete_all_for_request(
        &self,
        request_id: Uuid,
        paths: &[(String, String)],
    ) -> MockupResult<u64>;
}

/// In-memory [`MockupStorage`] double keyed by `(bucket, storage_path)`.
#[derive(Default)]
pub struct MockMockupStorage {
    objects: Mutex<HashMap<(String, String), Vec<u8>>>,
}

impl MockMockupStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn key(bucket: &str, storage_path: &str) -> (String, String) {
        (bucket.to_string(), storage_path.to_string())
    }
}

#[async_trait]
impl MockupStorage for MockMockupStorage {
    async fn upload(&self, bucket: &str, storage_path: &str, bytes: Vec<u8>) -> MockupResult<()> {
        self.objects
            .lock()
            .expect("mock storage mutex poisoned")
            .insert(Self::key(bucket, storage_path), bytes);
        Ok(())
    }

    async fn signed_url(
        &self,
        bucket: &str,
        storage_path: &str,
        ttl_seconds: u64,
    ) -> MockupResult<String> {
        if !self.exists(bucket, storage_path).await? {
            return Err(MockupError::Storage(format!(
                "no such object: {bucket}/{storage_path}"
            )));
        }
        Ok(format!("https://mock-storage.local/{bucket}/{storage_path}?ttl={ttl_seconds}"))
    }

    async fn download(&self, bucket: &str, storage_path: &str) -> MockupResult<Vec<u8>> {
        self.objects
            .lock()
            .expect("mock storage mutex poisoned")
            .get(&Self::key(bucket, storage_path))
            .cloned()
            .ok_or_else(|| MockupError::Storage(format!("no such object: {bucket}/{storage_path}")))
    }

    async fn delete(&self, bucket: &str, storage_path: &str) -> MockupResult<()> {
        self.objects
            .lock()
            .expect("mock storage mutex poisoned")
            .remove(&Self::key(bucket, storage_path));
        Ok(())
    }

    async fn exists(&self, bucket: &str, storage_path: &str) -> MockupResult<bool> {
        Ok(self
            .objects
            .lock()
            .expect("mock storage mutex poisoned")
            .contains_key(&Self::key(bucket, storage_path)))
    }

    async fn delete_all_for_request(
        &self,
        _request_id: Uuid,
        paths: &[(String, String)],
    ) -> MockupResult<u64> {
        let mut objects = self.objects.lock().expect("mock storage mutex poisoned");
        let mut removed = 0u64;
        for (bucket, storage_path) in paths {
            if objects.remove(&Self::key(bucket, storage_path)).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn roundtrips_an_object() {
        let storage = MockMockupStorage::new();
        storage.upload("b", "p/1.png", vec![1, 2, 3]).await.unwrap();
        assert!(storage.exists("b", "p/1.png").await.unwrap());
        assert_eq!(storage.download("b", "p/1.png").await.unwrap(), vec![1, 2, 3]);
        let url = storage.signed_url("b", "p/1.png", SIGNED_URL_TTL_SECONDS).await.unwrap();
        assert!(url.contains("p/1.png"));
    }

    #[tokio::test]
    async fn missing_object_is_not_found() {
        let storage = MockMockupStorage::new();
        assert!(storage.download("b", "missing").await.is_err());
        assert!(storage.signed_url("b", "missing", 60).await.is_err());
    }

    #[tokio::test]
    async fn delete_all_for_request_removes_listed_paths() {
        let storage = MockMockupStorage::new();
        storage.upload("b", "p/1.png", vec![1]).await.unwrap();
        storage.upload("b", "p/2.png", vec![2]).await.unwrap();
        let removed = storage
            .delete_all_for_request(
                Uuid::new_v4(),
                &[("b".into(), "p/1.png".into()), ("b".into(), "p/2.png".into())],
            )
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert!(!storage.exists("b", "p/1.png").await.unwrap());
    }
}
