use crate::domain::model::File;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::pin::Pin;
use tokio::io::AsyncRead;

/// Byte stream of an object body. Reads may return fewer bytes than requested.
pub type ObjectBody = Pin<Box<dyn AsyncRead + Send>>;

/// One page of a prefix listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    pub keys: Vec<String>,
    pub continuation_token: Option<String>,
}

/// Remote object-store primitives, keyed by full (root-qualified) keys.
///
/// Implementations must report a missing key on `get_object` as
/// `StoreError::NotFound` and every other remote failure as
/// `StoreError::StorageFailure`. Deleting a missing key is not an error.
#[async_trait]
pub trait ObjectStoreClient: Send + Sync {
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()>;

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectBody>;

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()>;

    async fn delete_objects(&self, bucket: &str, keys: Vec<String>) -> Result<()>;

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<String>,
    ) -> Result<ListPage>;
}

/// Path-based file operations exposed to callers.
#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn store(&self, file: &File) -> Result<()> {
        self.store_bytes(file.path(), file.content()).await
    }

    async fn store_str(&self, path: &str, content: &str) -> Result<()> {
        self.store_bytes(path, content.as_bytes()).await
    }

    async fn store_bytes(&self, path: &str, content: &[u8]) -> Result<()>;

    async fn delete(&self, path: &str) -> Result<()>;

    async fn delete_many(&self, paths: &[String]) -> Result<()>;

    async fn get(&self, path: &str) -> Result<File>;

    async fn get_multiple(&self, path_prefix: &str, limit: usize) -> Result<Vec<File>>;
}

#[async_trait]
impl<T: ObjectStoreClient + ?Sized> ObjectStoreClient for std::sync::Arc<T> {
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        (**self).put_object(bucket, key, body).await
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectBody> {
        (**self).get_object(bucket, key).await
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        (**self).delete_object(bucket, key).await
    }

    async fn delete_objects(&self, bucket: &str, keys: Vec<String>) -> Result<()> {
        (**self).delete_objects(bucket, keys).await
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<String>,
    ) -> Result<ListPage> {
        (**self).list_objects(bucket, prefix, continuation_token).await
    }
}

#[async_trait]
impl<T: FileStorage + ?Sized> FileStorage for std::sync::Arc<T> {
    async fn store(&self, file: &File) -> Result<()> {
        (**self).store(file).await
    }

    async fn store_str(&self, path: &str, content: &str) -> Result<()> {
        (**self).store_str(path, content).await
    }

    async fn store_bytes(&self, path: &str, content: &[u8]) -> Result<()> {
        (**self).store_bytes(path, content).await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        (**self).delete(path).await
    }

    async fn delete_many(&self, paths: &[String]) -> Result<()> {
        (**self).delete_many(paths).await
    }

    async fn get(&self, path: &str) -> Result<File> {
        (**self).get(path).await
    }

    async fn get_multiple(&self, path_prefix: &str, limit: usize) -> Result<Vec<File>> {
        (**self).get_multiple(path_prefix, limit).await
    }
}
