use crate::domain::model::File;
use crate::domain::ports::{FileStorage, ObjectBody, ObjectStoreClient};
use crate::utils::error::{Result, StoreError};
use crate::utils::validation::validate_logical_path;
use async_trait::async_trait;
use tokio::io::AsyncReadExt;

const READ_BUFFER_SIZE: usize = 1024;

/// Root prefix scoping every key of one storage instance.
///
/// Qualifying is plain string concatenation, not a path join, so
/// `strip(&qualify(p)) == Some(p)` for every logical path `p`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreRoot(String);

impl StoreRoot {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self(prefix.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn qualify(&self, path: &str) -> String {
        format!("{}{}", self.0, path)
    }

    /// Removes exactly the root from a full key. `None` if the key lies outside the root.
    pub fn strip<'a>(&self, key: &'a str) -> Option<&'a str> {
        key.strip_prefix(self.0.as_str())
    }
}

/// File storage over a remote object store, scoped to `bucket` and a root prefix.
///
/// Holds no mutable state; share it behind an `Arc` across tasks.
pub struct ObjectFileStorage<C: ObjectStoreClient> {
    client: C,
    bucket: String,
    root: StoreRoot,
}

impl<C: ObjectStoreClient> ObjectFileStorage<C> {
    pub fn new(client: C, bucket: impl Into<String>, root_prefix: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            root: StoreRoot::new(root_prefix),
        }
    }

    /// Lists logical paths under `path_prefix`, following continuation tokens to the end.
    /// Order is the store's listing order.
    pub async fn list(&self, path_prefix: &str) -> Result<Vec<String>> {
        let prefix = self.root.qualify(path_prefix);
        let mut paths = Vec::new();
        let mut continuation_token = None;
        let mut pages = 0usize;

        loop {
            let page = self
                .client
                .list_objects(&self.bucket, &prefix, continuation_token.take())
                .await?;
            pages += 1;

            for key in page.keys {
                match self.root.strip(&key) {
                    Some(path) => paths.push(path.to_string()),
                    None => {
                        return Err(StoreError::ForeignKey {
                            key,
                            root: self.root.as_str().to_string(),
                        })
                    }
                }
            }

            match page.continuation_token {
                Some(token) => continuation_token = Some(token),
                None => break,
            }
        }

        tracing::debug!(
            bucket = %self.bucket,
            prefix = %prefix,
            pages,
            count = paths.len(),
            "Listed objects"
        );
        Ok(paths)
    }
}

/// Reads `body` to the end, concatenating short reads.
pub async fn drain_body(path: &str, mut body: ObjectBody) -> Result<Vec<u8>> {
    let mut content = Vec::new();
    let mut buffer = [0u8; READ_BUFFER_SIZE];

    loop {
        let length = body
            .read(&mut buffer)
            .await
            .map_err(|source| StoreError::TransferFailure {
                path: path.to_string(),
                source,
            })?;
        if length == 0 {
            break;
        }
        content.extend_from_slice(&buffer[..length]);
    }

    Ok(content)
}

#[async_trait]
impl<C: ObjectStoreClient> FileStorage for ObjectFileStorage<C> {
    async fn store_bytes(&self, path: &str, content: &[u8]) -> Result<()> {
        validate_logical_path(path)?;
        let key = self.root.qualify(path);

        tracing::debug!(bucket = %self.bucket, key = %key, size = content.len(), "Storing object");
        self.client
            .put_object(&self.bucket, &key, content.to_vec())
            .await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let key = self.root.qualify(path);

        tracing::debug!(bucket = %self.bucket, key = %key, "Deleting object");
        self.client.delete_object(&self.bucket, &key).await
    }

    async fn delete_many(&self, paths: &[String]) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }

        let keys: Vec<String> = paths.iter().map(|path| self.root.qualify(path)).collect();

        tracing::debug!(bucket = %self.bucket, count = keys.len(), "Deleting objects");
        self.client.delete_objects(&self.bucket, keys).await
    }

    async fn get(&self, path: &str) -> Result<File> {
        let key = self.root.qualify(path);

        tracing::debug!(bucket = %self.bucket, key = %key, "Fetching object");
        let body = self.client.get_object(&self.bucket, &key).await?;
        let content = drain_body(path, body).await?;

        Ok(File::new(path, content))
    }

    async fn get_multiple(&self, path_prefix: &str, limit: usize) -> Result<Vec<File>> {
        let mut paths = self.list(path_prefix).await?;
        paths.truncate(limit);

        let mut files = Vec::with_capacity(paths.len());
        for path in &paths {
            files.push(self.get(path).await?);
        }

        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{MemoryObjectStore, RecordedCall};
    use crate::domain::ports::ListPage;
    use std::sync::Arc;
    use tokio_test::io::Builder;

    const BUCKET: &str = "fraud-reports";

    fn storage(store: &Arc<MemoryObjectStore>) -> ObjectFileStorage<Arc<MemoryObjectStore>> {
        ObjectFileStorage::new(Arc::clone(store), BUCKET, "store/")
    }

    #[test]
    fn test_root_round_trip() {
        let root = StoreRoot::new("store/");
        for path in ["a/1.xml", "", "ż/ółw.xml", "store/nested.xml", "/leading"] {
            assert_eq!(root.strip(&root.qualify(path)), Some(path));
        }

        // 前綴是字串串接，不是路徑拼接
        let bare = StoreRoot::new("store");
        assert_eq!(bare.qualify("x.xml"), "storex.xml");
        assert_eq!(bare.strip("storex.xml"), Some("x.xml"));
        assert_eq!(bare.strip("other/x.xml"), None);
    }

    #[tokio::test]
    async fn test_drain_concatenates_short_reads() {
        let body = Builder::new()
            .read(b"<fr")
            .read(b"aud")
            .read(b"/>")
            .build();

        let content = drain_body("x.xml", Box::pin(body)).await.unwrap();
        assert_eq!(content, b"<fraud/>");
    }

    #[tokio::test]
    async fn test_drain_larger_than_buffer() {
        let first = vec![b'a'; READ_BUFFER_SIZE + 17];
        let second = vec![b'b'; 3];
        let body = Builder::new().read(&first).read(&second).build();

        let content = drain_body("big.bin", Box::pin(body)).await.unwrap();
        assert_eq!(content.len(), READ_BUFFER_SIZE + 20);
        assert!(content.ends_with(b"abbb"));
    }

    #[tokio::test]
    async fn test_drain_failure_is_transfer_failure() {
        let body = Builder::new()
            .read(b"partial")
            .read_error(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset",
            ))
            .build();

        let err = drain_body("x.xml", Box::pin(body)).await.unwrap_err();
        match err {
            StoreError::TransferFailure { path, source } => {
                assert_eq!(path, "x.xml");
                assert_eq!(source.kind(), std::io::ErrorKind::ConnectionReset);
            }
            other => panic!("expected transfer failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_store_then_get_string() {
        let store = Arc::new(MemoryObjectStore::new());
        let storage = storage(&store);

        storage.store_str("x.xml", "<fraud/>").await.unwrap();
        let file = storage.get("x.xml").await.unwrap();

        assert_eq!(file.path(), "x.xml");
        assert_eq!(file.content_str(), Some("<fraud/>"));
        assert_eq!(store.object(BUCKET, "store/x.xml"), Some(b"<fraud/>".to_vec()));
    }

    #[tokio::test]
    async fn test_store_keeps_utf8_untouched() {
        let store = Arc::new(MemoryObjectStore::new());
        let storage = storage(&store);
        let text = "  Zgłoszenie: żółw 🐢\r\n<opis>naïve</opis>\n  ";

        storage.store_str("utf8.xml", text).await.unwrap();
        let file = storage.get("utf8.xml").await.unwrap();

        assert_eq!(file.content(), text.as_bytes());
        assert_eq!(String::from_utf8(file.content().to_vec()).unwrap(), text);
    }

    #[tokio::test]
    async fn test_store_file_and_raw_bytes() {
        let store = Arc::new(MemoryObjectStore::new());
        let storage = storage(&store);
        let bytes: Vec<u8> = (0..=255).collect();

        storage.store(&File::new("raw.bin", bytes.clone())).await.unwrap();
        storage.store_bytes("empty.bin", &[]).await.unwrap();

        assert_eq!(storage.get("raw.bin").await.unwrap().content(), &bytes[..]);
        assert!(storage.get("empty.bin").await.unwrap().content().is_empty());
    }

    #[tokio::test]
    async fn test_store_overwrites() {
        let store = Arc::new(MemoryObjectStore::new());
        let storage = storage(&store);

        storage.store_str("x.xml", "first").await.unwrap();
        storage.store_str("x.xml", "second").await.unwrap();

        assert_eq!(storage.get("x.xml").await.unwrap().content_str(), Some("second"));
    }

    #[tokio::test]
    async fn test_store_rejects_empty_path() {
        let store = Arc::new(MemoryObjectStore::new());
        let storage = storage(&store);

        let err = storage.store_str("", "content").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidPath { .. }));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = Arc::new(MemoryObjectStore::new());
        let storage = storage(&store);

        let err = storage.get("missing.xml").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_get_with_short_reads() {
        let store = Arc::new(MemoryObjectStore::new().with_read_chunk_size(3));
        let storage = storage(&store);
        let content: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();

        storage.store_bytes("chunked.bin", &content).await.unwrap();
        let file = storage.get("chunked.bin").await.unwrap();

        assert_eq!(file.content(), &content[..]);
    }

    #[tokio::test]
    async fn test_get_interrupted_body() {
        let store = Arc::new(MemoryObjectStore::new().with_read_chunk_size(4));
        let storage = storage(&store);

        storage.store_str("broken.xml", "<fraud>long body</fraud>").await.unwrap();
        store.fail_body_of(BUCKET, "store/broken.xml", 6);

        let err = storage.get("broken.xml").await.unwrap_err();
        assert!(err.is_transfer_failure());
    }

    #[tokio::test]
    async fn test_storage_failure_propagates() {
        let store = Arc::new(MemoryObjectStore::new());
        let storage = storage(&store);
        store.fail_operation("put_object");

        let err = storage.store_str("x.xml", "<fraud/>").await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::StorageFailure { operation: "put_object", .. }
        ));
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let store = Arc::new(MemoryObjectStore::new());
        let storage = storage(&store);

        storage.delete("never-stored.xml").await.unwrap();
        assert_eq!(
            store.calls(),
            vec![RecordedCall::DeleteObject {
                key: "store/never-stored.xml".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_delete_many_issues_one_request() {
        let store = Arc::new(MemoryObjectStore::new());
        let storage = storage(&store);
        storage.store_str("a.xml", "a").await.unwrap();
        storage.store_str("b.xml", "b").await.unwrap();
        store.clear_calls();

        storage
            .delete_many(&["a.xml".to_string(), "b.xml".to_string(), "c.xml".to_string()])
            .await
            .unwrap();

        assert_eq!(
            store.calls(),
            vec![RecordedCall::DeleteObjects {
                keys: vec![
                    "store/a.xml".to_string(),
                    "store/b.xml".to_string(),
                    "store/c.xml".to_string()
                ]
            }]
        );
        assert!(store.keys(BUCKET).is_empty());
    }

    #[tokio::test]
    async fn test_delete_many_empty_is_noop() {
        let store = Arc::new(MemoryObjectStore::new());
        let storage = storage(&store);
        store.fail_operation("delete_objects");

        storage.delete_many(&[]).await.unwrap();
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_get_multiple_scenario() {
        let store = Arc::new(MemoryObjectStore::new());
        let storage = storage(&store);
        storage.store_str("b/1.xml", "<b1/>").await.unwrap();
        storage.store_str("a/2.xml", "<a2/>").await.unwrap();
        storage.store_str("a/1.xml", "<a1/>").await.unwrap();

        let files = storage.get_multiple("a/", 10).await.unwrap();

        assert_eq!(
            files,
            vec![File::new("a/1.xml", "<a1/>"), File::new("a/2.xml", "<a2/>")]
        );
    }

    #[tokio::test]
    async fn test_get_multiple_respects_limit() {
        let store = Arc::new(MemoryObjectStore::new());
        let storage = storage(&store);
        for i in 0..5 {
            storage.store_str(&format!("q/{}.xml", i), "x").await.unwrap();
        }

        let files = storage.get_multiple("q/", 2).await.unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.path()).collect();
        assert_eq!(paths, vec!["q/0.xml", "q/1.xml"]);

        assert!(storage.get_multiple("q/", 0).await.unwrap().is_empty());
        assert!(storage.get_multiple("none/", 3).await.unwrap().is_empty());
        assert_eq!(storage.get_multiple("q/", usize::MAX).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_get_multiple_fails_as_a_whole() {
        let store = Arc::new(MemoryObjectStore::new().with_read_chunk_size(2));
        let storage = storage(&store);
        storage.store_str("a/1.xml", "<a1/>").await.unwrap();
        storage.store_str("a/2.xml", "<a2/>").await.unwrap();
        store.fail_body_of(BUCKET, "store/a/2.xml", 1);

        let err = storage.get_multiple("a/", 10).await.unwrap_err();
        assert!(err.is_transfer_failure());
    }

    #[tokio::test]
    async fn test_list_follows_continuation_tokens() {
        let store = Arc::new(MemoryObjectStore::new().with_page_size(2));
        let storage = storage(&store);
        for i in 0..5 {
            storage.store_str(&format!("p/{}.xml", i), "x").await.unwrap();
        }
        store.clear_calls();

        let paths = storage.list("p/").await.unwrap();

        assert_eq!(paths, vec!["p/0.xml", "p/1.xml", "p/2.xml", "p/3.xml", "p/4.xml"]);
        let list_calls = store
            .calls()
            .into_iter()
            .filter(|call| matches!(call, RecordedCall::ListObjects { .. }))
            .count();
        assert_eq!(list_calls, 3);
    }

    #[tokio::test]
    async fn test_list_ignores_other_roots() {
        let store = Arc::new(MemoryObjectStore::new());
        store.insert(BUCKET, "other/a/1.xml", b"x".to_vec());
        store.insert(BUCKET, "store/a/1.xml", b"y".to_vec());
        let storage = storage(&store);

        assert_eq!(storage.list("a/").await.unwrap(), vec!["a/1.xml"]);
        assert_eq!(storage.list("").await.unwrap(), vec!["a/1.xml"]);
    }

    struct ForeignListing;

    #[async_trait]
    impl ObjectStoreClient for ForeignListing {
        async fn put_object(&self, _bucket: &str, _key: &str, _body: Vec<u8>) -> Result<()> {
            Ok(())
        }

        async fn get_object(&self, _bucket: &str, key: &str) -> Result<ObjectBody> {
            Err(StoreError::NotFound {
                key: key.to_string(),
            })
        }

        async fn delete_object(&self, _bucket: &str, _key: &str) -> Result<()> {
            Ok(())
        }

        async fn delete_objects(&self, _bucket: &str, _keys: Vec<String>) -> Result<()> {
            Ok(())
        }

        async fn list_objects(
            &self,
            _bucket: &str,
            _prefix: &str,
            _continuation_token: Option<String>,
        ) -> Result<ListPage> {
            Ok(ListPage {
                keys: vec!["store/a.xml".to_string(), "elsewhere/a.xml".to_string()],
                continuation_token: None,
            })
        }
    }

    #[tokio::test]
    async fn test_listing_outside_root_is_foreign_key() {
        let storage = ObjectFileStorage::new(ForeignListing, BUCKET, "store/");

        match storage.list("").await.unwrap_err() {
            StoreError::ForeignKey { key, root } => {
                assert_eq!(key, "elsewhere/a.xml");
                assert_eq!(root, "store/");
            }
            other => panic!("expected foreign key, got {:?}", other),
        }

        let err = storage.get_multiple("", 5).await.unwrap_err();
        assert!(matches!(err, StoreError::ForeignKey { .. }));
    }
}
