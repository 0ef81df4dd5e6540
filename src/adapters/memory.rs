use crate::domain::ports::{ListPage, ObjectBody, ObjectStoreClient};
use crate::utils::error::{Result, StoreError};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::pin::Pin;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};

/// A remote call observed by [`MemoryObjectStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    PutObject { key: String },
    GetObject { key: String },
    DeleteObject { key: String },
    DeleteObjects { keys: Vec<String> },
    ListObjects { prefix: String, continuation_token: Option<String> },
}

/// In-process object store. Keys are kept sorted, so listings are lexicographic.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    buckets: Mutex<HashMap<String, BTreeMap<String, Vec<u8>>>>,
    page_size: Option<usize>,
    read_chunk_size: Option<usize>,
    broken_bodies: Mutex<HashMap<(String, String), usize>>,
    failing_operations: Mutex<HashSet<&'static str>>,
    calls: Mutex<Vec<RecordedCall>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limits every listing page to `page_size` keys.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size.max(1));
        self
    }

    /// Makes object bodies deliver at most `chunk_size` bytes per read.
    pub fn with_read_chunk_size(mut self, chunk_size: usize) -> Self {
        self.read_chunk_size = Some(chunk_size.max(1));
        self
    }

    /// Body of `key` will fail with an I/O error after `after_bytes` bytes.
    pub fn fail_body_of(&self, bucket: &str, key: &str, after_bytes: usize) {
        lock(&self.broken_bodies).insert((bucket.to_string(), key.to_string()), after_bytes);
    }

    /// Every call of `operation` (e.g. `"put_object"`) fails with a storage failure.
    pub fn fail_operation(&self, operation: &'static str) {
        lock(&self.failing_operations).insert(operation);
    }

    pub fn insert(&self, bucket: &str, key: &str, content: Vec<u8>) {
        lock(&self.buckets)
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), content);
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        lock(&self.buckets)
            .get(bucket)
            .and_then(|objects| objects.get(key).cloned())
    }

    pub fn keys(&self, bucket: &str) -> Vec<String> {
        lock(&self.buckets)
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    fn record(&self, operation: &'static str, key: &str, call: RecordedCall) -> Result<()> {
        lock(&self.calls).push(call);
        if lock(&self.failing_operations).contains(operation) {
            return Err(StoreError::storage(
                operation,
                key,
                format!("simulated {} failure", operation),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStoreClient for MemoryObjectStore {
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        self.record("put_object", key, RecordedCall::PutObject { key: key.to_string() })?;
        self.insert(bucket, key, body);
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectBody> {
        self.record("get_object", key, RecordedCall::GetObject { key: key.to_string() })?;

        let data = self.object(bucket, key).ok_or_else(|| StoreError::NotFound {
            key: key.to_string(),
        })?;
        let fail_after = lock(&self.broken_bodies)
            .get(&(bucket.to_string(), key.to_string()))
            .copied();

        Ok(Box::pin(ChunkedBody {
            data,
            position: 0,
            chunk_size: self.read_chunk_size.unwrap_or(usize::MAX),
            fail_after,
        }))
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        self.record("delete_object", key, RecordedCall::DeleteObject { key: key.to_string() })?;
        if let Some(objects) = lock(&self.buckets).get_mut(bucket) {
            objects.remove(key);
        }
        Ok(())
    }

    async fn delete_objects(&self, bucket: &str, keys: Vec<String>) -> Result<()> {
        let first = keys.first().cloned().unwrap_or_default();
        self.record("delete_objects", &first, RecordedCall::DeleteObjects { keys: keys.clone() })?;
        if let Some(objects) = lock(&self.buckets).get_mut(bucket) {
            for key in &keys {
                objects.remove(key);
            }
        }
        Ok(())
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<String>,
    ) -> Result<ListPage> {
        self.record(
            "list_objects",
            prefix,
            RecordedCall::ListObjects {
                prefix: prefix.to_string(),
                continuation_token: continuation_token.clone(),
            },
        )?;

        let buckets = lock(&self.buckets);
        let Some(objects) = buckets.get(bucket) else {
            return Ok(ListPage::default());
        };

        // The token is the last key of the previous page.
        let mut matching = objects
            .keys()
            .filter(|key| key.starts_with(prefix))
            .filter(|key| {
                continuation_token
                    .as_deref()
                    .map_or(true, |token| key.as_str() > token)
            })
            .cloned();

        let page_size = self.page_size.unwrap_or(usize::MAX);
        let keys: Vec<String> = matching.by_ref().take(page_size).collect();
        let continuation_token = match matching.next() {
            Some(_) => keys.last().cloned(),
            None => None,
        };

        Ok(ListPage {
            keys,
            continuation_token,
        })
    }
}

/// Body that hands out at most `chunk_size` bytes per read and can fail midway.
struct ChunkedBody {
    data: Vec<u8>,
    position: usize,
    chunk_size: usize,
    fail_after: Option<usize>,
}

impl AsyncRead for ChunkedBody {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        let end = self.data.len().min(self.fail_after.unwrap_or(usize::MAX));

        if self.position >= end && self.position < self.data.len() {
            return Poll::Ready(Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "simulated transfer interruption",
            )));
        }

        let available = end.saturating_sub(self.position);
        let length = available.min(self.chunk_size).min(buf.remaining());
        let start = self.position;
        buf.put_slice(&self.data[start..start + length]);
        self.position += length;

        Poll::Ready(Ok(()))
    }
}
