use crate::config::StoreConfig;
use crate::domain::ports::{ListPage, ObjectBody, ObjectStoreClient};
use crate::utils::error::{Result, StoreError};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use aws_sdk_s3::Client as S3Client;

/// S3 rejects DeleteObjects requests with more keys than this.
const MAX_KEYS_PER_DELETE: usize = 1000;

/// `ObjectStoreClient` over the AWS S3 SDK.
///
/// Credentials come from the SDK's default provider chain (environment,
/// shared credentials file, or instance role).
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: S3Client,
}

impl S3ObjectStore {
    pub fn new(client: S3Client) -> Self {
        Self { client }
    }

    pub async fn from_config(config: &StoreConfig) -> Self {
        let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config)
            .region(Region::new(config.region.clone()))
            .force_path_style(config.force_path_style);
        if let Some(endpoint_url) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint_url);
        }

        tracing::debug!(
            region = %config.region,
            endpoint_url = ?config.endpoint_url,
            "Created S3 client"
        );
        Self::new(S3Client::from_conf(builder.build()))
    }
}

#[async_trait]
impl ObjectStoreClient for S3ObjectStore {
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|err| StoreError::storage("put_object", key, err.into_service_error()))?;

        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectBody> {
        let result = self.client.get_object().bucket(bucket).key(key).send().await;

        match result {
            Ok(output) => Ok(Box::pin(output.body.into_async_read())),
            Err(err) => {
                let err = err.into_service_error();
                if err.is_no_such_key() {
                    Err(StoreError::NotFound {
                        key: key.to_string(),
                    })
                } else {
                    Err(StoreError::storage("get_object", key, err))
                }
            }
        }
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| StoreError::storage("delete_object", key, err.into_service_error()))?;

        Ok(())
    }

    async fn delete_objects(&self, bucket: &str, keys: Vec<String>) -> Result<()> {
        for chunk in keys.chunks(MAX_KEYS_PER_DELETE) {
            let first_key = chunk.first().cloned().unwrap_or_default();

            let objects = chunk
                .iter()
                .map(|key| ObjectIdentifier::builder().key(key).build())
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|err| StoreError::storage("delete_objects", &first_key, err))?;
            let delete = Delete::builder()
                .set_objects(Some(objects))
                .quiet(true)
                .build()
                .map_err(|err| StoreError::storage("delete_objects", &first_key, err))?;

            let output = self
                .client
                .delete_objects()
                .bucket(bucket)
                .delete(delete)
                .send()
                .await
                .map_err(|err| {
                    StoreError::storage("delete_objects", &first_key, err.into_service_error())
                })?;

            // Any per-key error fails the whole batch; later chunks are not sent.
            let errors = output.errors();
            if let Some(first) = errors.first() {
                let failed_key = first.key().unwrap_or(first_key.as_str()).to_string();
                tracing::warn!(
                    bucket,
                    failed = errors.len(),
                    first_failed = %failed_key,
                    "Bulk delete reported per-key errors"
                );
                return Err(StoreError::storage(
                    "delete_objects",
                    failed_key,
                    format!(
                        "{} of {} keys not deleted (first error: {})",
                        errors.len(),
                        chunk.len(),
                        first.code().unwrap_or("unknown")
                    ),
                ));
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
        let mut request = self.client.list_objects_v2().bucket(bucket).prefix(prefix);
        if let Some(token) = continuation_token {
            request = request.continuation_token(token);
        }

        let response = request
            .send()
            .await
            .map_err(|err| StoreError::storage("list_objects", prefix, err.into_service_error()))?;

        let keys = response
            .contents
            .unwrap_or_default()
            .into_iter()
            .filter_map(|object| object.key)
            .collect();
        let continuation_token = if response.is_truncated.unwrap_or(false) {
            response.next_continuation_token
        } else {
            None
        };

        Ok(ListPage {
            keys,
            continuation_token,
        })
    }
}
