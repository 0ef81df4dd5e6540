use crate::domain::model::File;
use crate::domain::ports::FileStorage;
use crate::utils::error::Result;
use async_trait::async_trait;

/// Consumes one stored file. An error leaves the whole batch in the store.
#[async_trait]
pub trait FileHandler: Send + Sync {
    async fn handle(&self, file: &File) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub fetched: usize,
    pub deleted: usize,
}

/// Drains stored files under a prefix in fixed-size batches.
pub struct BatchProcessor<S: FileStorage> {
    storage: S,
    prefix: String,
    batch_size: usize,
}

impl<S: FileStorage> BatchProcessor<S> {
    pub fn new(storage: S, prefix: impl Into<String>, batch_size: usize) -> Self {
        Self {
            storage,
            prefix: prefix.into(),
            batch_size,
        }
    }

    /// Fetches up to `batch_size` files, hands each to `handler`, then deletes
    /// the handled files with a single bulk delete.
    pub async fn process_batch<H: FileHandler>(&self, handler: &H) -> Result<BatchReport> {
        let files = self
            .storage
            .get_multiple(&self.prefix, self.batch_size)
            .await?;

        for file in &files {
            handler.handle(file).await?;
        }

        let paths: Vec<String> = files.iter().map(|file| file.path().to_string()).collect();
        self.storage.delete_many(&paths).await?;

        let report = BatchReport {
            fetched: files.len(),
            deleted: paths.len(),
        };
        tracing::info!(
            prefix = %self.prefix,
            fetched = report.fetched,
            deleted = report.deleted,
            "Processed batch"
        );
        Ok(report)
    }
}
