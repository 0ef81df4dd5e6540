use crate::domain::ports::FileStorage;
use crate::utils::error::Result;
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileExtension {
    Xml,
    Json,
}

impl FileExtension {
    pub fn extension(&self) -> &'static str {
        match self {
            FileExtension::Xml => ".xml",
            FileExtension::Json => ".json",
        }
    }
}

/// A report that can be stored under its own id.
pub trait FraudReport: Send + Sync {
    fn id(&self) -> &str;
}

/// Turns a report into its stored text representation.
pub trait FraudSerializer<M>: Send + Sync {
    fn serialize(&self, report: &M) -> Result<String>;
}

#[async_trait]
pub trait FraudSender<M: FraudReport>: Send + Sync {
    async fn send(&self, report: &M) -> Result<()>;
}

/// Serializes reports to XML and stores each as `<id>.xml`.
pub struct XmlFraudSender<S, Z> {
    storage: S,
    serializer: Z,
}

impl<S, Z> XmlFraudSender<S, Z> {
    pub fn new(storage: S, serializer: Z) -> Self {
        Self {
            storage,
            serializer,
        }
    }

    pub fn file_name(report_id: &str) -> String {
        format!("{}{}", report_id, FileExtension::Xml.extension())
    }
}

#[async_trait]
impl<M, S, Z> FraudSender<M> for XmlFraudSender<S, Z>
where
    M: FraudReport,
    S: FileStorage,
    Z: FraudSerializer<M>,
{
    async fn send(&self, report: &M) -> Result<()> {
        let serialized = self.serializer.serialize(report)?;
        let path = Self::file_name(report.id());

        tracing::info!(path = %path, size = serialized.len(), "Sending fraud report");
        self.storage.store_str(&path, &serialized).await
    }
}
