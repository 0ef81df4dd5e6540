pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::{Cli, Command};

#[cfg(feature = "s3")]
pub use adapters::s3::S3ObjectStore;

pub use adapters::memory::MemoryObjectStore;
pub use app::batch_processor::{BatchProcessor, BatchReport, FileHandler};
pub use app::fraud_sender::{FraudReport, FraudSender, FraudSerializer, XmlFraudSender};
pub use config::StoreConfig;
pub use core::storage::{ObjectFileStorage, StoreRoot};
pub use domain::model::File;
pub use domain::ports::{FileStorage, ObjectStoreClient};
pub use utils::error::{Result, StoreError};
