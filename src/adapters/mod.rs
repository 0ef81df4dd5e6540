// Adapters layer: concrete object-store clients (in-memory and S3).

pub mod memory;

#[cfg(feature = "s3")]
pub mod s3;
