pub mod batch_processor;
pub mod fraud_sender;
