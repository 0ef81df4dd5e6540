pub mod storage;

pub use crate::domain::model::File;
pub use crate::domain::ports::{FileStorage, ListPage, ObjectBody, ObjectStoreClient};
pub use crate::utils::error::Result;
