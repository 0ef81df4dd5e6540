use serde::{Deserialize, Serialize};

/// A stored payload addressed by its logical path (never root-qualified).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    path: String,
    content: Vec<u8>,
}

impl File {
    pub fn new(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Content decoded as UTF-8, if it is valid UTF-8.
    pub fn content_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.content).ok()
    }
}

/// Summary line for listings printed by the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct FileSummary {
    pub path: String,
    pub size: usize,
}

impl From<&File> for FileSummary {
    fn from(file: &File) -> Self {
        Self {
            path: file.path.clone(),
            size: file.content.len(),
        }
    }
}
