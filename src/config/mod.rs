#[cfg(feature = "cli")]
pub mod cli;

use crate::utils::error::{Result, StoreError};
use crate::utils::validation::{validate_bucket_name, validate_region, validate_url, Validate};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

pub const DEFAULT_REGION: &str = "eu-west-1";

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

/// Where the file storage lives: bucket, root prefix and how to reach the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub bucket: String,
    #[serde(default)]
    pub root_prefix: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default)]
    pub endpoint_url: Option<String>,
    #[serde(default)]
    pub force_path_style: bool,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    store: StoreConfig,
}

impl StoreConfig {
    pub fn new(bucket: impl Into<String>, root_prefix: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            root_prefix: root_prefix.into(),
            region: default_region(),
            endpoint_url: None,
            force_path_style: false,
        }
    }

    /// 從環境變數載入配置
    pub fn from_env() -> Result<Self> {
        let bucket = env::var("STORE_BUCKET").map_err(|_| StoreError::ConfigError {
            message: "STORE_BUCKET environment variable is required".to_string(),
        })?;

        Ok(Self::from_env_with_bucket(bucket))
    }

    /// 使用指定的 bucket，其餘欄位仍從環境變數讀取
    pub fn from_env_with_bucket(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            root_prefix: env::var("STORE_ROOT_PREFIX").unwrap_or_default(),
            region: env::var("STORE_REGION").unwrap_or_else(|_| default_region()),
            endpoint_url: env::var("STORE_ENDPOINT_URL").ok().filter(|url| !url.is_empty()),
            force_path_style: env::var("STORE_FORCE_PATH_STYLE")
                .map(|value| matches!(value.as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        }
    }

    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(StoreError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析 `[store]` 區段
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        let file: ConfigFile =
            toml::from_str(&processed_content).map_err(|e| StoreError::ConfigValidationError {
                field: "toml_parsing".to_string(),
                message: format!("TOML parsing error: {}", e),
            })?;
        Ok(file.store)
    }

    /// 替換環境變數 (例如 ${STORE_BUCKET})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| StoreError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

impl Validate for StoreConfig {
    fn validate(&self) -> Result<()> {
        validate_bucket_name("bucket", &self.bucket)?;
        validate_region("region", &self.region)?;

        if let Some(endpoint_url) = &self.endpoint_url {
            validate_url("endpoint_url", endpoint_url)?;
        }

        if !self.root_prefix.is_empty() && !self.root_prefix.ends_with('/') {
            tracing::warn!(
                root_prefix = %self.root_prefix,
                "Root prefix does not end with '/'; keys are formed by plain concatenation"
            );
        }

        tracing::debug!("Store configuration validation passed");
        Ok(())
    }
}
