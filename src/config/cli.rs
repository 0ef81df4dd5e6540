use crate::config::StoreConfig;
use crate::utils::error::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "fraud-store")]
#[command(about = "Inspect and maintain the fraud report file store")]
pub struct Cli {
    /// TOML file with a [store] section; falls back to STORE_* environment variables
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub bucket: Option<String>,

    #[arg(long)]
    pub root_prefix: Option<String>,

    #[arg(long)]
    pub region: Option<String>,

    #[arg(long)]
    pub endpoint_url: Option<String>,

    #[arg(long)]
    pub force_path_style: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Store a local file (or inline content) under a logical path
    Put {
        path: String,
        #[arg(long, conflicts_with = "content")]
        file: Option<PathBuf>,
        #[arg(long)]
        content: Option<String>,
    },
    /// Print a stored file to stdout, or write it to --output
    Get {
        path: String,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List logical paths under a prefix
    List {
        #[arg(default_value = "")]
        prefix: String,
    },
    /// Fetch up to --limit files under a prefix and print a JSON summary
    Fetch {
        #[arg(default_value = "")]
        prefix: String,
        #[arg(long, default_value = "10")]
        limit: usize,
    },
    /// Delete one or more files
    Delete {
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

impl Cli {
    /// 組合配置：檔案或環境變數為基底，命令列參數覆蓋
    pub fn store_config(&self) -> Result<StoreConfig> {
        let mut config = match (&self.config, &self.bucket) {
            (Some(path), _) => StoreConfig::from_file(path)?,
            (None, Some(bucket)) => StoreConfig::from_env_with_bucket(bucket.clone()),
            (None, None) => StoreConfig::from_env()?,
        };

        if let Some(bucket) = &self.bucket {
            config.bucket = bucket.clone();
        }
        if let Some(root_prefix) = &self.root_prefix {
            config.root_prefix = root_prefix.clone();
        }
        if let Some(region) = &self.region {
            config.region = region.clone();
        }
        if let Some(endpoint_url) = &self.endpoint_url {
            config.endpoint_url = Some(endpoint_url.clone());
        }
        if self.force_path_style {
            config.force_path_style = true;
        }

        Ok(config)
    }
}
