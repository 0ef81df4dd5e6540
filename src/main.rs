use anyhow::Context;
use clap::Parser;
use fraud_file_store::domain::model::FileSummary;
use fraud_file_store::utils::{logger, validation::Validate};
use fraud_file_store::{Cli, Command, FileStorage, ObjectFileStorage, S3ObjectStore};
use std::io::Write;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    let config = cli.store_config().context("loading store configuration")?;
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        return Err(e.into());
    }
    tracing::debug!("Store config: {:?}", config);

    let client = S3ObjectStore::from_config(&config).await;
    let storage = ObjectFileStorage::new(client, config.bucket.clone(), config.root_prefix.clone());

    match cli.command {
        Command::Put {
            path,
            file,
            content,
        } => {
            match (file, content) {
                (Some(local), _) => {
                    let bytes = std::fs::read(&local)
                        .with_context(|| format!("reading {}", local.display()))?;
                    storage.store_bytes(&path, &bytes).await?;
                }
                (None, Some(content)) => storage.store_str(&path, &content).await?,
                (None, None) => anyhow::bail!("put needs either --file or --content"),
            }
            tracing::info!("✅ Stored {}", path);
        }
        Command::Get { path, output } => {
            let file = storage.get(&path).await?;
            match output {
                Some(output) => {
                    std::fs::write(&output, file.content())
                        .with_context(|| format!("writing {}", output.display()))?;
                    tracing::info!("📁 Saved {} to {}", path, output.display());
                }
                None => std::io::stdout().write_all(file.content())?,
            }
        }
        Command::List { prefix } => {
            for path in storage.list(&prefix).await? {
                println!("{}", path);
            }
        }
        Command::Fetch { prefix, limit } => {
            let files = storage.get_multiple(&prefix, limit).await?;
            let summaries: Vec<FileSummary> = files.iter().map(FileSummary::from).collect();
            println!("{}", serde_json::to_string_pretty(&summaries)?);
        }
        Command::Delete { paths } => {
            match paths.as_slice() {
                [single] => storage.delete(single).await?,
                many => storage.delete_many(many).await?,
            }
            tracing::info!("🗑️ Deleted {} file(s)", paths.len());
        }
    }

    Ok(())
}
