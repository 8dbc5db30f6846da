//! Picshuttle - S3 image upload pipeline
//!
//! CLI wrapper around the upload pipeline: upload an image and print its
//! public URL, or delete a previously uploaded object by key.

use clap::{Parser, Subcommand};
use picshuttle::config::Config;
use picshuttle::store::s3::S3ObjectStore;
use picshuttle::upload::{progress, validate, Blob, UploadOptions, Uploader};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Picshuttle - upload images to S3, with multipart support
#[derive(Parser, Debug)]
#[command(name = "picshuttle")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "picshuttle.yaml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload an image file and print its public URL
    Upload {
        /// Image file to upload
        file: PathBuf,

        /// Folder (key prefix) to upload into; defaults to the configured one
        #[arg(short, long)]
        folder: Option<String>,

        /// Store under this exact file name instead of a generated one
        #[arg(long)]
        name: Option<String>,
    },
    /// Delete a previously uploaded object by key
    Delete {
        /// Object key, e.g. uploads/photo_1712345678_ab12cd34ef56.png
        key: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting Picshuttle v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load(&args.config)?;
    info!("Loaded configuration from {:?}", args.config);

    let store = Arc::new(S3ObjectStore::connect(&config.storage).await);
    let uploader = Uploader::new(store, &config);

    match args.command {
        Command::Upload { file, folder, name } => {
            let bytes = tokio::fs::read(&file).await?;
            let file_name = file
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("upload")
                .to_string();
            let content_type = validate::mime_for_name(&file_name);
            let blob = Blob::new(file_name, content_type, bytes.into());

            let options = UploadOptions {
                file_name: name,
                folder: folder
                    .or_else(|| Some(config.upload.folder.clone()))
                    .filter(|folder| !folder.is_empty()),
                acl: config.upload.acl,
                ..UploadOptions::default()
            };

            let (progress_tx, mut progress_rx) = progress::channel();
            let watcher = tokio::spawn(async move {
                while progress_rx.changed().await.is_ok() {
                    let percent = *progress_rx.borrow();
                    info!(percent, "Upload progress");
                }
            });

            let uploaded = uploader.upload(&blob, &options, &progress_tx).await?;
            drop(progress_tx);
            let _ = watcher.await;

            info!(key = %uploaded.key, url = %uploaded.url, "Upload complete");
            println!("{}", uploaded.url);
        }
        Command::Delete { key } => {
            uploader.remove(&key).await?;
            info!(key = %key, "Object deleted");
            println!("deleted {key}");
        }
    }

    Ok(())
}
