//! Picshuttle Library
//!
//! The transfer core of an image-upload widget: a session state machine over
//! an S3 object-storage pipeline.
//!
//! # Features
//!
//! - **Two strategies**: single-shot for small blobs, multipart above 100MiB
//! - **Concurrent parts**: multipart parts upload in parallel with a
//!   configurable cap
//! - **Progress stream**: watch-channel progress in percent, monotonic even
//!   under out-of-order part completion
//! - **Abort on failure**: failed multipart sessions are aborted so parts do
//!   not accumulate storage cost
//! - **Session lifecycle**: select → crop → upload → settle, with retry,
//!   delete, and reset
//!
//! # Example
//!
//! ```no_run
//! use picshuttle::{config::Config, session::UploadSession, store::s3::S3ObjectStore, upload::Blob};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("picshuttle.yaml")?;
//!     let store = Arc::new(S3ObjectStore::connect(&config.storage).await);
//!     let mut session = UploadSession::from_config(store, &config);
//!
//!     session.select(Blob::new("photo.png", "image/png", vec![0u8; 64].into()));
//!     session.crop_cancel();
//!     if let Some(result) = session.upload().await {
//!         println!("uploaded: {:?}", result.url);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod session;
pub mod store;
pub mod upload;

// Re-export commonly used types
pub use config::Config;
pub use session::UploadSession;
pub use upload::{Blob, UploadOptions, UploadResult, Uploader};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
