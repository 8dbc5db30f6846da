//! Configuration module for Picshuttle
//!
//! Handles loading and parsing of YAML configuration files with support for
//! environment variable expansion and comprehensive validation.
//!
//! # Example
//!
//! ```yaml
//! storage:
//!   bucket: my-images
//!   region: us-east-1
//!   access_key_id: ${AWS_ACCESS_KEY_ID}
//!   secret_access_key: ${AWS_SECRET_ACCESS_KEY}
//! cdn:
//!   base_url: https://cdn.example.com
//! upload:
//!   folder: uploads
//!   acl: public-read
//! ```

use crate::upload::Acl;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand environment variables in a string.
///
/// Supports two syntaxes:
/// - `${VAR_NAME}` - Simple expansion, keeps placeholder if var not found
/// - `${VAR_NAME:-default}` - Expansion with default value
///
/// Variable names must start with a letter or underscore and contain only
/// uppercase letters, digits, and underscores.
fn expand_env_vars(s: &str) -> String {
    let re = regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]+))?\}").unwrap();
    let mut last_match = 0;
    let mut result = String::with_capacity(s.len());

    for cap in re.captures_iter(s) {
        let full_match = cap.get(0).unwrap();
        let var_name = cap.get(1).unwrap().as_str();

        result.push_str(&s[last_match..full_match.start()]);

        let value = match std::env::var(var_name) {
            Ok(val) => val,
            Err(_) => {
                if let Some(default) = cap.get(2) {
                    default.as_str().to_string()
                } else {
                    // No env var and no default. Keep the original placeholder.
                    full_match.as_str().to_string()
                }
            }
        };
        result.push_str(&value);

        last_match = full_match.end();
    }

    result.push_str(&s[last_match..]);

    result
}

/// Custom deserializer for strings with environment variable expansion.
fn deserialize_with_env<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::de::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(expand_env_vars(&s))
}

/// Like [`deserialize_with_env`] but for optional fields.
fn deserialize_opt_with_env<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::de::Deserializer<'de>,
{
    let s = Option::<String>::deserialize(deserializer)?;
    Ok(s.map(|s| expand_env_vars(&s)))
}

/// Validate that a URL starts with http:// or https://
fn is_valid_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    #[serde(default)]
    pub cdn: Option<CdnConfig>,
    #[serde(default)]
    pub upload: UploadDefaults,
}

impl Config {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        ConfigLoader::load(path)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.bucket.is_empty() {
            return Err(ConfigError::ValidationError(
                "Storage bucket must not be empty".into(),
            ));
        }
        if self.storage.region.is_empty() {
            return Err(ConfigError::ValidationError(
                "Storage region must not be empty".into(),
            ));
        }
        if self.storage.access_key_id.is_empty() || self.storage.secret_access_key.is_empty() {
            return Err(ConfigError::ValidationError(
                "Storage credentials must not be empty".into(),
            ));
        }
        if let Some(ref endpoint) = self.storage.endpoint {
            if !is_valid_http_url(endpoint) {
                return Err(ConfigError::ValidationError(
                    "Invalid storage endpoint: must start with http:// or https://".into(),
                ));
            }
        }

        if let Some(ref cdn) = self.cdn {
            if !is_valid_http_url(&cdn.base_url) {
                return Err(ConfigError::ValidationError(
                    "Invalid CDN base URL: must start with http:// or https://".into(),
                ));
            }
        }

        if self.upload.max_size_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "upload.max_size_bytes must be greater than zero".into(),
            ));
        }
        if self.upload.concurrent_parts == 0 {
            return Err(ConfigError::ValidationError(
                "upload.concurrent_parts must be at least 1".into(),
            ));
        }

        Ok(())
    }
}

/// Object storage configuration
///
/// Credentials are injected at load time and never mutated afterwards. The
/// `Debug` implementation redacts the secret key and session token so the
/// struct can appear in logs without leaking credentials.
#[derive(Clone, Deserialize)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: String,
    #[serde(deserialize_with = "deserialize_with_env")]
    pub access_key_id: String,
    #[serde(deserialize_with = "deserialize_with_env")]
    pub secret_access_key: String,
    #[serde(default, deserialize_with = "deserialize_opt_with_env")]
    pub session_token: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<redacted>"),
            )
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// CDN configuration
///
/// When present, the store-domain prefix of a published URL is textually
/// replaced with `base_url`.
#[derive(Debug, Clone, Deserialize)]
pub struct CdnConfig {
    pub base_url: String,
}

/// Upload defaults
#[derive(Debug, Clone, Deserialize)]
pub struct UploadDefaults {
    #[serde(default = "default_folder")]
    pub folder: String,
    #[serde(default = "default_acl")]
    pub acl: Acl,
    #[serde(default = "default_max_size_bytes")]
    pub max_size_bytes: u64,
    #[serde(default = "default_concurrent_parts")]
    pub concurrent_parts: usize,
}

impl Default for UploadDefaults {
    fn default() -> Self {
        Self {
            folder: default_folder(),
            acl: default_acl(),
            max_size_bytes: default_max_size_bytes(),
            concurrent_parts: default_concurrent_parts(),
        }
    }
}

fn default_folder() -> String {
    "uploads".into()
}

fn default_acl() -> Acl {
    Acl::PublicRead
}

fn default_max_size_bytes() -> u64 {
    10485760 // 10MiB
}

fn default_concurrent_parts() -> usize {
    4
}
