//! Unique object name generation
//!
//! Generated names keep the original stem and extension around a wall-clock
//! timestamp and a random token: `<stem>_<epochMillis>_<token>.<ext>`. The
//! structure is deterministic, the values are not; collisions are
//! practically avoided without coordination but not cryptographically
//! excluded.

use chrono::Utc;

const TOKEN_LEN: usize = 13;

fn random_token() -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    hex[..TOKEN_LEN].to_string()
}

/// Generate a unique file name from the original.
///
/// Only the last dot separates the extension, so multi-dot stems survive:
/// `a.b.png` becomes `a.b_<millis>_<token>.png`.
pub fn unique_name(original: &str) -> String {
    let timestamp = Utc::now().timestamp_millis();
    let token = random_token();
    match original.rsplit_once('.') {
        Some((stem, ext)) if !ext.is_empty() => format!("{stem}_{timestamp}_{token}.{ext}"),
        _ => format!("{original}_{timestamp}_{token}"),
    }
}

/// Assemble the object key from an optional folder and a file name.
pub fn object_key(folder: Option<&str>, file_name: &str) -> String {
    match folder {
        Some(folder) if !folder.is_empty() => format!("{folder}/{file_name}"),
        _ => file_name.to_string(),
    }
}
