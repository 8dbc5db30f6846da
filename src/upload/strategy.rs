//! Upload strategy selection
//!
//! Pure size-based choice between the single-shot and multipart engines.

/// Blobs above this size use multipart upload (100MiB)
pub const MULTIPART_THRESHOLD_BYTES: u64 = 104_857_600;

/// Transfer strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Single,
    Multipart,
}

/// Select the strategy for a blob of the given size.
pub fn select(size_bytes: u64) -> Strategy {
    if size_bytes > MULTIPART_THRESHOLD_BYTES {
        Strategy::Multipart
    } else {
        Strategy::Single
    }
}
