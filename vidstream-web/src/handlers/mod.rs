//! HTTP request handlers organized by functionality

pub mod accounts;
pub mod range;
pub mod streaming;
pub mod videos;

// Re-export handler functions
pub use accounts::{login, register};
pub use range::extract_range_header;
pub use streaming::stream_video;
pub use videos::{delete_video, get_video, list_videos, patch_video, upload_video};
