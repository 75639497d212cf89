//! Integration tests for Vidstream
//!
//! These tests run the real router on a loopback listener and talk to it with
//! an HTTP client, covering behavior that only shows up over a socket:
//! chunked delivery, concurrent readers and clients that hang up early.

#[path = "integration/harness.rs"]
mod harness;

#[path = "integration/auth_api.rs"]
mod auth_api;
#[path = "integration/range_streaming.rs"]
mod range_streaming;
#[path = "integration/video_api.rs"]
mod video_api;
