//! Vidstream Web - JSON API and streaming server

#![warn(missing_docs)]
#![warn(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]
//!
//! Video upload, metadata endpoints and byte-range streaming over axum.

pub mod auth;
pub mod errors;
pub mod handlers;
pub mod server;

// Re-export main types
pub use errors::ApiError;
pub use server::{AppState, build_router, run_server, serve};
