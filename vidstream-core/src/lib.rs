//! Vidstream Core - Byte-range video streaming
//!
//! This crate provides the building blocks of the video service: HTTP Range
//! parsing, bounded file streaming, the per-request stream orchestrator, the
//! video catalog, user accounts and configuration management.

pub mod accounts;
pub mod catalog;
pub mod config;
pub mod streaming;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_fixtures;
pub mod tracing_setup;

// Re-export main types for convenient access
pub use accounts::{AccountError, AccountStore, TokenIssuer};
pub use catalog::{CatalogError, VideoCatalog};
pub use config::{ConfigError, VidstreamConfig};
pub use streaming::{StreamingError, StreamingOrchestrator};

/// Core errors that can bubble up from any Vidstream subsystem.
#[derive(Debug, thiserror::Error)]
pub enum VidstreamError {
    #[error("Streaming error: {0}")]
    Streaming(#[from] StreamingError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Account error: {0}")]
    Account(#[from] AccountError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl VidstreamError {
    /// Returns a user-friendly error message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            VidstreamError::Streaming(e) => match e {
                StreamingError::VideoNotFound { .. } | StreamingError::FileNotFound { .. } => {
                    "Video not found".to_string()
                }
                StreamingError::BadRange { .. } => "Requested range cannot be served".to_string(),
                StreamingError::Io { .. } => "Streaming error occurred".to_string(),
            },
            VidstreamError::Catalog(e) => match e {
                CatalogError::NotFound { .. } => "Video not found".to_string(),
                CatalogError::Validation { field, reason } => format!("Invalid {field}: {reason}"),
                CatalogError::Io { .. } => "File system error occurred".to_string(),
            },
            VidstreamError::Account(e) => match e {
                AccountError::UsernameTaken { .. } => "Username is already taken".to_string(),
                AccountError::InvalidCredentials | AccountError::Token { .. } => {
                    "Invalid credentials".to_string()
                }
                AccountError::Validation { field, reason } => format!("Invalid {field}: {reason}"),
                AccountError::Hashing { .. } => "Account error occurred".to_string(),
            },
            VidstreamError::Configuration(e) => format!("Configuration error: {e}"),
            VidstreamError::Io(_) => "File system error occurred".to_string(),
        }
    }

    /// Checks if this error is due to user input validation.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            VidstreamError::Configuration(_)
                | VidstreamError::Streaming(StreamingError::BadRange { .. })
                | VidstreamError::Catalog(CatalogError::Validation { .. })
                | VidstreamError::Account(
                    AccountError::UsernameTaken { .. }
                        | AccountError::InvalidCredentials
                        | AccountError::Validation { .. }
                )
        )
    }
}

pub type Result<T> = std::result::Result<T, VidstreamError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streaming::parse_range;

    #[test]
    fn test_user_message_hides_paths() {
        let error = VidstreamError::from(StreamingError::FileNotFound {
            path: "/srv/uploads/secret.mp4".into(),
        });
        assert_eq!(error.user_message(), "Video not found");
        assert!(!error.is_user_error());
    }

    #[test]
    fn test_bad_range_is_user_error() {
        let range_error = parse_range(10, Some("bytes=20-30")).unwrap_err();
        let error = VidstreamError::from(StreamingError::from(range_error));
        assert!(error.is_user_error());
    }

    #[test]
    fn test_account_errors_do_not_leak_hash_details() {
        let error = VidstreamError::from(AccountError::Hashing {
            reason: "salt too short".to_string(),
        });
        assert_eq!(error.user_message(), "Account error occurred");
        assert!(!error.is_user_error());

        let taken = VidstreamError::from(AccountError::UsernameTaken {
            username: "alice".to_string(),
        });
        assert!(taken.is_user_error());
    }
}
