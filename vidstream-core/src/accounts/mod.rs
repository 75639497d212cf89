//! User accounts and access tokens.
//!
//! Accounts are registered with a username and password; the password is
//! stored only as an argon2 hash. A successful login yields a signed access
//! token whose subject is the account id, which write endpoints verify.

pub mod store;
pub mod token;
pub mod types;

pub use store::AccountStore;
pub use token::{AccessClaims, TokenIssuer};
pub use types::{RegisterRequest, UserAccount, UserDto};

/// Errors from account and token operations
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// Another account already uses this username
    #[error("Username {username} is already taken")]
    UsernameTaken {
        /// Requested username
        username: String,
    },

    /// Unknown username or wrong password
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Input field failed validation
    #[error("Invalid {field}: {reason}")]
    Validation {
        /// Name of the offending field
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// Password could not be hashed or a stored hash is unreadable
    #[error("Password hashing failed: {reason}")]
    Hashing {
        /// Error reported by argon2
        reason: String,
    },

    /// Token could not be signed, or failed verification
    #[error("Access token error: {source}")]
    Token {
        /// The underlying JWT error
        #[from]
        source: jsonwebtoken::errors::Error,
    },
}

/// Result type for account operations
pub type AccountResult<T> = Result<T, AccountError>;
