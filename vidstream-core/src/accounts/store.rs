//! In-memory account registry with argon2 password hashes

use std::collections::HashMap;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use chrono::Utc;
use parking_lot::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use super::types::{RegisterRequest, UserAccount};
use super::{AccountError, AccountResult};
use crate::config::AuthConfig;

/// Registry of accounts keyed by username.
///
/// Hashing is CPU-bound; call from a blocking context in async code.
pub struct AccountStore {
    accounts: RwLock<HashMap<String, UserAccount>>,
    hasher: Argon2<'static>,
}

impl std::fmt::Debug for AccountStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountStore")
            .field("accounts", &self.accounts.read().len())
            .finish_non_exhaustive()
    }
}

impl AccountStore {
    /// Create an empty store hashing with the costs in `config`.
    ///
    /// # Errors
    /// - `AccountError::Hashing` - argon2 rejects the configured costs
    pub fn new(config: &AuthConfig) -> AccountResult<Self> {
        let params = Params::new(
            config.hash_memory_kib,
            config.hash_iterations,
            Params::DEFAULT_P_COST,
            None,
        )
        .map_err(hashing_failed)?;

        Ok(Self {
            accounts: RwLock::new(HashMap::new()),
            hasher: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Create an account.
    ///
    /// # Errors
    /// - `AccountError::Validation` - Username or password empty
    /// - `AccountError::UsernameTaken` - Username already registered
    /// - `AccountError::Hashing` - Password could not be hashed
    pub fn register(&self, request: RegisterRequest) -> AccountResult<UserAccount> {
        request.validate()?;
        if self.accounts.read().contains_key(&request.username) {
            return Err(AccountError::UsernameTaken {
                username: request.username,
            });
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = self
            .hasher
            .hash_password(request.password.as_bytes(), &salt)
            .map_err(hashing_failed)?
            .to_string();

        let mut accounts = self.accounts.write();
        // Re-check: another registration may have won while hashing.
        if accounts.contains_key(&request.username) {
            return Err(AccountError::UsernameTaken {
                username: request.username,
            });
        }

        let account = UserAccount {
            id: Uuid::new_v4(),
            username: request.username,
            password_hash,
            created_at: Utc::now(),
        };
        accounts.insert(account.username.clone(), account.clone());
        info!("Registered account {} ({})", account.username, account.id);
        Ok(account)
    }

    /// Check a username and password pair.
    ///
    /// # Errors
    /// - `AccountError::InvalidCredentials` - Unknown username or wrong password
    /// - `AccountError::Hashing` - Stored hash is unreadable
    pub fn authenticate(&self, username: &str, password: &str) -> AccountResult<UserAccount> {
        let Some(account) = self.accounts.read().get(username).cloned() else {
            debug!("Login for unknown username {}", username);
            return Err(AccountError::InvalidCredentials);
        };

        let parsed = PasswordHash::new(&account.password_hash).map_err(hashing_failed)?;
        self.hasher
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| {
                debug!("Wrong password for {}", username);
                AccountError::InvalidCredentials
            })?;

        Ok(account)
    }

    /// Number of registered accounts.
    pub fn len(&self) -> usize {
        self.accounts.read().len()
    }

    /// Whether no account is registered.
    pub fn is_empty(&self) -> bool {
        self.accounts.read().is_empty()
    }
}

fn hashing_failed(error: impl std::fmt::Display) -> AccountError {
    AccountError::Hashing {
        reason: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::fast_auth_config;

    fn request(username: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_register_then_authenticate() {
        let store = AccountStore::new(&fast_auth_config()).unwrap();

        let account = store.register(request("dummy@dummy.com", "dummy")).unwrap();
        assert!(account.password_hash.starts_with("$argon2id$"));
        assert!(!account.password_hash.contains("dummy"));

        let found = store.authenticate("dummy@dummy.com", "dummy").unwrap();
        assert_eq!(found.id, account.id);
    }

    #[test]
    fn test_duplicate_username_is_rejected() {
        let store = AccountStore::new(&fast_auth_config()).unwrap();
        store.register(request("dummy@dummy.com", "dummy")).unwrap();

        let err = store
            .register(request("dummy@dummy.com", "other"))
            .unwrap_err();
        assert!(matches!(err, AccountError::UsernameTaken { .. }));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_wrong_password_and_unknown_user_look_the_same() {
        let store = AccountStore::new(&fast_auth_config()).unwrap();
        store.register(request("dummy@dummy.com", "dummy")).unwrap();

        let wrong = store.authenticate("dummy@dummy.com", "invalid").unwrap_err();
        let unknown = store.authenticate("invalid", "dummy").unwrap_err();
        assert!(matches!(wrong, AccountError::InvalidCredentials));
        assert!(matches!(unknown, AccountError::InvalidCredentials));
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[test]
    fn test_blank_fields_are_rejected_before_hashing() {
        let store = AccountStore::new(&fast_auth_config()).unwrap();
        let err = store.register(request("", "dummy")).unwrap_err();
        assert!(matches!(err, AccountError::Validation { field: "username", .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn test_same_password_gets_distinct_salts() {
        let store = AccountStore::new(&fast_auth_config()).unwrap();
        let a = store.register(request("a", "same")).unwrap();
        let b = store.register(request("b", "same")).unwrap();
        assert_ne!(a.password_hash, b.password_hash);
    }

    #[test]
    fn test_rejects_unusable_costs() {
        let mut config = fast_auth_config();
        config.hash_iterations = 0;
        assert!(matches!(
            AccountStore::new(&config),
            Err(AccountError::Hashing { .. })
        ));
    }
}
