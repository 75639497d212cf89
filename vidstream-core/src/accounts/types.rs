//! Account records and their request/response shapes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AccountError, AccountResult};

/// Stored account
#[derive(Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub id: Uuid,
    pub username: String,
    /// PHC-formatted argon2 hash
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for UserAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserAccount")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// Client-facing view of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl From<&UserAccount> for UserDto {
    fn from(account: &UserAccount) -> Self {
        Self {
            id: account.id,
            username: account.username.clone(),
            created_at: account.created_at,
        }
    }
}

/// Body of a registration request.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl RegisterRequest {
    /// Both fields must be non-blank.
    ///
    /// # Errors
    /// - `AccountError::Validation` - Username or password empty
    pub fn validate(&self) -> AccountResult<()> {
        for (field, value) in [("username", &self.username), ("password", &self.password)] {
            if value.trim().is_empty() {
                return Err(AccountError::Validation {
                    field,
                    reason: "must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_rejects_extra_and_missing_fields() {
        let extra: Result<RegisterRequest, _> = serde_json::from_str(
            r#"{"username": "dummy@dummy.com", "password": "dummy", "extraField": "x"}"#,
        );
        assert!(extra.is_err());

        let missing: Result<RegisterRequest, _> =
            serde_json::from_str(r#"{"password": "dummy"}"#);
        assert!(missing.is_err());
    }

    #[test]
    fn test_register_request_validation() {
        let request = RegisterRequest {
            username: "dummy@dummy.com".to_string(),
            password: " ".to_string(),
        };
        match request.validate() {
            Err(AccountError::Validation { field, .. }) => assert_eq!(field, "password"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_debug_output_hides_secrets() {
        let request = RegisterRequest {
            username: "alice".to_string(),
            password: "correct horse".to_string(),
        };
        assert!(!format!("{request:?}").contains("correct horse"));

        let account = UserAccount {
            id: Uuid::nil(),
            username: "alice".to_string(),
            password_hash: "$argon2id$v=19$secret".to_string(),
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        };
        assert!(!format!("{account:?}").contains("argon2id"));
    }

    #[test]
    fn test_user_dto_serializes_camel_case_without_hash() {
        let account = UserAccount {
            id: Uuid::nil(),
            username: "alice".to_string(),
            password_hash: "$argon2id$v=19$secret".to_string(),
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        };
        let json = serde_json::to_value(UserDto::from(&account)).unwrap();
        assert_eq!(json["username"], "alice");
        assert!(json.get("createdAt").is_some());
        assert!(!json.to_string().contains("argon2id"));
    }
}
