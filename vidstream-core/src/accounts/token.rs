//! Signed access tokens (HS256 JWTs)

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use super::AccountResult;
use super::types::UserAccount;
use crate::config::AuthConfig;

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Account id
    pub sub: String,
    pub username: String,
    /// Issued at, seconds since the epoch
    pub iat: u64,
    /// Expiry, seconds since the epoch
    pub exp: u64,
}

/// Signs and verifies access tokens with one shared secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    /// Issuer signing with `secret`, tokens valid for `ttl`.
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    /// Issuer for `config`, with a random per-process secret when none is set.
    pub fn from_config(config: &AuthConfig) -> Self {
        match &config.jwt_secret {
            Some(secret) => Self::new(secret.as_bytes(), config.token_ttl),
            None => {
                warn!("VIDSTREAM_JWT_SECRET not set; access tokens will not survive a restart");
                let secret = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
                Self::new(secret.as_bytes(), config.token_ttl)
            }
        }
    }

    /// Sign a token for `account`.
    ///
    /// # Errors
    /// - `AccountError::Token` - Signing failed
    pub fn issue(&self, account: &UserAccount) -> AccountResult<String> {
        let iat = unix_now();
        let claims = AccessClaims {
            sub: account.id.to_string(),
            username: account.username.clone(),
            iat,
            exp: iat.saturating_add(self.ttl.as_secs()),
        };
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding,
        )?)
    }

    /// Check signature and expiry of `token`.
    ///
    /// # Errors
    /// - `AccountError::Token` - Malformed, wrongly signed or expired token
    pub fn verify(&self, token: &str) -> AccountResult<AccessClaims> {
        let data = jsonwebtoken::decode::<AccessClaims>(token, &self.decoding, &self.validation)?;
        Ok(data.claims)
    }
}

fn unix_now() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::AccountError;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    fn account() -> UserAccount {
        UserAccount {
            id: Uuid::new_v4(),
            username: "dummy@dummy.com".to_string(),
            password_hash: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_issued_token_verifies_to_account() {
        let issuer = TokenIssuer::new(SECRET, Duration::from_secs(60));
        let account = account();

        let token = issuer.issue(&account).unwrap();
        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.sub, account.id.to_string());
        assert_eq!(claims.username, account.username);
        assert_eq!(claims.exp - claims.iat, 60);
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let token = TokenIssuer::new(SECRET, Duration::from_secs(60))
            .issue(&account())
            .unwrap();
        let other = TokenIssuer::new(b"another secret of thirty-two byte", Duration::from_secs(60));
        assert!(matches!(other.verify(&token), Err(AccountError::Token { .. })));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let issuer = TokenIssuer::new(SECRET, Duration::from_secs(60));
        let claims = AccessClaims {
            sub: Uuid::new_v4().to_string(),
            username: "old".to_string(),
            iat: unix_now() - 120,
            exp: unix_now() - 60,
        };
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert!(issuer.verify(&token).is_err());
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        let issuer = TokenIssuer::new(SECRET, Duration::from_secs(60));
        assert!(issuer.verify("not.a.jwt").is_err());
        assert!(issuer.verify("").is_err());
    }

    #[test]
    fn test_random_secrets_differ_between_issuers() {
        let config = AuthConfig::default();
        let token = TokenIssuer::from_config(&config).issue(&account()).unwrap();
        assert!(TokenIssuer::from_config(&config).verify(&token).is_err());
    }
}
