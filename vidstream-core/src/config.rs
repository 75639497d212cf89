//! Centralized configuration for Vidstream.
//!
//! All tunable parameters and settings are defined here to avoid
//! hard-coded values scattered throughout the codebase.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::Level;

use crate::streaming::DEFAULT_CHUNK_SIZE;

/// Shortest accepted signing secret, in bytes.
pub const MIN_JWT_SECRET_BYTES: usize = 32;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A setting has an unusable value
    #[error("Invalid {setting}: {reason}")]
    Invalid {
        /// Environment variable or field name
        setting: &'static str,
        /// What is wrong with the value
        reason: String,
    },
}

/// Central configuration for all Vidstream components.
///
/// Groups related configuration settings into logical sections.
/// Supports environment variable overrides for runtime customization.
#[derive(Debug, Clone, Default)]
pub struct VidstreamConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    /// Port to bind, 0 picks an ephemeral port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    /// Socket address to bind.
    ///
    /// # Errors
    /// - `ConfigError::Invalid` - Host and port do not form a socket address
    pub fn bind_address(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::Invalid {
                setting: "VIDSTREAM_HOST",
                reason: format!("{}: {e}", self.host),
            })
    }
}

/// Upload storage and disk I/O configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory uploaded videos are written to
    pub uploads_dir: PathBuf,
    /// Size of chunks read from disk while streaming
    pub read_chunk_size: usize,
    /// Largest accepted upload in bytes
    pub max_upload_bytes: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            uploads_dir: PathBuf::from("uploads"),
            read_chunk_size: DEFAULT_CHUNK_SIZE,
            max_upload_bytes: 2 * 1024 * 1024 * 1024, // 2 GiB
        }
    }
}

/// Account passwords and access tokens.
#[derive(Clone)]
pub struct AuthConfig {
    /// HMAC secret signing access tokens. When unset a random secret is
    /// generated at startup and tokens do not survive a restart.
    pub jwt_secret: Option<String>,
    /// Lifetime of an issued access token
    pub token_ttl: Duration,
    /// Argon2 memory cost in KiB
    pub hash_memory_kib: u32,
    /// Argon2 iteration count
    pub hash_iterations: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl: Duration::from_secs(60 * 60),
            hash_memory_kib: argon2::Params::DEFAULT_M_COST,
            hash_iterations: argon2::Params::DEFAULT_T_COST,
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .field("token_ttl", &self.token_ttl)
            .field("hash_memory_kib", &self.hash_memory_kib)
            .field("hash_iterations", &self.hash_iterations)
            .finish()
    }
}

/// Where logs go and how chatty the console is.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Console level for Vidstream's own crates
    pub console_level: Level,
    /// Directory holding the full debug log of the last run
    pub logs_dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            console_level: Level::INFO,
            logs_dir: PathBuf::from("logs"),
        }
    }
}

impl VidstreamConfig {
    /// Creates configuration with environment variable overrides.
    ///
    /// Allows runtime configuration via environment variables while
    /// maintaining sensible defaults. Unparsable numbers are ignored.
    ///
    /// # Errors
    /// - `ConfigError::Invalid` - `VIDSTREAM_LOG_LEVEL` is not a log level
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("VIDSTREAM_HOST") {
            config.server.host = host;
        }

        if let Some(port) = env_number("VIDSTREAM_PORT") {
            config.server.port = port;
        }

        if let Ok(dir) = std::env::var("UPLOADS_DIR") {
            config.storage.uploads_dir = PathBuf::from(dir);
        }

        if let Some(size) = env_number("VIDSTREAM_READ_CHUNK_SIZE") {
            config.storage.read_chunk_size = size;
        }

        if let Some(limit) = env_number("VIDSTREAM_MAX_UPLOAD_BYTES") {
            config.storage.max_upload_bytes = limit;
        }

        if let Ok(secret) = std::env::var("VIDSTREAM_JWT_SECRET") {
            config.auth.jwt_secret = Some(secret);
        }

        if let Some(secs) = env_number("VIDSTREAM_TOKEN_TTL_SECS") {
            config.auth.token_ttl = Duration::from_secs(secs);
        }

        if let Some(kib) = env_number("VIDSTREAM_HASH_MEMORY_KIB") {
            config.auth.hash_memory_kib = kib;
        }

        if let Some(iterations) = env_number("VIDSTREAM_HASH_ITERATIONS") {
            config.auth.hash_iterations = iterations;
        }

        if let Ok(level) = std::env::var("VIDSTREAM_LOG_LEVEL") {
            config.logging.console_level =
                Level::from_str(&level).map_err(|e| ConfigError::Invalid {
                    setting: "VIDSTREAM_LOG_LEVEL",
                    reason: format!("{level}: {e}"),
                })?;
        }

        if let Ok(dir) = std::env::var("VIDSTREAM_LOGS_DIR") {
            config.logging.logs_dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    /// Reject settings the server cannot run with.
    ///
    /// # Errors
    /// - `ConfigError::Invalid` - Empty uploads directory, zero chunk size, zero upload
    ///   limit, short signing secret, zero token lifetime or hashing costs argon2 refuses
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.uploads_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                setting: "UPLOADS_DIR",
                reason: "must be defined".to_string(),
            });
        }
        if self.storage.read_chunk_size == 0 {
            return Err(ConfigError::Invalid {
                setting: "VIDSTREAM_READ_CHUNK_SIZE",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.storage.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid {
                setting: "VIDSTREAM_MAX_UPLOAD_BYTES",
                reason: "must be greater than zero".to_string(),
            });
        }
        if let Some(secret) = &self.auth.jwt_secret
            && secret.len() < MIN_JWT_SECRET_BYTES
        {
            return Err(ConfigError::Invalid {
                setting: "VIDSTREAM_JWT_SECRET",
                reason: format!("must be at least {MIN_JWT_SECRET_BYTES} bytes"),
            });
        }
        if self.auth.token_ttl.is_zero() {
            return Err(ConfigError::Invalid {
                setting: "VIDSTREAM_TOKEN_TTL_SECS",
                reason: "must be greater than zero".to_string(),
            });
        }
        argon2::Params::new(
            self.auth.hash_memory_kib,
            self.auth.hash_iterations,
            argon2::Params::DEFAULT_P_COST,
            None,
        )
        .map_err(|e| ConfigError::Invalid {
            setting: "VIDSTREAM_HASH_MEMORY_KIB",
            reason: e.to_string(),
        })?;
        Ok(())
    }
}

fn env_number<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok()?.parse().ok()
}
