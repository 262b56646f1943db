// ============================
// luxe-backend-lib/src/config.rs
// ============================
//! Configuration management.
//!
//! Settings are read once at process start (defaults, then a TOML file,
//! then `LUXE_*` environment variables) and shared immutably afterwards.
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::auth::token_generator::generate_secure_token_with_size;
use crate::validation::meets_minimum_length;

/// Config file read when no explicit path is given
pub const DEFAULT_CONFIG_FILE: &str = "luxe.toml";

/// Prefix of environment overrides, e.g. `LUXE_JWT_SECRET`
pub const ENV_PREFIX: &str = "LUXE_";

/// Floor for the configurable minimum password length
pub const MIN_PASSWORD_LENGTH_FLOOR: usize = 6;

/// Longest accepted session lifetime, in days
pub const MAX_SESSION_TTL_DAYS: u32 = 365;

const MIN_PRODUCTION_SECRET_LEN: usize = 32;
const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Where the server runs. Drives cookie security flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentMode {
    #[default]
    Development,
    Production,
}

impl DeploymentMode {
    pub fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// A string that never shows up in `Debug` output
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretString(***)")
    }
}

/// OAuth client registration with Google
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleSettings {
    pub client_id: String,
    pub client_secret: SecretString,
    /// Must match the redirect URI registered with Google, e.g.
    /// `http://localhost:4000/auth/google/callback`
    pub redirect_url: Url,
}

/// Admin account created at startup when its email is not taken yet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapAdmin {
    pub name: String,
    pub email: String,
    pub password: SecretString,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Root directory of the flat-file user store
    pub data_dir: PathBuf,
    /// Log level
    pub log_level: String,
    /// Log output format
    pub log_format: LogFormat,
    /// Deployment mode
    pub mode: DeploymentMode,
    /// HMAC key used to sign session tokens
    pub jwt_secret: SecretString,
    /// Lifetime of a session token and its cookie, in days
    pub session_ttl_days: u32,
    /// Minimum accepted password length at registration
    pub min_password_length: usize,
    /// scrypt cost parameter (log2 of N)
    pub password_hash_log_n: u8,
    /// Upper bound for a single user store call, in milliseconds
    pub store_timeout_ms: u64,
    /// Browser-facing frontend; also the only allowed CORS origin
    pub frontend_url: Url,
    /// Google sign-in, disabled when absent
    pub google: Option<GoogleSettings>,
    /// Optional admin seeded at startup
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 4000)),
            data_dir: PathBuf::from("data"),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            mode: DeploymentMode::Development,
            jwt_secret: SecretString::default(),
            session_ttl_days: 30,
            min_password_length: MIN_PASSWORD_LENGTH_FLOOR,
            password_hash_log_n: 15,
            store_timeout_ms: 5_000,
            frontend_url: Url::parse("http://localhost:3000").expect("static URL is valid"),
            google: None,
            bootstrap_admin: None,
        }
    }
}

impl Settings {
    /// Load settings from `luxe.toml` and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load settings from the given TOML file and the environment.
    /// A missing file is not an error; environment variables take precedence.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let settings: Settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| ConfigError::Load(e.to_string()))?;
        settings.finalize()
    }

    /// Fill in a throwaway signing secret in development and validate
    pub fn finalize(mut self) -> Result<Self, ConfigError> {
        if self.jwt_secret.is_empty() && !self.mode.is_production() {
            tracing::warn!(
                "jwt_secret not set, using a randomly generated secret (sessions will not survive a restart)"
            );
            self.jwt_secret = SecretString::new(generate_secure_token_with_size(48));
        }
        self.validate()?;
        Ok(self)
    }

    /// Check that the settings are usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "unknown log level '{}'",
                self.log_level
            )));
        }
        if !(1..=MAX_SESSION_TTL_DAYS).contains(&self.session_ttl_days) {
            return Err(ConfigError::Invalid(format!(
                "session_ttl_days must be within 1..={MAX_SESSION_TTL_DAYS}"
            )));
        }
        if self.store_timeout_ms == 0 {
            return Err(ConfigError::Invalid("store_timeout_ms must be positive".into()));
        }
        if self.min_password_length < MIN_PASSWORD_LENGTH_FLOOR {
            return Err(ConfigError::Invalid(format!(
                "min_password_length must be at least {MIN_PASSWORD_LENGTH_FLOOR}"
            )));
        }
        if !(10..=20).contains(&self.password_hash_log_n) {
            return Err(ConfigError::Invalid(
                "password_hash_log_n must be within 10..=20".into(),
            ));
        }
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::Invalid("jwt_secret must be set".into()));
        }
        if self.mode.is_production() && self.jwt_secret.expose().len() < MIN_PRODUCTION_SECRET_LEN {
            return Err(ConfigError::Invalid(format!(
                "jwt_secret must be at least {MIN_PRODUCTION_SECRET_LEN} bytes in production"
            )));
        }
        if let Some(admin) = &self.bootstrap_admin {
            if !meets_minimum_length(admin.password.expose(), self.min_password_length) {
                return Err(ConfigError::Invalid(
                    "bootstrap_admin password is shorter than min_password_length".into(),
                ));
            }
        }
        Ok(())
    }

    /// Lifetime of session tokens and session cookies
    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.session_ttl_days))
    }

    /// Upper bound for a single user store call
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Origin allowed by CORS, derived from `frontend_url`
    pub fn cors_origin(&self) -> String {
        self.frontend_url.origin().ascii_serialization()
    }
}
