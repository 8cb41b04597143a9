use chrono::Duration;
use common::jwt::MIN_SIGNING_KEY_LENGTH;
use common::secret::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8083";
pub const DEFAULT_MIN_USERNAME_LENGTH: u32 = 6;
pub const DEFAULT_MIN_EMAIL_LENGTH: u32 = 6;
pub const DEFAULT_MIN_PASSWORD_LENGTH: u32 = 8;
pub const DEFAULT_TOKEN_MINUTES: u32 = 60;
pub const DEFAULT_MAX_TOKEN_MINUTES: u32 = 60;
pub const DEFAULT_ACTIVATION_WINDOW_HOURS: u32 = 24;

/// Shortest token lifetime a caller may request, in seconds.
pub const MIN_REQUESTED_TOKEN_SECONDS: u32 = 5;

/// Thresholds shared by the validation rules and the orchestrators.
///
/// All values are positive; `max_token_seconds` bounds every issued token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleConfig {
    pub min_username_length: usize,
    pub min_email_length: usize,
    pub min_password_length: usize,
    pub max_token_seconds: u32,
    pub activation_window: Duration,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            min_username_length: DEFAULT_MIN_USERNAME_LENGTH as usize,
            min_email_length: DEFAULT_MIN_EMAIL_LENGTH as usize,
            min_password_length: DEFAULT_MIN_PASSWORD_LENGTH as usize,
            max_token_seconds: DEFAULT_MAX_TOKEN_MINUTES * 60,
            activation_window: Duration::hours(i64::from(DEFAULT_ACTIVATION_WINDOW_HOURS)),
        }
    }
}

/// Token issuing parameters.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub issuer: String,
    pub signing_key: SecretString,
    pub default_lifetime_seconds: u32,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    pub rules: RuleConfig,
    pub token: TokenConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Invalid token signing key: {0}")]
    InvalidSigningKey(String),
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing)
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_url = required(vars, "DATABASE_URL")?;

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let issuer = required(vars, "TOKEN_ISSUER")?;
        if issuer.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "TOKEN_ISSUER".to_string(),
                reason: "must not be blank".to_string(),
            });
        }

        let signing_key = SecretString::from(required(vars, "TOKEN_SECRET")?);
        let key_length = signing_key.expose_secret().chars().count();
        if key_length < MIN_SIGNING_KEY_LENGTH {
            return Err(ConfigError::InvalidSigningKey(format!(
                "Expected at least {} characters, got {}",
                MIN_SIGNING_KEY_LENGTH, key_length
            )));
        }

        let default_minutes = positive(vars, "TOKEN_DEFAULT_MINUTES", DEFAULT_TOKEN_MINUTES)?;
        let max_minutes = positive(vars, "TOKEN_MAX_MINUTES", DEFAULT_MAX_TOKEN_MINUTES)?;
        if default_minutes > max_minutes {
            return Err(ConfigError::InvalidValue {
                key: "TOKEN_DEFAULT_MINUTES".to_string(),
                reason: format!("must not exceed TOKEN_MAX_MINUTES ({})", max_minutes),
            });
        }

        let window_hours = positive(
            vars,
            "ACTIVATION_WINDOW_HOURS",
            DEFAULT_ACTIVATION_WINDOW_HOURS,
        )?;
        let activation_window =
            Duration::try_hours(i64::from(window_hours)).ok_or_else(|| {
                ConfigError::InvalidValue {
                    key: "ACTIVATION_WINDOW_HOURS".to_string(),
                    reason: "out of range".to_string(),
                }
            })?;

        let rules = RuleConfig {
            min_username_length: positive(
                vars,
                "MIN_USERNAME_LENGTH",
                DEFAULT_MIN_USERNAME_LENGTH,
            )? as usize,
            min_email_length: positive(vars, "MIN_EMAIL_LENGTH", DEFAULT_MIN_EMAIL_LENGTH)?
                as usize,
            min_password_length: positive(
                vars,
                "MIN_PASSWORD_LENGTH",
                DEFAULT_MIN_PASSWORD_LENGTH,
            )? as usize,
            max_token_seconds: minutes_to_seconds("TOKEN_MAX_MINUTES", max_minutes)?,
            activation_window,
        };

        Ok(Config {
            database_url,
            bind_address,
            rules,
            token: TokenConfig {
                issuer,
                signing_key,
                default_lifetime_seconds: minutes_to_seconds(
                    "TOKEN_DEFAULT_MINUTES",
                    default_minutes,
                )?,
            },
        })
    }
}

fn required(vars: &HashMap<String, String>, key: &str) -> Result<String, ConfigError> {
    vars.get(key)
        .cloned()
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Parse an optional positive integer, falling back to `default` when unset.
fn positive<T>(vars: &HashMap<String, String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + Default,
{
    let Some(raw) = vars.get(key) else {
        return Ok(default);
    };

    let value = raw.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        reason: format!("'{}' is not a valid number", raw),
    })?;

    if value <= T::default() {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }

    Ok(value)
}

fn minutes_to_seconds(key: &str, minutes: u32) -> Result<u32, ConfigError> {
    minutes
        .checked_mul(60)
        .ok_or_else(|| ConfigError::InvalidValue {
            key: key.to_string(),
            reason: "out of range".to_string(),
        })
}
