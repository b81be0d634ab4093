use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use nag_api::token::DEV_SECRET;

/// JWT secrets that are known to the world and MUST NOT be used in production.
const PLACEHOLDER_SECRETS: &[&str] = &[
    DEV_SECRET,
    "change-me-to-a-random-string",
    "your-super-secret-jwt-key-change-in-production",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },

    #[error("NAG_JWT_SECRET is unset or still a placeholder while NAG_REQUIRE_JWT_SECRET is on")]
    InsecureSecret,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    /// True when the secret came from the fallback or a known placeholder.
    pub insecure_secret: bool,
    pub strict_ownership: bool,
    /// Empty means any origin.
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests need not touch the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("NAG_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = match lookup("NAG_PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                var: "NAG_PORT",
                value: raw,
            })?,
            None => 8080,
        };
        let db_path = lookup("NAG_DB_PATH").unwrap_or_else(|| "nag.db".into()).into();

        let jwt_secret = lookup("NAG_JWT_SECRET")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEV_SECRET.into());
        let insecure_secret = PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str());
        if insecure_secret && parse_flag(&lookup, "NAG_REQUIRE_JWT_SECRET")? {
            return Err(ConfigError::InsecureSecret);
        }

        let strict_ownership = parse_flag(&lookup, "NAG_STRICT_OWNERSHIP")?;

        let cors_origins = lookup("NAG_CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            host,
            port,
            db_path,
            jwt_secret,
            insecure_secret,
            strict_ownership,
            cors_origins,
        })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

fn parse_flag<F>(lookup: &F, var: &'static str) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var).as_deref().map(str::to_ascii_lowercase).as_deref() {
        None | Some("") | Some("0") | Some("false") | Some("no") => Ok(false),
        Some("1") | Some("true") | Some("yes") => Ok(true),
        Some(other) => Err(ConfigError::Invalid {
            var,
            value: other.to_string(),
        }),
    }
}
