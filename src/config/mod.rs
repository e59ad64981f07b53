// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Application configuration
//!
//! Both apps read their settings from environment variables (after `.env`
//! is loaded by the binary) with credentials optionally coming from a TOML
//! secrets file. A missing or malformed credential is reported as
//! [`ConfigError`]; the binaries then serve a warning page instead of the
//! app.

pub mod secrets;

use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

pub use secrets::SecretsStore;

/// Default upload limit (20 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Prefix every OpenAI secret key starts with
pub const OPENAI_KEY_PREFIX: &str = "sk-";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{key} not found. Set it in {secrets_file} ({key}) or as the environment variable {key}.")]
    Missing { key: String, secrets_file: String },

    #[error("{key} is invalid: {reason}. Set it in {secrets_file} or as environment variable.")]
    Malformed {
        key: String,
        reason: String,
        secrets_file: String,
    },

    #[error("Failed to read secrets file {path}: {reason}")]
    SecretsFile { path: String, reason: String },

    #[error("Invalid value for {key}: {reason}")]
    InvalidSetting { key: String, reason: String },
}

/// Resolve a credential: secrets store first, then the environment lookup
pub fn resolve_credential<F>(secrets: &SecretsStore, key: &str, lookup: &F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    secrets
        .get(key)
        .map(str::to_string)
        .or_else(|| lookup(key))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Redact a secret for logging, keeping only a short prefix
pub fn redact(secret: &str) -> String {
    let prefix: String = secret.chars().take(4).collect();
    format!("{}…", prefix)
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn parse_setting<T, F>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidSetting {
            key: key.to_string(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

/// Configuration for the food scanner
#[derive(Debug, Clone)]
pub struct FoodScannerConfig {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub vision_model: String,
    pub listen_addr: SocketAddr,
    pub max_upload_bytes: usize,
}

impl FoodScannerConfig {
    pub const API_KEY: &'static str = "OPENAI_API_KEY";

    /// Load configuration from the secrets file and environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let secrets = SecretsStore::from_env()?;
        Self::from_sources(&secrets, &env_lookup)
    }

    pub fn from_sources<F>(secrets: &SecretsStore, lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let openai_api_key = resolve_credential(secrets, Self::API_KEY, lookup).ok_or_else(|| {
            ConfigError::Missing {
                key: Self::API_KEY.to_string(),
                secrets_file: secrets.location(),
            }
        })?;
        if !openai_api_key.starts_with(OPENAI_KEY_PREFIX) {
            return Err(ConfigError::Malformed {
                key: Self::API_KEY.to_string(),
                reason: format!("expected a key starting with '{}'", OPENAI_KEY_PREFIX),
                secrets_file: secrets.location(),
            });
        }

        Ok(Self {
            openai_api_key,
            openai_base_url: lookup("OPENAI_BASE_URL")
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            vision_model: lookup("OPENAI_VISION_MODEL").unwrap_or_else(|| "gpt-4o".to_string()),
            listen_addr: parse_setting(lookup, "FOOD_SCANNER_ADDR", default_addr(8501))?,
            max_upload_bytes: parse_setting(lookup, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
        })
    }

    /// Listen address even when the credential is unusable (halted mode)
    pub fn listen_addr_from_env() -> SocketAddr {
        parse_setting(&env_lookup, "FOOD_SCANNER_ADDR", default_addr(8501))
            .unwrap_or_else(|_| default_addr(8501))
    }
}

/// Configuration for the RAGified Reader
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub listen_addr: SocketAddr,
    pub max_upload_bytes: usize,
    pub max_sessions: usize,
    pub session_idle_timeout: Duration,
}

impl ReaderConfig {
    pub const API_KEY: &'static str = "GEMINI_API_KEY";

    /// Load configuration from the secrets file and environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let secrets = SecretsStore::from_env()?;
        Self::from_sources(&secrets, &env_lookup)
    }

    pub fn from_sources<F>(secrets: &SecretsStore, lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let gemini_api_key = resolve_credential(secrets, Self::API_KEY, lookup).ok_or_else(|| {
            ConfigError::Missing {
                key: Self::API_KEY.to_string(),
                secrets_file: secrets.location(),
            }
        })?;

        let idle_secs: u64 = parse_setting(lookup, "SESSION_IDLE_TIMEOUT_SECS", 1800)?;

        Ok(Self {
            gemini_api_key,
            gemini_base_url: lookup("GEMINI_BASE_URL").unwrap_or_else(|| {
                "https://generativelanguage.googleapis.com/v1beta".to_string()
            }),
            chat_model: lookup("GEMINI_CHAT_MODEL")
                .unwrap_or_else(|| "gemini-2.0-flash".to_string()),
            embedding_model: lookup("GEMINI_EMBEDDING_MODEL")
                .unwrap_or_else(|| "models/embedding-001".to_string()),
            listen_addr: parse_setting(lookup, "READER_ADDR", default_addr(8502))?,
            max_upload_bytes: parse_setting(lookup, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            max_sessions: parse_setting(lookup, "MAX_SESSIONS", 1000)?,
            session_idle_timeout: Duration::from_secs(idle_secs),
        })
    }

    /// Listen address even when the credential is unusable (halted mode)
    pub fn listen_addr_from_env() -> SocketAddr {
        parse_setting(&env_lookup, "READER_ADDR", default_addr(8502))
            .unwrap_or_else(|_| default_addr(8502))
    }
}

fn default_addr(port: u16) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], port))
}
