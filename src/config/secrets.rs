// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! TOML secrets store
//!
//! Credentials may live in a flat TOML file (`OPENAI_API_KEY = "sk-..."`)
//! instead of the environment. Keys found here win over environment
//! variables.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::ConfigError;

/// Default location of the secrets file, relative to the working directory
pub const DEFAULT_SECRETS_FILE: &str = ".streamlit/secrets.toml";

/// Environment variable that overrides the secrets file location
pub const SECRETS_FILE_ENV: &str = "SECRETS_FILE";

#[derive(Debug, Clone, Default)]
pub struct SecretsStore {
    path: Option<PathBuf>,
    values: HashMap<String, String>,
}

impl SecretsStore {
    /// Store with no backing file
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load secrets from a TOML file.
    ///
    /// A missing file is not an error (the environment may hold the
    /// credential instead); an unreadable or malformed file is.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No secrets file at {}", path.display());
            return Ok(Self {
                path: Some(path.to_path_buf()),
                values: HashMap::new(),
            });
        }

        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::SecretsFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let mut store = Self::parse(&raw).map_err(|reason| ConfigError::SecretsFile {
            path: path.display().to_string(),
            reason,
        })?;
        store.path = Some(path.to_path_buf());
        debug!("Loaded {} secret(s) from {}", store.values.len(), path.display());
        Ok(store)
    }

    /// Load from `SECRETS_FILE` or the default location
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var(SECRETS_FILE_ENV)
            .unwrap_or_else(|_| DEFAULT_SECRETS_FILE.to_string());
        Self::load(path)
    }

    /// Parse TOML text; only top-level string values are kept
    pub fn parse(raw: &str) -> Result<Self, String> {
        let table: toml::Table = toml::from_str(raw).map_err(|e| e.to_string())?;
        let values = table
            .into_iter()
            .filter_map(|(k, v)| match v {
                toml::Value::String(s) => Some((k, s)),
                _ => None,
            })
            .collect();
        Ok(Self { path: None, values })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Where the secrets were (or would have been) read from
    pub fn location(&self) -> String {
        self.path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| DEFAULT_SECRETS_FILE.to_string())
    }
}
