// SPDX-FileCopyrightText: 2026 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::collector::FormState;

pub const DEFAULT_OUTPUT: &str = "challenge.yml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read form state from {0}: {1}")]
    Read(String, std::io::Error),
    #[error("Failed to parse form state from {0}: {1}")]
    Parse(String, serde_yaml::Error),
    #[error("Failed to serialize form state: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Where `generate` writes the challenge document
    pub output_path: PathBuf,
}

impl Config {
    /// Reads the configuration from the environment, loading `.env` first if present.
    pub fn from_env() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", path.to_string_lossy());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            output_path: PathBuf::from(
                lookup("CHALLENGE_OUTPUT")
                    .filter(|v| !v.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_OUTPUT.to_string()),
            ),
        }
    }
}

pub fn load_form_state(path: &Path) -> Result<FormState, ConfigError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Read(path.to_string_lossy().to_string(), e))?;
    serde_yaml::from_str(&content)
        .map_err(|e| ConfigError::Parse(path.to_string_lossy().to_string(), e))
}

pub fn form_state_to_yaml(state: &FormState) -> Result<String, ConfigError> {
    Ok(serde_yaml::to_string(state)?)
}
