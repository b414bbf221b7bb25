use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::connector::adapter::defaults;
use crate::domain::DomainError;

pub const TELEGRAM_TOKEN_VAR: &str = "TELEGRAM_TOKEN";
pub const GOOGLE_API_KEY_VAR: &str = "GOOGLE_API_KEY";
pub const STABILITY_API_KEY_VAR: &str = "STABILITY_API_KEY";

/// Runtime configuration, read from the environment.
///
/// | Variable             | Required | Default                                      |
/// |----------------------|----------|----------------------------------------------|
/// | `TELEGRAM_TOKEN`     | yes      |                                              |
/// | `GOOGLE_API_KEY`     | yes      |                                              |
/// | `STABILITY_API_KEY`  | yes      |                                              |
/// | `GEMINI_MODEL`       | no       | `gemini-1.5-flash-latest`                    |
/// | `GEMINI_BASE_URL`    | no       | `https://generativelanguage.googleapis.com`  |
/// | `STABILITY_ENGINE`   | no       | `stable-diffusion-xl-1024-v1-0`              |
/// | `STABILITY_BASE_URL` | no       | `https://api.stability.ai`                   |
/// | `TELEGRAM_API_URL`   | no       | `https://api.telegram.org`                   |
#[derive(Clone)]
pub struct BotConfig {
    pub telegram_token: String,
    pub gemini_api_key: String,
    pub stability_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub stability_engine: String,
    pub stability_base_url: String,
    pub telegram_api_url: String,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, DomainError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read a dotenv-style file. Variables already set in the process
    /// environment take precedence over the file.
    pub fn from_env_file(path: &Path) -> Result<Self, DomainError> {
        let entries = dotenvy::from_path_iter(path).map_err(|e| {
            DomainError::configuration(format!("cannot read {}: {e}", path.display()))
        })?;

        let mut values = HashMap::new();
        for entry in entries {
            let (name, value) = entry.map_err(|e| {
                DomainError::configuration(format!("invalid line in {}: {e}", path.display()))
            })?;
            values.insert(name, value);
        }

        Self::from_lookup(|name| {
            std::env::var(name)
                .ok()
                .or_else(|| values.get(name).cloned())
        })
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, DomainError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let required = [TELEGRAM_TOKEN_VAR, GOOGLE_API_KEY_VAR, STABILITY_API_KEY_VAR];
        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|name| value(name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(DomainError::configuration(format!(
                "missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        let or_default = |name: &str, default: &str| value(name).unwrap_or_else(|| default.to_string());

        Ok(Self {
            telegram_token: value(TELEGRAM_TOKEN_VAR).unwrap_or_default(),
            gemini_api_key: value(GOOGLE_API_KEY_VAR).unwrap_or_default(),
            stability_api_key: value(STABILITY_API_KEY_VAR).unwrap_or_default(),
            gemini_model: or_default("GEMINI_MODEL", defaults::GEMINI_MODEL),
            gemini_base_url: or_default("GEMINI_BASE_URL", defaults::GEMINI_BASE_URL),
            stability_engine: or_default("STABILITY_ENGINE", defaults::STABILITY_ENGINE),
            stability_base_url: or_default("STABILITY_BASE_URL", defaults::STABILITY_BASE_URL),
            telegram_api_url: or_default("TELEGRAM_API_URL", defaults::TELEGRAM_API_URL),
        })
    }
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("telegram_token", &"[REDACTED]")
            .field("gemini_api_key", &"[REDACTED]")
            .field("stability_api_key", &"[REDACTED]")
            .field("gemini_model", &self.gemini_model)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("stability_engine", &self.stability_engine)
            .field("stability_base_url", &self.stability_base_url)
            .field("telegram_api_url", &self.telegram_api_url)
            .finish()
    }
}
