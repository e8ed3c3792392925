// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Cloud Run injects secrets as environment variables via secret bindings,
//! so everything is read once at startup.

use std::env;

/// Default TikTok Open API base (v2).
pub const DEFAULT_TIKTOK_API_URL: &str = "https://open.tiktokapis.com/v2";

/// Posts a single tenant may publish per UTC day.
pub const DAILY_POST_LIMIT: u32 = 10;

/// Which SettingsStore implementation backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsBackend {
    Firestore,
    /// Process-local store, for local development only.
    Memory,
}

impl std::str::FromStr for SettingsBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(Self::Firestore),
            "memory" => Ok(Self::Memory),
            _ => Err(ConfigError::Invalid("SETTINGS_BACKEND", s.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// TikTok OAuth client key (public)
    pub tiktok_client_key: String,
    /// TikTok Open API base URL
    pub tiktok_api_url: String,
    /// Public base URL that storage keys are resolved against
    pub media_base_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Per-tenant daily post quota
    pub daily_post_limit: u32,
    pub settings_backend: SettingsBackend,

    // --- Secrets ---
    /// TikTok OAuth client secret
    pub tiktok_client_secret: String,
    /// Shared bearer token the dispatcher presents on every invocation
    pub invoke_token: String,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            tiktok_client_key: "test_client_key".to_string(),
            tiktok_api_url: DEFAULT_TIKTOK_API_URL.to_string(),
            media_base_url: "https://media.example.com".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            daily_post_limit: DAILY_POST_LIMIT,
            settings_backend: SettingsBackend::Memory,
            tiktok_client_secret: "test_secret".to_string(),
            invoke_token: "test_invoke_token".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file is honoured for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let settings_backend = match env::var("SETTINGS_BACKEND") {
            Ok(v) => v.parse()?,
            Err(_) => SettingsBackend::Firestore,
        };

        let daily_post_limit = match env::var("DAILY_POST_LIMIT") {
            Ok(v) => v
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid("DAILY_POST_LIMIT", v.clone()))?,
            Err(_) => DAILY_POST_LIMIT,
        };

        Ok(Self {
            tiktok_client_key: env::var("TIKTOK_CLIENT_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("TIKTOK_CLIENT_KEY"))?,
            tiktok_api_url: env::var("TIKTOK_API_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_TIKTOK_API_URL.to_string()),
            media_base_url: env::var("MEDIA_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "https://viraltenant.com".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            daily_post_limit,
            settings_backend,

            tiktok_client_secret: env::var("TIKTOK_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("TIKTOK_CLIENT_SECRET"))?,
            invoke_token: env::var("CROSSPOST_INVOKE_TOKEN")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("CROSSPOST_INVOKE_TOKEN"))?,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        // Set required env vars for test
        env::set_var("TIKTOK_CLIENT_KEY", "test_key");
        env::set_var("TIKTOK_CLIENT_SECRET", " test_secret \n");
        env::set_var("CROSSPOST_INVOKE_TOKEN", "invoke");
        env::set_var("SETTINGS_BACKEND", "memory");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.tiktok_client_key, "test_key");
        assert_eq!(config.tiktok_client_secret, "test_secret");
        assert_eq!(config.settings_backend, SettingsBackend::Memory);
        assert_eq!(config.daily_post_limit, DAILY_POST_LIMIT);
    }

    #[test]
    fn test_settings_backend_parse() {
        assert_eq!(
            "Firestore".parse::<SettingsBackend>().unwrap(),
            SettingsBackend::Firestore
        );
        assert!("dynamo".parse::<SettingsBackend>().is_err());
    }
}
