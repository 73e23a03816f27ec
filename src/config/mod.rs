use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default base path shown when an endpoint is first opened. `~` is resolved
/// by the service to the endpoint owner's home directory.
pub const DEFAULT_BROWSE_PATH: &str = "/~/";

const DEFAULT_SERVICE_URL: &str = "https://transfer.api.globusonline.org/v0.10";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the transfer service API
    #[serde(default = "default_service_url")]
    pub service_url: String,

    /// Bearer token presented on every API request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// Endpoint id of this machine's connect-personal installation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personal_endpoint: Option<String>,

    /// Path a freshly opened endpoint starts browsing at
    #[serde(default = "default_browse_path")]
    pub default_path: String,
}

fn default_service_url() -> String {
    DEFAULT_SERVICE_URL.to_string()
}

fn default_browse_path() -> String {
    DEFAULT_BROWSE_PATH.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service_url: default_service_url(),
            access_token: None,
            personal_endpoint: None,
            default_path: default_browse_path(),
        }
    }
}

impl AppConfig {
    /// Get the config file path
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("hakobu");

        if let Err(e) = std::fs::create_dir_all(&config_dir) {
            tracing::warn!("Could not create config directory: {}", e);
        }

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        let path = match Self::config_path() {
            Ok(p) => p,
            Err(_) => return Ok(AppConfig::default()),
        };

        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return Ok(config),
                    Err(e) => tracing::warn!("Failed to parse config: {}", e),
                },
                Err(e) => tracing::warn!("Failed to read config: {}", e),
            }
        }

        let config = AppConfig::default();
        let _ = config.save();
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Service base URL, overridable via HAKOBU_SERVICE_URL
    pub fn service_url(&self) -> String {
        match std::env::var("HAKOBU_SERVICE_URL") {
            Ok(url) if !url.trim().is_empty() => url.trim().to_string(),
            _ => self.service_url.clone(),
        }
    }

    /// Bearer token, overridable via HAKOBU_TOKEN
    pub fn access_token(&self) -> Option<String> {
        match std::env::var("HAKOBU_TOKEN") {
            Ok(token) if !token.trim().is_empty() => Some(token.trim().to_string()),
            _ => self.access_token.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serialization() {
        let config = AppConfig {
            service_url: "https://transfer.example.org/v0.10".to_string(),
            access_token: Some("tok".to_string()),
            personal_endpoint: Some("my-laptop-id".to_string()),
            default_path: "/~/".to_string(),
        };

        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&serialized).unwrap();

        assert_eq!(config.service_url, deserialized.service_url);
        assert_eq!(config.personal_endpoint, deserialized.personal_endpoint);
        assert_eq!(config.default_path, deserialized.default_path);
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.service_url, DEFAULT_SERVICE_URL);
        assert_eq!(config.default_path, DEFAULT_BROWSE_PATH);
        assert!(config.access_token.is_none());
        assert!(config.personal_endpoint.is_none());
    }
}
