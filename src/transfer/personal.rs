//! Lookup of the user's personal endpoint id.
//!
//! A locally installed connect-personal agent registers an endpoint id for
//! this machine. The id is taken from the environment when set, falling back
//! to the config file; there is no network discovery.

use crate::config::AppConfig;

pub const PERSONAL_ENDPOINT_ENV: &str = "HAKOBU_PERSONAL_ENDPOINT";

/// Resolve the personal endpoint id, if one is configured.
pub fn personal_endpoint_id(config: &AppConfig) -> Option<String> {
    if let Ok(id) = std::env::var(PERSONAL_ENDPOINT_ENV) {
        let id = id.trim().to_string();
        if !id.is_empty() {
            return Some(id);
        }
    }
    config.personal_endpoint.clone()
}
