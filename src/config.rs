//! Nova Relay configuration management
//!
//! All values are environment-sourced. Provider credentials are optional at
//! startup: a missing key is reported when a dispatch is attempted, so the
//! service can come up (and receive webhooks) before credentials exist.

use serde::{Deserialize, Serialize};

/// Default Vapi API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.vapi.ai";

/// Calling-provider (Vapi) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Bearer token for the provider API (`VAPI_API_KEY`)
    pub api_key: Option<String>,

    /// Outbound phone-number identifier registered with the provider
    /// (`VAPI_PHONE_NUMBER_ID`)
    pub phone_number_id: Option<String>,

    /// Provider API base URL (`VAPI_BASE_URL`)
    pub base_url: String,

    /// Public URL the provider should push call events to
    /// (`VAPI_CALLBACK_URL`)
    pub callback_url: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            phone_number_id: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            callback_url: None,
        }
    }
}

impl ProviderConfig {
    /// Load provider configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            api_key: env_opt("VAPI_API_KEY"),
            phone_number_id: env_opt("VAPI_PHONE_NUMBER_ID"),
            base_url: env_opt("VAPI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            callback_url: env_opt("VAPI_CALLBACK_URL"),
        }
    }
}

/// Main relay configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Provider configuration
    pub provider: ProviderConfig,

    /// Allowed CORS origins; empty means any origin
    /// (`NOVA_RELAY_CORS_ORIGINS`, comma-separated)
    pub cors_origins: Vec<String>,
}

impl RelayConfig {
    /// Load the full relay configuration from environment variables.
    pub fn from_env() -> Self {
        let cors_origins = env_opt("NOVA_RELAY_CORS_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            provider: ProviderConfig::from_env(),
            cors_origins,
        }
    }
}

/// Read an environment variable, treating empty/whitespace values as unset.
fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_base_url() {
        let config = ProviderConfig::default();
        assert_eq!(config.base_url, "https://api.vapi.ai");
        assert!(config.api_key.is_none());
        assert!(config.phone_number_id.is_none());
    }

    #[test]
    fn test_env_opt_ignores_empty() {
        std::env::set_var("NOVA_RELAY_TEST_EMPTY", "  ");
        assert!(env_opt("NOVA_RELAY_TEST_EMPTY").is_none());
        std::env::set_var("NOVA_RELAY_TEST_SET", "value");
        assert_eq!(env_opt("NOVA_RELAY_TEST_SET").as_deref(), Some("value"));
    }

    #[test]
    fn test_relay_config_default_has_open_cors() {
        let config = RelayConfig::default();
        assert!(config.cors_origins.is_empty());
    }
}
