//! Gateway configuration types.

use std::time::Duration;

use serde::Deserialize;

use peoplehub_auth::AuthConfig;

/// Configuration for the gateway service.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Listen address (e.g., "0.0.0.0:3000").
    #[serde(default = "GatewayConfig::default_listen_addr")]
    pub listen_addr: String,

    /// Path of the login page; guarded pages redirect here.
    #[serde(default = "GatewayConfig::default_login_path")]
    pub login_path: String,

    /// Page paths served without a session. The login page is always included.
    #[serde(default = "GatewayConfig::default_public_paths")]
    pub public_paths: Vec<String>,

    /// Maximum request body size in bytes.
    #[serde(default = "GatewayConfig::default_max_body")]
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    #[serde(default = "GatewayConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// How often the monitoring dashboard reloads itself, in seconds.
    /// Zero disables the reload.
    #[serde(default = "GatewayConfig::default_monitoring_refresh")]
    pub monitoring_refresh_seconds: u64,

    /// Backend API settings.
    #[serde(default)]
    pub auth: AuthConfig,
}

impl GatewayConfig {
    fn default_listen_addr() -> String {
        "0.0.0.0:3000".to_string()
    }

    fn default_login_path() -> String {
        "/login".to_string()
    }

    fn default_public_paths() -> Vec<String> {
        vec!["/login".to_string()]
    }

    const fn default_max_body() -> usize {
        64 * 1024
    }

    const fn default_request_timeout() -> u64 {
        30
    }

    const fn default_monitoring_refresh() -> u64 {
        30
    }

    /// Get the request timeout as a `Duration`.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: Self::default_listen_addr(),
            login_path: Self::default_login_path(),
            public_paths: Self::default_public_paths(),
            max_body_bytes: Self::default_max_body(),
            request_timeout_seconds: Self::default_request_timeout(),
            monitoring_refresh_seconds: Self::default_monitoring_refresh(),
            auth: AuthConfig::default(),
        }
    }
}
