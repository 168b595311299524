//! Configuration data structures for Authgate.
//!
//! These types map directly to YAML (also JSON / TOML) configuration files. They are
//! intentionally serde-friendly and include defaults so that minimal configs remain concise.
//! The configuration is loaded once at startup and never mutated afterwards; request
//! handlers only ever see it behind an `Arc`.
use serde::{Deserialize, Serialize};

/// Default listen address (`":PORT"` binds all interfaces).
pub const DEFAULT_ADDR: &str = ":3333";

/// Default outbound client timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

fn default_addr() -> String {
    DEFAULT_ADDR.to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Top-level gateway configuration.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    /// Address to listen on, e.g. `":3333"` or `"127.0.0.1:3333"`.
    #[serde(default = "default_addr")]
    pub addr: String,
    /// Outbound HTTP client settings shared by the auth and backend legs.
    #[serde(default)]
    pub client: ClientConfig,
    /// Central authentication service settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Prefix to backend mappings. Must be non-empty (checked by the validator).
    #[serde(default)]
    pub mappings: Vec<Mapping>,
}

impl GatewayConfig {
    /// Listen address in `IP:PORT` form. A bare `":PORT"` config value binds
    /// all interfaces, matching common gateway conventions.
    pub fn listen_socket_addr(&self) -> String {
        if self.addr.starts_with(':') {
            format!("0.0.0.0{}", self.addr)
        } else {
            self.addr.clone()
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            client: ClientConfig::default(),
            auth: AuthConfig::default(),
            mappings: Vec::new(),
        }
    }
}

/// Outbound HTTP client configuration.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ClientConfig {
    /// Timeout applied to every outbound call (auth and backend legs alike).
    #[serde(
        rename = "timeoutMs",
        alias = "timeoutms",
        default = "default_timeout_ms"
    )]
    pub timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

/// Authentication service configuration.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct AuthConfig {
    /// Base URL of the auth endpoint. Required; must be absolute (scheme + host).
    #[serde(default)]
    pub url: String,
    /// Header names allowed on the preflight leg, in addition to the built-in set.
    #[serde(
        rename = "allowedRequestHeaders",
        alias = "allowedrequestheaders",
        default
    )]
    pub allowed_request_headers: Vec<String>,
    /// Header names the auth response may propagate to the backend, in addition
    /// to the built-in set.
    #[serde(
        rename = "allowedAuthorizationHeaders",
        alias = "allowedauthorizationheaders",
        default
    )]
    pub allowed_authorization_headers: Vec<String>,
}

/// One prefix to backend mapping.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Mapping {
    /// Absolute base URL of the backend target. Required.
    pub forward: String,
    /// First path segment routing key, without slashes. Required, non-empty.
    pub prefix: String,
    /// Glob patterns matched against the remainder path; a match bypasses auth.
    #[serde(default)]
    pub whitelist: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_applied() {
        let config = GatewayConfig::default();
        assert_eq!(config.addr, ":3333");
        assert_eq!(config.client.timeout_ms, 10_000);
        assert!(config.mappings.is_empty());
    }

    #[test]
    fn bare_port_addr_binds_all_interfaces() {
        let config = GatewayConfig::default();
        assert_eq!(config.listen_socket_addr(), "0.0.0.0:3333");

        let config = GatewayConfig {
            addr: "127.0.0.1:8080".to_string(),
            ..GatewayConfig::default()
        };
        assert_eq!(config.listen_socket_addr(), "127.0.0.1:8080");
    }
}
