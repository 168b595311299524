use std::path::Path;

use config::{Config, File, FileFormat};
use eyre::{Context, Result};

use crate::config::models::GatewayConfig;

/// Load configuration from a file using the config crate.
/// Supports multiple formats: YAML, JSON, TOML, etc.
pub async fn load_config(config_path: &str) -> Result<GatewayConfig> {
    load_config_sync(config_path)
}

/// Load configuration synchronously
pub fn load_config_sync(config_path: &str) -> Result<GatewayConfig> {
    let config_path = Path::new(config_path);

    // Determine file format based on extension
    let format = match config_path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => FileFormat::Yaml,
        Some("json") => FileFormat::Json,
        Some("toml") => FileFormat::Toml,
        _ => FileFormat::Yaml, // Default to YAML
    };

    let settings = Config::builder()
        .add_source(File::new(
            config_path
                .to_str()
                .ok_or_else(|| eyre::eyre!("Invalid UTF-8 path: {}", config_path.display()))?,
            format,
        ))
        .build()
        .with_context(|| format!("Failed to build config from {}", config_path.display()))?;

    let gateway_config: GatewayConfig = settings.try_deserialize().with_context(|| {
        format!(
            "Failed to deserialize config from {}",
            config_path.display()
        )
    })?;

    Ok(gateway_config)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[tokio::test]
    async fn test_load_yaml_config() {
        let yaml_content = r#"
addr: ":4000"
client:
  timeoutMs: 2500
auth:
  url: "http://auth.local"
  allowedAuthorizationHeaders:
    - "X-User"
mappings:
  - forward: "http://backend.local"
    prefix: "svc"
    whitelist:
      - "/public/*"
"#;

        let mut temp_file = NamedTempFile::with_suffix(".yaml").unwrap();
        write!(temp_file, "{}", yaml_content).unwrap();

        let config = load_config(temp_file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(config.addr, ":4000");
        assert_eq!(config.client.timeout_ms, 2500);
        assert_eq!(config.auth.url, "http://auth.local");
        assert_eq!(config.auth.allowed_authorization_headers, vec!["X-User"]);
        assert_eq!(config.mappings.len(), 1);
        assert_eq!(config.mappings[0].prefix, "svc");
        assert_eq!(config.mappings[0].whitelist, vec!["/public/*"]);
    }

    #[tokio::test]
    async fn test_load_json_config() {
        let json_content = r#"
{
  "auth": {
    "url": "http://auth.local"
  },
  "mappings": [
    {
      "forward": "http://backend.local",
      "prefix": "api"
    }
  ]
}
"#;

        let mut temp_file = NamedTempFile::with_suffix(".json").unwrap();
        write!(temp_file, "{}", json_content).unwrap();

        let config = load_config(temp_file.path().to_str().unwrap())
            .await
            .unwrap();
        // Unspecified fields fall back to defaults
        assert_eq!(config.addr, ":3333");
        assert_eq!(config.client.timeout_ms, 10_000);
        assert_eq!(config.mappings.len(), 1);
        assert!(config.mappings[0].whitelist.is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let result = load_config("/nonexistent/config.yaml").await;
        assert!(result.is_err());
    }
}
