use std::path::Path;

use config::{Config, File, FileFormat};
use eyre::{Context, Result};

use crate::config::models::ServerConfig;

/// Load configuration from a file using the config crate
/// Supports multiple formats: TOML, YAML, JSON, etc.
pub async fn load_config(config_path: &str) -> Result<ServerConfig> {
    load_config_sync(config_path)
}

/// Load configuration synchronously
pub fn load_config_sync(config_path: &str) -> Result<ServerConfig> {
    let config_path = Path::new(config_path);

    // Determine file format based on extension
    let format = match config_path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => FileFormat::Yaml,
        Some("json") => FileFormat::Json,
        Some("toml") => FileFormat::Toml,
        Some("ini") => FileFormat::Ini,
        _ => FileFormat::Toml, // Default to TOML
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

    let server_config: ServerConfig = settings.try_deserialize().with_context(|| {
        format!(
            "Failed to deserialize config from {}",
            config_path.display()
        )
    })?;

    Ok(server_config)
}

#[cfg(test)]
mod tests {
    use std::{io::Write, time::Duration};

    use tempfile::NamedTempFile;

    use super::*;
    use crate::config::models::StopMode;

    #[tokio::test]
    async fn test_load_toml_config() {
        let toml_content = r#"
port = 3000
bind_addr = "127.0.0.1"
advertised_host = "app.internal"

[stop_mode]
type = "graceful"
timeout = "5s"
"#;

        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        write!(temp_file, "{}", toml_content).unwrap();

        let config = load_config(temp_file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.bind_addr.as_deref(), Some("127.0.0.1"));
        assert_eq!(config.advertised_host.as_deref(), Some("app.internal"));
        assert_eq!(config.stop_mode, StopMode::graceful(Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn test_load_yaml_config() {
        let yaml_content = r#"
port: 3000
bind_addr: "0.0.0.0"
stop_mode:
  type: "immediate"
"#;

        let mut temp_file = NamedTempFile::with_suffix(".yaml").unwrap();
        write!(temp_file, "{}", yaml_content).unwrap();

        let config = load_config(temp_file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.stop_mode, StopMode::Immediate);
    }

    #[tokio::test]
    async fn test_load_json_config() {
        let json_content = r#"
{
  "port": 0,
  "stop_mode": { "type": "graceful", "timeout": "2s" }
}
"#;

        let mut temp_file = NamedTempFile::with_suffix(".json").unwrap();
        write!(temp_file, "{}", json_content).unwrap();

        let config = load_config(temp_file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(config.port, 0);
        assert_eq!(config.stop_mode, StopMode::graceful(Duration::from_secs(2)));
    }

    #[tokio::test]
    async fn test_missing_fields_use_defaults() {
        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        write!(temp_file, "port = 8081").unwrap();

        let config = load_config(temp_file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(config.port, 8081);
        assert_eq!(config.bind_addr, None);
        assert_eq!(config.stop_mode, StopMode::Immediate);
    }
}
