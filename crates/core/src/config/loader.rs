use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Load configuration from file with environment variable overrides.
///
/// Nested keys use a double underscore, e.g.
/// `REUPLOADER_ORCHESTRATOR__POLL_INTERVAL_SECS=30`.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("REUPLOADER_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[job_source.qbittorrent]
url = "http://qbit:8080"
username = "admin"
password = "adminadmin"

[orchestrator]
enabled = true
poll_interval_secs = 120
static_trackers = ["TSP"]
"#;
        let config = load_config_from_str(toml).unwrap();
        assert!(config.orchestrator.enabled);
        assert_eq!(config.orchestrator.poll_interval_secs, 120);
        assert_eq!(config.orchestrator.static_trackers, vec!["TSP"]);
    }

    #[test]
    fn test_load_config_from_str_missing_job_source() {
        let toml = r#"
[server]
port = 8080
"#;
        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/reuploader.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[job_source.qbittorrent]
url = "http://qbit:8080"
username = "admin"
password = "adminadmin"

[server]
host = "0.0.0.0"
port = 3000

[labels]
prefix = "RU"
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.labels.prefix, "RU");
        assert_eq!(config.labels.delimiter, "::");
    }
}
