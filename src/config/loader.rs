//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::DispatchConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding `bus.url`.
pub const NATS_URL_ENV: &str = "NATS_URL";

/// Error type for configuration loading.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<DispatchConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text, applying environment overrides.
pub fn parse_config(content: &str) -> Result<DispatchConfig, ConfigError> {
    let mut config: DispatchConfig = toml::from_str(content)?;
    apply_env_overrides(&mut config, std::env::var(NATS_URL_ENV).ok());

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Resolve the configuration: the given file, or defaults when absent.
pub fn load_or_default(path: Option<&Path>) -> Result<DispatchConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => parse_config(""),
    }
}

fn apply_env_overrides(config: &mut DispatchConfig, nats_url: Option<String>) {
    if let Some(url) = nats_url.filter(|url| !url.trim().is_empty()) {
        config.bus.url = url;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [retries]
            max_attempts = 4

            [[routes]]
            target = "twitter"
            subject = "publish.twitter"
            "#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.retries.max_attempts, 4);
        assert_eq!(config.routes.len(), 1);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_bad_toml_is_parse_error() {
        let err = parse_config("[retries\nmax_attempts = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_invalid_values_are_reported() {
        let err = parse_config(
            r#"
            [retries]
            max_attempts = 0
            backoff_multiplier = 0.5
            "#,
        )
        .unwrap_err();
        match err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_env_override() {
        let mut config = DispatchConfig::default();
        apply_env_overrides(&mut config, Some("nats://bus:4222".to_string()));
        assert_eq!(config.bus.url, "nats://bus:4222");

        apply_env_overrides(&mut config, Some("  ".to_string()));
        assert_eq!(config.bus.url, "nats://bus:4222");
    }
}
