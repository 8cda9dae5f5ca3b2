//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Directory holding the error pages.
pub const ERROR_FILES_PATH_VAR: &str = "ERROR_FILES_PATH";

/// Echo context headers when set to anything non-empty.
pub const DEBUG_VAR: &str = "DEBUG";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file, apply the process
/// environment on top, and validate the result.
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    let mut config = match path {
        Some(path) => parse_config(&fs::read_to_string(path)?)?,
        None => ServiceConfig::default(),
    };

    apply_env(&mut config, |key| std::env::var(key).ok());

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse a TOML document into a config without validating it.
pub fn parse_config(content: &str) -> Result<ServiceConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Overlay environment switches on a config.
///
/// Variables that are unset or empty leave the config untouched.
pub fn apply_env<F>(config: &mut ServiceConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| lookup(key).filter(|value| !value.is_empty());

    if let Some(path) = lookup(ERROR_FILES_PATH_VAR) {
        config.pages.error_files_path = path;
    }

    if lookup(DEBUG_VAR).is_some() {
        config.debug = true;
    }

    for (format, settings) in config.templating.formats.iter_mut() {
        let Some(var) = settings.enable_env.as_deref() else {
            continue;
        };
        if lookup(var).is_some() {
            tracing::debug!(format = %format, var = %var, "Templating enabled from environment");
            settings.enabled = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::EscapePolicy;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.pages.error_files_path, "/www");
        assert_eq!(config.pages.default_format, "text/html");
        assert_eq!(config.pages.default_extensions, vec![".html", ".htm"]);
        assert!(!config.debug);
    }

    #[test]
    fn test_parse_templating_table() {
        let config = parse_config(
            r#"
            [templating.formats."application/xml"]
            escape = "structural"
            enabled = true
            "#,
        )
        .unwrap();

        let xml = &config.templating.formats["application/xml"];
        assert_eq!(xml.effective_policy(), EscapePolicy::Structural);
        assert!(xml.enable_env.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ServiceConfig::default();
        apply_env(
            &mut config,
            env(&[
                ("ERROR_FILES_PATH", "/srv/pages"),
                ("DEBUG", "1"),
                ("TEMPLATE_HTML", "true"),
            ]),
        );

        assert_eq!(config.pages.error_files_path, "/srv/pages");
        assert!(config.debug);
        assert_eq!(
            config.templating.formats["text/html"].effective_policy(),
            EscapePolicy::Structural
        );
        assert_eq!(
            config.templating.formats["application/json"].effective_policy(),
            EscapePolicy::Disabled
        );
    }

    #[test]
    fn test_empty_env_values_are_ignored() {
        let mut config = ServiceConfig::default();
        apply_env(
            &mut config,
            env(&[("ERROR_FILES_PATH", ""), ("DEBUG", ""), ("TEMPLATE_JSON", "")]),
        );

        assert_eq!(config.pages.error_files_path, "/www");
        assert!(!config.debug);
        assert_eq!(
            config.templating.formats["application/json"].effective_policy(),
            EscapePolicy::Disabled
        );
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[listener]\nbind_address = \"nowhere\"\n").unwrap();

        let err = load_config(Some(path.as_path())).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("bind_address"));
    }
}
