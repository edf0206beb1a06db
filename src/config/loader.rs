//! Configuration loader with TOML parsing and environment overrides.

use super::ClinopsConfig;
use crate::domain::errors::ClinopsError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file.
///
/// The loader:
/// 1. Reads the TOML file
/// 2. Substitutes `${VAR}` environment references
/// 3. Parses into [`ClinopsConfig`]
/// 4. Applies `CLINOPS_*` environment overrides
/// 5. Validates the result
///
/// # Errors
///
/// Returns [`ClinopsError::Configuration`] if the file cannot be read, a
/// referenced environment variable is missing, parsing fails, or validation
/// fails.
pub fn load_config(path: impl AsRef<Path>) -> Result<ClinopsConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ClinopsError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        ClinopsError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: ClinopsConfig = toml::from_str(&contents)
        .map_err(|e| ClinopsError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config);

    config
        .validate()
        .map_err(ClinopsError::Configuration)?;

    Ok(config)
}

/// Builds a default configuration with environment overrides applied, for
/// running without a config file.
pub fn config_from_env() -> Result<ClinopsConfig> {
    let mut config = ClinopsConfig::default();
    apply_env_overrides(&mut config);
    config.validate().map_err(ClinopsError::Configuration)?;
    Ok(config)
}

/// Substitutes `${VAR}` references, skipping comment lines.
///
/// # Errors
///
/// Lists every referenced variable that is not set.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| ClinopsError::Configuration(format!("bad substitution pattern: {e}")))?;
    let mut result = String::new();
    let mut missing = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let substituted = re.replace_all(line, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            match std::env::var(name) {
                Ok(value) => value,
                Err(_) => {
                    missing.push(name.to_string());
                    String::new()
                }
            }
        });
        result.push_str(&substituted);
        result.push('\n');
    }

    if missing.is_empty() {
        Ok(result)
    } else {
        Err(ClinopsError::Configuration(format!(
            "Missing environment variables: {}",
            missing.join(", ")
        )))
    }
}

fn apply_env_overrides(config: &mut ClinopsConfig) {
    if let Ok(bind) = std::env::var("CLINOPS_BIND") {
        config.server.bind = bind;
    }
    if let Ok(url) = std::env::var("CLINOPS_DIRECTORY_URL") {
        config.directory.base_url = url;
    }
    if let Ok(timeout) = std::env::var("CLINOPS_DIRECTORY_TIMEOUT_MS") {
        if let Ok(ms) = timeout.parse() {
            config.directory.timeout_ms = ms;
        }
    }
    if let Ok(level) = std::env::var("CLINOPS_LOG_LEVEL") {
        config.logging.level = level;
    }
}
