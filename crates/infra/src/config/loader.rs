//! Configuration loader
//!
//! Loads engine configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes standard paths for config files
//! 4. Supports TOML and JSON formats (detected by extension)
//!
//! ## Environment Variables
//! - `VISAPATH_DB_PATH`: Database file path (required)
//! - `VISAPATH_DB_POOL_SIZE`: Connection pool size (required)
//! - `VISAPATH_CACHE_TTL_SECS`: Response cache TTL (optional)
//! - `VISAPATH_CACHE_MAX_ENTRIES`: Response cache bound (optional)

use std::path::{Path, PathBuf};

use visapath_domain::{Result, VisaPathError};

use super::{CacheConfig, DatabaseConfig, EngineConfig};

/// Load configuration with automatic fallback strategy.
///
/// # Errors
/// Returns `VisaPathError::Config` if configuration cannot be loaded from
/// either source, a file is malformed, or a required field is missing.
pub fn load() -> Result<EngineConfig> {
    dotenvy::dotenv().ok();

    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(err) => {
            tracing::debug!(error = ?err, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables.
///
/// # Errors
/// Returns `VisaPathError::Config` if a required variable is missing or
/// has an invalid value.
pub fn load_from_env() -> Result<EngineConfig> {
    let path = env_var("VISAPATH_DB_PATH")?;
    let pool_size = env_var("VISAPATH_DB_POOL_SIZE").and_then(|value| {
        value
            .parse::<u32>()
            .map_err(|err| VisaPathError::Config(format!("Invalid pool size: {err}")))
    })?;

    let mut cache = CacheConfig::default();
    if let Ok(ttl) = std::env::var("VISAPATH_CACHE_TTL_SECS") {
        cache.ttl_seconds = ttl
            .parse()
            .map_err(|err| VisaPathError::Config(format!("Invalid cache TTL: {err}")))?;
    }
    if let Ok(entries) = std::env::var("VISAPATH_CACHE_MAX_ENTRIES") {
        cache.max_entries = entries
            .parse()
            .map_err(|err| VisaPathError::Config(format!("Invalid cache bound: {err}")))?;
    }

    Ok(EngineConfig { database: DatabaseConfig { path, pool_size }, cache })
}

/// Load configuration from a file.
///
/// If `path` is `None`, probes standard locations. Supports TOML and
/// JSON, detected by extension.
///
/// # Errors
/// Returns `VisaPathError::Config` if the file is missing, unreadable,
/// or malformed.
pub fn load_from_file(path: Option<PathBuf>) -> Result<EngineConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(VisaPathError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            VisaPathError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|err| VisaPathError::Config(format!("Failed to read config file: {err}")))?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> Result<EngineConfig> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(contents)
            .map_err(|err| VisaPathError::Config(format!("Invalid TOML config: {err}"))),
        Some("json") => serde_json::from_str(contents)
            .map_err(|err| VisaPathError::Config(format!("Invalid JSON config: {err}"))),
        other => Err(VisaPathError::Config(format!(
            "Unsupported config format: {}",
            other.unwrap_or("<none>")
        ))),
    }
}

fn probe_config_paths() -> Option<PathBuf> {
    let candidates = [
        "visapath.toml",
        "visapath.json",
        "config.toml",
        "config.json",
        "../visapath.toml",
        "../config.toml",
    ];
    candidates.iter().map(PathBuf::from).find(|candidate| candidate.exists())
}

fn env_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| VisaPathError::Config(format!("Missing environment variable: {name}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_config_parses_with_cache_defaults() {
        let contents = r#"
            [database]
            path = "/var/lib/visapath/crm.db"
            pool_size = 8
        "#;
        let config = parse_config(contents, Path::new("visapath.toml")).unwrap();

        assert_eq!(config.database.path, "/var/lib/visapath/crm.db");
        assert_eq!(config.database.pool_size, 8);
        assert_eq!(config.cache, CacheConfig::default());
    }

    #[test]
    fn json_config_overrides_the_cache_section() {
        let contents = r#"{
            "database": { "path": "crm.db", "pool_size": 2 },
            "cache": { "ttl_seconds": 10, "max_entries": 64 }
        }"#;
        let config = parse_config(contents, Path::new("visapath.json")).unwrap();

        assert_eq!(config.cache.ttl_seconds, 10);
        assert_eq!(config.cache.max_entries, 64);
    }

    #[test]
    fn unknown_extensions_are_rejected() {
        let err = parse_config("", Path::new("visapath.yaml")).unwrap_err();
        assert!(matches!(err, VisaPathError::Config(_)));
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let err = parse_config("database = ", Path::new("visapath.toml")).unwrap_err();
        assert!(matches!(err, VisaPathError::Config(_)));
    }
}
