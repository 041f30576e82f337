//! Precedence resolution for configuration and the API token.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. CLI flags (`--api-url`, `--token`, `-H`)
//! 2. Environment (`ATL_API_URL`, `ATL_API_TOKEN`)
//! 3. config.kdl / state.kdl
//! 4. Built-in defaults

use std::time::Duration;

use serde::Serialize;

use crate::config::schema::{AtelierConfig, AtelierState, DEFAULT_API_URL, OutputFormat, mask_token};
use crate::config::ConfigStore;
use crate::poller::DEFAULT_NOTIFICATION_INTERVAL_SECS;
use crate::{Error, Result};

/// Environment variable overriding the API base URL.
pub const API_URL_ENV: &str = "ATL_API_URL";

/// Environment variable overriding the API token.
pub const API_TOKEN_ENV: &str = "ATL_API_TOKEN";

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Value from CLI flag
    CliFlag,
    /// Value from environment variable
    EnvVar(String),
    /// Value from config.kdl or state.kdl
    File,
    /// Built-in default value
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::CliFlag => write!(f, "cli"),
            ValueSource::EnvVar(name) => write!(f, "env:{}", name),
            ValueSource::File => write!(f, "file"),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

impl Serialize for ValueSource {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolved<T> {
    pub value: T,
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

/// Fully resolved settings with source tracking.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub api_url: Resolved<String>,
    pub api_token: Option<Resolved<String>>,
    pub output_format: Resolved<OutputFormat>,
    /// Notification poll interval in seconds
    pub poll_interval: Resolved<u64>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            api_url: Resolved::new(DEFAULT_API_URL.to_string(), ValueSource::Default),
            api_token: None,
            output_format: Resolved::new(OutputFormat::Json, ValueSource::Default),
            poll_interval: Resolved::new(DEFAULT_NOTIFICATION_INTERVAL_SECS, ValueSource::Default),
        }
    }
}

impl ResolvedConfig {
    pub fn api_url(&self) -> &str {
        &self.api_url.value
    }

    pub fn token(&self) -> Option<&str> {
        self.api_token.as_ref().map(|r| r.value.as_str())
    }

    /// Token for display, with the middle masked.
    pub fn masked_token(&self) -> Option<String> {
        self.token().map(mask_token)
    }

    pub fn human(&self) -> bool {
        self.output_format.value == OutputFormat::Human
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval.value)
    }
}

/// CLI overrides for configuration resolution.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_url: Option<String>,
    pub api_token: Option<String>,
    pub output_format: Option<OutputFormat>,
}

impl ConfigOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Resolve settings from already-loaded files and the environment.
pub fn resolve_from(
    config: &AtelierConfig,
    state: &AtelierState,
    overrides: &ConfigOverrides,
) -> Result<ResolvedConfig> {
    let mut result = ResolvedConfig::default();

    if let Some(ref url) = overrides.api_url {
        result.api_url = Resolved::new(url.clone(), ValueSource::CliFlag);
    } else if let Some(url) = env_value(API_URL_ENV) {
        result.api_url = Resolved::new(url, ValueSource::EnvVar(API_URL_ENV.to_string()));
    } else if let Some(ref url) = config.api_url {
        result.api_url = Resolved::new(url.clone(), ValueSource::File);
    }

    let url = &result.api_url.value;
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(Error::Config(format!(
            "API URL must start with http:// or https:// (from {}): {}",
            result.api_url.source, url
        )));
    }
    result.api_url.value = url.trim_end_matches('/').to_string();

    if let Some(token) = overrides.api_token.as_deref().filter(|t| !t.is_empty()) {
        result.api_token = Some(Resolved::new(token.to_string(), ValueSource::CliFlag));
    } else if let Some(token) = env_value(API_TOKEN_ENV) {
        result.api_token = Some(Resolved::new(
            token,
            ValueSource::EnvVar(API_TOKEN_ENV.to_string()),
        ));
    } else if let Some(ref token) = state.api_token {
        result.api_token = Some(Resolved::new(token.clone(), ValueSource::File));
    }

    if let Some(format) = overrides.output_format {
        result.output_format = Resolved::new(format, ValueSource::CliFlag);
    } else if let Some(format) = config.output_format {
        result.output_format = Resolved::new(format, ValueSource::File);
    }

    if let Some(secs) = config.poll_interval {
        result.poll_interval = Resolved::new(secs, ValueSource::File);
    }

    Ok(result)
}

/// Load config.kdl and state.kdl from `store` and resolve against `overrides`.
pub fn resolve(store: &ConfigStore, overrides: &ConfigOverrides) -> Result<ResolvedConfig> {
    let config = store.read_config()?;
    let state = store.read_state()?;
    resolve_from(&config, &state, overrides)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        // SAFETY: env tests are marked #[serial]
        unsafe {
            std::env::remove_var(API_URL_ENV);
            std::env::remove_var(API_TOKEN_ENV);
        }
    }

    #[test]
    fn test_value_source_display() {
        assert_eq!(ValueSource::CliFlag.to_string(), "cli");
        assert_eq!(ValueSource::EnvVar("X".to_string()).to_string(), "env:X");
        assert_eq!(ValueSource::File.to_string(), "file");
        assert_eq!(ValueSource::Default.to_string(), "default");
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let resolved = resolve_from(
            &AtelierConfig::default(),
            &AtelierState::default(),
            &ConfigOverrides::new(),
        )
        .unwrap();

        assert_eq!(resolved.api_url(), DEFAULT_API_URL);
        assert_eq!(resolved.api_url.source, ValueSource::Default);
        assert!(resolved.token().is_none());
        assert!(!resolved.human());
        assert_eq!(resolved.poll_interval(), Duration::from_secs(15));
    }

    #[test]
    #[serial]
    fn test_file_values_used() {
        clear_env();
        let config = AtelierConfig {
            api_url: Some("https://studio.example.com/".to_string()),
            output_format: Some(OutputFormat::Human),
            poll_interval: Some(60),
        };
        let state = AtelierState {
            api_token: Some("atl_from_file_0000".to_string()),
        };
        let resolved = resolve_from(&config, &state, &ConfigOverrides::new()).unwrap();

        assert_eq!(resolved.api_url(), "https://studio.example.com");
        assert_eq!(resolved.api_url.source, ValueSource::File);
        assert_eq!(resolved.token(), Some("atl_from_file_0000"));
        assert_eq!(resolved.masked_token().as_deref(), Some("atl_...0000"));
        assert!(resolved.human());
        assert_eq!(resolved.poll_interval.source, ValueSource::File);
    }

    #[test]
    #[serial]
    fn test_env_beats_file() {
        clear_env();
        // SAFETY: serial test
        unsafe {
            std::env::set_var(API_URL_ENV, "http://env.example.com");
            std::env::set_var(API_TOKEN_ENV, "env-token");
        }
        let config = AtelierConfig {
            api_url: Some("https://file.example.com".to_string()),
            ..Default::default()
        };
        let state = AtelierState {
            api_token: Some("file-token".to_string()),
        };
        let resolved = resolve_from(&config, &state, &ConfigOverrides::new()).unwrap();
        clear_env();

        assert_eq!(resolved.api_url(), "http://env.example.com");
        assert_eq!(
            resolved.api_url.source,
            ValueSource::EnvVar(API_URL_ENV.to_string())
        );
        assert_eq!(resolved.token(), Some("env-token"));
    }

    #[test]
    #[serial]
    fn test_cli_beats_env() {
        clear_env();
        // SAFETY: serial test
        unsafe { std::env::set_var(API_TOKEN_ENV, "env-token") };
        let overrides = ConfigOverrides::new()
            .with_api_url("http://cli.example.com")
            .with_api_token("cli-token")
            .with_output_format(OutputFormat::Human);
        let resolved =
            resolve_from(&AtelierConfig::default(), &AtelierState::default(), &overrides).unwrap();
        clear_env();

        assert_eq!(resolved.api_url.source, ValueSource::CliFlag);
        assert_eq!(resolved.token(), Some("cli-token"));
        assert_eq!(resolved.api_token.unwrap().source, ValueSource::CliFlag);
        assert_eq!(resolved.output_format.source, ValueSource::CliFlag);
    }

    #[test]
    #[serial]
    fn test_invalid_url_rejected() {
        clear_env();
        let overrides = ConfigOverrides::new().with_api_url("ftp://nope");
        let err = resolve_from(&AtelierConfig::default(), &AtelierState::default(), &overrides)
            .unwrap_err();
        assert!(err.to_string().contains("http://"));
    }

    #[test]
    #[serial]
    fn test_resolve_reads_store() {
        clear_env();
        let dir = tempfile::TempDir::new().unwrap();
        let store = ConfigStore::with_dirs(dir.path(), dir.path());
        store
            .write_state(&AtelierState {
                api_token: Some("stored".to_string()),
            })
            .unwrap();

        let resolved = resolve(&store, &ConfigOverrides::new()).unwrap();
        assert_eq!(resolved.token(), Some("stored"));
        assert_eq!(resolved.api_token.unwrap().source, ValueSource::File);
    }
}
