//! `atl config show|set`.

use std::path::PathBuf;

use serde::Serialize;

use super::{Output, json};
use crate::config::{ConfigStore, OutputFormat, Resolved, ResolvedConfig, mask_token};
use crate::{Error, Result};

/// Resolved settings with their sources; the token is masked.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigShow {
    pub api_url: Resolved<String>,
    pub api_token: Option<Resolved<String>>,
    pub output_format: Resolved<OutputFormat>,
    pub poll_interval: Resolved<u64>,
    pub config_path: PathBuf,
    pub state_path: PathBuf,
}

impl Output for ConfigShow {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let token = match &self.api_token {
            Some(t) => format!("{} ({})", t.value, t.source),
            None => "(not set)".to_string(),
        };
        [
            format!("api-url:       {} ({})", self.api_url.value, self.api_url.source),
            format!("api-token:     {}", token),
            format!(
                "output-format: {} ({})",
                self.output_format.value, self.output_format.source
            ),
            format!(
                "poll-interval: {}s ({})",
                self.poll_interval.value, self.poll_interval.source
            ),
            format!("config file:   {}", self.config_path.display()),
            format!("state file:    {}", self.state_path.display()),
        ]
        .join("\n")
    }
}

pub fn config_show(store: &ConfigStore, resolved: &ResolvedConfig) -> ConfigShow {
    ConfigShow {
        api_url: resolved.api_url.clone(),
        api_token: resolved
            .api_token
            .as_ref()
            .map(|t| Resolved::new(mask_token(&t.value), t.source.clone())),
        output_format: resolved.output_format.clone(),
        poll_interval: resolved.poll_interval.clone(),
        config_path: store.config_path(),
        state_path: store.state_path(),
    }
}

/// Result of `config set`.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSetResult {
    pub key: String,
    pub value: String,
    pub path: PathBuf,
}

impl Output for ConfigSetResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!("Set {} = {} in {}", self.key, self.value, self.path.display())
    }
}

/// Validate and store one setting. `api-token` goes to state.kdl, everything
/// else to config.kdl.
pub fn config_set(store: &ConfigStore, key: &str, value: &str) -> Result<ConfigSetResult> {
    if key == "api-token" {
        let mut state = store.read_state()?;
        let token = value.trim();
        state.api_token = (!token.is_empty()).then(|| token.to_string());
        store.write_state(&state)?;
        return Ok(ConfigSetResult {
            key: key.to_string(),
            value: if token.is_empty() {
                "(cleared)".to_string()
            } else {
                mask_token(token)
            },
            path: store.state_path(),
        });
    }

    let mut config = store.read_config()?;
    config.set(key, value).map_err(Error::InvalidInput)?;
    store.write_config(&config)?;
    Ok(ConfigSetResult {
        key: key.to_string(),
        value: value.to_string(),
        path: store.config_path(),
    })
}
