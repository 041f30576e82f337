//! KDL schema definitions for config.kdl and state.kdl.
//!
//! This module provides:
//! - Rust structs representing the KDL schema
//! - Conversion to and from KDL documents
//! - Validation and defaults

use kdl::{KdlDocument, KdlEntry, KdlNode, KdlValue};
use serde::{Deserialize, Serialize};

/// API used when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Accepted notification poll interval range, in seconds
pub const POLL_INTERVAL_RANGE: std::ops::RangeInclusive<u64> = 10..=300;

/// Output format preference for CLI commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON output (default, machine-readable)
    #[default]
    Json,
    /// Human-readable output
    Human,
}

impl OutputFormat {
    /// Parse from string, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "human" => Some(OutputFormat::Human),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Human => "human",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn string_value<'a>(doc: &'a KdlDocument, name: &str) -> Option<&'a str> {
    doc.get(name)?.entries().first()?.value().as_string()
}

fn integer_value(doc: &KdlDocument, name: &str) -> Option<i128> {
    doc.get(name)?.entries().first()?.value().as_integer()
}

fn push_node(doc: &mut KdlDocument, name: &str, value: KdlValue) {
    let mut node = KdlNode::new(name);
    node.push(KdlEntry::new(value));
    doc.nodes_mut().push(node);
}

/// User preferences stored in config.kdl.
///
/// Safe to sync across machines. File permissions: 0644 (rw-r--r--)
///
/// # KDL Schema
///
/// ```kdl
/// api-url "https://studio.example.com"
/// output-format "human"  // or "json"
/// poll-interval 15
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtelierConfig {
    /// Base URL of the design API
    pub api_url: Option<String>,

    pub output_format: Option<OutputFormat>,

    /// Notification poll interval in seconds
    pub poll_interval: Option<u64>,
}

impl AtelierConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the config values.
    ///
    /// Returns an error message if any value is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(ref url) = self.api_url {
            validate_api_url(url)?;
        }
        if let Some(secs) = self.poll_interval {
            if !POLL_INTERVAL_RANGE.contains(&secs) {
                return Err(format!(
                    "poll-interval must be {}-{} seconds, got {}",
                    POLL_INTERVAL_RANGE.start(),
                    POLL_INTERVAL_RANGE.end(),
                    secs
                ));
            }
        }
        Ok(())
    }

    /// Parse config from a KDL document.
    ///
    /// Unknown nodes and values of the wrong type are ignored.
    pub fn from_kdl(doc: &KdlDocument) -> Self {
        Self {
            api_url: string_value(doc, "api-url").map(str::to_string),
            output_format: string_value(doc, "output-format").and_then(OutputFormat::parse),
            poll_interval: integer_value(doc, "poll-interval")
                .and_then(|i| u64::try_from(i).ok())
                .filter(|secs| POLL_INTERVAL_RANGE.contains(secs)),
        }
    }

    pub fn to_kdl(&self) -> KdlDocument {
        let mut doc = KdlDocument::new();

        if let Some(ref url) = self.api_url {
            push_node(&mut doc, "api-url", KdlValue::String(url.clone()));
        }
        if let Some(format) = self.output_format {
            push_node(
                &mut doc,
                "output-format",
                KdlValue::String(format.as_str().to_string()),
            );
        }
        if let Some(secs) = self.poll_interval {
            push_node(&mut doc, "poll-interval", KdlValue::Integer(secs as i128));
        }

        doc
    }

    /// Set a value by its KDL key, validating it first.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        let mut updated = self.clone();
        match key {
            "api-url" => updated.api_url = Some(value.trim_end_matches('/').to_string()),
            "output-format" => {
                updated.output_format = Some(
                    OutputFormat::parse(value)
                        .ok_or_else(|| format!("output-format must be json or human, got {}", value))?,
                )
            }
            "poll-interval" => {
                updated.poll_interval = Some(
                    value
                        .parse()
                        .map_err(|_| format!("poll-interval must be a number, got {}", value))?,
                )
            }
            _ => {
                return Err(format!(
                    "Unknown config key: {}. Valid keys: api-url, output-format, poll-interval, api-token",
                    key
                ));
            }
        }
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}

fn validate_api_url(url: &str) -> Result<(), String> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(format!(
            "api-url must start with http:// or https://, got {}",
            url
        ))
    }
}

/// Secrets stored in state.kdl.
///
/// **MUST be created with 0600 permissions (owner read/write only)**.
///
/// # KDL Schema
///
/// ```kdl
/// api-token "atl_xxxxxxxxxxxxxxxx"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtelierState {
    /// Bearer token for the design API (sensitive!)
    pub api_token: Option<String>,
}

impl AtelierState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_secrets(&self) -> bool {
        self.api_token.is_some()
    }

    pub fn from_kdl(doc: &KdlDocument) -> Self {
        Self {
            api_token: string_value(doc, "api-token")
                .filter(|t| !t.is_empty())
                .map(str::to_string),
        }
    }

    pub fn to_kdl(&self) -> KdlDocument {
        let mut doc = KdlDocument::new();
        if let Some(ref token) = self.api_token {
            push_node(&mut doc, "api-token", KdlValue::String(token.clone()));
        }
        doc
    }
}

/// Mask a secret for display, keeping only its first and last four characters.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 12 {
        let head: String = chars.iter().take(4).collect();
        format!("{}...", head)
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

/// Required permissions for state.kdl (Unix: 0600, owner read/write only).
#[cfg(unix)]
pub const STATE_FILE_MODE: u32 = 0o600;

/// Required permissions for config.kdl (Unix: 0644, readable by all).
#[cfg(unix)]
pub const CONFIG_FILE_MODE: u32 = 0o644;
