//! Configuration and state management for atl.
//!
//! Two KDL files are kept apart:
//!
//! ## config.kdl - User preferences (safe to sync across machines)
//!
//! Located at `~/.config/atelier/config.kdl` (or `$ATL_CONFIG_DIR/config.kdl`).
//!
//! Contains:
//! - `api-url` - Base URL of the design API
//! - `output-format` - "json" or "human"
//! - `poll-interval` - Notification poll interval in seconds (10-300)
//!
//! ## state.kdl - Machine-specific secrets
//!
//! Located at `~/.local/share/atelier/state.kdl` (or `$ATL_DATA_DIR/state.kdl`).
//!
//! Contains:
//! - `api-token` - Bearer token for the design API
//!
//! **CRITICAL**: `state.kdl` MUST be written with 0600 permissions.
//!
//! Use the [`resolver`] module for precedence resolution.

pub mod resolver;
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use kdl::KdlDocument;

use crate::{Error, Result};

pub use resolver::{
    API_TOKEN_ENV, API_URL_ENV, ConfigOverrides, Resolved, ResolvedConfig, ValueSource, resolve,
};
pub use schema::{AtelierConfig, AtelierState, DEFAULT_API_URL, OutputFormat, mask_token};
#[cfg(unix)]
pub use schema::{CONFIG_FILE_MODE, STATE_FILE_MODE};

/// Overrides the directory holding config.kdl
pub const CONFIG_DIR_ENV: &str = "ATL_CONFIG_DIR";

/// Overrides the directory holding state.kdl
pub const DATA_DIR_ENV: &str = "ATL_DATA_DIR";

const APP_DIR: &str = "atelier";

/// Locations of config.kdl and state.kdl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigStore {
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl ConfigStore {
    /// Resolve directories from `ATL_CONFIG_DIR`/`ATL_DATA_DIR`, falling back
    /// to the platform config and data directories.
    pub fn from_env() -> Result<Self> {
        let config_dir = match env_dir(CONFIG_DIR_ENV) {
            Some(dir) => dir,
            None => dirs::config_dir()
                .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?
                .join(APP_DIR),
        };
        let data_dir = match env_dir(DATA_DIR_ENV) {
            Some(dir) => dir,
            None => dirs::data_dir()
                .ok_or_else(|| Error::Config("Could not determine data directory".to_string()))?
                .join(APP_DIR),
        };
        Ok(Self::with_dirs(config_dir, data_dir))
    }

    pub fn with_dirs(config_dir: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            data_dir: data_dir.into(),
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join("config.kdl")
    }

    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join("state.kdl")
    }

    /// Read config.kdl; a missing file yields an empty config.
    pub fn read_config(&self) -> Result<AtelierConfig> {
        Ok(read_kdl(&self.config_path())?
            .map(|doc| AtelierConfig::from_kdl(&doc))
            .unwrap_or_default())
    }

    /// Read state.kdl; a missing file yields an empty state.
    pub fn read_state(&self) -> Result<AtelierState> {
        Ok(read_kdl(&self.state_path())?
            .map(|doc| AtelierState::from_kdl(&doc))
            .unwrap_or_default())
    }

    pub fn write_config(&self, config: &AtelierConfig) -> Result<()> {
        config.validate().map_err(Error::Config)?;
        let path = self.config_path();
        write_kdl(&path, &config.to_kdl())?;
        #[cfg(unix)]
        set_mode(&path, CONFIG_FILE_MODE)?;
        Ok(())
    }

    /// Write state.kdl with owner-only permissions.
    pub fn write_state(&self, state: &AtelierState) -> Result<()> {
        let path = self.state_path();
        write_kdl(&path, &state.to_kdl())?;
        #[cfg(unix)]
        set_mode(&path, STATE_FILE_MODE)?;
        Ok(())
    }
}

fn env_dir(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn read_kdl(path: &Path) -> Result<Option<KdlDocument>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    let doc = content
        .parse::<KdlDocument>()
        .map_err(|e| Error::Config(format!("Failed to parse KDL in {}: {}", path.display(), e)))?;
    Ok(Some(doc))
}

fn write_kdl(path: &Path, doc: &KdlDocument) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, doc.to_string())?;
    tracing::debug!(path = %path.display(), "wrote config file");
    Ok(())
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    Ok(())
}
