//! Path resolution for vaultform
//!
//! # Environment Variables
//!
//! - `VAULTFORM_CONFIG_DIR` - Override the directory holding `config.toml`
//!
//! # Path Resolution Priority
//!
//! For config_dir():
//! 1. `VAULTFORM_CONFIG_DIR` environment variable
//! 2. `XDG_CONFIG_HOME/vaultform` (if set)
//! 3. Platform default:
//!    - Windows: `%APPDATA%\vaultform`
//!    - macOS/Linux: `~/.config/vaultform`
//!
//! The configuration document and the state file live in the working
//! directory unless `--file` / `--state` say otherwise.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "VAULTFORM_CONFIG_DIR";

/// Default configuration document
pub const DEFAULT_CONFIG_FILE: &str = "main.toml";

/// Default state file
pub const DEFAULT_STATE_FILE: &str = "vaultform.state.toml";

/// Get the vaultform config directory path
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = expand(&dir);
        log::debug!(
            "Using config dir from {}: {}",
            ENV_CONFIG_DIR,
            path.display()
        );
        return Ok(path);
    }

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg_config).join("vaultform");
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    #[cfg(windows)]
    {
        if let Some(app_data) = dirs::config_dir() {
            let path = app_data.join("vaultform");
            log::debug!("Using Windows config dir: {}", path.display());
            return Ok(path);
        }
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".config").join("vaultform");
    log::debug!("Using default config dir: {}", path.display());
    Ok(path)
}

/// Path of the user settings file (`config.toml` in the config dir)
pub fn settings_file() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Backup written next to a state file before it is replaced
pub fn backup_path(state_file: &Path) -> PathBuf {
    let mut name = state_file.as_os_str().to_os_string();
    name.push(".backup");
    PathBuf::from(name)
}

/// Expand ~ and environment variables in a path string.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

// ============================================================================
// Tests
// ============================================================================
