//! State file persistence.
//!
//! The state is stored as TOML. Before a save replaces an existing file, the
//! previous content is copied to `<file>.backup`.

use anyhow::{Context, Result};
use declarative::State;
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;

/// A [`State`] bound to the file it was loaded from.
#[derive(Debug)]
pub struct StateFile {
    path: PathBuf,
    pub state: State,
    /// State as loaded, to skip saves that change nothing
    loaded: Option<State>,
}

impl StateFile {
    /// Load state, or start a new lineage if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("State file {} does not exist, starting empty", path.display());
            return Ok(Self {
                path: path.to_path_buf(),
                state: State::new(uuid::Uuid::new_v4().to_string()),
                loaded: None,
            });
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;
        let state: State = toml::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))?;

        log::debug!(
            "Loaded state from {} (serial {}, {} instance(s))",
            path.display(),
            state.serial,
            state.len()
        );
        Ok(Self {
            path: path.to_path_buf(),
            loaded: Some(state.clone()),
            state,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist if anything changed since load, bumping the serial.
    ///
    /// Returns whether the file was written.
    pub fn save(&mut self) -> Result<bool> {
        if self.loaded.as_ref() == Some(&self.state) {
            log::debug!("State unchanged, not saving");
            return Ok(false);
        }
        if self.loaded.is_none() && self.state.is_empty() {
            log::debug!("State is empty and was never saved, not creating {}", self.path.display());
            return Ok(false);
        }

        self.state.serial += 1;

        if self.path.exists() {
            let backup = paths::backup_path(&self.path);
            fs::copy(&self.path, &backup)
                .with_context(|| format!("Failed to write state backup: {}", backup.display()))?;
        } else if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;
        }

        let content =
            toml::to_string_pretty(&self.state).context("Failed to serialize state to TOML")?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write state file: {}", self.path.display()))?;

        log::debug!(
            "Saved state to {} (serial {})",
            self.path.display(),
            self.state.serial
        );
        self.loaded = Some(self.state.clone());
        Ok(true)
    }
}
