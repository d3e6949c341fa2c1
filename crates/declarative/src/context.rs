//! Progress and confirmation callbacks
//!
//! These traits let the engine report to a UI without depending on one.

use crate::diff::ChangeAction;
use crate::types::{Address, ApplyResult};
use anyhow::Result;

/// Progress callback for execution operations
pub trait ProgressCallback: Send {
    /// Called when starting a dependency level
    fn on_level_start(&mut self, count: usize);

    /// Called when starting to apply a single instance
    fn on_resource_start(&mut self, address: &Address, action: ChangeAction);

    /// Called when an instance completes
    fn on_resource_complete(&mut self, address: &Address, result: &ApplyResult);

    /// Called when a level completes
    fn on_level_complete(&mut self);
}

/// Confirmation callback for user interaction
pub trait ConfirmCallback: Send {
    /// Ask the user to confirm an action
    ///
    /// # Returns
    /// `true` if the user confirmed, `false` otherwise
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_level_start(&mut self, _count: usize) {}
    fn on_resource_start(&mut self, _address: &Address, _action: ChangeAction) {}
    fn on_resource_complete(&mut self, _address: &Address, _result: &ApplyResult) {}
    fn on_level_complete(&mut self) {}
}

/// Auto-confirm callback (always returns true)
pub struct AutoConfirm;

impl ConfirmCallback for AutoConfirm {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Auto-decline callback (always returns false)
pub struct AutoDecline;

impl ConfirmCallback for AutoDecline {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(false)
    }
}
