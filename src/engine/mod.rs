//! Plan rendering and the interactive apply flow
//!
//! The `declarative` engine plans and executes; this module adds what the
//! terminal needs around it:
//! 1. Refresh with a spinner
//! 2. Plan display
//! 3. Confirmation, then apply with progress
//! 4. State persistence, even when apply fails

pub mod differ;
pub mod executor;

pub use executor::{PromptConfirm, RunOptions, run};
