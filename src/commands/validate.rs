//! `vaultform validate`

use anyhow::Result;
use declarative::planner;

use super::load_document;
use crate::Context;
use crate::ui;

/// Check the configuration against every resource schema, offline.
pub fn run(ctx: &Context) -> Result<()> {
    let config = load_document(&ctx.file)?;
    let provider = provider::provider();
    planner::validate(&provider, &config)?;

    if !ctx.quiet {
        ui::success(&format!(
            "{} is valid ({} resource(s))",
            ctx.file.display(),
            config.len()
        ));
    }
    Ok(())
}
