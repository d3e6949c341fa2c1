//! `vaultform refresh`

use anyhow::{Context as AnyhowContext, Result};
use declarative::Engine;

use super::Session;
use crate::Context;
use crate::progress::spinner;
use crate::ui;

/// Re-read every tracked instance and save the result.
pub fn run(ctx: &Context) -> Result<()> {
    let mut session = Session::open(ctx, true)?;
    if session.state.state.is_empty() {
        ui::info("State is empty, nothing to refresh");
        return Ok(());
    }

    let engine = Engine::new(&session.provider, &session.client);
    let pb = (!ctx.quiet).then(|| spinner("Refreshing state..."));
    let summary = engine.refresh(&mut session.state.state);
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    let summary = summary.context("Failed to refresh state")?;

    for address in &summary.removed {
        ui::warn(&format!("{address} no longer exists remotely, removed from state"));
    }
    let written = session.state.save()?;
    if !ctx.quiet {
        ui::success(&format!("Refreshed {} instance(s)", summary.refreshed));
        if written {
            ui::dim(&format!("Saved {}", session.state.path().display()));
        }
    }
    Ok(())
}
