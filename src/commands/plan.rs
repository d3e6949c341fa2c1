//! `vaultform plan`

use anyhow::{Context as AnyhowContext, Result};
use declarative::{Engine, PlanMode};

use super::Session;
use crate::Context;
use crate::cli::PlanArgs;
use crate::engine::differ::display_plan;
use crate::progress::spinner;
use crate::ui;

/// Show what apply (or destroy) would do. The state file is not written.
pub fn run(ctx: &Context, args: &PlanArgs) -> Result<()> {
    let mut session = Session::open(ctx, args.destroy)?;
    let engine = Engine::new(&session.provider, &session.client);

    if !session.state.state.is_empty() {
        let pb = (!ctx.quiet).then(|| spinner("Refreshing state..."));
        let refreshed = engine.refresh(&mut session.state.state);
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
        for address in refreshed.context("Failed to refresh state")?.removed {
            ui::warn(&format!("{address} no longer exists remotely"));
        }
    }

    let mode = if args.destroy {
        PlanMode::Destroy
    } else {
        PlanMode::Normal
    };
    let plan = engine
        .plan(&session.config, &session.state.state, mode)?
        .filter_by_target(args.target.as_deref());

    display_plan(&plan);
    if plan.has_changes() && ctx.verbose > 0 {
        ui::dim("Run `vaultform apply` to make these changes.");
    }
    Ok(())
}
