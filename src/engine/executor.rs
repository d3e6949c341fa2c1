//! Apply and destroy, with confirmation and state persistence

use anyhow::{Context as AnyhowContext, Result};
use colored::Colorize;
use declarative::{ConfigDocument, ConfirmCallback, Engine, ExecuteSummary, PlanMode};

use super::differ::display_plan;
use crate::progress::{ApplyProgress, spinner};
use crate::state::StateFile;

/// Options for one apply or destroy run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Limit the plan to a resource type or address
    pub target: Option<String>,
    /// Delete everything in state instead of converging
    pub destroy: bool,
    pub quiet: bool,
}

/// Prompts on the terminal.
pub struct PromptConfirm;

impl ConfirmCallback for PromptConfirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        use dialoguer::Confirm;

        let confirmed = Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()?;

        Ok(confirmed)
    }
}

/// Refresh, plan, confirm, apply, and save whatever state was reached.
///
/// Returns `None` when there was nothing to do or the user declined.
pub fn run<M: Sync>(
    engine: &Engine<'_, M>,
    config: &ConfigDocument,
    state: &mut StateFile,
    opts: &RunOptions,
    confirm: &mut dyn ConfirmCallback,
) -> Result<Option<ExecuteSummary>> {
    if !state.state.is_empty() {
        let pb = (!opts.quiet).then(|| spinner("Refreshing state..."));
        let refreshed = engine.refresh(&mut state.state);
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
        let refreshed = refreshed.context("Failed to refresh state")?;
        for address in &refreshed.removed {
            println!("  {} {address} no longer exists remotely", "⚠".yellow());
        }
    }

    let mode = if opts.destroy {
        PlanMode::Destroy
    } else {
        PlanMode::Normal
    };
    let plan = engine
        .plan(config, &state.state, mode)?
        .filter_by_target(opts.target.as_deref());

    display_plan(&plan);

    if !plan.has_changes() {
        state.save()?;
        return Ok(None);
    }

    let prompt = if opts.destroy {
        "Destroy these resources?"
    } else {
        "Apply these changes?"
    };
    if !confirm.confirm(prompt)? {
        println!();
        println!("  {} Aborted", "✗".red());
        state.save()?;
        return Ok(None);
    }

    let mut progress = ApplyProgress::new(plan.summary().total(), opts.quiet);
    let applied = engine.apply(config, &plan, &mut state.state, &mut progress);
    progress.finish();

    // Persist before surfacing errors so successful changes are not lost
    let saved = state.save();
    let summary = applied?;
    saved?;

    print_summary(&summary, opts.destroy);
    Ok(Some(summary.into_result()?))
}

/// Print final summary
fn print_summary(summary: &ExecuteSummary, destroy: bool) {
    println!();
    match (summary.is_success(), destroy) {
        (true, false) => println!(
            "  {} Configuration applied successfully!",
            "✓".green().bold()
        ),
        (true, true) => println!("  {} Resources destroyed", "✓".green().bold()),
        (false, false) => println!(
            "  {} Configuration applied with errors",
            "⚠".yellow().bold()
        ),
        (false, true) => println!("  {} Destroy finished with errors", "⚠".yellow().bold()),
    }

    if summary.created > 0 {
        println!("    • {} resources created", summary.created);
    }
    if summary.updated > 0 {
        println!("    • {} resources updated", summary.updated);
    }
    if summary.replaced > 0 {
        println!("    • {} resources replaced", summary.replaced);
    }
    if summary.deleted > 0 {
        println!("    • {} resources destroyed", summary.deleted);
    }
    if summary.failed > 0 {
        println!("    • {} {} failed", summary.failed, "resources".red());
    }
}
