//! `vaultform apply` and `vaultform destroy`

use anyhow::Result;
use declarative::{AutoConfirm, ConfirmCallback, Engine, ExecuteOptions};

use super::Session;
use crate::Context;
use crate::cli::ApplyArgs;
use crate::engine::{PromptConfirm, RunOptions};

pub fn apply(ctx: &Context, args: &ApplyArgs) -> Result<()> {
    run(ctx, args, false)
}

pub fn destroy(ctx: &Context, args: &ApplyArgs) -> Result<()> {
    run(ctx, args, true)
}

fn run(ctx: &Context, args: &ApplyArgs, destroy: bool) -> Result<()> {
    let mut session = Session::open(ctx, destroy)?;
    let engine = Engine::new(&session.provider, &session.client).with_options(ExecuteOptions {
        jobs: args.jobs.max(1),
    });

    let mut confirm: Box<dyn ConfirmCallback> = if args.auto_approve {
        Box::new(AutoConfirm)
    } else {
        Box::new(PromptConfirm)
    };
    let opts = RunOptions {
        target: args.target.clone(),
        destroy,
        quiet: ctx.quiet,
    };

    crate::engine::run(
        &engine,
        &session.config,
        &mut session.state,
        &opts,
        confirm.as_mut(),
    )?;
    Ok(())
}
