//! `vaultform import`

use anyhow::{Context as AnyhowContext, Result, bail};
use declarative::{Address, Engine};

use super::Session;
use crate::Context;
use crate::progress::spinner;
use crate::ui;

/// Adopt an existing remote object under a declared address.
pub fn run(ctx: &Context, address: &str, id: &str) -> Result<()> {
    let address: Address = address.parse()?;
    let mut session = Session::open(ctx, false)?;
    if session.config.get(&address).is_none() {
        bail!(
            "{address} is not declared in {}; add a [resource.{}.{}] table before importing",
            ctx.file.display(),
            address.resource_type,
            address.name
        );
    }

    let engine = Engine::new(&session.provider, &session.client);
    let pb = (!ctx.quiet).then(|| spinner(&format!("Importing {address}...")));
    let imported = engine.import(&mut session.state.state, &address, id);
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    imported.with_context(|| format!("Failed to import {address} from {id:?}"))?;
    session.state.save()?;

    if !ctx.quiet {
        ui::success(&format!("Imported {address} from {id:?}"));
        ui::dim("Run `vaultform plan` to compare it against the configuration.");
    }
    Ok(())
}
