//! `vaultform state` subcommands

use anyhow::{Result, bail};
use declarative::{Address, State};

use crate::Context;
use crate::cli::StateCommand;
use crate::state::StateFile;
use crate::ui;

pub fn run(ctx: &Context, cmd: &StateCommand) -> Result<()> {
    let mut file = StateFile::load(&ctx.state)?;
    match cmd {
        StateCommand::List => {
            for line in list(&file.state) {
                println!("{line}");
            }
            Ok(())
        }
        StateCommand::Show { resource } => {
            let address: Address = resource.parse()?;
            let Some(instance) = file.state.get(&address) else {
                bail!("{address} is not in {}", file.path().display());
            };
            ui::header(&address.to_string());
            ui::kv("id", &instance.id);
            for (key, value) in &instance.attributes {
                ui::kv(key, &value.to_string());
            }
            if !instance.dependencies.is_empty() {
                ui::kv("depends on", &instance.dependencies.join(", "));
            }
            Ok(())
        }
        StateCommand::Rm { resource } => {
            let address: Address = resource.parse()?;
            if file.state.remove(&address).is_none() {
                bail!("{address} is not in {}", file.path().display());
            }
            file.save()?;
            if !ctx.quiet {
                ui::success(&format!("Removed {address} from state"));
                ui::dim("The remote object was not touched.");
            }
            Ok(())
        }
    }
}

/// `<address>  <id>` lines, sorted by address.
fn list(state: &State) -> Vec<String> {
    let width = state
        .resources
        .keys()
        .map(String::len)
        .max()
        .unwrap_or(0);
    state
        .resources
        .iter()
        .map(|(address, instance)| format!("{address:<width$}  {}", instance.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::InstanceState;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn instance(t: &str, n: &str, id: &str) -> InstanceState {
        InstanceState {
            resource_type: t.into(),
            name: n.into(),
            id: id.into(),
            dependencies: vec![],
            attributes: BTreeMap::new(),
        }
    }

    fn context(state: PathBuf) -> Context {
        Context {
            verbose: 0,
            quiet: true,
            file: PathBuf::from("main.toml"),
            state,
            overrides: Default::default(),
        }
    }

    #[test]
    fn test_list_is_aligned() {
        let mut state = State::new("l");
        state.insert(instance("vault_github_team", "dev", "auth/github/map/teams/dev"));
        state.insert(instance("vault_auth_backend", "gh", "github"));
        assert_eq!(
            list(&state),
            vec![
                "vault_auth_backend.gh  github",
                "vault_github_team.dev  auth/github/map/teams/dev",
            ]
        );
    }

    #[test]
    fn test_rm_saves_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vaultform.state.toml");
        let mut file = StateFile::load(&path).unwrap();
        file.state.insert(instance("vault_auth_backend", "gh", "github"));
        file.save().unwrap();

        let ctx = context(path.clone());
        run(
            &ctx,
            &StateCommand::Rm {
                resource: "vault_auth_backend.gh".into(),
            },
        )
        .unwrap();
        let reloaded = StateFile::load(&path).unwrap();
        assert!(reloaded.state.is_empty());
        assert_eq!(reloaded.state.serial, 2);

        let err = run(
            &ctx,
            &StateCommand::Rm {
                resource: "vault_auth_backend.gh".into(),
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("is not in"));
    }
}
