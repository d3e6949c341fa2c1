use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::paths::{DEFAULT_CONFIG_FILE, DEFAULT_STATE_FILE};

#[derive(Parser)]
#[command(name = "vaultform")]
#[command(version)]
#[command(about = "Declarative management of Vault auth backends and identities", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Resource configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub file: PathBuf,

    /// State file
    #[arg(long, global = true, default_value = DEFAULT_STATE_FILE)]
    pub state: PathBuf,

    #[command(flatten)]
    pub server: ServerArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Connection flags; each falls back to its environment variable.
#[derive(Args, Debug, Clone, Default)]
pub struct ServerArgs {
    /// Server address
    #[arg(long, global = true, env = "VAULT_ADDR", hide_env_values = true)]
    pub address: Option<String>,

    /// Auth token
    #[arg(long, global = true, env = "VAULT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Namespace sent with every request
    #[arg(long, global = true, env = "VAULT_NAMESPACE")]
    pub namespace: Option<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check the configuration without contacting the server
    Validate,

    /// Show what apply would change
    Plan(PlanArgs),

    /// Create, update and replace resources to match the configuration
    Apply(ApplyArgs),

    /// Delete every resource tracked in state
    Destroy(ApplyArgs),

    /// Re-read tracked resources and drop those that are gone
    Refresh,

    /// Start tracking an existing remote object
    Import {
        /// Address in the configuration (e.g. vault_github_team.dev)
        #[arg(value_name = "ADDRESS")]
        resource: String,

        /// Remote id (e.g. github/teams/dev)
        id: String,
    },

    /// Inspect or edit the state file
    #[command(subcommand)]
    State(StateCommand),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Args)]
pub struct PlanArgs {
    /// Only plan this resource type or address
    #[arg(short, long)]
    pub target: Option<String>,

    /// Plan deletion of everything in state
    #[arg(long)]
    pub destroy: bool,
}

#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Only apply this resource type or address
    #[arg(short, long)]
    pub target: Option<String>,

    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    pub auto_approve: bool,

    /// Number of parallel jobs within one dependency level
    #[arg(short, long, default_value = "4")]
    pub jobs: usize,
}

#[derive(Subcommand)]
pub enum StateCommand {
    /// List tracked addresses
    List,

    /// Show the tracked attributes of one instance
    Show {
        /// Address (e.g. vault_identity_entity.alice)
        #[arg(value_name = "ADDRESS")]
        resource: String,
    },

    /// Stop tracking an instance without deleting it remotely
    Rm {
        /// Address (e.g. vault_identity_entity.alice)
        #[arg(value_name = "ADDRESS")]
        resource: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_apply_flags() {
        let cli = Cli::parse_from([
            "vaultform",
            "--file",
            "infra.toml",
            "apply",
            "-y",
            "--target",
            "vault_github_team",
            "--jobs",
            "2",
        ]);
        assert_eq!(cli.file, PathBuf::from("infra.toml"));
        assert_eq!(cli.state, PathBuf::from(DEFAULT_STATE_FILE));
        match cli.command {
            Command::Apply(args) => {
                assert!(args.auto_approve);
                assert_eq!(args.target.as_deref(), Some("vault_github_team"));
                assert_eq!(args.jobs, 2);
            }
            _ => panic!("expected apply"),
        }
    }

    #[test]
    fn test_parse_import() {
        let cli = Cli::parse_from([
            "vaultform",
            "import",
            "vault_github_team.dev",
            "github/teams/dev",
        ]);
        match cli.command {
            Command::Import { resource, id } => {
                assert_eq!(resource, "vault_github_team.dev");
                assert_eq!(id, "github/teams/dev");
            }
            _ => panic!("expected import"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["vaultform", "state", "list", "--state", "other.toml", "-vv"]);
        assert_eq!(cli.state, PathBuf::from("other.toml"));
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Command::State(StateCommand::List)));
    }
}
