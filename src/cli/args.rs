use crate::config::Role;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for smash-config
#[derive(Parser, Debug, Clone)]
#[command(name = "smash-config")]
#[command(about = "Inspect and validate Pulp Smash settings and the host topology they describe")]
#[command(long_about = None)]
#[command(version)]
pub struct Args {
    /// Settings file to use instead of searching the XDG config directories
    #[arg(long, value_name = "PATH", env = "SMASH_CONFIG_PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Manage the settings file
    #[command(subcommand)]
    Settings(SettingsCommand),

    /// Resolve the topology and list its hosts
    Hosts {
        /// Only list hosts declaring this role, e.g. "shell" or "amqp broker"
        #[arg(long, value_name = "ROLE", value_parser = parse_role)]
        role: Option<Role>,
    },
}

/// `settings` subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsCommand {
    /// Print the path settings are loaded from
    LoadPath,
    /// Print the path settings are saved to, creating its directory
    SavePath,
    /// Print the settings file
    Show,
    /// Validate the settings file
    Validate,
}

/// Parse a role name given on the command line
fn parse_role(value: &str) -> Result<Role, String> {
    value.parse::<Role>().map_err(|e| {
        let known: Vec<&str> = Role::ALL.iter().map(Role::as_str).collect();
        format!("{e}; known roles: {}", known.join(", "))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_settings_subcommand() {
        let args = Args::try_parse_from(["smash-config", "settings", "load-path"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Settings(SettingsCommand::LoadPath)
        ));
        assert!(!args.verbose);
    }

    #[test]
    fn test_parse_hosts_with_role() {
        let args =
            Args::try_parse_from(["smash-config", "hosts", "--role", "amqp broker", "-v"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Hosts {
                role: Some(Role::AmqpBroker)
            }
        ));
        assert!(args.verbose);
    }

    #[test]
    fn test_unknown_role_rejected() {
        let result = Args::try_parse_from(["smash-config", "hosts", "--role", "webserver"]);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("known roles"));
    }

    #[test]
    fn test_config_path_is_global() {
        let args =
            Args::try_parse_from(["smash-config", "settings", "show", "--config", "/tmp/s.json"])
                .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("/tmp/s.json")));
    }
}
