//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// dashprobe -- acceptance checks for a deployed ceph-dashboard.
///
/// Use `dashprobe <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "dashprobe", version, about, long_about = None)]
pub struct Cli {
    /// Path to the dashprobe.toml configuration file.
    #[arg(short, long, default_value = "dashprobe.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the dashboard scenarios.
    Run(RunArgs),

    /// Show the active dashboard unit and the per-status topology.
    Probe,

    /// Create one dashboard user through the add-user action.
    AddUser(AddUserArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- run ----

/// Run all scenarios or a named subset.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Run only this scenario (repeatable): dashboard_units, create_user,
    /// access_dashboard, ceph_keys, saml.
    #[arg(long = "only", value_name = "NAME")]
    pub only: Vec<String>,
}

// ---- add-user ----

/// Create a dashboard user.
#[derive(Args, Debug)]
pub struct AddUserArgs {
    /// Username (default: random `{username_prefix}-{uuid}`).
    #[arg(long)]
    pub username: Option<String>,

    /// Role to grant (default: `dashboard.user_role`).
    #[arg(long)]
    pub role: Option<String>,
}

// ---- config ----

/// Manage dashprobe configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, model, dashboard, retry, saml).
        #[arg(long)]
        section: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_debug_assert() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parse_run_all() {
        let cli = Cli::try_parse_from(["dashprobe", "run"]).expect("parse succeeded");
        match cli.command {
            Commands::Run(run_args) => {
                assert!(run_args.only.is_empty(), "only should default to empty");
            }
            _ => panic!("expected Run command"),
        }
    }

    #[test]
    fn test_cli_parse_run_only_repeated() {
        let cli = Cli::try_parse_from(["dashprobe", "run", "--only", "saml", "--only", "ceph_keys"])
            .expect("parse succeeded");
        match cli.command {
            Commands::Run(run_args) => {
                assert_eq!(run_args.only, vec!["saml", "ceph_keys"]);
            }
            _ => panic!("expected Run command"),
        }
    }

    #[test]
    fn test_cli_parse_probe() {
        let cli = Cli::try_parse_from(["dashprobe", "probe"]).expect("parse succeeded");
        assert!(matches!(cli.command, Commands::Probe));
    }

    #[test]
    fn test_cli_parse_add_user_defaults() {
        let cli = Cli::try_parse_from(["dashprobe", "add-user"]).expect("parse succeeded");
        match cli.command {
            Commands::AddUser(args) => {
                assert!(args.username.is_none());
                assert!(args.role.is_none());
            }
            _ => panic!("expected AddUser command"),
        }
    }

    #[test]
    fn test_cli_parse_add_user_explicit() {
        let cli = Cli::try_parse_from([
            "dashprobe",
            "add-user",
            "--username",
            "alice",
            "--role",
            "read-only",
        ])
        .expect("parse succeeded");
        match cli.command {
            Commands::AddUser(args) => {
                assert_eq!(args.username.as_deref(), Some("alice"));
                assert_eq!(args.role.as_deref(), Some("read-only"));
            }
            _ => panic!("expected AddUser command"),
        }
    }

    #[test]
    fn test_cli_parse_config_show_section() {
        let cli = Cli::try_parse_from(["dashprobe", "config", "show", "--section", "retry"])
            .expect("parse succeeded");
        match cli.command {
            Commands::Config(config_args) => match config_args.action {
                ConfigAction::Show { section } => {
                    assert_eq!(section.as_deref(), Some("retry"));
                }
                _ => panic!("expected Show action"),
            },
            _ => panic!("expected Config command"),
        }
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::try_parse_from([
            "dashprobe",
            "--config",
            "/etc/dashprobe.toml",
            "probe",
            "--output",
            "json",
            "--log-level",
            "debug",
        ])
        .expect("parse succeeded");
        assert_eq!(cli.config, PathBuf::from("/etc/dashprobe.toml"));
        assert_eq!(cli.output, OutputFormat::Json);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_cli_default_config_path() {
        let cli = Cli::try_parse_from(["dashprobe", "probe"]).expect("parse succeeded");
        assert_eq!(cli.config, PathBuf::from("dashprobe.toml"));
        assert_eq!(cli.output, OutputFormat::Text);
    }

    #[test]
    fn test_cli_rejects_unknown_output() {
        assert!(Cli::try_parse_from(["dashprobe", "--output", "yaml", "probe"]).is_err());
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["dashprobe"]).is_err());
    }
}
