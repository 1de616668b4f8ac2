//! CLI module - Command-line interface for vidshare
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

/// vidshare - self-hosted video sharing
#[derive(Parser)]
#[command(name = "vidshare")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Start the web server (default)
    Serve,

    /// Create default config file
    Init,

    /// Create the database and apply migrations
    InitDb,

    /// Create an admin account
    CreateAdmin {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },

    /// Delete files in the upload directory that no video references
    #[command(alias = "cleanup")]
    CleanupFiles,
}

pub use commands::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_no_command() {
        let cli = Cli::try_parse_from(["vidshare"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_create_admin_args() {
        let cli = Cli::try_parse_from([
            "vidshare",
            "create-admin",
            "--username",
            "root",
            "--password",
            "pw",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::CreateAdmin {
                username: "root".to_string(),
                password: "pw".to_string(),
            })
        );
    }

    #[test]
    fn test_create_admin_requires_password() {
        assert!(Cli::try_parse_from(["vidshare", "create-admin", "--username", "root"]).is_err());
    }

    #[test]
    fn test_cleanup_alias() {
        let cli = Cli::try_parse_from(["vidshare", "cleanup"]).unwrap();
        assert_eq!(cli.command, Some(Commands::CleanupFiles));
    }
}
