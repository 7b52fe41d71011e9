//! Command-line interface for strictly_draft.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Strictly Draft - two-player card draft service
#[derive(Parser, Debug)]
#[command(name = "strictly_draft")]
#[command(about = "Card draft rules, replay and persistence", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay a serialized history and print the derived state as JSON
    Replay {
        /// JSON card catalog
        #[arg(long)]
        catalog: PathBuf,

        /// Serialized history blob
        #[arg(long)]
        history: PathBuf,

        /// Player who sent the invitation
        #[arg(long)]
        player1: String,

        /// Invited player
        #[arg(long)]
        player2: String,

        /// Points budget; defaults to the rules' budget
        #[arg(long)]
        budget: Option<u32>,

        /// TOML rules file
        #[arg(long)]
        rules: Option<PathBuf>,
    },

    /// Roll for the first turn
    Roll {
        /// First player
        #[arg(long)]
        player1: String,

        /// Second player
        #[arg(long)]
        player2: String,

        /// Seed for a reproducible roll
        #[arg(long)]
        seed: Option<u64>,

        /// Faces on the die
        #[arg(long, default_value = "6")]
        faces: u8,
    },

    /// Generate a draft pool from a catalog
    Pool {
        /// JSON card catalog
        #[arg(long)]
        catalog: PathBuf,

        /// TOML pool settings
        #[arg(long)]
        config: Option<PathBuf>,

        /// Seed for a reproducible pool
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Apply database migrations
    Migrate {
        /// Path to the database file (created if it doesn't exist)
        #[arg(long, default_value = "strictly_draft.db")]
        db_path: String,
    },

    /// Serve JSON requests, one per line, over stdin and stdout
    Serve {
        /// Path to server configuration
        #[arg(short, long, default_value = "strictly_draft.toml")]
        config: PathBuf,

        /// Seed for reproducible rolls and ids
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print the JSON schema of accepted requests
    Schema,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_replay_arguments_parse() {
        let cli = Cli::parse_from([
            "strictly_draft",
            "replay",
            "--catalog",
            "cards.json",
            "--history",
            "draft.json",
            "--player1",
            "alice",
            "--player2",
            "bob",
            "--budget",
            "12",
        ]);
        match cli.command {
            Command::Replay { budget, rules, .. } => {
                assert_eq!(budget, Some(12));
                assert!(rules.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
