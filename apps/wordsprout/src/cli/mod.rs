//! # Command Line Interface
//!
//! `wordsprout <command>`. Every command returns
//! `Result<(), Box<dyn Error>>`; `main` prints the error and exits non-zero.

mod commands;

pub use commands::{
    build_state, cmd_assess, cmd_init, cmd_seed, cmd_serve, cmd_status, open_store,
};

use crate::config::ServerConfig;
use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "wordsprout", version, about = "Speech-therapy companion for parents")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP API
    Serve(ServerConfig),

    /// Create a new database file
    Init {
        #[arg(long, env = "WORDSPROUT_DB")]
        db: PathBuf,
        /// Replace an existing database
        #[arg(long)]
        force: bool,
    },

    /// Load the built-in categories, words and exercises
    Seed {
        #[arg(long, env = "WORDSPROUT_DB")]
        db: PathBuf,
    },

    /// Assess a developmental level offline
    Assess {
        /// Birth date, YYYY-MM-DD
        #[arg(long)]
        birth_date: Option<String>,
        /// Number of known words
        #[arg(long, allow_negative_numbers = true)]
        known_words: Option<i64>,
        #[arg(long)]
        json: bool,
    },

    /// Show record counts
    Status {
        #[arg(long, env = "WORDSPROUT_DB")]
        db: PathBuf,
        #[arg(long)]
        json: bool,
    },
}

/// Dispatch a parsed command line.
pub async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    match cli.command {
        Commands::Serve(config) => cmd_serve(config).await,
        Commands::Init { db, force } => cmd_init(&db, force),
        Commands::Seed { db } => cmd_seed(&db),
        Commands::Assess {
            birth_date,
            known_words,
            json,
        } => cmd_assess(birth_date.as_deref(), known_words, json),
        Commands::Status { db, json } => cmd_status(&db, json),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_assess_with_negative_count() {
        let cli = Cli::try_parse_from(["wordsprout", "assess", "--known-words", "-3"]).unwrap();
        match cli.command {
            Commands::Assess { known_words, .. } => assert_eq!(known_words, Some(-3)),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn serve_memory_flag_overrides_db() {
        let temp = tempfile::tempdir().unwrap();
        let db = temp.path().join("ignored.redb");
        let cli = Cli::try_parse_from([
            "wordsprout",
            "serve",
            "--db",
            db.to_str().unwrap(),
            "--memory",
        ])
        .unwrap();
        let Commands::Serve(config) = cli.command else {
            panic!("expected serve");
        };
        assert!(config.memory);
        assert_eq!(config.db.as_deref(), Some(db.as_path()));

        build_state(&config).unwrap();
        assert!(!db.exists());
    }
}
