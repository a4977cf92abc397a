//! Command-line interface for the Agora forum server.

use clap::{Parser, Subcommand};

/// Agora - forum backend
#[derive(Parser)]
#[command(name = "agora")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the API server (default when no command is given)
    Serve,

    /// Create an ADMIN account
    CreateAdmin {
        username: String,
        password: String,
    },

    /// Purge expired sessions and exit
    CleanupSessions,

    /// Write a default config.toml
    Init,
}
