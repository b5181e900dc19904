//! CLI interface for authkeep

pub mod commands;
mod output;

pub use output::*;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "authkeep")]
#[command(version)]
#[command(about = "Access/refresh token sessions for a small HTTP service", long_about = None)]
pub struct Cli {
    /// Path to authkeep.toml (searched upward from the working directory if omitted)
    #[arg(short, long, global = true, env = "AUTHKEEP_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default authkeep.toml
    Init {
        /// Where to write it
        #[arg(default_value = "authkeep.toml")]
        path: PathBuf,
    },

    /// Start the HTTP API server
    Serve {
        /// Host to bind to (overrides server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Create the database tables
    Migrate,

    /// Register an administrator account
    CreateAdmin {
        #[arg(short, long)]
        username: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        age: u8,

        #[arg(long, env = "AUTHKEEP_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
}
