//! CLI module - Command-line interface for anihub
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

use crate::domain::Role;

/// anihub - anime community API server
/// Catalog, forums and watchlists over a JSON API
#[derive(Parser)]
#[command(name = "anihub")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API server (default)
    #[command(alias = "server")]
    Serve,

    /// Apply database migrations and exit
    Migrate,

    /// Create an account; the password is read from ANIHUB_PASSWORD
    CreateUser {
        username: String,

        email: String,

        /// Account role: admin, moderator or user
        #[arg(long, default_value = "user", value_parser = parse_role)]
        role: Role,

        #[arg(long, env = "ANIHUB_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

fn parse_role(raw: &str) -> Result<Role, String> {
    raw.parse().map_err(|e: crate::domain::ParseEnumError| e.to_string())
}

pub use commands::*;
