//! CLI module - Command-line interface for Examhall
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

/// Examhall - Account access service for an exam platform
#[derive(Parser)]
#[command(name = "examhall")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the web API (default)
    #[command(alias = "daemon")]
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Create the configured bootstrap administrator if missing
    CreateAdmin,

    /// Clear the login counter of a student and re-enable the account
    ResetLogin {
        /// Username of the account
        username: String,
    },

    /// List all accounts
    #[command(alias = "ls")]
    Users,
}

pub use commands::*;
