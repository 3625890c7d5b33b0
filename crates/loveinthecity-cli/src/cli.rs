//! CLI argument definitions.
//!
//! All `clap` structures live here so that `main.rs` stays focused on
//! dispatching subcommands.

use clap::{Parser, Subcommand};

/// LoveInTheCity -- client core harness.
#[derive(Parser)]
#[command(
    name = "loveinthecity",
    version,
    about = "LoveInTheCity -- client core harness",
    long_about = "Drives the LoveInTheCity client core from the command line: account \
                  flows, deep-link resolution, and support requests, against the local \
                  storage database."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an account and log in.
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        age: u32,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        city: String,
        #[arg(long)]
        state: String,
        #[arg(long)]
        password: String,
    },

    /// Log in, creating or updating the local profile.
    Login {
        /// Display name to record on the profile.
        #[arg(long)]
        name: Option<String>,
        /// Phone number to record on the profile.
        #[arg(long)]
        phone: Option<String>,
    },

    /// Log out and clear the local profile.
    Logout,

    /// Show session, profile, and storage status.
    Status,

    /// Resolve a deep link and print the destination path.
    Link {
        /// URL, hash path (/#/user/42), or bare path (/vip).
        url: String,
    },

    /// Open a support request for an issue type.
    Support {
        /// Issue type (inquiry, reserve, vip, password, ...).
        issue: String,
        /// Page or surface the request originates from.
        #[arg(long, default_value = "cli")]
        source: String,
    },

    /// List registered deep-link routes in match priority order.
    Routes,
}
