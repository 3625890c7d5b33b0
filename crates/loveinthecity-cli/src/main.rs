//! CLI entry point for the LoveInTheCity client core.
//!
//! This binary stands in for the out-of-scope UI shell: it constructs the
//! application context over the local storage database (configured via
//! `LOVEINTHECITY_DB`) and drives the account and deep-link flows.

use anyhow::{Context as _, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use loveinthecity_app::{AppConfig, AppContext, SignupData};
use loveinthecity_store::ProfileUpdate;

mod cli;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = AppConfig::from_env();
    debug!(db = ?config.db_path, "starting");

    let mut ctx = AppContext::new(config).context("failed to open the storage database")?;

    match cli.command {
        Commands::Signup {
            name,
            age,
            phone,
            city,
            state,
            password,
        } => {
            let profile = ctx.signup(SignupData {
                name,
                age,
                phone,
                city,
                state,
                password,
            })?;
            println!("account created: {} ({})", profile.name, profile.id);
        }

        Commands::Login { name, phone } => {
            let profile = ctx
                .login(ProfileUpdate {
                    name,
                    phone,
                    ..ProfileUpdate::default()
                })
                .context("login failed: session could not be written")?;
            println!("logged in: {} ({})", profile.name, profile.id);
        }

        Commands::Logout => {
            ctx.logout();
            println!("logged out");
        }

        Commands::Status => {
            println!("authenticated: {}", ctx.is_authenticated());
            println!("{}", ctx.profiles().support_summary());
            let stats = ctx.storage().stats();
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }

        Commands::Link { url } => {
            println!("{}", ctx.resolve_link(&url));
        }

        Commands::Support { issue, source } => {
            let resolved = ctx.router_mut().trigger_support(&issue, &source);
            if ctx.router().support_log().is_empty() {
                println!("no support request sent: no profile on this device");
            } else {
                println!("support request opened ({resolved})");
            }
        }

        Commands::Routes => {
            for path in ctx.router().registered_paths() {
                println!("{path}");
            }
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
