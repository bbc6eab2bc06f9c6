//! famstar-admin - offline operator CLI for account management.
//!
//! Runs against the backend's privileged management API with the
//! service-role key. Never shipped to end users; the end-user client
//! only ever holds the anon key.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use famstar_core::{AdminBackend, CreateUser, SupabaseAdmin};

/// Minimum password length the backend accepts.
const MIN_PASSWORD_LEN: usize = 6;

#[derive(Parser)]
#[command(name = "famstar-admin", about = "Operator tooling for famstar accounts")]
struct Cli {
    /// Backend base URL, e.g. https://project.supabase.co
    #[arg(long, env = "FAMSTAR_BACKEND_URL")]
    url: String,

    /// Service-role key. Privileged: keep it out of shell history.
    #[arg(long, env = "FAMSTAR_SERVICE_KEY", hide_env_values = true)]
    service_key: String,

    /// App config file (for username -> email lookups). Defaults to
    /// the standard location.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Bulk-provision accounts from a roster file.
    Provision {
        /// TOML roster: `[[users]]` with email, password, display_name.
        roster: PathBuf,
    },
    /// Overwrite a member's password.
    ResetPassword {
        /// Member username from the app config.
        username: String,
        /// The new password.
        new_password: String,
    },
    /// Change a member's contact address.
    UpdateEmail {
        /// Member username from the app config.
        username: String,
        /// The new address.
        new_email: String,
    },
}

#[derive(Debug, Deserialize)]
struct Roster {
    users: Vec<RosterUser>,
}

#[derive(Debug, Deserialize)]
struct RosterUser {
    email: String,
    password: String,
    display_name: String,
}

/// Just enough of an address check to catch pasted garbage; the
/// backend does the real validation.
fn looks_like_email(address: &str) -> bool {
    let Some((local, domain)) = address.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

fn load_app_config(path: Option<&PathBuf>) -> anyhow::Result<famstar_core::AppConfig> {
    match path {
        Some(path) => famstar_core::config::load_config_from_path(path)
            .with_context(|| format!("cannot load config {}", path.display())),
        None => famstar_core::load_config().context("cannot load the default famstar config"),
    }
}

/// Resolve a configured member's account through the management API.
async fn find_account(
    admin: &SupabaseAdmin,
    config: &famstar_core::AppConfig,
    username: &str,
) -> anyhow::Result<(String, String)> {
    tracing::debug!("resolving account for {username}");
    let directory = config.directory();
    let Some(member) = directory.by_username(username).cloned() else {
        let known: Vec<&str> = directory.iter().map(|m| m.username.as_str()).collect();
        bail!(
            "unknown member \"{username}\"; configured members: {}",
            known.join(", ")
        );
    };

    let users = admin.list_users().await?;
    let account = users
        .into_iter()
        .find(|u| u.email == member.email)
        .with_context(|| format!("no account found for {}", member.email))?;
    Ok((account.id, member.email))
}

async fn provision(admin: &SupabaseAdmin, roster_path: &Path) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(roster_path)
        .with_context(|| format!("cannot read roster {}", roster_path.display()))?;
    let roster: Roster = toml::from_str(&text)
        .with_context(|| format!("cannot parse roster {}", roster_path.display()))?;

    if roster.users.is_empty() {
        bail!("roster declares no users");
    }

    println!("Provisioning {} account(s)...", roster.users.len());
    let mut failures = 0usize;
    for user in &roster.users {
        let request = CreateUser {
            email: user.email.clone(),
            password: user.password.clone(),
            display_name: user.display_name.clone(),
            must_change_password: true,
        };
        match admin.create_user(&request).await {
            Ok(created) => println!("  created {} ({})", created.email, created.id),
            Err(err) => {
                failures += 1;
                eprintln!("  FAILED {}: {err}", user.email);
            }
        }
    }

    if failures > 0 {
        bail!("{failures} account(s) failed to provision");
    }
    println!("Done. Every account must change its password on first login.");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let admin = SupabaseAdmin::new(&cli.url, &cli.service_key);

    match &cli.command {
        Command::Provision { roster } => provision(&admin, roster).await?,

        Command::ResetPassword {
            username,
            new_password,
        } => {
            if new_password.len() < MIN_PASSWORD_LEN {
                bail!("the password must be at least {MIN_PASSWORD_LEN} characters");
            }
            let config = load_app_config(cli.config.as_ref())?;
            let (account_id, email) = find_account(&admin, &config, username).await?;
            admin.set_password(&account_id, new_password).await?;
            println!("Password updated for {username} ({email}).");
        }

        Command::UpdateEmail {
            username,
            new_email,
        } => {
            if !looks_like_email(new_email) {
                bail!("\"{new_email}\" does not look like an email address");
            }
            let config = load_app_config(cli.config.as_ref())?;
            let (account_id, old_email) = find_account(&admin, &config, username).await?;
            admin.set_email(&account_id, new_email).await?;
            println!("Email updated for {username}: {old_email} -> {new_email}.");
            println!("Remember to update the member roster in the app config to match.");
        }
    }

    Ok(())
}
