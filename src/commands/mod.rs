//! Command-line surface: argument parsing, shared state and dispatch.
//!
//! Handlers return errors instead of exiting. Only `main` decides whether a
//! failure ends the process.

mod agg;
mod feeds;
mod users;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::Config;
use crate::storage::{Database, User};
use crate::util::parse_duration;

#[derive(Parser, Debug)]
#[command(name = "gator", about = "Command-line RSS feed aggregator")]
pub struct Cli {
    /// Config file to use instead of ~/.gatorconfig.json
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Log in as an existing user
    Login { name: String },
    /// Create a user and log in as them
    Register { name: String },
    /// Delete every user, along with their feeds and follows
    Reset,
    /// List registered users
    Users,
    /// Scrape one feed per interval until interrupted (e.g. `agg 1m`)
    Agg {
        #[arg(value_parser = parse_duration)]
        interval: Duration,
    },
    /// Add a feed and follow it
    Addfeed { name: String, url: String },
    /// List every feed with the user who added it
    Feeds,
    /// Follow an existing feed by URL
    Follow { url: String },
    /// List the feeds the current user follows
    Following,
    /// Stop following a feed by URL
    Unfollow { url: String },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Login { .. } => "login",
            Command::Register { .. } => "register",
            Command::Reset => "reset",
            Command::Users => "users",
            Command::Agg { .. } => "agg",
            Command::Addfeed { .. } => "addfeed",
            Command::Feeds => "feeds",
            Command::Follow { .. } => "follow",
            Command::Following => "following",
            Command::Unfollow { .. } => "unfollow",
        }
    }
}

/// Everything a handler needs, passed explicitly.
pub struct State {
    pub db: Database,
    pub config: Config,
    /// Where `config` is persisted when the current user changes
    pub config_path: PathBuf,
}

impl State {
    /// The logged-in user, looked up fresh from the database.
    ///
    /// Fails when no user is configured or the configured user no longer exists
    /// (e.g. after `reset`).
    pub async fn current_user(&self) -> Result<User> {
        let name = self
            .config
            .current_user_name
            .as_deref()
            .ok_or_else(|| anyhow!("No user logged in, run `gator login <name>` first"))?;
        self.db
            .get_user(name)
            .await
            .with_context(|| format!("Current user '{}' is not registered", name))
    }
}

/// Run a parsed command, writing operator output to `out`.
pub async fn dispatch<W: Write>(state: &mut State, command: Command, out: &mut W) -> Result<()> {
    let command_name = command.name();
    tracing::debug!(command = command_name, "Dispatching command");

    let result = match command {
        Command::Login { name } => users::login(state, &name, out).await,
        Command::Register { name } => users::register(state, &name, out).await,
        Command::Reset => users::reset(state, out).await,
        Command::Users => users::list(state, out).await,
        Command::Agg { interval } => agg::run(state, interval, out).await,
        Command::Addfeed { name, url } => {
            let user = state.current_user().await?;
            feeds::add(state, &user, &name, &url, out).await
        }
        Command::Feeds => feeds::list(state, out).await,
        Command::Follow { url } => {
            let user = state.current_user().await?;
            feeds::follow(state, &user, &url, out).await
        }
        Command::Following => {
            let user = state.current_user().await?;
            feeds::following(state, &user, out).await
        }
        Command::Unfollow { url } => {
            let user = state.current_user().await?;
            feeds::unfollow(state, &user, &url, out).await
        }
    };

    result.with_context(|| format!("command {} failed", command_name))
}
