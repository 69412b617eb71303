use anyhow::{Context, Result};
use chrono::Utc;
use std::io::Write;

use super::State;
use crate::storage::DatabaseError;

pub(super) async fn login<W: Write>(state: &mut State, name: &str, out: &mut W) -> Result<()> {
    match state.db.get_user(name).await {
        Ok(_) => {}
        Err(DatabaseError::NotFound(_)) => anyhow::bail!("User '{}' does not exist", name),
        Err(e) => return Err(e.into()),
    }

    state
        .config
        .set_user(name, &state.config_path)
        .with_context(|| format!("Failed to set current user to '{}'", name))?;

    tracing::info!(user = %name, "Logged in");
    writeln!(out, "Logged in as {}", name)?;
    Ok(())
}

pub(super) async fn register<W: Write>(state: &mut State, name: &str, out: &mut W) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("User name cannot be empty");
    }

    let user = state.db.create_user(name, Utc::now()).await?;
    state
        .config
        .set_user(&user.name, &state.config_path)
        .with_context(|| format!("Failed to set current user to '{}'", user.name))?;

    tracing::info!(user_id = user.id, user = %user.name, "Registered user");
    writeln!(out, "User {} was created", user.name)?;
    writeln!(out, "ID: {}", user.id)?;
    writeln!(out, "Created At: {}", user.created())?;
    writeln!(out, "Updated At: {}", user.updated())?;
    Ok(())
}

pub(super) async fn reset<W: Write>(state: &mut State, out: &mut W) -> Result<()> {
    let removed = state.db.delete_users().await.context("Failed to delete users")?;
    tracing::info!(users = removed, "Database reset");
    writeln!(out, "Removed {} users and all their feeds", removed)?;
    Ok(())
}

pub(super) async fn list<W: Write>(state: &mut State, out: &mut W) -> Result<()> {
    let users = state.db.get_users().await?;
    if users.is_empty() {
        writeln!(out, "No users registered yet")?;
        return Ok(());
    }

    let current = state.config.current_user_name.as_deref();
    for user in users {
        if current == Some(user.name.as_str()) {
            writeln!(out, " * {} (current)", user.name)?;
        } else {
            writeln!(out, " * {}", user.name)?;
        }
    }
    Ok(())
}
