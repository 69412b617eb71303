use anyhow::{Context, Result};
use chrono::Utc;
use std::io::Write;

use super::State;
use crate::storage::{DatabaseError, User};
use crate::util::validate_url;

/// Feeds are stored under their normalized URL so lookups match what was added.
fn normalize_url(url: &str) -> Result<String> {
    let parsed = validate_url(url).with_context(|| format!("'{}' is not a feed URL", url))?;
    Ok(parsed.to_string())
}

pub(super) async fn add<W: Write>(
    state: &mut State,
    user: &User,
    name: &str,
    url: &str,
    out: &mut W,
) -> Result<()> {
    let url = normalize_url(url)?;
    let (feed, follow) = state
        .db
        .create_feed_with_follow(name, &url, user.id, Utc::now())
        .await?;

    tracing::info!(feed_id = feed.id, url = %feed.url, user = %user.name, "Feed added");
    writeln!(out, "Feed added and followed by {}", follow.user_name)?;
    writeln!(out, "ID: {}", feed.id)?;
    writeln!(out, "Name: {}", feed.name)?;
    writeln!(out, "URL: {}", feed.url)?;
    writeln!(out, "Created At: {}", feed.created())?;
    Ok(())
}

pub(super) async fn list<W: Write>(state: &mut State, out: &mut W) -> Result<()> {
    let feeds = state.db.get_feeds().await?;
    if feeds.is_empty() {
        writeln!(out, "No feeds yet")?;
        return Ok(());
    }

    for feed in feeds {
        writeln!(out)?;
        writeln!(out, "Name: {}", feed.name)?;
        writeln!(out, "URL: {}", feed.url)?;
        writeln!(out, "Added by: {}", feed.user_name)?;
    }
    Ok(())
}

pub(super) async fn follow<W: Write>(
    state: &mut State,
    user: &User,
    url: &str,
    out: &mut W,
) -> Result<()> {
    let url = normalize_url(url)?;
    let feed = state.db.get_feed_by_url(&url).await?;

    let follow = match state.db.create_feed_follow(user.id, feed.id, Utc::now()).await {
        Ok(follow) => follow,
        Err(DatabaseError::AlreadyExists(_)) => {
            anyhow::bail!("{} already follows '{}'", user.name, feed.name)
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(feed_id = feed.id, user = %user.name, "Followed feed");
    writeln!(out, "Feed: {}", follow.feed_name)?;
    writeln!(out, "User: {}", follow.user_name)?;
    Ok(())
}

pub(super) async fn following<W: Write>(state: &mut State, user: &User, out: &mut W) -> Result<()> {
    let follows = state.db.get_feed_follows_for_user(user.id).await?;

    writeln!(out, "Current user: {}", user.name)?;
    if follows.is_empty() {
        writeln!(out, "Not following any feeds")?;
    }
    for follow in follows {
        writeln!(out, " * {}", follow.feed_name)?;
    }
    Ok(())
}

pub(super) async fn unfollow<W: Write>(
    state: &mut State,
    user: &User,
    url: &str,
    out: &mut W,
) -> Result<()> {
    let url = normalize_url(url)?;
    let feed = state.db.get_feed_by_url(&url).await?;
    state.db.delete_feed_follow(user.id, feed.id).await?;

    tracing::info!(feed_id = feed.id, user = %user.name, "Unfollowed feed");
    writeln!(out, "{} unfollowed {}", user.name, feed.name)?;
    Ok(())
}
