//! The scrape loop.
//!
//! Every tick takes exactly one feed: the one whose `last_fetched_at` is
//! oldest (never-fetched first). The feed is marked fetched *before* the HTTP
//! request goes out, so a feed that always fails still moves to the back of
//! the queue and cannot starve the others.

use crate::feed::fetcher::{FetchError, Fetcher};
use crate::feed::parser::RssFeed;
use crate::storage::{Database, DatabaseError, Feed};
use crate::util::{format_duration, Shutdown};
use chrono::{DateTime, Utc};
use std::fmt;
use std::io::Write;
use std::time::Duration;
use thiserror::Error;
use tokio::time::MissedTickBehavior;

/// Why a single tick produced no report. None of these stop the loop.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("No feeds to scrape yet, add one with `gator addfeed <name> <url>`")]
    NoFeeds,
    #[error("Failed to pick the next feed: {0}")]
    Select(#[source] DatabaseError),
    #[error("Failed to mark feed #{feed_id} as fetched: {source}")]
    Mark {
        feed_id: i64,
        #[source]
        source: DatabaseError,
    },
    #[error("Failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },
}

/// Outcome of a successful tick.
#[derive(Debug, Clone)]
pub struct ScrapeReport {
    /// Feed row as stored after being marked fetched
    pub feed: Feed,
    pub parsed: RssFeed,
}

fn format_time(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S%.3f UTC").to_string()
}

impl fmt::Display for ScrapeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let feed = &self.feed;
        writeln!(f, "ID: {}", feed.id)?;
        writeln!(f, "Name: {}", feed.name)?;
        writeln!(f, "URL: {}", feed.url)?;
        writeln!(f, "Created At: {}", format_time(feed.created()))?;
        writeln!(f, "Updated At: {}", format_time(feed.updated()))?;
        match feed.last_fetched() {
            Some(at) => writeln!(f, "Last Fetched: {}", format_time(at))?,
            None => writeln!(f, "Last Fetched: never")?,
        }

        let channel = &self.parsed.channel;
        writeln!(f, "Channel: {} ({} items)", channel.title, channel.items.len())?;
        for item in &channel.items {
            writeln!(f, " * {}", item.title)?;
        }
        Ok(())
    }
}

/// Run one Select → MarkFetched → Fetch cycle at time `now`.
///
/// The fetch observes `shutdown`, so a cancelled loop abandons the request
/// and this returns `ScrapeError::Fetch` with [`FetchError::Cancelled`].
pub async fn scrape_once(
    db: &Database,
    fetcher: &Fetcher,
    now: DateTime<Utc>,
    shutdown: &Shutdown,
) -> Result<ScrapeReport, ScrapeError> {
    let next = db.get_next_feed_to_fetch().await.map_err(|e| match e {
        DatabaseError::NoFeeds => ScrapeError::NoFeeds,
        other => ScrapeError::Select(other),
    })?;

    let feed = db
        .mark_feed_fetched(next.id, now)
        .await
        .map_err(|source| ScrapeError::Mark {
            feed_id: next.id,
            source,
        })?;

    tracing::debug!(feed_id = feed.id, url = %feed.url, "Scraping feed");

    let parsed = fetcher
        .fetch(&feed.url, shutdown)
        .await
        .map_err(|source| ScrapeError::Fetch {
            url: feed.url.clone(),
            source,
        })?;

    Ok(ScrapeReport { feed, parsed })
}

/// Scrape one feed every `every` until `shutdown` fires.
///
/// The first tick runs immediately. Ticks never overlap: a slow fetch delays
/// the next tick instead of bursting missed ones. Reports go to `out`; tick
/// errors are logged and written to stderr, and the loop carries on.
///
/// Pass [`Shutdown::never`] to run until the process is killed.
///
/// Returns the number of ticks that ran.
pub async fn run<W: Write>(
    db: &Database,
    fetcher: &Fetcher,
    every: Duration,
    shutdown: Shutdown,
    out: &mut W,
) -> u64 {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut stop = shutdown.clone();
    let mut ticks: u64 = 0;

    tracing::info!(interval = %format_duration(every), "Scrape loop started");

    loop {
        tokio::select! {
            biased;

            _ = stop.triggered() => break,
            _ = ticker.tick() => {}
        }

        ticks += 1;
        match scrape_once(db, fetcher, Utc::now(), &shutdown).await {
            Ok(report) => {
                tracing::info!(
                    feed_id = report.feed.id,
                    items = report.parsed.channel.items.len(),
                    "Feed scraped"
                );
                if let Err(e) = writeln!(out, "{}", report) {
                    tracing::warn!(error = %e, "Failed to write scrape report");
                }
            }
            Err(ScrapeError::Fetch {
                source: FetchError::Cancelled,
                url,
            }) => {
                tracing::info!(url = %url, "In-flight fetch abandoned");
            }
            Err(e) => {
                tracing::warn!(tick = ticks, error = %e, "Scrape tick failed");
                eprintln!("{}", e);
            }
        }
    }

    tracing::info!(ticks = ticks, "Scrape loop stopped");
    ticks
}
