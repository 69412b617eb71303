use anyhow::{Context, Result};
use std::io::Write;
use std::time::Duration;

use super::State;
use crate::feed::{scheduler, Fetcher};
use crate::util::{format_duration, shutdown};

/// Scrape feeds every `interval` until SIGINT or SIGTERM.
pub(super) async fn run<W: Write>(state: &mut State, interval: Duration, out: &mut W) -> Result<()> {
    let fetcher = Fetcher::new().context("Failed to build HTTP client")?;
    writeln!(out, "Collecting feeds every {}", format_duration(interval))?;
    out.flush()?;

    let (trigger, shutdown) = shutdown::channel();
    let watcher = tokio::spawn(async move {
        wait_for_signal().await;
        trigger.trigger();
    });

    let ticks = scheduler::run(&state.db, &fetcher, interval, shutdown, out).await;
    watcher.abort();

    writeln!(out, "Stopped after {} ticks", ticks)?;
    Ok(())
}

async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Received SIGINT, shutting down gracefully");
                    }
                    _ = sigterm.recv() => {
                        tracing::info!("Received SIGTERM, shutting down gracefully");
                    }
                }
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
            }
        }
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl+C, running until killed");
        std::future::pending::<()>().await;
    } else {
        tracing::info!("Received SIGINT, shutting down gracefully");
    }
}
