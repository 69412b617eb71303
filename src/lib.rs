//! gator: a command-line RSS aggregator backed by SQLite.
//!
//! Users register and follow feeds; `agg` runs a scrape loop that fetches the
//! least recently fetched feed on every tick.

pub mod commands;
pub mod config;
pub mod feed;
pub mod storage;
pub mod util;
