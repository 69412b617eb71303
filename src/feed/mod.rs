//! Feed fetching and the periodic scrape loop.
//!
//! - [`parser`] - RSS 2.0 parsing with the `rss` crate plus HTML entity decoding
//! - [`fetcher`] - HTTP retrieval with cancellation and a body size limit
//! - [`scheduler`] - The fixed-interval, one-feed-per-tick scrape loop
//!
//! # Example
//!
//! ```ignore
//! use gator::feed::{scheduler, Fetcher};
//! use gator::util::Shutdown;
//!
//! let fetcher = Fetcher::new()?;
//! scheduler::run(&db, &fetcher, every, Shutdown::never(), &mut std::io::stdout()).await;
//! ```

mod fetcher;
mod parser;
pub mod scheduler;

pub use fetcher::{FetchError, Fetcher, CLIENT_USER_AGENT};
pub use parser::{parse_feed, unescape_html, RssChannel, RssFeed, RssItem};
pub use scheduler::{scrape_once, ScrapeError, ScrapeReport};
