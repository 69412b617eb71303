//! Utility functions for common operations.
//!
//! - **Durations**: Parsing and formatting interval strings such as `1m30s`
//! - **URL validation**: Accepting only fetchable http(s) feed URLs
//! - **Shutdown**: A cloneable cancellation token for long-running loops
//!
//! # Examples
//!
//! ```
//! use gator::util::{parse_duration, validate_url};
//!
//! let every = parse_duration("30s").unwrap();
//! let url = validate_url("https://example.com/feed.xml").unwrap();
//! ```

mod duration;
pub mod shutdown;
mod url_validator;

pub use duration::{format_duration, parse_duration, DurationError};
pub use shutdown::{Shutdown, ShutdownTrigger};
pub use url_validator::{validate_url, UrlValidationError};
