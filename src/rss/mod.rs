//! Job feed fetching and parsing.
//!
//! This module handles fetching RSS/Atom job feeds over HTTP and turning their
//! entries into job postings keyed by the identifier embedded in each link.

mod client;
mod parser;
mod types;
mod util;

pub use self::client::*;
pub use self::parser::*;
pub use self::types::*;
pub use self::util::*;
