//! Page fetching, signal extraction, and relevance scoring.
//!
//! This crate provides:
//! - [`PageSource`], the boundary the scan pipeline fetches pages through,
//!   and [`HttpPageSource`], its plain-HTTP implementation
//! - [`extract_signals`], HTML to [`PageSignals`](seoscan_shared::PageSignals)
//! - [`clean_text`], removal of leaked server-side artifacts from page text
//! - [`RelevanceScorer`] with the TF-IDF based [`LexicalScorer`]

pub mod clean;
pub mod extract;
pub mod relevance;
pub mod source;

pub use clean::clean_text;
pub use extract::extract_signals;
pub use relevance::{LexicalScorer, RelevanceScorer};
pub use source::{HttpPageSource, PageSnapshot, PageSource};
