pub mod client;
pub mod parse;

pub use client::CrossrefClient;
pub use parse::{format_citation_apa, parse_citation_message, strip_tags};
