//! URL handling module for ledger-crawl
//!
//! This module loads the URL universe from its list file and derives the
//! deterministic output filename for each URL.

mod list;
mod product_code;

pub use list::{
    count_completed, load_url_list, parse_url_list, pending_urls, validate_target_url,
};
pub use product_code::filename_for;
