use crate::{CrawlError, UrlError};
use std::collections::HashSet;
use std::path::Path;
use url::Url;

/// Checks that a URL-list entry is an absolute http(s) URL
///
/// The entry itself is kept verbatim; parsing only guards against typos
/// such as a missing scheme.
pub fn validate_target_url(url_str: &str) -> Result<(), UrlError> {
    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(format!("{}: {}", url_str, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    Ok(())
}

/// Parses URL-list text: one URL per line, blank lines ignored
///
/// Lines are trimmed. Invalid entries are skipped with a warning and
/// duplicates keep their first position, so the result preserves file order.
pub fn parse_url_list(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let entry = line.trim();
        if entry.is_empty() {
            continue;
        }

        if let Err(e) = validate_target_url(entry) {
            tracing::warn!("Skipping line {} of URL list: {}", index + 1, e);
            continue;
        }

        if seen.insert(entry.to_string()) {
            urls.push(entry.to_string());
        } else {
            tracing::debug!("Duplicate URL in list ignored: {}", entry);
        }
    }

    urls
}

/// Loads the URL universe from a plain text file
///
/// # Returns
///
/// * `Ok(Vec<String>)` - URLs in file order, deduplicated
/// * `Err(CrawlError::UrlList)` - The file could not be read
pub fn load_url_list(path: &Path) -> Result<Vec<String>, CrawlError> {
    let content = std::fs::read_to_string(path).map_err(|source| CrawlError::UrlList {
        path: path.display().to_string(),
        source,
    })?;

    Ok(parse_url_list(&content))
}

/// Universe minus the completed set, in universe order
///
/// A URL listed more than once is queued once, at its first position.
pub fn pending_urls(universe: &[String], completed: &HashSet<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    universe
        .iter()
        .filter(|url| !completed.contains(url.as_str()))
        .filter(|url| seen.insert(url.as_str()))
        .cloned()
        .collect()
}

/// Number of distinct universe URLs already in the completed set
///
/// Ledger entries that are not part of the universe are not counted.
pub fn count_completed(universe: &[String], completed: &HashSet<String>) -> usize {
    universe
        .iter()
        .filter(|url| completed.contains(url.as_str()))
        .map(String::as_str)
        .collect::<HashSet<_>>()
        .len()
}
