//! Block page detection
//!
//! Product pages on the target always render a heading. A page without one
//! is treated as a block page no matter what else it contains; the keyword
//! scan only catches block pages that happen to render a heading anyway.

use crate::config::DetectionConfig;
use std::fmt;

/// Which rule classified a page as blocked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockReason {
    /// The rendered DOM has no element with the marker tag
    MissingMarker { tag: String },
    /// The raw HTML contains a known block-page phrase
    Keyword(String),
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingMarker { tag } => write!(f, "no <{}> element rendered", tag),
            Self::Keyword(keyword) => write!(f, "block keyword '{}' found", keyword),
        }
    }
}

/// Result of classifying one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Clean,
    Blocked(BlockReason),
}

impl Verdict {
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked(_))
    }
}

/// Structural + keyword block classifier
#[derive(Debug, Clone)]
pub struct BlockDetector {
    marker_tag: String,
    keywords: Vec<String>,
}

impl BlockDetector {
    pub fn new(marker_tag: impl Into<String>, keywords: Vec<String>) -> Self {
        Self {
            marker_tag: marker_tag.into(),
            keywords,
        }
    }

    pub fn from_config(config: &DetectionConfig) -> Self {
        Self::new(config.marker_tag.clone(), config.block_keywords.clone())
    }

    /// The tag the fetcher must query for before classifying
    pub fn marker_tag(&self) -> &str {
        &self.marker_tag
    }

    /// Classifies a rendered page
    ///
    /// # Arguments
    ///
    /// * `html` - The rendered HTML as read from the tab
    /// * `found_marker` - Whether the tab's DOM contains the marker tag
    pub fn classify(&self, html: &str, found_marker: bool) -> Verdict {
        if !found_marker {
            return Verdict::Blocked(BlockReason::MissingMarker {
                tag: self.marker_tag.clone(),
            });
        }

        match self.keywords.iter().find(|k| html.contains(k.as_str())) {
            Some(keyword) => Verdict::Blocked(BlockReason::Keyword(keyword.clone())),
            None => Verdict::Clean,
        }
    }
}

impl Default for BlockDetector {
    fn default() -> Self {
        Self::from_config(&DetectionConfig::default())
    }
}
