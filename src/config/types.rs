use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for ledger-crawl
///
/// Every section has defaults, so an empty file yields a runnable config
/// that reads `urls.txt` and writes into `html_pages/`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub input: InputConfig,
    pub output: OutputConfig,
    pub detection: DetectionConfig,
    pub browser: BrowserConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Number of pages fetched in parallel. Kept at 1 to stay under the radar.
    pub max_workers: u32,

    /// Total attempts per URL, including the first one
    pub max_attempts: u32,

    /// Fixed delay between two attempts on the same URL (milliseconds)
    pub retry_delay_ms: u64,

    /// Upper bound for a single navigation (milliseconds)
    pub navigation_timeout_ms: u64,

    /// Lower bound of the settle wait after navigation (milliseconds)
    pub min_wait_ms: u64,

    /// Upper bound of the settle wait after navigation (milliseconds)
    pub max_wait_ms: u64,
}

impl CrawlerConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn wait_window(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.min_wait_ms),
            Duration::from_millis(self.max_wait_ms),
        )
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_workers: 1,
            max_attempts: 3,
            retry_delay_ms: 2_000,
            navigation_timeout_ms: 15_000,
            min_wait_ms: 10_000,
            max_wait_ms: 15_000,
        }
    }
}

/// Where the URL universe comes from
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct InputConfig {
    /// Plain text file, one URL per line
    pub url_list: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            url_list: PathBuf::from("urls.txt"),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory receiving one HTML file per fetched page
    pub save_dir: PathBuf,

    /// Append-only ledger of completed URLs
    pub completed_ledger: PathBuf,

    /// Persistent log file
    pub log_file: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            save_dir: PathBuf::from("html_pages"),
            completed_ledger: PathBuf::from("completed_urls.txt"),
            log_file: PathBuf::from("crawl.log"),
        }
    }
}

/// Block detection tuning
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DetectionConfig {
    /// Tag every legitimate page renders; its absence means blocked
    pub marker_tag: String,

    /// Substrings that mark a block page even when the marker is present
    pub block_keywords: Vec<String>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            marker_tag: "h1".to_string(),
            block_keywords: vec![
                "您的访问已被禁止".to_string(),
                "访问被拒绝".to_string(),
                "403 Forbidden".to_string(),
            ],
        }
    }
}

/// Which browser backend drives the tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Headless Chromium over CDP, renders JavaScript
    Chromium,
    /// Plain HTTP GET, no JavaScript
    Http,
}

/// Browser session configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BrowserConfig {
    pub backend: BackendKind,

    /// Launch in a private context so no cookies leak between requests
    pub incognito: bool,

    pub headless: bool,

    /// Explicit Chrome/Chromium binary; autodetected when unset
    pub executable: Option<PathBuf>,

    /// User agent sent by the HTTP backend
    pub user_agent: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Chromium,
            incognito: true,
            headless: true,
            executable: None,
            user_agent: None,
        }
    }
}
