//! Browser automation boundary
//!
//! The crawler only needs a handful of capabilities from a browser: open a
//! tab, navigate it, read the rendered HTML, ask whether an element exists,
//! and close it again. These are expressed as the [`BrowserSession`] and
//! [`BrowserTab`] traits so the fetch pipeline never depends on a concrete
//! driver.
//!
//! Two backends are provided:
//! - [`ChromiumSession`] drives a real Chromium over CDP (feature `chromium`)
//! - [`HttpSession`] issues plain GET requests and parses the response

#[cfg(feature = "chromium")]
mod chromium;
mod http;

#[cfg(feature = "chromium")]
pub use chromium::ChromiumSession;
pub use http::HttpSession;

use crate::config::{BackendKind, BrowserConfig};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by a browser backend
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Failed to open tab: {0}")]
    Tab(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Failed to read page content: {0}")]
    Content(String),

    #[error("Invalid selector '{0}'")]
    Selector(String),

    #[error("Tab used before navigation")]
    NotNavigated,

    #[error("Backend '{0}' is not compiled into this build")]
    Unavailable(&'static str),
}

/// Result type for browser operations
pub type BrowserResult<T> = Result<T, BrowserError>;

/// A browser process shared by every worker for the lifetime of a run
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Opens a fresh tab owned by the caller
    async fn open_tab(&self) -> BrowserResult<Box<dyn BrowserTab>>;

    /// Releases the browser; tabs must not be used afterwards
    async fn shutdown(&self) -> BrowserResult<()>;
}

/// A single tab, used by exactly one fetch at a time
#[async_trait]
pub trait BrowserTab: Send {
    /// Loads the URL, returning once the document has been received
    async fn navigate(&mut self, url: &str) -> BrowserResult<()>;

    /// The current rendered HTML of the document
    async fn html(&mut self) -> BrowserResult<String>;

    /// Whether at least one element matches the given tag
    async fn has_element(&mut self, tag: &str) -> BrowserResult<bool>;

    /// Closes the tab
    async fn close(self: Box<Self>) -> BrowserResult<()>;
}

/// Starts the session selected by the configuration
///
/// Failing here is fatal for the run: nothing can be fetched without a browser.
pub async fn launch_session(config: &BrowserConfig) -> BrowserResult<Arc<dyn BrowserSession>> {
    match config.backend {
        BackendKind::Http => {
            let session = HttpSession::new(config)?;
            Ok(Arc::new(session))
        }
        #[cfg(feature = "chromium")]
        BackendKind::Chromium => {
            let session = ChromiumSession::launch(config).await?;
            Ok(Arc::new(session))
        }
        #[cfg(not(feature = "chromium"))]
        BackendKind::Chromium => Err(BrowserError::Unavailable("chromium")),
    }
}
