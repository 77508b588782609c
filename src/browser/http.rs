//! Plain HTTP backend
//!
//! Each "tab" performs one GET and keeps the response body as its document.
//! There is no JavaScript, so this only suits pages rendered server-side.

use crate::browser::{BrowserError, BrowserResult, BrowserSession, BrowserTab};
use crate::config::BrowserConfig;
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;

/// Sent when the configuration does not name a user agent
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Session backed by a shared reqwest client
pub struct HttpSession {
    client: Client,
}

impl HttpSession {
    /// Builds the HTTP client
    ///
    /// Cookies are never stored, which gives the same isolation between
    /// requests as an incognito browser context.
    pub fn new(config: &BrowserConfig) -> BrowserResult<Self> {
        let user_agent = config
            .user_agent
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        let client = Client::builder()
            .user_agent(user_agent)
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl BrowserSession for HttpSession {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn open_tab(&self) -> BrowserResult<Box<dyn BrowserTab>> {
        Ok(Box::new(HttpTab {
            client: self.client.clone(),
            body: None,
        }))
    }

    async fn shutdown(&self) -> BrowserResult<()> {
        Ok(())
    }
}

struct HttpTab {
    client: Client,
    body: Option<String>,
}

impl HttpTab {
    fn document(&self) -> BrowserResult<&str> {
        self.body.as_deref().ok_or(BrowserError::NotNavigated)
    }
}

#[async_trait]
impl BrowserTab for HttpTab {
    async fn navigate(&mut self, url: &str) -> BrowserResult<()> {
        let navigation_error = |e: reqwest::Error| BrowserError::Navigation {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self.client.get(url).send().await.map_err(navigation_error)?;

        // Error statuses still carry a document; the block detector judges it
        let status = response.status();
        if !status.is_success() {
            tracing::debug!("{} answered HTTP {}", url, status.as_u16());
        }

        self.body = Some(response.text().await.map_err(navigation_error)?);
        Ok(())
    }

    async fn html(&mut self) -> BrowserResult<String> {
        self.document().map(str::to_string)
    }

    async fn has_element(&mut self, tag: &str) -> BrowserResult<bool> {
        let selector = Selector::parse(tag).map_err(|_| BrowserError::Selector(tag.to_string()))?;
        let document = Html::parse_document(self.document()?);
        let found = document.select(&selector).next().is_some();
        Ok(found)
    }

    async fn close(self: Box<Self>) -> BrowserResult<()> {
        Ok(())
    }
}
