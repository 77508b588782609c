//! Chromium backend over the DevTools protocol
//!
//! Launches one Chromium process per run and opens a page per fetch. The
//! CDP event handler runs on its own task, which is tracked so shutdown can
//! stop it instead of leaving it polling a dead connection.

use crate::browser::{BrowserError, BrowserResult, BrowserSession, BrowserTab};
use crate::config::BrowserConfig;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as CdpConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

/// A launched Chromium and its CDP handler task
pub struct ChromiumSession {
    browser: RwLock<Browser>,
    handler: Mutex<Option<JoinHandle<()>>>,
}

impl ChromiumSession {
    /// Launches Chromium with the configured mode
    pub async fn launch(config: &BrowserConfig) -> BrowserResult<Self> {
        let mut builder = CdpConfig::builder()
            .request_timeout(Duration::from_secs(30))
            .window_size(1920, 1080)
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--no-first-run")
            .arg("--no-default-browser-check");

        if config.incognito {
            builder = builder.incognito();
        }
        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(executable) = &config.executable {
            builder = builder.chrome_executable(executable);
        }

        let cdp_config = builder.build().map_err(BrowserError::Launch)?;

        tracing::info!(
            "Launching Chromium (incognito: {}, headless: {})",
            config.incognito,
            config.headless
        );

        let (browser, mut handler) = Browser::launch(cdp_config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::warn!("Browser handler error: {}", e);
                }
            }
            tracing::debug!("Browser event handler task completed");
        });

        Ok(Self {
            browser: RwLock::new(browser),
            handler: Mutex::new(Some(handler_task)),
        })
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    fn name(&self) -> &'static str {
        "chromium"
    }

    async fn open_tab(&self) -> BrowserResult<Box<dyn BrowserTab>> {
        let page = self
            .browser
            .read()
            .await
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::Tab(e.to_string()))?;

        Ok(Box::new(ChromiumTab { page }))
    }

    async fn shutdown(&self) -> BrowserResult<()> {
        let mut browser = self.browser.write().await;
        let closed = browser.close().await;
        // Reap the process even when the close command failed
        let _ = browser.wait().await;

        if let Some(handler) = self.handler.lock().await.take() {
            handler.abort();
        }

        closed
            .map(|_| ())
            .map_err(|e| BrowserError::Launch(format!("close failed: {}", e)))
    }
}

struct ChromiumTab {
    page: Page,
}

#[async_trait]
impl BrowserTab for ChromiumTab {
    async fn navigate(&mut self, url: &str) -> BrowserResult<()> {
        let navigation_error = |message: String| BrowserError::Navigation {
            url: url.to_string(),
            message,
        };

        self.page
            .goto(url)
            .await
            .map_err(|e| navigation_error(e.to_string()))?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| navigation_error(e.to_string()))?;

        Ok(())
    }

    async fn html(&mut self) -> BrowserResult<String> {
        self.page
            .content()
            .await
            .map_err(|e| BrowserError::Content(e.to_string()))
    }

    async fn has_element(&mut self, tag: &str) -> BrowserResult<bool> {
        // querySelectorAll yields an empty list instead of an error on no match
        let elements = self
            .page
            .find_elements(tag)
            .await
            .map_err(|e| BrowserError::Content(e.to_string()))?;
        Ok(!elements.is_empty())
    }

    async fn close(self: Box<Self>) -> BrowserResult<()> {
        self.page
            .close()
            .await
            .map_err(|e| BrowserError::Tab(e.to_string()))
    }
}
