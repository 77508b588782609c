//! Page fetcher
//!
//! Drives one browser tab through a single attempt on a URL:
//! - Open a tab on the shared session
//! - Navigate with a bounded timeout
//! - Wait a random settle time inside the configured window
//! - Read the rendered HTML and query for the marker element
//! - Classify the page, then store it and record it in the ledger
//!
//! The tab is closed on every exit path, a panicking attempt included. Attempts are wrapped in the
//! [`RetryPolicy`] envelope by [`PageFetcher::fetch`].

use crate::browser::{BrowserError, BrowserResult, BrowserSession, BrowserTab};
use crate::config::{Config, CrawlerConfig};
use crate::crawler::detector::{BlockDetector, Verdict};
use crate::crawler::retry::RetryPolicy;
use crate::state::{FetchOutcome, FetchPhase};
use crate::storage::{CompletedStore, PageStore, StoredPage};
use crate::{FetchError, FetchResult};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// Timing knobs for a single attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTiming {
    /// Upper bound on navigation
    pub navigation_timeout: Duration,
    /// Lower bound of the settle wait
    pub min_wait: Duration,
    /// Upper bound of the settle wait
    pub max_wait: Duration,
}

impl FetchTiming {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        let (min_wait, max_wait) = config.wait_window();
        Self {
            navigation_timeout: config.navigation_timeout(),
            min_wait,
            max_wait,
        }
    }

    /// Picks a settle wait uniformly inside the window
    pub fn settle_wait(&self) -> Duration {
        let min = self.min_wait.as_millis() as u64;
        let max = self.max_wait.as_millis() as u64;
        if max <= min {
            return self.min_wait;
        }
        Duration::from_millis(rand::rng().random_range(min..=max))
    }
}

impl Default for FetchTiming {
    fn default() -> Self {
        Self::from_config(&CrawlerConfig::default())
    }
}

/// Tracks the phase of one attempt and logs each transition
struct PhaseTracker<'a> {
    url: &'a str,
    attempt: u32,
    phase: FetchPhase,
}

impl<'a> PhaseTracker<'a> {
    fn new(url: &'a str, attempt: u32) -> Self {
        Self {
            url,
            attempt,
            phase: FetchPhase::Idle,
        }
    }

    fn advance(&mut self, to: FetchPhase) -> FetchResult<()> {
        if !self.phase.can_transition_to(to) {
            return Err(FetchError::InvalidTransition {
                from: self.phase,
                to,
            });
        }
        tracing::debug!(
            "{} (attempt {}): {} -> {}",
            self.url,
            self.attempt,
            self.phase,
            to
        );
        self.phase = to;
        Ok(())
    }

    fn fail(&mut self) {
        if self.phase.is_active() {
            self.phase = FetchPhase::Failed;
        }
    }
}

/// Owns an open tab for the length of one attempt
///
/// [`TabGuard::close`] is the normal path. If the attempt unwinds or is
/// dropped first, the tab is closed on a spawned task instead.
struct TabGuard {
    tab: Option<Box<dyn BrowserTab>>,
}

impl TabGuard {
    fn new(tab: Box<dyn BrowserTab>) -> Self {
        Self { tab: Some(tab) }
    }

    fn get(&mut self) -> BrowserResult<&mut (dyn BrowserTab + 'static)> {
        self.tab
            .as_deref_mut()
            .ok_or_else(|| BrowserError::Tab("tab already closed".to_string()))
    }

    async fn close(mut self) -> BrowserResult<()> {
        match self.tab.take() {
            Some(tab) => tab.close().await,
            None => Ok(()),
        }
    }
}

impl Drop for TabGuard {
    fn drop(&mut self) {
        let Some(tab) = self.tab.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = tab.close().await {
                        tracing::warn!("Failed to close abandoned tab: {}", e);
                    }
                });
            }
            Err(_) => tracing::warn!("Abandoned tab dropped outside the runtime, not closed"),
        }
    }
}

/// Fetches, classifies and persists single URLs
pub struct PageFetcher {
    session: Arc<dyn BrowserSession>,
    ledger: Arc<dyn CompletedStore>,
    pages: PageStore,
    detector: BlockDetector,
    retry: RetryPolicy,
    timing: FetchTiming,
}

impl PageFetcher {
    pub fn new(
        session: Arc<dyn BrowserSession>,
        ledger: Arc<dyn CompletedStore>,
        pages: PageStore,
        detector: BlockDetector,
        retry: RetryPolicy,
        timing: FetchTiming,
    ) -> Self {
        Self {
            session,
            ledger,
            pages,
            detector,
            retry,
            timing,
        }
    }

    /// Builds a fetcher from the run configuration
    pub fn from_config(
        config: &Config,
        session: Arc<dyn BrowserSession>,
        ledger: Arc<dyn CompletedStore>,
    ) -> Self {
        Self::new(
            session,
            ledger,
            PageStore::new(&config.output.save_dir),
            BlockDetector::from_config(&config.detection),
            RetryPolicy::from_config(&config.crawler),
            FetchTiming::from_config(&config.crawler),
        )
    }

    /// Fetches a URL inside the retry envelope
    ///
    /// Never fails: every error is folded into the returned outcome.
    pub async fn fetch(&self, url: &str) -> FetchOutcome {
        let result = self
            .retry
            .run(url, |attempt| self.fetch_once(url, attempt))
            .await;
        FetchOutcome::from(result)
    }

    /// One attempt, without retries
    pub async fn fetch_once(&self, url: &str, attempt: u32) -> FetchResult<StoredPage> {
        let mut phase = PhaseTracker::new(url, attempt);

        let mut tab = match self.session.open_tab().await {
            Ok(tab) => TabGuard::new(tab),
            Err(e) => {
                phase.fail();
                return Err(e.into());
            }
        };

        let result = match phase.advance(FetchPhase::TabOpened) {
            Ok(()) => match tab.get() {
                Ok(open) => self.drive_tab(open, url, &mut phase).await,
                Err(e) => Err(e.into()),
            },
            Err(e) => Err(e),
        };

        if let Err(e) = tab.close().await {
            tracing::warn!("Failed to close tab for {}: {}", url, e);
        }

        if let Err(e) = &result {
            phase.fail();
            tracing::warn!("{} (attempt {}) failed: {}", url, attempt, e);
        }
        result
    }

    async fn drive_tab(
        &self,
        tab: &mut dyn BrowserTab,
        url: &str,
        phase: &mut PhaseTracker<'_>,
    ) -> FetchResult<StoredPage> {
        match tokio::time::timeout(self.timing.navigation_timeout, tab.navigate(url)).await {
            Err(_) => {
                return Err(FetchError::Timeout {
                    url: url.to_string(),
                    after: self.timing.navigation_timeout,
                })
            }
            Ok(Err(BrowserError::Navigation { message, .. })) => {
                return Err(FetchError::Navigation {
                    url: url.to_string(),
                    message,
                })
            }
            Ok(Err(e)) => return Err(e.into()),
            Ok(Ok(())) => {}
        }
        phase.advance(FetchPhase::Navigated)?;

        let wait = self.timing.settle_wait();
        tracing::debug!("Waiting {:?} for {} to settle", wait, url);
        tokio::time::sleep(wait).await;
        phase.advance(FetchPhase::Waited)?;

        let html = tab.html().await?;
        let found_marker = tab.has_element(self.detector.marker_tag()).await?;

        if let Verdict::Blocked(reason) = self.detector.classify(&html, found_marker) {
            tracing::error!("Possible block at {}: {}", url, reason);
            return Err(FetchError::Blocked {
                url: url.to_string(),
                reason,
            });
        }
        phase.advance(FetchPhase::Classified)?;

        let stored = self.pages.save(url, &html).await?;
        self.ledger.append(url).await?;
        phase.advance(FetchPhase::Persisted)?;

        tracing::info!("Saved {} -> {}", url, stored.filename);
        Ok(stored)
    }
}
