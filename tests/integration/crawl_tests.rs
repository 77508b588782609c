//! Integration tests for the crawler
//!
//! The orchestrator is driven two ways: through a scripted in-memory browser
//! for the resume, retry and block scenarios, and through the HTTP backend
//! against wiremock for the full load, fetch, store, record cycle.

use async_trait::async_trait;
use ledger_crawl::browser::{
    BrowserError, BrowserResult, BrowserSession, BrowserTab, HttpSession,
};
use ledger_crawl::config::{BackendKind, Config};
use ledger_crawl::crawler::{BlockDetector, FetchTiming, PageFetcher, RetryPolicy};
use ledger_crawl::output::{EXIT_BLOCKED, EXIT_COMPLETED};
use ledger_crawl::storage::{CompletedStore, FileLedger, PageStore};
use ledger_crawl::{crawl, filename_for, Coordinator};
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CLEAN: &str = "<html><body><h1>Product</h1><p>In stock</p></body></html>";
const DENIED: &str = "<html><body><p>您的访问已被禁止</p></body></html>";

/// One scripted navigation result
#[derive(Clone)]
enum Step {
    Render(&'static str),
    /// Renders after holding the navigation open
    Slow(&'static str, Duration),
    Fail,
}

type Scripts = Arc<Mutex<HashMap<String, VecDeque<Step>>>>;

/// Browser whose pages follow a per-URL script
///
/// Each navigation to a URL consumes the next step of its script; the last
/// step repeats once the script runs out.
struct ScriptedBrowser {
    scripts: Scripts,
    navigations: Arc<Mutex<Vec<String>>>,
}

impl ScriptedBrowser {
    fn new(scripts: Vec<(&str, Vec<Step>)>) -> Arc<Self> {
        Arc::new(Self {
            scripts: Arc::new(Mutex::new(
                scripts
                    .into_iter()
                    .map(|(url, steps)| (url.to_string(), steps.into()))
                    .collect(),
            )),
            navigations: Arc::new(Mutex::new(Vec::new())),
        })
    }

    fn navigations(&self) -> Vec<String> {
        self.navigations.lock().unwrap().clone()
    }

    fn count(&self, url: &str) -> usize {
        self.navigations().iter().filter(|u| *u == url).count()
    }
}

#[async_trait]
impl BrowserSession for ScriptedBrowser {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn open_tab(&self) -> BrowserResult<Box<dyn BrowserTab>> {
        Ok(Box::new(ScriptedTab {
            scripts: Arc::clone(&self.scripts),
            navigations: Arc::clone(&self.navigations),
            html: None,
        }))
    }

    async fn shutdown(&self) -> BrowserResult<()> {
        Ok(())
    }
}

struct ScriptedTab {
    scripts: Scripts,
    navigations: Arc<Mutex<Vec<String>>>,
    html: Option<String>,
}

impl ScriptedTab {
    fn next_step(&self, url: &str) -> Step {
        let mut scripts = self.scripts.lock().unwrap();
        let steps = scripts.get_mut(url).expect("unscripted URL navigated");
        if steps.len() > 1 {
            steps.pop_front().unwrap()
        } else {
            steps.front().cloned().unwrap()
        }
    }
}

#[async_trait]
impl BrowserTab for ScriptedTab {
    async fn navigate(&mut self, url: &str) -> BrowserResult<()> {
        self.navigations.lock().unwrap().push(url.to_string());
        match self.next_step(url) {
            Step::Render(html) => {
                self.html = Some(html.to_string());
                Ok(())
            }
            Step::Slow(html, delay) => {
                tokio::time::sleep(delay).await;
                self.html = Some(html.to_string());
                Ok(())
            }
            Step::Fail => Err(BrowserError::Navigation {
                url: url.to_string(),
                message: "net::ERR_TIMED_OUT".to_string(),
            }),
        }
    }

    async fn html(&mut self) -> BrowserResult<String> {
        self.html.clone().ok_or(BrowserError::NotNavigated)
    }

    async fn has_element(&mut self, tag: &str) -> BrowserResult<bool> {
        Ok(self
            .html
            .as_deref()
            .map(|h| h.contains(&format!("<{}>", tag)))
            .unwrap_or(false))
    }

    async fn close(self: Box<Self>) -> BrowserResult<()> {
        Ok(())
    }
}

/// Coordinator over a scripted browser with no waits and a 1ms retry delay
fn scripted_coordinator(browser: Arc<ScriptedBrowser>, dir: &Path, workers: usize) -> Coordinator {
    let ledger: Arc<dyn CompletedStore> =
        Arc::new(FileLedger::new(dir.join("completed_urls.txt")));
    let fetcher = PageFetcher::new(
        browser.clone(),
        Arc::clone(&ledger),
        PageStore::new(dir.join("html_pages")),
        BlockDetector::default(),
        RetryPolicy::new(3, Duration::from_millis(1)),
        FetchTiming {
            navigation_timeout: Duration::from_secs(5),
            min_wait: Duration::ZERO,
            max_wait: Duration::ZERO,
        },
    );
    Coordinator::with_fetcher(browser, ledger, fetcher, workers)
}

fn ledger_lines(dir: &Path) -> Vec<String> {
    std::fs::read_to_string(dir.join("completed_urls.txt"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

fn urls(list: &[&str]) -> Vec<String> {
    list.iter().map(|u| u.to_string()).collect()
}

/// Test configuration rooted in a temp dir, HTTP backend, no waits
fn create_test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.crawler.max_workers = 1;
    config.crawler.max_attempts = 3;
    config.crawler.retry_delay_ms = 1;
    config.crawler.navigation_timeout_ms = 5_000;
    config.crawler.min_wait_ms = 0;
    config.crawler.max_wait_ms = 0;
    config.input.url_list = dir.join("urls.txt");
    config.output.save_dir = dir.join("html_pages");
    config.output.completed_ledger = dir.join("completed_urls.txt");
    config.output.log_file = dir.join("crawl.log");
    config.browser.backend = BackendKind::Http;
    config
}

#[tokio::test]
async fn test_block_halts_session_and_cancels_unstarted() {
    let dir = TempDir::new().unwrap();
    let a = "https://shop.example.com/p/H100AA";
    let b = "https://shop.example.com/p/H200BB";
    let c = "https://shop.example.com/p/H300CC";
    let browser = ScriptedBrowser::new(vec![
        (a, vec![Step::Render(CLEAN)]),
        (b, vec![Step::Render(DENIED)]),
        (c, vec![Step::Render(CLEAN)]),
    ]);
    let coordinator = scripted_coordinator(browser.clone(), dir.path(), 1);

    let summary = coordinator.run(&urls(&[a, b, c])).await.unwrap();

    assert!(summary.blocked);
    assert_eq!(summary.blocked_url.as_deref(), Some(b));
    assert_eq!(summary.success_count, 1);
    assert_eq!(summary.fail_count, 1);
    assert_eq!(summary.cancelled, 1);
    assert_eq!(summary.exit_code(), EXIT_BLOCKED);

    // B used its full retry budget; C was never started
    assert_eq!(browser.count(b), 3);
    assert_eq!(browser.count(c), 0);
    assert_eq!(ledger_lines(dir.path()), vec![a.to_string()]);
    assert!(dir.path().join("html_pages/H100AA.html").exists());
    assert!(!dir.path().join("html_pages/H300CC.html").exists());
}

#[tokio::test]
async fn test_in_flight_page_finishes_after_block() {
    let dir = TempDir::new().unwrap();
    let a = "https://shop.example.com/p/H100AA";
    let b = "https://shop.example.com/p/H200BB";
    let c = "https://shop.example.com/p/H300CC";
    let browser = ScriptedBrowser::new(vec![
        (a, vec![Step::Slow(CLEAN, Duration::from_millis(300))]),
        (b, vec![Step::Render(DENIED)]),
        (c, vec![Step::Render(CLEAN)]),
    ]);
    let coordinator = scripted_coordinator(browser.clone(), dir.path(), 2);

    let summary = coordinator.run(&urls(&[a, b, c])).await.unwrap();

    assert!(summary.blocked);
    assert_eq!(summary.blocked_url.as_deref(), Some(b));
    assert_eq!(summary.success_count, 0);
    assert_eq!(summary.fail_count, 1);
    assert_eq!(summary.cancelled, 1);
    assert_eq!(summary.finished_after_abort, 1);
    assert_eq!(summary.exit_code(), EXIT_BLOCKED);

    // A was already rendering when B tripped the abort, so it still lands
    assert_eq!(browser.count(c), 0);
    assert!(dir.path().join("html_pages/H100AA.html").exists());
    assert_eq!(ledger_lines(dir.path()), vec![a.to_string()]);
}

#[tokio::test]
async fn test_rerun_after_block_resumes_where_it_stopped() {
    let dir = TempDir::new().unwrap();
    let a = "https://shop.example.com/p/H100AA";
    let b = "https://shop.example.com/p/H200BB";
    let c = "https://shop.example.com/p/H300CC";
    let list = urls(&[a, b, c]);

    let blocked = ScriptedBrowser::new(vec![
        (a, vec![Step::Render(CLEAN)]),
        (b, vec![Step::Render(DENIED)]),
    ]);
    let first = scripted_coordinator(blocked, dir.path(), 1)
        .run(&list)
        .await
        .unwrap();
    assert!(first.blocked);

    // New egress: B now renders normally
    let recovered = ScriptedBrowser::new(vec![
        (b, vec![Step::Render(CLEAN)]),
        (c, vec![Step::Render(CLEAN)]),
    ]);
    let second = scripted_coordinator(recovered.clone(), dir.path(), 1)
        .run(&list)
        .await
        .unwrap();

    assert!(!second.blocked);
    assert_eq!(second.skipped, 1);
    assert_eq!(second.success_count, 2);
    assert_eq!(recovered.count(a), 0);
    assert_eq!(ledger_lines(dir.path()), urls(&[a, b, c]));
}

#[tokio::test]
async fn test_resume_only_fetches_missing_urls() {
    let dir = TempDir::new().unwrap();
    let a = "https://shop.example.com/p/H100AA";
    let b = "https://shop.example.com/p/H200BB";
    std::fs::write(dir.path().join("completed_urls.txt"), format!("{}\n", a)).unwrap();

    let browser = ScriptedBrowser::new(vec![(b, vec![Step::Render(CLEAN)])]);
    let summary = scripted_coordinator(browser.clone(), dir.path(), 1)
        .run(&urls(&[a, b]))
        .await
        .unwrap();

    assert_eq!(browser.navigations(), vec![b.to_string()]);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.success_count, 1);
    assert_eq!(summary.exit_code(), EXIT_COMPLETED);
}

#[tokio::test]
async fn test_retry_then_success_records_once() {
    let dir = TempDir::new().unwrap();
    let a = "https://shop.example.com/p/H100AA";
    let browser = ScriptedBrowser::new(vec![(a, vec![Step::Fail, Step::Render(CLEAN)])]);

    let summary = scripted_coordinator(browser.clone(), dir.path(), 1)
        .run(&urls(&[a]))
        .await
        .unwrap();

    assert_eq!(summary.success_count, 1);
    assert_eq!(summary.fail_count, 0);
    assert_eq!(browser.count(a), 2);
    assert_eq!(ledger_lines(dir.path()), vec![a.to_string()]);
}

#[tokio::test]
async fn test_transient_failures_do_not_halt_the_run() {
    let dir = TempDir::new().unwrap();
    let a = "https://shop.example.com/p/H100AA";
    let b = "https://shop.example.com/p/H200BB";
    let browser = ScriptedBrowser::new(vec![
        (a, vec![Step::Fail]),
        (b, vec![Step::Render(CLEAN)]),
    ]);

    let summary = scripted_coordinator(browser.clone(), dir.path(), 1)
        .run(&urls(&[a, b]))
        .await
        .unwrap();

    assert!(!summary.blocked);
    assert_eq!(summary.fail_count, 1);
    assert_eq!(summary.success_count, 1);
    assert_eq!(browser.count(a), 3);
    assert_eq!(ledger_lines(dir.path()), vec![b.to_string()]);
}

#[tokio::test]
async fn test_parallel_workers_fetch_everything_once() {
    let dir = TempDir::new().unwrap();
    let list: Vec<String> = (1..=8)
        .map(|i| format!("https://shop.example.com/p/H{}00XY", i))
        .collect();
    let scripts = list
        .iter()
        .map(|u| (u.as_str(), vec![Step::Render(CLEAN)]))
        .collect();
    let browser = ScriptedBrowser::new(scripts);

    let summary = scripted_coordinator(browser.clone(), dir.path(), 4)
        .run(&list)
        .await
        .unwrap();

    assert_eq!(summary.success_count, 8);
    assert_eq!(browser.navigations().len(), 8);

    let mut recorded = ledger_lines(dir.path());
    recorded.sort();
    let mut expected = list.clone();
    expected.sort();
    assert_eq!(recorded, expected);
}

#[tokio::test]
async fn test_full_crawl_over_http() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/p/H242899ZA01390"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CLEAN))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><body><h1>About us</h1></body></html>",
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let product = format!("{}/p/H242899ZA01390", base_url);
    let about = format!("{}/about", base_url);
    std::fs::write(
        &config.input.url_list,
        format!("{}\n\n{}\n{}\nnot a url\n", product, about, product),
    )
    .unwrap();

    let session = Arc::new(HttpSession::new(&config.browser).unwrap());
    let summary = crawl(&config, session, CancellationToken::new()).await.unwrap();

    assert_eq!(summary.total_urls, 2);
    assert_eq!(summary.success_count, 2);
    assert_eq!(summary.exit_code(), EXIT_COMPLETED);

    let saved = std::fs::read_to_string(dir.path().join("html_pages/H242899ZA013.html")).unwrap();
    assert_eq!(saved, CLEAN);

    assert!(dir
        .path()
        .join("html_pages")
        .join(filename_for(&about))
        .exists());

    let mut recorded = ledger_lines(dir.path());
    recorded.sort();
    let mut expected = vec![product, about];
    expected.sort();
    assert_eq!(recorded, expected);

    // Second run touches nothing; the mocks above expect exactly one hit each
    let session = Arc::new(HttpSession::new(&config.browser).unwrap());
    let rerun = crawl(&config, session, CancellationToken::new()).await.unwrap();
    assert_eq!(rerun.skipped, 2);
    assert_eq!(rerun.success_count, 0);
}

#[tokio::test]
async fn test_forbidden_response_blocks_over_http() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/p/H1FORBID"))
        .respond_with(ResponseTemplate::new(403).set_body_string("<html>403 Forbidden</html>"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let url = format!("{}/p/H1FORBID", mock_server.uri());
    std::fs::write(&config.input.url_list, format!("{}\n", url)).unwrap();

    let session = Arc::new(HttpSession::new(&config.browser).unwrap());
    let summary = crawl(&config, session, CancellationToken::new()).await.unwrap();

    assert!(summary.blocked);
    assert_eq!(summary.blocked_url, Some(url));
    assert_eq!(summary.exit_code(), EXIT_BLOCKED);
    assert!(ledger_lines(dir.path()).is_empty());
}

#[tokio::test]
async fn test_missing_url_list_is_an_error() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());

    let session = Arc::new(HttpSession::new(&config.browser).unwrap());
    let result = crawl(&config, session, CancellationToken::new()).await;

    assert!(matches!(result, Err(ledger_crawl::CrawlError::UrlList { .. })));
}

#[tokio::test]
async fn test_cancelled_crawl_fetches_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CLEAN))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    std::fs::write(
        &config.input.url_list,
        format!("{0}/p/H1A\n{0}/p/H2B\n", mock_server.uri()),
    )
    .unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();

    let session = Arc::new(HttpSession::new(&config.browser).unwrap());
    let summary = crawl(&config, session, cancel).await.unwrap();

    assert!(summary.interrupted);
    assert!(!summary.blocked);
    assert_eq!(summary.cancelled, 2);
    assert_eq!(summary.success_count, 0);
    assert_eq!(summary.exit_code(), EXIT_COMPLETED);
    assert!(ledger_lines(dir.path()).is_empty());
}
