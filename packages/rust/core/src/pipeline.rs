//! End-to-end scan pipeline: URL → sitemap → tree → key pages → analysis → report.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};
use url::Url;

use seoscan_crawler::PageSource;
use seoscan_discovery::{DiscoveryOptions, discover_sitemap};
use seoscan_shared::{Result, ScanConfig, SeoScanError};

use crate::lint::RuleEngine;
use crate::report::{PageFailure, PageReport, SiteReport, assemble_page};
use crate::score::ScoreAggregator;
use crate::select::select_key_pages;
use crate::tree::build_site_tree;

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when a page's analysis has finished, successfully or not.
    fn page_done(&self, url: &str, current: usize, total: usize);
    /// Called when the report is complete.
    fn done(&self, report: &SiteReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn page_done(&self, _url: &str, _current: usize, _total: usize) {}
    fn done(&self, _report: &SiteReport) {}
}

/// Run a full scan of the site at `base_url`.
///
/// Pipeline phases:
/// 1. Discover sitemap entries
/// 2. Build the site tree
/// 3. Select key pages
/// 4. Analyze the selected pages concurrently
#[instrument(skip_all, fields(url = %base_url))]
pub async fn scan_site<S>(
    base_url: &Url,
    config: &ScanConfig,
    source: Arc<S>,
    progress: &dyn ProgressReporter,
) -> Result<SiteReport>
where
    S: PageSource + 'static,
{
    config.validate()?;
    validate_base_url(base_url)?;
    let start = Instant::now();

    info!(
        max_pages = config.max_pages,
        concurrency = config.concurrency,
        "starting scan"
    );

    // --- Phase 1: Sitemap ---
    progress.phase("Discovering sitemap");
    let opts = DiscoveryOptions {
        timeout_secs: config.timeout_secs,
        allow_private: config.allow_private_hosts,
        ..DiscoveryOptions::default()
    };
    let entries = discover_sitemap(base_url, &opts).await?;
    if entries.is_empty() {
        warn!("no sitemap entries found, analyzing the home page only");
    }

    // --- Phase 2: Tree ---
    progress.phase("Building site tree");
    let tree = build_site_tree(base_url, &entries);

    // --- Phase 3: Key pages ---
    progress.phase("Selecting key pages");
    let urls = select_key_pages(&tree, &config.priority_keywords, config.max_pages)?;
    info!(
        nodes = tree.count_nodes(),
        selected = urls.len(),
        "key pages selected"
    );

    // --- Phase 4: Analysis ---
    let report = analyze_pages(base_url.as_str(), urls, config, source, progress).await?;

    info!(
        pages = report.pages.len(),
        failures = report.failures.len(),
        elapsed_ms = start.elapsed().as_millis(),
        "scan complete"
    );

    Ok(report)
}

/// Analyze an explicit list of page URLs.
///
/// At most `config.concurrency` pages are in flight; each one gets
/// `config.page_timeout_secs`. Pages that fail or time out are recorded in
/// [`SiteReport::failures`]. Report pages keep the order of `urls`.
#[instrument(skip_all, fields(base_url = %base_url, pages = urls.len()))]
pub async fn analyze_pages<S>(
    base_url: &str,
    urls: Vec<String>,
    config: &ScanConfig,
    source: Arc<S>,
    progress: &dyn ProgressReporter,
) -> Result<SiteReport>
where
    S: PageSource + 'static,
{
    config.validate()?;

    progress.phase("Analyzing pages");

    let engine = Arc::new(RuleEngine::new(config.rules.clone()));
    let scorer = Arc::new(ScoreAggregator::new(config.scoring.clone()));
    let semaphore = Arc::new(Semaphore::new(config.concurrency));
    let page_timeout = Duration::from_secs(config.page_timeout_secs);

    let handles: Vec<_> = urls
        .iter()
        .map(|url| {
            let url = url.clone();
            let source = Arc::clone(&source);
            let engine = Arc::clone(&engine);
            let scorer = Arc::clone(&scorer);
            let sem = Arc::clone(&semaphore);

            tokio::spawn(async move {
                let _permit = sem
                    .acquire_owned()
                    .await
                    .map_err(|e| SeoScanError::validation(format!("page limiter closed: {e}")))?;
                analyze_page(source.as_ref(), &engine, &scorer, &url, page_timeout).await
            })
        })
        .collect();

    let total = handles.len();
    let mut pages: Vec<PageReport> = Vec::with_capacity(total);
    let mut failures: Vec<PageFailure> = Vec::new();

    for (i, (url, handle)) in urls.into_iter().zip(handles).enumerate() {
        let error = match handle.await {
            Ok(Ok(page)) => {
                debug!(%url, score = page.seo_score, status = %page.status, "page analyzed");
                pages.push(page);
                None
            }
            Ok(Err(e)) => Some(e.to_string()),
            Err(e) => Some(format!("analysis task failed: {e}")),
        };

        progress.page_done(&url, i + 1, total);

        if let Some(error) = error {
            warn!(%url, %error, "page skipped");
            failures.push(PageFailure { url, error });
        }
    }

    let report = SiteReport::new(base_url, pages, failures);
    progress.done(&report);

    Ok(report)
}

/// Fetch, lint and score a single page.
async fn analyze_page<S: PageSource>(
    source: &S,
    engine: &RuleEngine,
    scorer: &ScoreAggregator,
    url: &str,
    page_timeout: Duration,
) -> Result<PageReport> {
    let parsed = Url::parse(url)
        .map_err(|e| SeoScanError::validation(format!("invalid page URL {url}: {e}")))?;

    let snapshot = tokio::time::timeout(page_timeout, source.fetch(&parsed))
        .await
        .map_err(|_| SeoScanError::Timeout {
            url: url.to_string(),
            secs: page_timeout.as_secs(),
        })??;

    let findings = engine.evaluate(&snapshot.signals);
    Ok(assemble_page(
        url,
        snapshot.rendering_time_secs,
        snapshot.signals.meta_relevance,
        findings,
        scorer,
    ))
}

fn validate_base_url(url: &Url) -> Result<()> {
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(()),
        _ => Err(SeoScanError::validation(format!(
            "base URL must be an http(s) URL with a host: {url}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use seoscan_crawler::{HttpPageSource, PageSnapshot};
    use seoscan_shared::{FindingLevel, PageSignals, PageStatus};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// In-memory page source with per-URL delays.
    struct FakeSource {
        pages: HashMap<String, (Duration, PageSignals)>,
    }

    impl FakeSource {
        fn new(pages: &[(&str, u64)]) -> Self {
            let pages = pages
                .iter()
                .map(|(url, delay_ms)| {
                    let signals = PageSignals {
                        title: Some(format!("Page {url}")),
                        ..Default::default()
                    };
                    (url.to_string(), (Duration::from_millis(*delay_ms), signals))
                })
                .collect();
            Self { pages }
        }
    }

    impl PageSource for FakeSource {
        async fn fetch(&self, url: &Url) -> Result<PageSnapshot> {
            let (delay, signals) = self
                .pages
                .get(url.as_str())
                .cloned()
                .ok_or_else(|| SeoScanError::Network(format!("{url}: HTTP 404 Not Found")))?;
            tokio::time::sleep(delay).await;
            Ok(PageSnapshot {
                url: url.to_string(),
                rendering_time_secs: delay.as_secs_f64(),
                signals,
            })
        }
    }

    #[derive(Default)]
    struct RecordingProgress {
        done: Mutex<Vec<String>>,
    }

    impl ProgressReporter for RecordingProgress {
        fn phase(&self, _name: &str) {}
        fn page_done(&self, url: &str, _current: usize, _total: usize) {
            self.done.lock().unwrap().push(url.to_string());
        }
        fn done(&self, _report: &SiteReport) {}
    }

    fn config(concurrency: usize) -> ScanConfig {
        ScanConfig {
            concurrency,
            page_timeout_secs: 1,
            ..ScanConfig::default()
        }
    }

    #[tokio::test]
    async fn test_pages_keep_input_order() {
        let source = Arc::new(FakeSource::new(&[
            ("https://example.com/", 150),
            ("https://example.com/about", 80),
            ("https://example.com/contacts", 10),
        ]));
        let urls: Vec<String> = source_urls(&["/", "/about", "/contacts"]);
        let progress = RecordingProgress::default();

        let report = analyze_pages("https://example.com/", urls.clone(), &config(3), source, &progress)
            .await
            .unwrap();

        let got: Vec<&str> = report.pages.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(got, urls.iter().map(String::as_str).collect::<Vec<_>>());
        assert!(report.failures.is_empty());
        assert_eq!(progress.done.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_failures_are_recorded_not_fatal() {
        let source = Arc::new(FakeSource::new(&[
            ("https://example.com/", 0),
            ("https://example.com/slow", 3_000),
        ]));
        let urls = source_urls(&["/", "/missing", "/slow"]);

        let report = analyze_pages("https://example.com/", urls, &config(2), source, &SilentProgress)
            .await
            .unwrap();

        assert_eq!(report.pages.len(), 1);
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures[0].url, "https://example.com/missing");
        assert!(report.failures[0].error.contains("404"));
        assert_eq!(report.failures[1].url, "https://example.com/slow");
        assert!(report.failures[1].error.contains("timed out after 1s"));
    }

    #[tokio::test]
    async fn test_zero_concurrency_rejected() {
        let source = Arc::new(FakeSource::new(&[]));
        let err = analyze_pages("https://example.com/", vec![], &config(0), source, &SilentProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, SeoScanError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_scan_rejects_non_http_base() {
        let source = Arc::new(FakeSource::new(&[]));
        let url = Url::parse("ftp://example.com/").unwrap();
        let err = scan_site(&url, &config(1), source, &SilentProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, SeoScanError::Validation { .. }));
    }

    fn source_urls(paths: &[&str]) -> Vec<String> {
        paths
            .iter()
            .map(|p| format!("https://example.com{p}"))
            .collect()
    }

    const GOOD_PAGE: &str = r#"<!DOCTYPE html><html><head>
<title>Handmade Oak Furniture Workshop - Tables, Chairs and Shelves</title>
<meta name="description" content="Our workshop builds handmade oak furniture: solid oak tables, chairs and shelves made to order, finished with natural oils and delivered.">
</head><body>
<header><nav><a href="/">Home</a></nav></header>
<main><article><h1>Handmade oak furniture</h1>
<section><h2>Oak tables</h2><p>Solid oak tables made to order in our workshop.</p></section>
<section><h2>Chairs and shelves</h2><p>Handmade oak chairs and shelves finished with natural oils and delivered.</p></section>
<img src="/img/oak-table.jpg" alt="Oak table"></article></main>
<footer>Workshop furniture</footer>
</body></html>"#;

    #[tokio::test]
    async fn test_scan_site_end_to_end() {
        let server = MockServer::start().await;
        let base = server.uri();

        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let sitemap = format!(
            r#"<urlset>
<url><loc>{base}/</loc><priority>1.0</priority></url>
<url><loc>{base}/news/old</loc></url>
<url><loc>{base}/about</loc></url>
<url><loc>{base}/broken</loc></url>
</urlset>"#
        );
        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(sitemap))
            .mount(&server)
            .await;

        for page in ["/", "/about"] {
            Mock::given(method("GET"))
                .and(path(page))
                .respond_with(ResponseTemplate::new(200).set_body_string(GOOD_PAGE))
                .mount(&server)
                .await;
        }
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let source = Arc::new(HttpPageSource::new(5).unwrap().allow_private_hosts());
        let scan_config = ScanConfig {
            max_pages: 3,
            priority_keywords: vec!["about".into(), "broken".into()],
            allow_private_hosts: true,
            ..config(2)
        };
        let url = Url::parse(&base).unwrap();

        let report = scan_site(&url, &scan_config, source, &SilentProgress)
            .await
            .unwrap();

        // root, then keyword matches; /news/old is cut by max_pages
        let urls: Vec<&str> = report.pages.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(urls, vec![format!("{base}/"), format!("{base}/about")]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].url, format!("{base}/broken"));

        let home = &report.pages[0];
        assert_eq!(home.levels.critical, 0);
        assert!(home.findings.iter().any(|f| f.level == FindingLevel::Great));
        assert!(matches!(home.status, PageStatus::Great | PageStatus::Good));
    }

    #[tokio::test]
    async fn test_scan_of_private_site_needs_opt_in() {
        let server = MockServer::start().await;
        let base = server.uri();

        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(format!("Sitemap: {base}/internal-sitemap.xml\n")),
            )
            .mount(&server)
            .await;

        let source = Arc::new(HttpPageSource::new(5).unwrap());
        let url = Url::parse(&base).unwrap();

        let err = scan_site(&url, &config(2), source, &SilentProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, SeoScanError::Validation { .. }));
        let received = server.received_requests().await.unwrap_or_default();
        assert!(received.is_empty(), "unexpected requests: {received:?}");
    }

    #[tokio::test]
    async fn test_scan_from_subpath_fetches_canonical_urls() {
        let server = MockServer::start().await;
        let base = server.uri();

        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                "<urlset><url><loc>{base}/blog/post</loc></url></urlset>"
            )))
            .mount(&server)
            .await;
        for page in ["/", "/blog", "/blog/post"] {
            Mock::given(method("GET"))
                .and(path(page))
                .respond_with(ResponseTemplate::new(200).set_body_string(GOOD_PAGE))
                .mount(&server)
                .await;
        }

        let source = Arc::new(HttpPageSource::new(5).unwrap().allow_private_hosts());
        let scan_config = ScanConfig {
            allow_private_hosts: true,
            ..config(2)
        };
        let url = Url::parse(&format!("{base}/blog/")).unwrap();

        let report = scan_site(&url, &scan_config, source, &SilentProgress)
            .await
            .unwrap();

        let urls: Vec<&str> = report.pages.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![format!("{base}/"), format!("{base}/blog"), format!("{base}/blog/post")]
        );
        assert!(report.failures.is_empty());
        assert_eq!(report.base_url, format!("{base}/blog/"));
    }
}
