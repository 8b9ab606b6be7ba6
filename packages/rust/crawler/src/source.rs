//! Page sources: where per-page signals and rendering time come from.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Client;
use seoscan_shared::{PageSignals, Result, SeoScanError, is_ssrf_target};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::clean::clean_text;
use crate::extract::extract_signals;
use crate::relevance::{LexicalScorer, RelevanceScorer};

/// User-Agent string for page requests.
const USER_AGENT: &str = concat!("seoscan/", env!("CARGO_PKG_VERSION"));

const MAX_REDIRECTS: usize = 5;

// ---------------------------------------------------------------------------
// PageSnapshot / PageSource
// ---------------------------------------------------------------------------

/// Everything the rule engine and scorer need to know about one page.
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    pub url: String,
    /// Seconds from request start until the full body was received.
    pub rendering_time_secs: f64,
    pub signals: PageSignals,
}

/// Supplies a [`PageSnapshot`] for a URL.
///
/// The shipped implementation is [`HttpPageSource`]; a browser-backed renderer
/// can be plugged in by implementing this trait.
pub trait PageSource: Send + Sync {
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<PageSnapshot>> + Send;
}

// ---------------------------------------------------------------------------
// HttpPageSource
// ---------------------------------------------------------------------------

/// Fetches pages over plain HTTP and extracts signals from the returned HTML.
pub struct HttpPageSource {
    client: Client,
    scorer: Arc<dyn RelevanceScorer>,
    /// Allow localhost/private IPs (for mock servers and intranet scans).
    allow_private: bool,
}

impl HttpPageSource {
    /// Create a page source whose requests time out after `timeout_secs`.
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| SeoScanError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            scorer: Arc::new(LexicalScorer),
            allow_private: false,
        })
    }

    /// Replace the relevance scorer used for meta descriptions.
    pub fn with_scorer(mut self, scorer: impl RelevanceScorer + 'static) -> Self {
        self.scorer = Arc::new(scorer);
        self
    }

    /// Allow fetching localhost/private IPs.
    pub fn allow_private_hosts(mut self) -> Self {
        self.allow_private = true;
        self
    }

    fn meta_relevance(&self, signals: &PageSignals) -> f64 {
        match signals.meta_description.as_deref() {
            Some(meta) if !meta.trim().is_empty() => {
                let body = clean_text(&signals.body_text);
                self.scorer.score(meta, &body).clamp(0.0, 1.0)
            }
            _ => 0.0,
        }
    }
}

impl PageSource for HttpPageSource {
    #[instrument(skip_all, fields(url = %url))]
    async fn fetch(&self, url: &Url) -> Result<PageSnapshot> {
        if !self.allow_private && is_ssrf_target(url) {
            warn!("SSRF protection: blocked");
            return Err(SeoScanError::validation(format!(
                "refusing to fetch private or non-HTTP target: {url}"
            )));
        }

        debug!("fetching page");
        let started = Instant::now();

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| SeoScanError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SeoScanError::Network(format!("{url}: HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SeoScanError::Network(format!("{url}: body read failed: {e}")))?;

        let rendering_time_secs = started.elapsed().as_secs_f64();

        let mut signals = extract_signals(&body);
        signals.meta_relevance = self.meta_relevance(&signals);

        debug!(
            rendering_time_secs,
            headings = signals.headings.len(),
            images = signals.images.len(),
            "page fetched"
        );

        Ok(PageSnapshot {
            url: url.to_string(),
            rendering_time_secs,
            signals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct FixedScorer(f64);

    impl RelevanceScorer for FixedScorer {
        fn score(&self, _a: &str, _b: &str) -> f64 {
            self.0
        }
    }

    const PAGE: &str = r#"<html><head>
<title>Handmade oak furniture</title>
<meta name="description" content="Handmade oak tables and chairs">
</head><body><main><h1>Oak tables</h1><p>Handmade oak tables and chairs.</p></main></body></html>"#;

    #[tokio::test]
    async fn test_fetch_extracts_signals() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/oak"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .mount(&server)
            .await;

        let source = HttpPageSource::new(10)
            .unwrap()
            .allow_private_hosts()
            .with_scorer(FixedScorer(0.75));

        let url = Url::parse(&format!("{}/oak", server.uri())).unwrap();
        let snapshot = source.fetch(&url).await.unwrap();

        assert_eq!(snapshot.url, url.to_string());
        assert!(snapshot.rendering_time_secs >= 0.0);
        assert_eq!(
            snapshot.signals.title.as_deref(),
            Some("Handmade oak furniture")
        );
        assert_eq!(snapshot.signals.headings.len(), 1);
        assert_eq!(snapshot.signals.meta_relevance, 0.75);
    }

    #[tokio::test]
    async fn test_fetch_default_scorer_finds_relevance() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .mount(&server)
            .await;

        let source = HttpPageSource::new(10).unwrap().allow_private_hosts();
        let url = Url::parse(&server.uri()).unwrap();
        let snapshot = source.fetch(&url).await.unwrap();

        assert!(snapshot.signals.meta_relevance > 0.5);
    }

    #[tokio::test]
    async fn test_fetch_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let source = HttpPageSource::new(10).unwrap().allow_private_hosts();
        let url = Url::parse(&server.uri()).unwrap();
        let err = source.fetch(&url).await.unwrap_err();

        assert!(matches!(err, SeoScanError::Network(_)));
    }

    #[tokio::test]
    async fn test_fetch_blocks_private_by_default() {
        let source = HttpPageSource::new(10).unwrap();
        let url = Url::parse("http://127.0.0.1:9/").unwrap();
        let err = source.fetch(&url).await.unwrap_err();

        assert!(matches!(err, SeoScanError::Validation { .. }));
    }
}
