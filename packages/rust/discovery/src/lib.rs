//! Sitemap discovery.
//!
//! Before selecting pages to analyze, seoscan reads the site's published
//! sitemaps: `Sitemap:` directives in `/robots.txt` first, `/sitemap.xml` as a
//! fallback. Sitemap indexes are followed to a bounded depth.

mod parser;

use std::collections::{HashSet, VecDeque};

use reqwest::Client;
use seoscan_shared::{Result, SeoScanError, SitemapEntry, is_ssrf_target};
use tracing::{debug, info, instrument, warn};
use url::Url;

pub use parser::{ParsedSitemap, parse_lastmod, parse_robots_sitemaps, parse_sitemap};

/// Maximum number of redirects to follow when fetching sitemaps.
const MAX_REDIRECTS: usize = 5;

/// Default timeout in seconds for each sitemap request.
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Maximum response size we consider valid (50 MB, the sitemaps.org limit).
const MAX_RESPONSE_SIZE: u64 = 50 * 1024 * 1024;

/// User-Agent string for discovery requests.
const USER_AGENT: &str = concat!("seoscan/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Discovery options
// ---------------------------------------------------------------------------

/// Configuration for the discovery process.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// Timeout for HTTP requests in seconds.
    pub timeout_secs: u64,
    /// Upper bound on sitemap documents fetched per site.
    pub max_sitemaps: usize,
    /// How many levels of `<sitemapindex>` nesting to follow.
    pub max_index_depth: usize,
    /// Allow requests to localhost/private IPs (intranet sites, mock servers).
    pub allow_private: bool,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_sitemaps: 50,
            max_index_depth: 3,
            allow_private: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

/// Collect every page entry from the sitemaps published at `url`'s origin.
///
/// Missing, unreachable or malformed sitemaps are logged and skipped; a site
/// without any sitemap yields an empty list. Unless `opts.allow_private` is
/// set, a private site is rejected before any request, and sitemap URLs
/// pointing at private hosts are skipped.
#[instrument(skip_all, fields(url = %url))]
pub async fn discover_sitemap(url: &Url, opts: &DiscoveryOptions) -> Result<Vec<SitemapEntry>> {
    let origin = origin_url(url)?;
    if !opts.allow_private && is_ssrf_target(url) {
        warn!("SSRF protection: blocked");
        return Err(SeoScanError::validation(format!(
            "refusing to read sitemaps of private or non-HTTP target: {url}"
        )));
    }
    let client = build_client(opts)?;

    let mut roots = match fetch_text(&client, &format!("{origin}/robots.txt")).await {
        Ok(robots) => parse_robots_sitemaps(&robots),
        Err(e) => {
            debug!(error = %e, "robots.txt unavailable");
            Vec::new()
        }
    };
    if roots.is_empty() {
        roots.push(format!("{origin}/sitemap.xml"));
    }

    info!(sitemaps = roots.len(), "reading sitemaps");

    let mut queue: VecDeque<(String, usize)> = roots.into_iter().map(|u| (u, 0)).collect();
    let mut seen: HashSet<String> = HashSet::new();
    let mut entries: Vec<SitemapEntry> = Vec::new();

    while let Some((sitemap_url, depth)) = queue.pop_front() {
        if seen.len() >= opts.max_sitemaps {
            warn!(limit = opts.max_sitemaps, "sitemap limit reached, stopping");
            break;
        }
        if !seen.insert(sitemap_url.clone()) {
            continue;
        }
        if sitemap_url.ends_with(".gz") {
            debug!(%sitemap_url, "skipping compressed sitemap");
            continue;
        }
        if !is_fetchable(&sitemap_url, opts) {
            warn!(%sitemap_url, "SSRF protection: sitemap URL blocked");
            continue;
        }

        let body = match fetch_text(&client, &sitemap_url).await {
            Ok(body) => body,
            Err(e) => {
                debug!(%sitemap_url, error = %e, "sitemap not found or unreachable");
                continue;
            }
        };

        match parse_sitemap(&body) {
            Ok(ParsedSitemap::UrlSet(found)) => {
                debug!(%sitemap_url, entries = found.len(), "urlset parsed");
                entries.extend(found);
            }
            Ok(ParsedSitemap::Index(children)) => {
                if depth >= opts.max_index_depth {
                    warn!(%sitemap_url, depth, "sitemap index nested too deep, ignoring");
                    continue;
                }
                debug!(%sitemap_url, children = children.len(), "sitemap index parsed");
                queue.extend(children.into_iter().map(|c| (c, depth + 1)));
            }
            Err(e) => {
                warn!(%sitemap_url, error = %e, "invalid sitemap");
            }
        }
    }

    info!(
        sitemaps = seen.len(),
        entries = entries.len(),
        "sitemap discovery finished"
    );

    Ok(entries)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Extract the origin (scheme + host + port) from a URL.
fn origin_url(url: &Url) -> Result<String> {
    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(SeoScanError::validation(format!(
            "unsupported URL scheme '{scheme}': {url}"
        )));
    }
    let host = url
        .host_str()
        .ok_or_else(|| SeoScanError::validation(format!("URL has no host: {url}")))?;

    match url.port() {
        Some(port) => Ok(format!("{scheme}://{host}:{port}")),
        None => Ok(format!("{scheme}://{host}")),
    }
}

/// Whether a sitemap URL taken from robots.txt or an index may be requested.
fn is_fetchable(sitemap_url: &str, opts: &DiscoveryOptions) -> bool {
    match Url::parse(sitemap_url) {
        Ok(parsed) => opts.allow_private || !is_ssrf_target(&parsed),
        Err(_) => false,
    }
}

/// Build a reqwest client with appropriate settings.
fn build_client(opts: &DiscoveryOptions) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .timeout(std::time::Duration::from_secs(opts.timeout_secs))
        .build()
        .map_err(|e| SeoScanError::Network(format!("failed to build HTTP client: {e}")))
}

/// Fetch a URL as text, rejecting error statuses and oversized bodies.
async fn fetch_text(client: &Client, url: &str) -> Result<String> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| SeoScanError::Network(format!("{url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SeoScanError::Network(format!("{url}: HTTP {status}")));
    }

    if let Some(len) = response.content_length() {
        if len > MAX_RESPONSE_SIZE {
            return Err(SeoScanError::validation(format!(
                "{url}: response too large ({len} bytes, max {MAX_RESPONSE_SIZE})"
            )));
        }
    }

    response
        .text()
        .await
        .map_err(|e| SeoScanError::Network(format!("{url}: failed to read body: {e}")))
}
