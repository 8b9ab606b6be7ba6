//! Sitemap XML and robots.txt parsing.
//!
//! Handles the two sitemap document kinds defined by <https://www.sitemaps.org/>:
//! - `<urlset>`: page entries with `<loc>`, optional `<lastmod>` and `<priority>`
//! - `<sitemapindex>`: links to further sitemaps

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use seoscan_shared::{Result, SeoScanError, SitemapEntry};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A parsed sitemap document.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedSitemap {
    /// A `<urlset>` listing pages.
    UrlSet(Vec<SitemapEntry>),
    /// A `<sitemapindex>` listing child sitemap URLs.
    Index(Vec<String>),
}

// ---------------------------------------------------------------------------
// Regex patterns (compiled once)
// ---------------------------------------------------------------------------

/// Matches one `<url>...</url>` block.
static URL_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<url>(.*?)</url>").expect("url block regex")
});

/// Matches one `<sitemap>...</sitemap>` block inside an index.
static SITEMAP_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<sitemap>(.*?)</sitemap>").expect("sitemap block regex")
});

static LOC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<loc>\s*(.*?)\s*</loc>").expect("loc regex")
});

static LASTMOD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<lastmod>\s*(.*?)\s*</lastmod>").expect("lastmod regex")
});

static PRIORITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<priority>\s*(.*?)\s*</priority>").expect("priority regex")
});

/// Matches `Sitemap: <url>` directives in robots.txt (case-insensitive).
static ROBOTS_SITEMAP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\s*sitemap\s*:\s*(\S+)\s*$").expect("robots sitemap regex")
});

// ---------------------------------------------------------------------------
// Parsers
// ---------------------------------------------------------------------------

/// Parse a sitemap document into page entries or child sitemap links.
pub fn parse_sitemap(content: &str) -> Result<ParsedSitemap> {
    if content.contains("<sitemapindex") {
        let children = SITEMAP_BLOCK_RE
            .captures_iter(content)
            .filter_map(|caps| capture_text(&LOC_RE, &caps[1]))
            .map(|loc| decode_xml_entities(&loc))
            .collect();
        return Ok(ParsedSitemap::Index(children));
    }

    if content.contains("<urlset") {
        let entries = URL_BLOCK_RE
            .captures_iter(content)
            .filter_map(|caps| parse_url_block(&caps[1]))
            .collect();
        return Ok(ParsedSitemap::UrlSet(entries));
    }

    Err(SeoScanError::parse(
        "sitemap has neither <urlset> nor <sitemapindex> root",
    ))
}

/// Extract `Sitemap:` URLs from a robots.txt body.
pub fn parse_robots_sitemaps(robots_txt: &str) -> Vec<String> {
    ROBOTS_SITEMAP_RE
        .captures_iter(robots_txt)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Parse a W3C datetime `<lastmod>` value.
///
/// Accepts full RFC 3339 timestamps, minute-precision timestamps and bare dates
/// (taken as midnight UTC).
pub fn parse_lastmod(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M%:z") {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(stripped) = value.strip_suffix('Z') {
        if let Ok(dt) = DateTime::parse_from_str(&format!("{stripped}+00:00"), "%Y-%m-%dT%H:%M%:z") {
            return Some(dt.with_timezone(&Utc));
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_url_block(block: &str) -> Option<SitemapEntry> {
    let loc = capture_text(&LOC_RE, block)?;
    let url = decode_xml_entities(&loc);
    if url.is_empty() {
        return None;
    }

    let priority = capture_text(&PRIORITY_RE, block)
        .and_then(|p| p.parse::<f64>().ok())
        .filter(|p| (0.0..=1.0).contains(p));

    let last_modified = capture_text(&LASTMOD_RE, block).and_then(|m| parse_lastmod(&m));

    Some(SitemapEntry {
        url,
        priority,
        last_modified,
    })
}

fn capture_text(re: &Regex, haystack: &str) -> Option<String> {
    re.captures(haystack)
        .map(|caps| strip_cdata(caps[1].trim()).to_string())
}

fn strip_cdata(value: &str) -> &str {
    value
        .strip_prefix("<![CDATA[")
        .and_then(|v| v.strip_suffix("]]>"))
        .unwrap_or(value)
        .trim()
}

/// Decode the five predefined XML entities.
fn decode_xml_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const URLSET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url>
    <loc>https://example.com/</loc>
    <lastmod>2024-03-01</lastmod>
    <priority>1.0</priority>
  </url>
  <url>
    <loc>https://example.com/catalog/item?id=1&amp;ref=home</loc>
    <lastmod>2024-03-05T12:30:00+03:00</lastmod>
    <changefreq>weekly</changefreq>
    <priority>0.8</priority>
  </url>
  <url>
    <loc>https://example.com/blog/</loc>
    <priority>7</priority>
  </url>
</urlset>"#;

    #[test]
    fn parse_urlset_entries() {
        let parsed = parse_sitemap(URLSET).unwrap();
        let ParsedSitemap::UrlSet(entries) = parsed else {
            panic!("expected urlset");
        };

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].url, "https://example.com/");
        assert_eq!(entries[0].priority, Some(1.0));
        assert_eq!(
            entries[0].last_modified,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
        );

        assert_eq!(entries[1].url, "https://example.com/catalog/item?id=1&ref=home");
        assert_eq!(
            entries[1].last_modified,
            Some(Utc.with_ymd_and_hms(2024, 3, 5, 9, 30, 0).unwrap())
        );

        // Out-of-range priority is dropped, missing lastmod stays None
        assert_eq!(entries[2].priority, None);
        assert_eq!(entries[2].last_modified, None);
    }

    #[test]
    fn parse_sitemap_index() {
        let content = r#"<?xml version="1.0" encoding="UTF-8"?>
<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap><loc>https://example.com/sitemap-pages.xml</loc></sitemap>
  <sitemap>
    <loc><![CDATA[https://example.com/sitemap-blog.xml]]></loc>
    <lastmod>2024-01-01</lastmod>
  </sitemap>
</sitemapindex>"#;

        let parsed = parse_sitemap(content).unwrap();
        assert_eq!(
            parsed,
            ParsedSitemap::Index(vec![
                "https://example.com/sitemap-pages.xml".into(),
                "https://example.com/sitemap-blog.xml".into(),
            ])
        );
    }

    #[test]
    fn parse_rejects_non_sitemap() {
        assert!(parse_sitemap("<html><body>Not found</body></html>").is_err());
    }

    #[test]
    fn parse_robots_directives() {
        let robots = "User-agent: *\nDisallow: /admin\nSitemap: https://example.com/sitemap.xml\nsitemap:https://example.com/news.xml\n";
        assert_eq!(
            parse_robots_sitemaps(robots),
            vec![
                "https://example.com/sitemap.xml".to_string(),
                "https://example.com/news.xml".to_string(),
            ]
        );
    }

    #[test]
    fn parse_lastmod_formats() {
        let midnight = Utc.with_ymd_and_hms(2023, 12, 31, 0, 0, 0).unwrap();
        assert_eq!(parse_lastmod("2023-12-31"), Some(midnight));
        assert_eq!(
            parse_lastmod("2023-12-31T10:15Z"),
            Some(Utc.with_ymd_and_hms(2023, 12, 31, 10, 15, 0).unwrap())
        );
        assert_eq!(
            parse_lastmod("2023-12-31T10:15:30Z"),
            Some(Utc.with_ymd_and_hms(2023, 12, 31, 10, 15, 30).unwrap())
        );
        assert_eq!(parse_lastmod("yesterday"), None);
    }
}
