//! Core domain types exchanged between seoscan crates.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Semantic HTML5 landmark tags the rule engine looks for.
pub const SEMANTIC_TAGS: [&str; 7] = [
    "header", "nav", "main", "article", "section", "aside", "footer",
];

// ---------------------------------------------------------------------------
// ScanId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one site scan (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanId(pub Uuid);

impl ScanId {
    /// Generate a new time-sortable scan identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ScanId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ScanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ScanId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// Findings
// ---------------------------------------------------------------------------

/// Severity of a finding. Problem tiers first, then positive observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingLevel {
    Critical,
    Error,
    Warning,
    Info,
    Optimal,
    Good,
    Great,
}

impl FindingLevel {
    pub const ALL: [FindingLevel; 7] = [
        Self::Critical,
        Self::Error,
        Self::Warning,
        Self::Info,
        Self::Optimal,
        Self::Good,
        Self::Great,
    ];

    /// Whether this level reports a problem (as opposed to a positive observation).
    pub fn is_problem(self) -> bool {
        matches!(self, Self::Critical | Self::Error | Self::Warning | Self::Info)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
            Self::Optimal => "optimal",
            Self::Good => "good",
            Self::Great => "great",
        }
    }
}

impl std::fmt::Display for FindingLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which rule produced a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingCategory {
    Title,
    Meta,
    Heading,
    Image,
    Semantic,
    Relevance,
}

impl FindingCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Meta => "meta",
            Self::Heading => "heading",
            Self::Image => "image",
            Self::Semantic => "semantic",
            Self::Relevance => "relevance",
        }
    }
}

impl std::fmt::Display for FindingCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One rule-engine observation about a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub level: FindingLevel,
    pub category: FindingCategory,
    /// Human-readable description.
    pub message: String,
    /// HTML element or tag the finding refers to (`title`, `h1`, `img`, ...).
    pub element: String,
}

impl Finding {
    pub fn new(
        level: FindingLevel,
        category: FindingCategory,
        message: impl Into<String>,
        element: impl Into<String>,
    ) -> Self {
        Self {
            level,
            category,
            message: message.into(),
            element: element.into(),
        }
    }
}

/// Discrete classification of an SEO score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    Great,
    Good,
    Satisfactory,
    Bad,
    Critical,
}

impl PageStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Great => "great",
            Self::Good => "good",
            Self::Satisfactory => "satisfactory",
            Self::Bad => "bad",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for PageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SitemapEntry
// ---------------------------------------------------------------------------

/// One `<url>` record from a sitemap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SitemapEntry {
    /// Absolute page URL as listed in `<loc>`.
    pub url: String,
    /// Sitemap-declared importance in [0, 1].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<f64>,
    /// `<lastmod>` timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
}

impl SitemapEntry {
    /// Entry with no sitemap metadata.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            priority: None,
            last_modified: None,
        }
    }

    pub fn with_priority(mut self, priority: f64) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_last_modified(mut self, at: DateTime<Utc>) -> Self {
        self.last_modified = Some(at);
        self
    }
}

// ---------------------------------------------------------------------------
// PageSignals
// ---------------------------------------------------------------------------

/// A heading element in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    /// Heading level, 1 through 6.
    pub level: u8,
    pub text: String,
}

impl Heading {
    pub fn new(level: u8, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
}

/// An `<img>` element's relevant attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
}

/// Everything the rule engine needs to know about one rendered page.
///
/// `None` for `title` / `meta_description` means the tag itself is absent;
/// `Some("")` means the tag exists but is empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageSignals {
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub headings: Vec<Heading>,
    pub images: Vec<ImageRef>,
    /// Lower-case names of the semantic tags present on the page.
    pub semantic_tags: BTreeSet<String>,
    pub body_text: String,
    /// Similarity between meta description and body content, in [0, 1].
    pub meta_relevance: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_id_roundtrip() {
        let id = ScanId::new();
        let s = id.to_string();
        let parsed: ScanId = s.parse().expect("parse ScanId");
        assert_eq!(id, parsed);
    }

    #[test]
    fn finding_enums_serialize_lowercase() {
        let finding = Finding::new(
            FindingLevel::Critical,
            FindingCategory::Title,
            "missing <title> tag",
            "title",
        );
        let json = serde_json::to_value(&finding).expect("serialize");
        assert_eq!(json["level"], "critical");
        assert_eq!(json["category"], "title");

        let status = serde_json::to_string(&PageStatus::Satisfactory).expect("serialize");
        assert_eq!(status, "\"satisfactory\"");
    }

    #[test]
    fn finding_level_problem_tiers() {
        assert!(FindingLevel::Critical.is_problem());
        assert!(FindingLevel::Info.is_problem());
        assert!(!FindingLevel::Optimal.is_problem());
        assert!(!FindingLevel::Great.is_problem());
        // Declaration order doubles as severity order.
        assert!(FindingLevel::Critical < FindingLevel::Error);
        assert!(FindingLevel::Warning < FindingLevel::Info);
    }

    #[test]
    fn sitemap_entry_skips_missing_metadata() {
        let entry = SitemapEntry::new("https://example.com/about");
        let json = serde_json::to_string(&entry).expect("serialize");
        assert_eq!(json, r#"{"url":"https://example.com/about"}"#);

        let parsed: SitemapEntry = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, entry);
    }

    #[test]
    fn page_signals_default_is_empty_page() {
        let signals = PageSignals::default();
        assert!(signals.title.is_none());
        assert!(signals.meta_description.is_none());
        assert!(signals.headings.is_empty());
        assert!(signals.semantic_tags.is_empty());
        assert_eq!(signals.meta_relevance, 0.0);
    }
}
