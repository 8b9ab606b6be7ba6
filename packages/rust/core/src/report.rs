//! Page and site reports.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use seoscan_shared::{Finding, FindingLevel, PageStatus, ScanId, StatusThresholds};

use crate::score::{ScoreAggregator, SubScores, round2};

// ---------------------------------------------------------------------------
// PageReport
// ---------------------------------------------------------------------------

/// Number of findings per level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCounts {
    pub critical: usize,
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
    pub optimal: usize,
    pub good: usize,
    pub great: usize,
}

impl LevelCounts {
    pub fn tally(findings: &[Finding]) -> Self {
        let mut counts = Self::default();
        for finding in findings {
            let slot = match finding.level {
                FindingLevel::Critical => &mut counts.critical,
                FindingLevel::Error => &mut counts.errors,
                FindingLevel::Warning => &mut counts.warnings,
                FindingLevel::Info => &mut counts.infos,
                FindingLevel::Optimal => &mut counts.optimal,
                FindingLevel::Good => &mut counts.good,
                FindingLevel::Great => &mut counts.great,
            };
            *slot += 1;
        }
        counts
    }
}

/// SEO report for one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageReport {
    pub url: String,
    /// Seconds.
    pub rendering_time: f64,
    pub seo_score: f64,
    /// Meta description / content relevance, in percent.
    pub meta_relevance_score: f64,
    pub status: PageStatus,
    pub sub_scores: SubScores,
    pub findings: Vec<Finding>,
    pub levels: LevelCounts,
}

/// Build a page report from the page's measurements and findings.
///
/// `meta_relevance` is the raw similarity in `[0, 1]`; it is rounded to two
/// decimals before being turned into a percentage, so the percentage is
/// always a whole number.
pub fn assemble_page(
    url: impl Into<String>,
    rendering_time: f64,
    meta_relevance: f64,
    findings: Vec<Finding>,
    scorer: &ScoreAggregator,
) -> PageReport {
    let rendering_time = rendering_time.max(0.0);
    let meta_relevance_score = round2(round2(meta_relevance) * 100.0);
    let score = scorer.score(rendering_time, &findings, meta_relevance_score);

    PageReport {
        url: url.into(),
        rendering_time,
        seo_score: score.seo_score,
        meta_relevance_score,
        status: score.status,
        sub_scores: score.sub_scores,
        levels: LevelCounts::tally(&findings),
        findings,
    }
}

// ---------------------------------------------------------------------------
// SiteReport
// ---------------------------------------------------------------------------

/// A page that could not be analyzed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageFailure {
    pub url: String,
    pub error: String,
}

/// Aggregate numbers over a site report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SiteSummary {
    pub page_count: usize,
    pub average_score: f64,
    pub status: PageStatus,
}

/// Report for a whole scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteReport {
    pub scan_id: ScanId,
    pub base_url: String,
    pub generated_at: DateTime<Utc>,
    pub pages: Vec<PageReport>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<PageFailure>,
}

impl SiteReport {
    pub fn new(
        base_url: impl Into<String>,
        pages: Vec<PageReport>,
        failures: Vec<PageFailure>,
    ) -> Self {
        Self {
            scan_id: ScanId::new(),
            base_url: base_url.into(),
            generated_at: Utc::now(),
            pages,
            failures,
        }
    }

    /// Page count, average score (0 without pages) and its status.
    pub fn summary(&self, thresholds: &StatusThresholds) -> SiteSummary {
        let page_count = self.pages.len();
        let average_score = if page_count == 0 {
            0.0
        } else {
            round2(self.pages.iter().map(|p| p.seo_score).sum::<f64>() / page_count as f64)
        };
        SiteSummary {
            page_count,
            average_score,
            status: thresholds.classify(average_score),
        }
    }

    /// Human-readable report.
    pub fn render_text(&self, thresholds: &StatusThresholds) -> String {
        let summary = self.summary(thresholds);
        let mut out = String::new();

        let _ = writeln!(out, "SEO report for {}", self.base_url);
        let _ = writeln!(
            out,
            "scan {} at {}",
            self.scan_id,
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        let _ = writeln!(
            out,
            "pages analyzed: {}, average score: {:.2} ({})",
            summary.page_count, summary.average_score, summary.status
        );

        for page in &self.pages {
            let s = &page.sub_scores;
            let l = &page.levels;
            let _ = writeln!(out);
            let _ = writeln!(
                out,
                "[{:.2} {}] {} ({:.2}s)",
                page.seo_score, page.status, page.url, page.rendering_time
            );
            let _ = writeln!(
                out,
                "  performance {:.2} | content {:.2} | technical {:.2} | relevance {:.2}",
                s.performance, s.content, s.technical, s.relevance
            );
            let _ = writeln!(
                out,
                "  critical {}, errors {}, warnings {}, infos {}, optimal {}, good {}, great {}",
                l.critical, l.errors, l.warnings, l.infos, l.optimal, l.good, l.great
            );
            for finding in &page.findings {
                let _ = writeln!(
                    out,
                    "  - [{}] {}: {}",
                    finding.level, finding.category, finding.message
                );
            }
        }

        if !self.failures.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "failed pages:");
            for failure in &self.failures {
                let _ = writeln!(out, "  - {}: {}", failure.url, failure.error);
            }
        }

        out
    }
}
