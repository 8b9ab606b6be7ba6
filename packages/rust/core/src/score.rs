//! Score aggregation.
//!
//! Combines rendering time, rule findings and meta relevance into four
//! sub-scores (performance, content, technical, relevance), a weighted
//! overall score in `[0, 100]` and a [`PageStatus`].

use serde::{Deserialize, Serialize};

use seoscan_shared::{Finding, FindingCategory, PageStatus, ScoringConfig};

/// Categories that count towards the content sub-score.
const CONTENT_CATEGORIES: [FindingCategory; 5] = [
    FindingCategory::Title,
    FindingCategory::Meta,
    FindingCategory::Heading,
    FindingCategory::Image,
    FindingCategory::Semantic,
];

/// Findings needed to exhaust a category's content penalty at full weight.
const FINDINGS_PER_CATEGORY_MAX: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub performance: f64,
    pub content: f64,
    pub technical: f64,
    pub relevance: f64,
}

/// Result of scoring one page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageScore {
    pub sub_scores: SubScores,
    /// Weighted total, rounded to two decimals.
    pub seo_score: f64,
    pub status: PageStatus,
}

#[derive(Debug, Clone, Default)]
pub struct ScoreAggregator {
    config: ScoringConfig,
}

impl ScoreAggregator {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Score a page from its rendering time (seconds), findings and meta
    /// relevance (percent).
    pub fn score(
        &self,
        rendering_time_secs: f64,
        findings: &[Finding],
        meta_relevance_percent: f64,
    ) -> PageScore {
        let sub_scores = SubScores {
            performance: self.performance_score(rendering_time_secs),
            content: self.content_score(findings),
            technical: self.technical_score(findings),
            relevance: meta_relevance_percent.clamp(0.0, 100.0),
        };

        let w = &self.config.weights;
        let total = sub_scores.performance * w.performance
            + sub_scores.content * w.content
            + sub_scores.technical * w.technical
            + sub_scores.relevance * w.relevance;
        let seo_score = round2(total.clamp(0.0, 100.0));

        PageScore {
            sub_scores,
            seo_score,
            status: self.classify(seo_score),
        }
    }

    pub fn classify(&self, score: f64) -> PageStatus {
        self.config.status.classify(score)
    }

    /// Three-step function of rendering time.
    pub fn performance_score(&self, rendering_time_secs: f64) -> f64 {
        let cutoffs = &self.config.performance;
        if rendering_time_secs <= cutoffs.optimal_secs {
            100.0
        } else if rendering_time_secs >= cutoffs.max_secs {
            0.0
        } else {
            cutoffs.middle_score
        }
    }

    /// 100 minus the per-category penalties, each capped at the category max.
    pub fn content_score(&self, findings: &[Finding]) -> f64 {
        let severity = &self.config.severity_weights;
        let penalty: f64 = CONTENT_CATEGORIES
            .iter()
            .map(|&category| {
                let max = self.config.max_penalty_for(category);
                let raw: f64 = findings
                    .iter()
                    .filter(|f| f.category == category)
                    .map(|f| severity.weight(f.level) * max / FINDINGS_PER_CATEGORY_MAX)
                    .sum();
                raw.min(max)
            })
            .sum();
        (100.0 - penalty).max(0.0)
    }

    /// 100 minus per-finding penalties (capped), never below the floor.
    pub fn technical_score(&self, findings: &[Finding]) -> f64 {
        let technical = &self.config.technical;
        let penalty: f64 = findings
            .iter()
            .map(|f| technical.penalty(f.level, &f.element))
            .sum();
        (100.0 - penalty.min(technical.max_penalty)).max(technical.floor)
    }
}

/// Round to two decimal places.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
