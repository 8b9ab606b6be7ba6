//! On-page rule engine.
//!
//! Each rule inspects one aspect of a page's [`PageSignals`] and reports
//! problems and strengths as [`Finding`]s. Rules are independent; the engine
//! runs them in a fixed order so reports are stable.

use seoscan_shared::{Finding, FindingCategory, FindingLevel, PageSignals, RulesConfig};

/// Runs the full rule battery against page signals.
#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    rules: RulesConfig,
}

impl RuleEngine {
    pub fn new(rules: RulesConfig) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    /// All findings for a page: title, meta, heading, image, semantic, relevance.
    pub fn evaluate(&self, signals: &PageSignals) -> Vec<Finding> {
        let mut findings = self.check_title(signals);
        findings.extend(self.check_meta_description(signals));
        findings.extend(self.check_headings(signals));
        findings.extend(self.check_images(signals));
        findings.extend(self.check_semantic_structure(signals));
        findings.extend(self.check_relevance(signals));
        findings
    }

    // -----------------------------------------------------------------------
    // Title
    // -----------------------------------------------------------------------

    pub fn check_title(&self, signals: &PageSignals) -> Vec<Finding> {
        let title = |level, message: String| {
            vec![Finding::new(level, FindingCategory::Title, message, "title")]
        };

        let Some(text) = signals.title.as_deref().map(str::trim) else {
            return title(FindingLevel::Critical, "missing <title> tag".into());
        };
        if text.is_empty() {
            return title(FindingLevel::Critical, "empty <title> tag".into());
        }

        let len = text.chars().count();
        let (min, max) = (self.rules.title_min_length(), self.rules.title_max_length());
        if len < min {
            title(
                FindingLevel::Warning,
                format!("title too short ({len} characters), optimal length is {min} to {max}"),
            )
        } else if len > max {
            title(
                FindingLevel::Warning,
                format!("title too long ({len} characters), optimal length is {min} to {max}"),
            )
        } else {
            title(
                FindingLevel::Optimal,
                format!("title has an optimal length ({len} characters)"),
            )
        }
    }

    // -----------------------------------------------------------------------
    // Meta description
    // -----------------------------------------------------------------------

    pub fn check_meta_description(&self, signals: &PageSignals) -> Vec<Finding> {
        let meta = |level, message: String| {
            vec![Finding::new(level, FindingCategory::Meta, message, "meta")]
        };

        let Some(text) = signals.meta_description.as_deref().map(str::trim) else {
            return meta(FindingLevel::Critical, "missing meta description".into());
        };
        if text.is_empty() {
            return meta(FindingLevel::Critical, "empty meta description".into());
        }

        let len = text.chars().count();
        let (min, max) = (self.rules.meta_min_length, self.rules.meta_max_length);
        if len > max {
            meta(
                FindingLevel::Warning,
                format!("meta description too long ({len} characters), recommended {min} to {max}"),
            )
        } else if len >= min {
            meta(
                FindingLevel::Optimal,
                format!("meta description has an optimal length ({len} characters)"),
            )
        } else {
            meta(
                FindingLevel::Warning,
                format!("meta description too short ({len} characters), recommended {min} to {max}"),
            )
        }
    }

    // -----------------------------------------------------------------------
    // Headings
    // -----------------------------------------------------------------------

    pub fn check_headings(&self, signals: &PageSignals) -> Vec<Finding> {
        let mut findings = Vec::new();
        let heading = |level, message: String, element: String| {
            Finding::new(level, FindingCategory::Heading, message, element)
        };

        let h1_count = signals.headings.iter().filter(|h| h.level == 1).count();
        findings.push(match h1_count {
            0 => heading(FindingLevel::Critical, "missing H1 heading".into(), "h1".into()),
            1 => heading(
                FindingLevel::Optimal,
                "exactly one H1 heading".into(),
                "h1".into(),
            ),
            n => heading(
                FindingLevel::Warning,
                format!("{n} H1 headings found, a page should have exactly one"),
                "h1".into(),
            ),
        });

        let mut previous = 0u8;
        let mut broken = false;
        for h in &signals.headings {
            if h.level > previous.saturating_add(1) {
                findings.push(heading(
                    FindingLevel::Warning,
                    format!("heading hierarchy broken: H{} after H{previous}", h.level),
                    format!("h{}", h.level),
                ));
                broken = true;
            }
            previous = h.level;
        }

        if !broken {
            let element = match signals.headings.last() {
                Some(last) => format!("h1-h{}", last.level),
                None => "h1".to_string(),
            };
            findings.push(heading(
                FindingLevel::Great,
                "heading hierarchy is consistent".into(),
                element,
            ));
        }

        findings
    }

    // -----------------------------------------------------------------------
    // Images
    // -----------------------------------------------------------------------

    pub fn check_images(&self, signals: &PageSignals) -> Vec<Finding> {
        let image = |level, message: String| Finding::new(level, FindingCategory::Image, message, "img");

        if signals.images.is_empty() {
            return vec![image(FindingLevel::Info, "no images on page".into())];
        }

        let mut findings = Vec::new();
        let mut undescribed_files = 0usize;

        for img in &signals.images {
            if img.alt.as_deref().is_none_or(|alt| alt.trim().is_empty()) {
                let src = img.src.as_deref().unwrap_or("<no src>");
                findings.push(image(
                    FindingLevel::Warning,
                    format!("image without alt text: {src}"),
                ));
            }

            if let Some(src) = img.src.as_deref() {
                if self.is_undescribed_image_file(src) {
                    undescribed_files += 1;
                }
            }
        }

        if undescribed_files > 0 {
            findings.push(image(
                FindingLevel::Warning,
                format!("{undescribed_files} image file names carry no description"),
            ));
        }

        findings
    }

    /// Looks like an image path but has no descriptive file extension.
    fn is_undescribed_image_file(&self, src: &str) -> bool {
        let src = src.to_lowercase();
        self.rules.image_path_hints.iter().any(|h| src.contains(h.as_str()))
            && !self.rules.image_extensions.iter().any(|e| src.contains(e.as_str()))
    }

    // -----------------------------------------------------------------------
    // Semantic structure
    // -----------------------------------------------------------------------

    pub fn check_semantic_structure(&self, signals: &PageSignals) -> Vec<Finding> {
        let mut findings = Vec::new();
        let mut used: Vec<&str> = Vec::new();

        for tag in &self.rules.semantic_tags {
            if signals.semantic_tags.contains(tag) {
                used.push(tag);
            } else {
                findings.push(Finding::new(
                    FindingLevel::Info,
                    FindingCategory::Semantic,
                    format!("semantic tag <{tag}> is not used"),
                    tag.as_str(),
                ));
            }
        }

        if !used.is_empty() {
            findings.push(Finding::new(
                FindingLevel::Good,
                FindingCategory::Semantic,
                format!("semantic tags in use: {}", used.join(", ")),
                used.join(";"),
            ));
        }
        if used.len() > self.rules.great_semantic_tag_count {
            findings.push(Finding::new(
                FindingLevel::Great,
                FindingCategory::Semantic,
                "excellent use of semantic markup",
                used.join(";"),
            ));
        }

        findings
    }

    // -----------------------------------------------------------------------
    // Meta/content relevance
    // -----------------------------------------------------------------------

    /// Skipped when there is no meta description to compare.
    pub fn check_relevance(&self, signals: &PageSignals) -> Vec<Finding> {
        let has_meta = signals
            .meta_description
            .as_deref()
            .is_some_and(|m| !m.trim().is_empty());
        if !has_meta {
            return Vec::new();
        }

        let score = signals.meta_relevance;
        let percent = score * 100.0;
        let (level, message) = if score <= self.rules.relevance_low {
            (
                FindingLevel::Warning,
                format!("meta description barely matches page content ({percent:.1}% relevance)"),
            )
        } else if score < self.rules.relevance_high {
            (
                FindingLevel::Info,
                format!("meta description partly matches page content ({percent:.1}% relevance)"),
            )
        } else {
            (
                FindingLevel::Great,
                format!("meta description matches page content ({percent:.1}% relevance)"),
            )
        };

        vec![Finding::new(level, FindingCategory::Relevance, message, "body")]
    }
}
