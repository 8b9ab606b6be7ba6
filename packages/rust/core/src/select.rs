//! Key-page selection.
//!
//! Narrows a site tree down to the handful of pages worth a full analysis:
//! the home page, then the pages ranked highest by priority keywords in their
//! path, sitemap priority, and recency.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use seoscan_shared::{Result, SeoScanError};

use crate::tree::TreeNode;

/// Ranking key of one non-root node.
struct Candidate<'a> {
    url: &'a str,
    keyword_hits: usize,
    priority: f64,
    modified: DateTime<Utc>,
}

impl Candidate<'_> {
    /// Descending by keyword hits, then priority, then recency.
    fn rank(&self, other: &Self) -> Ordering {
        other
            .keyword_hits
            .cmp(&self.keyword_hits)
            .then_with(|| other.priority.total_cmp(&self.priority))
            .then_with(|| other.modified.cmp(&self.modified))
    }
}

/// Select up to `max_results` URLs, the root first.
///
/// Equal-ranked pages keep their pre-order position, so the result is
/// reproducible for a given tree.
#[instrument(skip_all, fields(root = %tree.url, max_results = max_results))]
pub fn select_key_pages(
    tree: &TreeNode,
    priority_keywords: &[String],
    max_results: usize,
) -> Result<Vec<String>> {
    if max_results < 1 {
        return Err(SeoScanError::validation("max_results must be at least 1"));
    }

    let keywords: Vec<String> = priority_keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();

    let mut candidates = Vec::new();
    let mut path = Vec::new();
    for child in &tree.children {
        collect_candidates(child, &keywords, &mut path, &mut candidates);
    }
    candidates.sort_by(Candidate::rank);

    let mut seen = HashSet::new();
    let selected: Vec<String> = std::iter::once(tree.url.as_str())
        .chain(candidates.iter().map(|c| c.url))
        .filter(|url| seen.insert(*url))
        .take(max_results)
        .map(str::to_string)
        .collect();

    debug!(
        candidates = candidates.len(),
        selected = selected.len(),
        "key pages selected"
    );

    Ok(selected)
}

/// Pre-order walk below the root, tracking the lower-cased segment path.
fn collect_candidates<'a>(
    node: &'a TreeNode,
    keywords: &[String],
    path: &mut Vec<String>,
    out: &mut Vec<Candidate<'a>>,
) {
    path.push(node.name.to_lowercase());

    let keyword_hits = keywords
        .iter()
        .filter(|k| path.iter().any(|segment| segment.contains(k.as_str())))
        .count();

    out.push(Candidate {
        url: &node.url,
        keyword_hits,
        priority: node.priority.unwrap_or(0.0),
        // missing timestamps rank as the Unix epoch
        modified: node.last_modified.unwrap_or_default(),
    });

    for child in &node.children {
        collect_candidates(child, keywords, path, out);
    }

    path.pop();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::build_site_tree;
    use chrono::TimeZone;
    use seoscan_shared::SitemapEntry;
    use url::Url;

    fn keywords(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn tree(entries: Vec<SitemapEntry>) -> TreeNode {
        build_site_tree(&Url::parse("https://example.com").unwrap(), &entries)
    }

    #[test]
    fn test_root_always_first() {
        let tree = tree(vec![
            SitemapEntry::new("https://example.com/news"),
            SitemapEntry::new("https://example.com/about"),
        ]);
        let selected = select_key_pages(&tree, &keywords(&["about"]), 2).unwrap();
        assert_eq!(
            selected,
            vec!["https://example.com/", "https://example.com/about"]
        );
    }

    #[test]
    fn test_keywords_match_ancestor_segments() {
        let tree = tree(vec![
            SitemapEntry::new("https://example.com/misc/page").with_priority(1.0),
            SitemapEntry::new("https://example.com/catalog/chairs"),
        ]);
        let selected = select_key_pages(&tree, &keywords(&["Catalog"]), 3).unwrap();
        // catalog and catalog/chairs both match; misc/page wins only on priority
        assert_eq!(
            selected,
            vec![
                "https://example.com/",
                "https://example.com/catalog",
                "https://example.com/catalog/chairs",
            ]
        );
    }

    #[test]
    fn test_priority_then_recency_break_ties() {
        let new = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let old = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let tree = tree(vec![
            SitemapEntry::new("https://example.com/a").with_last_modified(old),
            SitemapEntry::new("https://example.com/b").with_last_modified(new),
            SitemapEntry::new("https://example.com/c").with_priority(0.3),
        ]);
        let selected = select_key_pages(&tree, &[], 4).unwrap();
        assert_eq!(
            selected,
            vec![
                "https://example.com/",
                "https://example.com/c",
                "https://example.com/b",
                "https://example.com/a",
            ]
        );
    }

    #[test]
    fn test_equal_keys_keep_preorder() {
        let tree = tree(vec![
            SitemapEntry::new("https://example.com/x"),
            SitemapEntry::new("https://example.com/y"),
            SitemapEntry::new("https://example.com/z"),
        ]);
        let selected = select_key_pages(&tree, &[], 10).unwrap();
        assert_eq!(selected.len(), 4);
        assert_eq!(selected[1], "https://example.com/x");
        assert_eq!(selected[3], "https://example.com/z");
    }

    #[test]
    fn test_result_is_bounded() {
        let entries = (0..20)
            .map(|i| SitemapEntry::new(format!("https://example.com/page-{i}")))
            .collect();
        let tree = tree(entries);
        for n in 1..5 {
            let selected = select_key_pages(&tree, &keywords(&["page"]), n).unwrap();
            assert_eq!(selected.len(), n);
            assert_eq!(selected[0], "https://example.com/");
        }
    }

    #[test]
    fn test_domain_name_is_not_a_keyword_target() {
        let tree = build_site_tree(
            &Url::parse("https://shop.example.com").unwrap(),
            &[
                SitemapEntry::new("https://shop.example.com/a"),
                SitemapEntry::new("https://shop.example.com/shop-news"),
            ],
        );
        let selected = select_key_pages(&tree, &keywords(&["shop", "  "]), 2).unwrap();
        assert_eq!(selected[1], "https://shop.example.com/shop-news");
    }

    #[test]
    fn test_zero_results_rejected() {
        let tree = tree(vec![]);
        let err = select_key_pages(&tree, &[], 0).unwrap_err();
        assert!(matches!(err, SeoScanError::Validation { .. }));
    }

    #[test]
    fn test_single_node_tree() {
        let tree = tree(vec![]);
        assert_eq!(
            select_key_pages(&tree, &[], 5).unwrap(),
            vec!["https://example.com/"]
        );
    }
}
