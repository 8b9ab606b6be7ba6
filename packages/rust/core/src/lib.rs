//! Site evaluation logic and scan orchestration for seoscan.
//!
//! The pure parts (tree building, key-page selection, rule evaluation,
//! scoring, report assembly) are synchronous; [`pipeline`] ties them to
//! sitemap discovery and page fetching.

pub mod lint;
pub mod pipeline;
pub mod report;
pub mod score;
pub mod select;
pub mod tree;

pub use lint::RuleEngine;
pub use pipeline::{ProgressReporter, SilentProgress, analyze_pages, scan_site};
pub use report::{LevelCounts, PageFailure, PageReport, SiteReport, SiteSummary, assemble_page};
pub use score::{PageScore, ScoreAggregator, SubScores};
pub use select::select_key_pages;
pub use tree::{Nodes, TreeNode, build_site_tree};
