//! Shared types, error model, and configuration for seoscan.
//!
//! This crate is the foundation depended on by all other seoscan crates.
//! It provides:
//! - [`SeoScanError`], the unified error type
//! - Domain types ([`SitemapEntry`], [`PageSignals`], [`Finding`], [`ScanId`])
//! - Configuration ([`AppConfig`], [`ScanConfig`], config loading)
//! - [`is_ssrf_target`], the private-host guard applied to every outbound request

pub mod config;
pub mod error;
pub mod net;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, LevelPenalty, PerformanceCutoffs, RulesConfig, ScanConfig,
    ScoreWeights, ScoringConfig, SelectionConfig, SeverityWeights, StatusThresholds,
    TechnicalPenalties, config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{Result, SeoScanError};
pub use net::{is_private_ip, is_ssrf_target};
pub use types::{
    Finding, FindingCategory, FindingLevel, Heading, ImageRef, PageSignals, PageStatus,
    SEMANTIC_TAGS, ScanId, SitemapEntry,
};
