//! Application configuration for seoscan.
//!
//! User config lives at `~/.seoscan/seoscan.toml`.
//! CLI flags override config file values, which override defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SeoScanError};
use crate::types::{FindingCategory, FindingLevel, PageStatus, SEMANTIC_TAGS};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "seoscan.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".seoscan";

// ---------------------------------------------------------------------------
// Config structs (matching seoscan.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Key-page selection policy.
    #[serde(default)]
    pub selection: SelectionConfig,

    /// Rule engine thresholds.
    #[serde(default)]
    pub rules: RulesConfig,

    /// Score aggregation weights and cutoffs.
    #[serde(default)]
    pub scoring: ScoringConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Maximum number of pages analyzed per scan (root included).
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Maximum pages analyzed concurrently.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Time budget for one page's fetch and analysis, in seconds.
    #[serde(default = "default_page_timeout_secs")]
    pub page_timeout_secs: u64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
            concurrency: default_concurrency(),
            timeout_secs: default_timeout_secs(),
            page_timeout_secs: default_page_timeout_secs(),
        }
    }
}

fn default_max_pages() -> usize {
    10
}
fn default_concurrency() -> usize {
    4
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_page_timeout_secs() -> u64 {
    60
}

/// `[selection]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Path keywords that mark a page as worth analyzing.
    #[serde(default = "default_priority_keywords")]
    pub priority_keywords: Vec<String>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            priority_keywords: default_priority_keywords(),
        }
    }
}

fn default_priority_keywords() -> Vec<String> {
    [
        "about", "contact", "product", "service", "catalog", "price", "shop", "blog",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// `[rules]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Ideal `<title>` length in characters.
    #[serde(default = "default_title_optimal_length")]
    pub title_optimal_length: usize,

    /// Allowed deviation from the ideal title length.
    #[serde(default = "default_title_length_delta")]
    pub title_length_delta: usize,

    #[serde(default = "default_meta_min_length")]
    pub meta_min_length: usize,

    #[serde(default = "default_meta_max_length")]
    pub meta_max_length: usize,

    /// At or below this meta/content relevance the page gets a warning.
    #[serde(default = "default_relevance_low")]
    pub relevance_low: f64,

    /// At or above this meta/content relevance the page is rated great.
    #[serde(default = "default_relevance_high")]
    pub relevance_high: f64,

    /// More distinct semantic tags than this earns a GREAT finding.
    #[serde(default = "default_great_semantic_tag_count")]
    pub great_semantic_tag_count: usize,

    #[serde(default = "default_semantic_tags")]
    pub semantic_tags: Vec<String>,

    /// `src` substrings suggesting an image path.
    #[serde(default = "default_image_path_hints")]
    pub image_path_hints: Vec<String>,

    /// Extensions that count as a descriptive image filename.
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            title_optimal_length: default_title_optimal_length(),
            title_length_delta: default_title_length_delta(),
            meta_min_length: default_meta_min_length(),
            meta_max_length: default_meta_max_length(),
            relevance_low: default_relevance_low(),
            relevance_high: default_relevance_high(),
            great_semantic_tag_count: default_great_semantic_tag_count(),
            semantic_tags: default_semantic_tags(),
            image_path_hints: default_image_path_hints(),
            image_extensions: default_image_extensions(),
        }
    }
}

impl RulesConfig {
    pub fn title_min_length(&self) -> usize {
        self.title_optimal_length
            .saturating_sub(self.title_length_delta)
    }

    pub fn title_max_length(&self) -> usize {
        self.title_optimal_length + self.title_length_delta
    }
}

fn default_title_optimal_length() -> usize {
    55
}
fn default_title_length_delta() -> usize {
    10
}
fn default_meta_min_length() -> usize {
    120
}
fn default_meta_max_length() -> usize {
    160
}
fn default_relevance_low() -> f64 {
    0.3
}
fn default_relevance_high() -> f64 {
    0.5
}
fn default_great_semantic_tag_count() -> usize {
    4
}
fn default_semantic_tags() -> Vec<String> {
    SEMANTIC_TAGS.iter().map(|t| t.to_string()).collect()
}
fn default_image_path_hints() -> Vec<String> {
    vec!["image".into(), "img".into(), "picture".into()]
}
fn default_image_extensions() -> Vec<String> {
    vec![".jpg".into(), ".jpeg".into(), ".png".into(), ".webp".into()]
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// `[scoring]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub weights: ScoreWeights,

    #[serde(default)]
    pub performance: PerformanceCutoffs,

    /// Multiplier applied to a category's per-finding penalty, by level.
    #[serde(default)]
    pub severity_weights: SeverityWeights,

    /// Maximum content-quality penalty per category.
    #[serde(default = "default_category_max_penalty")]
    pub category_max_penalty: BTreeMap<FindingCategory, f64>,

    /// Max penalty for a content category missing from `category_max_penalty`.
    #[serde(default = "default_category_penalty")]
    pub default_category_penalty: f64,

    #[serde(default)]
    pub technical: TechnicalPenalties,

    #[serde(default)]
    pub status: StatusThresholds,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            performance: PerformanceCutoffs::default(),
            severity_weights: SeverityWeights::default(),
            category_max_penalty: default_category_max_penalty(),
            default_category_penalty: default_category_penalty(),
            technical: TechnicalPenalties::default(),
            status: StatusThresholds::default(),
        }
    }
}

impl ScoringConfig {
    /// Max content penalty for `category`, falling back to the default.
    pub fn max_penalty_for(&self, category: FindingCategory) -> f64 {
        self.category_max_penalty
            .get(&category)
            .copied()
            .unwrap_or(self.default_category_penalty)
    }
}

fn default_category_max_penalty() -> BTreeMap<FindingCategory, f64> {
    BTreeMap::from([
        (FindingCategory::Title, 25.0),
        (FindingCategory::Meta, 20.0),
        (FindingCategory::Heading, 20.0),
        (FindingCategory::Image, 15.0),
        (FindingCategory::Semantic, 10.0),
    ])
}
fn default_category_penalty() -> f64 {
    10.0
}

/// Sub-score weights; they are expected to sum to 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub performance: f64,
    pub content: f64,
    pub technical: f64,
    pub relevance: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            performance: 0.25,
            content: 0.35,
            technical: 0.30,
            relevance: 0.10,
        }
    }
}

/// Rendering-time step function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceCutoffs {
    /// At or below this many seconds the page scores 100.
    pub optimal_secs: f64,
    /// At or above this many seconds the page scores 0.
    pub max_secs: f64,
    /// Score between the two cutoffs.
    pub middle_score: f64,
}

impl Default for PerformanceCutoffs {
    fn default() -> Self {
        Self {
            optimal_secs: 2.5,
            max_secs: 5.0,
            middle_score: 50.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeverityWeights {
    pub critical: f64,
    pub error: f64,
    pub warning: f64,
    pub info: f64,
}

impl Default for SeverityWeights {
    fn default() -> Self {
        Self {
            critical: 1.0,
            error: 1.0,
            warning: 0.5,
            info: 0.2,
        }
    }
}

impl SeverityWeights {
    /// Weight for `level`; positive tiers never penalize.
    pub fn weight(&self, level: FindingLevel) -> f64 {
        match level {
            FindingLevel::Critical => self.critical,
            FindingLevel::Error => self.error,
            FindingLevel::Warning => self.warning,
            FindingLevel::Info => self.info,
            FindingLevel::Optimal | FindingLevel::Good | FindingLevel::Great => 0.0,
        }
    }
}

/// Points deducted per finding, split by whether the element is a key element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelPenalty {
    pub key_element: f64,
    pub other_element: f64,
}

impl LevelPenalty {
    fn new(key_element: f64, other_element: f64) -> Self {
        Self {
            key_element,
            other_element,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechnicalPenalties {
    /// Elements whose problems weigh more (`title`, `meta`, `h1`).
    pub key_elements: Vec<String>,
    pub critical: LevelPenalty,
    pub error: LevelPenalty,
    pub warning: LevelPenalty,
    pub info: LevelPenalty,
    /// Cap on the summed penalty.
    pub max_penalty: f64,
    /// Lowest technical score a page can get.
    pub floor: f64,
}

impl Default for TechnicalPenalties {
    fn default() -> Self {
        Self {
            key_elements: vec!["title".into(), "meta".into(), "h1".into()],
            critical: LevelPenalty::new(15.0, 8.0),
            error: LevelPenalty::new(15.0, 8.0),
            warning: LevelPenalty::new(7.0, 4.0),
            info: LevelPenalty::new(3.0, 1.0),
            max_penalty: 70.0,
            floor: 30.0,
        }
    }
}

impl TechnicalPenalties {
    /// Penalty for one finding of `level` on `element`.
    pub fn penalty(&self, level: FindingLevel, element: &str) -> f64 {
        let tier = match level {
            FindingLevel::Critical => &self.critical,
            FindingLevel::Error => &self.error,
            FindingLevel::Warning => &self.warning,
            FindingLevel::Info => &self.info,
            FindingLevel::Optimal | FindingLevel::Good | FindingLevel::Great => return 0.0,
        };
        if self.key_elements.iter().any(|e| e == element) {
            tier.key_element
        } else {
            tier.other_element
        }
    }
}

/// Lower bounds for each status, checked from best to worst.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusThresholds {
    pub great: f64,
    pub good: f64,
    pub satisfactory: f64,
    pub bad: f64,
}

impl Default for StatusThresholds {
    fn default() -> Self {
        Self {
            great: 90.0,
            good: 75.0,
            satisfactory: 60.0,
            bad: 40.0,
        }
    }
}

impl StatusThresholds {
    pub fn classify(&self, score: f64) -> PageStatus {
        if score >= self.great {
            PageStatus::Great
        } else if score >= self.good {
            PageStatus::Good
        } else if score >= self.satisfactory {
            PageStatus::Satisfactory
        } else if score >= self.bad {
            PageStatus::Bad
        } else {
            PageStatus::Critical
        }
    }
}

// ---------------------------------------------------------------------------
// Scan config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime scan configuration, merged from config file and CLI flags.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Maximum pages analyzed, root included.
    pub max_pages: usize,
    /// Maximum pages analyzed concurrently.
    pub concurrency: usize,
    /// HTTP request timeout in seconds.
    pub timeout_secs: u64,
    /// Per-page time budget in seconds.
    pub page_timeout_secs: u64,
    pub priority_keywords: Vec<String>,
    pub rules: RulesConfig,
    pub scoring: ScoringConfig,
    /// Allow requests to localhost/private IPs. Off unless asked for per run.
    pub allow_private_hosts: bool,
}

impl From<&AppConfig> for ScanConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_pages: config.defaults.max_pages,
            concurrency: config.defaults.concurrency,
            timeout_secs: config.defaults.timeout_secs,
            page_timeout_secs: config.defaults.page_timeout_secs,
            priority_keywords: config.selection.priority_keywords.clone(),
            rules: config.rules.clone(),
            scoring: config.scoring.clone(),
            allow_private_hosts: false,
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl ScanConfig {
    /// Reject settings no scan can run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_pages < 1 {
            return Err(SeoScanError::validation("max_pages must be at least 1"));
        }
        if self.concurrency < 1 {
            return Err(SeoScanError::validation("concurrency must be at least 1"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.seoscan/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| SeoScanError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.seoscan/seoscan.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SeoScanError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| SeoScanError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| SeoScanError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| SeoScanError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| SeoScanError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
