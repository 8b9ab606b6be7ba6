//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use seoscan_core::{ProgressReporter, SiteReport, build_site_tree, scan_site};
use seoscan_crawler::HttpPageSource;
use seoscan_discovery::{DiscoveryOptions, discover_sitemap};
use seoscan_shared::{AppConfig, ScanConfig, init_config, load_config};
use tracing::info;
use url::Url;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// seoscan: evaluate a website's on-page SEO quality.
#[derive(Parser)]
#[command(
    name = "seoscan",
    version,
    about = "Evaluate a website's on-page SEO: sitemap structure, key pages, rule findings and scores.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Report output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Scan a site and print its SEO report.
    Scan {
        /// Site URL (home page).
        url: String,

        /// Maximum number of pages to analyze, home page included.
        #[arg(long)]
        max_pages: Option<usize>,

        /// Pages analyzed in parallel.
        #[arg(long)]
        concurrency: Option<usize>,

        /// Priority keyword for page selection (repeatable; replaces the configured list).
        #[arg(short, long = "keyword")]
        keywords: Vec<String>,

        /// Report format.
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Write the report to a file instead of stdout.
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Allow scanning localhost and private network addresses.
        #[arg(long)]
        allow_private: bool,
    },

    /// Print the site structure built from its sitemap.
    Tree {
        /// Site URL (home page).
        url: String,

        /// Number of tree levels to draw (root is level 0).
        #[arg(short, long)]
        depth: Option<usize>,

        /// Allow reading sitemaps from localhost and private network addresses.
        #[arg(long)]
        allow_private: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "seoscan=info",
        1 => "seoscan=debug",
        _ => "seoscan=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Scan {
            url,
            max_pages,
            concurrency,
            keywords,
            format,
            out,
            allow_private,
        } => {
            let overrides = ScanOverrides {
                max_pages,
                concurrency,
                keywords,
            };
            cmd_scan(&url, overrides, format, out, allow_private).await
        }
        Command::Tree {
            url,
            depth,
            allow_private,
        } => cmd_tree(&url, depth, allow_private).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

/// Flags that take precedence over the config file.
#[derive(Debug, Default)]
struct ScanOverrides {
    max_pages: Option<usize>,
    concurrency: Option<usize>,
    keywords: Vec<String>,
}

fn resolve_scan_config(config: &AppConfig, overrides: ScanOverrides) -> ScanConfig {
    let mut scan = ScanConfig::from(config);
    if let Some(max_pages) = overrides.max_pages {
        scan.max_pages = max_pages;
    }
    if let Some(concurrency) = overrides.concurrency {
        scan.concurrency = concurrency;
    }
    if !overrides.keywords.is_empty() {
        scan.priority_keywords = overrides.keywords;
    }
    scan
}

fn parse_site_url(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|e| eyre!("invalid URL '{url}': {e}"))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_scan(
    url: &str,
    overrides: ScanOverrides,
    format: OutputFormat,
    out: Option<PathBuf>,
    allow_private: bool,
) -> Result<()> {
    let config = load_config()?;
    let mut scan_config = resolve_scan_config(&config, overrides);
    scan_config.allow_private_hosts = allow_private;
    scan_config.validate()?;

    let site_url = parse_site_url(url)?;

    let mut source = HttpPageSource::new(scan_config.timeout_secs)?;
    if allow_private {
        source = source.allow_private_hosts();
    }

    info!(
        url,
        max_pages = scan_config.max_pages,
        concurrency = scan_config.concurrency,
        "scanning site"
    );

    let reporter = CliProgress::new();
    let report = scan_site(&site_url, &scan_config, Arc::new(source), &reporter).await?;

    let rendered = match format {
        OutputFormat::Text => report.render_text(&scan_config.scoring.status),
        OutputFormat::Json => serde_json::to_string_pretty(&report)?,
    };

    match out {
        Some(path) => {
            std::fs::write(&path, &rendered)
                .wrap_err_with(|| format!("failed to write report to {}", path.display()))?;
            let summary = report.summary(&scan_config.scoring.status);
            println!(
                "Report written to {} ({} pages, average score {:.2}, {})",
                path.display(),
                summary.page_count,
                summary.average_score,
                summary.status
            );
        }
        None => println!("{rendered}"),
    }

    Ok(())
}

async fn cmd_tree(url: &str, depth: Option<usize>, allow_private: bool) -> Result<()> {
    let config = load_config()?;
    let site_url = parse_site_url(url)?;

    let opts = DiscoveryOptions {
        timeout_secs: config.defaults.timeout_secs,
        allow_private,
        ..DiscoveryOptions::default()
    };

    info!(url, "reading sitemap");
    let entries = discover_sitemap(&site_url, &opts).await?;
    let tree = build_site_tree(&site_url, &entries);

    println!("{}", tree.render(depth));
    println!();
    println!("  Pages:       {}", tree.count_nodes());
    println!("  Depth:       {}", tree.max_depth());
    match tree.last_site_change() {
        Some(changed) => {
            let node = tree.most_recently_modified();
            println!(
                "  Last change: {} ({})",
                changed.format("%d.%m.%Y"),
                node.url
            );
        }
        None => println!("  Last change: unknown"),
    }

    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn page_done(&self, url: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Analyzed [{current}/{total}] {url}"));
    }

    fn done(&self, _report: &SiteReport) {
        self.spinner.finish_and_clear();
    }
}

// A scan that bails out with an error never reaches `done`.
impl Drop for CliProgress {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}
