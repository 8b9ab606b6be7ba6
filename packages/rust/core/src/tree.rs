//! Site structure tree.
//!
//! Folds a flat list of sitemap entries into an ownership tree of URL path
//! segments, rooted at the site's domain. Each node owns its children in
//! discovery order; sibling names are unique.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use url::Url;

use seoscan_shared::SitemapEntry;

// ---------------------------------------------------------------------------
// TreeNode
// ---------------------------------------------------------------------------

/// One path segment of the site (or the bare domain, for the root).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            priority: None,
            last_modified: None,
            children: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Pre-order traversal, root first.
    pub fn iter_nodes(&self) -> Nodes<'_> {
        Nodes { stack: vec![self] }
    }

    /// Nodes without children, in pre-order.
    pub fn iter_leaves(&self) -> impl Iterator<Item = &TreeNode> {
        self.iter_nodes().filter(|node| node.is_leaf())
    }

    /// Number of edges on the longest root-to-leaf path.
    pub fn max_depth(&self) -> usize {
        self.children
            .iter()
            .map(|child| child.max_depth() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Total number of nodes, root included.
    pub fn count_nodes(&self) -> usize {
        1 + self.children.iter().map(TreeNode::count_nodes).sum::<usize>()
    }

    /// First node in pre-order whose URL equals `url` exactly.
    pub fn find_by_url(&self, url: &str) -> Option<&TreeNode> {
        self.iter_nodes().find(|node| node.url == url)
    }

    /// The node with the strictly greatest modification time.
    ///
    /// Ties keep the earlier node in pre-order; a tree without any timestamps
    /// yields the root.
    pub fn most_recently_modified(&self) -> &TreeNode {
        let mut latest = self;
        for node in self.iter_nodes() {
            if let Some(modified) = node.last_modified {
                if latest.last_modified.is_none_or(|current| modified > current) {
                    latest = node;
                }
            }
        }
        latest
    }

    /// Greatest modification time anywhere in the tree.
    pub fn last_site_change(&self) -> Option<DateTime<Utc>> {
        self.iter_nodes().filter_map(|node| node.last_modified).max()
    }

    /// Draw the tree with box connectors, one node per line.
    ///
    /// `max_depth` limits how many levels are drawn; the root is level 0, so
    /// `Some(1)` draws only the root.
    pub fn render(&self, max_depth: Option<usize>) -> String {
        let mut lines = Vec::new();
        self.render_lines(&mut lines, max_depth, 0, "", true);
        lines.join("\n")
    }

    fn render_lines(
        &self,
        lines: &mut Vec<String>,
        max_depth: Option<usize>,
        depth: usize,
        prefix: &str,
        is_last: bool,
    ) {
        if max_depth.is_some_and(|limit| depth >= limit) {
            return;
        }

        let meta = self.meta_suffix();
        let child_prefix = if depth == 0 {
            lines.push(format!("🌐 {} ({}){meta}", self.name, self.url));
            String::new()
        } else {
            let connector = if is_last { "└── " } else { "├── " };
            let icon = if self.is_leaf() { "📄" } else { "📁" };
            lines.push(format!("{prefix}{connector}{icon} {}{meta}", self.name));
            format!("{prefix}{}", if is_last { "    " } else { "│   " })
        };

        let last = self.children.len().saturating_sub(1);
        for (i, child) in self.children.iter().enumerate() {
            child.render_lines(lines, max_depth, depth + 1, &child_prefix, i == last);
        }
    }

    fn meta_suffix(&self) -> String {
        let mut parts = Vec::new();
        if let Some(priority) = self.priority {
            parts.push(format!("priority: {priority}"));
        }
        if let Some(modified) = self.last_modified {
            parts.push(format!("modified: {}", modified.format("%d.%m.%Y")));
        }
        if parts.is_empty() {
            String::new()
        } else {
            format!(" [{}]", parts.join(", "))
        }
    }

    /// Fill in metadata this node does not have yet.
    fn absorb_metadata(&mut self, entry: &SitemapEntry) {
        if self.priority.is_none() {
            self.priority = entry.priority;
        }
        if self.last_modified.is_none() {
            self.last_modified = entry.last_modified;
        }
    }

    fn insert(&mut self, base: &str, segments: &[&str], entry: &SitemapEntry) {
        let mut node = self;
        for (depth, segment) in segments.iter().enumerate() {
            let idx = match node.children.iter().position(|c| c.name == *segment) {
                Some(idx) => idx,
                None => {
                    let url = format!("{base}/{}", segments[..=depth].join("/"));
                    node.children.push(TreeNode::new(*segment, url));
                    node.children.len() - 1
                }
            };
            node = &mut node.children[idx];
        }
        node.absorb_metadata(entry);
    }
}

/// Pre-order iterator over a [`TreeNode`] and its descendants.
pub struct Nodes<'a> {
    stack: Vec<&'a TreeNode>,
}

impl<'a> Iterator for Nodes<'a> {
    type Item = &'a TreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

// ---------------------------------------------------------------------------
// Building
// ---------------------------------------------------------------------------

/// Build the site tree for `base_url` from discovered sitemap entries.
///
/// The root is the site root of `base_url` (path, query and fragment
/// dropped), so a base URL pointing below the root still yields canonical
/// node URLs. Entries whose URL cannot be parsed are skipped. Priority and
/// modification time attach to the node the entry's path ends at; a repeated
/// path only fills in fields that are still missing.
#[instrument(skip_all, fields(base_url = %base_url, entries = entries.len()))]
pub fn build_site_tree(base_url: &Url, entries: &[SitemapEntry]) -> TreeNode {
    let site_root = site_root(base_url);
    let mut root = TreeNode::new(root_name(&site_root), site_root.as_str());
    let base = site_root.as_str().trim_end_matches('/');

    for entry in entries {
        let parsed = match Url::parse(&entry.url) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(url = %entry.url, error = %e, "skipping malformed sitemap URL");
                continue;
            }
        };
        let segments = path_segments(&parsed);
        root.insert(base, &segments, entry);
    }

    debug!(
        nodes = root.count_nodes(),
        depth = root.max_depth(),
        "site tree built"
    );

    root
}

fn site_root(url: &Url) -> Url {
    let mut root = url.clone();
    root.set_path("/");
    root.set_query(None);
    root.set_fragment(None);
    root
}

/// Host, plus `:port` when the URL carries one.
fn root_name(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}

fn path_segments(url: &Url) -> Vec<&str> {
    url.path()
        .split('/')
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .collect()
}
