//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Environment variable that overrides the configured site URL
pub const SITE_URL_ENV: &str = "SITE_URL";

/// How the catalog is materialized for the serving process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Scan the content directory when the catalog is loaded
    #[default]
    Scan,
    /// Load the JSON snapshot written by `folio-rs build`
    Snapshot,
    /// Load the snapshot metadata and serve pre-compiled post bodies
    Compiled,
}

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub author: String,
    pub language: String,

    // URL
    pub url: String,

    // Directory
    pub content_dir: String,
    pub output_dir: String,
    pub snapshot_file: String,
    pub compiled_dir: String,

    // Content
    pub extensions: Vec<String>,
    pub words_per_minute: usize,
    pub strategy: Strategy,

    // Listing
    pub per_page: usize,
    pub latest_count: usize,

    #[serde(default)]
    pub highlight: HighlightConfig,
    #[serde(default)]
    pub feed: FeedConfig,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Blog".to_string(),
            description: "Personal blog posts about design, engineering, and technology"
                .to_string(),
            author: String::new(),
            language: "en-US".to_string(),

            url: "http://localhost:4000".to_string(),

            content_dir: "posts".to_string(),
            output_dir: "public".to_string(),
            snapshot_file: "blog-metadata.json".to_string(),
            compiled_dir: "compiled-posts".to_string(),

            extensions: vec!["mdx".to_string(), "md".to_string()],
            words_per_minute: 200,
            strategy: Strategy::Scan,

            per_page: 10,
            latest_count: 3,

            highlight: HighlightConfig::default(),
            feed: FeedConfig::default(),
            extra: HashMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Apply overrides taken from the process environment
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(SITE_URL_ENV) {
            if !url.trim().is_empty() {
                tracing::debug!("Site URL overridden by {}: {}", SITE_URL_ENV, url);
                self.url = url;
            }
        }
    }

    /// Site URL without a trailing slash, ready to be joined with `/blog/...`
    pub fn site_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    /// Whether a file extension names a content file
    pub fn is_content_extension(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }
}

/// Syntax highlighting for compiled code blocks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub theme: String,
    pub line_number: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            theme: "base16-ocean.dark".to_string(),
            line_number: false,
        }
    }
}

/// Syndication endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub path: String,
    pub cache_control: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            path: "rss.xml".to_string(),
            cache_control: "s-maxage=3600, stale-while-revalidate".to_string(),
        }
    }
}
