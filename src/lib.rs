//! folio-rs: content catalog pipeline for a Markdown/MDX blog
//!
//! Posts are read from a flat content directory, validated into an immutable
//! [`catalog::Catalog`], and served as JSON, HTML pages and an RSS feed. The
//! catalog can be scanned live on every start, or frozen ahead of time by the
//! build step into a JSON snapshot plus pre-compiled post bodies.

pub mod catalog;
pub mod commands;
pub mod config;
pub mod content;
pub mod feed;
pub mod generator;
pub mod server;

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Name of the site configuration file inside the base directory
pub const CONFIG_FILE: &str = "_config.yml";

/// A blog site rooted at a directory
#[derive(Debug, Clone)]
pub struct Folio {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Directory holding the post files
    pub content_dir: PathBuf,
    /// Directory receiving build artifacts
    pub output_dir: PathBuf,
}

impl Folio {
    /// Open the site in `base_dir`, reading `_config.yml` when present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let config_path = base_dir.as_ref().join(CONFIG_FILE);

        let mut config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            tracing::debug!("No {} found, using defaults", CONFIG_FILE);
            config::SiteConfig::default()
        };
        config.apply_env();

        Ok(Self::with_config(base_dir, config))
    }

    /// Open the site in `base_dir` with an explicit configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let content_dir = base_dir.join(&config.content_dir);
        let output_dir = base_dir.join(&config.output_dir);

        Self {
            config,
            base_dir,
            content_dir,
            output_dir,
        }
    }

    /// Where the JSON snapshot is written and read
    pub fn snapshot_path(&self) -> PathBuf {
        self.output_dir.join(&self.config.snapshot_file)
    }

    /// Where compiled post bodies live
    pub fn compiled_dir(&self) -> PathBuf {
        self.output_dir.join(&self.config.compiled_dir)
    }

    /// Where the static feed file is written
    pub fn feed_path(&self) -> PathBuf {
        self.output_dir
            .join(self.config.feed.path.trim_start_matches('/'))
    }

    /// Materialize the catalog into the output directory
    pub fn build(&self) -> Result<generator::BuildReport> {
        commands::build::run(self)
    }

    /// Remove build artifacts
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }

    /// Create a new post
    pub fn new_post(&self, title: &str) -> Result<PathBuf> {
        commands::new::create_post(self, title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_new_without_config_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let folio = Folio::new(dir.path()).unwrap();
        assert_eq!(folio.content_dir, dir.path().join("posts"));
        assert_eq!(
            folio.snapshot_path(),
            dir.path().join("public").join("blog-metadata.json")
        );
        assert_eq!(
            folio.compiled_dir(),
            dir.path().join("public").join("compiled-posts")
        );
        assert_eq!(folio.feed_path(), dir.path().join("public").join("rss.xml"));
    }

    #[test]
    fn test_new_reads_config_file() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "title: My Blog\ncontent_dir: content/blog\noutput_dir: dist\n",
        )
        .unwrap();

        let folio = Folio::new(dir.path()).unwrap();
        assert_eq!(folio.config.title, "My Blog");
        assert_eq!(folio.content_dir, dir.path().join("content/blog"));
        assert_eq!(folio.output_dir, dir.path().join("dist"));
    }

    #[test]
    fn test_new_rejects_broken_config() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "title: [oops\n").unwrap();
        assert!(Folio::new(dir.path()).is_err());
    }
}
