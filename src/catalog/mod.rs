//! Catalog - the read-only query surface over a built set of posts
//!
//! A [`Catalog`] is built once, from a live scan or from a materialized
//! snapshot, and is never mutated afterwards. Every query borrows from it, so
//! it can be shared between request handlers behind an `Arc`.

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Strategy;
use crate::content::loader::ContentLoader;
use crate::content::{sort_newest_first, Post};
use crate::Folio;

/// Errors raised while loading a materialized catalog
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read snapshot {path:?}: {source}")]
    SnapshotIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed snapshot {path:?}: {source}")]
    SnapshotFormat {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// URL path of the listing for `tag`
pub fn tag_path(tag: &str) -> String {
    format!("/api/tags/{}", utf8_percent_encode(tag, NON_ALPHANUMERIC))
}

/// One page of posts
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination<'a> {
    pub items: &'a [Post],
    pub total_pages: usize,
    pub current_page: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

/// Immutable, sorted collection of posts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    posts: Vec<Post>,
}

impl Catalog {
    /// Build a catalog from posts in any order.
    ///
    /// Posts are sorted newest first; a repeated slug keeps its first record.
    pub fn from_posts(posts: Vec<Post>) -> Self {
        let mut seen = HashSet::new();
        let mut posts: Vec<Post> = posts
            .into_iter()
            .filter(|post| {
                let fresh = seen.insert(post.slug.clone());
                if !fresh {
                    tracing::warn!("Dropping duplicate post '{}'", post.slug);
                }
                fresh
            })
            .collect();
        sort_newest_first(&mut posts);
        Self { posts }
    }

    /// Build the catalog by scanning the content directory
    pub fn scan(folio: &Folio) -> Self {
        Self::from_posts(ContentLoader::new(folio).load_posts())
    }

    /// Load a catalog frozen by `folio-rs build`
    pub fn from_snapshot(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path).map_err(|source| CatalogError::SnapshotIo {
            path: path.to_path_buf(),
            source,
        })?;
        let posts: Vec<Post> =
            serde_json::from_str(&content).map_err(|source| CatalogError::SnapshotFormat {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::debug!("Loaded {} posts from {:?}", posts.len(), path);
        Ok(Self::from_posts(posts))
    }

    /// Load the catalog the way the site is configured to serve it
    pub fn load(folio: &Folio) -> Result<Self, CatalogError> {
        let catalog = match folio.config.strategy {
            Strategy::Scan => Self::scan(folio),
            Strategy::Snapshot => Self::from_snapshot(&folio.snapshot_path())?,
            Strategy::Compiled => Self::from_snapshot(&folio.snapshot_path())?.without_bodies(),
        };
        tracing::info!(
            "Catalog ready: {} posts ({:?})",
            catalog.len(),
            folio.config.strategy
        );
        Ok(catalog)
    }

    /// Same catalog with every raw body dropped
    pub fn without_bodies(&self) -> Self {
        Self {
            posts: self.posts.iter().map(Post::without_body).collect(),
        }
    }

    /// All posts, newest first
    pub fn all(&self) -> &[Post] {
        &self.posts
    }

    /// Look up a post by slug
    pub fn get(&self, slug: &str) -> Option<&Post> {
        self.posts.iter().find(|p| p.slug == slug)
    }

    /// The `n` newest posts
    pub fn latest(&self, n: usize) -> &[Post] {
        &self.posts[..n.min(self.posts.len())]
    }

    /// Posts carrying `tag`, newest first
    pub fn by_tag(&self, tag: &str) -> Vec<&Post> {
        self.posts.iter().filter(|p| p.has_tag(tag)).collect()
    }

    /// Every tag in use, deduplicated and sorted
    pub fn tags(&self) -> Vec<&str> {
        self.posts
            .iter()
            .flat_map(|p| p.tags.iter().map(String::as_str))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Number of posts per tag, sorted by tag
    pub fn tag_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for post in &self.posts {
            let unique: BTreeSet<&str> = post.tags.iter().map(String::as_str).collect();
            for tag in unique {
                *counts.entry(tag).or_insert(0) += 1;
            }
        }
        counts
    }

    /// One 1-indexed page of `limit` posts
    pub fn paginate(&self, page: usize, limit: usize) -> Pagination<'_> {
        let total = self.posts.len();
        let total_pages = if limit == 0 { 0 } else { total.div_ceil(limit) };

        let items = match page.checked_sub(1) {
            Some(index) if limit > 0 => {
                let start = index.saturating_mul(limit).min(total);
                let end = start.saturating_add(limit).min(total);
                &self.posts[start..end]
            }
            _ => &[],
        };

        Pagination {
            items,
            total_pages,
            current_page: page,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }

    /// The newer and older posts around `slug`
    pub fn neighbours(&self, slug: &str) -> (Option<&Post>, Option<&Post>) {
        match self.get(slug) {
            Some(post) => (post.newer(&self.posts), post.older(&self.posts)),
            None => (None, None),
        }
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}
