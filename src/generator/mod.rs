//! Generator module - freezes the catalog into deployable artifacts
//!
//! `folio-rs build` scans the content directory once and writes:
//!
//! - `blog-metadata.json`: the whole catalog, raw bodies included
//! - `compiled-posts/`: one pre-rendered HTML unit per post plus `index.json`
//! - `rss.xml`: the feed for static hosting
//!
//! Every artifact is written next to its final location and renamed into
//! place, so a reader never sees a half-written catalog.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::catalog::Catalog;
use crate::content::{CompileError, MarkdownRenderer};
use crate::feed;
use crate::Folio;

/// File name of the compiled-unit index
pub const INDEX_FILE: &str = "index.json";

/// Errors that abort a build
#[derive(Debug, thiserror::Error)]
pub enum MaterializeError {
    #[error("{} post(s) failed to compile: {}", .failed.len(), failed_slugs(.failed))]
    Compilation { failed: Vec<CompileFailure> },

    #[error("failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize {path:?}: {source}")]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// A post whose body could not be compiled
#[derive(Debug, Clone, PartialEq)]
pub struct CompileFailure {
    pub slug: String,
    pub error: CompileError,
}

fn failed_slugs(failed: &[CompileFailure]) -> String {
    failed
        .iter()
        .map(|f| f.slug.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Entry of the compiled-unit index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledEntry {
    /// Unit file name, relative to the compiled directory
    pub file: String,
    pub uid: String,
}

/// A compiled post body waiting to be written
struct CompiledUnit {
    slug: String,
    uid: String,
    html: String,
}

/// What a build produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub posts: usize,
    pub snapshot: PathBuf,
    pub compiled_dir: PathBuf,
    pub feed: PathBuf,
}

/// Writes the snapshot, compiled units and feed for a catalog
pub struct Materializer<'a> {
    folio: &'a Folio,
    renderer: MarkdownRenderer,
}

impl<'a> Materializer<'a> {
    /// Create a new materializer
    pub fn new(folio: &'a Folio) -> Self {
        let renderer = MarkdownRenderer::with_options(&folio.config.highlight);
        Self { folio, renderer }
    }

    /// Scan the content directory and write every artifact
    pub fn build(&self) -> Result<BuildReport, MaterializeError> {
        let catalog = Catalog::scan(self.folio);
        tracing::info!("Loaded {} posts", catalog.len());
        self.materialize(&catalog)
    }

    /// Write every artifact for an existing catalog.
    ///
    /// Bodies are compiled first; if any fails, nothing is written.
    pub fn materialize(&self, catalog: &Catalog) -> Result<BuildReport, MaterializeError> {
        let units = self.compile_all(catalog)?;

        let output_dir = &self.folio.output_dir;
        fs::create_dir_all(output_dir).map_err(|source| MaterializeError::Write {
            path: output_dir.clone(),
            source,
        })?;

        let snapshot = self.folio.snapshot_path();
        write_snapshot(catalog, &snapshot)?;
        tracing::info!("Generated {:?}", snapshot);

        let compiled_dir = self.folio.compiled_dir();
        write_compiled(&units, &compiled_dir)?;
        tracing::info!("Compiled {} posts into {:?}", units.len(), compiled_dir);

        let feed_path = self.folio.feed_path();
        let rss = feed::render_feed(catalog.all(), &self.folio.config);
        write_atomic(&feed_path, rss.as_bytes())?;
        tracing::info!("Generated {:?}", feed_path);

        Ok(BuildReport {
            posts: catalog.len(),
            snapshot,
            compiled_dir,
            feed: feed_path,
        })
    }

    /// Compile every body, reporting all failures at once
    fn compile_all(&self, catalog: &Catalog) -> Result<Vec<CompiledUnit>, MaterializeError> {
        let mut units = Vec::with_capacity(catalog.len());
        let mut failed = Vec::new();

        for post in catalog.all() {
            let body = post.raw_body.as_deref().unwrap_or("");
            match self.renderer.render(body) {
                Ok(html) => {
                    tracing::debug!("Compiled: {}", post.slug);
                    units.push(CompiledUnit {
                        slug: post.slug.clone(),
                        uid: post.uid.clone(),
                        html,
                    });
                }
                Err(error) => {
                    tracing::error!("Failed to compile {}: {}", post.slug, error);
                    failed.push(CompileFailure {
                        slug: post.slug.clone(),
                        error,
                    });
                }
            }
        }

        if failed.is_empty() {
            Ok(units)
        } else {
            Err(MaterializeError::Compilation { failed })
        }
    }
}

/// Write the catalog as a pretty-printed JSON array
pub fn write_snapshot(catalog: &Catalog, path: &Path) -> Result<(), MaterializeError> {
    let json =
        serde_json::to_string_pretty(catalog.all()).map_err(|source| MaterializeError::Serialize {
            path: path.to_path_buf(),
            source,
        })?;
    write_atomic(path, json.as_bytes())
}

/// Write compiled units and their index, then swap the directory into place
fn write_compiled(units: &[CompiledUnit], compiled_dir: &Path) -> Result<(), MaterializeError> {
    let staging = sibling(compiled_dir, "tmp");
    let previous = sibling(compiled_dir, "old");
    let write_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| MaterializeError::Write { path, source }
    };

    if staging.exists() {
        fs::remove_dir_all(&staging).map_err(write_err(&staging))?;
    }
    fs::create_dir_all(&staging).map_err(write_err(&staging))?;

    let mut index: IndexMap<String, CompiledEntry> = IndexMap::new();
    for unit in units {
        let file = format!("{}.html", unit.slug);
        let path = staging.join(&file);
        fs::write(&path, &unit.html).map_err(write_err(&path))?;
        index.insert(
            unit.slug.clone(),
            CompiledEntry {
                file,
                uid: unit.uid.clone(),
            },
        );
    }

    let index_path = staging.join(INDEX_FILE);
    let json = serde_json::to_string_pretty(&index).map_err(|source| {
        MaterializeError::Serialize {
            path: index_path.clone(),
            source,
        }
    })?;
    fs::write(&index_path, json).map_err(write_err(&index_path))?;

    if previous.exists() {
        fs::remove_dir_all(&previous).map_err(write_err(&previous))?;
    }
    if compiled_dir.exists() {
        fs::rename(compiled_dir, &previous).map_err(write_err(compiled_dir))?;
    }
    fs::rename(&staging, compiled_dir).map_err(write_err(compiled_dir))?;
    if previous.exists() {
        fs::remove_dir_all(&previous).map_err(write_err(&previous))?;
    }

    Ok(())
}

/// Write a file through a temporary sibling and rename it into place
fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), MaterializeError> {
    let tmp = sibling(path, "tmp");
    let parent = path.parent().unwrap_or(Path::new("."));
    let result = fs::create_dir_all(parent)
        .and_then(|_| fs::write(&tmp, contents))
        .and_then(|_| fs::rename(&tmp, path));
    result.map_err(|source| MaterializeError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

/// Lazily loaded compiled units, keyed by slug
#[derive(Debug, Clone, Default)]
pub struct CompiledIndex {
    dir: PathBuf,
    entries: IndexMap<String, CompiledEntry>,
}

impl CompiledIndex {
    /// Load `index.json` from a compiled directory
    pub fn load(dir: &Path) -> anyhow::Result<Self> {
        let index_path = dir.join(INDEX_FILE);
        let content = fs::read_to_string(&index_path)
            .map_err(|e| anyhow::anyhow!("Failed to read {:?}: {}", index_path, e))?;
        let entries: IndexMap<String, CompiledEntry> = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Malformed compiled index {:?}: {}", index_path, e))?;

        Ok(Self {
            dir: dir.to_path_buf(),
            entries,
        })
    }

    pub fn get(&self, slug: &str) -> Option<&CompiledEntry> {
        self.entries.get(slug)
    }

    /// Slugs in catalog order
    pub fn slugs(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read the compiled unit for `slug`, if the index knows it
    pub async fn render(&self, slug: &str) -> anyhow::Result<Option<String>> {
        let Some(entry) = self.entries.get(slug) else {
            return Ok(None);
        };
        let path = self.dir.join(&entry.file);
        let html = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to read compiled post {:?}: {}", path, e))?;
        Ok(Some(html))
    }
}
