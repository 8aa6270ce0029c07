//! Content loader - builds the post catalog from the content directory

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use super::post::{sort_newest_first, Post, RecordError};
use crate::Folio;

/// Loads posts from the content directory
pub struct ContentLoader<'a> {
    folio: &'a Folio,
}

impl<'a> ContentLoader<'a> {
    /// Create a new content loader
    pub fn new(folio: &'a Folio) -> Self {
        Self { folio }
    }

    /// Load every valid post, newest first.
    ///
    /// A file that cannot be read, parsed or validated is logged and skipped.
    /// An unreadable content directory yields an empty catalog.
    pub fn load_posts(&self) -> Vec<Post> {
        let posts_dir = &self.folio.content_dir;
        match fs::metadata(posts_dir) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                tracing::error!("Content directory {:?} is not a directory", posts_dir);
                return Vec::new();
            }
            Err(e) => {
                tracing::error!("Failed to read content directory {:?}: {}", posts_dir, e);
                return Vec::new();
            }
        }

        let mut posts = Vec::new();
        let mut slugs = HashSet::new();

        for entry in WalkDir::new(posts_dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Failed to read directory entry: {}", e);
                    continue;
                }
            };

            let path = entry.path();
            if !path.is_file() || !self.is_content_file(path) {
                continue;
            }

            match self.load_post(path) {
                Ok(post) => {
                    if !slugs.insert(post.slug.clone()) {
                        tracing::warn!(
                            "Skipping blog post {:?}: slug '{}' is already taken",
                            path,
                            post.slug
                        );
                        continue;
                    }
                    tracing::debug!("Loaded post: {}", post.slug);
                    posts.push(post);
                }
                Err(e) => {
                    tracing::warn!("Skipping blog post {:?}: {}", path, e);
                }
            }
        }

        sort_newest_first(&mut posts);

        posts
    }

    /// Load a single post from a file
    pub fn load_post(&self, path: &Path) -> Result<Post, RecordError> {
        let slug = path
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| RecordError::InvalidFileName(path.to_path_buf()))?;
        let content = fs::read_to_string(path)?;

        Post::extract(slug, &content, self.folio.config.words_per_minute)
    }

    fn is_content_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.folio.config.is_content_extension(e))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use tempfile::TempDir;

    fn site(files: &[(&str, &str)]) -> (TempDir, Folio) {
        let dir = TempDir::new().unwrap();
        let posts = dir.path().join("posts");
        fs::create_dir_all(&posts).unwrap();
        for (name, content) in files {
            fs::write(posts.join(name), content).unwrap();
        }
        let folio = Folio::with_config(dir.path(), SiteConfig::default());
        (dir, folio)
    }

    fn slugs(posts: &[Post]) -> Vec<&str> {
        posts.iter().map(|p| p.slug.as_str()).collect()
    }

    #[test]
    fn test_load_posts_sorted_newest_first() {
        let (_dir, folio) = site(&[
            ("a.md", "---\ntitle: \"A\"\npublishedAt: 2024-01-01\n---\nAlpha\n"),
            ("b.md", "---\ntitle: \"B\"\npublishedAt: 2024-06-01\n---\nBeta\n"),
            ("c.md", "---\ntitle: \"C\"\n---\nNo date\n"),
        ]);

        let posts = ContentLoader::new(&folio).load_posts();
        assert_eq!(slugs(&posts), vec!["b", "a"]);
        assert_eq!(posts[0].title, "B");
    }

    #[test]
    fn test_broken_files_are_skipped() {
        let (_dir, folio) = site(&[
            ("good.mdx", "---\ntitle: Good\npublishedAt: 2024-01-01\n---\nok\n"),
            ("bad-yaml.mdx", "---\ntitle: [oops\n---\n"),
            ("unclosed.mdx", "---\ntitle: Nope\n"),
            ("bad-date.mdx", "---\ntitle: Bad\npublishedAt: soon\n---\n"),
            ("notes.txt", "---\ntitle: Text\npublishedAt: 2024-01-01\n---\n"),
        ]);
        fs::write(folio.content_dir.join("binary.md"), [0xff, 0xfe, 0x00]).unwrap();
        fs::create_dir_all(folio.content_dir.join("nested.md")).unwrap();

        let posts = ContentLoader::new(&folio).load_posts();
        assert_eq!(slugs(&posts), vec!["good"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_file_name_is_skipped() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let (_dir, folio) = site(&[("ok.md", "---\ntitle: Ok\npublishedAt: 2024-01-01\n---\n")]);
        let path = folio.content_dir.join(OsStr::from_bytes(b"caf\xe9.md"));
        fs::write(&path, "---\ntitle: Cafe\npublishedAt: 2024-02-01\n---\n").unwrap();

        let err = ContentLoader::new(&folio).load_post(&path).unwrap_err();
        assert!(matches!(err, RecordError::InvalidFileName(_)));

        let posts = ContentLoader::new(&folio).load_posts();
        assert_eq!(slugs(&posts), vec!["ok"]);
    }

    #[test]
    fn test_duplicate_slug_keeps_first_file() {
        let (_dir, folio) = site(&[
            ("post.md", "---\ntitle: From md\npublishedAt: 2024-01-01\n---\n"),
            ("post.mdx", "---\ntitle: From mdx\npublishedAt: 2024-02-01\n---\n"),
        ]);

        let posts = ContentLoader::new(&folio).load_posts();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "From md");
    }

    #[test]
    fn test_nested_directories_are_not_scanned() {
        let (_dir, folio) = site(&[("top.md", "---\ntitle: Top\npublishedAt: 2024-01-01\n---\n")]);
        let nested = folio.content_dir.join("drafts");
        fs::create_dir_all(&nested).unwrap();
        fs::write(
            nested.join("hidden.md"),
            "---\ntitle: Hidden\npublishedAt: 2024-05-01\n---\n",
        )
        .unwrap();

        let posts = ContentLoader::new(&folio).load_posts();
        assert_eq!(slugs(&posts), vec!["top"]);
    }

    #[test]
    fn test_missing_content_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        let folio = Folio::with_config(dir.path(), SiteConfig::default());
        assert!(ContentLoader::new(&folio).load_posts().is_empty());
    }

    #[test]
    fn test_load_is_idempotent() {
        let (_dir, folio) = site(&[
            ("x.md", "---\ntitle: X\npublishedAt: 2024-03-01\ntags: [a]\n---\nx\n"),
            ("y.md", "---\ntitle: Y\npublishedAt: 2024-03-01\n---\ny\n"),
            ("z.md", "---\ntitle: Z\npublishedAt: 2023-03-01\n---\nz\n"),
        ]);

        let loader = ContentLoader::new(&folio);
        assert_eq!(loader.load_posts(), loader.load_posts());
    }
}
