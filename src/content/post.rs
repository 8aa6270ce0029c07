//! Post model and record extraction

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::path::PathBuf;

use super::frontmatter::{parse_date, FrontMatter, FrontmatterError};

/// Description used when a post declares neither description nor summary
pub const DEFAULT_DESCRIPTION: &str = "Blog post";

/// Reading speed used for the reading-time estimate
pub const DEFAULT_WORDS_PER_MINUTE: usize = 200;

/// Why a single content file was left out of the catalog
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("missing required front-matter field `{0}`")]
    Missing(&'static str),

    #[error("`publishedAt` is not a valid date: {0:?}")]
    InvalidDate(String),

    #[error(transparent)]
    Frontmatter(#[from] FrontmatterError),

    #[error("file name {0:?} is not a usable slug")]
    InvalidFileName(PathBuf),

    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),
}

/// A blog post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Post title
    pub title: String,

    /// Description, resolved from description, then summary, then a default
    pub description: String,

    /// Summary, resolved from summary, then description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// URL path of the post page
    pub link: String,

    /// Namespaced unique id
    pub uid: String,

    /// Slug (file name without extension)
    pub slug: String,

    /// Publication date as written in the front-matter
    pub published_at: String,

    /// Post tags, in declared order
    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Estimate such as "3 min read"
    pub reading_time: String,

    /// Raw Markdown/MDX body, kept for runtime rendering
    #[serde(rename = "content", default, skip_serializing_if = "Option::is_none")]
    pub raw_body: Option<String>,
}

impl Post {
    /// Extract a post from the raw text of one content file
    pub fn extract(
        slug: &str,
        content: &str,
        words_per_minute: usize,
    ) -> Result<Self, RecordError> {
        let (fm, body) = FrontMatter::parse(content)?;
        Self::from_front_matter(slug, fm, body, words_per_minute)
    }

    /// Validate front-matter and derive the computed fields
    pub fn from_front_matter(
        slug: &str,
        fm: FrontMatter,
        body: &str,
        words_per_minute: usize,
    ) -> Result<Self, RecordError> {
        let title = non_empty(fm.title.as_deref()).ok_or(RecordError::Missing("title"))?;
        let published_at =
            non_empty(fm.published_at.as_deref()).ok_or(RecordError::Missing("publishedAt"))?;
        if parse_date(published_at).is_none() {
            return Err(RecordError::InvalidDate(published_at.to_string()));
        }

        let description = non_empty(fm.description.as_deref())
            .or_else(|| non_empty(fm.summary.as_deref()))
            .unwrap_or(DEFAULT_DESCRIPTION)
            .to_string();
        let summary = non_empty(fm.summary.as_deref())
            .or_else(|| non_empty(fm.description.as_deref()))
            .map(str::to_string);

        let body = body.trim();

        Ok(Self {
            title: title.to_string(),
            description,
            summary,
            link: format!("/blog/{}", slug),
            uid: format!("blog-{}", slug),
            slug: slug.to_string(),
            published_at: published_at.to_string(),
            tags: fm.tags,
            author: fm.author,
            image: fm.image,
            reading_time: reading_time(body, words_per_minute),
            raw_body: Some(body.to_string()),
        })
    }

    /// Parsed publication date
    pub fn published_date(&self) -> Option<DateTime<Utc>> {
        parse_date(&self.published_at)
    }

    /// Publication time in milliseconds since the epoch, used for ordering
    pub fn published_timestamp(&self) -> i64 {
        self.published_date()
            .map(|dt| dt.timestamp_millis())
            .unwrap_or(i64::MIN)
    }

    /// Whether the post carries `tag`
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Copy of the post with the raw body dropped
    pub fn without_body(&self) -> Self {
        Self {
            raw_body: None,
            ..self.clone()
        }
    }

    /// Get the newer post in a catalog sorted newest first
    pub fn newer<'a>(&self, posts: &'a [Post]) -> Option<&'a Post> {
        let pos = posts.iter().position(|p| p.slug == self.slug)?;
        pos.checked_sub(1).and_then(|i| posts.get(i))
    }

    /// Get the older post in a catalog sorted newest first
    pub fn older<'a>(&self, posts: &'a [Post]) -> Option<&'a Post> {
        let pos = posts.iter().position(|p| p.slug == self.slug)?;
        posts.get(pos + 1)
    }
}

/// Estimate reading time as "<N> min read"
pub fn reading_time(body: &str, words_per_minute: usize) -> String {
    let words_per_minute = if words_per_minute == 0 {
        DEFAULT_WORDS_PER_MINUTE
    } else {
        words_per_minute
    };
    // An empty body still counts as one word
    let words = body.split_whitespace().count().max(1);
    format!("{} min read", words.div_ceil(words_per_minute))
}

/// Sort posts by publication date, newest first. Equal dates keep their order.
pub fn sort_newest_first(posts: &mut [Post]) {
    posts.sort_by_key(|p| Reverse(p.published_timestamp()));
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(slug: &str, published_at: &str) -> Post {
        let content = format!("---\ntitle: {slug}\npublishedAt: {published_at}\n---\nbody\n");
        Post::extract(slug, &content, DEFAULT_WORDS_PER_MINUTE).unwrap()
    }

    #[test]
    fn test_extract_derives_fields() {
        let content = r#"---
title: "Hello"
summary: Short summary
publishedAt: 2024-06-01
tags: [rust, rust, web]
image: /img/cover.png
---

One two three.
"#;
        let post = Post::extract("hello-world", content, 200).unwrap();
        assert_eq!(post.title, "Hello");
        assert_eq!(post.slug, "hello-world");
        assert_eq!(post.uid, "blog-hello-world");
        assert_eq!(post.link, "/blog/hello-world");
        assert_eq!(post.description, "Short summary");
        assert_eq!(post.summary.as_deref(), Some("Short summary"));
        assert_eq!(post.tags, vec!["rust", "rust", "web"]);
        assert_eq!(post.image.as_deref(), Some("/img/cover.png"));
        assert_eq!(post.author, None);
        assert_eq!(post.reading_time, "1 min read");
        assert_eq!(post.raw_body.as_deref(), Some("One two three."));
    }

    #[test]
    fn test_description_fallback_chain() {
        let explicit = Post::extract(
            "a",
            "---\ntitle: A\npublishedAt: 2024-01-01\ndescription: Desc\nsummary: Sum\n---\n",
            200,
        )
        .unwrap();
        assert_eq!(explicit.description, "Desc");
        assert_eq!(explicit.summary.as_deref(), Some("Sum"));

        let from_description = Post::extract(
            "b",
            "---\ntitle: B\npublishedAt: 2024-01-01\ndescription: Desc\n---\n",
            200,
        )
        .unwrap();
        assert_eq!(from_description.summary.as_deref(), Some("Desc"));

        let fallback = Post::extract(
            "c",
            "---\ntitle: C\npublishedAt: 2024-01-01\ndescription: ''\n---\n",
            200,
        )
        .unwrap();
        assert_eq!(fallback.description, DEFAULT_DESCRIPTION);
        assert_eq!(fallback.summary, None);
    }

    #[test]
    fn test_missing_required_fields() {
        let no_date = Post::extract("x", "---\ntitle: X\n---\nBody", 200).unwrap_err();
        assert!(matches!(no_date, RecordError::Missing("publishedAt")));

        let no_title = Post::extract("x", "---\npublishedAt: 2024-01-01\n---\n", 200).unwrap_err();
        assert!(matches!(no_title, RecordError::Missing("title")));

        let blank_title =
            Post::extract("x", "---\ntitle: '  '\npublishedAt: 2024-01-01\n---\n", 200)
                .unwrap_err();
        assert!(matches!(blank_title, RecordError::Missing("title")));

        let no_header = Post::extract("x", "Just a body", 200).unwrap_err();
        assert!(matches!(no_header, RecordError::Missing("title")));
    }

    #[test]
    fn test_unparseable_date_is_rejected() {
        let err = Post::extract("x", "---\ntitle: X\npublishedAt: someday\n---\n", 200)
            .unwrap_err();
        assert!(matches!(err, RecordError::InvalidDate(_)));
    }

    #[test]
    fn test_reading_time() {
        assert_eq!(reading_time("", 200), "1 min read");
        assert_eq!(reading_time(&"word ".repeat(200), 200), "1 min read");
        assert_eq!(reading_time(&"word ".repeat(201), 200), "2 min read");
        assert_eq!(reading_time("a\n\n  b\tc", 1), "3 min read");
        assert_eq!(reading_time(&"word ".repeat(400), 0), "2 min read");
    }

    #[test]
    fn test_sort_newest_first_is_stable() {
        let mut posts = vec![
            post("old", "2023-01-01"),
            post("tie-1", "2024-01-01"),
            post("new", "2024-06-01T12:00:00Z"),
            post("tie-2", "2024-01-01T00:00:00Z"),
        ];
        sort_newest_first(&mut posts);
        let slugs: Vec<_> = posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["new", "tie-1", "tie-2", "old"]);
    }

    #[test]
    fn test_newer_and_older() {
        let posts = vec![post("c", "2024-03-01"), post("b", "2024-02-01"), post("a", "2024-01-01")];
        assert_eq!(posts[1].newer(&posts).map(|p| p.slug.as_str()), Some("c"));
        assert_eq!(posts[1].older(&posts).map(|p| p.slug.as_str()), Some("a"));
        assert!(posts[0].newer(&posts).is_none());
        assert!(posts[2].older(&posts).is_none());
    }

    #[test]
    fn test_serialized_field_names() {
        let json = serde_json::to_value(post("a", "2024-01-01")).unwrap();
        assert_eq!(json["publishedAt"], "2024-01-01");
        assert_eq!(json["readingTime"], "1 min read");
        assert_eq!(json["content"], "body");
        assert!(json.get("author").is_none());
        assert!(json.get("rawBody").is_none());
    }
}
