//! List site content

use anyhow::Result;
use std::fmt::Write;

use crate::catalog::{tag_path, Catalog};
use crate::Folio;

/// Format the catalog listing for `content_type`
pub fn render(catalog: &Catalog, content_type: &str) -> Result<String> {
    let mut out = String::new();

    match content_type {
        "post" | "posts" => {
            writeln!(out, "Posts ({}):", catalog.len())?;
            for post in catalog.all() {
                let date = post
                    .published_date()
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default();
                writeln!(
                    out,
                    "  {} - {} [{}] {}",
                    date,
                    post.title,
                    post.slug,
                    post.reading_time
                )?;
            }
        }
        "tag" | "tags" => {
            let counts = catalog.tag_counts();
            writeln!(out, "Tags ({}):", counts.len())?;
            let mut tags: Vec<_> = counts.into_iter().collect();
            // most used first, ties alphabetical
            tags.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
            for (tag, count) in tags {
                writeln!(out, "  {} ({}) {}", tag, count, tag_path(tag))?;
            }
        }
        _ => {
            anyhow::bail!("Unknown type: {}. Available: post, tag", content_type);
        }
    }

    Ok(out)
}

/// List site content by type
pub fn run(folio: &Folio, content_type: &str) -> Result<()> {
    let catalog = Catalog::load(folio)?;
    print!("{}", render(&catalog, content_type)?);
    Ok(())
}
