//! Create a new post

use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use crate::Folio;

/// Scaffold a post file named after the slugified title
pub fn create_post(folio: &Folio, title: &str) -> Result<PathBuf> {
    let slug = slug::slugify(title);
    if slug.is_empty() {
        anyhow::bail!("Cannot derive a file name from title {:?}", title);
    }

    let extension = folio
        .config
        .extensions
        .first()
        .map(String::as_str)
        .unwrap_or("mdx");

    fs::create_dir_all(&folio.content_dir)?;
    let file_path = folio.content_dir.join(format!("{}.{}", slug, extension));

    if file_path.exists() {
        anyhow::bail!("File already exists: {:?}", file_path);
    }

    let today = chrono::Local::now().format("%Y-%m-%d");
    let content = format!(
        "---\ntitle: {}\npublishedAt: {}\ntags: []\n---\n",
        serde_json::to_string(title)?,
        today
    );

    fs::write(&file_path, content)?;
    tracing::info!("Created: {:?}", file_path);

    Ok(file_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::loader::ContentLoader;
    use tempfile::TempDir;

    #[test]
    fn test_create_post_is_loadable() {
        let dir = TempDir::new().unwrap();
        let folio = Folio::new(dir.path()).unwrap();

        let path = create_post(&folio, "Hello: World & \"Friends\"").unwrap();
        assert_eq!(path, folio.content_dir.join("hello-world-friends.mdx"));

        let post = ContentLoader::new(&folio).load_post(&path).unwrap();
        assert_eq!(post.title, "Hello: World & \"Friends\"");
        assert_eq!(post.slug, "hello-world-friends");
        assert!(post.tags.is_empty());
    }

    #[test]
    fn test_create_post_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let folio = Folio::new(dir.path()).unwrap();
        create_post(&folio, "Twice").unwrap();
        assert!(create_post(&folio, "Twice").is_err());
    }

    #[test]
    fn test_create_post_needs_a_slug() {
        let dir = TempDir::new().unwrap();
        let folio = Folio::new(dir.path()).unwrap();
        assert!(create_post(&folio, "!!!").is_err());
    }
}
