//! postmatter: front-matter parser and validator for static blog posts
//!
//! A post is a text file that opens with a `---` delimited YAML block
//! (layout, title, date, categories, tags) followed by a Markdown body.
//! This crate turns such files into typed [`content::PostRecord`]s, reports
//! fatal problems as [`content::PostError`]s and collects non-fatal
//! [`content::Diagnostic`]s along the way.

pub mod commands;
pub mod config;
pub mod content;
pub mod helpers;

use anyhow::Result;
use std::path::{Path, PathBuf};

/// A site: a directory of posts plus its configuration
#[derive(Debug, Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Directory holding the posts
    pub source_dir: PathBuf,
}

impl Site {
    /// Open a site rooted at `base_dir`, loading its config file if present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();

        let config = match config::SiteConfig::locate(&base_dir) {
            Some(path) => {
                tracing::debug!("Loading config from {:?}", path);
                config::SiteConfig::load(&path)?
            }
            None => config::SiteConfig::default(),
        };

        let source_dir = base_dir.join(&config.source_dir);

        Ok(Self {
            config,
            base_dir,
            source_dir,
        })
    }

    /// Post parser configured from the site settings
    pub fn parser(&self) -> Result<content::PostParser> {
        let mut parser = content::PostParser::new().with_unknown_keys(self.config.unknown_keys);
        if let Some(zone) = self.config.default_zone()? {
            parser = parser.with_default_zone(zone);
        }
        Ok(parser)
    }

    /// Path shown to users: relative to the base directory when possible
    pub fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.base_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_site_without_config() {
        let tmp = TempDir::new().unwrap();
        let site = Site::new(tmp.path()).unwrap();
        assert_eq!(site.source_dir, tmp.path().join("_posts"));
        assert_eq!(
            site.display_path(&tmp.path().join("_posts/a.md")),
            format!("_posts{}a.md", std::path::MAIN_SEPARATOR)
        );
    }

    #[test]
    fn test_site_reads_config() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("_config.yml"),
            "source_dir: content\ntimezone: \"+01:00\"\n",
        )
        .unwrap();
        let site = Site::new(tmp.path()).unwrap();
        assert_eq!(site.source_dir, tmp.path().join("content"));

        let parsed = site
            .parser()
            .unwrap()
            .parse("---\ntitle: T\ndate: 2020-01-01\n---\n")
            .unwrap();
        assert_eq!(parsed.record.date.offset().local_minus_utc(), 3600);
    }
}
