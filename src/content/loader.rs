//! Content loader - finds post files and parses them

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::{LoadError, ParsedPost, PostParser};
use crate::Site;

/// Outcome of loading one file
#[derive(Debug)]
pub struct SourceFile {
    /// Path relative to the site root, for display
    pub source: String,
    /// Full path on disk
    pub full_source: PathBuf,
    pub outcome: std::result::Result<ParsedPost, LoadError>,
}

impl SourceFile {
    pub fn post(&self) -> Option<&ParsedPost> {
        self.outcome.as_ref().ok()
    }
}

/// Loads posts from the source directory or explicit paths
pub struct ContentLoader<'a> {
    site: &'a Site,
    parser: PostParser,
}

impl<'a> ContentLoader<'a> {
    /// Create a loader using the site's parser settings
    pub fn new(site: &'a Site) -> Result<Self> {
        Ok(Self {
            site,
            parser: site.parser()?,
        })
    }

    /// Load every post under the source directory
    pub fn load_posts(&self) -> Result<Vec<SourceFile>> {
        if !self.site.source_dir.exists() {
            tracing::warn!("Source directory {:?} does not exist", self.site.source_dir);
            return Ok(Vec::new());
        }
        let paths = self.discover(&self.site.source_dir);
        Ok(self.load_files(paths))
    }

    /// Load posts named by paths, directories, or glob patterns
    pub fn load_targets(&self, targets: &[String]) -> Result<Vec<SourceFile>> {
        if targets.is_empty() {
            return self.load_posts();
        }

        let mut paths = Vec::new();
        for target in targets {
            let path = self.site.base_dir.join(target);
            if path.is_dir() {
                paths.extend(self.discover(&path));
            } else if path.is_file() {
                paths.push(path);
            } else {
                let pattern = path.to_string_lossy();
                let matches = glob::glob(&pattern)
                    .with_context(|| format!("Invalid path or pattern: {}", target))?;
                let before = paths.len();
                paths.extend(matches.filter_map(|m| m.ok()).filter(|p| p.is_file()));
                if paths.len() == before {
                    anyhow::bail!("No posts match {}", target);
                }
            }
        }
        paths.sort();
        paths.dedup();

        Ok(self.load_files(paths))
    }

    /// Parse one file from disk
    pub fn load_post(&self, path: &Path) -> std::result::Result<ParsedPost, LoadError> {
        let content = fs::read_to_string(path)?;
        Ok(self.parser.parse(&content)?)
    }

    fn discover(&self, dir: &Path) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = WalkDir::new(dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.into_path())
            .filter(|p| p.is_file() && self.is_post_file(p))
            .collect();
        paths.sort();
        tracing::debug!("Found {} post files under {:?}", paths.len(), dir);
        paths
    }

    fn is_post_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| {
                self.site
                    .config
                    .extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }

    /// Parse files in parallel; successes newest first, then failures by path
    fn load_files(&self, paths: Vec<PathBuf>) -> Vec<SourceFile> {
        let mut files: Vec<SourceFile> = paths
            .into_par_iter()
            .map(|path| {
                let outcome = self.load_post(&path);
                if let Err(e) = &outcome {
                    tracing::debug!("Failed to load post {:?}: {}", path, e);
                }
                SourceFile {
                    source: self.site.display_path(&path),
                    full_source: path,
                    outcome,
                }
            })
            .collect();

        files.sort_by(|a, b| match (&a.outcome, &b.outcome) {
            (Ok(x), Ok(y)) => y
                .record
                .date
                .cmp(&x.record.date)
                .then_with(|| a.source.cmp(&b.source)),
            (Ok(_), Err(_)) => std::cmp::Ordering::Less,
            (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
            (Err(_), Err(_)) => a.source.cmp(&b.source),
        });

        tracing::debug!("Loaded {} files", files.len());
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::PostError;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn post(title: &str, date: &str) -> String {
        format!("---\nlayout: post\ntitle: {}\ndate: {}\n---\nBody\n", title, date)
    }

    fn site_with_posts() -> (TempDir, Site) {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "_posts/2019-11-22-reduce.md",
            &post("Reduce", "2019-11-22 11:59:28 -0500"),
        );
        write(
            tmp.path(),
            "_posts/swift/2020-01-05-closures.markdown",
            &post("Closures", "2020-01-05 09:00:00 +0100"),
        );
        write(tmp.path(), "_posts/broken.md", "---\ntitle: Broken\n---\n");
        write(tmp.path(), "_posts/notes.txt", "not a post");
        let site = Site::new(tmp.path()).unwrap();
        (tmp, site)
    }

    #[test]
    fn test_load_posts_sorted() {
        let (_tmp, site) = site_with_posts();
        let loader = ContentLoader::new(&site).unwrap();
        let files = loader.load_posts().unwrap();

        assert_eq!(files.len(), 3);
        assert_eq!(files[0].post().unwrap().record.title, "Closures");
        assert_eq!(files[1].post().unwrap().record.title, "Reduce");
        assert!(files[2].source.ends_with("broken.md"));
        assert!(matches!(
            files[2].outcome,
            Err(LoadError::Post(PostError::MissingField { field: "date" }))
        ));
    }

    #[test]
    fn test_load_targets_with_glob() {
        let (_tmp, site) = site_with_posts();
        let loader = ContentLoader::new(&site).unwrap();

        let files = loader
            .load_targets(&["_posts/2019-*.md".to_string()])
            .unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].post().unwrap().record.title, "Reduce");

        let files = loader.load_targets(&["_posts/swift".to_string()]).unwrap();
        assert_eq!(files.len(), 1);

        assert!(loader.load_targets(&["nothing/*.md".to_string()]).is_err());
    }

    #[test]
    fn test_missing_source_dir() {
        let tmp = TempDir::new().unwrap();
        let site = Site::new(tmp.path()).unwrap();
        let loader = ContentLoader::new(&site).unwrap();
        assert!(loader.load_posts().unwrap().is_empty());
    }
}
