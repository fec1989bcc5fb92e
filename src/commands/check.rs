//! Validate posts

use anyhow::Result;
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode};
use serde_json::json;
use std::fmt::Write as _;
use std::time::Duration;

use crate::config::SiteConfig;
use crate::content::loader::{ContentLoader, SourceFile};
use crate::content::LoadError;
use crate::Site;

/// How `check` reports its findings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// Treat warnings as failures
    pub strict: bool,
    pub format: OutputFormat,
}

/// Totals over one check run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckSummary {
    pub checked: usize,
    pub failed: usize,
    pub warnings: usize,
    pub strict: bool,
}

impl CheckSummary {
    pub fn from_files(files: &[SourceFile], strict: bool) -> Self {
        let mut summary = CheckSummary {
            checked: files.len(),
            strict,
            ..Default::default()
        };
        for file in files {
            match &file.outcome {
                Ok(post) => summary.warnings += post.warnings.len(),
                Err(_) => summary.failed += 1,
            }
        }
        summary
    }

    pub fn passed(&self) -> bool {
        self.failed == 0 && !(self.strict && self.warnings > 0)
    }
}

/// Check posts and print the findings
pub fn run(site: &Site, targets: &[String], options: &CheckOptions) -> Result<CheckSummary> {
    let start = std::time::Instant::now();

    let loader = ContentLoader::new(site)?;
    let files = loader.load_targets(targets)?;
    let summary = CheckSummary::from_files(&files, options.strict || site.config.warnings_as_errors);

    match options.format {
        OutputFormat::Text => print!("{}", render_text(&files, &summary)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&render_json(&files))?),
    }

    tracing::info!(
        "Checked {} posts in {:.2}s",
        summary.checked,
        start.elapsed().as_secs_f64()
    );

    Ok(summary)
}

/// Human-readable report, one finding per line; messages carry their own line numbers
pub fn render_text(files: &[SourceFile], summary: &CheckSummary) -> String {
    let mut out = String::new();

    for file in files {
        match &file.outcome {
            Ok(post) => {
                for warning in &post.warnings {
                    let _ = writeln!(out, "warning: {}: {}", file.source, warning);
                }
            }
            Err(err) => {
                let _ = writeln!(out, "error: {}: {}", file.source, err);
            }
        }
    }

    let _ = writeln!(
        out,
        "Checked {} post{}: {} failed, {} warning{}",
        summary.checked,
        if summary.checked == 1 { "" } else { "s" },
        summary.failed,
        summary.warnings,
        if summary.warnings == 1 { "" } else { "s" },
    );
    out
}

/// Machine-readable report
pub fn render_json(files: &[SourceFile]) -> serde_json::Value {
    let entries: Vec<_> = files
        .iter()
        .map(|file| match &file.outcome {
            Ok(post) => json!({
                "path": file.source,
                "ok": true,
                "title": post.record.title,
                "warnings": post.warnings,
            }),
            Err(err) => {
                let (kind, line) = match err {
                    LoadError::Post(e) => (e.kind(), e.line()),
                    LoadError::Io(_) => ("io", None),
                };
                json!({
                    "path": file.source,
                    "ok": false,
                    "error": {
                        "kind": kind,
                        "line": line,
                        "message": err.to_string(),
                    },
                })
            }
        })
        .collect();
    serde_json::Value::Array(entries)
}

/// Re-run the check whenever a post or the config changes
pub fn watch(site: &Site, targets: &[String], options: &CheckOptions) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();
    let mut debouncer = new_debouncer(Duration::from_millis(500), tx)?;

    if site.source_dir.exists() {
        debouncer
            .watcher()
            .watch(&site.source_dir, RecursiveMode::Recursive)?;
        tracing::debug!("Watching: {:?}", site.source_dir);
    }
    if let Some(config_path) = SiteConfig::locate(&site.base_dir) {
        debouncer
            .watcher()
            .watch(&config_path, RecursiveMode::NonRecursive)?;
        tracing::debug!("Watching: {:?}", config_path);
    }

    tracing::info!("Watching for changes. Press Ctrl+C to stop.");

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let relevant = events.iter().any(|e| {
                    let path_str = e.path.to_string_lossy();
                    !path_str.contains(".git") && !path_str.ends_with('~')
                });
                if !relevant {
                    continue;
                }

                tracing::info!("Files changed, checking again...");
                // The config may have changed too
                let result = Site::new(&site.base_dir).and_then(|s| run(&s, targets, options));
                if let Err(e) = result {
                    tracing::error!("Check failed: {}", e);
                }
            }
            Ok(Err(e)) => {
                tracing::error!("Watch error: {:?}", e);
            }
            Err(e) => {
                tracing::error!("Channel error: {:?}", e);
                break;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn site() -> (TempDir, Site) {
        let tmp = TempDir::new().unwrap();
        let posts = tmp.path().join("_posts");
        fs::create_dir_all(&posts).unwrap();
        fs::write(
            posts.join("good.md"),
            "---\nlayout: post\ntitle: Good\ndate: 2019-11-22 11:59:28 -0500\n---\nSee [x][y].\n",
        )
        .unwrap();
        fs::write(
            posts.join("bad.md"),
            "---\nlayout: post\ntitle: Bad\ndate: 2019-11-22 11:59:28 -0500\n---\n```swift\n",
        )
        .unwrap();
        let site = Site::new(tmp.path()).unwrap();
        (tmp, site)
    }

    #[test]
    fn test_summary_and_text_report() {
        let (_tmp, site) = site();
        let files = ContentLoader::new(&site).unwrap().load_posts().unwrap();
        let summary = CheckSummary::from_files(&files, false);
        assert_eq!(summary.checked, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.warnings, 1);
        assert!(!summary.passed());

        let text = render_text(&files, &summary);
        assert!(text.contains("warning: _posts"));
        assert!(text.contains("good.md: line 6: link reference `y` has no definition"));
        assert!(text.contains("bad.md: line 6: code fence"));
        assert!(text.ends_with("Checked 2 posts: 1 failed, 1 warning\n"));
    }

    #[test]
    fn test_strict_fails_on_warnings() {
        let (_tmp, site) = site();
        let files = ContentLoader::new(&site)
            .unwrap()
            .load_targets(&["_posts/good.md".to_string()])
            .unwrap();
        assert!(CheckSummary::from_files(&files, false).passed());
        assert!(!CheckSummary::from_files(&files, true).passed());
    }

    #[test]
    fn test_json_report() {
        let (_tmp, site) = site();
        let files = ContentLoader::new(&site).unwrap().load_posts().unwrap();
        let report = render_json(&files);
        let entries = report.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["ok"], true);
        assert_eq!(entries[0]["warnings"][0]["kind"], "dangling_reference");
        assert_eq!(entries[0]["warnings"][0]["reference"], "y");
        assert_eq!(entries[1]["error"]["kind"], "unbalanced_fence");
        assert_eq!(entries[1]["error"]["line"], 6);
    }
}
