//! Create a new post

use anyhow::Result;
use chrono::SubsecRound;
use std::fs;
use std::path::PathBuf;

use crate::content::date::format_post_date;
use crate::Site;

const DEFAULT_SCAFFOLD: &str = "---\nlayout: {{ layout }}\ntitle: {{ title }}\ndate: {{ date }}\n---\n";

/// Create a new post or draft; returns the written path
pub fn create_post(site: &Site, title: &str, layout: &str, path: Option<&str>) -> Result<PathBuf> {
    let now = chrono::Local::now().fixed_offset().trunc_subsecs(0);

    let target_dir = match layout {
        "draft" => site.base_dir.join("_drafts"),
        _ => site.source_dir.clone(),
    };

    fs::create_dir_all(&target_dir)?;

    // Generate filename
    let filename = if let Some(p) = path {
        format!("{}.md", p)
    } else {
        let slug = slug::slugify(title);

        site.config
            .new_post_name
            .replace(":title", &slug)
            .replace(":year", &now.format("%Y").to_string())
            .replace(":month", &now.format("%m").to_string())
            .replace(":day", &now.format("%d").to_string())
            .replace(":i_month", &now.format("%-m").to_string())
            .replace(":i_day", &now.format("%-d").to_string())
    };
    let file_path = target_dir.join(&filename);

    // Load scaffold template
    let scaffold_path = site
        .base_dir
        .join("scaffolds")
        .join(format!("{}.md", layout));
    let scaffold_content = if scaffold_path.exists() {
        fs::read_to_string(&scaffold_path)?
    } else {
        DEFAULT_SCAFFOLD.to_string()
    };

    // Titles may contain `:` or quotes, so write them as YAML scalars
    let quoted_title = serde_yaml::to_string(title)?;
    let date = format_post_date(&now);
    let content = fill_scaffold(
        &scaffold_content,
        &[
            ("title", quoted_title.trim_end()),
            ("date", date.as_str()),
            ("layout", layout),
        ],
    );

    if file_path.exists() {
        anyhow::bail!("File already exists: {:?}", file_path);
    }

    if let Err(e) = site.parser()?.parse(&content) {
        tracing::warn!("New post will not pass validation: {}", e);
    }

    fs::write(&file_path, content)?;

    println!("Created: {:?}", file_path);

    Ok(file_path)
}

/// Replace `{{ name }}` placeholders in one pass; substituted text is never rescanned
fn fill_scaffold(scaffold: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(scaffold.len());
    let mut rest = scaffold;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let value = tail.find("}}").and_then(|end| {
            let name = tail[2..end].trim();
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, end + 2))
        });
        match value {
            Some((value, len)) => {
                out.push_str(value);
                rest = &tail[len..];
            }
            None => {
                out.push_str("{{");
                rest = &tail[2..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Run the new command
pub fn run(site: &Site, title: &str, layout: Option<&str>, path: Option<&str>) -> Result<PathBuf> {
    let layout = layout.unwrap_or(&site.config.default_layout);
    tracing::info!("Creating new {} with title: {}", layout, title);
    create_post(site, title, layout, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::PostRecord;
    use tempfile::TempDir;

    #[test]
    fn test_create_post_parses_back() {
        let tmp = TempDir::new().unwrap();
        let site = Site::new(tmp.path()).unwrap();

        let path = run(&site, "Closures: lazy initializers", None, None).unwrap();
        assert!(path.starts_with(tmp.path().join("_posts")));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.ends_with("-closures-lazy-initializers.md"));

        let parsed = PostRecord::parse(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.record.title, "Closures: lazy initializers");
        assert_eq!(parsed.record.layout.as_deref(), Some("post"));
        assert!(parsed.warnings.is_empty());

        assert!(run(&site, "Closures: lazy initializers", None, None).is_err());
    }

    #[test]
    fn test_create_with_scaffold_and_path() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("scaffolds")).unwrap();
        fs::write(
            tmp.path().join("scaffolds/draft.md"),
            "---\ntitle: {{ title }}\ndate: {{ date }}\ntags: swift\n---\nDraft body\n",
        )
        .unwrap();
        let site = Site::new(tmp.path()).unwrap();

        let path = create_post(&site, "Reduce", "draft", Some("reduce-notes")).unwrap();
        assert_eq!(path, tmp.path().join("_drafts/reduce-notes.md"));

        let parsed = PostRecord::parse(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.record.tags.iter().collect::<Vec<_>>(), vec!["swift"]);
    }

    #[test]
    fn test_placeholders_in_title_are_kept() {
        let tmp = TempDir::new().unwrap();
        let site = Site::new(tmp.path()).unwrap();

        let title = "Why {{ date }} and {{ layout }} stay";
        let path = run(&site, title, None, Some("placeholders")).unwrap();
        let parsed = PostRecord::parse(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.record.title, title);
        assert_eq!(parsed.record.layout.as_deref(), Some("post"));
    }

    #[test]
    fn test_fill_scaffold_leaves_unknown_placeholders() {
        let filled = fill_scaffold(
            "{{ title }} {{author}} {{ layout }} {{",
            &[("title", "{{ layout }}"), ("layout", "post")],
        );
        assert_eq!(filled, "{{ layout }} {{author}} post {{");
    }
}
