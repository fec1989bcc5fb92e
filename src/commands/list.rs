//! List site content

use anyhow::Result;
use indexmap::IndexMap;

use crate::content::loader::ContentLoader;
use crate::content::PostRecord;
use crate::helpers::Helpers;
use crate::Site;

/// List site content by type
pub fn run(site: &Site, content_type: &str) -> Result<()> {
    let loader = ContentLoader::new(site)?;
    let files = loader.load_posts()?;
    let skipped = files.iter().filter(|f| f.post().is_none()).count();
    if skipped > 0 {
        tracing::warn!("Skipping {} posts that fail validation", skipped);
    }
    let records: Vec<&PostRecord> = files.iter().filter_map(|f| f.post()).map(|p| &p.record).collect();

    let lines: Vec<String> = match content_type {
        "post" | "posts" => {
            let helpers = Helpers::new(&site.config);
            println!("Posts ({}):", records.len());
            files
                .iter()
                .filter_map(|f| f.post().map(|p| (f, p)))
                .map(|(file, post)| {
                    format!(
                        "{} - {} [{}]",
                        helpers.date(&post.record.date),
                        post.record.title,
                        file.source
                    )
                })
                .collect()
        }
        "tag" | "tags" => {
            let tags = count(records.iter().flat_map(|r| r.tags.iter()));
            println!("Tags ({}):", tags.len());
            tags.into_iter()
                .map(|(tag, n)| format!("{} ({})", tag, n))
                .collect()
        }
        "category" | "categories" => {
            let categories = count(records.iter().flat_map(|r| r.categories.iter()));
            println!("Categories ({}):", categories.len());
            categories
                .into_iter()
                .map(|(cat, n)| format!("{} ({})", cat, n))
                .collect()
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: post, tag, category",
                content_type
            );
        }
    };

    for line in lines {
        println!("  {}", line);
    }

    Ok(())
}

/// Count occurrences, most frequent first, ties in first-seen order
fn count<'a>(names: impl Iterator<Item = &'a String>) -> Vec<(&'a str, usize)> {
    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for name in names {
        *counts.entry(name.as_str()).or_insert(0) += 1;
    }
    let mut counts: Vec<_> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_orders_by_frequency() {
        let names: Vec<String> = ["swift", "loops", "swift", "closures", "loops", "swift"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            count(names.iter()),
            vec![("swift", 3), ("loops", 2), ("closures", 1)]
        );
    }

    #[test]
    fn test_unknown_type() {
        let tmp = tempfile::TempDir::new().unwrap();
        let site = Site::new(tmp.path()).unwrap();
        assert!(run(&site, "pages").is_err());
        assert!(run(&site, "tags").is_ok());
    }
}
