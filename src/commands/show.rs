//! Print a parsed post as JSON

use anyhow::{Context, Result};
use std::path::Path;

use crate::content::loader::ContentLoader;
use crate::content::ParsedPost;
use crate::Site;

/// Parse a single file and return its JSON rendering
pub fn render(site: &Site, file: &Path) -> Result<String> {
    let path = site.base_dir.join(file);
    let loader = ContentLoader::new(site)?;
    let parsed: ParsedPost = loader
        .load_post(&path)
        .with_context(|| format!("Failed to load {}", site.display_path(&path)))?;
    Ok(serde_json::to_string_pretty(&parsed)?)
}

/// Run the show command
pub fn run(site: &Site, file: &Path) -> Result<()> {
    println!("{}", render(site, file)?);
    Ok(())
}
