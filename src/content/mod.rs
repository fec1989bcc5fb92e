//! Content module - post records, front-matter, and validation

mod body;
pub mod date;
mod error;
mod frontmatter;
pub mod loader;
mod post;

pub use body::CodeBlock;
pub use date::DefaultZone;
pub use error::{Diagnostic, LoadError, PostError};
pub use frontmatter::{FrontMatter, DELIMITER};
pub use post::{ParsedPost, PostParser, PostRecord, UnknownKeys};
