//! Post records and the parse-and-validate pass

use chrono::{DateTime, FixedOffset};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use super::body::{dangling_references, scan_fences, CodeBlock};
use super::date::{format_post_date, parse_post_date, DefaultZone};
use super::error::{Diagnostic, PostError};
use super::frontmatter::{key_line, FrontMatter, DELIMITER, FRONT_MATTER_LINE};

/// What to do with front-matter keys that have no meaning here
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownKeys {
    /// Keep them in [`PostRecord::extra`] for the renderer
    #[default]
    Preserve,
    Reject,
}

/// A validated post
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostRecord {
    /// Template name, opaque to the validator
    pub layout: Option<String>,

    pub title: String,

    /// Publication date with the offset it was written in
    pub date: DateTime<FixedOffset>,

    /// Ordered categories
    pub categories: Vec<String>,

    /// Tags, deduplicated in first-seen order
    pub tags: IndexSet<String>,

    /// Unrecognized front-matter fields, passed through untouched
    pub extra: IndexMap<String, Value>,

    /// Everything after the closing delimiter line, verbatim
    pub body: String,

    /// Fenced code blocks in the body
    pub code_blocks: Vec<CodeBlock>,
}

/// A record together with the warnings found while parsing it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedPost {
    pub record: PostRecord,
    pub warnings: Vec<Diagnostic>,
}

/// Parses content units into [`PostRecord`]s
#[derive(Debug, Clone, Default)]
pub struct PostParser {
    default_zone: Option<DefaultZone>,
    unknown_keys: UnknownKeys,
}

impl PostParser {
    /// Parser that requires explicit offsets and preserves unknown keys
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve dates written without an offset in this zone
    pub fn with_default_zone(mut self, zone: DefaultZone) -> Self {
        self.default_zone = Some(zone);
        self
    }

    pub fn with_unknown_keys(mut self, policy: UnknownKeys) -> Self {
        self.unknown_keys = policy;
        self
    }

    /// Parse and validate the raw text of one post
    pub fn parse(&self, content: &str) -> Result<ParsedPost, PostError> {
        let split = FrontMatter::split(content)?;
        let yaml = split.front_matter.unwrap_or("");
        let FrontMatter {
            layout,
            title,
            date,
            categories,
            tags,
            extra,
        } = FrontMatter::parse(yaml)?;

        let title = title
            .filter(|t| !t.is_empty())
            .ok_or(PostError::MissingField { field: "title" })?;
        let raw_date = date
            .filter(|d| !d.is_empty())
            .ok_or(PostError::MissingField { field: "date" })?;
        let date = parse_post_date(&raw_date, self.default_zone.as_ref()).ok_or_else(|| {
            PostError::MalformedDate {
                line: key_line(yaml, "date").unwrap_or(FRONT_MATTER_LINE),
                value: raw_date.clone(),
            }
        })?;

        if self.unknown_keys == UnknownKeys::Reject {
            if let Some(key) = extra.keys().next() {
                return Err(PostError::UnknownField {
                    line: key_line(yaml, key),
                    key: key.clone(),
                });
            }
        }

        let code_blocks = scan_fences(split.body, split.body_line)?;

        let mut warnings = Vec::new();
        let layout = layout.filter(|l| !l.is_empty());
        if layout.is_none() {
            warnings.push(Diagnostic::MissingLayout);
        }

        let mut tag_set = IndexSet::new();
        for tag in tags {
            if let Some(existing) = tag_set.get(&tag) {
                let warning = Diagnostic::DuplicateTag {
                    tag: String::clone(existing),
                };
                if !warnings.contains(&warning) {
                    warnings.push(warning);
                }
            } else {
                tag_set.insert(tag);
            }
        }

        warnings.extend(dangling_references(split.body, split.body_line));

        Ok(ParsedPost {
            record: PostRecord {
                layout,
                title,
                date,
                categories,
                tags: tag_set,
                extra,
                body: split.body.to_string(),
                code_blocks,
            },
            warnings,
        })
    }
}

impl PostRecord {
    /// Parse with the default parser settings
    pub fn parse(content: &str) -> Result<ParsedPost, PostError> {
        PostParser::new().parse(content)
    }

    /// Front-matter YAML for this record, without delimiter lines
    pub fn to_front_matter(&self) -> Result<String, serde_yaml::Error> {
        let mut map = Mapping::new();
        if let Some(layout) = &self.layout {
            map.insert(key("layout"), Value::String(layout.clone()));
        }
        map.insert(key("title"), Value::String(self.title.clone()));
        map.insert(key("date"), Value::String(format_post_date(&self.date)));
        if !self.categories.is_empty() {
            map.insert(key("categories"), string_list(self.categories.iter()));
        }
        if !self.tags.is_empty() {
            map.insert(key("tags"), string_list(self.tags.iter()));
        }
        for (name, value) in &self.extra {
            map.insert(key(name), value.clone());
        }
        serde_yaml::to_string(&map)
    }

    /// Full content unit: delimited front-matter followed by the body
    pub fn to_source(&self) -> Result<String, serde_yaml::Error> {
        Ok(format!(
            "{delim}\n{}{delim}\n{}",
            self.to_front_matter()?,
            self.body,
            delim = DELIMITER
        ))
    }
}

fn key(name: &str) -> Value {
    Value::String(name.to_string())
}

fn string_list<'a>(items: impl Iterator<Item = &'a String>) -> Value {
    Value::Sequence(items.map(|s| Value::String(s.clone())).collect())
}
