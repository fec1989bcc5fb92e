//! Front-matter splitting and parsing

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Deserializer};
use serde_yaml::Value;
use std::borrow::Cow;

use super::error::PostError;

/// Delimiter line that opens and closes the front-matter block
pub const DELIMITER: &str = "---";

/// Render a scalar YAML value as a string; `None` for lists, mappings and null
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

/// Accept any scalar for a single-valued field
fn optional_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => scalar_to_string(&value)
            .map(Some)
            .ok_or_else(|| D::Error::custom("expected a single value, not a list or mapping")),
    }
}

/// Accept either whitespace-separated tokens or a list of scalars
fn tokens_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, SeqAccess, Visitor};
    use std::fmt;

    struct TokensOrList;

    impl<'de> Visitor<'de> for TokensOrList {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("space-separated words or a list of values")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value.split_whitespace().map(str::to_string).collect())
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_string()])
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_string()])
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_string()])
        }

        fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_string()])
        }

        fn visit_seq<S>(self, mut seq: S) -> Result<Self::Value, S::Error>
        where
            S: SeqAccess<'de>,
        {
            let mut vec = Vec::new();
            while let Some(item) = seq.next_element::<Value>()? {
                match scalar_to_string(&item) {
                    Some(s) if !s.is_empty() => vec.push(s),
                    Some(_) => {}
                    None if item.is_null() => {}
                    None => return Err(de::Error::custom("list items must be single values")),
                }
            }
            Ok(vec)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(TokensOrList)
}

/// Raw front-matter as written, before validation
#[derive(Debug, Clone, Default)]
pub struct FrontMatter {
    pub layout: Option<String>,
    pub title: Option<String>,
    pub date: Option<String>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,

    /// Unrecognized keys in source order, values untouched
    pub extra: IndexMap<String, Value>,
}

/// Keys holding a single scalar whose text is kept as written
const SINGLE_VALUED: &[&str] = &["layout", "title", "date"];

/// A content unit cut into its front-matter and body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split<'a> {
    /// Text between the delimiter lines; `None` when the file has no front-matter
    pub front_matter: Option<&'a str>,
    /// Everything after the closing delimiter line
    pub body: &'a str,
    /// File line on which the body starts
    pub body_line: usize,
}

/// File line of the first front-matter line (right after the opening delimiter)
pub const FRONT_MATTER_LINE: usize = 2;

fn is_delimiter(line: &str) -> bool {
    line.trim_end() == DELIMITER
}

impl FrontMatter {
    /// Cut `content` at the first two delimiter lines
    pub fn split(content: &str) -> Result<Split<'_>, PostError> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let mut lines = content.split_inclusive('\n');

        let opening = match lines.next() {
            Some(line) if is_delimiter(line) => line,
            _ => {
                return Ok(Split {
                    front_matter: None,
                    body: content,
                    body_line: 1,
                })
            }
        };

        let start = opening.len();
        let mut offset = start;
        for (idx, line) in lines.enumerate() {
            if is_delimiter(line) {
                return Ok(Split {
                    front_matter: Some(&content[start..offset]),
                    body: &content[offset + line.len()..],
                    body_line: idx + FRONT_MATTER_LINE + 1,
                });
            }
            offset += line.len();
        }

        Err(PostError::UnterminatedFrontMatter)
    }

    /// Parse the YAML between the delimiters
    pub fn parse(yaml: &str) -> Result<Self, PostError> {
        let blank = yaml
            .lines()
            .map(str::trim)
            .all(|line| line.is_empty() || line.starts_with('#'));
        if blank {
            return Ok(FrontMatter::default());
        }

        check_duplicate_keys(yaml)?;

        let source = quote_plain_scalars(yaml);
        let mapping = match serde_yaml::from_str::<Value>(&source).map_err(yaml_error)? {
            Value::Null => return Ok(FrontMatter::default()),
            Value::Mapping(mapping) => mapping,
            _ => {
                return Err(PostError::InvalidFrontMatter {
                    message: "expected `key: value` pairs".to_string(),
                    line: Some(FRONT_MATTER_LINE),
                })
            }
        };

        let mut front_matter = FrontMatter::default();
        for (key, value) in mapping {
            let name = scalar_to_string(&key).ok_or_else(|| PostError::InvalidFrontMatter {
                message: "keys must be single values".to_string(),
                line: Some(FRONT_MATTER_LINE),
            })?;
            let invalid = |err: serde_yaml::Error| PostError::InvalidFrontMatter {
                message: format!("{}: {}", name, err),
                line: key_line(yaml, &name),
            };

            match name.as_str() {
                "layout" => front_matter.layout = optional_scalar(value).map_err(invalid)?,
                "title" => front_matter.title = optional_scalar(value).map_err(invalid)?,
                "date" => front_matter.date = optional_scalar(value).map_err(invalid)?,
                "categories" => front_matter.categories = tokens_or_list(value).map_err(invalid)?,
                "tags" => front_matter.tags = tokens_or_list(value).map_err(invalid)?,
                _ => {
                    front_matter.extra.insert(name.clone(), value);
                }
            }
        }

        Ok(front_matter)
    }
}

fn yaml_error(err: serde_yaml::Error) -> PostError {
    PostError::InvalidFrontMatter {
        line: err
            .location()
            .map(|loc| loc.line() + FRONT_MATTER_LINE - 1),
        message: err.to_string(),
    }
}

/// Split a top-level `key: value` line into its key and the rest
fn top_level_entry(line: &str) -> Option<(&str, &str)> {
    let first = line.chars().next()?;
    if first.is_whitespace() || matches!(first, '#' | '-' | '?' | '"' | '\'' | '[' | '{') {
        return None;
    }
    let (idx, _) = line.match_indices(':').find(|(idx, _)| {
        line[idx + 1..]
            .chars()
            .next()
            .map_or(true, char::is_whitespace)
    })?;
    Some((line[..idx].trim_end(), &line[idx + 1..]))
}

/// File line of a top-level `key:` in the front-matter, if present
pub fn key_line(yaml: &str, key: &str) -> Option<usize> {
    yaml.lines()
        .position(|line| top_level_entry(line).map_or(false, |(k, _)| k == key))
        .map(|idx| idx + FRONT_MATTER_LINE)
}

/// Fail on the second occurrence of a top-level key
fn check_duplicate_keys(yaml: &str) -> Result<(), PostError> {
    let mut seen = IndexSet::new();
    for (idx, line) in yaml.lines().enumerate() {
        if let Some((key, _)) = top_level_entry(line) {
            if !seen.insert(key) {
                return Err(PostError::InvalidFrontMatter {
                    message: format!("duplicate key `{}`", key),
                    line: Some(idx + FRONT_MATTER_LINE),
                });
            }
        }
    }
    Ok(())
}

/// Single-quote plain `layout`/`title`/`date` values that YAML would read as
/// numbers or booleans, so `title: 5.10` stays `5.10`
fn quote_plain_scalars(yaml: &str) -> Cow<'_, str> {
    let lines: Vec<&str> = yaml.split_inclusive('\n').collect();
    let mut out = String::with_capacity(yaml.len());
    let mut changed = false;

    for (idx, line) in lines.iter().enumerate() {
        let quoted = top_level_entry(line)
            .filter(|(key, _)| SINGLE_VALUED.contains(key))
            .filter(|_| !continues(&lines[idx + 1..]))
            .and_then(|(key, rest)| {
                let value = plain_value(rest)?;
                let line_end = &line[line.trim_end_matches(['\r', '\n']).len()..];
                Some(format!("{}: '{}'{}", key, value.replace('\'', "''"), line_end))
            });

        match quoted {
            Some(quoted) => {
                out.push_str(&quoted);
                changed = true;
            }
            None => out.push_str(line),
        }
    }

    if changed {
        Cow::Owned(out)
    } else {
        Cow::Borrowed(yaml)
    }
}

/// Whether the next meaningful line is an indented continuation
fn continues(rest: &[&str]) -> bool {
    rest.iter()
        .find(|line| !line.trim().is_empty())
        .map_or(false, |line| line.starts_with([' ', '\t']))
}

/// The text of a one-line plain scalar that does not resolve to a string
fn plain_value(rest: &str) -> Option<&str> {
    let value = match rest.find(" #") {
        Some(idx) => &rest[..idx],
        None => rest,
    }
    .trim();

    let first = value.chars().next()?;
    if "'\"[]{}|>!&*#%@`".contains(first) {
        return None;
    }
    match serde_yaml::from_str::<Value>(value) {
        Ok(Value::Number(_)) | Ok(Value::Bool(_)) => Some(value),
        // Integers wider than 64 bits
        Err(_) if value.chars().all(|c| c.is_ascii_alphanumeric() || "+-._".contains(c)) => {
            Some(value)
        }
        _ => None,
    }
}
