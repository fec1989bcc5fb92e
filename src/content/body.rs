//! Body checks: fenced code blocks and link references

use pulldown_cmark::{
    BrokenLink, CodeBlockKind, CowStr, Event, LinkType, Options, Parser, Tag, TagEnd,
};
use serde::Serialize;

use super::error::{Diagnostic, PostError};

/// A fenced code block found in a post body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeBlock {
    /// Language label from the info string (`swift` in ```` ```swift ````)
    pub lang: Option<String>,
    /// 1-based line of the opening fence, counted from the start of the body
    pub line: usize,
}

fn markdown_options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH
}

/// Number of the body line holding byte `offset`, counted from `first_line`
fn line_at(body: &str, offset: usize, first_line: usize) -> usize {
    first_line + body.as_bytes()[..offset].iter().filter(|&&b| b == b'\n').count()
}

struct OpenFence {
    fence: String,
    body_line: usize,
    /// End of the whole block, closing fence included when there is one
    end: usize,
    /// End of the last content line
    content_end: usize,
}

impl OpenFence {
    /// CommonMark closes a fence at the end of its container; only an
    /// explicit closing line counts here
    fn is_closed(&self, body: &str) -> bool {
        let tail = &body[self.content_end.min(self.end)..self.end];
        tail.trim_end().ends_with(self.fence.as_str())
    }
}

/// Collect fenced code blocks, failing on a fence that is never closed
///
/// Fences nested in list items and block quotes count too. `first_line` is
/// the file line on which the body starts; it only affects the line
/// reported in errors.
pub fn scan_fences(body: &str, first_line: usize) -> Result<Vec<CodeBlock>, PostError> {
    let mut blocks = Vec::new();
    let mut open: Option<OpenFence> = None;

    for (event, range) in Parser::new_ext(body, markdown_options()).into_offset_iter() {
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                let source = &body[range.clone()];
                let opening = source.split_inclusive('\n').next().unwrap_or(source);
                let run = opening.trim_start_matches(|c: char| c.is_whitespace() || c == '>');
                let Some(marker) = run.chars().next() else {
                    continue;
                };
                let len = run.len() - run.trim_start_matches(marker).len();

                let body_line = line_at(body, range.start, 1);
                blocks.push(CodeBlock {
                    lang: info.split_whitespace().next().map(str::to_string),
                    line: body_line,
                });
                open = Some(OpenFence {
                    fence: marker.to_string().repeat(len),
                    body_line,
                    end: range.end,
                    content_end: range.start + opening.len(),
                });
            }
            Event::Text(_) => {
                if let Some(fence) = open.as_mut() {
                    fence.content_end = range.end;
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some(fence) = open.take() {
                    if !fence.is_closed(body) {
                        return Err(PostError::UnbalancedFence {
                            line: first_line + fence.body_line - 1,
                            fence: fence.fence,
                        });
                    }
                }
            }
            _ => {}
        }
    }

    Ok(blocks)
}

/// Find `[label][ref]` and `[ref][]` links whose reference has no definition
///
/// The body must already have balanced fences.
pub fn dangling_references<'a>(body: &'a str, first_line: usize) -> Vec<Diagnostic> {
    let mut dangling = Vec::new();

    let callback = |link: BrokenLink<'a>| -> Option<(CowStr<'a>, CowStr<'a>)> {
        if matches!(
            link.link_type,
            LinkType::Reference
                | LinkType::ReferenceUnknown
                | LinkType::Collapsed
                | LinkType::CollapsedUnknown
        ) {
            dangling.push(Diagnostic::DanglingReference {
                reference: link.reference.to_string(),
                line: line_at(body, link.span.start, first_line),
            });
        }
        None
    };

    Parser::new_with_broken_link_callback(body, markdown_options(), Some(callback))
        .for_each(drop);

    dangling
}
