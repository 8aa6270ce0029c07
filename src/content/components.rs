//! Embedded MDX components
//!
//! Post bodies may embed capitalised JSX-style components. `Cover` and
//! `Mermaid` are expanded to plain HTML; any other component is passed through
//! untouched but must still be balanced, otherwise the body does not compile.
//! Fenced code blocks and inline code spans are never inspected.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use std::ops::Range;

lazy_static! {
    static ref COMPONENT_TAG: Regex = Regex::new(
        r#"<(/?)([A-Z][A-Za-z0-9]*)((?:\s+[A-Za-z_][\w:.-]*(?:\s*=\s*(?:"[^"]*"|'[^']*'|\{[^}]*\}))?)*)\s*(/?)>"#
    )
    .expect("component tag pattern");
    static ref ATTRIBUTE: Regex = Regex::new(
        r#"([A-Za-z_][\w:.-]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|\{\s*["'`]?([^}]*?)["'`]?\s*\})"#
    )
    .expect("component attribute pattern");
}

/// A body that cannot be compiled
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    #[error("component <{0}> is never closed")]
    UnclosedComponent(String),

    #[error("closing tag </{0}> has no matching opening tag")]
    UnexpectedClose(String),

    #[error("expected </{expected}> but found </{found}>")]
    MismatchedClose { expected: String, found: String },
}

/// Expand embedded components into HTML, leaving code untouched
pub fn expand_components(source: &str) -> Result<String, CompileError> {
    let mut output = String::with_capacity(source.len());
    let mut prose = String::new();
    let mut fence: Option<(char, usize)> = None;

    for line in source.split_inclusive('\n') {
        let marker = fence_marker(line);
        match (fence, marker) {
            (None, Some(open)) => {
                output.push_str(&expand_prose(&prose)?);
                prose.clear();
                fence = Some(open);
                output.push_str(line);
            }
            (Some((ch, len)), Some((close_ch, close_len))) if ch == close_ch && close_len >= len => {
                fence = None;
                output.push_str(line);
            }
            (Some(_), _) => output.push_str(line),
            (None, None) => prose.push_str(line),
        }
    }
    output.push_str(&expand_prose(&prose)?);

    Ok(output)
}

/// A fence line starts with three or more backticks or tildes
fn fence_marker(line: &str) -> Option<(char, usize)> {
    let trimmed = line.trim_start();
    let ch = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = trimmed.chars().take_while(|c| *c == ch).count();
    (len >= 3).then_some((ch, len))
}

struct OpenTag {
    name: String,
    /// Output offset just after the (possibly dropped) opening tag
    content_start: usize,
}

fn expand_prose(text: &str) -> Result<String, CompileError> {
    let code_spans = inline_code_ranges(text);
    let mut output = String::with_capacity(text.len());
    let mut stack: Vec<OpenTag> = Vec::new();
    let mut last = 0;

    for caps in COMPONENT_TAG.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if code_spans.iter().any(|r| r.contains(&whole.start())) {
            continue;
        }
        output.push_str(&text[last..whole.start()]);
        last = whole.end();

        let closing = !caps[1].is_empty();
        let name = caps[2].to_string();
        let self_closing = !caps[4].is_empty();
        let attrs = parse_attributes(&caps[3]);

        if closing {
            let open = stack
                .pop()
                .ok_or_else(|| CompileError::UnexpectedClose(name.clone()))?;
            if open.name != name {
                return Err(CompileError::MismatchedClose {
                    expected: open.name,
                    found: name,
                });
            }
            if name == "Mermaid" {
                let children = output.split_off(open.content_start);
                output.push_str(&mermaid(children.trim()));
            } else {
                output.push_str(whole.as_str());
            }
        } else if self_closing {
            match name.as_str() {
                "Cover" => output.push_str(&cover(&attrs)),
                "Mermaid" => {
                    let chart = attrs.get("chart").map(String::as_str).unwrap_or("");
                    output.push_str(&mermaid(chart));
                }
                _ => output.push_str(whole.as_str()),
            }
        } else {
            if name != "Mermaid" {
                output.push_str(whole.as_str());
            }
            stack.push(OpenTag {
                name,
                content_start: output.len(),
            });
        }
    }
    output.push_str(&text[last..]);

    match stack.pop() {
        Some(open) => Err(CompileError::UnclosedComponent(open.name)),
        None => Ok(output),
    }
}

fn parse_attributes(raw: &str) -> HashMap<String, String> {
    ATTRIBUTE
        .captures_iter(raw)
        .map(|caps| {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            (caps[1].to_string(), value)
        })
        .collect()
}

/// Byte ranges covered by inline code spans
fn inline_code_ranges(text: &str) -> Vec<Range<usize>> {
    let bytes = text.as_bytes();
    let mut ranges = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'`' {
            i += 1;
            continue;
        }
        let start = i;
        while i < bytes.len() && bytes[i] == b'`' {
            i += 1;
        }
        let run = i - start;

        // Find a closing run of the same length
        let mut j = i;
        let mut end = None;
        while j < bytes.len() {
            if bytes[j] == b'`' {
                let close_start = j;
                while j < bytes.len() && bytes[j] == b'`' {
                    j += 1;
                }
                if j - close_start == run {
                    end = Some(j);
                    break;
                }
            } else {
                j += 1;
            }
        }

        if let Some(end) = end {
            ranges.push(start..end);
            i = end;
        }
    }

    ranges
}

fn cover(attrs: &HashMap<String, String>) -> String {
    let attr = |key: &str| html_escape(attrs.get(key).map(String::as_str).unwrap_or(""));
    format!(
        r#"<figure><img src="{}" alt="{}" class="rounded-xl" /><figcaption class="text-center">{}</figcaption></figure>"#,
        attr("src"),
        attr("alt"),
        attr("caption")
    )
}

fn mermaid(chart: &str) -> String {
    format!(r#"<pre class="mermaid">{}</pre>"#, html_escape(chart))
}

/// Simple HTML escaping
pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
