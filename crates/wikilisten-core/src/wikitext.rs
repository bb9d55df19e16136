//! Template invocations in raw wikitext.
//!
//! Dump files carry page source rather than parse trees, so templates are
//! found by scanning for balanced `{{ … }}` pairs. Parameters are split on
//! top-level `|`; pipes and equals signs inside nested templates or
//! `[[links|labels]]` stay in the parameter value.
//!
//! ```rust
//! use wikilisten_core::TemplateQuery;
//!
//! let text = "Intro {{Listen|filename=Foo bar.ogg|title=Foo}} outro";
//! assert_eq!(TemplateQuery::listen().extract_wikitext(text), ["Foo bar.ogg"]);
//! ```

use crate::template::{TemplateMatch, TemplatePart, TemplateQuery};

/// Every template invocation in `text`, in order of their opening braces.
///
/// Named parameters have their name and value trimmed; positional
/// parameters are named by their 1-based position.
#[must_use]
pub fn parse_templates(text: &str) -> Vec<TemplateMatch> {
    let bytes = text.as_bytes();
    let mut opens = Vec::new();
    let mut spans = Vec::new();

    let mut i = 0;
    while i + 1 < bytes.len() {
        match (bytes[i], bytes[i + 1]) {
            (b'{', b'{') => {
                opens.push(i + 2);
                i += 2;
            },
            (b'}', b'}') => {
                if let Some(start) = opens.pop() {
                    spans.push((start, i));
                }
                i += 2;
            },
            _ => i += 1,
        }
    }

    spans.sort_unstable_by_key(|&(start, _)| start);
    spans
        .into_iter()
        .map(|(start, end)| parse_body(&text[start..end]))
        .collect()
}

fn parse_body(body: &str) -> TemplateMatch {
    let mut segments = split_top_level(body, b'|').into_iter();
    let title = segments.next().unwrap_or_default().trim().to_string();

    let mut position = 0usize;
    let parts = segments
        .map(|segment| match split_top_level(segment, b'=').first() {
            Some(name) if name.len() < segment.len() => TemplatePart {
                name: name.trim().to_string(),
                value: segment[name.len() + 1..].trim().to_string(),
            },
            _ => {
                position += 1;
                TemplatePart {
                    name: position.to_string(),
                    value: segment.to_string(),
                }
            },
        })
        .collect();

    TemplateMatch { title, parts }
}

/// Split on `separator` where it is not nested inside `{{ }}` or `[[ ]]`.
fn split_top_level(s: &str, separator: u8) -> Vec<&str> {
    let bytes = s.as_bytes();
    let mut pieces = Vec::new();
    let (mut braces, mut brackets) = (0usize, 0usize);
    let mut start = 0;

    let mut i = 0;
    while i < bytes.len() {
        let pair = (bytes[i], bytes.get(i + 1).copied());
        match pair {
            (b'{', Some(b'{')) => braces += 1,
            (b'}', Some(b'}')) => braces = braces.saturating_sub(1),
            (b'[', Some(b'[')) => brackets += 1,
            (b']', Some(b']')) => brackets = brackets.saturating_sub(1),
            (c, _) if c == separator && braces == 0 && brackets == 0 => {
                pieces.push(&s[start..i]);
                start = i + 1;
                i += 1;
                continue;
            },
            _ => {
                i += 1;
                continue;
            },
        }
        i += 2;
    }
    pieces.push(&s[start..]);
    pieces
}

impl TemplateQuery {
    /// Matching parameter values in wikitext, in document order.
    ///
    /// Blank values contribute nothing.
    pub fn extract_wikitext(&self, text: &str) -> Vec<String> {
        parse_templates(text)
            .into_iter()
            .filter(|template| self.matches_template(&template.title))
            .flat_map(|template| template.parts)
            .filter(|part| self.matches_part(&part.name) && !part.value.trim().is_empty())
            .map(|part| part.value)
            .collect()
    }
}
