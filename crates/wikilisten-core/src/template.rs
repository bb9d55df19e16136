//! Embedded-template extraction from parse trees.
//!
//! Template invocations appear in a parse tree as:
//!
//! ```xml
//! <template lineStart="1">
//!    <title>listen</title>
//!    <part><name>filename</name><equals>=</equals><value>foo.ogg</value></part>
//!    <part><name>filename2</name><equals>=</equals><value>bar.ogg</value></part>
//! </template>
//! ```
//!
//! Source pages are inconsistent about casing (`Listen`, `listen`, `LISTEN`),
//! so both the template title and the part names are matched with ASCII
//! case-insensitive substring tests.

use crate::config::DiscoveryConfig;
use crate::parse_tree::{Element, ParseTree};

/// One named parameter of a template invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplatePart {
    /// Parameter name; empty for positional parameters
    pub name: String,
    /// Parameter value text
    pub value: String,
}

/// One template invocation found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateMatch {
    /// Template title as written, trimmed
    pub title: String,
    /// Parameters in document order
    pub parts: Vec<TemplatePart>,
}

/// ASCII case-insensitive substring test.
///
/// Only `A-Z` are folded; other characters must match exactly.
#[must_use]
pub fn contains_ignore_ascii_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let haystack = haystack.as_bytes();
    let needle = needle.as_bytes();
    haystack
        .windows(needle.len())
        .any(|window| window.eq_ignore_ascii_case(needle))
}

/// Find every `template` element whose title satisfies `name_matches`.
pub fn find_templates<N>(tree: &ParseTree, name_matches: N) -> Vec<TemplateMatch>
where
    N: Fn(&str) -> bool,
{
    matching_templates(tree, &name_matches)
        .into_iter()
        .map(|template| TemplateMatch {
            title: title_text(template).trim().to_string(),
            parts: template
                .children_named("part")
                .map(|part| TemplatePart {
                    name: child_text(part, "name").trim().to_string(),
                    value: child_text(part, "value"),
                })
                .collect(),
        })
        .collect()
}

/// Extract parameter values from matching templates, in document order.
///
/// For every template whose title satisfies `name_matches`, each `part`
/// whose name satisfies `part_matches` contributes its value text. Parts
/// whose value is empty or only whitespace contribute nothing.
pub fn extract_template_values<N, P>(tree: &ParseTree, name_matches: N, part_matches: P) -> Vec<String>
where
    N: Fn(&str) -> bool,
    P: Fn(&str) -> bool,
{
    let mut values = Vec::new();
    for template in matching_templates(tree, &name_matches) {
        for part in template.children_named("part") {
            if !part_matches(&child_text(part, "name")) {
                continue;
            }
            let value = child_text(part, "value");
            if !value.trim().is_empty() {
                values.push(value);
            }
        }
    }
    values
}

fn matching_templates<'a, N>(tree: &'a ParseTree, name_matches: &N) -> Vec<&'a Element>
where
    N: Fn(&str) -> bool,
{
    tree.find_all(|e| e.name() == "template" && name_matches(&title_text(e)))
}

fn title_text(template: &Element) -> String {
    child_text(template, "title")
}

fn child_text(element: &Element, name: &str) -> String {
    element.child(name).map(Element::text).unwrap_or_default()
}

/// Substring-based template/part selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateQuery {
    template_match: String,
    part_match: String,
}

impl Default for TemplateQuery {
    fn default() -> Self {
        Self::listen()
    }
}

impl TemplateQuery {
    /// Match templates whose title contains `template_match` and parts whose
    /// name contains `part_match` (both ASCII case-insensitive).
    #[must_use]
    pub fn new(template_match: impl Into<String>, part_match: impl Into<String>) -> Self {
        Self {
            template_match: template_match.into(),
            part_match: part_match.into(),
        }
    }

    /// `listen` templates, `filename*` parameters.
    #[must_use]
    pub fn listen() -> Self {
        Self::new("listen", "filename")
    }

    /// Build from the discovery section of the configuration.
    #[must_use]
    pub fn from_config(config: &DiscoveryConfig) -> Self {
        Self::new(&config.template_match, &config.part_match)
    }

    /// Whether a template title qualifies.
    #[must_use]
    pub fn matches_template(&self, title: &str) -> bool {
        contains_ignore_ascii_case(title, &self.template_match)
    }

    /// Whether a part name qualifies.
    #[must_use]
    pub fn matches_part(&self, name: &str) -> bool {
        contains_ignore_ascii_case(name, &self.part_match)
    }

    /// Matching templates with all their parts.
    pub fn find_templates(&self, tree: &ParseTree) -> Vec<TemplateMatch> {
        find_templates(tree, |title| self.matches_template(title))
    }

    /// Matching parameter values in document order.
    pub fn extract(&self, tree: &ParseTree) -> Vec<String> {
        extract_template_values(
            tree,
            |title| self.matches_template(title),
            |name| self.matches_part(name),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn listen_page(title: &str) -> ParseTree {
        let xml = format!(
            "<root>Some intro.\n<template lineStart=\"1\"><title>{title}</title>\
             <part><name>something</name><equals>=</equals><value>else</value></part>\
             <part><name>filename</name><equals>=</equals><value>foo.ogg</value></part>\
             <part><name>filename2</name><equals>=</equals><value>bar.ogg</value></part>\
             <part><name>other</name><equals>=</equals><value>baz.ogg</value></part>\
             </template></root>"
        );
        ParseTree::parse(&xml).unwrap()
    }

    #[test]
    fn test_extracts_filenames_in_order() {
        let values = TemplateQuery::listen().extract(&listen_page("Listen"));
        assert_eq!(values, ["foo.ogg", "bar.ogg"]);
    }

    #[test]
    fn test_title_case_is_ignored() {
        for title in ["listen", "LISTEN", "Listen\n", "Multi-Listen start"] {
            let values = TemplateQuery::listen().extract(&listen_page(title));
            assert_eq!(values, ["foo.ogg", "bar.ogg"], "title {title:?}");
        }
    }

    #[test]
    fn test_unrelated_templates_are_skipped() {
        let values = TemplateQuery::listen().extract(&listen_page("Infobox song"));
        assert!(values.is_empty());
    }

    #[test]
    fn test_part_name_case_is_ignored() {
        let tree = ParseTree::parse(
            "<root><template><title>listen</title>\
             <part><name>FileName</name><equals>=</equals><value>A.ogg</value></part>\
             </template></root>",
        )
        .unwrap();
        assert_eq!(TemplateQuery::listen().extract(&tree), ["A.ogg"]);
    }

    #[test]
    fn test_template_without_matching_parts_contributes_nothing() {
        let tree = ParseTree::parse(
            "<root><template><title>Listen</title>\
             <part><name>title</name><equals>=</equals><value>Song</value></part>\
             </template>\
             <template><title>Listen</title>\
             <part><name>filename</name><equals>=</equals><value>x.ogg</value></part>\
             </template></root>",
        )
        .unwrap();
        assert_eq!(TemplateQuery::listen().extract(&tree), ["x.ogg"]);
    }

    #[test]
    fn test_blank_values_are_skipped() {
        let tree = ParseTree::parse(
            "<root><template><title>Listen</title>\
             <part><name>filename</name><equals>=</equals><value>A.ogg\n</value></part>\
             <part><name>filename2</name><equals>=</equals><value>\n</value></part>\
             <part><name>filename3</name><equals>=</equals><value> \t</value></part>\
             <part><name>filename4</name><equals>=</equals><value></value></part>\
             </template></root>",
        )
        .unwrap();
        assert_eq!(TemplateQuery::listen().extract(&tree), ["A.ogg\n"]);
    }

    #[test]
    fn test_document_without_templates_is_empty() {
        let tree = ParseTree::parse("<root>Plain article text.</root>").unwrap();
        assert!(TemplateQuery::listen().extract(&tree).is_empty());
        assert!(TemplateQuery::listen().find_templates(&tree).is_empty());
    }

    #[test]
    fn test_nested_templates_are_found() {
        let tree = ParseTree::parse(
            "<root><template><title>Infobox</title>\
             <part><name>audio</name><equals>=</equals><value>\
             <template><title>listen</title>\
             <part><name>filename</name><equals>=</equals><value>inner.ogg</value></part>\
             </template></value></part></template></root>",
        )
        .unwrap();
        assert_eq!(TemplateQuery::listen().extract(&tree), ["inner.ogg"]);
    }

    #[test]
    fn test_find_templates_keeps_all_parts() {
        let found = TemplateQuery::listen().find_templates(&listen_page("Listen"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Listen");
        assert_eq!(found[0].parts.len(), 4);
        assert_eq!(
            found[0].parts[1],
            TemplatePart {
                name: "filename".into(),
                value: "foo.ogg".into()
            }
        );
    }

    #[test]
    fn test_custom_predicates() {
        let values = extract_template_values(
            &listen_page("Listen"),
            |title| title == "Listen",
            |name| name == "other",
        );
        assert_eq!(values, ["baz.ogg"]);
    }

    #[test]
    fn test_contains_ignore_ascii_case() {
        assert!(contains_ignore_ascii_case("Template:LISTEN", "listen"));
        assert!(contains_ignore_ascii_case("anything", ""));
        assert!(!contains_ignore_ascii_case("lis", "listen"));
        assert!(!contains_ignore_ascii_case("LİSTEN", "listen"));
    }
}
