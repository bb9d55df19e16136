//! Structural documents built from the API's XML parse trees.
//!
//! `action=parse&prop=parsetree` returns the preprocessor tree of a page as an
//! XML string:
//!
//! ```xml
//! <root>Intro text<template lineStart="1"><title>Listen</title>
//!   <part><name>filename</name><equals>=</equals><value>Foo.ogg</value></part>
//! </template></root>
//! ```
//!
//! [`ParseTree::parse`] turns that string into an owned, immutable element
//! tree that supports structural queries ([`ParseTree::find_all`],
//! [`Element::child`]) instead of string searching.

use crate::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::Event;

/// A node in the tree: an element or a run of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Nested element
    Element(Element),
    /// Unescaped character data
    Text(String),
}

/// An XML element with its children in document order.
///
/// Attributes are not retained; nothing downstream queries them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    children: Vec<Node>,
}

impl Element {
    fn new(name: String) -> Self {
        Self {
            name,
            children: Vec::new(),
        }
    }

    /// Tag name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All child nodes in document order.
    #[must_use]
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Child elements in document order.
    pub fn child_elements(&self) -> impl Iterator<Item = &Self> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// Child elements with the given tag name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Self> {
        self.child_elements().filter(move |e| e.name == name)
    }

    /// First child element with the given tag name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Self> {
        self.child_elements().find(|e| e.name == name)
    }

    /// Concatenated direct text children (the equivalent of `./text()`).
    #[must_use]
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(text) => Some(text.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    /// All descendant text, depth-first.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Element(element) => element.collect_text(out),
            }
        }
    }

    fn collect_matching<'a, F>(&'a self, predicate: &F, out: &mut Vec<&'a Self>)
    where
        F: Fn(&Self) -> bool,
    {
        for element in self.child_elements() {
            if predicate(element) {
                out.push(element);
            }
            element.collect_matching(predicate, out);
        }
    }
}

/// Parsed, immutable structural document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTree {
    root: Element,
}

impl ParseTree {
    /// Parse an XML parse tree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] for malformed XML, mismatched or unclosed
    /// tags, or a document with no root element.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);

        // Bottom of the stack is a synthetic document node.
        let mut stack = vec![Element::new(String::new())];

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    stack.push(Element::new(name));
                },
                Event::Empty(e) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    push_node(&mut stack, Node::Element(Element::new(name)));
                },
                Event::End(_) => {
                    if stack.len() < 2 {
                        return Err(Error::Parse("Unexpected closing tag".to_string()));
                    }
                    if let Some(finished) = stack.pop() {
                        push_node(&mut stack, Node::Element(finished));
                    }
                },
                Event::Text(e) => {
                    let text = e.unescape().map_err(|e| Error::Parse(e.to_string()))?;
                    if stack.len() > 1 && !text.is_empty() {
                        push_node(&mut stack, Node::Text(text.into_owned()));
                    }
                },
                Event::CData(e) => {
                    let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                    if stack.len() > 1 {
                        push_node(&mut stack, Node::Text(text));
                    }
                },
                Event::Eof => break,
                _ => {},
            }
        }

        if stack.len() != 1 {
            return Err(Error::Parse(format!(
                "Unclosed element <{}>",
                stack.last().map_or("", |e| e.name.as_str())
            )));
        }

        let document = stack.pop().unwrap_or_else(|| Element::new(String::new()));
        let root = document
            .children
            .into_iter()
            .find_map(|node| match node {
                Node::Element(element) => Some(element),
                Node::Text(_) => None,
            })
            .ok_or_else(|| Error::Parse("Document has no root element".to_string()))?;

        Ok(Self { root })
    }

    /// The document element (normally `<root>`).
    #[must_use]
    pub const fn root(&self) -> &Element {
        &self.root
    }

    /// All elements (root included) satisfying `predicate`, in document order
    /// of their opening tags.
    pub fn find_all<F>(&self, predicate: F) -> Vec<&Element>
    where
        F: Fn(&Element) -> bool,
    {
        let mut out = Vec::new();
        if predicate(&self.root) {
            out.push(&self.root);
        }
        self.root.collect_matching(&predicate, &mut out);
        out
    }

    /// All elements with the given tag name, in document order.
    pub fn elements_named(&self, name: &str) -> Vec<&Element> {
        self.find_all(|e| e.name() == name)
    }
}

fn push_node(stack: &mut [Element], node: Node) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<root>Intro <template lineStart="1"><title>Listen
</title><part><name>filename</name><equals>=</equals><value>Foo bar.ogg</value></part><part><name index="1"/><value>positional</value></part></template> and <ext><name>ref</name><attr/><inner>cite &amp; more</inner><close>&lt;/ref&gt;</close></ext></root>"#;

    #[test]
    fn test_parses_mediawiki_tree() {
        let tree = ParseTree::parse(SAMPLE).unwrap();

        assert_eq!(tree.root().name(), "root");
        let templates = tree.elements_named("template");
        assert_eq!(templates.len(), 1);

        let template = templates[0];
        assert_eq!(template.child("title").unwrap().text(), "Listen\n");

        let parts: Vec<_> = template.children_named("part").collect();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].child("name").unwrap().text(), "filename");
        assert_eq!(parts[0].child("value").unwrap().text(), "Foo bar.ogg");
        assert_eq!(parts[1].child("name").unwrap().text(), "");
    }

    #[test]
    fn test_entities_are_unescaped() {
        let tree = ParseTree::parse(SAMPLE).unwrap();
        let ext = tree.elements_named("ext")[0];

        assert_eq!(ext.child("inner").unwrap().text(), "cite & more");
        assert_eq!(ext.child("close").unwrap().text(), "</ref>");
    }

    #[test]
    fn test_text_vs_text_content() {
        let tree = ParseTree::parse("<root>a<b>b<c>c</c></b>d</root>").unwrap();

        assert_eq!(tree.root().text(), "ad");
        assert_eq!(tree.root().text_content(), "abcd");
    }

    #[test]
    fn test_find_all_is_document_order() {
        let tree =
            ParseTree::parse("<root><x id='1'><x/></x><y><x/></y></root>").unwrap();
        let names: Vec<_> = tree
            .find_all(|e| e.name() == "x" || e.name() == "y")
            .iter()
            .map(|e| e.name().to_string())
            .collect();

        assert_eq!(names, ["x", "x", "y", "x"]);
    }

    #[test]
    fn test_child_lookup_with_owned_name() {
        let tree = ParseTree::parse("<root><a>1</a><b>2</b><b>3</b></root>").unwrap();
        let found = {
            let name = String::from("b");
            tree.root().child(&name)
        };

        assert_eq!(found.unwrap().text(), "2");
        assert!(tree.root().child("c").is_none());
    }

    #[test]
    fn test_cdata_is_text() {
        let tree = ParseTree::parse("<root><v><![CDATA[a < b]]></v></root>").unwrap();
        assert_eq!(tree.root().child("v").unwrap().text(), "a < b");
    }

    #[test]
    fn test_malformed_documents_fail() {
        for xml in ["", "just text", "<root><a></root>", "<root><a>", "</root>"] {
            let err = ParseTree::parse(xml).unwrap_err();
            assert_eq!(err.category(), "parse", "{xml:?} should fail to parse");
        }
    }
}
