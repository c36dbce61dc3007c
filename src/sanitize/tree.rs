//! Tolerant tree construction and text rendering.
//!
//! Both passes use an explicit stack, so hostile nesting cannot overflow
//! the call stack. Open-element depth is still capped: beyond
//! [`MAX_NESTING_DEPTH`] the fragment is rejected and the caller keeps the
//! raw text.

use super::tokenizer::{Token, Tokenizer};
use super::{MAX_NESTING_DEPTH, SanitizeError};

/// Elements that never have children.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

const ROOT: usize = 0;

#[derive(Debug)]
enum NodeKind {
    Element {
        name: String,
        /// Set only for anchors carrying a non-empty `href`.
        href: Option<String>,
    },
    Text(String),
}

#[derive(Debug)]
struct Node {
    kind: NodeKind,
    children: Vec<usize>,
}

/// Arena-allocated element/text tree of one fragment.
#[derive(Debug)]
pub(crate) struct Document {
    nodes: Vec<Node>,
}

impl Document {
    /// Parses a fragment, repairing whatever markup errors it can.
    pub(crate) fn parse(fragment: &str) -> Result<Self, SanitizeError> {
        let mut doc = Document {
            nodes: vec![Node {
                kind: NodeKind::Element {
                    name: String::new(),
                    href: None,
                },
                children: Vec::new(),
            }],
        };
        let mut open = vec![ROOT];

        for token in Tokenizer::new(fragment) {
            let parent = open.last().copied().unwrap_or(ROOT);
            match token {
                Token::Text(text) => {
                    doc.append(parent, NodeKind::Text(text.to_string()));
                }
                Token::StartTag {
                    name,
                    attrs,
                    self_closing,
                } => {
                    // Anchors do not nest: a new one closes the open one.
                    if name == "a" {
                        if let Some(pos) = doc.rposition_open(&open, "a") {
                            open.truncate(pos);
                        }
                    }
                    let parent = open.last().copied().unwrap_or(ROOT);

                    let href = if name == "a" {
                        attrs
                            .iter()
                            .find(|(key, _)| key == "href")
                            .map(|(_, value)| value.trim())
                            .filter(|value| !value.is_empty())
                            .map(ToString::to_string)
                    } else {
                        None
                    };
                    let is_void = VOID_ELEMENTS.contains(&name.as_str());
                    let id = doc.append(parent, NodeKind::Element { name, href });

                    if !self_closing && !is_void {
                        if open.len() > MAX_NESTING_DEPTH {
                            return Err(SanitizeError::NestingTooDeep {
                                max: MAX_NESTING_DEPTH,
                            });
                        }
                        open.push(id);
                    }
                }
                Token::EndTag { name } => {
                    // Closes the nearest matching element and everything
                    // opened after it; stray end tags are ignored.
                    if let Some(pos) = doc.rposition_open(&open, &name) {
                        open.truncate(pos);
                    }
                }
            }
        }

        Ok(doc)
    }

    fn append(&mut self, parent: usize, kind: NodeKind) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node {
            kind,
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    /// Index into `open` of the innermost open element called `name`.
    fn rposition_open(&self, open: &[usize], name: &str) -> Option<usize> {
        open.iter()
            .rposition(|&id| matches!(&self.nodes[id].kind, NodeKind::Element { name: n, .. } if n == name))
            .filter(|&pos| pos > 0)
    }

    /// Renders the tree depth-first: text verbatim, anchors as
    /// `inner (href)`, every other tag dropped.
    pub(crate) fn render(&self) -> String {
        enum Visit<'a> {
            Enter(usize),
            CloseLink(&'a str),
        }

        let mut out = String::new();
        let mut stack = vec![Visit::Enter(ROOT)];

        while let Some(visit) = stack.pop() {
            match visit {
                Visit::CloseLink(href) => {
                    out.push_str(" (");
                    out.push_str(href);
                    out.push(')');
                }
                Visit::Enter(id) => {
                    let node = &self.nodes[id];
                    match &node.kind {
                        NodeKind::Text(text) => out.push_str(text),
                        NodeKind::Element { href, .. } => {
                            if let Some(href) = href {
                                stack.push(Visit::CloseLink(href));
                            }
                            stack.extend(node.children.iter().rev().map(|&child| Visit::Enter(child)));
                        }
                    }
                }
            }
        }

        out
    }
}
