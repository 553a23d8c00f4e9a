//! Minimal arena DOM: elements with attributes, text nodes, parent links.
//!
//! Detached nodes stay in the arena; only nodes reachable from the body
//! take part in traversal.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub type NodeId = usize;

/// Subtrees whose text is never readable content nor highlightable.
pub const NON_CONTENT_TAGS: [&str; 3] = ["script", "style", "noscript"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element {
        tag: String,
        attrs: BTreeMap<String, String>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Serialized page tree, as loaded from and written to page snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeSpec {
    Text {
        text: String,
    },
    Element {
        tag: String,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        attrs: BTreeMap<String, String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<NodeSpec>,
    },
}

impl NodeSpec {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    #[cfg(test)]
    pub fn element(tag: &str, children: Vec<NodeSpec>) -> Self {
        Self::Element {
            tag: tag.to_string(),
            attrs: BTreeMap::new(),
            children,
        }
    }

    #[cfg(test)]
    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        if let Self::Element { attrs, .. } = &mut self {
            attrs.insert(name.to_string(), value.to_string());
        }
        self
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
    body: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            body: 0,
        };
        doc.body = doc.create_element("body", BTreeMap::new());
        doc
    }

    /// Build a document whose body is `spec`. A non-body root is wrapped.
    pub fn from_spec(spec: &NodeSpec) -> Self {
        let mut doc = Self::new();
        match spec {
            NodeSpec::Element {
                tag,
                attrs,
                children,
            } if tag.eq_ignore_ascii_case("body") => {
                if let NodeKind::Element { attrs: body_attrs, .. } = &mut doc.nodes[doc.body].kind
                {
                    *body_attrs = attrs.clone();
                }
                for child in children {
                    let id = doc.build(child);
                    doc.append_child(doc.body, id);
                }
            }
            other => {
                let id = doc.build(other);
                doc.append_child(doc.body, id);
            }
        }
        doc
    }

    fn build(&mut self, spec: &NodeSpec) -> NodeId {
        match spec {
            NodeSpec::Text { text } => self.create_text(text),
            NodeSpec::Element {
                tag,
                attrs,
                children,
            } => {
                let id = self.create_element(tag, attrs.clone());
                for child in children {
                    let child_id = self.build(child);
                    self.append_child(id, child_id);
                }
                id
            }
        }
    }

    pub fn to_spec(&self) -> NodeSpec {
        self.spec_of(self.body)
    }

    fn spec_of(&self, id: NodeId) -> NodeSpec {
        match &self.nodes[id].kind {
            NodeKind::Text(text) => NodeSpec::text(text.clone()),
            NodeKind::Element { tag, attrs } => NodeSpec::Element {
                tag: tag.clone(),
                attrs: attrs.clone(),
                children: self.nodes[id]
                    .children
                    .iter()
                    .map(|child| self.spec_of(*child))
                    .collect(),
            },
        }
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    #[cfg(test)]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id].kind {
            NodeKind::Element { tag, .. } => Some(tag.as_str()),
            NodeKind::Text(_) => None,
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.nodes[id].kind {
            NodeKind::Element { attrs, .. } => attrs.get(name).map(String::as_str),
            NodeKind::Text(_) => None,
        }
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attr(id, "class")
            .is_some_and(|list| list.split_ascii_whitespace().any(|c| c == class))
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id].kind {
            NodeKind::Text(text) => Some(text.as_str()),
            NodeKind::Element { .. } => None,
        }
    }

    pub fn create_element(&mut self, tag: &str, attrs: BTreeMap<String, String>) -> NodeId {
        self.push(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
            attrs,
        })
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Text(text.to_string()))
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        });
        self.nodes.len() - 1
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id].parent.take() {
            self.nodes[parent].children.retain(|c| *c != id);
        }
    }

    /// Replace `old` in its parent's child list with `replacements`, in order.
    pub fn replace_with(&mut self, old: NodeId, replacements: &[NodeId]) {
        let Some(parent) = self.nodes[old].parent else {
            return;
        };
        let Some(pos) = self.nodes[parent].children.iter().position(|c| *c == old) else {
            return;
        };
        for id in replacements {
            self.detach(*id);
            self.nodes[*id].parent = Some(parent);
        }
        self.nodes[parent]
            .children
            .splice(pos..=pos, replacements.iter().copied());
        self.nodes[old].parent = None;
    }

    /// Merge adjacent text children and drop empty ones, like DOM `normalize`.
    pub fn normalize(&mut self, parent: NodeId) {
        let children = std::mem::take(&mut self.nodes[parent].children);
        let mut merged: Vec<NodeId> = Vec::with_capacity(children.len());
        for child in children {
            let Some(text) = self.text(child).map(str::to_string) else {
                merged.push(child);
                continue;
            };
            if text.is_empty() {
                self.nodes[child].parent = None;
                continue;
            }
            let prev_text = merged.last().and_then(|prev| self.text(*prev).map(|_| *prev));
            match prev_text {
                Some(prev) => {
                    if let NodeKind::Text(existing) = &mut self.nodes[prev].kind {
                        existing.push_str(&text);
                    }
                    self.nodes[child].parent = None;
                }
                None => merged.push(child),
            }
        }
        self.nodes[parent].children = merged;
    }

    /// Pre-order element/text walk from `root`, not descending into
    /// subtrees whose root tag is in `skip` (the skipped root is not yielded).
    pub fn descendants(&self, root: NodeId, skip: &[&str]) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[root].children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if let Some(tag) = self.tag(id)
                && skip.contains(&tag)
            {
                continue;
            }
            out.push(id);
            stack.extend(self.nodes[id].children.iter().rev().copied());
        }
        out
    }

    /// Concatenated text of every text node under `root` (DOM `textContent`).
    pub fn text_content(&self, root: NodeId) -> String {
        if let Some(text) = self.text(root) {
            return text.to_string();
        }
        self.descendants(root, &[])
            .into_iter()
            .filter_map(|id| self.text(id))
            .collect()
    }

    /// Readable text under `root`: non-content subtrees skipped, whitespace
    /// runs collapsed to one space, ends trimmed.
    pub fn readable_text(&self, root: NodeId) -> String {
        let mut out = String::new();
        for id in self.descendants(root, &NON_CONTENT_TAGS) {
            let Some(text) = self.text(id) else {
                continue;
            };
            for word in text.split_whitespace() {
                if !out.is_empty() {
                    out.push(' ');
                }
                out.push_str(word);
            }
        }
        out
    }

    /// Elements under the body matching `selector`, in document order.
    pub fn query_all(&self, selector: &Selector) -> Vec<NodeId> {
        self.descendants(self.body, &[])
            .into_iter()
            .filter(|id| selector.matches(self, *id))
            .collect()
    }
}

/// The selector forms the content chain needs: tag, `.class`, `#id`,
/// and `[attr="value"]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    Tag(&'static str),
    Class(&'static str),
    Id(&'static str),
    Attr(&'static str, &'static str),
}

impl Selector {
    pub fn matches(&self, doc: &Document, id: NodeId) -> bool {
        match *self {
            Selector::Tag(tag) => doc.tag(id) == Some(tag),
            Selector::Class(class) => doc.has_class(id, class),
            Selector::Id(want) => doc.attr(id, "id") == Some(want),
            Selector::Attr(name, value) => doc.attr(id, name) == Some(value),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Tag(tag) => write!(f, "{tag}"),
            Selector::Class(class) => write!(f, ".{class}"),
            Selector::Id(id) => write!(f, "#{id}"),
            Selector::Attr(name, value) => write!(f, "[{name}=\"{value}\"]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        Document::from_spec(&NodeSpec::element(
            "body",
            vec![
                NodeSpec::element("h1", vec![NodeSpec::text("Title")]),
                NodeSpec::element("script", vec![NodeSpec::text("var x = 1;")]),
                NodeSpec::element(
                    "div",
                    vec![NodeSpec::text("  one\n two "), NodeSpec::text("three")],
                )
                .with_attr("class", "post content"),
            ],
        ))
    }

    #[test]
    fn readable_text_skips_scripts_and_collapses_whitespace() {
        let doc = sample();
        assert_eq!(doc.readable_text(doc.body()), "Title one two three");
        assert!(doc.text_content(doc.body()).contains("var x = 1;"));
    }

    #[test]
    fn class_selector_matches_any_class_token() {
        let doc = sample();
        let hits = doc.query_all(&Selector::Class("content"));
        assert_eq!(hits.len(), 1);
        assert!(doc.query_all(&Selector::Class("con")).is_empty());
    }

    #[test]
    fn replace_and_normalize_keep_text_content() {
        let mut doc = sample();
        let div = doc.query_all(&Selector::Tag("div"))[0];
        let first = doc.children(div)[0];
        let a = doc.create_text("  one");
        let b = doc.create_text("\n two ");
        doc.replace_with(first, &[a, b]);
        assert_eq!(doc.children(div).len(), 3);
        let before = doc.text_content(doc.body());

        doc.normalize(div);
        assert_eq!(doc.children(div).len(), 1);
        assert_eq!(doc.text_content(doc.body()), before);
    }

    #[test]
    fn spec_round_trip_preserves_structure() {
        let doc = sample();
        let again = Document::from_spec(&doc.to_spec());
        assert_eq!(again.to_spec(), doc.to_spec());
    }
}
