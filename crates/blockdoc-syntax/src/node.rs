//! Owned element tree produced by the parser.

use crate::attributes::serialize_attributes;

/// Elements that never have children and are serialized without an end tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// A node in the markup tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Decoded character data
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Lower-cased tag name
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    /// First value for `name`, if present.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Replace the first value for `name` or append it.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name, value)),
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|c| c.split_whitespace().any(|c| c == class))
    }

    /// First child element matching `pred`.
    pub fn find_child(&self, pred: impl Fn(&Element) -> bool) -> Option<&Element> {
        self.child_elements().find(|e| pred(*e))
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// Depth-first search over descendants (not including `self`).
    pub fn find_descendant(&self, pred: &dyn Fn(&Element) -> bool) -> Option<&Element> {
        for child in self.child_elements() {
            if pred(child) {
                return Some(child);
            }
            if let Some(found) = child.find_descendant(pred) {
                return Some(found);
            }
        }
        None
    }

    pub fn inner_markup(&self) -> String {
        serialize(&self.children)
    }

    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.write_markup(&mut out);
        out
    }

    fn write_markup(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        out.push_str(&serialize_attributes(&self.attrs));
        out.push('>');
        if is_void(&self.tag) {
            return;
        }
        for child in &self.children {
            child.write_markup(out);
        }
        out.push_str("</");
        out.push_str(&self.tag);
        out.push('>');
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.write_text(&mut out);
        }
        out
    }
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        }
    }

    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.write_markup(&mut out);
        out
    }

    fn write_markup(&self, out: &mut String) {
        match self {
            Node::Element(e) => e.write_markup(out),
            Node::Text(t) => out.push_str(&html_escape::encode_text(t)),
        }
    }

    /// Concatenated character data of this node and its descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.write_text(&mut out);
        out
    }

    fn write_text(&self, out: &mut String) {
        match self {
            Node::Element(e) => {
                for child in &e.children {
                    child.write_text(out);
                }
            }
            Node::Text(t) => out.push_str(t),
        }
    }
}

impl From<Element> for Node {
    fn from(e: Element) -> Self {
        Node::Element(e)
    }
}

/// Serialize a node list back to markup.
pub fn serialize(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        node.write_markup(&mut out);
    }
    out
}

/// Partition `nodes` around the first element matching `is_marker`.
///
/// Elements enclosing the marker are split in two, each half keeping the
/// tag and attributes, so `<b>ab|cd</b>` yields `<b>ab</b>` and `<b>cd</b>`.
/// A half left without children is dropped. The marker itself is in
/// neither half.
pub fn split_at_marker(
    nodes: &[Node],
    is_marker: &dyn Fn(&Element) -> bool,
) -> Option<(Vec<Node>, Vec<Node>)> {
    for (i, node) in nodes.iter().enumerate() {
        let Node::Element(e) = node else {
            continue;
        };
        if is_marker(e) {
            return Some((nodes[..i].to_vec(), nodes[i + 1..].to_vec()));
        }
        if let Some((inner_before, inner_after)) = split_at_marker(&e.children, is_marker) {
            let shell = |children: Vec<Node>| Element {
                tag: e.tag.clone(),
                attrs: e.attrs.clone(),
                children,
            };
            let mut before = nodes[..i].to_vec();
            if !inner_before.is_empty() {
                before.push(shell(inner_before).into());
            }
            let mut after = Vec::new();
            if !inner_after.is_empty() {
                after.push(shell(inner_after).into());
            }
            after.extend_from_slice(&nodes[i + 1..]);
            return Some((before, after));
        }
    }
    None
}

/// Plain text of a node list.
pub fn text_content(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        node.write_text(&mut out);
    }
    out
}
