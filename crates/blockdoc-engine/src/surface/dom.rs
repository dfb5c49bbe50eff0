//! Arena-backed in-memory surface.

use blockdoc_syntax::{Element, Node, is_void, serialize};

use super::{NewNode, NodeId, NodeKind, Position, Surface, SurfaceRange};
use crate::markup::{MarkupOptions, to_markup_with};
use crate::model::Block;
use crate::registry::BlockRegistry;
use crate::selection::{position_at_text_offset, text_offset_of};

#[derive(Debug, Clone)]
enum NodeData {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct DomNode {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Detached nodes stay in the arena, so a stale [`NodeId`] never aliases a
/// live node.
#[derive(Debug, Clone)]
pub struct DomSurface {
    nodes: Vec<DomNode>,
    selection: Option<SurfaceRange>,
}

const ROOT: NodeId = NodeId(0);

impl Default for DomSurface {
    fn default() -> Self {
        Self {
            nodes: vec![DomNode {
                data: NodeData::Element {
                    tag: "body".to_string(),
                    attrs: Vec::new(),
                },
                parent: None,
                children: Vec::new(),
            }],
            selection: None,
        }
    }
}

impl DomSurface {
    pub fn from_markup(markup: &str) -> Self {
        let mut surface = Self::default();
        for node in blockdoc_syntax::parse(markup) {
            surface.build(&node, ROOT);
        }
        surface
    }

    /// Render `blocks` with every block present and carrying its id.
    pub fn render(blocks: &[Block], registry: &BlockRegistry) -> Self {
        Self::from_markup(&to_markup_with(blocks, registry, MarkupOptions::surface()))
    }

    /// Markup of the whole surface.
    pub fn markup(&self) -> String {
        self.inner_markup(ROOT)
    }

    /// Replace the text of a text node. Carets inside it are clamped.
    pub fn set_text(&mut self, node: NodeId, text: &str) -> bool {
        let Some(DomNode {
            data: NodeData::Text(current),
            ..
        }) = self.nodes.get_mut(node.0)
        else {
            return false;
        };
        *current = text.to_string();
        let len = text.chars().count();
        self.map_selection(|p| {
            if p.node == node && p.offset > len {
                Position::new(node, len)
            } else {
                p
            }
        });
        true
    }

    fn build(&mut self, node: &Node, parent: NodeId) {
        match node {
            Node::Text(text) => {
                self.alloc(NodeData::Text(text.clone()), parent);
            }
            Node::Element(e) => {
                let id = self.alloc(
                    NodeData::Element {
                        tag: e.tag.clone(),
                        attrs: e.attrs.clone(),
                    },
                    parent,
                );
                for child in &e.children {
                    self.build(child, id);
                }
            }
        }
    }

    fn alloc(&mut self, data: NodeData, parent: NodeId) -> NodeId {
        let id = self.detached(data);
        self.nodes[id.0].parent = Some(parent);
        self.nodes[parent.0].children.push(id);
        id
    }

    fn detached(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(DomNode {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn node(&self, id: NodeId) -> Option<&DomNode> {
        self.nodes.get(id.0)
    }

    fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == ROOT {
                return true;
            }
            match self.node(current).and_then(|n| n.parent) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    fn map_selection(&mut self, f: impl Fn(Position) -> Position) {
        if let Some(range) = self.selection {
            self.selection = Some(SurfaceRange::new(f(range.start), f(range.end)));
        }
    }

    /// Place `child` at `index` among `parent`'s children.
    fn attach(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(index, child);
        self.map_selection(|p| {
            if p.node == parent && p.offset > index {
                Position::new(parent, p.offset + 1)
            } else {
                p
            }
        });
    }

    /// Split text node `node` at char `offset`, returning the new tail node.
    fn split_text(&mut self, node: NodeId, offset: usize) -> Option<NodeId> {
        let parent = self.node(node)?.parent?;
        let index = self.index_in_parent(node)?;
        let NodeData::Text(text) = &mut self.nodes[node.0].data else {
            return None;
        };
        let byte = text.char_indices().nth(offset).map(|(b, _)| b)?;
        let tail = text.split_off(byte);

        let tail_id = self.detached(NodeData::Text(tail));
        self.map_selection(|p| {
            if p.node == node && p.offset > offset {
                Position::new(tail_id, p.offset - offset)
            } else {
                p
            }
        });
        self.attach(parent, index + 1, tail_id);
        Some(tail_id)
    }

    fn to_syntax(&self, id: NodeId) -> Option<Node> {
        let node = self.node(id)?;
        Some(match &node.data {
            NodeData::Text(text) => Node::Text(text.clone()),
            NodeData::Element { tag, attrs } => {
                let mut element = Element::new(tag.clone());
                element.attrs = attrs.clone();
                element.children = node
                    .children
                    .iter()
                    .filter_map(|&c| self.to_syntax(c))
                    .collect();
                Node::Element(element)
            }
        })
    }

    fn normalize_children(&mut self, node: NodeId) {
        let children = self.nodes[node.0].children.clone();
        let mut kept: Vec<NodeId> = Vec::with_capacity(children.len());

        for child in children {
            let text = match &self.nodes[child.0].data {
                NodeData::Text(text) => Some(text.clone()),
                NodeData::Element { .. } => None,
            };
            match text {
                Some(text) if text.is_empty() => {
                    self.nodes[child.0].parent = None;
                }
                Some(text) => {
                    let previous = kept.last().copied();
                    if let Some(prev) = previous
                        && let NodeData::Text(prev_text) = &mut self.nodes[prev.0].data
                    {
                        prev_text.push_str(&text);
                        self.nodes[child.0].parent = None;
                    } else {
                        kept.push(child);
                    }
                }
                None => {
                    self.normalize_children(child);
                    kept.push(child);
                }
            }
        }
        self.nodes[node.0].children = kept;
    }
}

impl Surface for DomSurface {
    fn root(&self) -> NodeId {
        ROOT
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node)?.parent
    }

    fn child_count(&self, node: NodeId) -> usize {
        self.node(node).map_or(0, |n| n.children.len())
    }

    fn child(&self, node: NodeId, index: usize) -> Option<NodeId> {
        self.node(node)?.children.get(index).copied()
    }

    fn kind(&self, node: NodeId) -> Option<NodeKind<'_>> {
        Some(match &self.node(node)?.data {
            NodeData::Text(text) => NodeKind::Text(text),
            NodeData::Element { tag, .. } => NodeKind::Element(tag),
        })
    }

    fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        match &self.node(node)?.data {
            NodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            NodeData::Text(_) => None,
        }
    }

    fn selection(&self) -> Option<SurfaceRange> {
        self.selection
    }

    fn set_selection(&mut self, range: Option<SurfaceRange>) {
        self.selection = range;
    }

    fn insert_at(&mut self, at: Position, node: NewNode) -> Option<NodeId> {
        if !self.is_attached(at.node) {
            return None;
        }
        let data = match node {
            NewNode::Text(text) => NodeData::Text(text),
            NewNode::Element { tag, attrs } => NodeData::Element { tag, attrs },
        };

        let text_len = match &self.node(at.node)?.data {
            NodeData::Text(text) => Some(text.chars().count()),
            NodeData::Element { tag, .. } if is_void(tag) => return None,
            NodeData::Element { .. } => None,
        };

        let (parent, index) = match text_len {
            Some(len) => {
                let parent = self.parent(at.node)?;
                let index = self.index_in_parent(at.node)?;
                match at.offset {
                    0 => (parent, index),
                    o if o == len => (parent, index + 1),
                    o if o < len => {
                        self.split_text(at.node, o)?;
                        (parent, index + 1)
                    }
                    _ => return None,
                }
            }
            None if at.offset > self.child_count(at.node) => return None,
            None => (at.node, at.offset),
        };

        let id = self.detached(data);
        self.attach(parent, index, id);
        Some(id)
    }

    fn remove_node(&mut self, node: NodeId) -> bool {
        if node == ROOT || !self.is_attached(node) {
            return false;
        }
        let (Some(parent), Some(index)) = (self.parent(node), self.index_in_parent(node)) else {
            return false;
        };
        self.nodes[parent.0].children.remove(index);

        if let Some(range) = self.selection {
            let fix = |p: Position| {
                if self.contains(node, p.node) {
                    Position::new(parent, index)
                } else if p.node == parent && p.offset > index {
                    Position::new(parent, p.offset - 1)
                } else {
                    p
                }
            };
            let (start, end) = (fix(range.start), fix(range.end));
            self.selection = Some(SurfaceRange::new(start, end));
        }

        self.nodes[node.0].parent = None;
        true
    }

    fn normalize(&mut self, node: NodeId) {
        if !self.is_attached(node) {
            return;
        }
        // Carets are carried across by their text offset within `node`
        let saved = self.selection.map(|r| {
            (
                text_offset_of(self, node, r.start),
                text_offset_of(self, node, r.end),
                r,
            )
        });

        self.normalize_children(node);

        if let Some((start, end, range)) = saved {
            let remap = |offset: Option<usize>, original: Position| {
                offset.map_or(original, |o| position_at_text_offset(self, node, o))
            };
            let (start, end) = (remap(start, range.start), remap(end, range.end));
            self.selection = Some(SurfaceRange::new(start, end));
        }
    }

    fn inner_markup(&self, node: NodeId) -> String {
        let children: Vec<Node> = self
            .node(node)
            .map(|n| n.children.iter().filter_map(|&c| self.to_syntax(c)).collect())
            .unwrap_or_default();
        serialize(&children)
    }
}
