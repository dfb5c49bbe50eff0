//! # Rendering Surface
//!
//! The engine never owns the live editable surface; it reads and mutates it
//! through the [`Surface`] trait. Positions follow DOM semantics: inside a
//! text node the offset counts characters, inside an element it counts
//! children.
//!
//! [`DomSurface`] is an in-memory implementation used by the terminal
//! front-end and the tests.

mod dom;

pub use dom::DomSurface;

use crate::markup::ID_ATTR;
use crate::model::BlockId;

/// Handle to a node on a surface. Only meaningful for the surface that
/// issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub node: NodeId,
    pub offset: usize,
}

impl Position {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceRange {
    pub start: Position,
    pub end: Position,
}

impl SurfaceRange {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub fn caret(at: Position) -> Self {
        Self { start: at, end: at }
    }

    pub fn collapsed(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind<'a> {
    Text(&'a str),
    Element(&'a str),
}

/// A node to be inserted with [`Surface::insert_at`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewNode {
    Text(String),
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
}

impl NewNode {
    pub fn element(tag: &str, attrs: &[(&str, &str)]) -> Self {
        NewNode::Element {
            tag: tag.to_string(),
            attrs: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

/// Which end of a node the caret lands on when focusing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Start,
    End,
}

/// Query and mutation primitives of a live editable surface.
pub trait Surface {
    fn root(&self) -> NodeId;
    fn parent(&self, node: NodeId) -> Option<NodeId>;
    fn child_count(&self, node: NodeId) -> usize;
    fn child(&self, node: NodeId, index: usize) -> Option<NodeId>;
    fn kind(&self, node: NodeId) -> Option<NodeKind<'_>>;
    fn attr(&self, node: NodeId, name: &str) -> Option<&str>;

    fn selection(&self) -> Option<SurfaceRange>;
    fn set_selection(&mut self, range: Option<SurfaceRange>);

    /// Insert `node` at `at`, splitting a text node when `at` points inside
    /// one. Returns the new node, or `None` when `at` is not a valid position.
    fn insert_at(&mut self, at: Position, node: NewNode) -> Option<NodeId>;
    /// Detach `node` and its subtree. Returns false for the root or an
    /// already detached node.
    fn remove_node(&mut self, node: NodeId) -> bool;
    /// Merge adjacent text nodes and drop empty ones below `node`.
    fn normalize(&mut self, node: NodeId);
    /// Markup of the children of `node`.
    fn inner_markup(&self, node: NodeId) -> String;

    fn text(&self, node: NodeId) -> Option<&str> {
        match self.kind(node)? {
            NodeKind::Text(text) => Some(text),
            NodeKind::Element(_) => None,
        }
    }

    fn tag(&self, node: NodeId) -> Option<&str> {
        match self.kind(node)? {
            NodeKind::Element(tag) => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    fn index_in_parent(&self, node: NodeId) -> Option<usize> {
        let parent = self.parent(node)?;
        (0..self.child_count(parent)).find(|&i| self.child(parent, i) == Some(node))
    }

    /// True when `node` is `ancestor` or lies below it.
    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    /// Text nodes below `node` in document order.
    fn text_nodes(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        collect_text_nodes(self, node, &mut out);
        out
    }

    /// Element rendering block `id`.
    fn block_root(&self, id: &BlockId) -> Option<NodeId> {
        find_element(self, self.root(), &|s: &Self, n: NodeId| {
            s.attr(n, ID_ATTR) == Some(id.as_str())
        })
    }

    /// Nearest element at or above `node` rendering a block.
    fn owning_block(&self, node: NodeId) -> Option<(BlockId, NodeId)> {
        let mut current = Some(node);
        while let Some(n) = current {
            if let Some(id) = self.attr(n, ID_ATTR) {
                return Some((BlockId::new(id), n));
            }
            current = self.parent(n);
        }
        None
    }

    /// Collapse the selection at one end of `node`'s text.
    fn focus(&mut self, node: NodeId, edge: Edge) {
        let texts = self.text_nodes(node);
        let at = match (edge, texts.first(), texts.last()) {
            (Edge::Start, Some(&first), _) => Position::new(first, 0),
            (Edge::End, _, Some(&last)) => {
                let len = self.text(last).map_or(0, |t| t.chars().count());
                Position::new(last, len)
            }
            (Edge::Start, None, _) => Position::new(node, 0),
            (Edge::End, _, None) => Position::new(node, self.child_count(node)),
        };
        self.set_selection(Some(SurfaceRange::caret(at)));
    }
}

fn collect_text_nodes<S: Surface + ?Sized>(surface: &S, node: NodeId, out: &mut Vec<NodeId>) {
    match surface.kind(node) {
        Some(NodeKind::Text(_)) => out.push(node),
        Some(NodeKind::Element(_)) => {
            for i in 0..surface.child_count(node) {
                if let Some(child) = surface.child(node, i) {
                    collect_text_nodes(surface, child, out);
                }
            }
        }
        None => {}
    }
}

fn find_element<S: Surface + ?Sized>(
    surface: &S,
    node: NodeId,
    pred: &dyn Fn(&S, NodeId) -> bool,
) -> Option<NodeId> {
    if surface.tag(node).is_some() && pred(surface, node) {
        return Some(node);
    }
    (0..surface.child_count(node))
        .filter_map(|i| surface.child(node, i))
        .find_map(|child| find_element(surface, child, pred))
}
