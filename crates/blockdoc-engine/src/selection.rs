//! # Selection Addressing
//!
//! Captures the selection on a [`Surface`] as a [`SelectionDescriptor`] and
//! puts it back after the surface has been mutated or re-rendered.
//!
//! A descriptor records each boundary twice:
//!
//! - as a **structural path**: child indices from the owning block's root
//!   element down to the boundary node, plus the node-local offset
//! - as a **text offset**: characters of rendered text between the start of
//!   the block and the boundary
//!
//! Restoring tries the strategies of [`RestoreStrategy::CHAIN`] in order.
//! The path is exact while the block's node structure is unchanged; the
//! text offset survives restructuring that keeps the text.

use crate::editing::FocusRequest;
use crate::model::{BlockId, is_blank_text, is_embedded_tag};
use crate::surface::{Edge, NodeId, NodeKind, Position, Surface, SurfaceRange};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("No active selection")]
    NoSelection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boundary {
    pub path: Vec<usize>,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionDescriptor {
    pub block_id: BlockId,
    /// Text offset of the start boundary within the block
    pub start: usize,
    /// Text offset of the end boundary within the block
    pub end: usize,
    pub collapsed: bool,
    pub start_boundary: Boundary,
    pub end_boundary: Boundary,
}

/// Which end a restored range collapses onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collapse {
    ToStart,
    ToEnd,
}

/// Where to put the caret inside a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaretPlace {
    Start,
    End,
    /// Characters of rendered text from the start of the block
    Offset(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreStrategy {
    StructuralPath,
    TextOffset,
}

impl RestoreStrategy {
    pub const CHAIN: [RestoreStrategy; 2] =
        [RestoreStrategy::StructuralPath, RestoreStrategy::TextOffset];

    /// Resolve `descriptor` against the block rendered at `root`.
    pub fn resolve<S: Surface + ?Sized>(
        self,
        surface: &S,
        root: NodeId,
        descriptor: &SelectionDescriptor,
    ) -> Option<SurfaceRange> {
        match self {
            RestoreStrategy::StructuralPath => {
                let start = resolve_path(surface, root, &descriptor.start_boundary)?;
                let end = if descriptor.collapsed {
                    start
                } else {
                    resolve_path(surface, root, &descriptor.end_boundary)?
                };
                Some(SurfaceRange::new(start, end))
            }
            RestoreStrategy::TextOffset => {
                let start = position_at_text_offset(surface, root, descriptor.start);
                let end = if descriptor.collapsed {
                    start
                } else {
                    position_at_text_offset(surface, root, descriptor.end)
                };
                Some(SurfaceRange::new(start, end))
            }
        }
    }
}

/// Describe the current selection, or `None` when there is none or it is
/// not inside a block.
pub fn save<S: Surface + ?Sized>(surface: &S) -> Option<SelectionDescriptor> {
    let range = surface.selection()?;
    let (block_id, root) = surface.owning_block(range.start.node)?;

    let end = if surface.contains(root, range.end.node) {
        range.end
    } else {
        Position::new(root, surface.child_count(root))
    };

    Some(SelectionDescriptor {
        block_id,
        start: text_offset_of(surface, root, range.start)?,
        end: text_offset_of(surface, root, end)?,
        collapsed: range.start == end,
        start_boundary: boundary_of(surface, root, range.start)?,
        end_boundary: boundary_of(surface, root, end)?,
    })
}

/// Put a saved selection back. Returns false when the block is gone or no
/// strategy resolves.
pub fn restore<S: Surface + ?Sized>(
    surface: &mut S,
    descriptor: &SelectionDescriptor,
    collapse: Option<Collapse>,
) -> bool {
    let Some(root) = surface.block_root(&descriptor.block_id) else {
        log::debug!("Cannot restore selection: block {} not rendered", descriptor.block_id);
        return false;
    };

    let resolved = RestoreStrategy::CHAIN
        .into_iter()
        .find_map(|strategy| strategy.resolve(&*surface, root, descriptor));
    let Some(mut range) = resolved else {
        return false;
    };

    match collapse {
        Some(Collapse::ToStart) => range.end = range.start,
        Some(Collapse::ToEnd) => range.start = range.end,
        None => {}
    }
    surface.set_selection(Some(range));
    true
}

/// The active selection, for operations that cannot proceed without one.
pub fn require<S: Surface + ?Sized>(surface: &S) -> Result<SurfaceRange, SelectionError> {
    surface.selection().ok_or(SelectionError::NoSelection)
}

/// Rendered text covered by the active selection.
pub fn selected_text<S: Surface + ?Sized>(surface: &S) -> Result<String, SelectionError> {
    let range = require(surface)?;
    let root = surface.root();
    let (Some(start), Some(end)) = (
        text_offset_of(surface, root, range.start),
        text_offset_of(surface, root, range.end),
    ) else {
        return Ok(String::new());
    };
    let text: String = surface
        .text_nodes(root)
        .into_iter()
        .filter_map(|n| surface.text(n))
        .collect();
    Ok(text
        .chars()
        .skip(start.min(end))
        .take(start.abs_diff(end))
        .collect())
}

/// Whether the selection start sits before every visible piece of
/// `container`. Line breaks and whitespace-only text do not count.
pub fn is_cursor_at_start<S: Surface + ?Sized>(surface: &S, container: NodeId) -> bool {
    surface
        .selection()
        .filter(|r| surface.contains(container, r.start.node))
        .is_some_and(|r| !scan(surface, container, r.start).before)
}

/// Whether the selection end sits after every visible piece of `container`.
pub fn is_cursor_at_end<S: Surface + ?Sized>(surface: &S, container: NodeId) -> bool {
    surface
        .selection()
        .filter(|r| surface.contains(container, r.end.node))
        .is_some_and(|r| !scan(surface, container, r.end).after)
}

pub fn place_caret<S: Surface + ?Sized>(surface: &mut S, block: &BlockId, place: CaretPlace) -> bool {
    let Some(root) = surface.block_root(block) else {
        log::debug!("Cannot place caret: block {block} not rendered");
        return false;
    };
    match place {
        CaretPlace::Start => surface.focus(root, Edge::Start),
        CaretPlace::End => surface.focus(root, Edge::End),
        CaretPlace::Offset(offset) => {
            let at = position_at_text_offset(&*surface, root, offset);
            surface.set_selection(Some(SurfaceRange::caret(at)));
        }
    }
    true
}

/// Carry out a focus request deferred to the next rendering pass.
pub fn apply_focus<S: Surface + ?Sized>(surface: &mut S, request: &FocusRequest) -> bool {
    place_caret(surface, &request.block, request.place)
}

/// Characters of text inside `scope` that precede `pos`.
pub fn text_offset_of<S: Surface + ?Sized>(
    surface: &S,
    scope: NodeId,
    pos: Position,
) -> Option<usize> {
    if !surface.contains(scope, pos.node) {
        return None;
    }
    let mut acc = 0;
    count_until(surface, scope, pos, &mut acc).then_some(acc)
}

fn count_until<S: Surface + ?Sized>(
    surface: &S,
    node: NodeId,
    pos: Position,
    acc: &mut usize,
) -> bool {
    match surface.kind(node) {
        Some(NodeKind::Text(text)) => {
            let len = text.chars().count();
            if node == pos.node {
                *acc += pos.offset.min(len);
                return true;
            }
            *acc += len;
            false
        }
        Some(NodeKind::Element(_)) => {
            for i in 0..surface.child_count(node) {
                if node == pos.node && pos.offset == i {
                    return true;
                }
                if let Some(child) = surface.child(node, i)
                    && count_until(surface, child, pos, acc)
                {
                    return true;
                }
            }
            node == pos.node
        }
        None => false,
    }
}

/// Position `offset` characters into the text of `scope`. A boundary between
/// two text nodes resolves to the end of the first; offsets past the end
/// clamp to the end.
pub fn position_at_text_offset<S: Surface + ?Sized>(
    surface: &S,
    scope: NodeId,
    offset: usize,
) -> Position {
    let texts = surface.text_nodes(scope);
    let len_of = |n: NodeId| surface.text(n).map_or(0, |t| t.chars().count());

    let mut remaining = offset;
    for &node in &texts {
        let len = len_of(node);
        if remaining <= len {
            return Position::new(node, remaining);
        }
        remaining -= len;
    }
    match texts.last() {
        Some(&last) => Position::new(last, len_of(last)),
        None if offset == 0 => Position::new(scope, 0),
        None => Position::new(scope, surface.child_count(scope)),
    }
}

fn boundary_of<S: Surface + ?Sized>(surface: &S, root: NodeId, pos: Position) -> Option<Boundary> {
    let mut path = Vec::new();
    let mut current = pos.node;
    while current != root {
        path.push(surface.index_in_parent(current)?);
        current = surface.parent(current)?;
    }
    path.reverse();
    Some(Boundary {
        path,
        offset: pos.offset,
    })
}

fn resolve_path<S: Surface + ?Sized>(
    surface: &S,
    root: NodeId,
    boundary: &Boundary,
) -> Option<Position> {
    let mut node = root;
    for &index in &boundary.path {
        node = surface.child(node, index)?;
    }
    let limit = match surface.kind(node)? {
        NodeKind::Text(text) => text.chars().count(),
        NodeKind::Element(_) => surface.child_count(node),
    };
    (boundary.offset <= limit).then_some(Position::new(node, boundary.offset))
}

/// Visible content found on either side of a caret.
#[derive(Debug, Default)]
struct Scan {
    passed: bool,
    before: bool,
    after: bool,
}

impl Scan {
    fn mark(&mut self) {
        if self.passed {
            self.after = true;
        } else {
            self.before = true;
        }
    }
}

fn scan<S: Surface + ?Sized>(surface: &S, container: NodeId, caret: Position) -> Scan {
    let mut state = Scan::default();
    scan_node(surface, container, caret, &mut state);
    state
}

fn scan_node<S: Surface + ?Sized>(surface: &S, node: NodeId, caret: Position, state: &mut Scan) {
    match surface.kind(node) {
        Some(NodeKind::Text(text)) => {
            if node == caret.node {
                let split = text
                    .char_indices()
                    .nth(caret.offset)
                    .map_or(text.len(), |(b, _)| b);
                let (head, tail) = text.split_at(split);
                state.before |= !is_blank_text(head);
                state.after |= !is_blank_text(tail);
                state.passed = true;
            } else if !is_blank_text(text) {
                state.mark();
            }
        }
        Some(NodeKind::Element(tag)) => {
            let count = surface.child_count(node);
            if count == 0 && is_embedded_tag(tag) {
                state.mark();
            }
            for i in 0..count {
                if node == caret.node && caret.offset == i {
                    state.passed = true;
                }
                if let Some(child) = surface.child(node, i) {
                    scan_node(surface, child, caret, state);
                }
            }
            if node == caret.node && caret.offset >= count {
                state.passed = true;
            }
        }
        None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Block, BlockInit};
    use crate::registry::{BlockRegistry, BlockType};
    use crate::surface::DomSurface;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn surface_of(blocks: &[(&str, &str)]) -> DomSurface {
        let reg = BlockRegistry::default();
        let blocks: Vec<Block> = blocks
            .iter()
            .map(|(id, content)| {
                Block::new(BlockInit::new(BlockType::Paragraph, *content).id(*id), &reg)
            })
            .collect();
        DomSurface::render(&blocks, &reg)
    }

    fn root(surface: &DomSurface, id: &str) -> NodeId {
        surface.block_root(&BlockId::new(id)).unwrap()
    }

    fn caret_at(surface: &mut DomSurface, id: &str, offset: usize) {
        let r = root(surface, id);
        let at = position_at_text_offset(surface, r, offset);
        surface.set_selection(Some(SurfaceRange::caret(at)));
    }

    #[test]
    fn save_describes_caret_inside_block() {
        let mut surface = surface_of(&[("a", "ab<b>cd</b>ef")]);
        caret_at(&mut surface, "a", 3);

        let saved = save(&surface).unwrap();
        assert_eq!(saved.block_id.as_str(), "a");
        assert_eq!((saved.start, saved.end), (3, 3));
        assert!(saved.collapsed);
        assert_eq!(
            saved.start_boundary,
            Boundary {
                path: vec![1, 0],
                offset: 1
            }
        );
    }

    #[test]
    fn restore_survives_unrelated_sibling_edit() {
        let mut surface = surface_of(&[("a", "first block"), ("b", "second block")]);
        caret_at(&mut surface, "b", 5);
        let saved = save(&surface).unwrap();
        let text_b = surface.selection().unwrap().start.node;

        let text_a = surface.text_nodes(root(&surface, "a"))[0];
        surface.set_text(text_a, "first block, now much longer");
        surface.set_selection(None);

        assert!(restore(&mut surface, &saved, None));
        let range = surface.selection().unwrap();
        assert!(range.collapsed());
        assert_eq!(range.start, Position::new(text_b, 5));
    }

    #[test]
    fn path_failure_falls_back_to_text_offset() {
        let mut before = surface_of(&[("a", "ab<b>cd</b>ef")]);
        caret_at(&mut before, "a", 5);
        let saved = save(&before).unwrap();
        assert_eq!(saved.start_boundary.path, vec![2]);

        let mut after = surface_of(&[("a", "abcdef")]);
        let r = root(&after, "a");
        assert!(
            RestoreStrategy::StructuralPath
                .resolve(&after, r, &saved)
                .is_none()
        );

        assert!(restore(&mut after, &saved, None));
        let caret = after.selection().unwrap().start;
        assert_eq!(after.text(caret.node), Some("abcdef"));
        assert_eq!(caret.offset, 5);
    }

    #[test]
    fn restores_ranges_and_honours_collapse_hint() {
        let mut surface = surface_of(&[("a", "hello world")]);
        let text = surface.text_nodes(root(&surface, "a"))[0];
        surface.set_selection(Some(SurfaceRange::new(
            Position::new(text, 2),
            Position::new(text, 7),
        )));
        let saved = save(&surface).unwrap();
        assert!(!saved.collapsed);
        assert_eq!(selected_text(&surface).unwrap(), "llo w");

        let mut fresh = surface_of(&[("a", "hello world")]);
        assert!(restore(&mut fresh, &saved, None));
        assert_eq!(selected_text(&fresh).unwrap(), "llo w");

        assert!(restore(&mut fresh, &saved, Some(Collapse::ToEnd)));
        let range = fresh.selection().unwrap();
        assert!(range.collapsed());
        assert_eq!(range.start.offset, 7);
    }

    #[test]
    fn restore_into_missing_block_fails() {
        let mut surface = surface_of(&[("a", "text")]);
        caret_at(&mut surface, "a", 1);
        let saved = save(&surface).unwrap();

        let mut other = surface_of(&[("z", "text")]);
        assert!(!restore(&mut other, &saved, None));
        assert_eq!(other.selection(), None);
    }

    #[test]
    fn require_guards_missing_selection() {
        let surface = surface_of(&[("a", "text")]);
        assert_eq!(require(&surface), Err(SelectionError::NoSelection));
        assert_eq!(selected_text(&surface), Err(SelectionError::NoSelection));
        assert!(save(&surface).is_none());
    }

    #[rstest]
    #[case("hello", 0, true, false)]
    #[case("hello", 5, false, true)]
    #[case("hello", 2, false, false)]
    #[case("<br>hello", 0, true, false)]
    #[case("hello<br>", 5, false, true)]
    #[case("  hello  ", 2, true, false)]
    #[case(r#"<img src="a.png">hello"#, 0, false, false)]
    fn cursor_boundaries(
        #[case] content: &str,
        #[case] offset: usize,
        #[case] at_start: bool,
        #[case] at_end: bool,
    ) {
        let mut surface = surface_of(&[("a", content)]);
        caret_at(&mut surface, "a", offset);
        let r = root(&surface, "a");
        assert_eq!(is_cursor_at_start(&surface, r), at_start, "start of {content:?}");
        assert_eq!(is_cursor_at_end(&surface, r), at_end, "end of {content:?}");
    }

    #[test]
    fn caret_outside_container_is_at_neither_edge() {
        let mut surface = surface_of(&[("a", "one"), ("b", "two")]);
        caret_at(&mut surface, "b", 0);
        let a = root(&surface, "a");
        assert!(!is_cursor_at_start(&surface, a));
        assert!(!is_cursor_at_end(&surface, a));
    }

    #[test]
    fn place_caret_by_offset_and_edge() {
        let mut surface = surface_of(&[("a", "ab<i>cd</i>")]);
        let id = BlockId::new("a");

        assert!(place_caret(&mut surface, &id, CaretPlace::Offset(3)));
        let caret = surface.selection().unwrap().start;
        assert_eq!((surface.text(caret.node), caret.offset), (Some("cd"), 1));

        assert!(place_caret(&mut surface, &id, CaretPlace::Start));
        let caret = surface.selection().unwrap().start;
        assert_eq!((surface.text(caret.node), caret.offset), (Some("ab"), 0));

        assert!(!place_caret(&mut surface, &BlockId::new("nope"), CaretPlace::End));
    }
}
