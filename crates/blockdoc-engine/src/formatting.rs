//! Inline formatting active at the selection.

use serde::Serialize;

use crate::markup::TYPE_ATTR;
use crate::model::{BlockId, StyleMap};
use crate::registry::BlockType;
use crate::surface::{NodeId, Surface};

/// Formats in effect at the start of the selection, reported with the
/// selection-changed event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormatState {
    pub block_id: Option<BlockId>,
    pub block_type: Option<BlockType>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub code: bool,
    /// Target of the innermost enclosing link
    pub link: Option<String>,
}

/// Inspect the elements enclosing the selection start, up to its block.
pub fn detect<S: Surface + ?Sized>(surface: &S) -> Option<FormatState> {
    let range = surface.selection()?;
    let mut state = FormatState::default();

    let mut current = Some(range.start.node);
    while let Some(node) = current {
        if let Some((id, root)) = surface.owning_block(node).filter(|(_, root)| *root == node) {
            state.block_id = Some(id);
            state.block_type = surface.attr(root, TYPE_ATTR).and_then(|t| t.parse().ok());
            break;
        }
        apply_element(surface, node, &mut state);
        current = surface.parent(node);
    }
    Some(state)
}

fn apply_element<S: Surface + ?Sized>(surface: &S, node: NodeId, state: &mut FormatState) {
    let Some(tag) = surface.tag(node) else {
        return;
    };
    match tag {
        "b" | "strong" => state.bold = true,
        "i" | "em" => state.italic = true,
        "u" => state.underline = true,
        "s" | "strike" | "del" => state.strikethrough = true,
        "code" => state.code = true,
        "a" => {
            if state.link.is_none() {
                state.link = surface.attr(node, "href").map(str::to_string);
            }
        }
        _ => {}
    }

    if let Some(style) = surface.attr(node, "style") {
        let styles = StyleMap::parse(style);
        if matches!(styles.get("font-weight"), Some("bold" | "bolder" | "700" | "800" | "900")) {
            state.bold = true;
        }
        if styles.get("font-style") == Some("italic") {
            state.italic = true;
        }
        if let Some(decoration) = styles.get("text-decoration") {
            state.underline |= decoration.contains("underline");
            state.strikethrough |= decoration.contains("line-through");
        }
    }
}
