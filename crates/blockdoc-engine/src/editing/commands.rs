use crate::model::BlockId;
use crate::registry::BlockType;

/// Structural edits accepted by [`Document::apply`](super::Document::apply).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cmd {
    InsertAfter {
        anchor: BlockId,
        kind: BlockType,
        content: String,
    },
    InsertBefore {
        anchor: BlockId,
        kind: BlockType,
        content: String,
    },
    Remove {
        id: BlockId,
    },
    /// Move to index `to` of the list owning `anchor`, or of the top-level
    /// list without one. `to` is clamped to the list length.
    Move {
        id: BlockId,
        to: usize,
        anchor: Option<BlockId>,
    },
    /// Append the block to its previous sibling.
    Merge {
        id: BlockId,
    },
    ToggleType {
        id: BlockId,
        to: BlockType,
    },
    SetContent {
        id: BlockId,
        content: String,
    },
    Select {
        id: BlockId,
        additive: bool,
    },
}

impl Cmd {
    /// The block the command is addressed to.
    pub fn target(&self) -> &BlockId {
        match self {
            Cmd::InsertAfter { anchor, .. } | Cmd::InsertBefore { anchor, .. } => anchor,
            Cmd::Remove { id }
            | Cmd::Move { id, .. }
            | Cmd::Merge { id }
            | Cmd::ToggleType { id, .. }
            | Cmd::SetContent { id, .. }
            | Cmd::Select { id, .. } => id,
        }
    }
}
