use crate::model::BlockId;
use crate::selection::CaretPlace;

/// Caret placement to carry out once the surface shows the new tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusRequest {
    pub block: BlockId,
    pub place: CaretPlace,
}

/// Result of applying a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    /// Blocks created, removed or modified
    pub changed: Vec<BlockId>,
    pub focus: Option<FocusRequest>,
    pub version: u64,
}
