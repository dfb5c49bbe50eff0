//! # blockdoc-engine
//!
//! A block-structured rich-text editing engine. A document is an ordered
//! tree of typed [`Block`]s (paragraphs, headings, lists, media, and
//! multi-column containers holding nested block lists), kept in step with an
//! editable rendering [`Surface`] and persisted as HTML-like markup.
//!
//! ## Module Structure
//!
//! - **`model`**: `Block`, `BlockId`, property bags and the change journal
//! - **`registry`**: block types, their tags, defaults and compatibility
//! - **`markup`**: block tree to markup and back
//! - **`surface`**: rendering-surface trait and the in-memory `DomSurface`
//! - **`selection`**: saving and restoring selections across edits
//! - **`formatting`**: inline formats active at the selection
//! - **`editing`**: the `Document` tree manager, history and events
//! - **`io`**: reading and writing documents on disk

pub mod editing;
pub mod formatting;
pub mod io;
pub mod markup;
pub mod model;
pub mod registry;
pub mod selection;
pub mod surface;


// Re-export key types for easier usage
pub use editing::{
    ChangeCallback, Cmd, Document, DocumentEvent, EditorOptions, FocusRequest, History,
    HistoryDirection, Listener, Patch,
};
pub use formatting::FormatState;
pub use io::*;
pub use markup::{MarkupOptions, parse_markup, to_markup, to_markup_with};
pub use model::{AttributeMap, Block, BlockChange, BlockId, BlockInit, ClassList, Column, StyleMap};
pub use registry::{BlockRegistry, BlockType, BlockTypeSpec, RegistryError, TypeDefaults};
pub use selection::{CaretPlace, Collapse, SelectionDescriptor, SelectionError};
pub use surface::{DomSurface, NodeId, Position, Surface, SurfaceRange};
