//! # Editing
//!
//! The tree manager and everything it coordinates.
//!
//! ```text
//!   Cmd / split / edit_block
//!            │
//!            ▼
//!   Document ──locate──▶ context (ListPath + index)
//!      │
//!      ├─ mutate owning list
//!      ├─ to_markup ──▶ differs from last emitted?
//!      │                   ├─ History::save_state(previous)
//!      │                   ├─ change callback
//!      │                   └─ EventBus: DocumentChanged
//!      └─ FocusRequest (taken after the next render)
//! ```
//!
//! Style edits skip the immediate snapshot; the [`Debouncer`] arms one slot
//! per block and [`Document::advance`] commits when it comes due.
//!
//! ## Module Structure
//!
//! - **`document`**: `Document`, the owner of the block tree
//! - **`commands`**: `Cmd` enum accepted by `Document::apply`
//! - **`context`**: locating a block and its owning list
//! - **`history`**: bounded undo/redo stacks
//! - **`debounce`**: first-wins delayed style snapshots
//! - **`events`**: document events and the subscriber fan-out
//! - **`patch`**: result of applying a command

pub mod commands;
pub mod context;
pub mod debounce;
pub mod document;
pub mod events;
pub mod history;
pub mod patch;

pub use commands::Cmd;
pub use context::{BlockContext, ColumnStep, ListPath};
pub use debounce::Debouncer;
pub use document::{Document, EditorOptions, SPLIT_MARKER_ATTR};
pub use events::{ChangeCallback, DocumentEvent, EventBus, Listener};
pub use history::{History, HistoryDirection};
pub use patch::{FocusRequest, Patch};
