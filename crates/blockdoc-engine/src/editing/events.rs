//! Document-level notifications.

use super::HistoryDirection;
use crate::formatting::FormatState;
use crate::model::Block;

#[derive(Debug, Clone, Copy)]
pub enum DocumentEvent<'a> {
    /// The block list changed and new markup was emitted
    DocumentChanged(&'a [Block]),
    /// A block's styles, classes or attributes changed
    StyleChanged(&'a Block),
    /// Undo or redo replaced the tree with `markup`
    HistoryChanged {
        markup: &'a str,
        direction: HistoryDirection,
    },
    SelectionChanged(&'a FormatState),
}

impl DocumentEvent<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            DocumentEvent::DocumentChanged(_) => "document-changed",
            DocumentEvent::StyleChanged(_) => "style-changed",
            DocumentEvent::HistoryChanged { .. } => "history-changed",
            DocumentEvent::SelectionChanged(_) => "selection-changed",
        }
    }
}

pub type Listener = Box<dyn FnMut(&DocumentEvent<'_>) -> anyhow::Result<()>>;

/// Receives each newly emitted markup string.
pub type ChangeCallback = Box<dyn FnMut(&str) -> anyhow::Result<()>>;

/// Fan-out to subscribers. A failing subscriber is logged and skipped; the
/// rest still run.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Listener>,
}

impl EventBus {
    pub fn subscribe(&mut self, listener: Listener) {
        self.listeners.push(listener);
    }

    pub fn emit(&mut self, event: &DocumentEvent<'_>) {
        for listener in &mut self.listeners {
            if let Err(e) = listener(event) {
                log::warn!("Listener failed on {}: {e:#}", event.name());
            }
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
