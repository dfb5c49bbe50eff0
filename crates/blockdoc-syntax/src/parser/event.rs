//! Parser events.
//!
//! The parser emits a flat event stream describing the tree; the [`Sink`]
//! turns it into nodes. Every `Open` is matched by exactly one `Close`, the
//! parser guarantees this even for malformed input.
//!
//! [`Sink`]: super::sink::Sink

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Start an element. Void and self-closed elements are followed
    /// immediately by their `Close`.
    Open {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    /// Decoded character data
    Text(String),
    /// Finish the most recently opened element
    Close,
}
