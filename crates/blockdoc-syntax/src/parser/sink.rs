//! Sink - Converting Events to Nodes

use super::event::Event;
use crate::node::{Element, Node};

/// Builds an owned node tree from a balanced event stream.
pub struct Sink {
    events: Vec<Event>,
}

impl Sink {
    pub fn new(events: Vec<Event>) -> Self {
        Self { events }
    }

    pub fn finish(self) -> Vec<Node> {
        let mut roots: Vec<Node> = Vec::new();
        let mut stack: Vec<Element> = Vec::new();

        for event in self.events {
            match event {
                Event::Open { tag, attrs } => {
                    let mut element = Element::new(tag);
                    element.attrs = attrs;
                    stack.push(element);
                }
                Event::Text(text) => {
                    let siblings = match stack.last_mut() {
                        Some(parent) => &mut parent.children,
                        None => &mut roots,
                    };
                    push_text(siblings, text);
                }
                Event::Close => {
                    let Some(element) = stack.pop() else {
                        continue;
                    };
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(Node::Element(element)),
                        None => roots.push(Node::Element(element)),
                    }
                }
            }
        }

        // The parser balances its events, but stay total on a truncated stream.
        while let Some(element) = stack.pop() {
            match stack.last_mut() {
                Some(parent) => parent.children.push(Node::Element(element)),
                None => roots.push(Node::Element(element)),
            }
        }

        roots
    }
}

/// Adjacent text merges into one node, so `a < b` stays a single text run.
fn push_text(siblings: &mut Vec<Node>, text: String) {
    if let Some(Node::Text(prev)) = siblings.last_mut() {
        prev.push_str(&text);
    } else {
        siblings.push(Node::Text(text));
    }
}
