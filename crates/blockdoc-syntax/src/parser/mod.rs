//! # Parser - Event-Based Tree Construction
//!
//! Transforms the token stream into an element tree. Parsing produces a flat
//! list of [`Event`]s which the [`Sink`] folds into [`Node`]s:
//!
//! ```text
//! <p>Hi <b>there</b></p>
//!
//! Open(p) Text("Hi ") Open(b) Text("there") Close Close
//! ```
//!
//! ## Error Tolerance
//!
//! Markup coming off an editable surface is routinely malformed, so the
//! parser never fails. Its recovery rules:
//!
//! - void elements (`br`, `img`, ...) and `<x/>` close immediately
//! - an end tag closes everything opened after its matching start tag
//! - an end tag with no matching start tag is dropped
//! - opening `p` or `li` directly inside the same element closes the first
//! - elements still open at end of input are closed there
//! - declarations and comments are dropped
//!
//! [`Node`]: crate::node::Node

pub mod event;
pub mod sink;

use crate::attributes::parse_attributes;
use crate::lexer::{Token, TokenKind, lex};
use crate::node::{Node, is_void};
use event::Event;
use sink::Sink;

/// Elements implicitly closed when a sibling of the same tag opens.
const SELF_TERMINATING: &[&str] = &["p", "li"];

/// The parser state machine.
pub struct Parser<'t, 'input> {
    tokens: &'t [Token<'input>],
    open: Vec<String>,
    events: Vec<Event>,
}

impl<'t, 'input> Parser<'t, 'input> {
    pub fn new(tokens: &'t [Token<'input>]) -> Self {
        Self {
            tokens,
            open: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn parse(mut self) -> Vec<Node> {
        for token in self.tokens {
            match token.kind {
                TokenKind::StartTag => self.start_tag(token.text),
                TokenKind::EndTag => self.end_tag(token.text),
                TokenKind::Text => {
                    self.text(html_escape::decode_html_entities(token.text).into_owned())
                }
                TokenKind::StrayLt => self.text("<".to_string()),
                TokenKind::Declaration => {}
            }
        }
        while self.open.pop().is_some() {
            self.events.push(Event::Close);
        }
        Sink::new(self.events).finish()
    }

    fn start_tag(&mut self, raw: &str) {
        let inner = raw.trim_start_matches('<').trim_end_matches('>');
        let name_len = inner
            .find(|c: char| c.is_whitespace() || c == '/')
            .unwrap_or(inner.len());
        let tag = inner[..name_len].to_ascii_lowercase();
        let rest = &inner[name_len..];
        let self_closing = rest.trim_end().ends_with('/');

        if SELF_TERMINATING.contains(&tag.as_str()) && self.open.last() == Some(&tag) {
            self.open.pop();
            self.events.push(Event::Close);
        }

        let void = is_void(&tag);
        self.events.push(Event::Open {
            tag: tag.clone(),
            attrs: parse_attributes(rest),
        });
        if void || self_closing {
            self.events.push(Event::Close);
        } else {
            self.open.push(tag);
        }
    }

    fn end_tag(&mut self, raw: &str) {
        let tag = raw
            .trim_start_matches("</")
            .trim_end_matches('>')
            .trim()
            .to_ascii_lowercase();
        let Some(depth) = self.open.iter().rposition(|t| *t == tag) else {
            return;
        };
        for _ in depth..self.open.len() {
            self.events.push(Event::Close);
        }
        self.open.truncate(depth);
    }

    fn text(&mut self, text: String) {
        if !text.is_empty() {
            self.events.push(Event::Text(text));
        }
    }
}

/// Parse markup into a node list. Never fails.
pub fn parse_nodes(input: &str) -> Vec<Node> {
    let tokens = lex(input);
    Parser::new(&tokens).parse()
}
