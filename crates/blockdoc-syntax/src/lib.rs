//! # blockdoc-syntax
//!
//! A forgiving parser for the HTML-like markup that blockdoc documents are
//! stored in, built on [Logos].
//!
//! [Logos]: https://docs.rs/logos
//!
//! ## Architecture Overview
//!
//! ```text
//! Source Text → Lexer → Tokens → Parser → Events → Sink → Vec<Node>
//!               (Logos)          (tag balancing)   (owned tree)
//! ```
//!
//! The lexer is lossless; the parser is tolerant of malformed input and
//! always produces a well-nested tree. Serializing a parsed tree gives
//! canonical markup: text escaped, attribute values double-quoted, void
//! elements without end tags, missing end tags filled in.
//!
//! ## Module Structure
//!
//! ```text
//! blockdoc-syntax/
//! ├── lib.rs         # This file - public API and integration tests
//! ├── lexer.rs       # Logos-based tokenizer
//! ├── attributes.rs  # Start-tag attribute parsing/serialization
//! ├── node.rs        # Node / Element tree and serialization
//! └── parser/
//!     ├── mod.rs     # Parser struct and recovery rules
//!     ├── event.rs   # Event enum (Open, Text, Close)
//!     └── sink.rs    # Folds events into nodes
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use blockdoc_syntax::{parse, serialize};
//!
//! let nodes = parse("<p>Hello <b>world</p>");
//! assert_eq!(serialize(&nodes), "<p>Hello <b>world</b></p>");
//! ```

pub mod attributes;
pub mod lexer;
pub mod node;
pub mod parser;

pub use attributes::{parse_attributes, serialize_attributes};
pub use node::{Element, Node, is_void, serialize, split_at_marker, text_content};

/// Parse markup into a list of top-level nodes.
pub fn parse(input: &str) -> Vec<Node> {
    parser::parse_nodes(input)
}

/// Parse then re-serialize, producing canonical markup.
pub fn normalize(input: &str) -> String {
    serialize(&parse(input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn format_tree(nodes: &[Node], depth: usize) -> String {
        let mut out = String::new();
        for node in nodes {
            let indent = "  ".repeat(depth);
            match node {
                Node::Text(t) => out.push_str(&format!("{indent}TEXT {t:?}\n")),
                Node::Element(e) => {
                    out.push_str(&format!("{indent}{}", e.tag));
                    for (k, v) in &e.attrs {
                        out.push_str(&format!(" {k}={v:?}"));
                    }
                    out.push('\n');
                    out.push_str(&format_tree(&e.children, depth + 1));
                }
            }
        }
        out
    }

    #[test]
    fn parses_nested_elements() {
        let nodes = parse(r#"<p class="lead">Hi <b>there</b></p>"#);
        assert_eq!(nodes.len(), 1);
        let p = nodes[0].as_element().unwrap();
        assert_eq!(p.tag, "p");
        assert_eq!(p.attr("class"), Some("lead"));
        assert_eq!(p.children.len(), 2);
        assert_eq!(p.text_content(), "Hi there");
    }

    #[test]
    fn snapshot_columns_tree() {
        let nodes = parse(
            r#"<div data-block-type="columns"><div class="columns"><div class="column"><p>a</p></div><div class="column"><p>b</p></div></div></div>"#,
        );
        assert_snapshot!(format_tree(&nodes, 0), @r#"
        div data-block-type="columns"
          div class="columns"
            div class="column"
              p
                TEXT "a"
            div class="column"
              p
                TEXT "b"
        "#);
    }

    #[rstest]
    #[case("<p>Hello <b>world</p>", "<p>Hello <b>world</b></p>")]
    #[case("<p>a</b>b</p>", "<p>ab</p>")]
    #[case("<br/><img src='x.png'>", r#"<br><img src="x.png">"#)]
    #[case("<ul><li>a<li>b</ul>", "<ul><li>a</li><li>b</li></ul>")]
    #[case("a < b &amp; c", "a &lt; b &amp; c")]
    #[case("<!-- gone --><p>kept</p>", "<p>kept</p>")]
    #[case("<P CLASS=x>shout</P>", r#"<p class="x">shout</p>"#)]
    #[case("<div><p>unclosed", "<div><p>unclosed</p></div>")]
    fn normalizes_messy_markup(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize(input), expected);
    }

    #[rstest]
    #[case("")]
    #[case("plain")]
    #[case("<p>Hello <b>world</b></p>")]
    #[case(r#"<figure><img src="a.png" width="20"></figure>"#)]
    #[case("<ul><li>one</li><li>two</li></ul>")]
    fn canonical_markup_is_a_fixed_point(#[case] input: &str) {
        assert_eq!(normalize(input), input);
        assert_eq!(normalize(&normalize(input)), normalize(input));
    }

    #[test]
    fn text_helpers_decode_entities() {
        let nodes = parse("<p>Tom &amp; Jerry</p>");
        assert_eq!(text_content(&nodes), "Tom & Jerry");
        assert_eq!(serialize(&nodes), "<p>Tom &amp; Jerry</p>");
    }

    #[test]
    fn find_descendant_walks_depth_first() {
        let nodes = parse(r#"<figure><div><img src="deep.png"></div></figure>"#);
        let figure = nodes[0].as_element().unwrap();
        let img = figure.find_descendant(&|e: &Element| e.tag == "img").unwrap();
        assert_eq!(img.attr("src"), Some("deep.png"));
        assert!(figure.find_child(|e| e.tag == "img").is_none());
    }

    #[rstest]
    #[case("aaa<mark></mark>bbbb", "aaa", "bbbb")]
    #[case("<b>ab<mark></mark>cd</b> tail", "<b>ab</b>", "<b>cd</b> tail")]
    #[case("<li>x<mark></mark></li>", "<li>x</li>", "")]
    #[case(r#"<a href="u"><i><mark></mark>q</i></a>"#, "", r#"<a href="u"><i>q</i></a>"#)]
    fn split_at_marker_keeps_wrappers(
        #[case] input: &str,
        #[case] before: &str,
        #[case] after: &str,
    ) {
        let nodes = parse(input);
        let (b, a) = split_at_marker(&nodes, &|e: &Element| e.tag == "mark").unwrap();
        assert_eq!(serialize(&b), before);
        assert_eq!(serialize(&a), after);
    }

    #[test]
    fn split_without_marker_is_none() {
        let nodes = parse("<p>no marker</p>");
        assert!(split_at_marker(&nodes, &|e: &Element| e.tag == "mark").is_none());
    }
}
