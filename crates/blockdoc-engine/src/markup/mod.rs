//! # Serialization Engine
//!
//! Converts between the block tree and the markup wire format.
//!
//! ## Wire Format
//!
//! One element per block, tag taken from the registry:
//!
//! ```text
//! <p style="color: red">Hello <b>world</b></p>
//! <figure class="media"><img src="a.png" width="300" style="display: block; margin-left: auto; margin-right: auto"></figure>
//! <div data-block-type="columns"><div class="columns"><div class="column">…</div><div class="column">…</div></div></div>
//! ```
//!
//! The block type is written as a `data-block-type` marker only when the tag
//! alone would not recover it (`div` is shared by containers and columns,
//! `figure` by images and videos). Parsing looks at the marker first, then
//! the tag, then treats whatever is left as plain text.
//!
//! Whitespace-only blocks are dropped on write, so `parse(write(b))` equals
//! `b` only up to those. An empty parse yields one default block; a
//! document is never empty.

mod read;
mod write;

use crate::model::Block;
use crate::registry::BlockRegistry;

pub use write::{alignment_from_style, alignment_style};

/// Marker attribute naming the block type.
pub const TYPE_ATTR: &str = "data-block-type";
/// Block id attribute, written only for rendering surfaces.
pub const ID_ATTR: &str = "data-block-id";
pub const COLUMNS_CLASS: &str = "columns";
pub const COLUMN_CLASS: &str = "column";
/// Block attribute converted to an inline style on the media element.
pub const ALIGN_ATTR: &str = "align";

/// Block attributes that belong on the inner `<img>`/`<video>` element.
pub const MEDIA_ELEMENT_ATTRS: &[&str] = &[
    "width", "height", "alt", "title", "controls", "poster", "loop", "muted", "autoplay",
];

/// Elements that never start a block of their own.
pub const INLINE_ELEMENTS: &[&str] = &[
    "a", "abbr", "b", "br", "cite", "code", "del", "em", "i", "ins", "kbd", "mark", "q", "s",
    "small", "span", "strike", "strong", "sub", "sup", "u",
];

pub(crate) fn is_reserved_attr(name: &str) -> bool {
    matches!(name, TYPE_ATTR | ID_ATTR | "class" | "style")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkupOptions {
    /// Emit `data-block-id` and always emit the type marker
    pub with_ids: bool,
    /// Keep blocks with no visible content
    pub keep_empty: bool,
}

impl MarkupOptions {
    /// Options for rendering onto an editable surface: every block present
    /// and addressable.
    pub fn surface() -> Self {
        Self {
            with_ids: true,
            keep_empty: true,
        }
    }
}

/// Serialize blocks to the wire format.
pub fn to_markup(blocks: &[Block], registry: &BlockRegistry) -> String {
    to_markup_with(blocks, registry, MarkupOptions::default())
}

pub fn to_markup_with(blocks: &[Block], registry: &BlockRegistry, options: MarkupOptions) -> String {
    let mut writer = write::Writer::new(registry, options);
    writer.write_blocks(blocks);
    writer.finish()
}

/// Parse the wire format into blocks. Never returns an empty list.
pub fn parse_markup(markup: &str, registry: &BlockRegistry) -> Vec<Block> {
    let nodes = blockdoc_syntax::parse(markup);
    let blocks = read::Reader::new(registry).read_list(&nodes);
    if blocks.is_empty() {
        vec![Block::default_block(registry)]
    } else {
        blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BlockInit, Column};
    use crate::registry::BlockType;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn reg() -> BlockRegistry {
        BlockRegistry::default()
    }

    fn block(kind: BlockType, content: &str) -> Block {
        Block::new(BlockInit::new(kind, content), &reg())
    }

    fn shape(blocks: &[Block]) -> Vec<(BlockType, String)> {
        blocks
            .iter()
            .map(|b| (b.kind(), b.content().to_string()))
            .collect()
    }

    #[test]
    fn writes_standard_blocks() {
        let blocks = vec![
            block(BlockType::H1, "Title"),
            Block::new(
                BlockInit::new(BlockType::Paragraph, "Hello <b>world</b>").style("color: red"),
                &reg(),
            ),
            block(BlockType::UnorderedList, "<li>a</li><li>b</li>"),
        ];
        assert_snapshot!(
            to_markup(&blocks, &reg()),
            @r#"<h1>Title</h1><p style="color: red">Hello <b>world</b></p><ul><li>a</li><li>b</li></ul>"#
        );
    }

    #[test]
    fn writes_image_with_alignment_and_dimensions() {
        let image = Block::new(
            BlockInit::new(BlockType::Image, "https://example.com/a.png")
                .attributes(r#"width="300" align="center" data-caption="Sunset""#),
            &reg(),
        );
        assert_snapshot!(
            to_markup(&[image], &reg()),
            @r#"<figure class="media" data-caption="Sunset"><img src="https://example.com/a.png" width="300" style="display: block; margin-left: auto; margin-right: auto"></figure>"#
        );
    }

    #[test]
    fn writes_video_with_type_marker() {
        let video = Block::new(
            BlockInit::new(BlockType::Video, "clip.mp4").attributes("controls"),
            &reg(),
        );
        assert_snapshot!(
            to_markup(&[video], &reg()),
            @r#"<figure data-block-type="video" class="media"><video src="clip.mp4" controls></video></figure>"#
        );
    }

    #[test]
    fn writes_columns_recursively() {
        let r = reg();
        let columns = Block::new(
            BlockInit::new(BlockType::Columns, "").columns(vec![
                Column::new(vec![block(BlockType::Paragraph, "left")]),
                Column::new(vec![block(BlockType::H2, "right"), block(BlockType::Paragraph, " ")]),
            ]),
            &r,
        );
        assert_snapshot!(
            to_markup(&[columns], &r),
            @r#"<div data-block-type="columns"><div class="columns"><div class="column"><p>left</p></div><div class="column"><h2>right</h2></div></div></div>"#
        );
    }

    #[test]
    fn drops_whitespace_only_blocks() {
        let blocks = vec![
            block(BlockType::Paragraph, "  "),
            block(BlockType::Paragraph, "kept"),
            block(BlockType::Quote, "\u{200B}"),
        ];
        assert_eq!(to_markup(&blocks, &reg()), "<p>kept</p>");
    }

    #[test]
    fn surface_options_keep_empty_blocks_and_ids() {
        let b = Block::new(BlockInit::new(BlockType::Paragraph, "").id("p1"), &reg());
        assert_eq!(
            to_markup_with(&[b], &reg(), MarkupOptions::surface()),
            r#"<p data-block-type="paragraph" data-block-id="p1"></p>"#
        );
    }

    #[test]
    fn round_trip_preserves_type_content_and_bags() {
        let r = reg();
        let blocks = vec![
            Block::new(
                BlockInit::new(BlockType::H2, "Heading")
                    .classes("title big")
                    .attributes(r#"dir="rtl""#),
                &r,
            ),
            Block::new(
                BlockInit::new(BlockType::Paragraph, "a <i>b</i> &amp; c").style("text-align: right"),
                &r,
            ),
            block(BlockType::Code, "fn main() {}"),
            block(BlockType::Quote, "wise words"),
            block(BlockType::OrderedList, "<li>one</li>"),
            block(BlockType::Container, "<section>free</section>"),
            Block::new(
                BlockInit::new(BlockType::Image, "a.png").attributes(r#"alt="A" align="right""#),
                &r,
            ),
            block(BlockType::Video, "v.webm"),
        ];

        let parsed = parse_markup(&to_markup(&blocks, &r), &r);

        assert_eq!(shape(&parsed), shape(&blocks));
        for (a, b) in parsed.iter().zip(&blocks) {
            assert_eq!(a.styles(), b.styles(), "styles of {}", b.kind());
            assert_eq!(a.classes(), b.classes(), "classes of {}", b.kind());
            assert_eq!(a.attributes().get("alt"), b.attributes().get("alt"));
            assert_eq!(a.attributes().get("align"), b.attributes().get("align"));
            assert_eq!(a.attributes().get("dir"), b.attributes().get("dir"));
        }
    }

    #[test]
    fn round_trip_through_columns() {
        let r = reg();
        let original = Block::new(
            BlockInit::new(BlockType::Columns, "").columns(vec![
                Column::new(vec![block(BlockType::Paragraph, "a"), block(BlockType::H3, "b")]),
                Column::new(vec![block(BlockType::Paragraph, "c")]),
            ]),
            &r,
        );
        let parsed = parse_markup(&to_markup(std::slice::from_ref(&original), &r), &r);

        assert_eq!(parsed.len(), 1);
        let columns = parsed[0].columns().unwrap();
        assert_eq!(columns.len(), 2);
        assert_eq!(
            shape(&columns[0].blocks),
            vec![
                (BlockType::Paragraph, "a".to_string()),
                (BlockType::H3, "b".to_string())
            ]
        );
        assert_eq!(shape(&columns[1].blocks), vec![(BlockType::Paragraph, "c".to_string())]);
    }

    #[test]
    fn missing_column_falls_back_to_empty_child() {
        let markup = r#"<div data-block-type="columns"><div class="columns"><div class="column"><p>only</p></div></div></div>"#;
        let parsed = parse_markup(markup, &reg());
        let columns = parsed[0].columns().unwrap();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[1].blocks.len(), 1);
        assert!(columns[1].blocks[0].is_content_empty());

        let bare = parse_markup(r#"<div data-block-type="columns"></div>"#, &reg());
        let columns = bare[0].columns().unwrap();
        assert_eq!(columns.len(), 2);
        assert!(bare[0].is_content_empty());
    }

    #[rstest]
    #[case("")]
    #[case("   \n  ")]
    #[case("<!-- nothing -->")]
    #[case("<p> </p>")]
    fn empty_parse_yields_single_fallback_block(#[case] markup: &str) {
        let parsed = parse_markup(markup, &reg());
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].kind(), BlockType::Paragraph);
    }

    #[rstest]
    #[case("just text", BlockType::Paragraph, "just text")]
    #[case("Hello <b>bold</b> end", BlockType::Paragraph, "Hello <b>bold</b> end")]
    #[case("<table><tr><td>cell</td></tr></table>", BlockType::Paragraph, "cell")]
    #[case("<h3>tag lookup</h3>", BlockType::H3, "tag lookup")]
    #[case(r#"<div data-block-type="quote">marker wins</div>"#, BlockType::Quote, "marker wins")]
    #[case(r#"<img src="bare.png">"#, BlockType::Image, "bare.png")]
    #[case(r#"<figure><video src="v.mp4"></video></figure>"#, BlockType::Video, "v.mp4")]
    fn parse_dispatch(#[case] markup: &str, #[case] kind: BlockType, #[case] content: &str) {
        let parsed = parse_markup(markup, &reg());
        assert_eq!(shape(&parsed), vec![(kind, content.to_string())]);
    }

    #[test]
    fn parse_adopts_block_ids() {
        let parsed = parse_markup(r#"<p data-block-id="keep-me">x</p>"#, &reg());
        assert_eq!(parsed[0].id().as_str(), "keep-me");
    }

    #[test]
    fn alignment_style_round_trips() {
        for align in ["left", "center", "right"] {
            let style = alignment_style(align).unwrap();
            assert_eq!(alignment_from_style(style), Some(align));
        }
        assert_eq!(alignment_style("justify"), None);
        assert_eq!(alignment_from_style("color: red"), None);
    }
}
