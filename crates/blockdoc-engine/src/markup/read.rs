//! Markup → block tree.

use blockdoc_syntax::{Element, Node};

use super::write::alignment_from_style;
use super::{
    ALIGN_ATTR, COLUMN_CLASS, COLUMNS_CLASS, ID_ATTR, INLINE_ELEMENTS, TYPE_ATTR, is_reserved_attr,
};
use crate::model::{AttributeMap, Block, BlockId, BlockInit, Column, is_blank_text};
use crate::registry::{BlockRegistry, BlockType};

pub struct Reader<'r> {
    registry: &'r BlockRegistry,
}

impl<'r> Reader<'r> {
    pub fn new(registry: &'r BlockRegistry) -> Self {
        Self { registry }
    }

    /// Read a sibling list. Runs of text and inline elements between block
    /// elements are gathered into paragraphs.
    pub fn read_list(&self, nodes: &[Node]) -> Vec<Block> {
        let mut blocks = Vec::new();
        let mut inline_run: Vec<&Node> = Vec::new();

        for node in nodes {
            match node {
                Node::Element(e) if !self.is_inline(e) => {
                    self.flush_inline(&mut inline_run, &mut blocks);
                    if let Some(block) = self.read_element(e) {
                        blocks.push(block);
                    }
                }
                _ => inline_run.push(node),
            }
        }
        self.flush_inline(&mut inline_run, &mut blocks);

        blocks
    }

    fn is_inline(&self, e: &Element) -> bool {
        e.attr(TYPE_ATTR).is_none() && INLINE_ELEMENTS.contains(&e.tag.as_str())
    }

    fn flush_inline(&self, run: &mut Vec<&Node>, blocks: &mut Vec<Block>) {
        if run.is_empty() {
            return;
        }
        let content: String = run.iter().map(|n| n.to_markup()).collect();
        let text: String = run.iter().map(|n| n.text_content()).collect();
        run.clear();

        if is_blank_text(&text) {
            return;
        }
        blocks.push(Block::new(
            BlockInit::new(BlockType::Paragraph, content.trim()),
            self.registry,
        ));
    }

    fn kind_of(&self, e: &Element) -> Option<BlockType> {
        if let Some(kind) = e.attr(TYPE_ATTR).and_then(|t| t.parse::<BlockType>().ok()) {
            return Some(kind);
        }
        match e.tag.as_str() {
            "img" => return Some(BlockType::Image),
            "video" => return Some(BlockType::Video),
            _ => {}
        }
        let kind = self.registry.type_for_tag(&e.tag)?;
        // A figure wrapping a video is a video even without a marker
        if kind == BlockType::Image && e.find_descendant(&|c: &Element| c.tag == "video").is_some() {
            return Some(BlockType::Video);
        }
        Some(kind)
    }

    fn read_element(&self, e: &Element) -> Option<Block> {
        let Some(kind) = self.kind_of(e) else {
            return self.read_unrecognized(e);
        };

        let block = match kind {
            BlockType::Image | BlockType::Video => self.read_media(e, kind),
            BlockType::Columns => self.read_columns(e),
            _ => Block::new(self.init_from(e, kind).content(e.inner_markup()), self.registry),
        };
        Some(block)
    }

    /// Unrecognized elements keep their text and nothing else.
    fn read_unrecognized(&self, e: &Element) -> Option<Block> {
        let text = e.text_content();
        if is_blank_text(&text) {
            return None;
        }
        let content = html_escape::encode_text(text.trim()).into_owned();
        Some(Block::new(
            BlockInit::new(self.registry.default_type, content),
            self.registry,
        ))
    }

    fn init_from(&self, e: &Element, kind: BlockType) -> InitBuilder {
        let mut init = BlockInit::new(kind, "");
        if let Some(id) = e.attr(ID_ATTR).filter(|id| !id.is_empty()) {
            init = init.id(BlockId::new(id));
        }
        if let Some(classes) = e.attr("class") {
            init = init.classes(classes);
        }
        if let Some(style) = e.attr("style") {
            init = init.style(style);
        }
        let attrs = AttributeMap::from_pairs(
            e.attrs
                .iter()
                .filter(|(k, _)| !is_reserved_attr(k))
                .cloned(),
        );
        InitBuilder { init, attrs }
    }

    fn read_media(&self, e: &Element, kind: BlockType) -> Block {
        let tag = if kind == BlockType::Video { "video" } else { "img" };
        let media = if e.tag == tag {
            Some(e)
        } else {
            e.find_descendant(&|c: &Element| c.tag == tag)
        };

        let mut builder = if media.is_some_and(|m| std::ptr::eq(m, e)) {
            // Bare <img>/<video>: the element is both wrapper and media
            InitBuilder {
                init: BlockInit::new(kind, ""),
                attrs: AttributeMap::default(),
            }
        } else {
            self.init_from(e, kind)
        };

        let mut src = String::new();
        if let Some(media) = media {
            for (k, v) in &media.attrs {
                match k.as_str() {
                    "src" => src = v.clone(),
                    "style" => {
                        if let Some(align) = alignment_from_style(v) {
                            builder.attrs.set(ALIGN_ATTR, align);
                        }
                    }
                    _ if is_reserved_attr(k) => {}
                    _ => {
                        builder.attrs.set(k, v);
                    }
                }
            }
        }
        Block::new(builder.content(src), self.registry)
    }

    fn read_columns(&self, e: &Element) -> Block {
        let container = e.find_child(|c| c.has_class(COLUMNS_CLASS));
        let found: Vec<&Element> = container
            .map(|c| c.child_elements().filter(|c| c.has_class(COLUMN_CLASS)).collect())
            .unwrap_or_default();

        let count = self.registry.column_count.max(found.len());
        let columns = (0..count)
            .map(|i| {
                let mut blocks = found
                    .get(i)
                    .map(|c| self.read_list(&c.children))
                    .unwrap_or_default();
                if blocks.is_empty() {
                    blocks.push(Block::default_block(self.registry));
                }
                Column::new(blocks)
            })
            .collect();

        let mut builder = self.init_from(e, BlockType::Columns);
        builder.init = builder.init.columns(columns);
        Block::new(builder.content(String::new()), self.registry)
    }
}

/// A `BlockInit` whose attribute bag is still being assembled.
struct InitBuilder {
    init: BlockInit,
    attrs: AttributeMap,
}

impl InitBuilder {
    fn content(self, content: String) -> BlockInit {
        let mut init = self.init;
        init.content = content;
        if !self.attrs.is_empty() {
            init = init.attributes(self.attrs.to_string());
        }
        init
    }
}
