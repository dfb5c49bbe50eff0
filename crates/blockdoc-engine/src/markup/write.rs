//! Block tree → markup.

use blockdoc_syntax::serialize_attributes;

use super::{
    ALIGN_ATTR, COLUMN_CLASS, COLUMNS_CLASS, ID_ATTR, MEDIA_ELEMENT_ATTRS, MarkupOptions,
    TYPE_ATTR, is_reserved_attr,
};
use crate::model::{Block, StyleMap};
use crate::registry::{BlockRegistry, BlockType};

pub struct Writer<'r> {
    registry: &'r BlockRegistry,
    options: MarkupOptions,
    out: String,
}

impl<'r> Writer<'r> {
    pub fn new(registry: &'r BlockRegistry, options: MarkupOptions) -> Self {
        Self {
            registry,
            options,
            out: String::new(),
        }
    }

    pub fn finish(self) -> String {
        self.out
    }

    pub fn write_blocks(&mut self, blocks: &[Block]) {
        for block in blocks {
            if !self.options.keep_empty && block.is_content_empty() {
                continue;
            }
            self.write_block(block);
        }
    }

    fn write_block(&mut self, block: &Block) {
        match block.kind() {
            BlockType::Image | BlockType::Video => self.write_media(block),
            BlockType::Columns => self.write_columns(block),
            _ => self.write_standard(block),
        }
    }

    /// Attributes carried by a block's outer element.
    fn outer_attrs(&self, block: &Block, skip: &[&str]) -> Vec<(String, String)> {
        let mut attrs = Vec::new();
        if self.options.with_ids || !self.registry.tag_identifies(block.kind()) {
            attrs.push((TYPE_ATTR.to_string(), block.kind().to_string()));
        }
        if self.options.with_ids {
            attrs.push((ID_ATTR.to_string(), block.id().to_string()));
        }
        if !block.classes().is_empty() {
            attrs.push(("class".to_string(), block.class_string()));
        }
        if !block.styles().is_empty() {
            attrs.push(("style".to_string(), block.style_string()));
        }
        for (k, v) in block.attributes().iter() {
            if !is_reserved_attr(k) && !skip.contains(&k) {
                attrs.push((k.to_string(), v.to_string()));
            }
        }
        attrs
    }

    fn open(&mut self, tag: &str, attrs: &[(String, String)]) {
        self.out.push('<');
        self.out.push_str(tag);
        self.out.push_str(&serialize_attributes(attrs));
        self.out.push('>');
    }

    fn close(&mut self, tag: &str) {
        self.out.push_str("</");
        self.out.push_str(tag);
        self.out.push('>');
    }

    fn write_standard(&mut self, block: &Block) {
        let tag = self.registry.tag_for(block.kind()).to_string();
        let attrs = self.outer_attrs(block, &[]);
        self.open(&tag, &attrs);
        self.out.push_str(block.content());
        self.close(&tag);
    }

    fn write_media(&mut self, block: &Block) {
        let tag = self.registry.tag_for(block.kind()).to_string();
        let mut skip = MEDIA_ELEMENT_ATTRS.to_vec();
        skip.push(ALIGN_ATTR);
        let attrs = self.outer_attrs(block, &skip);

        let mut inner = vec![("src".to_string(), block.content().to_string())];
        for name in MEDIA_ELEMENT_ATTRS {
            if let Some(value) = block.attributes().get(name) {
                inner.push((name.to_string(), value.to_string()));
            }
        }
        if let Some(style) = block.attributes().get(ALIGN_ATTR).and_then(alignment_style) {
            inner.push(("style".to_string(), style.to_string()));
        }

        self.open(&tag, &attrs);
        match block.kind() {
            BlockType::Video => {
                self.open("video", &inner);
                self.close("video");
            }
            _ => self.open("img", &inner),
        }
        self.close(&tag);
    }

    fn write_columns(&mut self, block: &Block) {
        let tag = self.registry.tag_for(block.kind()).to_string();
        let attrs = self.outer_attrs(block, &[]);
        let container = [("class".to_string(), COLUMNS_CLASS.to_string())];
        let column = [("class".to_string(), COLUMN_CLASS.to_string())];

        self.open(&tag, &attrs);
        self.open("div", &container);
        for col in block.columns().unwrap_or_default() {
            self.open("div", &column);
            self.write_blocks(&col.blocks);
            self.close("div");
        }
        self.close("div");
        self.close(&tag);
    }
}

/// Inline style placing a media element according to its `align` attribute.
pub fn alignment_style(align: &str) -> Option<&'static str> {
    match align {
        "left" => Some("display: block; margin-right: auto"),
        "center" => Some("display: block; margin-left: auto; margin-right: auto"),
        "right" => Some("display: block; margin-left: auto"),
        _ => None,
    }
}

/// Inverse of [`alignment_style`], tolerant of foreign declarations.
pub fn alignment_from_style(style: &str) -> Option<&'static str> {
    let styles = StyleMap::parse(style);
    let left = styles.get("margin-left") == Some("auto");
    let right = styles.get("margin-right") == Some("auto");
    match (left, right) {
        (true, true) => Some("center"),
        (true, false) => Some("right"),
        (false, true) => Some("left"),
        (false, false) => None,
    }
}
