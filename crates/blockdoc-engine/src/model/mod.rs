//! Block tree model.
//!
//! A [`Block`] is a plain value: it owns its content, its property bags and,
//! for multi-column blocks, its [`Column`]s of child blocks. Blocks hold no
//! references to their parents; the tree manager finds owning lists by
//! searching (see [`crate::editing::context`]).

mod properties;

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::registry::{BlockRegistry, BlockType, TypeDefaults};

pub use properties::{AttributeMap, ClassList, StyleMap};

/// Opaque block identifier, stable for the lifetime of the block.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh identifier, unique across documents.
    pub fn generate() -> Self {
        Self(format!("b-{}", uuid::Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One column of a multi-column block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub blocks: Vec<Block>,
}

impl Column {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }
}

/// Observable mutations recorded by a block's setters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockChange {
    /// Styles, classes or attributes changed
    Style,
    /// Content, type or columns changed
    Content,
}

/// Construction parameters for [`Block::new`].
#[derive(Debug, Clone, Default)]
pub struct BlockInit {
    pub id: Option<BlockId>,
    pub kind: Option<BlockType>,
    pub content: String,
    pub style: Option<String>,
    pub classes: Option<String>,
    pub attributes: Option<String>,
    pub columns: Option<Vec<Column>>,
}

impl BlockInit {
    pub fn new(kind: BlockType, content: impl Into<String>) -> Self {
        Self {
            kind: Some(kind),
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn id(mut self, id: impl Into<BlockId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn classes(mut self, classes: impl Into<String>) -> Self {
        self.classes = Some(classes.into());
        self
    }

    pub fn attributes(mut self, attributes: impl Into<String>) -> Self {
        self.attributes = Some(attributes.into());
        self
    }

    pub fn columns(mut self, columns: Vec<Column>) -> Self {
        self.columns = Some(columns);
        self
    }
}

/// A node in the document tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    id: BlockId,
    kind: BlockType,
    content: String,
    #[serde(default, skip_serializing_if = "StyleMap::is_empty")]
    styles: StyleMap,
    #[serde(default, skip_serializing_if = "ClassList::is_empty")]
    classes: ClassList,
    #[serde(default, skip_serializing_if = "AttributeMap::is_empty")]
    attributes: AttributeMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    columns: Option<Vec<Column>>,
    #[serde(skip)]
    selected: bool,
    #[serde(skip)]
    changes: Vec<BlockChange>,
}

/// Equality covers persisted state only.
impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.kind == other.kind
            && self.content == other.content
            && self.styles == other.styles
            && self.classes == other.classes
            && self.attributes == other.attributes
            && self.columns == other.columns
    }
}

fn blank_regex() -> &'static Regex {
    static BLANK: OnceLock<Regex> = OnceLock::new();
    BLANK.get_or_init(|| {
        Regex::new(r"^[\s\u{200B}\u{200C}\u{200D}\u{FEFF}\u{00A0}]*$").expect("Invalid blank regex")
    })
}

/// True when `text` is only whitespace and zero-width markers.
pub fn is_blank_text(text: &str) -> bool {
    blank_regex().is_match(text)
}

impl Block {
    /// Build a block, merging in the type defaults from `registry`.
    /// Caller-supplied values win over defaults.
    pub fn new(init: BlockInit, registry: &BlockRegistry) -> Self {
        let kind = init.kind.unwrap_or(registry.default_type);
        let columns = if kind.is_columns() {
            Some(init.columns.unwrap_or_else(|| {
                (0..registry.column_count)
                    .map(|_| Column::new(vec![Block::default_block(registry)]))
                    .collect()
            }))
        } else {
            None
        };

        let mut block = Self {
            id: init.id.unwrap_or_else(BlockId::generate),
            kind,
            content: if columns.is_some() {
                String::new()
            } else {
                init.content
            },
            styles: init.style.as_deref().map(StyleMap::parse).unwrap_or_default(),
            classes: init.classes.as_deref().map(ClassList::parse).unwrap_or_default(),
            attributes: init
                .attributes
                .as_deref()
                .map(AttributeMap::parse)
                .unwrap_or_default(),
            columns,
            selected: false,
            changes: Vec::new(),
        };
        block.apply_defaults(&registry.defaults(kind));
        block.changes.clear();
        block
    }

    /// An empty block of the registry's default type.
    pub fn default_block(registry: &BlockRegistry) -> Self {
        Self::new(BlockInit::new(registry.default_type, ""), registry)
    }

    pub fn id(&self) -> &BlockId {
        &self.id
    }

    pub fn kind(&self) -> BlockType {
        self.kind
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn styles(&self) -> &StyleMap {
        &self.styles
    }

    pub fn classes(&self) -> &ClassList {
        &self.classes
    }

    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    pub fn columns(&self) -> Option<&[Column]> {
        self.columns.as_deref()
    }

    pub fn columns_mut(&mut self) -> Option<&mut Vec<Column>> {
        self.columns.as_mut()
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub(crate) fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    pub fn style_string(&self) -> String {
        self.styles.to_string()
    }

    pub fn class_string(&self) -> String {
        self.classes.to_string()
    }

    pub fn attribute_string(&self) -> String {
        self.attributes.to_string()
    }

    fn record(&mut self, changed: bool, change: BlockChange) -> bool {
        if changed && !self.changes.contains(&change) {
            self.changes.push(change);
        }
        changed
    }

    /// Drain the change journal filled by the setters.
    pub fn take_changes(&mut self) -> Vec<BlockChange> {
        std::mem::take(&mut self.changes)
    }

    pub fn set_content(&mut self, content: impl Into<String>) -> bool {
        let content = content.into();
        let changed = self.columns.is_none() && self.content != content;
        if changed {
            self.content = content;
        }
        self.record(changed, BlockChange::Content)
    }

    pub fn set_style(&mut self, key: &str, value: &str) -> bool {
        let changed = self.styles.set(key, value);
        self.record(changed, BlockChange::Style)
    }

    pub fn remove_style(&mut self, key: &str) -> bool {
        let changed = self.styles.remove(key);
        self.record(changed, BlockChange::Style)
    }

    /// Replace every style from a declaration string.
    pub fn set_style_string(&mut self, styles: &str) -> bool {
        let parsed = StyleMap::parse(styles);
        let changed = parsed != self.styles;
        self.styles = parsed;
        self.record(changed, BlockChange::Style)
    }

    pub fn add_class(&mut self, class: &str) -> bool {
        let changed = self.classes.add(class);
        self.record(changed, BlockChange::Style)
    }

    pub fn remove_class(&mut self, class: &str) -> bool {
        let changed = self.classes.remove(class);
        self.record(changed, BlockChange::Style)
    }

    pub fn set_class_string(&mut self, classes: &str) -> bool {
        let parsed = ClassList::parse(classes);
        let changed = parsed != self.classes;
        self.classes = parsed;
        self.record(changed, BlockChange::Style)
    }

    pub fn set_attribute(&mut self, key: &str, value: &str) -> bool {
        let changed = self.attributes.set(key, value);
        self.record(changed, BlockChange::Style)
    }

    pub fn remove_attribute(&mut self, key: &str) -> bool {
        let changed = self.attributes.remove(key);
        self.record(changed, BlockChange::Style)
    }

    pub fn set_attribute_string(&mut self, attributes: &str) -> bool {
        let parsed = AttributeMap::parse(attributes);
        let changed = parsed != self.attributes;
        self.attributes = parsed;
        self.record(changed, BlockChange::Style)
    }

    /// Add every default entry the block does not already carry.
    pub fn apply_defaults(&mut self, defaults: &TypeDefaults) -> bool {
        let mut changed = false;
        for (k, v) in defaults.styles.iter() {
            if self.styles.get(k).is_none() {
                changed |= self.styles.set(k, v);
            }
        }
        for class in defaults.classes.iter() {
            changed |= self.classes.add(class);
        }
        for (k, v) in defaults.attributes.iter() {
            if self.attributes.get(k).is_none() {
                changed |= self.attributes.set(k, v);
            }
        }
        self.record(changed, BlockChange::Style)
    }

    /// Remove default entries still holding their default value. Entries the
    /// caller changed away from the default are left alone.
    pub fn clear_defaults(&mut self, defaults: &TypeDefaults) -> bool {
        let mut changed = false;
        for (k, v) in defaults.styles.iter() {
            if self.styles.get(k) == Some(v) {
                changed |= self.styles.remove(k);
            }
        }
        for class in defaults.classes.iter() {
            changed |= self.classes.remove(class);
        }
        for (k, v) in defaults.attributes.iter() {
            if self.attributes.get(k) == Some(v) {
                changed |= self.attributes.remove(k);
            }
        }
        self.record(changed, BlockChange::Style)
    }

    /// Change the block's type, swapping type defaults and reshaping content
    /// for list types.
    pub fn toggle_type(&mut self, to: BlockType, registry: &BlockRegistry) -> bool {
        let from = self.kind;
        if from == to || from.is_columns() || to.is_columns() {
            return false;
        }

        self.clear_defaults(&registry.defaults(from));

        if to.is_list() && !from.is_list() {
            if let Some(pattern) = registry.content_pattern(to) {
                self.content = pattern.replace("{content}", &self.content);
            }
        } else if from.is_list() && !to.is_list() {
            self.content = unwrap_list_items(&self.content);
        }

        self.kind = to;
        self.apply_defaults(&registry.defaults(to));
        self.record(true, BlockChange::Content)
    }

    /// Plain text of the block's own content.
    pub fn text(&self) -> String {
        if self.kind.is_media() {
            return String::new();
        }
        blockdoc_syntax::text_content(&blockdoc_syntax::parse(&self.content))
    }

    /// True when the block carries nothing a reader could see. Containers are
    /// empty only when every descendant is.
    pub fn is_content_empty(&self) -> bool {
        if let Some(columns) = &self.columns {
            return columns
                .iter()
                .flat_map(|c| c.blocks.iter())
                .all(Block::is_content_empty);
        }
        if self.kind.is_media() {
            return self.content.trim().is_empty();
        }
        is_markup_empty(&self.content)
    }

    /// Depth-first iterator over this block and every block nested in its columns.
    pub fn descendants(&self) -> Vec<&Block> {
        let mut out = vec![self];
        if let Some(columns) = &self.columns {
            for column in columns {
                for child in &column.blocks {
                    out.extend(child.descendants());
                }
            }
        }
        out
    }

    pub fn contains(&self, id: &BlockId) -> bool {
        self.descendants().iter().any(|b| b.id() == id)
    }
}

/// True when a markup fragment shows nothing: blank text and no embedded
/// media.
pub fn is_markup_empty(content: &str) -> bool {
    let nodes = blockdoc_syntax::parse(content);
    is_blank_text(&blockdoc_syntax::text_content(&nodes)) && !has_embedded_media(&nodes)
}

/// Elements that are visible content without carrying any text.
pub(crate) fn is_embedded_tag(tag: &str) -> bool {
    matches!(tag, "img" | "video" | "iframe" | "hr")
}

fn has_embedded_media(nodes: &[blockdoc_syntax::Node]) -> bool {
    nodes.iter().any(|n| match n {
        blockdoc_syntax::Node::Element(e) => {
            is_embedded_tag(&e.tag) || has_embedded_media(&e.children)
        }
        blockdoc_syntax::Node::Text(_) => false,
    })
}

/// `<li>a</li><li>b</li>` becomes `a<br>b`; content without items is kept.
fn unwrap_list_items(content: &str) -> String {
    let nodes = blockdoc_syntax::parse(content);
    let items: Vec<String> = nodes
        .iter()
        .filter_map(|n| n.as_element())
        .filter(|e| e.tag == "li")
        .map(|e| e.inner_markup())
        .collect();
    if items.is_empty() {
        content.to_string()
    } else {
        items.join("<br>")
    }
}

/// Coarse equality used to suppress redundant updates: same length and the
/// same `(id, type, content)` at every index. Styles are not compared.
pub fn same_shape(a: &[Block], b: &[Block]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(x, y)| x.id == y.id && x.kind == y.kind && x.content == y.content)
}
